use crate::context::{ExecutionContext, Interrupt};
use crate::error::{Error, PublishError};
use crate::handle::ConnectionHandle;
use crate::reporter::{ErrorReporter, TracingReporter};

use bytes::Bytes;
use pubsub_bridge_broker::{Acknowledgment, BrokerError, Connection, Topic};
use tracing::{debug, instrument};

/// Publishes single messages and waits for the broker to confirm them.
#[derive(Clone, Debug)]
pub struct Publisher<R = TracingReporter>
where
    R: ErrorReporter,
{
    reporter: R,
}

impl<R> Publisher<R>
where
    R: ErrorReporter,
{
    /// Creates a publisher that reports failures to `reporter`.
    pub const fn new(reporter: R) -> Self {
        Self { reporter }
    }

    /// The sink failures are reported to.
    pub const fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Publishes `message` (as its raw UTF-8 bytes) to `topic`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Context` if `ctx` has no call-scoped state, or
    /// `Error::Publish` if the broker did not acknowledge the message.
    pub async fn publish<C>(
        &self,
        ctx: &ExecutionContext,
        handle: &ConnectionHandle<C>,
        topic: &str,
        message: &str,
    ) -> Result<(), Error<C::Error>>
    where
        C: Connection,
    {
        self.publish_bytes(ctx, handle, topic, Bytes::copy_from_slice(message.as_bytes()))
            .await
    }

    /// Publishes a raw payload to `topic`.
    ///
    /// At most one submission is made and the call returns only once the
    /// broker has answered or `ctx` is cancelled or past its deadline. Every
    /// failure is reported to the sink exactly once before it is returned.
    ///
    /// # Errors
    ///
    /// Returns `Error::Context` if `ctx` has no call-scoped state, or
    /// `Error::Publish` if the broker did not acknowledge the message.
    #[instrument(skip(self, ctx, handle, payload), fields(project_id = %handle.project_id()))]
    pub async fn publish_bytes<C>(
        &self,
        ctx: &ExecutionContext,
        handle: &ConnectionHandle<C>,
        topic: &str,
        payload: Bytes,
    ) -> Result<(), Error<C::Error>>
    where
        C: Connection,
    {
        let Some(state) = ctx.state() else {
            let error = Error::Context;
            self.reporter.report(&error, "cannot determine state");
            return Err(error);
        };

        debug!(vu = state.vu, iteration = state.iteration, "context resolved");

        match confirm(ctx, handle, topic, payload.clone()).await {
            Ok(()) => {
                debug!("message acknowledged");
                Ok(())
            }
            Err(e) => {
                let error = Error::Publish(e);
                self.reporter.report(
                    &error,
                    &format!(
                        "unable to publish message: message was '{}', topic was '{topic}'",
                        String::from_utf8_lossy(&payload)
                    ),
                );
                Err(error)
            }
        }
    }
}

async fn confirm<C>(
    ctx: &ExecutionContext,
    handle: &ConnectionHandle<C>,
    topic: &str,
    payload: Bytes,
) -> Result<(), PublishError<C::Error>>
where
    C: Connection,
{
    if topic.is_empty() {
        return Err(PublishError::EmptyTopic);
    }

    let resolved = handle
        .topic(topic)
        .map_err(|source| PublishError::InvalidTopic {
            topic: topic.to_string(),
            source,
        })?;

    if let Some(interrupt) = ctx.interruption() {
        return Err(interrupted(interrupt));
    }

    let submit_and_wait = async {
        let ack = resolved.publish(payload).await.map_err(PublishError::Rejected)?;
        debug!(topic = %resolved.name(), "submitted, awaiting acknowledgment");
        ack.wait().await.map_err(PublishError::Rejected)
    };

    tokio::select! {
        biased;
        result = submit_and_wait => result,
        interrupt = ctx.interrupted() => Err(interrupted(interrupt)),
    }
}

impl Default for Publisher<TracingReporter> {
    fn default() -> Self {
        Self::new(TracingReporter)
    }
}

fn interrupted<E>(interrupt: Interrupt) -> PublishError<E>
where
    E: BrokerError,
{
    match interrupt {
        Interrupt::Cancelled => PublishError::Cancelled,
        Interrupt::TimedOut => PublishError::TimedOut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::context::VuState;
    use crate::factory::ClientFactory;
    use crate::reporter::MemoryReporter;

    use std::time::Duration;

    use assert_matches::assert_matches;
    use pubsub_bridge_broker::PublisherConfig;
    use pubsub_bridge_broker_memory::{
        AckBehavior, Error as MemoryError, MemoryConnection, MemoryConnector,
    };
    use tokio_util::sync::CancellationToken;
    use tracing_test::traced_test;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(VuState {
            vu: 1,
            iteration: 0,
            scenario: "default".to_string(),
        })
    }

    async fn setup(behavior: AckBehavior) -> (MemoryConnector, ConnectionHandle<MemoryConnection>) {
        let broker = MemoryConnector::with_ack_behavior(behavior);
        let handle = ClientFactory::new(broker.clone())
            .connect(PublisherConfig::new("test-project").unwrap())
            .await
            .unwrap();
        (broker, handle)
    }

    #[tokio::test]
    async fn test_publish_acknowledged() {
        let (broker, handle) = setup(AckBehavior::Acknowledge).await;
        let publisher = Publisher::new(MemoryReporter::new());

        publisher.publish(&ctx(), &handle, "orders", "hello").await.unwrap();

        let messages = broker.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].topic, "orders");
        assert_eq!(messages[0].payload, Bytes::from("hello"));
        assert!(messages[0].acknowledged);
        assert!(publisher.reporter().reports().is_empty());
    }

    #[tokio::test]
    async fn test_missing_state_never_submits() {
        let (broker, handle) = setup(AckBehavior::Acknowledge).await;
        let publisher = Publisher::new(MemoryReporter::new());

        let result = publisher
            .publish(&ExecutionContext::init(), &handle, "orders", "hello")
            .await;

        assert_matches!(result, Err(Error::Context));
        assert!(broker.messages().await.is_empty());

        let reports = publisher.reporter().reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].message, "cannot determine state");
    }

    #[tokio::test]
    async fn test_rejection_is_reported_once() {
        let (broker, handle) = setup(AckBehavior::Reject("stream full".to_string())).await;
        let publisher = Publisher::new(MemoryReporter::new());

        let result = publisher.publish(&ctx(), &handle, "orders", "hello").await;

        assert_matches!(
            result,
            Err(Error::Publish(PublishError::Rejected(MemoryError::Rejected(reason))))
                if reason == "stream full"
        );
        assert_eq!(broker.messages().await.len(), 1);

        let reports = publisher.reporter().reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(
            reports[0].message,
            "unable to publish message: message was 'hello', topic was 'orders'"
        );
        assert!(reports[0].error.contains("stream full"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_default_publisher_logs_failures() {
        let (_broker, handle) = setup(AckBehavior::Reject("stream full".to_string())).await;
        let publisher = Publisher::default();

        let result = publisher.publish(&ctx(), &handle, "orders", "hello").await;

        assert_matches!(result, Err(Error::Publish(PublishError::Rejected(_))));
        assert!(logs_contain("xk6-pubsub: unable to publish message"));
        assert!(logs_contain("topic was 'orders'"));
        assert!(logs_contain("stream full"));
    }

    #[tokio::test]
    async fn test_empty_topic() {
        let (broker, handle) = setup(AckBehavior::Acknowledge).await;
        let publisher = Publisher::new(MemoryReporter::new());

        let result = publisher.publish(&ctx(), &handle, "", "hello").await;

        assert_matches!(result, Err(Error::Publish(PublishError::EmptyTopic)));
        assert!(broker.messages().await.is_empty());
        assert_eq!(publisher.reporter().reports().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_topic() {
        let (broker, handle) = setup(AckBehavior::Acknowledge).await;
        let publisher = Publisher::new(MemoryReporter::new());

        let result = publisher.publish(&ctx(), &handle, "two words", "hello").await;

        assert_matches!(
            result,
            Err(Error::Publish(PublishError::InvalidTopic { topic, .. })) if topic == "two words"
        );
        assert!(broker.messages().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_acknowledgment() {
        let (broker, handle) = setup(AckBehavior::Delay(Duration::from_millis(200))).await;
        let publisher = Publisher::new(MemoryReporter::new());
        let started = tokio::time::Instant::now();

        publisher.publish(&ctx(), &handle, "orders", "hello").await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(200));
        assert!(broker.messages().await[0].acknowledged);
    }

    #[tokio::test]
    async fn test_cancellation_unblocks() {
        let (broker, handle) = setup(AckBehavior::Withhold).await;
        let publisher = Publisher::new(MemoryReporter::new());
        let token = CancellationToken::new();
        let ctx = ctx().with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let result = publisher.publish(&ctx, &handle, "orders", "hello").await;
        canceller.await.unwrap();

        assert_matches!(result, Err(Error::Publish(PublishError::Cancelled)));
        assert_eq!(broker.messages().await.len(), 1);
        assert!(!broker.messages().await[0].acknowledged);
        assert_eq!(publisher.reporter().reports().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_unblocks() {
        let (_broker, handle) = setup(AckBehavior::Withhold).await;
        let publisher = Publisher::new(MemoryReporter::new());
        let ctx = ctx().with_timeout(Duration::from_secs(5));

        let result = publisher.publish(&ctx, &handle, "orders", "hello").await;

        assert_matches!(result, Err(Error::Publish(PublishError::TimedOut)));
    }

    #[tokio::test]
    async fn test_cancelled_context_never_submits() {
        let (broker, handle) = setup(AckBehavior::Acknowledge).await;
        let publisher = Publisher::new(MemoryReporter::new());
        let ctx = ctx();
        ctx.cancellation().cancel();

        let result = publisher.publish(&ctx, &handle, "orders", "hello").await;

        assert_matches!(result, Err(Error::Publish(PublishError::Cancelled)));
        assert!(broker.messages().await.is_empty());
    }

    #[tokio::test]
    async fn test_binary_payload_report_is_lossy() {
        let (_broker, handle) = setup(AckBehavior::Reject("nope".to_string())).await;
        let publisher = Publisher::new(MemoryReporter::new());

        let result = publisher
            .publish_bytes(&ctx(), &handle, "orders", Bytes::from_static(&[0x68, 0x69, 0xff]))
            .await;

        assert!(result.is_err());
        assert_eq!(
            publisher.reporter().reports()[0].message,
            "unable to publish message: message was 'hi\u{fffd}', topic was 'orders'"
        );
    }
}
