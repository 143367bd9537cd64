//! NATS `JetStream` implementation of the broker crate.
//!
//! The project identifier is the subject namespace: topic `orders` in project
//! `shop` is published on subject `shop.orders`. A `JetStream` stream must
//! capture those subjects (for example `shop.>`), otherwise every publish is
//! rejected with a "no responders" error.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::fmt::Debug;
use std::time::Duration;

use async_nats::jetstream::Context as JetStreamContext;
use async_nats::jetstream::context::PublishAckFuture;
use async_nats::{ConnectOptions, Event};
use async_trait::async_trait;
use bytes::Bytes;
use pubsub_bridge_broker::{Acknowledgment, Connection, Connector, PublisherConfig, Topic};
use tracing::{debug, info, instrument, warn};

/// Endpoint used when the configuration does not name one.
pub const DEFAULT_ENDPOINT: &str = "localhost:4222";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens `JetStream` connections.
#[derive(Clone, Debug, Default)]
pub struct NatsConnector {
    ack_timeout: Option<Duration>,
}

impl NatsConnector {
    /// Creates a connector using the client's default acknowledgment timeout.
    #[must_use]
    pub const fn new() -> Self {
        Self { ack_timeout: None }
    }

    /// Bounds how long `JetStream` waits for a publish acknowledgment.
    #[must_use]
    pub const fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl Connector for NatsConnector {
    type Error = Error;
    type Connection = NatsConnection;

    #[instrument(skip(self, config), fields(project_id = %config.project_id))]
    async fn connect(&self, config: &PublisherConfig) -> Result<NatsConnection, Error> {
        let namespace = subject_token(&config.project_id)?;
        let endpoint = config.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);

        info!(%endpoint, "connecting to NATS");

        let client = ConnectOptions::new()
            .connection_timeout(config.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT))
            .event_callback(|event| async move { log_event(event) })
            .connect(endpoint)
            .await
            .map_err(|source| {
                warn!(%endpoint, error = %source, "failed to connect to NATS");
                Error::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                }
            })?;

        let mut jetstream = async_nats::jetstream::new(client);
        if let Some(timeout) = self.ack_timeout {
            jetstream.set_timeout(timeout);
        }

        info!(%endpoint, "connected to NATS");

        Ok(NatsConnection {
            jetstream,
            namespace: namespace.to_string(),
        })
    }
}

fn log_event(event: Event) {
    match event {
        Event::Connected => info!("NATS connected"),
        Event::Disconnected => warn!("NATS disconnected"),
        Event::ServerError(err) => warn!(error = %err, "NATS server error"),
        Event::ClientError(err) => warn!(error = %err, "NATS client error"),
        Event::SlowConsumer(sid) => warn!(sid, "NATS slow consumer"),
        Event::LameDuckMode => warn!("NATS server entering lame duck mode"),
        Event::Draining => debug!("NATS connection draining"),
        Event::Closed => debug!("NATS connection closed"),
    }
}

fn subject_token(name: &str) -> Result<&str, Error> {
    if name.is_empty()
        || name
            .chars()
            .any(|c| c == '.' || c == '*' || c == '>' || c.is_whitespace())
    {
        return Err(Error::InvalidSubjectPartial(name.to_string()));
    }

    Ok(name)
}

/// A `JetStream` connection scoped to one project namespace.
#[derive(Clone, Debug)]
pub struct NatsConnection {
    jetstream: JetStreamContext,
    namespace: String,
}

impl Connection for NatsConnection {
    type Error = Error;
    type Topic = NatsTopic;

    fn topic(&self, name: &str) -> Result<NatsTopic, Error> {
        let token = subject_token(name)?;

        Ok(NatsTopic {
            jetstream: self.jetstream.clone(),
            name: token.to_string(),
            subject: format!("{}.{token}", self.namespace),
        })
    }
}

/// A topic backed by a `JetStream` subject.
#[derive(Clone, Debug)]
pub struct NatsTopic {
    jetstream: JetStreamContext,
    name: String,
    subject: String,
}

impl NatsTopic {
    /// The full subject messages are published on.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

#[async_trait]
impl Topic for NatsTopic {
    type Error = Error;
    type Acknowledgment = NatsAcknowledgment;

    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(&self, payload: Bytes) -> Result<NatsAcknowledgment, Error> {
        let future = self
            .jetstream
            .publish(self.subject.clone(), payload)
            .await?;

        Ok(NatsAcknowledgment {
            future,
            subject: self.subject.clone(),
        })
    }
}

/// Pending `JetStream` publish acknowledgment.
pub struct NatsAcknowledgment {
    future: PublishAckFuture,
    subject: String,
}

impl Debug for NatsAcknowledgment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsAcknowledgment")
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Acknowledgment for NatsAcknowledgment {
    type Error = Error;

    async fn wait(self) -> Result<(), Error> {
        let ack = self.future.await?;

        debug!(
            subject = %self.subject,
            stream = %ack.stream,
            sequence = ack.sequence,
            duplicate = ack.duplicate,
            "JetStream acknowledged message"
        );

        Ok(())
    }
}
