use crate::error::Error;
use crate::{AckBehavior, BrokerState, PublishedMessage};

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use pubsub_bridge_broker::{Acknowledgment, Topic};
use tracing::debug;

/// A topic on the in-memory broker.
#[derive(Clone, Debug)]
pub struct MemoryTopic {
    name: String,
    project_id: String,
    state: Arc<BrokerState>,
}

impl MemoryTopic {
    pub(crate) const fn new(project_id: String, name: String, state: Arc<BrokerState>) -> Self {
        Self {
            name,
            project_id,
            state,
        }
    }
}

#[async_trait]
impl Topic for MemoryTopic {
    type Error = Error;
    type Acknowledgment = MemoryAcknowledgment;

    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(&self, payload: Bytes) -> Result<MemoryAcknowledgment, Error> {
        let behavior = self.state.behavior.lock().await.clone();

        let sequence = {
            let mut messages = self.state.messages.lock().await;
            let sequence = messages.len() as u64 + 1;
            messages.push(PublishedMessage {
                project_id: self.project_id.clone(),
                topic: self.name.clone(),
                payload,
                sequence,
                acknowledged: false,
            });
            sequence
        };

        debug!(topic = %self.name, sequence, "memory message submitted");

        Ok(MemoryAcknowledgment {
            behavior,
            sequence,
            state: self.state.clone(),
        })
    }
}

/// Pending answer for one in-memory submission.
pub struct MemoryAcknowledgment {
    behavior: AckBehavior,
    sequence: u64,
    state: Arc<BrokerState>,
}

impl Debug for MemoryAcknowledgment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAcknowledgment")
            .field("behavior", &self.behavior)
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

impl MemoryAcknowledgment {
    async fn acknowledge(self) {
        let mut messages = self.state.messages.lock().await;
        if let Some(message) = messages.iter_mut().find(|m| m.sequence == self.sequence) {
            message.acknowledged = true;
        }
    }
}

#[async_trait]
impl Acknowledgment for MemoryAcknowledgment {
    type Error = Error;

    async fn wait(self) -> Result<(), Error> {
        match &self.behavior {
            AckBehavior::Acknowledge => {}
            AckBehavior::Delay(delay) => tokio::time::sleep(*delay).await,
            AckBehavior::Reject(reason) => return Err(Error::Rejected(reason.clone())),
            AckBehavior::Withhold => std::future::pending::<()>().await,
        }

        self.acknowledge().await;

        Ok(())
    }
}
