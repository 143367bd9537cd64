//! In-memory (single process) broker for tests and local dry runs.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod topic;

pub use error::Error;
pub use topic::{MemoryAcknowledgment, MemoryTopic};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use pubsub_bridge_broker::{Connection, Connector, PublisherConfig};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// How the broker answers submitted messages.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AckBehavior {
    /// Acknowledge immediately.
    #[default]
    Acknowledge,

    /// Acknowledge after the given delay.
    Delay(Duration),

    /// Reject every message with the given reason.
    Reject(String),

    /// Never answer.
    Withhold,
}

/// A message handed to the broker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishedMessage {
    /// Project of the connection that submitted the message.
    pub project_id: String,

    /// Topic the message was submitted to.
    pub topic: String,

    /// Raw payload.
    pub payload: Bytes,

    /// Broker-assigned sequence, starting at 1.
    pub sequence: u64,

    /// Whether the broker acknowledged the message.
    pub acknowledged: bool,
}

#[derive(Debug, Default)]
struct BrokerState {
    behavior: Mutex<AckBehavior>,
    connects: AtomicUsize,
    messages: Mutex<Vec<PublishedMessage>>,
    refusal: Mutex<Option<String>>,
}

/// In-memory broker. Clones share the same state, so a test can keep one
/// clone for inspection while handing another to the code under test.
#[derive(Clone, Debug, Default)]
pub struct MemoryConnector {
    state: Arc<BrokerState>,
}

impl MemoryConnector {
    /// Creates a broker that acknowledges everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a broker that answers submissions with `behavior`.
    #[must_use]
    pub fn with_ack_behavior(behavior: AckBehavior) -> Self {
        Self {
            state: Arc::new(BrokerState {
                behavior: Mutex::new(behavior),
                ..BrokerState::default()
            }),
        }
    }

    /// Creates a broker that refuses every connection with `reason`.
    #[must_use]
    pub fn refusing(reason: impl Into<String>) -> Self {
        Self {
            state: Arc::new(BrokerState {
                refusal: Mutex::new(Some(reason.into())),
                ..BrokerState::default()
            }),
        }
    }

    /// Changes how subsequent submissions are answered.
    pub async fn set_ack_behavior(&self, behavior: AckBehavior) {
        *self.state.behavior.lock().await = behavior;
    }

    /// Number of connection attempts, refused ones included.
    #[must_use]
    pub fn connect_attempts(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    /// Every message submitted so far, in submission order.
    pub async fn messages(&self) -> Vec<PublishedMessage> {
        self.state.messages.lock().await.clone()
    }

    /// Messages submitted to `topic`.
    pub async fn messages_on(&self, topic: &str) -> Vec<PublishedMessage> {
        self.state
            .messages
            .lock()
            .await
            .iter()
            .filter(|message| message.topic == topic)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    type Error = Error;
    type Connection = MemoryConnection;

    async fn connect(&self, config: &PublisherConfig) -> Result<MemoryConnection, Error> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = self.state.refusal.lock().await.clone() {
            warn!(project_id = %config.project_id, %reason, "refusing connection");
            return Err(Error::ConnectionRefused(reason));
        }

        debug!(project_id = %config.project_id, "memory connection opened");

        Ok(MemoryConnection {
            project_id: config.project_id.clone(),
            state: self.state.clone(),
        })
    }
}

/// A connection to the in-memory broker.
#[derive(Clone, Debug)]
pub struct MemoryConnection {
    project_id: String,
    state: Arc<BrokerState>,
}

impl Connection for MemoryConnection {
    type Error = Error;
    type Topic = MemoryTopic;

    fn topic(&self, name: &str) -> Result<MemoryTopic, Error> {
        if name.chars().any(char::is_whitespace) {
            return Err(Error::InvalidTopic(name.to_string()));
        }

        Ok(MemoryTopic::new(
            self.project_id.clone(),
            name.to_string(),
            self.state.clone(),
        ))
    }
}
