use pubsub_bridge_broker::BrokerError;
use thiserror::Error;

/// Errors produced by the in-memory broker.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The broker was told to refuse connections.
    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    /// The topic name contains whitespace.
    #[error("invalid topic name '{0}' - must not contain whitespace")]
    InvalidTopic(String),

    /// The broker was told to reject messages.
    #[error("message rejected: {0}")]
    Rejected(String),
}

impl BrokerError for Error {}
