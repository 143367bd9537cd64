use pubsub_bridge_broker::BrokerError;
use thiserror::Error;

/// Errors that can occur when publishing through NATS `JetStream`.
#[derive(Debug, Error)]
pub enum Error {
    /// The connection could not be established.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        /// The endpoint that was dialled.
        endpoint: String,
        /// The underlying client error.
        source: async_nats::ConnectError,
    },

    /// The project or topic name cannot be used as a subject token.
    #[error("invalid subject token '{0}' - must not be empty or contain '.', '*', '>', whitespace")]
    InvalidSubjectPartial(String),

    /// The message could not be submitted, or `JetStream` did not acknowledge it.
    #[error("failed to publish: {0}")]
    Publish(#[from] async_nats::jetstream::context::PublishError),
}

impl BrokerError for Error {}
