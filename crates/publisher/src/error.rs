use pubsub_bridge_broker::{BrokerError, ConfigError};
use thiserror::Error;

/// Errors surfaced to the host.
#[derive(Debug, Error)]
pub enum Error<E>
where
    E: BrokerError,
{
    /// The configuration mapping could not be decoded.
    #[error("unable to read publisher config: {0}")]
    Configuration(#[from] ConfigError),

    /// The broker could not be reached or refused the connection.
    #[error("unable to initialise publisher: {0}")]
    Connection(#[source] E),

    /// The call was made without call-scoped state.
    #[error("no active execution state")]
    Context,

    /// The message was not acknowledged.
    #[error(transparent)]
    Publish(#[from] PublishError<E>),
}

/// Ways a single publish can fail.
#[derive(Debug, Error)]
pub enum PublishError<E>
where
    E: BrokerError,
{
    /// The topic name is empty.
    #[error("topic name must not be empty")]
    EmptyTopic,

    /// The broker cannot address the topic.
    #[error("invalid topic '{topic}': {source}")]
    InvalidTopic {
        /// The topic as given by the caller.
        topic: String,
        /// The broker's reason.
        source: E,
    },

    /// Submission failed or the broker rejected the message.
    #[error("message not acknowledged: {0}")]
    Rejected(#[source] E),

    /// The context was cancelled before the broker answered.
    #[error("publish cancelled before acknowledgment")]
    Cancelled,

    /// The context's deadline passed before the broker answered.
    #[error("publish timed out waiting for acknowledgment")]
    TimedOut,
}
