use crate::config::PublisherConfig;
use crate::topic::Topic;

use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;

/// Marker trait for broker errors
pub trait BrokerError: Error + Send + Sync + 'static {}

/// Opens connections to a broker.
#[async_trait]
pub trait Connector
where
    Self: Clone + Debug + Send + Sync + 'static,
{
    /// The error type for the broker.
    type Error: BrokerError;

    /// The type of connection opened by the connector.
    type Connection: Connection<Error = Self::Error>;

    /// Opens a connection, waiting until it is established or fails.
    async fn connect(&self, config: &PublisherConfig) -> Result<Self::Connection, Self::Error>;
}

/// An open broker connection.
///
/// Connections are cheap to clone and every clone shares the same underlying
/// transport, so one connection can serve any number of concurrent publishes.
pub trait Connection
where
    Self: Clone + Debug + Send + Sync + 'static,
{
    /// The error type for the broker.
    type Error: BrokerError;

    /// The type of topic resolved by the connection.
    type Topic: Topic<Error = Self::Error>;

    /// Resolves a topic by name.
    ///
    /// Resolution is local: it never checks that the topic exists on the broker.
    ///
    /// # Errors
    ///
    /// Returns an error if the broker cannot address a topic with this name.
    fn topic(&self, name: &str) -> Result<Self::Topic, Self::Error>;
}
