use crate::connection::BrokerError;

use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;

/// A named destination that accepts messages.
#[async_trait]
pub trait Topic
where
    Self: Clone + Debug + Send + Sync + 'static,
{
    /// The error type for the broker.
    type Error: BrokerError;

    /// The pending acknowledgment returned by `publish`.
    type Acknowledgment: Acknowledgment<Error = Self::Error>;

    /// The topic name as given at resolution.
    fn name(&self) -> &str;

    /// Submits a payload for publishing.
    ///
    /// Returning `Ok` means the payload was handed to the broker, not that the
    /// broker accepted it; that is only known once the acknowledgment resolves.
    async fn publish(&self, payload: Bytes) -> Result<Self::Acknowledgment, Self::Error>;
}

/// A pending broker acknowledgment for one submitted message.
#[async_trait]
pub trait Acknowledgment
where
    Self: Debug + Send + 'static,
{
    /// The error type for the broker.
    type Error: BrokerError;

    /// Waits until the broker accepts or rejects the message.
    async fn wait(self) -> Result<(), Self::Error>;
}
