//! Abstract interface for publishing to a message broker.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Publisher configuration decoded from a dynamic key/value mapping.
pub mod config;

/// Connectors open connections; connections resolve topics.
pub mod connection;

/// Topics accept payloads and hand back acknowledgment tokens.
pub mod topic;

pub use config::{ConfigError, PublisherConfig};
pub use connection::{BrokerError, Connection, Connector};
pub use topic::{Acknowledgment, Topic};
