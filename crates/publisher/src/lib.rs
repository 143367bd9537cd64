//! Publish-and-confirm bridge between a load-testing host and a message broker.
//!
//! A host builds one [`ConnectionHandle`] per configuration with a
//! [`ClientFactory`], then calls [`Publisher::publish`] from any number of
//! concurrent virtual users. Each publish returns only once the broker has
//! acknowledged or rejected the message, or the caller's
//! [`ExecutionContext`] is cancelled.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod context;
mod error;
mod factory;
mod handle;
mod publisher;
mod reporter;

pub use context::{ExecutionContext, VuState};
pub use error::{Error, PublishError};
pub use factory::ClientFactory;
pub use handle::ConnectionHandle;
pub use publisher::Publisher;
pub use reporter::{ErrorReporter, MemoryReporter, Report, TracingReporter};

pub use pubsub_bridge_broker::{ConfigError, PublisherConfig};

/// Import path under which hosts register the bridge for scripts.
pub const MODULE_PATH: &str = "k6/x/pubsub";
