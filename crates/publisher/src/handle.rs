use std::sync::Arc;

use pubsub_bridge_broker::{Connection, PublisherConfig};

/// Shared handle to an open broker connection.
///
/// Clones are cheap and all refer to the same connection.
#[derive(Clone, Debug)]
pub struct ConnectionHandle<C>
where
    C: Connection,
{
    config: Arc<PublisherConfig>,
    connection: C,
}

impl<C> ConnectionHandle<C>
where
    C: Connection,
{
    pub(crate) fn new(connection: C, config: PublisherConfig) -> Self {
        Self {
            config: Arc::new(config),
            connection,
        }
    }

    /// The configuration the handle was created from.
    #[must_use]
    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// The project (namespace) messages are published into.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.config.project_id
    }

    pub(crate) fn topic(&self, name: &str) -> Result<C::Topic, C::Error> {
        self.connection.topic(name)
    }
}
