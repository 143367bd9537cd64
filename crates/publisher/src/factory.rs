use crate::error::Error;
use crate::handle::ConnectionHandle;

use pubsub_bridge_broker::{Connector, PublisherConfig};
use serde_json::{Map, Value};
use tracing::{error, info, instrument};

/// Builds connection handles from host-supplied configuration.
#[derive(Clone, Debug)]
pub struct ClientFactory<C>
where
    C: Connector,
{
    connector: C,
}

impl<C> ClientFactory<C>
where
    C: Connector,
{
    /// Creates a factory that opens connections through `connector`.
    pub const fn new(connector: C) -> Self {
        Self { connector }
    }

    /// Decodes `config` and opens a connection.
    ///
    /// The connector is only invoked once the configuration is valid.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the mapping cannot be decoded, or
    /// `Error::Connection` if the broker cannot be reached.
    #[instrument(skip_all)]
    pub async fn create_client(
        &self,
        config: &Map<String, Value>,
    ) -> Result<ConnectionHandle<C::Connection>, Error<C::Error>> {
        let config = PublisherConfig::from_map(config).inspect_err(|e| {
            error!(error = %e, "xk6-pubsub: unable to read publisher config");
        })?;

        self.connect(config).await
    }

    /// Opens a connection for an already decoded configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Connection` if the broker cannot be reached.
    #[instrument(skip_all, fields(project_id = %config.project_id))]
    pub async fn connect(
        &self,
        config: PublisherConfig,
    ) -> Result<ConnectionHandle<C::Connection>, Error<C::Error>> {
        let connection = self.connector.connect(&config).await.map_err(|e| {
            error!(error = %e, "xk6-pubsub: unable to initialise publisher");
            Error::Connection(e)
        })?;

        info!("publisher initialised");

        Ok(ConnectionHandle::new(connection, config))
    }
}
