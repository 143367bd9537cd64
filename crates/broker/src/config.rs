use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;

/// Key naming the target project (the messaging namespace). Required.
pub const PROJECT_ID_KEY: &str = "ProjectID";

/// Key naming the broker endpoint. Optional; backends pick a default.
pub const ENDPOINT_KEY: &str = "Endpoint";

/// Key holding the connect timeout in milliseconds. Optional.
pub const CONNECT_TIMEOUT_KEY: &str = "ConnectTimeout";

/// Errors raised while decoding a publisher configuration.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required key is absent (or null).
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    /// A key holds a value of the wrong type.
    #[error("field '{field}' must be {expected}, got {found}")]
    InvalidType {
        /// The offending key.
        field: &'static str,
        /// What the decoder accepts.
        expected: &'static str,
        /// The JSON type that was supplied.
        found: &'static str,
    },

    /// A string key is empty or only whitespace.
    #[error("field '{0}' must not be empty")]
    EmptyField(&'static str),
}

/// Strict publisher configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublisherConfig {
    /// Identifies the target messaging project/namespace.
    pub project_id: String,

    /// Broker endpoint. `None` lets the backend use its default.
    pub endpoint: Option<String>,

    /// Upper bound on establishing the connection.
    pub connect_timeout: Option<Duration>,
}

impl PublisherConfig {
    /// Creates a configuration for the given project.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyField` if the project identifier is blank.
    pub fn new(project_id: impl Into<String>) -> Result<Self, ConfigError> {
        let project_id = project_id.into();
        if project_id.trim().is_empty() {
            return Err(ConfigError::EmptyField(PROJECT_ID_KEY));
        }

        Ok(Self {
            project_id,
            endpoint: None,
            connect_timeout: None,
        })
    }

    /// Sets the broker endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Decodes a configuration from a dynamic mapping.
    ///
    /// Keys match case-insensitively, with an exact-case key taking precedence.
    /// Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `ProjectID` is missing, blank, or not a string,
    /// or if an optional key holds a value of the wrong type.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, ConfigError> {
        let project_id = match lookup(map, PROJECT_ID_KEY) {
            None => return Err(ConfigError::MissingField(PROJECT_ID_KEY)),
            Some(value) => string_field(PROJECT_ID_KEY, value)?,
        };

        let mut config = Self::new(project_id)?;

        if let Some(value) = lookup(map, ENDPOINT_KEY) {
            config.endpoint = Some(string_field(ENDPOINT_KEY, value)?);
        }

        if let Some(value) = lookup(map, CONNECT_TIMEOUT_KEY) {
            let millis = value
                .as_u64()
                .filter(|&millis| millis > 0)
                .ok_or_else(|| ConfigError::InvalidType {
                    field: CONNECT_TIMEOUT_KEY,
                    expected: "a positive integer (milliseconds)",
                    found: type_name(value),
                })?;
            config.connect_timeout = Some(Duration::from_millis(millis));
        }

        Ok(config)
    }
}

// Null counts as absent.
fn lookup<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key)
        .or_else(|| {
            map.iter()
                .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
                .map(|(_, value)| value)
        })
        .filter(|value| !value.is_null())
}

fn string_field(field: &'static str, value: &Value) -> Result<String, ConfigError> {
    match value {
        Value::String(s) if s.trim().is_empty() => Err(ConfigError::EmptyField(field)),
        Value::String(s) => Ok(s.clone()),
        other => Err(ConfigError::InvalidType {
            field,
            expected: "a string",
            found: type_name(other),
        }),
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
