// src/rabbitmq/errors.rs

use lapin::Error as LapinError;
use serde_json::Error as SerdeError;
use thiserror::Error;

/// Failure reported by the broker collaborator itself.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("AMQP transport error: {0}")]
    Lapin(#[from] LapinError),

    #[error("Broker transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum PubSubError {
    /// A required construction argument was missing or empty.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to connect to RabbitMQ after {attempts} attempt(s): {source}")]
    Connection {
        attempts: u32,
        #[source]
        source: BrokerError,
    },

    #[error("Failed to declare {what}: {source}")]
    Declaration {
        what: String,
        #[source]
        source: BrokerError,
    },

    /// The operation was invoked in the wrong lifecycle state.
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("RabbitMQ channel error during {op}: {source}")]
    Channel {
        op: &'static str,
        #[source]
        source: BrokerError,
    },

    #[error("Message serialization error: {0}")]
    Serialization(#[from] SerdeError),
}

// Custom Result type for publisher/subscriber operations
pub type Result<T> = std::result::Result<T, PubSubError>;

impl PubSubError {
    pub(crate) fn declaration(what: impl Into<String>, source: BrokerError) -> Self {
        PubSubError::Declaration {
            what: what.into(),
            source,
        }
    }

    pub(crate) fn channel(op: &'static str) -> impl FnOnce(BrokerError) -> Self {
        move |source| PubSubError::Channel { op, source }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, PubSubError::Configuration(_))
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, PubSubError::Connection { .. })
    }

    pub fn is_declaration(&self) -> bool {
        matches!(self, PubSubError::Declaration { .. })
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, PubSubError::Usage(_))
    }
}

impl From<String> for BrokerError {
    fn from(message: String) -> Self {
        BrokerError::Transport(message)
    }
}

impl From<&str> for BrokerError {
    fn from(message: &str) -> Self {
        BrokerError::Transport(message.to_string())
    }
}
