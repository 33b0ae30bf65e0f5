// src/config.rs
use std::fmt;
use std::str::FromStr;

use lapin::ExchangeKind;
use serde::{Deserialize, Serialize};

use crate::rabbitmq::connection::RetryPolicy;
use crate::rabbitmq::errors::{PubSubError, Result};

// Default values
fn default_durable() -> bool { true }
fn default_max_retries() -> u32 { 10 }
fn default_retry_interval_ms() -> u64 { 2000 }
fn default_routing_keys() -> Vec<String> { vec![String::new()] }

/// Routing behavior of an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeType {
    Direct,
    #[default]
    Fanout,
    Topic,
    Headers,
}

impl ExchangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeType::Direct => "direct",
            ExchangeType::Fanout => "fanout",
            ExchangeType::Topic => "topic",
            ExchangeType::Headers => "headers",
        }
    }
}

impl fmt::Display for ExchangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeType {
    type Err = PubSubError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(ExchangeType::Direct),
            "fanout" => Ok(ExchangeType::Fanout),
            "topic" => Ok(ExchangeType::Topic),
            "headers" => Ok(ExchangeType::Headers),
            other => Err(PubSubError::Configuration(format!(
                "unknown exchange type '{}'",
                other
            ))),
        }
    }
}

impl From<ExchangeType> for ExchangeKind {
    fn from(kind: ExchangeType) -> Self {
        match kind {
            ExchangeType::Direct => ExchangeKind::Direct,
            ExchangeType::Fanout => ExchangeKind::Fanout,
            ExchangeType::Topic => ExchangeKind::Topic,
            ExchangeType::Headers => ExchangeKind::Headers,
        }
    }
}

/// Options shared by publishers and subscribers.
///
/// Every field except `exchange` has a default:
/// `type = fanout`, `durable = true`, `maxRetries = 10`,
/// `retryIntervalMs = 2000`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ConnectionOptions {
    pub exchange: String,
    #[serde(rename = "type")]
    pub exchange_type: ExchangeType,
    pub durable: bool,
    pub max_retries: u32,
    pub retry_interval_ms: u64,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            exchange: String::new(),
            exchange_type: ExchangeType::default(),
            durable: default_durable(),
            max_retries: default_max_retries(),
            retry_interval_ms: default_retry_interval_ms(),
        }
    }
}

impl ConnectionOptions {
    pub fn new(exchange: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            ..Self::default()
        }
    }

    pub fn exchange_type(mut self, exchange_type: ExchangeType) -> Self {
        self.exchange_type = exchange_type;
        self
    }

    pub fn durable(mut self, durable: bool) -> Self {
        self.durable = durable;
        self
    }

    pub fn retry_policy(mut self, max_retries: u32, retry_interval_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_interval_ms = retry_interval_ms;
        self
    }
}

/// Subscriber options: the shared options plus queue and bindings.
///
/// Serialized as one flat object (`exchange`, `type`, ..., `queue`,
/// `queueDurable`, `routingKeys`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FlatSubscriberOptions", into = "FlatSubscriberOptions")]
pub struct SubscriberOptions {
    pub connection: ConnectionOptions,
    pub queue: String,
    pub queue_durable: bool,
    pub routing_keys: Vec<String>,
}

// serde ignores `deny_unknown_fields` on flattened structs, so the wire form
// lists every key itself.
#[derive(Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
struct FlatSubscriberOptions {
    exchange: String,
    #[serde(rename = "type")]
    exchange_type: ExchangeType,
    durable: bool,
    max_retries: u32,
    retry_interval_ms: u64,
    queue: String,
    queue_durable: bool,
    routing_keys: Vec<String>,
}

impl Default for FlatSubscriberOptions {
    fn default() -> Self {
        SubscriberOptions::default().into()
    }
}

impl From<FlatSubscriberOptions> for SubscriberOptions {
    fn from(flat: FlatSubscriberOptions) -> Self {
        Self {
            connection: ConnectionOptions {
                exchange: flat.exchange,
                exchange_type: flat.exchange_type,
                durable: flat.durable,
                max_retries: flat.max_retries,
                retry_interval_ms: flat.retry_interval_ms,
            },
            queue: flat.queue,
            queue_durable: flat.queue_durable,
            routing_keys: flat.routing_keys,
        }
    }
}

impl From<SubscriberOptions> for FlatSubscriberOptions {
    fn from(options: SubscriberOptions) -> Self {
        let ConnectionOptions {
            exchange,
            exchange_type,
            durable,
            max_retries,
            retry_interval_ms,
        } = options.connection;
        Self {
            exchange,
            exchange_type,
            durable,
            max_retries,
            retry_interval_ms,
            queue: options.queue,
            queue_durable: options.queue_durable,
            routing_keys: options.routing_keys,
        }
    }
}

impl Default for SubscriberOptions {
    fn default() -> Self {
        Self {
            connection: ConnectionOptions::default(),
            queue: String::new(),
            queue_durable: default_durable(),
            routing_keys: default_routing_keys(),
        }
    }
}

impl SubscriberOptions {
    pub fn new(exchange: impl Into<String>, queue: impl Into<String>) -> Self {
        Self {
            connection: ConnectionOptions::new(exchange),
            queue: queue.into(),
            ..Self::default()
        }
    }

    pub fn exchange_type(mut self, exchange_type: ExchangeType) -> Self {
        self.connection.exchange_type = exchange_type;
        self
    }

    pub fn retry_policy(mut self, max_retries: u32, retry_interval_ms: u64) -> Self {
        self.connection = self.connection.retry_policy(max_retries, retry_interval_ms);
        self
    }

    pub fn routing_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.routing_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn queue_durable(mut self, durable: bool) -> Self {
        self.queue_durable = durable;
        self
    }
}

/// Validated, immutable connection settings owned by a publisher or subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    connection_string: String,
    options: ConnectionOptions,
}

impl ConnectionConfig {
    pub fn new(connection_string: &str, options: ConnectionOptions) -> Result<Self> {
        if connection_string.trim().is_empty() {
            return Err(PubSubError::Configuration(
                "Connection string is required".to_string(),
            ));
        }
        if options.exchange.trim().is_empty() {
            return Err(PubSubError::Configuration("Exchange required".to_string()));
        }

        Ok(Self {
            connection_string: connection_string.to_string(),
            options,
        })
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    pub fn exchange(&self) -> &str {
        &self.options.exchange
    }

    pub fn exchange_type(&self) -> ExchangeType {
        self.options.exchange_type
    }

    pub fn durable(&self) -> bool {
        self.options.durable
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.options.max_retries, self.options.retry_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberConfig {
    connection: ConnectionConfig,
    queue: String,
    queue_durable: bool,
    routing_keys: Vec<String>,
}

impl SubscriberConfig {
    pub fn new(connection_string: &str, options: SubscriberOptions) -> Result<Self> {
        let SubscriberOptions {
            connection,
            queue,
            queue_durable,
            routing_keys,
        } = options;

        let connection = ConnectionConfig::new(connection_string, connection)?;
        if queue.trim().is_empty() {
            return Err(PubSubError::Configuration("Queue required".to_string()));
        }

        Ok(Self {
            connection,
            queue,
            queue_durable,
            routing_keys,
        })
    }

    pub fn connection(&self) -> &ConnectionConfig {
        &self.connection
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn queue_durable(&self) -> bool {
        self.queue_durable
    }

    pub fn routing_keys(&self) -> &[String] {
        &self.routing_keys
    }
}
