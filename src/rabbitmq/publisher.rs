use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info};

use super::amqp_client::LapinBroker;
use super::broker::{Broker, BrokerChannel, BrokerConnection};
use super::connection::ConnectionOpener;
use super::errors::{PubSubError, Result};
use super::message::Message;
use super::state::ComponentState;
use crate::config::{ConnectionConfig, ConnectionOptions};

/// Declares one exchange and publishes raw payloads to it.
pub struct Publisher {
    config: ConnectionConfig,
    opener: ConnectionOpener,
    // Not read; held so the connection outlives the channel.
    connection: Option<Box<dyn BrokerConnection>>,
    channel: Option<Arc<dyn BrokerChannel>>,
    state: ComponentState,
}

impl Publisher {
    /// Creates a publisher backed by lapin. Fails before any network activity
    /// if the connection string or exchange is empty.
    pub fn new(connection_string: &str, options: ConnectionOptions) -> Result<Self> {
        Self::with_broker(Arc::new(LapinBroker::new()), connection_string, options)
    }

    pub fn with_broker(
        broker: Arc<dyn Broker>,
        connection_string: &str,
        options: ConnectionOptions,
    ) -> Result<Self> {
        let config = ConnectionConfig::new(connection_string, options)?;
        let opener = ConnectionOpener::new(broker, config.retry_policy());

        Ok(Publisher {
            config,
            opener,
            connection: None,
            channel: None,
            state: ComponentState::Created,
        })
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn state(&self) -> ComponentState {
        self.state
    }

    /// Connects (with retries), opens a channel and declares the exchange.
    pub async fn start(&mut self) -> Result<()> {
        self.state.ensure_created("publisher")?;
        info!(exchange = %self.config.exchange(), "Starting publisher");

        match self.open().await {
            Ok((connection, channel)) => {
                self.connection = Some(connection);
                self.channel = Some(channel);
                self.state = ComponentState::Ready;
                info!(exchange = %self.config.exchange(), "Publisher ready");
                Ok(())
            }
            Err(e) => {
                error!(exchange = %self.config.exchange(), "Publisher failed to start: {}", e);
                self.state = ComponentState::Failed;
                Err(e)
            }
        }
    }

    async fn open(&self) -> Result<(Box<dyn BrokerConnection>, Arc<dyn BrokerChannel>)> {
        let connection = self
            .opener
            .open(self.config.connection_string())
            .await?;

        let channel = connection
            .create_channel()
            .await
            .map_err(PubSubError::channel("create channel"))?;
        debug!("Connected to channel");

        debug!(
            exchange = %self.config.exchange(),
            kind = %self.config.exchange_type(),
            durable = self.config.durable(),
            "Asserting exchange"
        );
        channel
            .declare_exchange(
                self.config.exchange(),
                self.config.exchange_type(),
                self.config.durable(),
            )
            .await
            .map_err(|e| {
                PubSubError::declaration(format!("exchange '{}'", self.config.exchange()), e)
            })?;

        Ok((connection, channel))
    }

    fn channel(&self) -> Result<&Arc<dyn BrokerChannel>> {
        self.channel.as_ref().ok_or_else(|| {
            PubSubError::Usage(
                "Connection not found. Make sure you first call publisher.start".to_string(),
            )
        })
    }

    /// Hands `message` to the channel as raw bytes. The routing key is passed
    /// through as given, including the empty key used by fanout exchanges.
    pub async fn publish(&self, routing_key: &str, message: impl AsRef<[u8]>) -> Result<()> {
        let channel = self.channel()?;
        let payload = message.as_ref();

        debug!(
            exchange = %self.config.exchange(),
            routing_key,
            bytes = payload.len(),
            "Publishing message"
        );

        channel
            .publish(self.config.exchange(), routing_key, payload)
            .await
            .map_err(PubSubError::channel("publish"))
    }

    pub async fn publish_json<T: Serialize>(&self, routing_key: &str, message: &T) -> Result<()> {
        // check state before paying for serialization
        self.channel()?;
        let payload = serde_json::to_vec(message)?;
        self.publish(routing_key, payload).await
    }

    /// Acknowledges a delivery received on this publisher's channel.
    pub async fn ack(&self, message: &Message) -> Result<()> {
        let channel = self.channel()?;
        debug!(delivery_tag = message.delivery_tag(), "Sending ack");
        channel
            .ack(message.delivery_tag())
            .await
            .map_err(PubSubError::channel("ack"))
    }

    /// Negatively acknowledges a delivery; the broker requeues it.
    pub async fn nack(&self, message: &Message) -> Result<()> {
        let channel = self.channel()?;
        debug!(delivery_tag = message.delivery_tag(), "Sending nack");
        channel
            .nack(message.delivery_tag())
            .await
            .map_err(PubSubError::channel("nack"))
    }
}
