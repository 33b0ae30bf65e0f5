use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::amqp_client::LapinBroker;
use super::broker::{Broker, BrokerChannel, BrokerConnection, DeliveryStream};
use super::connection::ConnectionOpener;
use super::errors::{PubSubError, Result};
use super::message::Message;
use super::state::ComponentState;
use crate::config::{SubscriberConfig, SubscriberOptions};

/// Unacknowledged deliveries a subscriber may hold at once.
pub const PREFETCH_COUNT: u16 = 1;

/// Per-delivery handle given to the handler alongside the message.
///
/// Until `ack` is called no further delivery reaches this consumer.
#[derive(Clone)]
pub struct DeliveryContext {
    channel: Arc<dyn BrokerChannel>,
    delivery_tag: u64,
}

impl DeliveryContext {
    fn new(channel: Arc<dyn BrokerChannel>, delivery_tag: u64) -> Self {
        Self {
            channel,
            delivery_tag,
        }
    }

    pub fn delivery_tag(&self) -> u64 {
        self.delivery_tag
    }

    pub async fn ack(&self) -> Result<()> {
        debug!(delivery_tag = self.delivery_tag, "Sending ack");
        self.channel
            .ack(self.delivery_tag)
            .await
            .map_err(PubSubError::channel("ack"))
    }
}

#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    async fn handle(&self, message: Message, context: DeliveryContext);
}

#[async_trait]
impl<F, Fut> MessageHandler for F
where
    F: Fn(Message, DeliveryContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn handle(&self, message: Message, context: DeliveryContext) {
        (self)(message, context).await
    }
}

/// Returned by [`Subscriber::start`] once the consumer is registered.
pub struct ConsumerHandle {
    consumer_tag: String,
    task: JoinHandle<()>,
}

impl ConsumerHandle {
    pub fn consumer_tag(&self) -> &str {
        &self.consumer_tag
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops dispatching. Deliveries already handed to the handler are not
    /// acknowledged on its behalf.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Waits until the broker closes the delivery stream.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                error!(consumer_tag = %self.consumer_tag, "Consumer task failed: {}", e);
            }
        }
    }
}

/// Declares an exchange and a queue, binds them and feeds deliveries to a
/// handler with manual acknowledgement.
pub struct Subscriber {
    config: SubscriberConfig,
    opener: ConnectionOpener,
    // Not read; held so the connection outlives the channel.
    connection: Option<Box<dyn BrokerConnection>>,
    channel: Option<Arc<dyn BrokerChannel>>,
    state: ComponentState,
}

impl Subscriber {
    pub fn new(connection_string: &str, options: SubscriberOptions) -> Result<Self> {
        Self::with_broker(Arc::new(LapinBroker::new()), connection_string, options)
    }

    pub fn with_broker(
        broker: Arc<dyn Broker>,
        connection_string: &str,
        options: SubscriberOptions,
    ) -> Result<Self> {
        let config = SubscriberConfig::new(connection_string, options)?;
        let opener = ConnectionOpener::new(broker, config.connection().retry_policy());

        Ok(Subscriber {
            config,
            opener,
            connection: None,
            channel: None,
            state: ComponentState::Created,
        })
    }

    pub fn config(&self) -> &SubscriberConfig {
        &self.config
    }

    pub fn state(&self) -> ComponentState {
        self.state
    }

    pub async fn start<H: MessageHandler>(&mut self, handler: H) -> Result<ConsumerHandle> {
        self.state.ensure_created("subscriber")?;
        info!(
            exchange = %self.config.connection().exchange(),
            queue = %self.config.queue(),
            "Starting subscriber"
        );

        match self.open().await {
            Ok((connection, channel, deliveries, consumer_tag)) => {
                let handler: Arc<dyn MessageHandler> = Arc::new(handler);
                let task = tokio::spawn(dispatch(
                    deliveries,
                    handler,
                    channel.clone(),
                    self.config.queue().to_string(),
                ));

                self.connection = Some(connection);
                self.channel = Some(channel);
                self.state = ComponentState::Ready;

                Ok(ConsumerHandle { consumer_tag, task })
            }
            Err(e) => {
                error!(queue = %self.config.queue(), "Subscriber failed to start: {}", e);
                self.state = ComponentState::Failed;
                Err(e)
            }
        }
    }

    async fn open(
        &self,
    ) -> Result<(
        Box<dyn BrokerConnection>,
        Arc<dyn BrokerChannel>,
        DeliveryStream,
        String,
    )> {
        let settings = self.config.connection();
        let exchange = settings.exchange();
        let queue = self.config.queue();

        let connection = self.opener.open(settings.connection_string()).await?;
        let channel = connection
            .create_channel()
            .await
            .map_err(PubSubError::channel("create channel"))?;
        debug!("Connected to channel");

        debug!(exchange, kind = %settings.exchange_type(), "Asserting exchange");
        channel
            .declare_exchange(exchange, settings.exchange_type(), settings.durable())
            .await
            .map_err(|e| PubSubError::declaration(format!("exchange '{}'", exchange), e))?;

        debug!(queue, "Asserting queue");
        channel
            .declare_queue(queue, self.config.queue_durable())
            .await
            .map_err(|e| PubSubError::declaration(format!("queue '{}'", queue), e))?;

        for routing_key in self.config.routing_keys() {
            debug!(queue, exchange, routing_key = %routing_key, "Binding queue");
            channel
                .bind_queue(queue, exchange, routing_key)
                .await
                .map_err(|e| {
                    PubSubError::declaration(
                        format!(
                            "binding of queue '{}' to exchange '{}' with key '{}'",
                            queue, exchange, routing_key
                        ),
                        e,
                    )
                })?;
        }

        channel
            .prefetch(PREFETCH_COUNT)
            .await
            .map_err(PubSubError::channel("prefetch"))?;

        let consumer_tag = format!("consumer-{}", Uuid::new_v4());
        debug!(queue, consumer_tag = %consumer_tag, "Consuming from queue");
        let deliveries = channel
            .consume(queue, &consumer_tag, true)
            .await
            .map_err(PubSubError::channel("consume"))?;

        Ok((connection, channel, deliveries, consumer_tag))
    }

    /// Acknowledges a delivery received by this subscriber.
    pub async fn ack(&self, message: &Message) -> Result<()> {
        let channel = self.channel.as_ref().ok_or_else(|| {
            PubSubError::Usage(
                "Connection not found. Make sure you first call subscriber.start".to_string(),
            )
        })?;

        debug!(delivery_tag = message.delivery_tag(), "Sending ack");
        channel
            .ack(message.delivery_tag())
            .await
            .map_err(PubSubError::channel("ack"))
    }
}

// Deliveries are handled one at a time, in broker order.
async fn dispatch(
    mut deliveries: DeliveryStream,
    handler: Arc<dyn MessageHandler>,
    channel: Arc<dyn BrokerChannel>,
    queue: String,
) {
    info!(queue = %queue, "Consumer started");

    while let Some(result) = deliveries.next().await {
        match result {
            Ok(delivery) => {
                debug!(
                    queue = %queue,
                    delivery_tag = delivery.delivery_tag,
                    routing_key = %delivery.routing_key,
                    "Received message"
                );
                let context = DeliveryContext::new(channel.clone(), delivery.delivery_tag);
                handler.handle(Message::from(delivery), context).await;
            }
            Err(e) => error!(queue = %queue, "Error receiving message: {}", e),
        }
    }

    info!(queue = %queue, "Consumer stream closed");
}
