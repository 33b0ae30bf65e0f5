// src/rabbitmq/mod.rs
// Publish/subscribe over RabbitMQ topic exchanges

pub mod errors;
pub mod broker;
pub mod connection;       // Retrying connection establishment
pub mod message;
pub mod publisher;
pub mod subscriber;

// lapin-backed broker collaborator
mod amqp_client;
mod state;

// Re-export specific items to simplify imports elsewhere
pub use amqp_client::{connection_properties, LapinBroker};
pub use broker::{Broker, BrokerChannel, BrokerConnection, Delivery, DeliveryStream};
pub use connection::{retry, ConnectionOpener, RetryExhausted, RetryPolicy};
pub use errors::{BrokerError, PubSubError, Result};
pub use message::Message;
pub use publisher::Publisher;
pub use state::ComponentState;
pub use subscriber::{ConsumerHandle, DeliveryContext, MessageHandler, Subscriber, PREFETCH_COUNT};
