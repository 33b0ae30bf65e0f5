//! Minimal publish/subscribe over RabbitMQ exchanges.
//!
//! A [`Publisher`] declares an exchange and publishes raw payloads to it. A
//! [`Subscriber`] declares the same exchange plus a queue, binds the queue
//! with one or more routing keys and hands each delivery to a
//! [`MessageHandler`], one at a time, until the handler acknowledges it.

pub mod config;
pub mod env;
pub mod rabbitmq;

pub use config::{ConnectionConfig, ConnectionOptions, ExchangeType, SubscriberConfig, SubscriberOptions};
pub use rabbitmq::{
    ComponentState, ConsumerHandle, DeliveryContext, Message, MessageHandler, PubSubError,
    Publisher, Result, Subscriber,
};
