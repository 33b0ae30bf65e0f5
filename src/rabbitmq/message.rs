use std::borrow::Cow;

use serde::de::DeserializeOwned;

use super::broker::Delivery;

/// A message received by a subscriber.
///
/// The payload is passed through untouched; the helpers below only
/// interpret it on request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    delivery_tag: u64,
    exchange: String,
    routing_key: String,
    redelivered: bool,
    payload: Vec<u8>,
}

impl Message {
    /// Token identifying this delivery on the channel it arrived on.
    pub fn delivery_tag(&self) -> u64 {
        self.delivery_tag
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }

    pub fn redelivered(&self) -> bool {
        self.redelivered
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    pub fn payload_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.payload)
    }
}

impl From<Delivery> for Message {
    fn from(delivery: Delivery) -> Self {
        Message {
            delivery_tag: delivery.delivery_tag,
            exchange: delivery.exchange,
            routing_key: delivery.routing_key,
            redelivered: delivery.redelivered,
            payload: delivery.data,
        }
    }
}
