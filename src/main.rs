use rabbit_pubsub::env::Settings;
use rabbit_pubsub::{DeliveryContext, Message, Publisher, Subscriber};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::load()?;

    let mut consumer = None;
    let mut subscriber = match settings.subscriber_options() {
        Some(options) => Some(Subscriber::new(&settings.amqp_addr, options)?),
        None => None,
    };
    if let Some(subscriber) = subscriber.as_mut() {
        let handle = subscriber
            .start(|message: Message, context: DeliveryContext| async move {
                info!(
                    routing_key = %message.routing_key(),
                    "Received: {}",
                    message.payload_str()
                );
                if let Err(e) = context.ack().await {
                    error!("Failed to acknowledge message: {}", e);
                }
            })
            .await?;
        info!(consumer_tag = %handle.consumer_tag(), "Subscriber running");
        consumer = Some(handle);
    }

    if let (Some(key), Some(body)) = (&settings.publish_key, &settings.publish_body) {
        let mut publisher = Publisher::new(&settings.amqp_addr, settings.connection.clone())?;
        publisher.start().await?;
        publisher.publish(key, body).await?;
        info!(routing_key = %key, "Published message");
    }

    info!("Service running. Press Ctrl+C to exit.");
    tokio::signal::ctrl_c().await?;

    if let Some(handle) = consumer {
        handle.abort();
    }
    Ok(())
}
