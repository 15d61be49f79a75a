use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Transaction event carried on the pub/sub transport.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionEvent {
    pub id: i64,
    pub user_id: String,
    pub category: String,
    pub amount: i64,
}

/// Publishes transaction events to NATS.
pub struct EventPublisher {
    client: async_nats::Client,
    topic: String,
}

impl EventPublisher {
    pub async fn connect(url: &str, topic: String) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client, topic })
    }

    pub async fn publish_transaction(&self, event: &TransactionEvent) -> Result<()> {
        let payload = serde_json::to_vec(event)?;

        self.client
            .publish(self.topic.clone(), payload.into())
            .await
            .context("Failed to publish transaction event")?;

        info!(
            topic = %self.topic,
            id = event.id,
            category = %event.category,
            "published transaction event"
        );

        Ok(())
    }
}
