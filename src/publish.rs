use async_trait::async_trait;
use tracing::info;

use crate::core::config::PublishConfig;
use crate::core::error::Result;
use crate::core::forex::Forex;

/// Outbound sink for forex change events. The destination is fixed per
/// instance; the payload is the full updated record, not a diff.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish_forex(&self, forex: &Forex) -> Result<()>;
}

/// Publisher that logs the serialized record. Stands in for a broker
/// binding; swap behind the trait to integrate one.
pub struct TracingPublisher {
    exchange: String,
    routing_key: String,
}

impl TracingPublisher {
    pub fn new(config: &PublishConfig) -> Self {
        TracingPublisher {
            exchange: config.exchange.clone(),
            routing_key: config.routing_key.clone(),
        }
    }
}

#[async_trait]
impl Publisher for TracingPublisher {
    async fn publish_forex(&self, forex: &Forex) -> Result<()> {
        let payload = serde_json::to_string(forex)?;
        info!(
            exchange = %self.exchange,
            routing_key = %self.routing_key,
            %payload,
            "Published forex update"
        );
        Ok(())
    }
}

/// Records published payloads in memory. Test double.
#[derive(Default)]
pub struct RecordingPublisher {
    published: tokio::sync::Mutex<Vec<Forex>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn published(&self) -> Vec<Forex> {
        self.published.lock().await.clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish_forex(&self, forex: &Forex) -> Result<()> {
        self.published.lock().await.push(forex.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forex::{Currency, ForexQuote};
    use chrono::Utc;

    #[tokio::test]
    async fn test_recording_publisher_captures_payloads() {
        let publisher = RecordingPublisher::new();
        let forex = Forex::new(
            &Currency::new("USD"),
            &Currency::new("EUR"),
            &ForexQuote {
                exchange_rate: 0.92,
                bid: 0.91,
                ask: 0.93,
            },
            Utc::now(),
        );

        publisher.publish_forex(&forex).await.unwrap();
        let published = publisher.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].symbol, "USD/EUR");
        assert_eq!(published[0].exchange_rate, 0.92);
    }
}
