// ============================================================================
// Messaging - outbound broker for order notifications
// ============================================================================

mod redpanda;

use async_trait::async_trait;

use crate::utils::CircuitState;

pub use redpanda::RedpandaClient;

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> anyhow::Result<()>;

    /// State of the breaker in front of the broker, if there is one
    async fn circuit_state(&self) -> CircuitState {
        CircuitState::Closed
    }
}

/// Publisher used when no broker is configured: notifications only reach the log
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> anyhow::Result<()> {
        tracing::info!(topic = %topic, key = %key, payload = %payload, "Notification (broker disabled)");
        Ok(())
    }
}
