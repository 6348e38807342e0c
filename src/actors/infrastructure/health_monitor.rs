use chrono::{DateTime, Utc};
use kameo::Actor;
use kameo::Reply;
use kameo::actor::ActorRef;
use kameo::error::Infallible;
use kameo::message::{Context, Message};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::actors::core::{ComponentHealth, HealthStatus};
use crate::messaging::EventPublisher;
use crate::metrics::Metrics;
use crate::utils::CircuitState;

// ============================================================================
// Health Monitor Actor - Monitors system health
// ============================================================================
//
// Responsibilities:
// - Track health status of all components
// - Poll the notification broker's circuit breaker
// - Aggregate system-wide health for /health and the health gauge
//
// ============================================================================

// ============================================================================
// Messages
// ============================================================================

pub struct UpdateHealth {
    pub component: String,
    pub status: HealthStatus,
    pub details: Option<String>,
}

pub struct GetSystemHealth;

#[derive(Debug, Clone, Serialize, Reply)]
pub struct SystemHealth {
    pub overall_status: HealthStatus,
    pub components: HashMap<String, ComponentHealth>,
    pub check_time: DateTime<Utc>,
}

// ============================================================================
// Health Monitor Actor
// ============================================================================

pub struct HealthMonitorActor {
    components: HashMap<String, ComponentHealth>,
    publisher: Arc<dyn EventPublisher>,
    metrics: Arc<Metrics>,
    check_interval: Duration,
}

impl HealthMonitorActor {
    pub fn new(publisher: Arc<dyn EventPublisher>, metrics: Arc<Metrics>, check_interval: Duration) -> Self {
        Self {
            components: HashMap::new(),
            publisher,
            metrics,
            check_interval,
        }
    }

    fn compute_overall_status(&self) -> HealthStatus {
        HealthStatus::aggregate(
            self.components
                .iter()
                .map(|(name, health)| (name.as_str(), &health.status)),
        )
    }
}

fn broker_status(state: CircuitState) -> HealthStatus {
    match state {
        CircuitState::Closed => HealthStatus::Healthy,
        CircuitState::HalfOpen => HealthStatus::Degraded("Circuit breaker half-open".to_string()),
        CircuitState::Open => HealthStatus::Unhealthy("Circuit breaker open".to_string()),
    }
}

impl Actor for HealthMonitorActor {
    type Args = Self;
    type Error = Infallible;

    async fn on_start(state: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        tracing::info!("HealthMonitorActor started");

        let publisher = state.publisher.clone();
        let metrics = state.metrics.clone();
        let check_interval = state.check_interval;
        let weak_ref = actor_ref.downgrade();

        // Periodic broker check; ends once the actor is gone
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(check_interval);
            loop {
                interval.tick().await;

                let Some(actor_ref) = weak_ref.upgrade() else {
                    break;
                };

                let circuit = publisher.circuit_state().await;
                metrics.update_circuit_breaker_state(circuit.gauge_value());

                // Fire and forget - use tell
                let _ = actor_ref
                    .tell(UpdateHealth {
                        component: "notification_broker".to_string(),
                        status: broker_status(circuit),
                        details: Some(format!("circuit {}", circuit.as_str())),
                    })
                    .send()
                    .await;
            }
        });

        Ok(state)
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<UpdateHealth> for HealthMonitorActor {
    type Reply = ();

    async fn handle(&mut self, msg: UpdateHealth, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        tracing::debug!(
            component = %msg.component,
            status = ?msg.status,
            "Updated component health"
        );

        let mut health = ComponentHealth::new(msg.component.clone(), msg.status);
        health.details = msg.details;
        self.components.insert(msg.component, health);

        self.metrics
            .update_health_status(self.compute_overall_status().gauge_value());
    }
}

impl Message<GetSystemHealth> for HealthMonitorActor {
    type Reply = SystemHealth;

    async fn handle(&mut self, _msg: GetSystemHealth, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        SystemHealth {
            overall_status: self.compute_overall_status(),
            components: self.components.clone(),
            check_time: Utc::now(),
        }
    }
}
