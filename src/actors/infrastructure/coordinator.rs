use kameo::Actor;
use kameo::Reply;
use kameo::actor::ActorRef;
use kameo::error::Infallible;
use kameo::message::{Context, Message};
use std::sync::Arc;
use std::time::Duration;

use crate::actors::core::HealthStatus;
use crate::messaging::EventPublisher;
use crate::metrics::Metrics;
use crate::utils::RetryConfig;
use super::dlq::{DeadLetterStore, DlqActor};
use super::health_monitor::{GetSystemHealth, HealthMonitorActor, UpdateHealth};
use super::notification_publisher::NotificationPublisher;

// ============================================================================
// Coordinator Actor - Orchestrates all system actors
// ============================================================================
//
// Responsibilities:
// - Starts the child actors and wires them together
// - Periodically logs aggregated system health
// - Coordinates graceful shutdown (publisher drains into the DLQ first)
//
// Actor Hierarchy:
//   CoordinatorActor
//   ├── NotificationPublisher
//   ├── DlqActor
//   └── HealthMonitorActor
//
// ============================================================================

pub struct CoordinatorArgs {
    pub publisher: Arc<dyn EventPublisher>,
    pub dead_letters: Arc<dyn DeadLetterStore>,
    pub metrics: Arc<Metrics>,
    pub topic: String,
    pub publish_retry: RetryConfig,
    pub health_check_interval: Duration,
}

pub struct CoordinatorActor {
    notification_publisher: ActorRef<NotificationPublisher>,
    dlq_actor: ActorRef<DlqActor>,
    health_monitor: ActorRef<HealthMonitorActor>,
}

impl Actor for CoordinatorActor {
    type Args = CoordinatorArgs;
    type Error = Infallible;

    async fn on_start(args: Self::Args, _actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        tracing::info!("CoordinatorActor started - starting child actors");

        let health_monitor = HealthMonitorActor::spawn(HealthMonitorActor::new(
            args.publisher.clone(),
            args.metrics.clone(),
            args.health_check_interval,
        ));

        let dlq_actor = DlqActor::spawn(DlqActor::new(args.dead_letters, args.metrics.clone()));
        let _ = health_monitor
            .tell(UpdateHealth {
                component: "dlq_actor".to_string(),
                status: HealthStatus::Healthy,
                details: Some("DLQ actor started".to_string()),
            })
            .send()
            .await;

        let notification_publisher = NotificationPublisher::spawn(NotificationPublisher::new(
            args.publisher,
            args.topic,
            args.publish_retry,
            dlq_actor.clone(),
            args.metrics,
        ));
        let _ = health_monitor
            .tell(UpdateHealth {
                component: "notification_publisher".to_string(),
                status: HealthStatus::Healthy,
                details: Some("Notification publisher started".to_string()),
            })
            .send()
            .await;

        // Schedule periodic health logging
        let weak_monitor = health_monitor.downgrade();
        let log_interval = args.health_check_interval.saturating_mul(3);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(log_interval);
            interval.tick().await;
            loop {
                interval.tick().await;

                let Some(monitor) = weak_monitor.upgrade() else {
                    break;
                };

                match monitor.ask(GetSystemHealth).send().await {
                    Ok(health) => match health.overall_status {
                        HealthStatus::Healthy => tracing::debug!("System health check: Healthy"),
                        HealthStatus::Degraded(ref msg) => {
                            tracing::warn!("System health check: Degraded - {}", msg)
                        }
                        HealthStatus::Unhealthy(ref msg) => {
                            tracing::error!("System health check: Unhealthy - {}", msg)
                        }
                    },
                    Err(e) => tracing::error!("Failed to get system health: {}", e),
                }
            }
        });

        tracing::info!("All child actors started successfully");

        Ok(Self {
            notification_publisher,
            dlq_actor,
            health_monitor,
        })
    }
}

// ============================================================================
// Messages
// ============================================================================

pub struct GetActorHandles;

#[derive(Clone, Reply)]
pub struct ActorHandles {
    pub notification_publisher: ActorRef<NotificationPublisher>,
    pub dlq_actor: ActorRef<DlqActor>,
    pub health_monitor: ActorRef<HealthMonitorActor>,
}

pub struct Shutdown;

impl Message<GetActorHandles> for CoordinatorActor {
    type Reply = ActorHandles;

    async fn handle(&mut self, _msg: GetActorHandles, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        ActorHandles {
            notification_publisher: self.notification_publisher.clone(),
            dlq_actor: self.dlq_actor.clone(),
            health_monitor: self.health_monitor.clone(),
        }
    }
}

impl Message<Shutdown> for CoordinatorActor {
    type Reply = ();

    async fn handle(&mut self, _msg: Shutdown, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        tracing::info!("Received shutdown signal - stopping child actors");

        // Pending notifications may still be dead-lettered, so the DLQ outlives the publisher
        if self.notification_publisher.stop_gracefully().await.is_ok() {
            self.notification_publisher.wait_for_shutdown().await;
        }
        if self.dlq_actor.stop_gracefully().await.is_ok() {
            self.dlq_actor.wait_for_shutdown().await;
        }
        let _ = self.health_monitor.stop_gracefully().await;

        tracing::info!("Child actors stopped");
    }
}
