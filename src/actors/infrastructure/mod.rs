// ============================================================================
// Infrastructure Actors
// ============================================================================
//
// Actors for system concerns:
// - Notification publishing
// - Dead letter queue
// - Health monitoring
// - Coordination and shutdown
//
// ============================================================================

// Private module declarations
mod coordinator;
mod dlq;
mod health_monitor;
mod notification_publisher;

// Re-export for public API
pub use coordinator::{ActorHandles, CoordinatorActor, CoordinatorArgs, GetActorHandles, Shutdown};
pub use dlq::{AddToDlq, DeadLetter, DeadLetterStore, DlqActor, GetDlqMessages, InMemoryDeadLetterStore};
pub use health_monitor::{GetSystemHealth, HealthMonitorActor, SystemHealth, UpdateHealth};
pub use notification_publisher::{NotificationPublisher, PublishNotification};
