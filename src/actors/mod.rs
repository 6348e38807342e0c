// ============================================================================
// Actors Module
// ============================================================================
//
// Actor-based infrastructure for asynchronous, concurrent operations.
//
// Structure:
// - core/           - Shared types (HealthStatus, ComponentHealth)
// - infrastructure/ - Concrete infrastructure actors (Publisher, DLQ, Health, Coordinator)
//
// Note: Order, cart and inventory logic runs in services and command handlers,
//       NOT actors. Actors are reserved for infrastructure concerns only.
//
// ============================================================================

// Private module declarations
mod core;
mod infrastructure;

pub use self::core::{ComponentHealth, HealthStatus};
pub use self::infrastructure::{
    ActorHandles,
    AddToDlq,
    CoordinatorActor,
    CoordinatorArgs,
    DeadLetter,
    DeadLetterStore,
    DlqActor,
    GetActorHandles,
    GetDlqMessages,
    GetSystemHealth,
    HealthMonitorActor,
    InMemoryDeadLetterStore,
    NotificationPublisher,
    PublishNotification,
    Shutdown,
    SystemHealth,
    UpdateHealth,
};
