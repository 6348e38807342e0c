use uuid::Uuid;
use super::event::EventEnvelope;

// ============================================================================
// Aggregate Root Pattern - Event Sourcing Core
// ============================================================================
//
// Key Principles:
// 1. State is derived from events (not stored directly)
// 2. Commands are validated before emitting events
// 3. Events represent facts that have already happened
// 4. Aggregates enforce business invariants
// 5. All state changes flow through events
//
// ============================================================================

/// Errors raised while rebuilding an aggregate from its history
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("No events to load")]
    NoEvents,

    #[error("Failed to apply event #{sequence}: {reason}")]
    ApplyFailed { sequence: i64, reason: String },
}

/// Generic Aggregate trait - all event-sourced aggregates implement this
///
/// Type Parameters:
/// - `Event`: The domain event type for this aggregate
/// - `Command`: The command type for this aggregate
/// - `Error`: The error type for business rule violations
pub trait Aggregate: Sized + Send + Sync {
    type Event;
    type Command;
    type Error: std::fmt::Display;

    /// Create new aggregate from first event
    fn apply_first_event(aggregate_id: Uuid, event: &Self::Event) -> Result<Self, Self::Error>;

    /// Apply subsequent events to update state
    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error>;

    /// Handle a command that creates the aggregate (no prior state exists)
    fn handle_creation(command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Handle command against current state and emit events (business logic).
    /// An empty vector means the command was already satisfied.
    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    fn aggregate_id(&self) -> Uuid;

    /// Current version (sequence number of the last applied event)
    fn version(&self) -> i64;

    fn set_version(&mut self, version: i64);

    /// Load aggregate from event history (reconstruct from events)
    fn load_from_events(events: Vec<EventEnvelope<Self::Event>>) -> Result<Self, ReplayError> {
        let mut iter = events.into_iter();
        let first = iter.next().ok_or(ReplayError::NoEvents)?;

        let mut aggregate = Self::apply_first_event(first.aggregate_id, &first.event_data)
            .map_err(|e| ReplayError::ApplyFailed {
                sequence: first.sequence_number,
                reason: e.to_string(),
            })?;
        aggregate.set_version(first.sequence_number);

        for envelope in iter {
            aggregate.apply_event(&envelope.event_data)
                .map_err(|e| ReplayError::ApplyFailed {
                    sequence: envelope.sequence_number,
                    reason: e.to_string(),
                })?;
            aggregate.set_version(envelope.sequence_number);
        }

        Ok(aggregate)
    }
}
