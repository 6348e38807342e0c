use async_trait::async_trait;
use uuid::Uuid;

use crate::event_sourcing::core::{Aggregate, DomainEvent, EventEnvelope, ReplayError};
use crate::utils::IsTransient;

// ============================================================================
// Generic Event Store - Repository for Events
// ============================================================================
//
// Responsibilities:
// 1. Append events to an aggregate stream (append-only)
// 2. Load event history for aggregates
// 3. Enforce optimistic concurrency: an append only succeeds when the stream
//    is still at `expected_version`, which linearizes writers per aggregate
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EventStoreError {
    #[error("Concurrency conflict on {aggregate_id}: expected version {expected}, but current is {actual}")]
    Conflict {
        aggregate_id: Uuid,
        expected: i64,
        actual: i64,
    },

    #[error("Cannot append empty event list")]
    EmptyAppend,

    #[error("Event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt event stream: {0}")]
    Replay(#[from] ReplayError),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl IsTransient for EventStoreError {
    fn is_transient(&self) -> bool {
        matches!(self, EventStoreError::Conflict { .. })
    }
}

#[async_trait]
pub trait EventStore<E: DomainEvent>: Send + Sync {
    /// Append events to the stream. Sequence numbers are assigned by the
    /// store, starting right after `expected_version`.
    /// Returns the new version number after appending.
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<EventEnvelope<E>>,
    ) -> Result<i64, EventStoreError>;

    /// Load all events for an aggregate, ordered by sequence number
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<EventEnvelope<E>>, EventStoreError>;

    /// Current version of the aggregate (0 when it does not exist)
    async fn get_current_version(&self, aggregate_id: Uuid) -> Result<i64, EventStoreError>;

    async fn aggregate_exists(&self, aggregate_id: Uuid) -> Result<bool, EventStoreError> {
        Ok(self.get_current_version(aggregate_id).await? > 0)
    }
}

/// Rebuild an aggregate from its stream; `None` when the stream is empty
pub async fn load_aggregate<A, E>(
    store: &dyn EventStore<E>,
    aggregate_id: Uuid,
) -> Result<Option<A>, EventStoreError>
where
    E: DomainEvent,
    A: Aggregate<Event = E>,
{
    let events = store.load_events(aggregate_id).await?;

    if events.is_empty() {
        return Ok(None);
    }

    Ok(Some(A::load_from_events(events)?))
}
