use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scylla::client::session::Session;
use scylla::statement::batch::Batch;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

use crate::event_sourcing::core::{serialize_event, DomainEvent, EventEnvelope};
use crate::storage::scylla::lwt_applied;
use super::event_store::{EventStore, EventStoreError};

// ============================================================================
// ScyllaDB Event Store
// ============================================================================
//
// One partition per aggregate in `event_store`, clustered by sequence number.
// Appends go out as a single conditional batch (`IF NOT EXISTS` on every
// row). All rows share the partition, so the batch is applied atomically and
// loses as a whole when another writer already took one of the sequence
// numbers.
//
// ============================================================================

const INSERT_EVENT: &str = "INSERT INTO event_store (
        aggregate_id, sequence_number, event_id, aggregate_type, event_type, event_version,
        event_data, causation_id, correlation_id, user_id, timestamp, metadata
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) IF NOT EXISTS";

type EventRow = (
    Uuid,
    i64,
    Uuid,
    String,
    String,
    i32,
    String,
    Option<Uuid>,
    Uuid,
    Option<Uuid>,
    DateTime<Utc>,
    Option<HashMap<String, String>>,
);

pub struct ScyllaEventStore<E: DomainEvent> {
    session: Arc<Session>,
    aggregate_type_name: String,
    _phantom: PhantomData<E>,
}

impl<E: DomainEvent> ScyllaEventStore<E> {
    pub fn new(session: Arc<Session>, aggregate_type_name: &str) -> Self {
        Self {
            session,
            aggregate_type_name: aggregate_type_name.to_string(),
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<E: DomainEvent> EventStore<E> for ScyllaEventStore<E> {
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<EventEnvelope<E>>,
    ) -> Result<i64, EventStoreError> {
        if events.is_empty() {
            return Err(EventStoreError::EmptyAppend);
        }

        let mut batch = Batch::default();
        let mut values: Vec<EventRow> = Vec::with_capacity(events.len());
        let mut new_version = expected_version;

        for envelope in &events {
            new_version += 1;
            batch.append_statement(INSERT_EVENT);
            values.push((
                aggregate_id,
                new_version,
                envelope.event_id,
                self.aggregate_type_name.clone(),
                envelope.event_type.clone(),
                envelope.event_version,
                serialize_event(&envelope.event_data)?,
                envelope.causation_id,
                envelope.correlation_id,
                envelope.user_id,
                envelope.timestamp,
                Some(envelope.metadata.clone()),
            ));
        }

        let result = self
            .session
            .batch(&batch, values)
            .await
            .map_err(anyhow::Error::from)?;

        if !lwt_applied(result)? {
            let actual = self.get_current_version(aggregate_id).await?;
            return Err(EventStoreError::Conflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        tracing::info!(
            aggregate_id = %aggregate_id,
            aggregate_type = %self.aggregate_type_name,
            new_version = new_version,
            event_count = events.len(),
            "Appended events to event store"
        );

        Ok(new_version)
    }

    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<EventEnvelope<E>>, EventStoreError> {
        let result = self
            .session
            .query_unpaged(
                "SELECT aggregate_id, sequence_number, event_id, aggregate_type, event_type, event_version,
                        event_data, causation_id, correlation_id, user_id, timestamp, metadata
                 FROM event_store
                 WHERE aggregate_id = ?
                 ORDER BY sequence_number ASC",
                (aggregate_id,),
            )
            .await
            .map_err(anyhow::Error::from)?;

        let rows_result = result.into_rows_result().map_err(anyhow::Error::from)?;
        let mut events = Vec::new();

        for row in rows_result.rows::<EventRow>().map_err(anyhow::Error::from)? {
            let (
                agg_id,
                sequence_number,
                event_id,
                _aggregate_type,
                event_type,
                event_version,
                event_data_json,
                causation_id,
                correlation_id,
                user_id,
                timestamp,
                metadata,
            ) = row.map_err(anyhow::Error::from)?;

            let event_data: E = serde_json::from_str(&event_data_json)?;

            events.push(EventEnvelope {
                event_id,
                aggregate_id: agg_id,
                sequence_number,
                event_type,
                event_version,
                event_data,
                causation_id,
                correlation_id,
                user_id,
                timestamp,
                metadata: metadata.unwrap_or_default(),
            });
        }

        tracing::debug!("Loaded {} events for aggregate {}", events.len(), aggregate_id);
        Ok(events)
    }

    async fn get_current_version(&self, aggregate_id: Uuid) -> Result<i64, EventStoreError> {
        let result = self
            .session
            .query_unpaged(
                "SELECT sequence_number FROM event_store
                 WHERE aggregate_id = ?
                 ORDER BY sequence_number DESC LIMIT 1",
                (aggregate_id,),
            )
            .await
            .map_err(anyhow::Error::from)?;

        let rows_result = result.into_rows_result().map_err(anyhow::Error::from)?;
        let version = rows_result
            .maybe_first_row::<(i64,)>()
            .map_err(anyhow::Error::from)?
            .map_or(0, |(version,)| version);

        Ok(version)
    }
}
