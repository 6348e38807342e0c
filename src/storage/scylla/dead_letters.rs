use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use scylla::client::session::Session;
use std::sync::Arc;
use uuid::Uuid;

use crate::actors::{DeadLetter, DeadLetterStore};

type DeadLetterRow = (Uuid, Uuid, String, String, String, i32, DateTime<Utc>);

/// Dead letters in the `dead_letter_queue` table
pub struct ScyllaDeadLetterStore {
    session: Arc<Session>,
}

impl ScyllaDeadLetterStore {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl DeadLetterStore for ScyllaDeadLetterStore {
    async fn store(&self, letter: &DeadLetter) -> anyhow::Result<()> {
        self.session
            .query_unpaged(
                "INSERT INTO dead_letter_queue (
                    id, order_id, kind, payload, error_message, failure_count, failed_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?)",
                (
                    letter.id,
                    letter.order_id,
                    &letter.kind,
                    &letter.payload,
                    &letter.error_message,
                    i32::try_from(letter.failure_count).unwrap_or(i32::MAX),
                    letter.failed_at,
                ),
            )
            .await?;

        tracing::info!(dead_letter_id = %letter.id, "Message successfully stored in DLQ");
        Ok(())
    }

    async fn recent(&self, limit: usize) -> anyhow::Result<Vec<DeadLetter>> {
        let rows: Vec<DeadLetterRow> = self
            .session
            .query_iter(
                "SELECT id, order_id, kind, payload, error_message, failure_count, failed_at
                 FROM dead_letter_queue",
                &[],
            )
            .await?
            .rows_stream::<DeadLetterRow>()?
            .try_collect()
            .await?;

        let mut letters: Vec<DeadLetter> = rows
            .into_iter()
            .map(|(id, order_id, kind, payload, error_message, failure_count, failed_at)| DeadLetter {
                id,
                order_id,
                kind,
                payload,
                error_message,
                failure_count: u32::try_from(failure_count).unwrap_or(0),
                failed_at,
            })
            .collect();

        // Ids are v7, so they sort by creation time
        letters.sort_by(|a, b| b.id.cmp(&a.id));
        letters.truncate(limit);
        Ok(letters)
    }
}
