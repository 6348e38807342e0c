use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kameo::Actor;
use kameo::actor::ActorRef;
use kameo::error::Infallible;
use kameo::message::{Context, Message};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

use crate::metrics::Metrics;

// ============================================================================
// Dead Letter Queue Actor
// ============================================================================
//
// Receives notifications that could not be published after all retry
// attempts and keeps them for manual inspection or replay.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeadLetter {
    pub id: Uuid,
    pub order_id: Uuid,
    pub kind: String,
    pub payload: String,
    pub error_message: String,
    pub failure_count: u32,
    pub failed_at: DateTime<Utc>,
}

/// Durable home for dead letters
#[async_trait]
pub trait DeadLetterStore: Send + Sync {
    async fn store(&self, letter: &DeadLetter) -> anyhow::Result<()>;

    /// Most recent first
    async fn recent(&self, limit: usize) -> anyhow::Result<Vec<DeadLetter>>;
}

#[derive(Default)]
pub struct InMemoryDeadLetterStore {
    letters: Mutex<Vec<DeadLetter>>,
}

impl InMemoryDeadLetterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeadLetterStore for InMemoryDeadLetterStore {
    async fn store(&self, letter: &DeadLetter) -> anyhow::Result<()> {
        self.letters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(letter.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> anyhow::Result<Vec<DeadLetter>> {
        let letters = self.letters.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(letters.iter().rev().take(limit).cloned().collect())
    }
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Debug, Clone)]
pub struct AddToDlq {
    pub order_id: Uuid,
    pub kind: String,
    pub payload: String,
    pub error_message: String,
    pub failure_count: u32,
}

pub struct GetDlqMessages {
    pub limit: usize,
}

// ============================================================================
// Actor
// ============================================================================

pub struct DlqActor {
    store: Arc<dyn DeadLetterStore>,
    metrics: Arc<Metrics>,
}

impl DlqActor {
    pub fn new(store: Arc<dyn DeadLetterStore>, metrics: Arc<Metrics>) -> Self {
        Self { store, metrics }
    }
}

impl Actor for DlqActor {
    type Args = Self;
    type Error = Infallible;

    async fn on_start(state: Self::Args, _actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        tracing::info!("DlqActor started - Dead Letter Queue ready");
        Ok(state)
    }
}

impl Message<AddToDlq> for DlqActor {
    type Reply = Result<(), String>;

    async fn handle(&mut self, msg: AddToDlq, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        let letter = DeadLetter {
            id: Uuid::now_v7(),
            order_id: msg.order_id,
            kind: msg.kind,
            payload: msg.payload,
            error_message: msg.error_message,
            failure_count: msg.failure_count,
            failed_at: Utc::now(),
        };

        tracing::error!(
            dead_letter_id = %letter.id,
            order_id = %letter.order_id,
            kind = %letter.kind,
            error = %letter.error_message,
            failure_count = letter.failure_count,
            "Adding notification to Dead Letter Queue"
        );

        self.metrics.record_dlq_message(&letter.kind);

        // Losing a dead letter leaves only this log line behind
        self.store.store(&letter).await.map_err(|e| {
            tracing::error!(
                dead_letter_id = %letter.id,
                payload = %letter.payload,
                error = %e,
                "Failed to store dead letter"
            );
            format!("Failed to store dead letter: {}", e)
        })
    }
}

impl Message<GetDlqMessages> for DlqActor {
    type Reply = Result<Vec<DeadLetter>, String>;

    async fn handle(&mut self, msg: GetDlqMessages, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        self.store
            .recent(msg.limit)
            .await
            .map_err(|e| format!("Failed to read dead letters: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kameo::prelude::*;

    fn add(order_id: Uuid) -> AddToDlq {
        AddToDlq {
            order_id,
            kind: "order_created".to_string(),
            payload: "{}".to_string(),
            error_message: "broker down".to_string(),
            failure_count: 3,
        }
    }

    #[tokio::test]
    async fn test_dead_letters_are_stored_and_counted() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let store = Arc::new(InMemoryDeadLetterStore::new());
        let dlq = DlqActor::spawn(DlqActor::new(store.clone(), metrics.clone()));

        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        dlq.ask(add(first)).send().await.unwrap();
        dlq.ask(add(second)).send().await.unwrap();

        let letters = dlq.ask(GetDlqMessages { limit: 10 }).send().await.unwrap();
        assert_eq!(letters.len(), 2);
        assert_eq!(letters[0].order_id, second);
        assert_eq!(letters[1].order_id, first);

        assert_eq!(metrics.dlq_messages_total.get(), 2);
        assert_eq!(
            metrics.dlq_messages_by_kind.with_label_values(&["order_created"]).get(),
            2
        );
    }

    #[tokio::test]
    async fn test_recent_respects_limit() {
        let store = InMemoryDeadLetterStore::new();
        for _ in 0..5 {
            let letter = DeadLetter {
                id: Uuid::now_v7(),
                order_id: Uuid::new_v4(),
                kind: "status_changed".to_string(),
                payload: "{}".to_string(),
                error_message: "timeout".to_string(),
                failure_count: 1,
                failed_at: Utc::now(),
            };
            store.store(&letter).await.unwrap();
        }

        assert_eq!(store.recent(3).await.unwrap().len(), 3);
    }
}
