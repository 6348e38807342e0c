// ============================================================================
// ScyllaDB backend
// ============================================================================
//
// Session bootstrap, schema and the Scylla implementations of the storage
// seams. Per-key atomic updates use lightweight transactions (`IF ...`).
//
// ============================================================================

mod carts;
mod catalog;
mod dead_letters;
mod inventory;
mod orders;

use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::response::query_result::QueryResult;
use scylla::value::{CqlValue, Row};
use std::sync::Arc;

pub use carts::ScyllaCartStore;
pub use catalog::ScyllaCatalog;
pub use dead_letters::ScyllaDeadLetterStore;
pub use inventory::ScyllaInventoryLedger;
pub use orders::ScyllaOrderProjection;

/// Upper bound on compare-and-swap rounds before giving up on a hot key
pub(crate) const MAX_CAS_ATTEMPTS: u32 = 32;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS event_store (
        aggregate_id uuid,
        sequence_number bigint,
        event_id uuid,
        aggregate_type text,
        event_type text,
        event_version int,
        event_data text,
        causation_id uuid,
        correlation_id uuid,
        user_id uuid,
        timestamp timestamp,
        metadata map<text, text>,
        PRIMARY KEY ((aggregate_id), sequence_number)
    ) WITH CLUSTERING ORDER BY (sequence_number ASC)",
    "CREATE TABLE IF NOT EXISTS order_views (
        order_id uuid PRIMARY KEY,
        owner_id uuid,
        status text,
        created_at timestamp,
        version bigint,
        body text
    )",
    "CREATE INDEX IF NOT EXISTS order_views_by_owner ON order_views (owner_id)",
    "CREATE TABLE IF NOT EXISTS products (
        product_id uuid PRIMARY KEY,
        name text,
        unit_price text
    )",
    "CREATE TABLE IF NOT EXISTS inventory (
        product_id uuid PRIMARY KEY,
        available bigint
    )",
    "CREATE TABLE IF NOT EXISTS carts (
        owner_id uuid PRIMARY KEY,
        lines text,
        version bigint
    )",
    "CREATE TABLE IF NOT EXISTS dead_letter_queue (
        id uuid PRIMARY KEY,
        order_id uuid,
        kind text,
        payload text,
        error_message text,
        failure_count int,
        failed_at timestamp
    )",
];

/// Connect, create the keyspace if needed and apply the schema
pub async fn connect(nodes: &[String], keyspace: &str) -> anyhow::Result<Arc<Session>> {
    tracing::info!(nodes = ?nodes, keyspace = %keyspace, "Connecting to ScyllaDB...");

    let session: Session = SessionBuilder::new().known_nodes(nodes).build().await?;

    session
        .query_unpaged(
            format!(
                "CREATE KEYSPACE IF NOT EXISTS {} WITH REPLICATION = \
                 {{'class': 'SimpleStrategy', 'replication_factor': 1}}",
                keyspace
            ),
            &[],
        )
        .await?;

    session.use_keyspace(keyspace, false).await?;

    for statement in SCHEMA {
        session.query_unpaged(*statement, &[]).await?;
    }

    tracing::info!(tables = SCHEMA.len(), "ScyllaDB schema ready");

    Ok(Arc::new(session))
}

/// Read the `[applied]` column of a lightweight-transaction response
pub(crate) fn lwt_applied(result: QueryResult) -> anyhow::Result<bool> {
    let rows = result.into_rows_result()?;
    let row = rows.first_row::<Row>()?;

    match row.columns.first() {
        Some(Some(CqlValue::Boolean(applied))) => Ok(*applied),
        other => anyhow::bail!("Unexpected LWT response: {:?}", other),
    }
}
