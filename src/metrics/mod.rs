// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};

// Re-export for public API
pub use server::{configure_metrics_route, encode_text};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Checkouts (outcome, latency)
// - Inventory reservations and releases
// - Order status transitions
// - Notification delivery, dead letters, circuit breaker state
// - Aggregated component health
//
// All metrics are registered with one Prometheus registry and scraped via
// /metrics on the API server.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Checkout Metrics
    pub checkouts_total: IntCounterVec,
    pub checkout_duration: HistogramVec,

    // Inventory Metrics
    pub inventory_operations_total: IntCounterVec,

    // Order Lifecycle Metrics
    pub order_transitions_total: IntCounterVec,
    pub payment_proofs_total: IntCounterVec,

    // Notification Metrics
    pub notifications_total: IntCounterVec,
    pub dlq_messages_total: IntCounter,
    pub dlq_messages_by_kind: IntCounterVec,
    pub circuit_breaker_state: IntGauge,

    // Health
    pub system_health_status: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let checkouts_total = IntCounterVec::new(
            Opts::new("checkouts_total", "Checkout attempts by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(checkouts_total.clone()))?;

        let checkout_duration = HistogramVec::new(
            HistogramOpts::new("checkout_duration_seconds", "Checkout latency by outcome")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["outcome"],
        )?;
        registry.register(Box::new(checkout_duration.clone()))?;

        let inventory_operations_total = IntCounterVec::new(
            Opts::new("inventory_operations_total", "Inventory ledger operations by outcome"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(inventory_operations_total.clone()))?;

        let order_transitions_total = IntCounterVec::new(
            Opts::new("order_transitions_total", "Applied order status transitions"),
            &["from_status", "to_status"],
        )?;
        registry.register(Box::new(order_transitions_total.clone()))?;

        let payment_proofs_total = IntCounterVec::new(
            Opts::new("payment_proofs_total", "Payment proof submissions by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(payment_proofs_total.clone()))?;

        let notifications_total = IntCounterVec::new(
            Opts::new("notifications_total", "Order notifications by delivery outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(notifications_total.clone()))?;

        let dlq_messages_total = IntCounter::new(
            "dlq_messages_total",
            "Total notifications parked in the dead letter queue",
        )?;
        registry.register(Box::new(dlq_messages_total.clone()))?;

        let dlq_messages_by_kind = IntCounterVec::new(
            Opts::new("dlq_messages_by_kind", "Dead-lettered notifications by kind"),
            &["kind"],
        )?;
        registry.register(Box::new(dlq_messages_by_kind.clone()))?;

        let circuit_breaker_state = IntGauge::new(
            "circuit_breaker_state",
            "Notification broker circuit breaker (0=Closed, 1=HalfOpen, 2=Open)",
        )?;
        registry.register(Box::new(circuit_breaker_state.clone()))?;

        let system_health_status = IntGauge::new(
            "system_health_status",
            "Aggregated component health (0=Unhealthy, 1=Degraded, 2=Healthy)",
        )?;
        registry.register(Box::new(system_health_status.clone()))?;

        Ok(Self {
            registry,
            checkouts_total,
            checkout_duration,
            inventory_operations_total,
            order_transitions_total,
            payment_proofs_total,
            notifications_total,
            dlq_messages_total,
            dlq_messages_by_kind,
            circuit_breaker_state,
            system_health_status,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_checkout(&self, outcome: &str, duration_secs: f64) {
        self.checkouts_total.with_label_values(&[outcome]).inc();
        self.checkout_duration.with_label_values(&[outcome]).observe(duration_secs);
    }

    pub fn record_inventory(&self, operation: &str, outcome: &str) {
        self.inventory_operations_total.with_label_values(&[operation, outcome]).inc();
    }

    pub fn record_transition(&self, from_status: &str, to_status: &str) {
        self.order_transitions_total.with_label_values(&[from_status, to_status]).inc();
    }

    pub fn record_payment_proof(&self, outcome: &str) {
        self.payment_proofs_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_notification(&self, outcome: &str) {
        self.notifications_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_dlq_message(&self, kind: &str) {
        self.dlq_messages_total.inc();
        self.dlq_messages_by_kind.with_label_values(&[kind]).inc();
    }

    pub fn update_circuit_breaker_state(&self, gauge_value: i64) {
        self.circuit_breaker_state.set(gauge_value);
    }

    pub fn update_health_status(&self, gauge_value: i64) {
        self.system_health_status.set(gauge_value);
    }
}
