use actix_web::{web, App, HttpServer};
use kameo::Actor;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod actors;
mod api;
mod config;
mod domain;
mod event_sourcing;
mod messaging;
mod metrics;
mod services;
mod storage;
mod utils;

use actors::{CoordinatorActor, CoordinatorArgs, GetActorHandles, Shutdown};
use api::AppState;
use crate::config::AppConfig;
use messaging::{EventPublisher, LogPublisher, RedpandaClient};
use services::{ActorNotificationSink, OrderServices};
use storage::Backends;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,storefront_orders=debug")),
        )
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        backend = ?config.storage.backend,
        messaging = config.messaging.enabled,
        "Starting storefront order service"
    );

    // === 1. Metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);

    // === 2. Storage ===
    let backends = Backends::from_config(&config.storage, &config.products).await?;

    // === 3. Notification broker (with circuit breaker) ===
    let publisher: Arc<dyn EventPublisher> = if config.messaging.enabled {
        tracing::info!(brokers = %config.messaging.brokers, topic = %config.messaging.topic, "Publishing notifications to Redpanda");
        Arc::new(RedpandaClient::new(&config.messaging.brokers, config.circuit_breaker())?)
    } else {
        tracing::info!("Messaging disabled, notifications go to the log");
        Arc::new(LogPublisher)
    };

    // === 4. Infrastructure actors ===
    let coordinator = CoordinatorActor::spawn(CoordinatorArgs {
        publisher,
        dead_letters: backends.dead_letters.clone(),
        metrics: metrics.clone(),
        topic: config.messaging.topic.clone(),
        publish_retry: config.publish_retry(),
        health_check_interval: config.health_check_interval(),
    });
    let handles = coordinator
        .ask(GetActorHandles)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Coordinator unavailable: {}", e))?;

    // === 5. Services ===
    let services = Arc::new(OrderServices::new(
        &backends,
        Arc::new(config.shipping_policy()),
        Arc::new(ActorNotificationSink::new(handles.notification_publisher.clone())),
        metrics.clone(),
        config.conflict_retry(),
    ));

    let state = web::Data::new(AppState {
        services,
        health_monitor: handles.health_monitor.clone(),
        dlq_actor: handles.dlq_actor.clone(),
    });
    let metrics_data = web::Data::new(metrics.clone());

    // === 6. HTTP API ===
    tracing::info!("HTTP API listening on {}:{}", config.server.host, config.server.port);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(metrics_data.clone())
            .configure(api::configure)
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    // === 7. Graceful shutdown ===
    tracing::info!("HTTP API stopped, draining notifications");
    if let Err(e) = coordinator.ask(Shutdown).send().await {
        tracing::warn!(error = %e, "Coordinator shutdown failed");
    }
    if coordinator.stop_gracefully().await.is_ok() {
        coordinator.wait_for_shutdown().await;
    }

    tracing::info!("Storefront order service stopped");
    Ok(())
}
