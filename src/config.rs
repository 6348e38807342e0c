use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

use crate::services::FlatRateShipping;
use crate::utils::{CircuitBreakerConfig, RetryConfig};

// ============================================================================
// Application Configuration
// ============================================================================
//
// Layered, lowest precedence first:
//   1. built-in defaults
//   2. optional file config/storefront.{toml,yaml,json}
//   3. STOREFRONT__SECTION__KEY environment variables
//
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub messaging: MessagingConfig,
    pub shipping: ShippingConfig,
    pub retry: RetrySettings,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub health_check_interval_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    Scylla,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub scylla_nodes: Vec<String>,
    pub keyspace: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagingConfig {
    pub enabled: bool,
    pub brokers: String,
    pub topic: String,
    pub publish_max_attempts: u32,
    pub failure_threshold: u32,
    pub open_for_secs: u64,
    pub success_threshold: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShippingConfig {
    pub flat_rate: Decimal,
    pub free_shipping_threshold: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
}

/// Product loaded into the catalog and inventory at startup
#[derive(Debug, Clone, Deserialize)]
pub struct SeedProduct {
    pub id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub stock: u32,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config = Self::defaults()?
            .add_source(File::with_name("config/storefront").required(false))
            .add_source(
                Environment::with_prefix("STOREFRONT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("storage.scylla_nodes"),
            )
            .build()?;

        let app: AppConfig = config.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    fn defaults() -> anyhow::Result<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.health_check_interval_secs", 10)?
            .set_default("storage.backend", "memory")?
            .set_default("storage.scylla_nodes", vec!["127.0.0.1:9042"])?
            .set_default("storage.keyspace", "storefront")?
            .set_default("messaging.enabled", false)?
            .set_default("messaging.brokers", "127.0.0.1:9092")?
            .set_default("messaging.topic", "order-notifications")?
            .set_default("messaging.publish_max_attempts", 3)?
            .set_default("messaging.failure_threshold", 5)?
            .set_default("messaging.open_for_secs", 30)?
            .set_default("messaging.success_threshold", 2)?
            .set_default("shipping.flat_rate", "0")?
            .set_default("retry.max_attempts", 5)?
            .set_default("retry.initial_delay_ms", 20)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("server.port must be non-zero");
        }
        if self.shipping.flat_rate < Decimal::ZERO {
            anyhow::bail!("shipping.flat_rate cannot be negative");
        }
        if self.shipping.free_shipping_threshold.is_some_and(|t| t < Decimal::ZERO) {
            anyhow::bail!("shipping.free_shipping_threshold cannot be negative");
        }
        if self.storage.backend == StorageBackend::Scylla && self.storage.scylla_nodes.is_empty() {
            anyhow::bail!("storage.scylla_nodes needs at least one node for the scylla backend");
        }
        if self.retry.max_attempts == 0 || self.messaging.publish_max_attempts == 0 {
            anyhow::bail!("retry attempts must be at least 1");
        }
        if self.messaging.enabled && self.messaging.topic.trim().is_empty() {
            anyhow::bail!("messaging.topic cannot be empty when messaging is enabled");
        }
        Ok(())
    }

    /// Backoff for optimistic-concurrency conflicts on orders
    pub fn conflict_retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry.max_attempts,
            initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
            ..RetryConfig::default()
        }
    }

    pub fn publish_retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.messaging.publish_max_attempts,
            ..RetryConfig::default()
        }
    }

    pub fn circuit_breaker(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.messaging.failure_threshold,
            open_for: Duration::from_secs(self.messaging.open_for_secs),
            success_threshold: self.messaging.success_threshold,
        }
    }

    pub fn shipping_policy(&self) -> FlatRateShipping {
        FlatRateShipping::new(self.shipping.flat_rate, self.shipping.free_shipping_threshold)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.server.health_check_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use rust_decimal_macros::dec;

    fn from_toml(toml: &str) -> anyhow::Result<AppConfig> {
        let app: AppConfig = AppConfig::defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    #[test]
    fn test_defaults_are_valid() {
        let app = from_toml("").unwrap();

        assert_eq!(app.server.port, 8080);
        assert_eq!(app.storage.backend, StorageBackend::Memory);
        assert!(!app.messaging.enabled);
        assert_eq!(app.shipping.flat_rate, dec!(0));
        assert!(app.products.is_empty());
        assert_eq!(app.conflict_retry().max_attempts, 5);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let app = from_toml(
            r#"
            [shipping]
            flat_rate = "49.50"
            free_shipping_threshold = "1000"

            [[products]]
            id = "0190a6e4-8a1c-7b3e-9f2d-4c5b6a7d8e9f"
            name = "Desk Lamp"
            unit_price = "100"
            stock = 2
            "#,
        )
        .unwrap();

        assert_eq!(app.shipping.flat_rate, dec!(49.50));
        assert_eq!(app.shipping.free_shipping_threshold, Some(dec!(1000)));
        assert_eq!(app.products.len(), 1);
        assert_eq!(app.products[0].stock, 2);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(from_toml("[server]\nport = 0").is_err());
        assert!(from_toml("[shipping]\nflat_rate = \"-1\"").is_err());
        assert!(from_toml("[storage]\nbackend = \"scylla\"\nscylla_nodes = []").is_err());
    }
}
