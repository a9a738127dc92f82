//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub provider: ProviderConfig,
    pub booking: BookingConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

/// Payment provider configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Base URL of the payment provider API
    pub base_url: String,

    /// Provider API key
    pub api_key: String,

    /// Provider name recorded on payment rows (e.g. "stripe")
    #[serde(default = "default_provider_name")]
    pub name: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_ms: u64,
}

fn default_provider_name() -> String {
    "stripe".to_string()
}

fn default_provider_timeout() -> u64 {
    10_000
}

/// Booking policy configuration
#[derive(Debug, Deserialize, Clone)]
pub struct BookingConfig {
    /// Maximum days in advance a booking may start
    #[serde(default = "default_max_advance_days")]
    pub max_advance_days: i64,

    /// Flat security deposit amount
    #[serde(default = "default_deposit_amount")]
    pub security_deposit_amount: f64,

    /// Currency code recorded on payments
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_max_advance_days() -> i64 {
    365
}

fn default_deposit_amount() -> f64 {
    250.00
}

fn default_currency() -> String {
    "USD".to_string()
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("database.max_connections", 10)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("provider.name", "stripe")?
            .set_default("provider.timeout_ms", 10_000)?
            .set_default("booking.max_advance_days", 365)?
            .set_default("booking.security_deposit_amount", 250.00)?
            .set_default("booking.currency", "USD")?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with RENTORA_ prefix
            .add_source(
                Environment::with_prefix("RENTORA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            max_advance_days: 365,
            security_deposit_amount: 250.00,
            currency: "USD".to_string(),
        }
    }
}
