// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for the E2 manager, loaded from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::store::RetryPolicy;

/// Value of `E2MGR_DATABASE_URL` selecting the in-process store.
pub const MEMORY_STORE: &str = "memory";

/// E2 manager configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// `sqlite:` URL, or [`MEMORY_STORE`]
    pub database_url: String,
    /// HTTP listen address
    pub http_addr: SocketAddr,
    /// Message-bus router address
    pub bus_addr: String,
    /// Routing manager base URL, ends with `/`
    pub routing_manager_url: String,
    /// Total store attempts per operation (at least 1)
    pub max_store_attempts: u32,
    /// Sleep between store attempts
    pub store_retry_interval: Duration,
    /// Grace period between SHUTTING_DOWN and SHUT_DOWN
    pub shutdown_grace_period: Duration,
    /// Pre-encoded X2 setup request PDU
    pub x2_setup_pdu: Vec<u8>,
    /// Pre-encoded EN-DC X2 setup request PDU
    pub endc_setup_pdu: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("E2MGR_DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
        if database_url.trim().is_empty() {
            return Err(ConfigError::Missing("E2MGR_DATABASE_URL"));
        }

        let port: u16 = std::env::var("E2MGR_HTTP_PORT")
            .unwrap_or_else(|_| "3800".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("E2MGR_HTTP_PORT", "expected a port number"))?;
        let http_addr = SocketAddr::from(([0, 0, 0, 0], port));

        let bus_addr =
            std::env::var("E2MGR_BUS_ADDR").unwrap_or_else(|_| "127.0.0.1:4560".to_string());

        let mut routing_manager_url = std::env::var("E2MGR_ROUTING_MANAGER_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8080/ric/v1/handles/".to_string());
        if !routing_manager_url.starts_with("http://") && !routing_manager_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid(
                "E2MGR_ROUTING_MANAGER_URL",
                "expected an http(s) URL",
            ));
        }
        if !routing_manager_url.ends_with('/') {
            routing_manager_url.push('/');
        }

        let max_store_attempts: u32 = std::env::var("E2MGR_MAX_STORE_ATTEMPTS")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("E2MGR_MAX_STORE_ATTEMPTS", "expected an integer"))?;
        if max_store_attempts == 0 {
            return Err(ConfigError::Invalid(
                "E2MGR_MAX_STORE_ATTEMPTS",
                "must be at least 1",
            ));
        }

        let retry_ms: u64 = std::env::var("E2MGR_STORE_RETRY_INTERVAL_MS")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("E2MGR_STORE_RETRY_INTERVAL_MS", "expected milliseconds")
            })?;

        let grace_secs: u64 = std::env::var("E2MGR_SHUTDOWN_GRACE_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("E2MGR_SHUTDOWN_GRACE_SECS", "expected seconds"))?;

        let x2_setup_pdu = decode_pdu("E2MGR_X2_SETUP_PDU")?;
        let endc_setup_pdu = decode_pdu("E2MGR_ENDC_SETUP_PDU")?;

        Ok(Self {
            database_url,
            http_addr,
            bus_addr,
            routing_manager_url,
            max_store_attempts,
            store_retry_interval: Duration::from_millis(retry_ms),
            shutdown_grace_period: Duration::from_secs(grace_secs),
            x2_setup_pdu,
            endc_setup_pdu,
        })
    }

    /// Whether the in-process store was requested.
    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_STORE
    }

    /// Store retry settings for [`crate::store::RetryingStore`].
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_store_attempts,
            retry_interval: self.store_retry_interval,
        }
    }
}

fn decode_pdu(var: &'static str) -> Result<Vec<u8>, ConfigError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => BASE64
            .decode(value.trim())
            .map_err(|_| ConfigError::Invalid(var, "expected base64")),
        _ => Ok(Vec::new()),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing or empty.
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    /// An environment variable could not be parsed.
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
