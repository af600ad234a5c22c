// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Route registrar: tells the routing manager which termination instance
//! carries traffic for which RAN.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{E2MgrError, Result};

/// Path of the single-RAN association call, relative to the base URL.
pub const ASSOCIATE_RAN_PATH: &str = "associate-ran-to-e2t";
/// Path of the bulk dissociation call, relative to the base URL.
pub const DISSOCIATE_RAN_PATH: &str = "dissociate-ran";
/// Default per-request timeout of [`RoutingManagerClient`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Routing updates consumed by the association manager and the shutdown
/// orchestrator.
#[async_trait]
pub trait RouteRegistrar: Send + Sync {
    /// Route `ran_name` through the instance at `e2t_address`.
    async fn associate(&self, e2t_address: &str, ran_name: &str) -> Result<()>;

    /// Drop every RAN route of every instance in `e2t_addresses`.
    async fn dissociate_all(&self, e2t_addresses: &[String]) -> Result<()>;
}

/// One element of a routing manager request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingManagerE2TData {
    #[serde(rename = "E2TAddress")]
    pub e2t_address: String,
    #[serde(rename = "ranNamelist", default, skip_serializing_if = "Vec::is_empty")]
    pub ran_names: Vec<String>,
}

/// HTTP client for the routing manager.
pub struct RoutingManagerClient {
    http: reqwest::Client,
    base_url: String,
}

impl RoutingManagerClient {
    /// `base_url` must end with `/`; call paths are appended to it.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| E2MgrError::RouteRegistrar {
                operation: "build_client".to_string(),
                details: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post(&self, path: &'static str, body: &[RoutingManagerE2TData]) -> Result<()> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, elements = body.len(), "Posting to routing manager");

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| E2MgrError::RouteRegistrar {
                operation: path.to_string(),
                details: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            info!(url = %url, status = status.as_u16(), "Routing manager call succeeded");
            return Ok(());
        }

        warn!(url = %url, status = status.as_u16(), "Routing manager call failed");
        Err(E2MgrError::RouteRegistrar {
            operation: path.to_string(),
            details: format!("unexpected status {status}"),
        })
    }
}

#[async_trait]
impl RouteRegistrar for RoutingManagerClient {
    async fn associate(&self, e2t_address: &str, ran_name: &str) -> Result<()> {
        let body = [RoutingManagerE2TData {
            e2t_address: e2t_address.to_string(),
            ran_names: vec![ran_name.to_string()],
        }];
        self.post(ASSOCIATE_RAN_PATH, &body).await
    }

    async fn dissociate_all(&self, e2t_addresses: &[String]) -> Result<()> {
        let body: Vec<_> = e2t_addresses
            .iter()
            .map(|address| RoutingManagerE2TData {
                e2t_address: address.clone(),
                ran_names: Vec::new(),
            })
            .collect();
        self.post(DISSOCIATE_RAN_PATH, &body).await
    }
}
