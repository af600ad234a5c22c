// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP API for the E2 manager.
//!
//! | Method & path | Operation |
//! |---|---|
//! | `GET /v1/health` | store ping |
//! | `PUT /v1/nodeb/x2-setup` | X2 setup request |
//! | `PUT /v1/nodeb/endc-setup` | EN-DC X2 setup request |
//! | `PUT /v1/nodeb/shutdown` | big red button |
//! | `GET /v1/nodeb/ids` | list RAN identities |
//! | `GET /v1/nodeb/{ran_name}` | get one RAN record |
//! | `GET /v1/e2t/list` | list termination instances |

pub mod error;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use e2mgr_core::{
    E2Manager, E2MgrError, ProtocolKind, RanIdentity, RanRecord, SetupRequest, ShutdownOutcome,
    TerminationInstance,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use error::{ApiError, ErrorBody};

type AppState = Arc<E2Manager>;

/// One entry of `GET /v1/e2t/list`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct E2tInstanceResponse {
    pub e2t_address: String,
    pub ran_names: Vec<String>,
}

impl From<TerminationInstance> for E2tInstanceResponse {
    fn from(instance: TerminationInstance) -> Self {
        Self {
            e2t_address: instance.address,
            ran_names: instance.associated_rans,
        }
    }
}

/// Build the API router over `manager`.
pub fn router(manager: Arc<E2Manager>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/nodeb/x2-setup", put(x2_setup))
        .route("/v1/nodeb/endc-setup", put(endc_setup))
        .route("/v1/nodeb/shutdown", put(shutdown))
        .route("/v1/nodeb/ids", get(list_nodeb_ids))
        .route("/v1/nodeb/{ran_name}", get(get_nodeb))
        .route("/v1/e2t/list", get(list_e2t_instances))
        .layer(TraceLayer::new_for_http())
        .with_state(manager)
}

async fn health(State(manager): State<AppState>) -> Response {
    match manager.queries.health().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response(),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn x2_setup(
    State(manager): State<AppState>,
    payload: Result<Json<SetupRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    handle_setup(&manager, payload, ProtocolKind::X2Setup).await
}

async fn endc_setup(
    State(manager): State<AppState>,
    payload: Result<Json<SetupRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    handle_setup(&manager, payload, ProtocolKind::EndcX2Setup).await
}

async fn handle_setup(
    manager: &E2Manager,
    payload: Result<Json<SetupRequest>, JsonRejection>,
    protocol: ProtocolKind,
) -> Result<StatusCode, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| E2MgrError::validation("body", rejection.body_text()))?;
    manager.setup.handle(request, protocol).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn shutdown(State(manager): State<AppState>) -> Result<Response, ApiError> {
    match manager.shutdown.shutdown().await? {
        ShutdownOutcome::Completed => {
            info!("Shutdown completed");
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        ShutdownOutcome::PartialSuccess { message } => {
            Ok((StatusCode::OK, Json(json!({ "message": message }))).into_response())
        }
    }
}

async fn list_nodeb_ids(
    State(manager): State<AppState>,
) -> Result<Json<Vec<RanIdentity>>, ApiError> {
    Ok(Json(manager.queries.list_ran_identities().await?))
}

async fn get_nodeb(
    State(manager): State<AppState>,
    Path(ran_name): Path<String>,
) -> Result<Json<RanRecord>, ApiError> {
    Ok(Json(manager.queries.get_ran(&ran_name).await?))
}

async fn list_e2t_instances(
    State(manager): State<AppState>,
) -> Result<Json<Vec<E2tInstanceResponse>>, ApiError> {
    let instances = manager.queries.list_instances().await?;
    Ok(Json(instances.into_iter().map(Into::into).collect()))
}
