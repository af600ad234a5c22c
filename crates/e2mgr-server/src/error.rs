// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error responses for the HTTP API.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use e2mgr_core::{E2MgrError, ErrorKind};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_code: u16,
    pub error_message: String,
}

/// Map an error kind to its HTTP status.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::WrongState => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Store | ErrorKind::Transport => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::NoInstanceAvailable | ErrorKind::RouteRegistrar => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Handler error wrapping the core error.
#[derive(Debug)]
pub struct ApiError(pub E2MgrError);

impl From<E2MgrError> for ApiError {
    fn from(err: E2MgrError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);
        if status.is_server_error() {
            error!(kind = %kind, error = %self.0, "Request failed");
        } else {
            warn!(kind = %kind, error = %self.0, "Request rejected");
        }

        let body = ErrorBody {
            error_code: self.0.error_code(),
            error_message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
