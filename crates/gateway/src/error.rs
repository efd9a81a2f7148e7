// Omni Gateway - typed API in front of an Omni Layer wallet daemon
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Gateway error type and its mapping onto API responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced while talking to the wallet daemon
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The HTTP request to the daemon could not be sent or its body could not be read
    #[error("daemon request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding failed
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The daemon answered with a JSON-RPC error object
    #[error("{code}: {message}")]
    Rpc {
        /// Daemon error code
        code: i64,
        /// Daemon error message
        message: String,
    },

    /// The daemon rejected our credentials
    #[error("daemon rejected credentials at {url}")]
    AuthFailed {
        /// Daemon URL
        url: String,
    },

    /// The daemon answered with a non-success status and no JSON-RPC envelope
    #[error("daemon returned HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Leading part of the response body
        body: String,
    },
}

impl GatewayError {
    /// Short machine-readable code reported to API callers
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthFailed { .. } => "unauthenticated",
            _ => "unknown",
        }
    }

    /// Serializable body describing this error
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody { error: ErrorDetail { code: self.code(), message: self.to_string() } }
    }
}

/// `{"error": {...}}` body returned by the API on failure
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Error details
    pub error: ErrorDetail,
}

/// Code and message of a failed API call
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Machine-readable code
    pub code: &'static str,
    /// Human-readable message
    pub message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_GATEWAY, Json(self.to_body())).into_response()
    }
}

/// Result alias used across the gateway
pub type Result<T, E = GatewayError> = std::result::Result<T, E>;
