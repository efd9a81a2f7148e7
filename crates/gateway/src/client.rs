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

//! JSON-RPC client for the wallet daemon
//!
//! Builds `{method, params, id, jsonrpc}` envelopes, POSTs them to the daemon over
//! plain HTTP with optional basic auth, and decodes the `{id, result, error}` reply.

use crate::error::{GatewayError, Result};
use omni_gateway_common::GatewayConfig;
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, time::Duration};
use tracing::{debug, warn};

/// Protocol version string the daemon expects in every envelope
pub const JSONRPC_VERSION: &str = "1.0";

/// Maximum number of body characters kept in error messages and logs
const BODY_PREVIEW_CHARS: usize = 500;

/// JSON-RPC request envelope
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
    /// Daemon method name
    pub method: String,
    /// Wrapped parameters; omitted entirely when there are none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Request id (Unix time in nanoseconds)
    pub id: i64,
    /// Protocol version
    pub jsonrpc: &'static str,
}

impl RpcRequest {
    /// Build an envelope for `method`, applying [`wrap_params`] to `params`
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            params: wrap_params(params),
            id: chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default(),
            jsonrpc: JSONRPC_VERSION,
        }
    }
}

/// JSON-RPC response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    /// Echoed request id
    #[serde(default)]
    pub id: Option<Value>,
    /// Call result (null on error)
    #[serde(default)]
    pub result: Value,
    /// Error object, if the call failed
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    /// The result, or the daemon's error turned into a [`GatewayError::Rpc`]
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(RpcErrorObject { code, message }) => Err(GatewayError::Rpc { code, message }),
            None => Ok(self.result),
        }
    }
}

/// Error object carried in a JSON-RPC response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RpcErrorObject {
    /// Error code
    #[serde(default)]
    pub code: i64,
    /// Error message
    #[serde(default)]
    pub message: String,
}

impl fmt::Display for RpcErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Decide how positional parameters travel in the envelope
///
/// - no parameters: no `params` field
/// - one object or array: sent as that value, unwrapped
/// - one scalar (including null), or several values of any kind: sent as a list
pub fn wrap_params(mut params: Vec<Value>) -> Option<Value> {
    match params.len() {
        0 => None,
        1 if params[0].is_object() || params[0].is_array() => params.pop(),
        _ => Some(Value::Array(params)),
    }
}

/// Connection settings for [`WalletClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Daemon URL, e.g. `http://127.0.0.1:8332`
    pub url: String,
    /// Basic auth user (empty = none)
    pub username: String,
    /// Basic auth password (empty = none)
    pub password: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ClientConfig {
    /// Settings for `url` without credentials and with a 30 second timeout
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            username: String::new(),
            password: String::new(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set basic auth credentials
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Set the per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn has_credentials(&self) -> bool {
        !self.username.is_empty() || !self.password.is_empty()
    }
}

impl From<&GatewayConfig> for ClientConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self::new(config.daemon_url())
            .credentials(config.rpc_user.clone(), config.rpc_password.clone())
            .timeout(config.timeout())
    }
}

/// HTTP JSON-RPC client bound to one wallet daemon
#[derive(Debug, Clone)]
pub struct WalletClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl WalletClient {
    /// Create a client for the daemon described by `config`
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Daemon URL requests are posted to
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Call `method` and return the raw `result` value
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let request = RpcRequest::new(method, params);
        let payload = serde_json::to_vec(&request)?;

        debug!(
            method = %request.method,
            id = request.id,
            params = ?request.params,
            url = %self.config.url,
            "RPC request"
        );

        let mut builder = self
            .client
            .post(&self.config.url)
            .header(CONTENT_TYPE, "application/json;charset=utf-8")
            .header(ACCEPT, "application/json")
            .body(payload);

        if self.config.has_credentials() {
            builder = builder.basic_auth(&self.config.username, Some(&self.config.password));
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        // RPC-level failures arrive with a 500 status and a JSON envelope, so the
        // envelope is decoded before the status is looked at.
        let envelope = match serde_json::from_str::<RpcResponse>(&body) {
            Ok(envelope) => envelope,
            Err(e) => {
                let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
                warn!("Undecodable response to {} (HTTP {}): {}", method, status, preview);
                return Err(self.status_error(status, preview).unwrap_or_else(|| e.into()));
            }
        };

        // A JSON body without an error object on a failed request is not a result
        if envelope.error.is_none() {
            let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
            if let Some(err) = self.status_error(status, preview) {
                warn!("Response to {} failed with HTTP {} and no RPC error", method, status);
                return Err(err);
            }
        }

        debug!(
            method,
            id = ?envelope.id,
            result = %envelope.result.to_string().chars().take(200).collect::<String>(),
            error = ?envelope.error,
            "RPC response"
        );

        envelope.into_result()
    }

    /// Error for a non-success status, `None` when the status is 2xx
    fn status_error(&self, status: StatusCode, body: String) -> Option<GatewayError> {
        if status == StatusCode::UNAUTHORIZED {
            Some(GatewayError::AuthFailed { url: self.config.url.clone() })
        } else if !status.is_success() {
            Some(GatewayError::HttpStatus { status: status.as_u16(), body })
        } else {
            None
        }
    }

    /// Call `method` and decode its `result` into `T`
    pub async fn call_as<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<T> {
        let result = self.call(method, params).await?;
        Ok(serde_json::from_value(result)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrap_no_params() {
        assert_eq!(wrap_params(vec![]), None);
    }

    #[test]
    fn test_wrap_single_scalar_is_listed() {
        assert_eq!(wrap_params(vec![json!("")]), Some(json!([""])));
        assert_eq!(wrap_params(vec![json!(31)]), Some(json!([31])));
        assert_eq!(wrap_params(vec![json!(true)]), Some(json!([true])));
        assert_eq!(wrap_params(vec![Value::Null]), Some(json!([null])));
    }

    #[test]
    fn test_wrap_single_composite_is_unwrapped() {
        assert_eq!(wrap_params(vec![json!({"a": 1})]), Some(json!({"a": 1})));
        assert_eq!(wrap_params(vec![json!(["x", "y"])]), Some(json!(["x", "y"])));
    }

    #[test]
    fn test_wrap_many_params_are_listed() {
        let params = vec![json!("from"), json!("to"), json!(31), json!("1.5")];
        assert_eq!(wrap_params(params), Some(json!(["from", "to", 31, "1.5"])));

        // Composites are not flattened when there is more than one parameter
        assert_eq!(wrap_params(vec![json!([1]), json!({})]), Some(json!([[1], {}])));
    }

    #[test]
    fn test_envelope_without_params_omits_field() {
        let request = RpcRequest::new("getnewaddress", vec![]);
        let encoded = serde_json::to_value(&request).unwrap();

        assert_eq!(encoded["method"], "getnewaddress");
        assert_eq!(encoded["jsonrpc"], "1.0");
        assert!(encoded["id"].is_i64());
        assert!(encoded.get("params").is_none());
    }

    #[test]
    fn test_envelope_with_params() {
        let request = RpcRequest::new("omni_gettransaction", vec![json!("abcd")]);
        let encoded = serde_json::to_value(&request).unwrap();
        assert_eq!(encoded["params"], json!(["abcd"]));
    }

    #[test]
    fn test_response_error_wins() {
        let response: RpcResponse = serde_json::from_value(json!({
            "id": 1,
            "result": null,
            "error": {"code": -8, "message": "Invalid parameter"}
        }))
        .unwrap();

        match response.into_result() {
            Err(GatewayError::Rpc { code, message }) => {
                assert_eq!(code, -8);
                assert_eq!(message, "Invalid parameter");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_response_null_error_is_success() {
        let response: RpcResponse =
            serde_json::from_value(json!({"id": 7, "result": ["a"], "error": null})).unwrap();
        assert_eq!(response.into_result().unwrap(), json!(["a"]));
    }

    #[test]
    fn test_error_object_display() {
        let err = RpcErrorObject { code: -32601, message: "Method not found".to_string() };
        assert_eq!(err.to_string(), "-32601: Method not found");
    }

    #[test]
    fn test_client_config_from_gateway_config() {
        let gateway = GatewayConfig {
            host: "wallet".to_string(),
            port: 18332,
            rpc_user: "u".to_string(),
            rpc_password: "p".to_string(),
            timeout_secs: 3,
            ..Default::default()
        };

        let config = ClientConfig::from(&gateway);
        assert_eq!(config.url, "http://wallet:18332");
        assert!(config.has_credentials());
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_client_url_trims_trailing_slash() {
        let client = WalletClient::new(ClientConfig::new("http://localhost:8332/")).unwrap();
        assert_eq!(client.url(), "http://localhost:8332");
    }
}
