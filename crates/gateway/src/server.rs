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

//! Typed HTTP API server
//!
//! Every route maps onto one [`WalletService`] operation. Successful calls answer
//! with the JSON encoding of the API type; failures answer `502 Bad Gateway` with
//! an `{"error": {...}}` body. Listing addresses streams newline-delimited JSON.

use crate::{
    client::{ClientConfig, WalletClient},
    error::GatewayError,
    health::HealthService,
    service::WalletService,
    types::{AddressInfo, TransactionInfo, TransferRequest, TransferResult, WalletInfo},
};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header::CONTENT_TYPE, Method},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use eyre::Result;
use futures::stream::{self, StreamExt};
use omni_gateway_common::GatewayConfig;
use serde::Serialize;
use serde_json::Value;
use std::{convert::Infallible, future::Future, net::SocketAddr, sync::Arc, time::Duration};
use tokio::{net::TcpListener, sync::watch};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info, warn};

/// Content type of the address listing stream
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Builder for configuring GatewayServer with fluent API and sensible defaults
#[derive(Debug, Clone)]
pub struct GatewayServerBuilder {
    daemon_url: String,
    rpc_user: String,
    rpc_password: String,
    timeout: Duration,
}

impl Default for GatewayServerBuilder {
    fn default() -> Self {
        let config = GatewayConfig::default();
        Self {
            daemon_url: config.daemon_url(),
            rpc_user: config.rpc_user,
            rpc_password: config.rpc_password,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

impl GatewayServerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Take daemon location, credentials and timeout from a loaded configuration
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new()
            .daemon_url(config.daemon_url())
            .credentials(&config.rpc_user, &config.rpc_password)
            .timeout(config.timeout())
    }

    /// Set the wallet daemon URL
    pub fn daemon_url(mut self, url: impl Into<String>) -> Self {
        self.daemon_url = url.into();
        self
    }

    /// Set basic auth credentials passed through to the daemon
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.rpc_user = user.into();
        self.rpc_password = password.into();
        self
    }

    /// Set the per-request timeout against the daemon
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the GatewayServer with the configured settings
    pub fn build(self) -> Result<GatewayServer> {
        let client_config = ClientConfig::new(self.daemon_url)
            .credentials(self.rpc_user, self.rpc_password)
            .timeout(self.timeout);
        GatewayServer::new(client_config)
    }
}

/// Gateway server combining the wallet service and health endpoints
///
/// Use GatewayServerBuilder for easy configuration:
/// ```no_run
/// # use omni_gateway::server::GatewayServerBuilder;
/// # async fn example() -> eyre::Result<()> {
/// let server = GatewayServerBuilder::new()
///     .daemon_url("http://127.0.0.1:8332")
///     .credentials("user", "password")
///     .build()?;
/// server.serve("0.0.0.0:8080".parse()?).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GatewayServer {
    /// Wallet operations
    pub service: WalletService,
    /// Health check service
    pub health_service: Arc<HealthService>,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

#[derive(Clone)]
struct AppState {
    service: WalletService,
    health: Arc<HealthService>,
}

impl GatewayServer {
    fn new(client_config: ClientConfig) -> Result<Self> {
        info!("Using wallet daemon at {}", client_config.url);

        let client = WalletClient::new(client_config)?;
        let health_service = Arc::new(HealthService::new(client.url()));
        let service = WalletService::new(client);
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self { service, health_service, shutdown_tx: Arc::new(shutdown_tx) })
    }

    /// Ask the server to stop accepting connections and finish in-flight requests
    ///
    /// The request is latched: a server that starts serving afterwards stops at once.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Router exposing every API route
    pub fn router(&self) -> Router {
        let state = AppState { service: self.service.clone(), health: self.health_service.clone() };

        Router::new()
            .route("/health", get(handle_health))
            .route("/info", get(handle_info))
            .route("/v1/addresses", get(handle_list_addresses).post(handle_new_address))
            .route("/v1/addresses/{address}", get(handle_address_info))
            .route("/v1/transactions/{txid}", get(handle_transaction_info))
            .route("/v1/wallet", get(handle_wallet_info))
            .route("/v1/transfers", post(handle_transfer))
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_methods([Method::POST, Method::GET])
                    .allow_headers(Any)
                    .allow_origin(Any),
            )
            .with_state(state)
    }

    /// Bind `addr` and serve until shutdown
    pub async fn serve(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve_listener(listener).await
    }

    /// Serve on an already bound listener until shutdown
    pub async fn serve_listener(self, listener: TcpListener) -> Result<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let app = self.router();

        info!("Omni gateway listening on {}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.wait_for(|stop| *stop).await;
                info!("Shutdown signal received, stopping server gracefully");
            })
            .await?;

        Ok(())
    }

    /// Serve on `listener` until `signal` resolves, then drain in-flight requests
    pub async fn serve_until<F>(self, listener: TcpListener, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = self.clone();
        tokio::spawn(async move {
            signal.await;
            info!("Received shutdown signal");
            handle.shutdown();
        });

        self.serve_listener(listener).await
    }
}

async fn handle_health(State(state): State<AppState>) -> Json<Value> {
    Json(state.health.ping())
}

async fn handle_info(State(state): State<AppState>) -> Json<Value> {
    Json(state.health.info())
}

async fn handle_list_addresses(State(state): State<AppState>) -> Result<Response, GatewayError> {
    debug!("ListAddresses");
    let records = state.service.list_addresses().await?;

    // Emit records until the first failure, which becomes the final line.
    let lines = stream::unfold(Some(records), |records| async move {
        let mut records = records?;
        match records.next().await? {
            Ok(info) => Some((ndjson_line(&info), Some(records))),
            Err(e) => {
                warn!("Listing addresses failed mid-stream: {}", e);
                Some((ndjson_line(&e.to_body()), None))
            }
        }
    });

    Ok(([(CONTENT_TYPE, NDJSON_CONTENT_TYPE)], Body::from_stream(lines.map(Ok::<_, Infallible>)))
        .into_response())
}

async fn handle_new_address(
    State(state): State<AppState>,
) -> Result<Json<AddressInfo>, GatewayError> {
    debug!("NewAddress");
    Ok(Json(state.service.new_address().await?))
}

async fn handle_address_info(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<AddressInfo>, GatewayError> {
    debug!("GetAddressInfo {}", address);
    Ok(Json(state.service.get_address_info(&address).await?))
}

async fn handle_transaction_info(
    State(state): State<AppState>,
    Path(txid): Path<String>,
) -> Result<Json<TransactionInfo>, GatewayError> {
    debug!("GetTransactionInfo {}", txid);
    Ok(Json(state.service.get_transaction_info(&txid).await?))
}

async fn handle_wallet_info(
    State(state): State<AppState>,
) -> Result<Json<WalletInfo>, GatewayError> {
    debug!("GetWalletInfo");
    Ok(Json(state.service.get_wallet_info().await?))
}

async fn handle_transfer(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResult>, GatewayError> {
    debug!("Transfer {:?}", request);
    Ok(Json(state.service.transfer(&request).await?))
}

fn ndjson_line<T: Serialize>(value: &T) -> Vec<u8> {
    let mut line = serde_json::to_vec(value).unwrap_or_default();
    line.push(b'\n');
    line
}
