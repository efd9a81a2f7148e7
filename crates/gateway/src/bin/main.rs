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

//! Omni Gateway
//!
//! Serves a typed HTTP API and translates every call into JSON-RPC requests against
//! an Omni Layer wallet daemon.

use clap::Parser;
use eyre::Result;
use omni_gateway::GatewayServerBuilder;
use omni_gateway_common::{init_logging, GatewayConfig};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Omni Gateway
#[derive(Parser, Debug)]
#[command(name = "omni-gateway")]
#[command(about = "Typed HTTP gateway for an Omni Layer wallet daemon")]
#[command(version)]
struct Args {
    /// Configuration file (default: ./config.toml if present)
    #[arg(long, env = "OMNI_GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    // ========== API Server ==========
    /// Address to bind to
    /// Example: --bind 127.0.0.1
    #[arg(long, env = "OMNI_GATEWAY_BIND")]
    bind: Option<String>,

    /// Port the API listens on
    #[arg(long, env = "OMNI_GATEWAY_RPC_PORT")]
    rpc_port: Option<u16>,

    // ========== Wallet Daemon ==========
    /// Wallet daemon host
    #[arg(long, env = "OMNI_GATEWAY_DAEMON_HOST")]
    daemon_host: Option<String>,

    /// Wallet daemon JSON-RPC port
    #[arg(long, env = "OMNI_GATEWAY_DAEMON_PORT")]
    daemon_port: Option<u16>,

    /// Basic auth user for the daemon
    #[arg(long, env = "OMNI_GATEWAY_RPC_USER")]
    rpc_user: Option<String>,

    /// Basic auth password for the daemon
    #[arg(long, env = "OMNI_GATEWAY_RPC_PASSWORD", hide_env_values = true)]
    rpc_password: Option<String>,

    /// Timeout for a single daemon request, in seconds
    #[arg(long)]
    timeout: Option<u64>,

    // ========== Logging ==========
    /// Also write logs to a file under the system temp directory
    #[arg(long)]
    log_file: bool,

    /// Verbosity level (repeat for more: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Apply command-line overrides on top of the file configuration
    fn apply(&self, mut config: GatewayConfig) -> GatewayConfig {
        if let Some(bind) = &self.bind {
            config.bind = bind.clone();
        }
        if let Some(port) = self.rpc_port {
            config.rpc_port = port;
        }
        if let Some(host) = &self.daemon_host {
            config.host = host.clone();
        }
        if let Some(port) = self.daemon_port {
            config.port = port;
        }
        if let Some(user) = &self.rpc_user {
            config.rpc_user = user.clone();
        }
        if let Some(password) = &self.rpc_password {
            config.rpc_password = password.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();

    // Set RUST_LOG based on verbosity
    if std::env::var("RUST_LOG").is_err() {
        let level = match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        std::env::set_var("RUST_LOG", level);
    }

    init_logging("omni-gateway", args.log_file)?;

    let config = args.apply(GatewayConfig::load(args.config.as_deref())?);
    config.validate()?;
    let addr = config.listen_addr()?;

    info!("Initializing environment...");
    let server = GatewayServerBuilder::from_config(&config).build()?;

    info!("Starting Omni gateway on {}", addr);
    let listener = TcpListener::bind(addr).await?;

    // In-flight requests finish before the process exits
    server
        .serve_until(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Unable to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
}
