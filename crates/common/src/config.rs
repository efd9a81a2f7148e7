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

//! Gateway configuration
//!
//! The configuration lives in a TOML file (`config.toml` in the working directory
//! by default). Keys are matched case-insensitively, both in snake case (`rpc_port`)
//! and in the legacy spellings used by older deployments (`RPCPort`, `Host`, `Port`,
//! `RPCUser`, `RPCPassword`). Port values may be given as integers or as quoted strings.

use eyre::{Result, WrapErr};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::{
    fmt,
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info};

/// File name looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Runtime configuration of the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Interface the API server binds to
    pub bind: String,

    /// Port the API server listens on
    #[serde(alias = "rpcport", deserialize_with = "port")]
    pub rpc_port: u16,

    /// Wallet daemon host
    pub host: String,

    /// Wallet daemon JSON-RPC port
    #[serde(deserialize_with = "port")]
    pub port: u16,

    /// Basic auth user for the daemon (empty = none)
    #[serde(alias = "rpcuser")]
    pub rpc_user: String,

    /// Basic auth password for the daemon (empty = none)
    #[serde(alias = "rpcpassword")]
    pub rpc_password: String,

    /// Timeout for a single daemon request, in seconds (must be positive)
    #[serde(alias = "timeout")]
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            rpc_port: 8080,
            host: "127.0.0.1".to_string(),
            port: 8332,
            rpc_user: String::new(),
            rpc_password: String::new(),
            timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] when `path` is `None`
    ///
    /// A missing default file yields the defaults. A missing file that was asked for
    /// explicitly is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(&default_path)
                } else {
                    debug!("No {} found, using default configuration", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    /// Read and parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Error reading config file {}", path.display()))?;
        let config = Self::from_toml_str(&contents)
            .wrap_err_with(|| format!("Unable to decode config file {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML text
    ///
    /// Top-level keys are lowercased before matching, so `rpcPort`, `RPCPort` and
    /// `rpcport` all set the same field.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(contents)?;
        let lowered: toml::Table =
            table.into_iter().map(|(key, value)| (key.to_ascii_lowercase(), value)).collect();
        let config: Self = toml::Value::Table(lowered).try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the gateway cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            eyre::bail!("timeout_secs must be greater than zero");
        }
        Ok(())
    }

    /// Base URL of the wallet daemon's JSON-RPC endpoint
    pub fn daemon_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Socket address the API server binds to
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr =
            self.bind.parse().wrap_err_with(|| format!("Invalid bind address {}", self.bind))?;
        Ok(SocketAddr::from((ip, self.rpc_port)))
    }

    /// Per-request timeout against the daemon
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Accepts `8332` as well as `"8332"`
fn port<'de, D>(deserializer: D) -> std::result::Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    struct PortVisitor;

    impl de::Visitor<'_> for PortVisitor {
        type Value = u16;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a port number or a string containing one")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<u16, E> {
            u16::try_from(v).map_err(|_| E::custom(format!("port out of range: {v}")))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<u16, E> {
            u16::try_from(v).map_err(|_| E::custom(format!("port out of range: {v}")))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<u16, E> {
            v.trim().parse().map_err(|_| E::custom(format!("invalid port: {v:?}")))
        }
    }

    deserializer.deserialize_any(PortVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.daemon_url(), "http://127.0.0.1:8332");
        assert_eq!(config.listen_addr().unwrap(), "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.rpc_user.is_empty());
    }

    #[test]
    fn test_snake_case_keys() {
        let config = GatewayConfig::from_toml_str(
            r#"
            rpc_port = 9000
            host = "10.0.0.5"
            port = 18332
            rpc_user = "omni"
            rpc_password = "secret"
            timeout_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.rpc_port, 9000);
        assert_eq!(config.daemon_url(), "http://10.0.0.5:18332");
        assert_eq!(config.rpc_user, "omni");
        assert_eq!(config.rpc_password, "secret");
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_legacy_keys_and_string_ports() {
        let config = GatewayConfig::from_toml_str(
            r#"
            RPCPort = "50051"
            Host = "daemon"
            Port = "8332"
            RPCUser = ""
            RPCPassword = "pw"
            "#,
        )
        .unwrap();

        assert_eq!(config.rpc_port, 50051);
        assert_eq!(config.host, "daemon");
        assert_eq!(config.port, 8332);
        assert_eq!(config.rpc_password, "pw");
    }

    #[test]
    fn test_keys_match_regardless_of_case() {
        let config = GatewayConfig::from_toml_str(
            r#"
            rpcPort = 9000
            HOST = "wallet"
            RpcUser = "alice"
            rpcPassword = "pw"
            Timeout_Secs = 12
            "#,
        )
        .unwrap();

        assert_eq!(config.rpc_port, 9000);
        assert_eq!(config.host, "wallet");
        assert_eq!(config.rpc_user, "alice");
        assert_eq!(config.rpc_password, "pw");
        assert_eq!(config.timeout_secs, 12);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(GatewayConfig::from_toml_str("timeout_secs = 0").is_err());
        assert!(GatewayConfig::from_toml_str("Timeout = 0").is_err());

        let config = GatewayConfig { timeout_secs: 0, ..Default::default() };
        assert!(config.validate().is_err());
        assert!(GatewayConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = GatewayConfig::from_toml_str("host = \"wallet.local\"").unwrap();
        assert_eq!(config.host, "wallet.local");
        assert_eq!(config.port, 8332);
        assert_eq!(config.rpc_port, 8080);
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(GatewayConfig::from_toml_str("port = \"not-a-port\"").is_err());
        assert!(GatewayConfig::from_toml_str("port = 70000").is_err());
    }

    #[test]
    fn test_invalid_bind_address() {
        let config = GatewayConfig { bind: "nowhere".to_string(), ..Default::default() };
        assert!(config.listen_addr().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Host = \"node\"\nPort = 8336").unwrap();

        let config = GatewayConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.daemon_url(), "http://node:8336");
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(GatewayConfig::load(Some(&missing)).is_err());
    }
}
