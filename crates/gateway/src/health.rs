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

//! Health check service for gateway status

use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// Service name reported by the health endpoints
pub const SERVICE_NAME: &str = "omni-gateway";

/// Health check service for monitoring gateway status
///
/// Reports liveness, uptime and the daemon the gateway is bound to. It never
/// contacts the daemon itself.
pub struct HealthService {
    start_time: u64,
    daemon_url: String,
}

impl HealthService {
    /// Creates a new health service, recording the current time as the start time
    pub fn new(daemon_url: impl Into<String>) -> Self {
        Self { start_time: now_secs(), daemon_url: daemon_url.into() }
    }

    /// Simple liveness payload
    pub fn ping(&self) -> Value {
        json!({
            "status": "ok",
            "service": SERVICE_NAME,
            "timestamp": now_secs()
        })
    }

    /// Service version, uptime and process information
    pub fn info(&self) -> Value {
        json!({
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "daemon": self.daemon_url,
            "uptime": now_secs().saturating_sub(self.start_time),
            "started_at": self.start_time,
            "pid": std::process::id()
        })
    }
}

fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
