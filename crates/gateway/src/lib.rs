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
//! Omni Gateway Library
//!
//! A gateway that exposes an Omni Layer wallet daemon's JSON-RPC interface as a typed
//! HTTP API. Each API operation is translated into one or more JSON-RPC calls against
//! the daemon, and the daemon's payload is reshaped into the API's response types.

pub mod client;
pub mod error;
pub mod health;
pub mod server;
pub mod service;
pub mod types;

pub use client::{wrap_params, ClientConfig, WalletClient};
pub use error::GatewayError;
pub use server::{GatewayServer, GatewayServerBuilder};
pub use service::WalletService;
