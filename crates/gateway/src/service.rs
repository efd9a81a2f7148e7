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

//! Wallet operations, one accessor per remote call
//!
//! Each operation issues the daemon calls it needs through [`WalletClient`] and maps
//! the daemon's reply onto the API types. Errors abort the operation unchanged.

use crate::{
    client::WalletClient,
    error::Result,
    types::{
        balances, AddressInfo, DaemonBalance, DaemonTransaction, TransactionInfo,
        TransferRequest, TransferResult, WalletInfo,
    },
};
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

/// Daemon methods used by the gateway
pub mod methods {
    /// Addresses belonging to an account
    pub const GET_ADDRESSES_BY_ACCOUNT: &str = "getaddressesbyaccount";
    /// Generate a fresh wallet address
    pub const GET_NEW_ADDRESS: &str = "getnewaddress";
    /// All Omni balances of one address
    pub const GET_ALL_BALANCES_FOR_ADDRESS: &str = "omni_getallbalancesforaddress";
    /// Omni balances summed over the wallet
    pub const GET_WALLET_BALANCES: &str = "omni_getwalletbalances";
    /// Details of an Omni transaction
    pub const GET_TRANSACTION: &str = "omni_gettransaction";
    /// Simple send of an Omni property
    pub const SEND: &str = "omni_send";
}

/// Account whose addresses are listed (the wallet's default account)
const DEFAULT_ACCOUNT: &str = "";

/// Wallet operations backed by a daemon client
#[derive(Debug, Clone)]
pub struct WalletService {
    client: Arc<WalletClient>,
}

impl WalletService {
    /// Create a service issuing calls through `client`
    pub fn new(client: WalletClient) -> Self {
        Self { client: Arc::new(client) }
    }

    /// The underlying daemon client
    pub fn client(&self) -> &WalletClient {
        &self.client
    }

    /// Stream every wallet address with its balances, in daemon order
    ///
    /// The address list is fetched up front; a failure there is returned directly.
    /// Balances are then fetched one address at a time as the stream is polled.
    pub async fn list_addresses(&self) -> Result<BoxStream<'static, Result<AddressInfo>>> {
        let addresses: Vec<String> = self
            .client
            .call_as(methods::GET_ADDRESSES_BY_ACCOUNT, vec![json!(DEFAULT_ACCOUNT)])
            .await?;

        debug!("Listing balances for {} addresses", addresses.len());

        let service = self.clone();
        Ok(stream::iter(addresses)
            .then(move |address| {
                let service = service.clone();
                async move { service.get_address_info(&address).await }
            })
            .boxed())
    }

    /// Balances of a single address
    pub async fn get_address_info(&self, address: &str) -> Result<AddressInfo> {
        let entries: Vec<DaemonBalance> = self
            .client
            .call_as(methods::GET_ALL_BALANCES_FOR_ADDRESS, vec![json!(address)])
            .await?;

        Ok(AddressInfo { address: address.to_string(), balances: balances(entries) })
    }

    /// Details of the transaction `txid`
    pub async fn get_transaction_info(&self, txid: &str) -> Result<TransactionInfo> {
        let tx: DaemonTransaction =
            self.client.call_as(methods::GET_TRANSACTION, vec![json!(txid)]).await?;
        Ok(tx.into())
    }

    /// Balances summed over the whole wallet
    pub async fn get_wallet_info(&self) -> Result<WalletInfo> {
        let entries: Vec<DaemonBalance> =
            self.client.call_as(methods::GET_WALLET_BALANCES, vec![]).await?;
        Ok(WalletInfo { balances: balances(entries) })
    }

    /// Generate a new address and report its (normally empty) balances
    pub async fn new_address(&self) -> Result<AddressInfo> {
        let address: String = self.client.call_as(methods::GET_NEW_ADDRESS, vec![]).await?;
        info!("Generated new address {}", address);
        self.get_address_info(&address).await
    }

    /// Send `amount` of property `propertyid` between two addresses
    pub async fn transfer(&self, request: &TransferRequest) -> Result<TransferResult> {
        let hash: String = self
            .client
            .call_as(
                methods::SEND,
                vec![
                    json!(request.fromaddress),
                    json!(request.toaddress),
                    json!(request.propertyid),
                    json!(request.amount),
                ],
            )
            .await?;

        info!(
            "Transfer of {} (property {}) from {} to {} broadcast as {}",
            request.amount, request.propertyid, request.fromaddress, request.toaddress, hash
        );
        Ok(TransferResult { hash })
    }
}
