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

//! API shapes returned to callers and the daemon payloads they are mapped from

use serde::{Deserialize, Serialize};

// =============================================================================
// API types
// =============================================================================

/// Balance of a single Omni property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Property identifier
    pub propertyid: i32,
    /// Property name
    pub name: String,
    /// Available amount
    pub balance: String,
    /// Amount reserved by pending offers
    pub reserved: String,
    /// Amount frozen by the issuer
    pub frozen: String,
}

/// An address together with its balances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInfo {
    /// Wallet address
    pub address: String,
    /// Balances per property
    pub balances: Vec<Balance>,
}

/// Wallet-wide balances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    /// Balances per property, summed over all wallet addresses
    pub balances: Vec<Balance>,
}

/// Details of an Omni transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInfo {
    /// Transaction hash
    pub txid: String,
    /// Sender address
    pub sendingaddress: String,
    /// Reference (receiver) address
    pub referenceaddress: String,
    /// Whether the transaction involves a wallet address
    pub ismine: bool,
    /// Number of confirmations
    pub confirmations: i32,
    /// Transaction fee
    pub fee: String,
    /// Block timestamp
    pub blocktime: i32,
    /// Whether the transaction is valid
    pub valid: bool,
    /// Position within the block
    pub positionblock: i32,
    /// Transaction version
    pub version: i32,
    /// Numeric transaction type
    pub type_int: i32,
    /// Transaction type
    #[serde(rename = "type")]
    pub tx_type: String,
}

/// Body of a transfer call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Address to send from
    pub fromaddress: String,
    /// Address to send to
    pub toaddress: String,
    /// Property to send
    pub propertyid: i32,
    /// Amount to send, as a decimal string
    pub amount: String,
}

/// Outcome of a transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    /// Hash of the broadcast transaction
    pub hash: String,
}

// =============================================================================
// Daemon payloads
// =============================================================================

/// Entry of `omni_getallbalancesforaddress` / `omni_getwalletbalances`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DaemonBalance {
    /// Property identifier
    pub propertyid: i32,
    /// Property name
    pub name: String,
    /// Available amount
    pub balance: String,
    /// Reserved amount
    pub reserved: String,
    /// Frozen amount
    pub frozen: String,
}

impl From<DaemonBalance> for Balance {
    fn from(b: DaemonBalance) -> Self {
        Self {
            propertyid: b.propertyid,
            name: b.name,
            balance: b.balance,
            reserved: b.reserved,
            frozen: b.frozen,
        }
    }
}

/// Reply of `omni_gettransaction`; fields absent for unconfirmed transactions default
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DaemonTransaction {
    pub txid: String,
    pub sendingaddress: String,
    pub referenceaddress: String,
    pub ismine: bool,
    pub confirmations: i32,
    pub fee: String,
    pub blocktime: i32,
    pub valid: bool,
    pub positionblock: i32,
    pub version: i32,
    pub type_int: i32,
    #[serde(rename = "type")]
    pub tx_type: String,
}

impl From<DaemonTransaction> for TransactionInfo {
    fn from(tx: DaemonTransaction) -> Self {
        Self {
            txid: tx.txid,
            sendingaddress: tx.sendingaddress,
            referenceaddress: tx.referenceaddress,
            ismine: tx.ismine,
            confirmations: tx.confirmations,
            fee: tx.fee,
            blocktime: tx.blocktime,
            valid: tx.valid,
            positionblock: tx.positionblock,
            version: tx.version,
            type_int: tx.type_int,
            tx_type: tx.tx_type,
        }
    }
}

/// Map daemon balance entries onto API balances, keeping their order
pub fn balances(entries: Vec<DaemonBalance>) -> Vec<Balance> {
    entries.into_iter().map(Balance::from).collect()
}
