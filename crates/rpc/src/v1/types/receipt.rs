// Copyright 2015-2020 Parity Technologies (UK) Ltd.
// This file is part of Ember.

// Ember is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Ember is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Ember.  If not, see <http://www.gnu.org/licenses/>.

//! RPC views of receipts and logs.

use common_types::log_entry::LocalizedLogEntry;
use embercore::LocalizedReceipt;
use ethereum_types::{Bloom, H160, H256, U256, U64};

use super::Bytes;

/// Log
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    /// Address
    pub address: H160,
    /// Topics
    pub topics: Vec<H256>,
    /// Data
    pub data: Bytes,
    /// Block Hash
    pub block_hash: H256,
    /// Block Number
    pub block_number: U256,
    /// Transaction Hash
    pub transaction_hash: H256,
    /// Transaction Index
    pub transaction_index: U256,
    /// Log Index in Block
    pub log_index: U256,
    /// Log Index in Transaction
    pub transaction_log_index: U256,
    /// Whether the log was removed by a reorganisation
    pub removed: bool,
}

impl From<LocalizedLogEntry> for Log {
    fn from(log: LocalizedLogEntry) -> Self {
        Log {
            address: log.entry.address,
            topics: log.entry.topics,
            data: Bytes::new(log.entry.data),
            block_hash: log.block_hash,
            block_number: log.block_number.into(),
            transaction_hash: log.transaction_hash,
            transaction_index: log.transaction_index.into(),
            log_index: log.log_index.into(),
            transaction_log_index: log.transaction_log_index.into(),
            removed: false,
        }
    }
}

/// Receipt
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Transaction Hash
    pub transaction_hash: H256,
    /// Transaction index
    pub transaction_index: U256,
    /// Block hash
    pub block_hash: H256,
    /// Block number
    pub block_number: U256,
    /// Sender
    pub from: H160,
    /// Recipient
    pub to: Option<H160>,
    /// Cumulative gas used
    pub cumulative_gas_used: U256,
    /// Gas used
    pub gas_used: U256,
    /// Contract address
    pub contract_address: Option<H160>,
    /// Logs
    pub logs: Vec<Log>,
    /// Logs bloom
    pub logs_bloom: Bloom,
    /// Status code
    pub status: U64,
    /// Transaction type
    #[serde(rename = "type")]
    pub transaction_type: U64,
    /// Effective gas price
    pub effective_gas_price: U256,
}

impl From<LocalizedReceipt> for Receipt {
    fn from(receipt: LocalizedReceipt) -> Self {
        Receipt {
            transaction_hash: receipt.transaction_hash,
            transaction_index: receipt.transaction_index.into(),
            block_hash: receipt.block_hash,
            block_number: receipt.block_number.into(),
            from: receipt.from,
            to: receipt.to,
            cumulative_gas_used: receipt.cumulative_gas_used,
            gas_used: receipt.gas_used,
            contract_address: receipt.contract_address,
            logs: receipt.logs.into_iter().map(Into::into).collect(),
            logs_bloom: receipt.log_bloom,
            status: U64::from(if receipt.success { 1u64 } else { 0 }),
            transaction_type: U64::from(receipt.tx_type.as_byte()),
            effective_gas_price: receipt.effective_gas_price,
        }
    }
}
