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

//! RPC view of a block.

use ethereum_types::{Bloom, H160, H256, H64, U256};
use serde::{Serialize, Serializer};

use super::{Bytes, Transaction};

/// Block Transactions
#[derive(Debug, Clone)]
pub enum BlockTransactions {
    /// Only hashes
    Hashes(Vec<H256>),
    /// Full transactions
    Full(Vec<Transaction>),
}

impl Serialize for BlockTransactions {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            BlockTransactions::Hashes(ref hashes) => hashes.serialize(serializer),
            BlockTransactions::Full(ref txs) => txs.serialize(serializer),
        }
    }
}

/// Block representation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Hash of the block
    pub hash: H256,
    /// Hash of the parent
    pub parent_hash: H256,
    /// Hash of the uncles
    #[serde(rename = "sha3Uncles")]
    pub uncles_hash: H256,
    /// Alias of `author`
    pub miner: H160,
    /// State root hash
    pub state_root: H256,
    /// Transactions root hash
    pub transactions_root: H256,
    /// Transactions receipts root hash
    pub receipts_root: H256,
    /// Block number
    pub number: U256,
    /// Gas Used
    pub gas_used: U256,
    /// Gas Limit
    pub gas_limit: U256,
    /// Extra data
    pub extra_data: Bytes,
    /// Logs bloom
    pub logs_bloom: Bloom,
    /// Timestamp
    pub timestamp: U256,
    /// Difficulty
    pub difficulty: U256,
    /// Mix digest, PREVRANDAO post-merge
    pub mix_hash: H256,
    /// Seal nonce
    pub nonce: H64,
    /// Base fee
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_fee_per_gas: Option<U256>,
    /// Withdrawals root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub withdrawals_root: Option<H256>,
    /// Blob gas used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_gas_used: Option<U256>,
    /// Excess blob gas
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excess_blob_gas: Option<U256>,
    /// Uncle hashes
    pub uncles: Vec<H256>,
    /// Transactions
    pub transactions: BlockTransactions,
}

impl Block {
    /// Build the RPC view from a stored block.
    pub fn new(block: &common_types::block::Block, full: bool) -> Block {
        let header = &block.header;
        let transactions = if full {
            BlockTransactions::Full(
                block
                    .transactions
                    .iter()
                    .enumerate()
                    .map(|(index, tx)| {
                        Transaction::from_localized(
                            common_types::transaction::LocalizedTransaction {
                                signed: tx.clone(),
                                block_number: header.number,
                                block_hash: header.hash(),
                                transaction_index: index,
                                cached_sender: None,
                            },
                        )
                    })
                    .collect(),
            )
        } else {
            BlockTransactions::Hashes(block.transactions.iter().map(|tx| tx.hash()).collect())
        };
        Block {
            hash: header.hash(),
            parent_hash: header.parent_hash,
            uncles_hash: header.uncles_hash,
            miner: header.author,
            state_root: header.state_root,
            transactions_root: header.transactions_root,
            receipts_root: header.receipts_root,
            number: header.number.into(),
            gas_used: header.gas_used,
            gas_limit: header.gas_limit,
            extra_data: Bytes::new(header.extra_data.clone()),
            logs_bloom: header.log_bloom,
            timestamp: header.timestamp.into(),
            difficulty: header.difficulty,
            mix_hash: header.mix_digest,
            nonce: header.nonce,
            base_fee_per_gas: header.base_fee_per_gas,
            withdrawals_root: header.withdrawals_root,
            blob_gas_used: header.blob_gas_used.map(Into::into),
            excess_blob_gas: header.excess_blob_gas.map(Into::into),
            uncles: block.uncles.iter().map(|uncle| uncle.hash()).collect(),
            transactions,
        }
    }
}
