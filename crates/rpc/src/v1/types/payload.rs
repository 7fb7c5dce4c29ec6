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

//! Engine API payload structures.

use common_types::{
    block::Block,
    header::Header,
    transaction::UnverifiedTransaction,
    withdrawal::Withdrawal,
};
use ethereum_types::{Bloom, H160, H256, H64, U256, U64};
use keccak_hash::KECCAK_EMPTY_LIST_RLP;
use triehash_ethereum::ordered_trie_root;

use super::Bytes;

/// Largest admissible blob gas per block: six full blobs.
pub const MAX_BLOB_GAS_PER_BLOCK: u64 = 6 * 131_072;

/// A withdrawal as carried by the Engine API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcWithdrawal {
    /// Withdrawal index.
    pub index: U64,
    /// Validator index.
    pub validator_index: U64,
    /// Recipient.
    pub address: H160,
    /// Amount in Gwei.
    pub amount: U64,
}

impl From<RpcWithdrawal> for Withdrawal {
    fn from(w: RpcWithdrawal) -> Self {
        Withdrawal {
            index: w.index.as_u64(),
            validator_index: w.validator_index.as_u64(),
            address: w.address,
            amount: w.amount.as_u64(),
        }
    }
}

impl From<&Withdrawal> for RpcWithdrawal {
    fn from(w: &Withdrawal) -> Self {
        RpcWithdrawal {
            index: w.index.into(),
            validator_index: w.validator_index.into(),
            address: w.address,
            amount: w.amount.into(),
        }
    }
}

/// The execution payload shared by V1 through V3 of the Engine API; the
/// later fields are absent on the earlier versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExecutionPayload {
    /// Parent block hash.
    pub parent_hash: H256,
    /// Block author.
    pub fee_recipient: H160,
    /// Post-execution state root.
    pub state_root: H256,
    /// Receipts root.
    pub receipts_root: H256,
    /// Logs bloom, exactly 256 bytes.
    pub logs_bloom: Bytes,
    /// PREVRANDAO.
    pub prev_randao: H256,
    /// Block number.
    pub block_number: U64,
    /// Gas limit.
    pub gas_limit: U64,
    /// Gas used.
    pub gas_used: U64,
    /// Timestamp.
    pub timestamp: U64,
    /// Extra data, at most 32 bytes.
    pub extra_data: Bytes,
    /// Base fee.
    pub base_fee_per_gas: U256,
    /// Hash of this block.
    pub block_hash: H256,
    /// Wire-encoded transactions.
    pub transactions: Vec<Bytes>,
    /// Withdrawals, V2 onwards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub withdrawals: Option<Vec<RpcWithdrawal>>,
    /// Blob gas used, V3 onwards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_gas_used: Option<U64>,
    /// Excess blob gas, V3 onwards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excess_blob_gas: Option<U64>,
}

impl ExecutionPayload {
    /// Validate structure and reassemble the block. `parent_beacon_root`
    /// comes as a separate argument on `engine_newPayloadV3`.
    pub fn try_into_block(&self, parent_beacon_root: Option<H256>) -> Result<Block, String> {
        if self.logs_bloom.0.len() != 256 {
            return Err(format!(
                "logsBloom must be 256 bytes, got {}",
                self.logs_bloom.0.len()
            ));
        }
        if self.extra_data.0.len() > 32 {
            return Err(format!(
                "extraData must be at most 32 bytes, got {}",
                self.extra_data.0.len()
            ));
        }
        if self.gas_used > self.gas_limit {
            return Err("gasUsed exceeds gasLimit".into());
        }
        if let Some(blob_gas) = self.blob_gas_used {
            if blob_gas.as_u64() > MAX_BLOB_GAS_PER_BLOCK {
                return Err("blobGasUsed exceeds the per-block maximum".into());
            }
        }

        let mut transactions = Vec::with_capacity(self.transactions.len());
        for (index, raw) in self.transactions.iter().enumerate() {
            let tx = UnverifiedTransaction::decode(&raw.0)
                .map_err(|e| format!("transaction {} is malformed: {}", index, e))?;
            transactions.push(tx);
        }
        let withdrawals: Option<Vec<Withdrawal>> = self
            .withdrawals
            .clone()
            .map(|ws| ws.into_iter().map(Into::into).collect());

        let header = Header {
            parent_hash: self.parent_hash,
            uncles_hash: KECCAK_EMPTY_LIST_RLP,
            author: self.fee_recipient,
            state_root: self.state_root,
            transactions_root: ordered_trie_root(transactions.iter().map(|tx| tx.encode())),
            receipts_root: self.receipts_root,
            log_bloom: Bloom::from_slice(&self.logs_bloom.0),
            difficulty: U256::zero(),
            number: self.block_number.as_u64(),
            gas_limit: U256::from(self.gas_limit.as_u64()),
            gas_used: U256::from(self.gas_used.as_u64()),
            timestamp: self.timestamp.as_u64(),
            extra_data: self.extra_data.0.clone(),
            mix_digest: self.prev_randao,
            nonce: H64::zero(),
            base_fee_per_gas: Some(self.base_fee_per_gas),
            withdrawals_root: withdrawals
                .as_ref()
                .map(|ws| ordered_trie_root(ws.iter().map(|w| rlp::encode(w)))),
            blob_gas_used: self.blob_gas_used.map(|v| v.as_u64()),
            excess_blob_gas: self.excess_blob_gas.map(|v| v.as_u64()),
            parent_beacon_block_root: parent_beacon_root,
            requests_hash: None,
        };
        if header.hash() != self.block_hash {
            return Err(format!(
                "blockHash mismatch: header hashes to {:?}",
                header.hash()
            ));
        }
        Ok(Block {
            header,
            transactions,
            uncles: vec![],
            withdrawals,
        })
    }

    /// Payload view of a stored block.
    pub fn from_block(block: &Block) -> ExecutionPayload {
        let header = &block.header;
        ExecutionPayload {
            parent_hash: header.parent_hash,
            fee_recipient: header.author,
            state_root: header.state_root,
            receipts_root: header.receipts_root,
            logs_bloom: Bytes::new(header.log_bloom.as_bytes().to_vec()),
            prev_randao: header.mix_digest,
            block_number: header.number.into(),
            gas_limit: U64::from(header.gas_limit.low_u64()),
            gas_used: U64::from(header.gas_used.low_u64()),
            timestamp: header.timestamp.into(),
            extra_data: Bytes::new(header.extra_data.clone()),
            base_fee_per_gas: header.base_fee_per_gas.unwrap_or_default(),
            block_hash: header.hash(),
            transactions: block
                .transactions
                .iter()
                .map(|tx| Bytes::new(tx.encode()))
                .collect(),
            withdrawals: block
                .withdrawals
                .as_ref()
                .map(|ws| ws.iter().map(Into::into).collect()),
            blob_gas_used: header.blob_gas_used.map(Into::into),
            excess_blob_gas: header.excess_blob_gas.map(Into::into),
        }
    }
}

/// Result kind of a payload import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayloadStatusKind {
    /// Fully validated.
    Valid,
    /// Rejected.
    Invalid,
    /// Import deferred until sync catches up.
    Syncing,
    /// Well-formed but the parent is unknown.
    Accepted,
}

/// Status of a payload import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadStatus {
    /// Result kind.
    pub status: PayloadStatusKind,
    /// Most recent valid block on the tried branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_valid_hash: Option<H256>,
    /// Human-readable rejection reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,
}

impl PayloadStatus {
    /// A `VALID` status pointing at the given hash.
    pub fn valid(hash: H256) -> Self {
        PayloadStatus {
            status: PayloadStatusKind::Valid,
            latest_valid_hash: Some(hash),
            validation_error: None,
        }
    }

    /// An `INVALID` status with a reason.
    pub fn invalid(latest_valid: Option<H256>, reason: String) -> Self {
        PayloadStatus {
            status: PayloadStatusKind::Invalid,
            latest_valid_hash: latest_valid,
            validation_error: Some(reason),
        }
    }

    /// A `SYNCING` status.
    pub fn syncing() -> Self {
        PayloadStatus {
            status: PayloadStatusKind::Syncing,
            latest_valid_hash: None,
            validation_error: None,
        }
    }

    /// An `ACCEPTED` status.
    pub fn accepted() -> Self {
        PayloadStatus {
            status: PayloadStatusKind::Accepted,
            latest_valid_hash: None,
            validation_error: None,
        }
    }
}

/// Head, safe and finalized pointers announced by the consensus layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkchoiceState {
    /// New chain head.
    pub head_block_hash: H256,
    /// Safe block.
    pub safe_block_hash: H256,
    /// Finalized block.
    pub finalized_block_hash: H256,
}

/// Request to start building a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadAttributes {
    /// Timestamp of the payload.
    pub timestamp: U64,
    /// PREVRANDAO value.
    pub prev_randao: H256,
    /// Fee recipient.
    pub suggested_fee_recipient: H160,
    /// Withdrawals to apply, V2 onwards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub withdrawals: Option<Vec<RpcWithdrawal>>,
    /// Parent beacon block root, V3 onwards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_beacon_block_root: Option<H256>,
}

/// Response to `engine_forkchoiceUpdated`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkchoiceUpdated {
    /// Status of the head block.
    pub payload_status: PayloadStatus,
    /// Id of the payload being built, when attributes were supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_id: Option<H64>,
}

/// Response envelope of `engine_getPayloadV2` and V3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadV2 {
    /// The payload.
    pub execution_payload: ExecutionPayload,
    /// Fees accrued by the block.
    pub block_value: U256,
}

/// Response item of `engine_getPayloadBodiesBy{Hash,Range}V1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadBodyV1 {
    /// Wire-encoded transactions.
    pub transactions: Vec<Bytes>,
    /// Withdrawals, when past Shanghai.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub withdrawals: Option<Vec<RpcWithdrawal>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_payload_for(header: &Header) -> ExecutionPayload {
        ExecutionPayload::from_block(&Block {
            header: header.clone(),
            transactions: vec![],
            uncles: vec![],
            withdrawals: Some(vec![]),
        })
    }

    fn sealed_header() -> Header {
        Header {
            number: 5,
            gas_limit: 30_000_000.into(),
            timestamp: 60,
            base_fee_per_gas: Some(7.into()),
            withdrawals_root: Some(keccak_hash::KECCAK_NULL_RLP),
            transactions_root: keccak_hash::KECCAK_NULL_RLP,
            ..Default::default()
        }
    }

    #[test]
    fn payload_round_trip_preserves_the_hash() {
        let header = sealed_header();
        let payload = empty_payload_for(&header);
        let block = payload.try_into_block(None).unwrap();
        assert_eq!(block.header.hash(), header.hash());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let header = sealed_header();
        let mut payload = empty_payload_for(&header);
        payload.gas_used = U64::from(1u64);
        assert!(payload.try_into_block(None).is_err());
    }

    #[test]
    fn oversized_extra_data_is_rejected() {
        let header = sealed_header();
        let mut payload = empty_payload_for(&header);
        payload.extra_data = Bytes::new(vec![0; 33]);
        assert!(payload.try_into_block(None).is_err());
    }

    #[test]
    fn excessive_blob_gas_is_rejected() {
        let header = sealed_header();
        let mut payload = empty_payload_for(&header);
        payload.blob_gas_used = Some(U64::from(MAX_BLOB_GAS_PER_BLOCK + 1));
        payload.excess_blob_gas = Some(U64::from(0u64));
        assert!(payload.try_into_block(None).is_err());
    }

    #[test]
    fn status_kinds_serialize_screaming() {
        assert_eq!(
            serde_json::to_string(&PayloadStatusKind::Valid).unwrap(),
            r#""VALID""#
        );
        assert_eq!(
            serde_json::to_string(&PayloadStatusKind::Accepted).unwrap(),
            r#""ACCEPTED""#
        );
    }
}
