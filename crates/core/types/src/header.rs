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

//! Block header.

use crate::{bytes::Bytes, BlockNumber};
use ethereum_types::{Address, Bloom, H256, H64, U256};
use keccak_hash::{keccak, KECCAK_EMPTY_LIST_RLP, KECCAK_NULL_RLP};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

/// A block header.
///
/// The trailing fields are fork-gated and encode contiguously: a later field
/// may only be present when every earlier one is. `rlp_append` stops at the
/// first absent field; `decode` derives the fork surface from the item count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Parent hash.
    pub parent_hash: H256,
    /// Block uncles hash.
    pub uncles_hash: H256,
    /// Block author (coinbase / fee recipient).
    pub author: Address,
    /// State root.
    pub state_root: H256,
    /// Transactions root.
    pub transactions_root: H256,
    /// Block receipts root.
    pub receipts_root: H256,
    /// Block bloom.
    pub log_bloom: Bloom,
    /// Block difficulty. Zero post-merge.
    pub difficulty: U256,
    /// Block number.
    pub number: BlockNumber,
    /// Block gas limit.
    pub gas_limit: U256,
    /// Gas used for contracts execution.
    pub gas_used: U256,
    /// Block timestamp.
    pub timestamp: u64,
    /// Block extra data.
    pub extra_data: Bytes,
    /// Proof-of-work mix digest; carries PREVRANDAO post-merge (EIP-4399).
    pub mix_digest: H256,
    /// Proof-of-work nonce. Zero post-merge.
    pub nonce: H64,
    /// Base fee per gas (EIP-1559), London onwards.
    pub base_fee_per_gas: Option<U256>,
    /// Withdrawals root (EIP-4895), Shanghai onwards.
    pub withdrawals_root: Option<H256>,
    /// Total blob gas consumed by the block (EIP-4844), Cancun onwards.
    pub blob_gas_used: Option<u64>,
    /// Running excess of blob gas (EIP-4844), Cancun onwards.
    pub excess_blob_gas: Option<u64>,
    /// Parent beacon block root (EIP-4788), Cancun onwards.
    pub parent_beacon_block_root: Option<H256>,
    /// Execution-layer requests hash (EIP-7685), Prague onwards.
    pub requests_hash: Option<H256>,
}

impl Default for Header {
    fn default() -> Self {
        Header {
            parent_hash: H256::zero(),
            uncles_hash: KECCAK_EMPTY_LIST_RLP,
            author: Address::zero(),
            state_root: KECCAK_NULL_RLP,
            transactions_root: KECCAK_NULL_RLP,
            receipts_root: KECCAK_NULL_RLP,
            log_bloom: Bloom::default(),
            difficulty: U256::zero(),
            number: 0,
            gas_limit: U256::zero(),
            gas_used: U256::zero(),
            timestamp: 0,
            extra_data: Bytes::new(),
            mix_digest: H256::zero(),
            nonce: H64::zero(),
            base_fee_per_gas: None,
            withdrawals_root: None,
            blob_gas_used: None,
            excess_blob_gas: None,
            parent_beacon_block_root: None,
            requests_hash: None,
        }
    }
}

impl Header {
    /// The keccak of the canonical RLP encoding.
    pub fn hash(&self) -> H256 {
        keccak(self.rlp())
    }

    /// Canonical RLP encoding of this header.
    pub fn rlp(&self) -> Bytes {
        let mut s = RlpStream::new();
        self.rlp_append(&mut s);
        s.out()
    }

    // Count of present fork-gated tail fields, up to the first gap.
    fn tail_len(&self) -> usize {
        let tail = [
            self.base_fee_per_gas.is_some(),
            self.withdrawals_root.is_some(),
            self.blob_gas_used.is_some(),
            self.excess_blob_gas.is_some(),
            self.parent_beacon_block_root.is_some(),
            self.requests_hash.is_some(),
        ];
        tail.iter().take_while(|present| **present).count()
    }
}

impl Encodable for Header {
    fn rlp_append(&self, s: &mut RlpStream) {
        let tail = self.tail_len();
        s.begin_list(15 + tail);
        s.append(&self.parent_hash);
        s.append(&self.uncles_hash);
        s.append(&self.author);
        s.append(&self.state_root);
        s.append(&self.transactions_root);
        s.append(&self.receipts_root);
        s.append(&self.log_bloom);
        s.append(&self.difficulty);
        s.append(&self.number);
        s.append(&self.gas_limit);
        s.append(&self.gas_used);
        s.append(&self.timestamp);
        s.append(&self.extra_data);
        s.append(&self.mix_digest);
        s.append(&self.nonce);
        if tail >= 1 {
            s.append(self.base_fee_per_gas.as_ref().expect("tail >= 1; qed"));
        }
        if tail >= 2 {
            s.append(self.withdrawals_root.as_ref().expect("tail >= 2; qed"));
        }
        if tail >= 3 {
            s.append(self.blob_gas_used.as_ref().expect("tail >= 3; qed"));
        }
        if tail >= 4 {
            s.append(self.excess_blob_gas.as_ref().expect("tail >= 4; qed"));
        }
        if tail >= 5 {
            s.append(
                self.parent_beacon_block_root
                    .as_ref()
                    .expect("tail >= 5; qed"),
            );
        }
        if tail >= 6 {
            s.append(self.requests_hash.as_ref().expect("tail >= 6; qed"));
        }
    }
}

impl Decodable for Header {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        let count = rlp.item_count()?;
        if count < 15 || count > 21 || count == 18 {
            // blob gas fields only ever appear as a pair
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let mut header = Header {
            parent_hash: rlp.val_at(0)?,
            uncles_hash: rlp.val_at(1)?,
            author: rlp.val_at(2)?,
            state_root: rlp.val_at(3)?,
            transactions_root: rlp.val_at(4)?,
            receipts_root: rlp.val_at(5)?,
            log_bloom: rlp.val_at(6)?,
            difficulty: rlp.val_at(7)?,
            number: rlp.val_at(8)?,
            gas_limit: rlp.val_at(9)?,
            gas_used: rlp.val_at(10)?,
            timestamp: rlp.val_at(11)?,
            extra_data: rlp.val_at(12)?,
            mix_digest: rlp.val_at(13)?,
            nonce: rlp.val_at(14)?,
            ..Default::default()
        };
        if count >= 16 {
            header.base_fee_per_gas = Some(rlp.val_at(15)?);
        }
        if count >= 17 {
            header.withdrawals_root = Some(rlp.val_at(16)?);
        }
        if count >= 19 {
            header.blob_gas_used = Some(rlp.val_at(17)?);
            header.excess_blob_gas = Some(rlp.val_at(18)?);
        }
        if count >= 20 {
            header.parent_beacon_block_root = Some(rlp.val_at(19)?);
        }
        if count >= 21 {
            header.requests_hash = Some(rlp.val_at(20)?);
        }
        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Header {
        Header {
            parent_hash: H256::from_low_u64_be(1),
            author: Address::from_low_u64_be(2),
            difficulty: 131_072.into(),
            number: 7,
            gas_limit: 30_000_000.into(),
            gas_used: 21_000.into(),
            timestamp: 1_609_459_200,
            extra_data: b"ember".to_vec(),
            mix_digest: H256::from_low_u64_be(3),
            nonce: H64::from_low_u64_be(4),
            ..Default::default()
        }
    }

    #[test]
    fn legacy_round_trip() {
        let header = sample();
        let decoded: Header = rlp::decode(&header.rlp()).unwrap();
        assert_eq!(header, decoded);
    }

    #[test]
    fn post_merge_round_trip() {
        let mut header = sample();
        header.difficulty = U256::zero();
        header.nonce = H64::zero();
        header.base_fee_per_gas = Some(7.into());
        header.withdrawals_root = Some(KECCAK_NULL_RLP);
        header.blob_gas_used = Some(0);
        header.excess_blob_gas = Some(0);
        header.parent_beacon_block_root = Some(H256::from_low_u64_be(9));
        let decoded: Header = rlp::decode(&header.rlp()).unwrap();
        assert_eq!(header, decoded);
    }

    #[test]
    fn hash_is_deterministic() {
        // two headers built independently but field-equal must agree
        assert_eq!(sample().hash(), sample().hash());
        let mut other = sample();
        other.number += 1;
        assert_ne!(sample().hash(), other.hash());
    }

    #[test]
    fn blob_fields_must_pair() {
        let mut header = sample();
        header.base_fee_per_gas = Some(7.into());
        header.withdrawals_root = Some(KECCAK_NULL_RLP);
        // hand-build an 18-item list: withdrawals root followed by a lone
        // blob_gas_used
        let mut s = RlpStream::new_list(18);
        let full = Rlp::new(&header.rlp())
            .iter()
            .map(|r| r.as_raw().to_vec())
            .collect::<Vec<_>>();
        for item in &full {
            s.append_raw(item, 1);
        }
        s.append(&0u64);
        assert!(rlp::decode::<Header>(&s.out()).is_err());
    }
}
