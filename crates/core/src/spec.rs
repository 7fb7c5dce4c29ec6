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

//! Parameters for a block chain: fork schedule, gas rules, genesis.

use common_types::{header::Header, BlockNumber};
use ethereum_types::{Address, H256, U256};

/// Parameters common across the chain, independent of the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonParams {
    /// Chain id (EIP-155 and typed transactions).
    pub chain_id: u64,
    /// Network id reported over `net_version`.
    pub network_id: u64,
    /// Minimum gas limit.
    pub min_gas_limit: U256,
    /// Homestead fork height.
    pub homestead_height: BlockNumber,
    /// Byzantium fork height.
    pub byzantium_height: BlockNumber,
    /// Constantinople fork height.
    pub constantinople_height: BlockNumber,
    /// Istanbul fork height.
    pub istanbul_height: BlockNumber,
    /// London fork height (EIP-1559).
    pub london_height: BlockNumber,
    /// Arrow Glacier fork height (bomb delay only).
    pub arrow_glacier_height: BlockNumber,
    /// Gray Glacier fork height (bomb delay only).
    pub gray_glacier_height: BlockNumber,
    /// First post-merge block.
    pub merge_height: BlockNumber,
    /// Shanghai fork height (withdrawals).
    pub shanghai_height: BlockNumber,
    /// Cancun fork height (blobs, transient storage).
    pub cancun_height: BlockNumber,
    /// Prague fork height (set-code transactions, requests hash).
    pub prague_height: BlockNumber,
    /// EIP-1559 gas target denominator.
    pub elasticity_multiplier: u64,
    /// EIP-1559 base fee max change denominator.
    pub base_fee_max_change_denominator: u64,
    /// Base fee of the first London block.
    pub initial_base_fee: U256,
}

impl CommonParams {
    /// Whether London rules apply at `number`.
    pub fn is_london(&self, number: BlockNumber) -> bool {
        number >= self.london_height
    }

    /// Whether the block at `number` is post-merge.
    pub fn is_merged(&self, number: BlockNumber) -> bool {
        number >= self.merge_height
    }

    /// Whether Shanghai rules apply at `number`.
    pub fn is_shanghai(&self, number: BlockNumber) -> bool {
        number >= self.shanghai_height
    }

    /// Whether Cancun rules apply at `number`.
    pub fn is_cancun(&self, number: BlockNumber) -> bool {
        number >= self.cancun_height
    }

    /// Whether Prague rules apply at `number`.
    pub fn is_prague(&self, number: BlockNumber) -> bool {
        number >= self.prague_height
    }

    /// Difficulty bomb delay active at `number`, in blocks.
    pub fn bomb_delay(&self, number: BlockNumber) -> u64 {
        if number >= self.gray_glacier_height {
            11_400_000
        } else if number >= self.arrow_glacier_height {
            10_700_000
        } else if number >= self.london_height {
            9_700_000
        } else if number >= self.constantinople_height {
            5_000_000
        } else if number >= self.byzantium_height {
            3_000_000
        } else {
            0
        }
    }

    /// Precompile addresses warm from the start of every transaction
    /// (EIP-2929).
    pub fn precompile_addresses(&self, number: BlockNumber) -> Vec<Address> {
        let count = if self.is_cancun(number) { 10 } else { 9 };
        (1..=count).map(Address::from_low_u64_be).collect()
    }

    /// Base fee of the block following `parent` (EIP-1559), or `None`
    /// before London.
    pub fn next_base_fee(&self, parent: &Header) -> Option<U256> {
        if !self.is_london(parent.number + 1) {
            return None;
        }
        let parent_base_fee = match parent.base_fee_per_gas {
            // the first London block starts from the initial base fee
            None => return Some(self.initial_base_fee),
            Some(fee) => fee,
        };
        let target = parent.gas_limit / U256::from(self.elasticity_multiplier);
        if target.is_zero() {
            return Some(parent_base_fee);
        }
        let denominator = U256::from(self.base_fee_max_change_denominator);
        Some(if parent.gas_used > target {
            let delta = (parent_base_fee * (parent.gas_used - target) / target / denominator)
                .max(U256::one());
            parent_base_fee + delta
        } else if parent.gas_used < target {
            let delta = parent_base_fee * (target - parent.gas_used) / target / denominator;
            parent_base_fee.saturating_sub(delta)
        } else {
            parent_base_fee
        })
    }
}

/// Parameters for a block chain, plus the genesis it grows from.
#[derive(Debug, Clone)]
pub struct Spec {
    /// User-friendly name of the chain.
    pub name: String,
    /// Common parameters.
    pub params: CommonParams,
    /// Genesis block author.
    pub genesis_author: Address,
    /// Genesis difficulty.
    pub genesis_difficulty: U256,
    /// Genesis gas limit.
    pub genesis_gas_limit: U256,
    /// Genesis timestamp.
    pub genesis_timestamp: u64,
    /// Genesis extra data.
    pub genesis_extra_data: Vec<u8>,
    /// Pre-funded accounts.
    pub genesis_accounts: Vec<(Address, U256)>,
}

impl Spec {
    /// A proof-of-work development chain: every feature fork active from
    /// genesis, the merge far in the future.
    pub fn new_test() -> Self {
        Spec {
            name: "test".into(),
            params: CommonParams {
                chain_id: 1337,
                network_id: 1337,
                min_gas_limit: 5_000.into(),
                homestead_height: 0,
                byzantium_height: 0,
                constantinople_height: 0,
                istanbul_height: 0,
                london_height: 0,
                arrow_glacier_height: 0,
                gray_glacier_height: 0,
                merge_height: u64::max_value(),
                shanghai_height: u64::max_value(),
                cancun_height: u64::max_value(),
                prague_height: u64::max_value(),
                elasticity_multiplier: 2,
                base_fee_max_change_denominator: 8,
                initial_base_fee: 1_000_000_000.into(),
            },
            genesis_author: Address::zero(),
            genesis_difficulty: 131_072.into(),
            genesis_gas_limit: 30_000_000.into(),
            genesis_timestamp: 0,
            genesis_extra_data: b"ember test".to_vec(),
            genesis_accounts: Vec::new(),
        }
    }

    /// A post-merge development chain: proof of stake from genesis.
    pub fn new_test_pos() -> Self {
        let mut spec = Spec::new_test();
        spec.name = "test-pos".into();
        spec.params.merge_height = 0;
        spec.params.shanghai_height = 0;
        spec.params.cancun_height = 0;
        spec.genesis_difficulty = U256::zero();
        spec
    }

    /// The genesis header implied by this chain specification.
    pub fn genesis_header(&self) -> Header {
        let params = &self.params;
        let mut header = Header {
            author: self.genesis_author,
            difficulty: self.genesis_difficulty,
            gas_limit: self.genesis_gas_limit,
            timestamp: self.genesis_timestamp,
            extra_data: self.genesis_extra_data.clone(),
            ..Default::default()
        };
        if params.is_london(0) {
            header.base_fee_per_gas = Some(params.initial_base_fee);
        }
        if params.is_shanghai(0) {
            header.withdrawals_root = Some(keccak_hash::KECCAK_NULL_RLP);
        }
        if params.is_cancun(0) {
            header.blob_gas_used = Some(0);
            header.excess_blob_gas = Some(0);
            header.parent_beacon_block_root = Some(H256::zero());
        }
        if !params.is_merged(0) {
            header.nonce = ethereum_types::H64::from_low_u64_be(0x42);
            header.mix_digest = H256::from_low_u64_be(1);
        }
        header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_fee_tracks_gas_usage() {
        let params = Spec::new_test().params;
        let mut parent = Header {
            number: 1,
            gas_limit: 30_000_000.into(),
            base_fee_per_gas: Some(1_000_000_000.into()),
            ..Default::default()
        };

        // exactly at target: unchanged
        parent.gas_used = 15_000_000.into();
        assert_eq!(
            params.next_base_fee(&parent),
            Some(1_000_000_000.into())
        );

        // full block: up by 1/8
        parent.gas_used = 30_000_000.into();
        assert_eq!(
            params.next_base_fee(&parent),
            Some(1_125_000_000.into())
        );

        // empty block: down by 1/8
        parent.gas_used = U256::zero();
        assert_eq!(params.next_base_fee(&parent), Some(875_000_000.into()));
    }

    #[test]
    fn first_london_block_uses_initial_base_fee() {
        let params = Spec::new_test().params;
        let parent = Header {
            number: 0,
            gas_limit: 30_000_000.into(),
            base_fee_per_gas: None,
            ..Default::default()
        };
        assert_eq!(params.next_base_fee(&parent), Some(params.initial_base_fee));
    }

    #[test]
    fn genesis_header_is_stable() {
        let spec = Spec::new_test();
        assert_eq!(spec.genesis_header().hash(), spec.genesis_header().hash());
        assert_eq!(spec.genesis_header().number, 0);
    }

    #[test]
    fn pos_genesis_is_sealed_empty() {
        let spec = Spec::new_test_pos();
        let genesis = spec.genesis_header();
        assert!(genesis.difficulty.is_zero());
        assert!(genesis.nonce.is_zero());
    }
}
