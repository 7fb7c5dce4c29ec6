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

//! The pre-merge proof-of-work engine.

use common_types::header::Header;
use ethereum_types::U256;
use unexpected::Mismatch;

use super::{verify_parent_relation, Engine};
use crate::{error::BlockError, spec::CommonParams};

/// Lowest difficulty the adjustment may produce.
pub const MINIMUM_DIFFICULTY: u64 = 131_072;
/// Divisor of the parent difficulty in the adjustment.
const DIFFICULTY_BOUND_DIVISOR: u64 = 2_048;
/// Blocks per difficulty-bomb period.
const EXP_DIFF_PERIOD: u64 = 100_000;

/// Proof-of-work engine. Seal verification is structural only: a full
/// implementation runs Hashimoto over the DAG, which is an explicit
/// integration point here.
pub struct Ethash {
    params: CommonParams,
}

impl Ethash {
    /// New engine over the chain parameters.
    pub fn new(params: CommonParams) -> Self {
        Ethash { params }
    }

    /// Difficulty of a block with the given timestamp on top of `parent`,
    /// per the Homestead adjustment plus the delayed difficulty bomb.
    pub fn boundary_difficulty(&self, parent: &Header, number: u64, timestamp: u64) -> U256 {
        let parent_difficulty = parent.difficulty;
        let adjustment = parent_difficulty / U256::from(DIFFICULTY_BOUND_DIVISOR);
        let delta = timestamp.saturating_sub(parent.timestamp);

        // max(1 - delta/10, -99)
        let factor = (delta / 10) as i64;
        let mut difficulty = if factor <= 1 {
            parent_difficulty + adjustment * U256::from((1 - factor) as u64)
        } else {
            let down = (factor - 1).min(99) as u64;
            parent_difficulty.saturating_sub(adjustment * U256::from(down))
        };

        if difficulty < U256::from(MINIMUM_DIFFICULTY) {
            difficulty = U256::from(MINIMUM_DIFFICULTY);
        }

        // the bomb, with the fork-scheduled delay
        let delayed = number.saturating_sub(self.params.bomb_delay(number));
        let period = delayed / EXP_DIFF_PERIOD;
        if period > 1 {
            difficulty = difficulty + (U256::one() << ((period - 2) as usize));
        }
        difficulty
    }

    fn reward_base(&self, number: u64) -> U256 {
        let ether = U256::from(10).pow(18.into());
        if number >= self.params.constantinople_height {
            U256::from(2) * ether
        } else if number >= self.params.byzantium_height {
            U256::from(3) * ether
        } else {
            U256::from(5) * ether
        }
    }
}

impl Engine for Ethash {
    fn name(&self) -> &str {
        "Ethash"
    }

    fn validate_header(&self, header: &Header, parent: &Header) -> Result<(), BlockError> {
        verify_parent_relation(header, parent)?;
        let expected = self.boundary_difficulty(parent, header.number, header.timestamp);
        if header.difficulty != expected {
            return Err(BlockError::InvalidDifficulty(Mismatch {
                expected,
                found: header.difficulty,
            }));
        }
        Ok(())
    }

    fn verify_seal(&self, header: &Header) -> Result<(), BlockError> {
        if header.difficulty.is_zero() {
            return Err(BlockError::InvalidPoWBlock(
                "zero difficulty before the merge".into(),
            ));
        }
        if header.nonce.is_zero() {
            return Err(BlockError::InvalidNonce(Mismatch {
                expected: header.nonce,
                found: ethereum_types::H64::zero(),
            }));
        }
        // TODO(hashimoto): verify the mix digest against the DAG; until the
        // verifier is wired in, any non-zero digest is accepted.
        if header.mix_digest.is_zero() {
            return Err(BlockError::InvalidMixDigest);
        }
        Ok(())
    }

    fn block_reward(&self, header: &Header, uncles: &[Header]) -> U256 {
        let base = self.reward_base(header.number);
        base + (base >> 5) * U256::from(uncles.len())
    }

    fn uncle_reward(&self, nephew: u64, uncle: u64) -> U256 {
        let base = self.reward_base(nephew);
        let distance = nephew.saturating_sub(uncle);
        match distance {
            1 => base * U256::from(7) / U256::from(8),
            2 => base * U256::from(6) / U256::from(8),
            _ => U256::zero(),
        }
    }

    fn is_pos(&self, _header: &Header) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Spec;
    use ethereum_types::{H256, H64};

    fn engine() -> Ethash {
        Ethash::new(Spec::new_test().params)
    }

    fn parent() -> Header {
        Header {
            number: 100,
            difficulty: 17_179_869_184u64.into(),
            timestamp: 1_609_459_200,
            gas_limit: 30_000_000.into(),
            mix_digest: H256::from_low_u64_be(1),
            nonce: H64::from_low_u64_be(7),
            ..Default::default()
        }
    }

    fn child_of(parent: &Header, timestamp: u64) -> Header {
        Header {
            parent_hash: parent.hash(),
            number: parent.number + 1,
            timestamp,
            gas_limit: parent.gas_limit,
            mix_digest: H256::from_low_u64_be(2),
            nonce: H64::from_low_u64_be(8),
            ..Default::default()
        }
    }

    #[test]
    fn difficulty_of_a_timely_child() {
        let engine = engine();
        let parent = parent();
        let difficulty = engine.boundary_difficulty(&parent, 101, parent.timestamp + 12);
        assert!(difficulty > U256::zero());
        assert!(difficulty >= U256::from(MINIMUM_DIFFICULTY));
        // delta of 12 seconds leaves the parent difficulty unchanged
        assert_eq!(difficulty, parent.difficulty);
    }

    #[test]
    fn fast_child_raises_difficulty() {
        let engine = engine();
        let parent = parent();
        let fast = engine.boundary_difficulty(&parent, 101, parent.timestamp + 3);
        assert!(fast > parent.difficulty);
    }

    #[test]
    fn slow_child_lowers_difficulty_with_floor() {
        let engine = engine();
        let parent = parent();
        let slow = engine.boundary_difficulty(&parent, 101, parent.timestamp + 60);
        assert!(slow < parent.difficulty);
        let mut tiny = parent.clone();
        tiny.difficulty = 1_000.into();
        let floored = engine.boundary_difficulty(&tiny, 101, tiny.timestamp + 600);
        assert_eq!(floored, U256::from(MINIMUM_DIFFICULTY));
    }

    #[test]
    fn wrong_difficulty_is_rejected() {
        let engine = engine();
        let parent = parent();
        let mut child = child_of(&parent, parent.timestamp + 12);
        child.difficulty = engine.boundary_difficulty(&parent, child.number, child.timestamp);
        assert!(engine.validate_header(&child, &parent).is_ok());

        child.difficulty = 1_000.into();
        match engine.validate_header(&child, &parent) {
            Err(BlockError::InvalidDifficulty(_)) => {}
            other => panic!("expected InvalidDifficulty, got {:?}", other),
        }
    }

    #[test]
    fn seal_requires_nonzero_fields() {
        let engine = engine();
        let mut header = parent();
        assert!(engine.verify_seal(&header).is_ok());
        header.mix_digest = H256::zero();
        assert_eq!(engine.verify_seal(&header), Err(BlockError::InvalidMixDigest));
        header.mix_digest = H256::from_low_u64_be(1);
        header.nonce = H64::zero();
        assert!(matches!(
            engine.verify_seal(&header),
            Err(BlockError::InvalidNonce(_))
        ));
    }

    #[test]
    fn uncle_rewards_decay_with_distance() {
        let engine = engine();
        let base = engine.reward_base(100);
        assert_eq!(base, U256::from(2) * U256::from(10).pow(18.into()));
        assert_eq!(
            engine.uncle_reward(100, 99),
            U256::from(1_750_000_000_000_000_000u64)
        );
        assert_eq!(
            engine.uncle_reward(100, 98),
            U256::from(1_500_000_000_000_000_000u64)
        );
        assert_eq!(engine.uncle_reward(100, 97), U256::zero());
    }

    #[test]
    fn nephew_bonus_is_a_thirty_second_per_uncle() {
        let engine = engine();
        let header = parent();
        let base = engine.reward_base(header.number);
        assert_eq!(engine.block_reward(&header, &[]), base);
        let uncles = vec![Header::default(), Header::default()];
        assert_eq!(
            engine.block_reward(&header, &uncles),
            base + (base >> 5) * U256::from(2)
        );
    }

    #[test]
    fn bomb_adds_exponential_term() {
        let mut spec = Spec::new_test();
        // no delay scheduled at all
        spec.params.byzantium_height = u64::max_value();
        spec.params.constantinople_height = u64::max_value();
        spec.params.london_height = u64::max_value();
        spec.params.arrow_glacier_height = u64::max_value();
        spec.params.gray_glacier_height = u64::max_value();
        let engine = Ethash::new(spec.params);
        let parent = parent();
        let calm = engine.boundary_difficulty(&parent, 101, parent.timestamp + 12);
        let bombed = engine.boundary_difficulty(&parent, 400_000, parent.timestamp + 12);
        assert_eq!(bombed - calm, U256::one() << 2);
    }
}
