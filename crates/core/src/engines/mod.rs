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

//! Consensus engine specification and the two implementations: pre-merge
//! proof of work and post-merge proof of stake, selected by block height.

mod beacon;
mod ethash;

pub use self::{beacon::Beacon, ethash::Ethash};

use common_types::header::Header;
use ethereum_types::{H256, U256};
use keccak_hash::keccak;
use unexpected::{Mismatch, OutOfBounds};

use crate::{error::BlockError, spec::CommonParams};

/// Deepest ancestry an uncle may reference.
pub const MAX_UNCLE_AGE: u64 = 6;

/// A consensus mechanism for the chain.
pub trait Engine: Send + Sync {
    /// The name of this engine.
    fn name(&self) -> &str;

    /// Verify everything about `header` that its parent determines.
    fn validate_header(&self, header: &Header, parent: &Header) -> Result<(), BlockError>;

    /// Verify the seal fields of `header` in isolation.
    fn verify_seal(&self, header: &Header) -> Result<(), BlockError>;

    /// The reward credited to the block author, including the per-uncle
    /// bonus.
    fn block_reward(&self, header: &Header, uncles: &[Header]) -> U256;

    /// The reward credited to the author of an included uncle.
    fn uncle_reward(&self, nephew: u64, uncle: u64) -> U256 {
        let _ = (nephew, uncle);
        U256::zero()
    }

    /// Whether `header` is governed by proof of stake.
    fn is_pos(&self, header: &Header) -> bool;
}

// Structural checks shared by both engines.
fn verify_parent_relation(header: &Header, parent: &Header) -> Result<(), BlockError> {
    if header.parent_hash != parent.hash() {
        return Err(BlockError::InvalidParentHash(Mismatch {
            expected: parent.hash(),
            found: header.parent_hash,
        }));
    }
    if header.number != parent.number + 1 {
        return Err(BlockError::InvalidNumber(Mismatch {
            expected: parent.number + 1,
            found: header.number,
        }));
    }
    if header.timestamp <= parent.timestamp {
        return Err(BlockError::InvalidTimestamp(OutOfBounds {
            min: Some(parent.timestamp + 1),
            max: None,
            found: header.timestamp,
        }));
    }
    if header.gas_used > header.gas_limit {
        return Err(BlockError::TooMuchGasUsed(OutOfBounds {
            min: None,
            max: Some(header.gas_limit),
            found: header.gas_used,
        }));
    }
    Ok(())
}

/// Height-switched pair of engines.
pub struct EngineSelector {
    params: CommonParams,
    pow: Ethash,
    pos: Beacon,
}

impl EngineSelector {
    /// Build the selector for a chain.
    pub fn new(params: CommonParams) -> Self {
        EngineSelector {
            pow: Ethash::new(params.clone()),
            pos: Beacon::new(),
            params,
        }
    }

    /// The engine in charge of the block at `number`.
    pub fn engine_at(&self, number: u64) -> &dyn Engine {
        if self.params.is_merged(number) {
            &self.pos
        } else {
            &self.pow
        }
    }

    /// Full verification of a header with its uncles: parent-derived
    /// checks, seal, and uncle admissibility.
    pub fn verify_block(
        &self,
        header: &Header,
        parent: &Header,
        uncles: &[Header],
    ) -> Result<(), BlockError> {
        let engine = self.engine_at(header.number);
        engine.validate_header(header, parent)?;
        engine.verify_seal(header)?;

        let uncles_hash = keccak(rlp_of_uncles(uncles));
        if header.uncles_hash != uncles_hash {
            return Err(BlockError::InvalidUncleHash(Mismatch {
                expected: uncles_hash,
                found: header.uncles_hash,
            }));
        }

        if engine.is_pos(header) {
            if !uncles.is_empty() {
                return Err(BlockError::UnclesNotAllowed);
            }
            return Ok(());
        }

        if uncles.len() > 2 {
            return Err(BlockError::TooManyUncles(OutOfBounds {
                min: None,
                max: Some(2),
                found: uncles.len(),
            }));
        }
        for uncle in uncles {
            let age = header.number.saturating_sub(uncle.number);
            if age == 0 || age > MAX_UNCLE_AGE {
                return Err(BlockError::TooManyUncles(OutOfBounds {
                    min: Some(1),
                    max: Some(MAX_UNCLE_AGE as usize),
                    found: age as usize,
                }));
            }
            engine.verify_seal(uncle)?;
        }
        Ok(())
    }
}

fn rlp_of_uncles(uncles: &[Header]) -> Vec<u8> {
    let mut s = rlp::RlpStream::new();
    s.append_list(uncles);
    s.out()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Spec;
    use keccak_hash::KECCAK_EMPTY_LIST_RLP;

    #[test]
    fn empty_uncle_list_hashes_to_the_empty_list_rlp() {
        assert_eq!(keccak(rlp_of_uncles(&[])), KECCAK_EMPTY_LIST_RLP);
    }

    #[test]
    fn selector_switches_at_merge_height() {
        let mut spec = Spec::new_test();
        spec.params.merge_height = 10;
        let selector = EngineSelector::new(spec.params);
        assert_eq!(selector.engine_at(9).name(), "Ethash");
        assert_eq!(selector.engine_at(10).name(), "Beacon");
        assert_eq!(selector.engine_at(11).name(), "Beacon");
    }
}
