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

//! The post-merge proof-of-stake engine.

use common_types::header::Header;
use ethereum_types::{H64, U256};
use keccak_hash::KECCAK_EMPTY_LIST_RLP;
use unexpected::Mismatch;

use super::{verify_parent_relation, Engine};
use crate::error::BlockError;

/// Proof-of-stake engine. Attestation and committee signatures are the
/// consensus client's business; what remains here are the structural rules
/// the execution layer owns.
#[derive(Default)]
pub struct Beacon;

impl Beacon {
    /// New beacon engine.
    pub fn new() -> Self {
        Beacon
    }

    fn check_seal_fields(header: &Header) -> Result<(), BlockError> {
        if !header.difficulty.is_zero() {
            return Err(BlockError::InvalidDifficulty(Mismatch {
                expected: U256::zero(),
                found: header.difficulty,
            }));
        }
        if !header.nonce.is_zero() {
            return Err(BlockError::InvalidNonce(Mismatch {
                expected: H64::zero(),
                found: header.nonce,
            }));
        }
        Ok(())
    }
}

impl Engine for Beacon {
    fn name(&self) -> &str {
        "Beacon"
    }

    fn validate_header(&self, header: &Header, parent: &Header) -> Result<(), BlockError> {
        verify_parent_relation(header, parent)?;
        Self::check_seal_fields(header)?;
        if header.uncles_hash != KECCAK_EMPTY_LIST_RLP {
            return Err(BlockError::InvalidUncleHash(Mismatch {
                expected: KECCAK_EMPTY_LIST_RLP,
                found: header.uncles_hash,
            }));
        }
        if let Some(root) = header.parent_beacon_block_root {
            if root.is_zero() {
                return Err(BlockError::InvalidBeaconRoot);
            }
        }
        Ok(())
    }

    fn verify_seal(&self, header: &Header) -> Result<(), BlockError> {
        Self::check_seal_fields(header)
    }

    fn block_reward(&self, _header: &Header, _uncles: &[Header]) -> U256 {
        // validator rewards live on the beacon chain
        U256::zero()
    }

    fn is_pos(&self, _header: &Header) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::H256;

    fn parent() -> Header {
        Header {
            number: 10,
            timestamp: 100,
            gas_limit: 30_000_000.into(),
            ..Default::default()
        }
    }

    fn child() -> Header {
        let parent = parent();
        Header {
            parent_hash: parent.hash(),
            number: 11,
            timestamp: 112,
            gas_limit: parent.gas_limit,
            mix_digest: H256::from_low_u64_be(0xbeac04),
            parent_beacon_block_root: Some(H256::from_low_u64_be(5)),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_well_formed_header() {
        assert!(Beacon::new().validate_header(&child(), &parent()).is_ok());
    }

    #[test]
    fn rejects_nonzero_difficulty() {
        let mut header = child();
        header.difficulty = 1.into();
        assert!(matches!(
            Beacon::new().validate_header(&header, &parent()),
            Err(BlockError::InvalidDifficulty(_))
        ));
    }

    #[test]
    fn rejects_nonzero_nonce() {
        let mut header = child();
        header.nonce = H64::from_low_u64_be(1);
        assert!(matches!(
            Beacon::new().verify_seal(&header),
            Err(BlockError::InvalidNonce(_))
        ));
    }

    #[test]
    fn rejects_zero_beacon_root_when_present() {
        let mut header = child();
        header.parent_beacon_block_root = Some(H256::zero());
        assert_eq!(
            Beacon::new().validate_header(&header, &parent()),
            Err(BlockError::InvalidBeaconRoot)
        );
    }

    #[test]
    fn reward_is_zero() {
        assert_eq!(
            Beacon::new().block_reward(&child(), &[]),
            U256::zero()
        );
    }
}
