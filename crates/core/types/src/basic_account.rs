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

//! Basic account type -- the flat-state representation of an account.

use ethereum_types::{Address, H256, U256};
use keccak_hash::{KECCAK_EMPTY, KECCAK_NULL_RLP};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

/// Basic account type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAccount {
    /// Nonce of the account.
    pub nonce: u64,
    /// Balance of the account.
    pub balance: U256,
    /// Storage root of the account.
    pub storage_root: H256,
    /// Code hash of the account.
    pub code_hash: H256,
    /// Incarnation, bumped on every self-destruct. Scopes storage keys so a
    /// re-created contract starts from an empty store.
    pub incarnation: u64,
    /// Delegation designation per EIP-7702, if the account code is a pointer.
    pub delegation: Option<Address>,
}

impl Default for BasicAccount {
    fn default() -> Self {
        BasicAccount {
            nonce: 0,
            balance: U256::zero(),
            storage_root: KECCAK_NULL_RLP,
            code_hash: KECCAK_EMPTY,
            incarnation: 1,
            delegation: None,
        }
    }
}

impl BasicAccount {
    /// New account with the given balance and everything else at defaults.
    pub fn with_balance(balance: U256) -> Self {
        BasicAccount {
            balance,
            ..Default::default()
        }
    }

    /// Whether the account has associated code.
    pub fn has_code(&self) -> bool {
        self.code_hash != KECCAK_EMPTY
    }

    /// Whether this account is empty in the EIP-161 sense.
    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && !self.has_code()
    }

    /// The canonical four-field RLP used for state root computation.
    pub fn rlp_for_state_root(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(4);
        stream.append(&self.nonce);
        stream.append(&self.balance);
        stream.append(&self.storage_root);
        stream.append(&self.code_hash);
        stream.out()
    }
}

impl Encodable for BasicAccount {
    fn rlp_append(&self, s: &mut RlpStream) {
        let len = if self.delegation.is_some() { 6 } else { 5 };
        s.begin_list(len);
        s.append(&self.nonce);
        s.append(&self.balance);
        s.append(&self.storage_root);
        s.append(&self.code_hash);
        s.append(&self.incarnation);
        if let Some(ref target) = self.delegation {
            s.append(target);
        }
    }
}

impl Decodable for BasicAccount {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        let delegation = match rlp.item_count()? {
            5 => None,
            6 => Some(rlp.val_at(5)?),
            _ => return Err(DecoderError::RlpIncorrectListLen),
        };
        Ok(BasicAccount {
            nonce: rlp.val_at(0)?,
            balance: rlp.val_at(1)?,
            storage_root: rlp.val_at(2)?,
            code_hash: rlp.val_at(3)?,
            incarnation: rlp.val_at(4)?,
            delegation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rlp_round_trip() {
        let account = BasicAccount {
            nonce: 3,
            balance: U256::from(1_000_000_000u64),
            incarnation: 2,
            ..Default::default()
        };
        let encoded = rlp::encode(&account);
        let decoded: BasicAccount = rlp::decode(&encoded).unwrap();
        assert_eq!(account, decoded);
    }

    #[test]
    fn rlp_round_trip_with_delegation() {
        let account = BasicAccount {
            nonce: 1,
            delegation: Some(Address::from_low_u64_be(0xdead)),
            ..Default::default()
        };
        let encoded = rlp::encode(&account);
        let decoded: BasicAccount = rlp::decode(&encoded).unwrap();
        assert_eq!(account, decoded);
    }

    #[test]
    fn fresh_account_is_empty() {
        assert!(BasicAccount::default().is_empty());
        assert!(!BasicAccount::with_balance(1.into()).is_empty());
    }
}
