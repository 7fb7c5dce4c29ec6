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

//! Single account in the overlay: the flat record plus in-flight storage
//! and code deltas.

use std::{collections::HashMap, sync::Arc};

use common_types::basic_account::BasicAccount;
use ethereum_types::{Address, H256, U256};
use keccak_hash::{keccak, KECCAK_EMPTY};
use parity_bytes::Bytes;

/// Overlay representation of a single account.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Account nonce.
    pub nonce: u64,
    /// Account balance.
    pub balance: U256,
    /// Storage root as last persisted.
    pub storage_root: H256,
    /// Hash of the account code.
    pub code_hash: H256,
    /// Incarnation scoping the storage keys.
    pub incarnation: u64,
    /// EIP-7702 delegation target.
    pub delegation: Option<Address>,
    /// Code, once loaded or set.
    pub code: Option<Arc<Bytes>>,
    /// Whether the code must be flushed on commit.
    pub code_dirty: bool,
    /// Slots written during execution.
    pub storage_changes: HashMap<H256, H256>,
    /// Slots read from the store, cached.
    pub original_storage: HashMap<H256, H256>,
}

impl Account {
    /// Fresh, empty account.
    pub fn new_basic(balance: U256, nonce: u64) -> Self {
        Account::from_basic(BasicAccount {
            nonce,
            balance,
            ..Default::default()
        })
    }

    /// Overlay view of a persisted record.
    pub fn from_basic(basic: BasicAccount) -> Self {
        Account {
            nonce: basic.nonce,
            balance: basic.balance,
            storage_root: basic.storage_root,
            code_hash: basic.code_hash,
            incarnation: basic.incarnation,
            delegation: basic.delegation,
            code: None,
            code_dirty: false,
            storage_changes: HashMap::new(),
            original_storage: HashMap::new(),
        }
    }

    /// The persistable flat record.
    pub fn to_basic(&self) -> BasicAccount {
        BasicAccount {
            nonce: self.nonce,
            balance: self.balance,
            storage_root: self.storage_root,
            code_hash: self.code_hash,
            incarnation: self.incarnation,
            delegation: self.delegation,
        }
    }

    /// Install new code, hashing it and marking it for flush.
    pub fn set_code(&mut self, code: Bytes) {
        self.code_hash = keccak(&code);
        self.code = Some(Arc::new(code));
        self.code_dirty = true;
    }

    /// Whether the account carries code.
    pub fn has_code(&self) -> bool {
        self.code_hash != KECCAK_EMPTY
    }

    /// Whether the account is empty in the EIP-161 sense.
    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && !self.has_code()
    }

    /// Current value of a slot as seen by this overlay, if known without a
    /// database read.
    pub fn cached_storage_at(&self, key: &H256) -> Option<H256> {
        self.storage_changes
            .get(key)
            .or_else(|| self.original_storage.get(key))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_round_trip() {
        let mut account = Account::new_basic(100.into(), 3);
        account.incarnation = 2;
        let basic = account.to_basic();
        assert_eq!(Account::from_basic(basic), account);
    }

    #[test]
    fn set_code_updates_hash() {
        let mut account = Account::new_basic(0.into(), 0);
        assert!(!account.has_code());
        account.set_code(vec![0x60, 0x00]);
        assert!(account.has_code());
        assert!(account.code_dirty);
        assert_eq!(account.code_hash, keccak(&[0x60u8, 0x00][..]));
    }

    #[test]
    fn storage_write_shadows_original() {
        let mut account = Account::new_basic(0.into(), 0);
        account
            .original_storage
            .insert(H256::from_low_u64_be(1), H256::from_low_u64_be(10));
        assert_eq!(
            account.cached_storage_at(&H256::from_low_u64_be(1)),
            Some(H256::from_low_u64_be(10))
        );
        account
            .storage_changes
            .insert(H256::from_low_u64_be(1), H256::from_low_u64_be(20));
        assert_eq!(
            account.cached_storage_at(&H256::from_low_u64_be(1)),
            Some(H256::from_low_u64_be(20))
        );
    }
}
