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

//! State commitment: the Merkle root over the flat state.
//!
//! Rebuilt from the hot tables after every block. This walks the full
//! domain, which is fine for the in-memory engine; an incremental
//! commitment would slot in behind the same function.

use std::collections::BTreeMap;

use common_types::basic_account::BasicAccount;
use embercore_kv::{tables, Error as KvError, ReadTransaction};
use ethereum_types::{H256, U256};
use keccak_hash::{keccak, KECCAK_NULL_RLP};
use rlp::RlpStream;

use crate::error::Error;

// Walk a domain hot table, yielding (key, newest non-tombstone value).
fn walk_latest(
    tx: &dyn ReadTransaction,
    table: &str,
    key_width: usize,
) -> Result<Vec<(Vec<u8>, Vec<u8>)>, Error> {
    let mut cursor = tx.cursor(table)?;
    let mut out: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
    let mut entry = cursor.first();
    while let Some((key, value)) = entry {
        if key.len() != key_width + 8 {
            return Err(KvError::CorruptedData(format!(
                "{}: unexpected key width {}",
                table,
                key.len()
            ))
            .into());
        }
        if value.len() < 8 {
            return Err(KvError::CorruptedData(format!("{}: truncated value", table)).into());
        }
        let logical = key[..key_width].to_vec();
        let newest_for_key = out.last().map_or(true, |(prev, _)| *prev != logical);
        if newest_for_key {
            // first entry per key is the newest step
            out.push((logical, value[8..].to_vec()));
        }
        entry = cursor.next();
    }
    Ok(out)
}

/// Compute the state root over the accounts and storage domains.
pub fn state_root(tx: &dyn ReadTransaction) -> Result<H256, Error> {
    // group live storage slots by address hash and incarnation
    let mut storage: BTreeMap<Vec<u8>, Vec<(Vec<u8>, Vec<u8>)>> = BTreeMap::new();
    for (key, value) in walk_latest(tx, tables::PLAIN_STORAGE, 72)? {
        if value.is_empty() {
            continue;
        }
        // 32-byte address hash ++ 8-byte incarnation scopes the slot set
        let mut scope = key[..32].to_vec();
        scope.extend_from_slice(&key[64..72]);
        let slot_hash = key[32..64].to_vec();
        storage
            .entry(scope)
            .or_insert_with(Vec::new)
            .push((slot_hash, rlp::encode(&U256::from(&value[..]))));
    }

    let mut account_pairs: Vec<(H256, Vec<u8>)> = Vec::new();
    for (address, value) in walk_latest(tx, tables::PLAIN_STATE, 20)? {
        if value.is_empty() {
            continue;
        }
        let account: BasicAccount = rlp::decode(&value)
            .map_err(|e| KvError::CorruptedData(format!("account record: {}", e)))?;
        let address_hash = keccak(&address);
        let mut scope = address_hash.as_bytes().to_vec();
        scope.extend_from_slice(&account.incarnation.to_be_bytes());
        let storage_root = match storage.get(&scope) {
            Some(slots) => triehash_ethereum::trie_root(slots.clone()),
            None => KECCAK_NULL_RLP,
        };
        let mut stream = RlpStream::new_list(4);
        stream.append(&account.nonce);
        stream.append(&account.balance);
        stream.append(&storage_root);
        stream.append(&account.code_hash);
        account_pairs.push((address_hash, stream.out()));
    }

    Ok(triehash_ethereum::trie_root(account_pairs.into_iter().map(
        |(hash, value)| (hash.as_bytes().to_vec(), value),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{storage_key, Domains};
    use embercore_kv::{KeyValueStore, MemoryStore};
    use ethereum_types::Address;

    #[test]
    fn empty_state_has_the_null_root() {
        let store = MemoryStore::new();
        let tx = store.begin_read().unwrap();
        assert_eq!(state_root(tx.as_ref()).unwrap(), KECCAK_NULL_RLP);
    }

    #[test]
    fn root_changes_with_account_writes() {
        let store = MemoryStore::new();
        let domains = Domains::default();
        let account = BasicAccount::with_balance(100.into());

        let mut tx = store.begin_write().unwrap();
        domains
            .accounts
            .put(
                tx.as_mut(),
                Address::from_low_u64_be(1).as_bytes(),
                &rlp::encode(&account),
                1,
            )
            .unwrap();
        tx.commit().unwrap();

        let tx = store.begin_read().unwrap();
        let one_account = state_root(tx.as_ref()).unwrap();
        assert_ne!(one_account, KECCAK_NULL_RLP);
        drop(tx);

        let mut tx = store.begin_write().unwrap();
        domains
            .accounts
            .put(
                tx.as_mut(),
                Address::from_low_u64_be(2).as_bytes(),
                &rlp::encode(&account),
                2,
            )
            .unwrap();
        tx.commit().unwrap();
        let tx = store.begin_read().unwrap();
        assert_ne!(state_root(tx.as_ref()).unwrap(), one_account);
    }

    #[test]
    fn deleted_accounts_restore_the_prior_root() {
        let store = MemoryStore::new();
        let domains = Domains::default();
        let address = Address::from_low_u64_be(7);
        let account = BasicAccount::with_balance(5.into());

        let mut tx = store.begin_write().unwrap();
        domains
            .accounts
            .put(tx.as_mut(), address.as_bytes(), &rlp::encode(&account), 1)
            .unwrap();
        tx.commit().unwrap();

        let mut tx = store.begin_write().unwrap();
        domains.accounts.delete(tx.as_mut(), address.as_bytes(), 2).unwrap();
        tx.commit().unwrap();

        let tx = store.begin_read().unwrap();
        assert_eq!(state_root(tx.as_ref()).unwrap(), KECCAK_NULL_RLP);
    }

    #[test]
    fn storage_slots_feed_the_account_root() {
        let store = MemoryStore::new();
        let domains = Domains::default();
        let address = Address::from_low_u64_be(7);
        let account = BasicAccount::with_balance(5.into());

        let mut tx = store.begin_write().unwrap();
        domains
            .accounts
            .put(tx.as_mut(), address.as_bytes(), &rlp::encode(&account), 1)
            .unwrap();
        tx.commit().unwrap();
        let tx_read = store.begin_read().unwrap();
        let without_storage = state_root(tx_read.as_ref()).unwrap();
        drop(tx_read);

        let slot = storage_key(&address, account.incarnation, &H256::from_low_u64_be(1));
        let mut tx = store.begin_write().unwrap();
        domains
            .storage
            .put(tx.as_mut(), &slot, H256::from_low_u64_be(9).as_bytes(), 2)
            .unwrap();
        tx.commit().unwrap();

        let tx = store.begin_read().unwrap();
        assert_ne!(state_root(tx.as_ref()).unwrap(), without_storage);
    }
}
