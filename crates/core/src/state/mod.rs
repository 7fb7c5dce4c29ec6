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

//! The journaled state overlay.
//!
//! During execution of one transaction the EVM sees accounts, storage,
//! transient storage, code, the access list, the log buffer and the refund
//! counter through this overlay. Every mutation is journalled before it is
//! applied; `snapshot`/`revert_to_snapshot` give exact rollback. Nothing
//! here touches the temporal store until `commit`.

pub mod account;
pub mod journal;

pub use self::{account::Account, journal::JournalEntry};

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use common_types::{basic_account::BasicAccount, log_entry::LogEntry};
use embercore_kv::{tables, Cursor, ReadTransaction, WriteTransaction};
use embercore_temporal::Domain;
use ethereum_types::{Address, H256, U256};
use keccak_hash::keccak;
use parity_bytes::Bytes;

use crate::error::Error;

/// Composite storage key: hashed address, hashed slot, incarnation.
pub fn storage_key(address: &Address, incarnation: u64, slot: &H256) -> Vec<u8> {
    let mut key = Vec::with_capacity(72);
    key.extend_from_slice(keccak(address.as_bytes()).as_bytes());
    key.extend_from_slice(keccak(slot.as_bytes()).as_bytes());
    key.extend_from_slice(&incarnation.to_be_bytes());
    key
}

/// The two standard domains the overlay commits into.
pub struct Domains {
    /// Accounts domain.
    pub accounts: Domain,
    /// Storage domain.
    pub storage: Domain,
}

impl Default for Domains {
    fn default() -> Self {
        Domains {
            accounts: embercore_temporal::accounts_domain(),
            storage: embercore_temporal::storage_domain(),
        }
    }
}

/// Read access to the flat state, decoupled from any transaction borrow.
pub trait StateReader: Send {
    /// Load an account record.
    fn account(&mut self, address: &Address) -> Result<Option<BasicAccount>, Error>;
    /// Load a storage slot by composite key.
    fn storage(&mut self, key: &[u8]) -> Result<Option<H256>, Error>;
    /// Load code by hash.
    fn code(&mut self, code_hash: &H256) -> Result<Option<Bytes>, Error>;
}

/// `StateReader` over snapshot cursors of the hot tables. The cursors are
/// taken when the reader is built, so a reader constructed from the write
/// transaction observes everything committed to it so far.
pub struct LatestReader {
    domains: Domains,
    accounts_cursor: Box<dyn Cursor>,
    storage_cursor: Box<dyn Cursor>,
    code_cursor: Box<dyn Cursor>,
}

impl LatestReader {
    /// Snapshot the hot tables of `tx`.
    pub fn new(tx: &dyn ReadTransaction) -> Result<Self, Error> {
        Ok(LatestReader {
            domains: Domains::default(),
            accounts_cursor: tx.cursor(tables::PLAIN_STATE)?,
            storage_cursor: tx.cursor(tables::PLAIN_STORAGE)?,
            code_cursor: tx.cursor(tables::CODE)?,
        })
    }
}

impl StateReader for LatestReader {
    fn account(&mut self, address: &Address) -> Result<Option<BasicAccount>, Error> {
        let raw = self
            .domains
            .accounts
            .get_latest_from(self.accounts_cursor.as_mut(), address.as_bytes())?;
        match raw {
            None => Ok(None),
            Some(bytes) => Ok(Some(rlp::decode(&bytes).map_err(|e| {
                embercore_kv::Error::CorruptedData(format!("account record: {}", e))
            })?)),
        }
    }

    fn storage(&mut self, key: &[u8]) -> Result<Option<H256>, Error> {
        let raw = self
            .domains
            .storage
            .get_latest_from(self.storage_cursor.as_mut(), key)?;
        Ok(raw.map(|bytes| {
            let mut padded = [0u8; 32];
            let len = bytes.len().min(32);
            padded[32 - len..].copy_from_slice(&bytes[bytes.len() - len..]);
            H256::from(padded)
        }))
    }

    fn code(&mut self, code_hash: &H256) -> Result<Option<Bytes>, Error> {
        match self.code_cursor.seek(code_hash.as_bytes()) {
            Some((key, value)) if key == code_hash.as_bytes() => Ok(Some(value)),
            _ => Ok(None),
        }
    }
}

/// `StateReader` answering as-of queries at a fixed transaction number.
/// Owns its read transaction, so it is self-contained for the lifetime of
/// an RPC call.
pub struct AsOfReader {
    tx: Box<dyn ReadTransaction>,
    tx_number: u64,
    domains: Domains,
}

impl AsOfReader {
    /// Reader pinned at `tx_number`.
    pub fn new(tx: Box<dyn ReadTransaction>, tx_number: u64) -> Self {
        AsOfReader {
            tx,
            tx_number,
            domains: Domains::default(),
        }
    }
}

impl StateReader for AsOfReader {
    fn account(&mut self, address: &Address) -> Result<Option<BasicAccount>, Error> {
        let raw = self
            .domains
            .accounts
            .get_as_of(self.tx.as_ref(), address.as_bytes(), self.tx_number)?;
        match raw {
            None => Ok(None),
            Some(bytes) => Ok(Some(rlp::decode(&bytes).map_err(|e| {
                embercore_kv::Error::CorruptedData(format!("account record: {}", e))
            })?)),
        }
    }

    fn storage(&mut self, key: &[u8]) -> Result<Option<H256>, Error> {
        let raw = self
            .domains
            .storage
            .get_as_of(self.tx.as_ref(), key, self.tx_number)?;
        Ok(raw.map(|bytes| {
            let mut padded = [0u8; 32];
            let len = bytes.len().min(32);
            padded[32 - len..].copy_from_slice(&bytes[bytes.len() - len..]);
            H256::from(padded)
        }))
    }

    fn code(&mut self, code_hash: &H256) -> Result<Option<Bytes>, Error> {
        Ok(self.tx.get(tables::CODE, code_hash.as_bytes())?)
    }
}

/// Representation of the entire state of all accounts in the system during
/// the execution of a block.
pub struct State {
    reader: Box<dyn StateReader>,
    cache: HashMap<Address, Option<Account>>,
    journal: Vec<JournalEntry>,
    dirty: HashMap<Address, usize>,
    touched: HashSet<Address>,
    access_addresses: HashSet<Address>,
    access_slots: HashSet<(Address, H256)>,
    transient: HashMap<(Address, H256), H256>,
    logs: Vec<LogEntry>,
    refund: i64,
}

impl State {
    /// Fresh overlay over the given reader.
    pub fn new(reader: Box<dyn StateReader>) -> Self {
        State {
            reader,
            cache: HashMap::new(),
            journal: Vec::new(),
            dirty: HashMap::new(),
            touched: HashSet::new(),
            access_addresses: HashSet::new(),
            access_slots: HashSet::new(),
            transient: HashMap::new(),
            logs: Vec::new(),
            refund: 0,
        }
    }

    // Journal an entry and bump the dirty counter it implies.
    fn note(&mut self, entry: JournalEntry) {
        if let Some(address) = entry.dirtied_address() {
            *self.dirty.entry(address).or_insert(0) += 1;
        }
        self.journal.push(entry);
    }

    /// Current journal length, to be passed back to `revert_to_snapshot`.
    pub fn snapshot(&self) -> usize {
        self.journal.len()
    }

    /// Pop journal entries in LIFO order until the journal is `snapshot`
    /// entries long, undoing each mutation.
    pub fn revert_to_snapshot(&mut self, snapshot: usize) {
        while self.journal.len() > snapshot {
            let entry = self
                .journal
                .pop()
                .expect("loop condition guarantees a journal entry; qed");
            if let Some(address) = entry.dirtied_address() {
                let counter = self
                    .dirty
                    .get_mut(&address)
                    .expect("dirty counter incremented when entry was journalled; qed");
                *counter -= 1;
                if *counter == 0 {
                    self.dirty.remove(&address);
                }
            }
            match entry {
                JournalEntry::AccountCreated { address } => {
                    self.cache.insert(address, None);
                }
                JournalEntry::AccountReset { address, prior }
                | JournalEntry::SelfDestructed { address, prior } => {
                    self.cache.insert(address, Some(*prior));
                }
                JournalEntry::BalanceChange { address, prior }
                | JournalEntry::BalanceIncrease { address, prior } => {
                    self.account_mut(&address).balance = prior;
                }
                JournalEntry::NonceChange { address, prior } => {
                    self.account_mut(&address).nonce = prior;
                }
                JournalEntry::StorageChange {
                    address,
                    key,
                    prior,
                } => {
                    let account = self.account_mut(&address);
                    match prior {
                        Some(value) => {
                            account.storage_changes.insert(key, value);
                        }
                        None => {
                            account.storage_changes.remove(&key);
                        }
                    }
                }
                JournalEntry::CodeChange {
                    address,
                    prior_code_hash,
                    prior_code,
                    prior_code_dirty,
                    prior_delegation,
                } => {
                    let account = self.account_mut(&address);
                    account.code_hash = prior_code_hash;
                    account.code = prior_code;
                    account.code_dirty = prior_code_dirty;
                    account.delegation = prior_delegation;
                }
                JournalEntry::RefundChange { prior } => {
                    self.refund = prior;
                }
                JournalEntry::LogAppend => {
                    self.logs.pop();
                }
                JournalEntry::Touched { address } => {
                    self.touched.remove(&address);
                }
                JournalEntry::AccessListAddress { address } => {
                    self.access_addresses.remove(&address);
                }
                JournalEntry::AccessListSlot { address, key } => {
                    self.access_slots.remove(&(address, key));
                }
                JournalEntry::TransientStorageChange {
                    address,
                    key,
                    prior,
                } => {
                    self.transient.insert((address, key), prior);
                }
            }
        }
    }

    fn account_mut(&mut self, address: &Address) -> &mut Account {
        self.cache
            .get_mut(address)
            .and_then(|entry| entry.as_mut())
            .expect("journalled mutations refer to cached accounts; qed")
    }

    fn ensure_cached(&mut self, address: &Address) -> Result<(), Error> {
        if !self.cache.contains_key(address) {
            let loaded = self.reader.account(address)?.map(Account::from_basic);
            self.cache.insert(*address, loaded);
        }
        Ok(())
    }

    /// Whether the account exists at all.
    pub fn exists(&mut self, address: &Address) -> Result<bool, Error> {
        self.ensure_cached(address)?;
        Ok(self.cache[address].is_some())
    }

    /// Account balance, zero for absent accounts.
    pub fn balance(&mut self, address: &Address) -> Result<U256, Error> {
        self.ensure_cached(address)?;
        Ok(self.cache[address]
            .as_ref()
            .map_or_else(U256::zero, |account| account.balance))
    }

    /// Account nonce, zero for absent accounts.
    pub fn nonce(&mut self, address: &Address) -> Result<u64, Error> {
        self.ensure_cached(address)?;
        Ok(self.cache[address]
            .as_ref()
            .map_or(0, |account| account.nonce))
    }

    /// Code hash, if the account exists.
    pub fn code_hash(&mut self, address: &Address) -> Result<Option<H256>, Error> {
        self.ensure_cached(address)?;
        Ok(self.cache[address].as_ref().map(|account| account.code_hash))
    }

    /// Delegation target, if the account is an EIP-7702 pointer.
    pub fn delegation(&mut self, address: &Address) -> Result<Option<Address>, Error> {
        self.ensure_cached(address)?;
        Ok(self.cache[address]
            .as_ref()
            .and_then(|account| account.delegation))
    }

    /// Account code, loading it on first use.
    pub fn code(&mut self, address: &Address) -> Result<Option<Arc<Bytes>>, Error> {
        self.ensure_cached(address)?;
        let (code_hash, cached) = match self.cache[address].as_ref() {
            None => return Ok(None),
            Some(account) => {
                if !account.has_code() {
                    return Ok(None);
                }
                (account.code_hash, account.code.clone())
            }
        };
        if let Some(code) = cached {
            return Ok(Some(code));
        }
        let loaded = self.reader.code(&code_hash)?.map(Arc::new);
        if let Some(ref code) = loaded {
            self.account_mut(address).code = Some(code.clone());
        }
        Ok(loaded)
    }

    /// Storage slot value, zero when unset.
    pub fn storage_at(&mut self, address: &Address, slot: &H256) -> Result<H256, Error> {
        self.ensure_cached(address)?;
        let (incarnation, cached) = match self.cache[address].as_ref() {
            None => return Ok(H256::zero()),
            Some(account) => (account.incarnation, account.cached_storage_at(slot)),
        };
        if let Some(value) = cached {
            return Ok(value);
        }
        let loaded = self
            .reader
            .storage(&storage_key(address, incarnation, slot))?
            .unwrap_or_else(H256::zero);
        self.account_mut(address)
            .original_storage
            .insert(*slot, loaded);
        Ok(loaded)
    }

    /// Write a storage slot.
    pub fn set_storage(&mut self, address: &Address, slot: H256, value: H256) -> Result<(), Error> {
        self.ensure_cached(address)?;
        if self.cache[address].is_none() {
            self.create_account(address)?;
        }
        let prior = self.cache[address]
            .as_ref()
            .expect("created in the branch above; qed")
            .storage_changes
            .get(&slot)
            .copied();
        self.note(JournalEntry::StorageChange {
            address: *address,
            key: slot,
            prior,
        });
        self.account_mut(address).storage_changes.insert(slot, value);
        Ok(())
    }

    /// Transient storage slot (EIP-1153), zero when unset.
    pub fn transient_storage_at(&self, address: &Address, slot: &H256) -> H256 {
        self.transient
            .get(&(*address, *slot))
            .copied()
            .unwrap_or_else(H256::zero)
    }

    /// Write a transient storage slot (EIP-1153).
    pub fn set_transient_storage(&mut self, address: &Address, slot: H256, value: H256) {
        let prior = self.transient_storage_at(address, &slot);
        self.note(JournalEntry::TransientStorageChange {
            address: *address,
            key: slot,
            prior,
        });
        self.transient.insert((*address, slot), value);
    }

    // Create an absent account with defaults, journalling the creation.
    fn create_account(&mut self, address: &Address) -> Result<(), Error> {
        self.ensure_cached(address)?;
        debug_assert!(self.cache[address].is_none());
        self.note(JournalEntry::AccountCreated { address: *address });
        self.cache
            .insert(*address, Some(Account::new_basic(U256::zero(), 0)));
        Ok(())
    }

    /// Install a fresh contract account, bumping the incarnation when one
    /// existed before.
    pub fn new_contract(&mut self, address: &Address, balance: U256, nonce: u64) -> Result<(), Error> {
        self.ensure_cached(address)?;
        let prior = self.cache[address].clone();
        match prior {
            Some(prior) => {
                let incarnation = prior.incarnation + 1;
                self.note(JournalEntry::AccountReset {
                    address: *address,
                    prior: Box::new(prior),
                });
                let mut fresh = Account::new_basic(balance, nonce);
                fresh.incarnation = incarnation;
                self.cache.insert(*address, Some(fresh));
            }
            None => {
                self.note(JournalEntry::AccountCreated { address: *address });
                self.cache
                    .insert(*address, Some(Account::new_basic(balance, nonce)));
            }
        }
        Ok(())
    }

    /// Add to balance as a spend counterpart (transfers).
    pub fn add_balance(&mut self, address: &Address, amount: U256) -> Result<(), Error> {
        self.ensure_cached(address)?;
        if self.cache[address].is_none() {
            self.create_account(address)?;
        }
        let prior = self.account_mut(address).balance;
        self.note(JournalEntry::BalanceChange {
            address: *address,
            prior,
        });
        self.account_mut(address).balance = prior.saturating_add(amount);
        Ok(())
    }

    /// Add to balance outside transaction accounting (block rewards,
    /// withdrawals).
    pub fn balance_increase(&mut self, address: &Address, amount: U256) -> Result<(), Error> {
        self.ensure_cached(address)?;
        if self.cache[address].is_none() {
            self.create_account(address)?;
        }
        let prior = self.account_mut(address).balance;
        self.note(JournalEntry::BalanceIncrease {
            address: *address,
            prior,
        });
        self.account_mut(address).balance = prior.saturating_add(amount);
        Ok(())
    }

    /// Subtract from balance, saturating at zero. Funds were verified by
    /// the caller for real transactions; virtual calls run unfunded.
    pub fn sub_balance(&mut self, address: &Address, amount: U256) -> Result<(), Error> {
        self.ensure_cached(address)?;
        if self.cache[address].is_none() {
            self.create_account(address)?;
        }
        let prior = self.account_mut(address).balance;
        self.note(JournalEntry::BalanceChange {
            address: *address,
            prior,
        });
        self.account_mut(address).balance = prior.saturating_sub(amount);
        Ok(())
    }

    /// Bump the account nonce.
    pub fn inc_nonce(&mut self, address: &Address) -> Result<(), Error> {
        self.ensure_cached(address)?;
        if self.cache[address].is_none() {
            self.create_account(address)?;
        }
        let prior = self.account_mut(address).nonce;
        self.note(JournalEntry::NonceChange {
            address: *address,
            prior,
        });
        self.account_mut(address).nonce = prior + 1;
        Ok(())
    }

    /// Install code on an account.
    pub fn set_code(&mut self, address: &Address, code: Bytes) -> Result<(), Error> {
        self.ensure_cached(address)?;
        if self.cache[address].is_none() {
            self.create_account(address)?;
        }
        let account = self.cache[address]
            .as_ref()
            .expect("created in the branch above; qed");
        self.note(JournalEntry::CodeChange {
            address: *address,
            prior_code_hash: account.code_hash,
            prior_code: account.code.clone(),
            prior_code_dirty: account.code_dirty,
            prior_delegation: account.delegation,
        });
        self.account_mut(address).set_code(code);
        Ok(())
    }

    /// Set or clear the EIP-7702 delegation designation.
    pub fn set_delegation(
        &mut self,
        address: &Address,
        target: Option<Address>,
    ) -> Result<(), Error> {
        self.ensure_cached(address)?;
        if self.cache[address].is_none() {
            self.create_account(address)?;
        }
        let account = self.cache[address]
            .as_ref()
            .expect("created in the branch above; qed");
        self.note(JournalEntry::CodeChange {
            address: *address,
            prior_code_hash: account.code_hash,
            prior_code: account.code.clone(),
            prior_code_dirty: account.code_dirty,
            prior_delegation: account.delegation,
        });
        self.account_mut(address).delegation = target;
        Ok(())
    }

    /// Destroy an account. The beneficiary credit happens separately.
    pub fn self_destruct(&mut self, address: &Address) -> Result<(), Error> {
        self.ensure_cached(address)?;
        if let Some(prior) = self.cache[address].clone() {
            self.note(JournalEntry::SelfDestructed {
                address: *address,
                prior: Box::new(prior),
            });
            self.cache.insert(*address, None);
        }
        Ok(())
    }

    /// Mark an account touched (EIP-161 cleanup candidate).
    pub fn touch(&mut self, address: &Address) {
        if self.touched.insert(*address) {
            self.note(JournalEntry::Touched { address: *address });
        }
    }

    /// Warm an address. Returns whether it was already warm.
    pub fn access_address(&mut self, address: &Address) -> bool {
        if self.access_addresses.contains(address) {
            return true;
        }
        self.note(JournalEntry::AccessListAddress { address: *address });
        self.access_addresses.insert(*address);
        false
    }

    /// Warm a storage slot. Returns whether it was already warm.
    pub fn access_slot(&mut self, address: &Address, slot: &H256) -> bool {
        if self.access_slots.contains(&(*address, *slot)) {
            return true;
        }
        self.note(JournalEntry::AccessListSlot {
            address: *address,
            key: *slot,
        });
        self.access_slots.insert((*address, *slot));
        false
    }

    /// Append a log.
    pub fn add_log(&mut self, entry: LogEntry) {
        self.note(JournalEntry::LogAppend);
        self.logs.push(entry);
    }

    /// Logs collected so far in this transaction.
    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    /// Adjust the refund counter.
    pub fn add_refund(&mut self, delta: i64) {
        self.note(JournalEntry::RefundChange { prior: self.refund });
        self.refund += delta;
    }

    /// Current refund counter.
    pub fn refund(&self) -> i64 {
        self.refund
    }

    /// Dirty addresses with pending mutations.
    pub fn dirty_addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<_> = self.dirty.keys().copied().collect();
        addresses.sort();
        addresses
    }

    /// Reset the per-transaction surfaces and pre-warm the access list per
    /// EIP-2929/EIP-2930.
    pub fn begin_transaction(
        &mut self,
        sender: &Address,
        recipient: Option<&Address>,
        precompiles: &[Address],
        access_list: Option<&common_types::transaction::AccessList>,
    ) {
        debug_assert!(self.journal.is_empty(), "previous transaction not settled");
        self.access_addresses.clear();
        self.access_slots.clear();
        self.transient.clear();
        self.logs.clear();
        self.refund = 0;
        self.touched.clear();

        self.access_addresses.insert(*sender);
        if let Some(recipient) = recipient {
            self.access_addresses.insert(*recipient);
        }
        self.access_addresses.extend(precompiles.iter().copied());
        if let Some(list) = access_list {
            for item in list {
                self.access_addresses.insert(item.address);
                for key in &item.storage_keys {
                    self.access_slots.insert((item.address, *key));
                }
            }
        }
    }

    /// Drain the per-transaction log buffer.
    pub fn take_logs(&mut self) -> Vec<LogEntry> {
        std::mem::take(&mut self.logs)
    }

    /// Flush every dirty account into the temporal store at `tx_number`
    /// and clear the journal. The in-memory cache survives so later
    /// transactions of the same block stay warm.
    pub fn commit(
        &mut self,
        tx: &mut dyn WriteTransaction,
        domains: &Domains,
        tx_number: u64,
    ) -> Result<(), Error> {
        // EIP-161: touched accounts left empty are removed
        let touched: Vec<_> = self.touched.drain().collect();
        for address in touched {
            let is_empty = self
                .cache
                .get(&address)
                .and_then(|entry| entry.as_ref())
                .map_or(false, |account| account.is_empty());
            if is_empty {
                self.cache.insert(address, None);
            }
        }

        for address in self.dirty_addresses() {
            let flush = match self.cache.get_mut(&address).and_then(|e| e.as_mut()) {
                Some(account) => {
                    let code = if account.code_dirty {
                        account.code_dirty = false;
                        Some((
                            account.code_hash,
                            account
                                .code
                                .clone()
                                .expect("code_dirty is only set together with code; qed"),
                        ))
                    } else {
                        None
                    };
                    let changes: Vec<(H256, H256)> =
                        account.storage_changes.drain().collect();
                    for (slot, value) in &changes {
                        account.original_storage.insert(*slot, *value);
                    }
                    Some((account.to_basic(), code, changes))
                }
                None => None,
            };
            match flush {
                Some((basic, code, changes)) => {
                    if let Some((code_hash, code)) = code {
                        tx.put(tables::CODE, code_hash.as_bytes(), &code)?;
                    }
                    for (slot, value) in changes {
                        let key = storage_key(&address, basic.incarnation, &slot);
                        if value.is_zero() {
                            domains.storage.delete(tx, &key, tx_number)?;
                        } else {
                            domains.storage.put(tx, &key, value.as_bytes(), tx_number)?;
                        }
                    }
                    domains
                        .accounts
                        .put(tx, address.as_bytes(), &rlp::encode(&basic), tx_number)?;
                }
                None => {
                    domains.accounts.delete(tx, address.as_bytes(), tx_number)?;
                }
            }
        }
        self.dirty.clear();
        self.journal.clear();
        self.access_addresses.clear();
        self.access_slots.clear();
        self.transient.clear();
        self.logs.clear();
        self.refund = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyReader;

    impl StateReader for EmptyReader {
        fn account(&mut self, _: &Address) -> Result<Option<BasicAccount>, Error> {
            Ok(None)
        }
        fn storage(&mut self, _: &[u8]) -> Result<Option<H256>, Error> {
            Ok(None)
        }
        fn code(&mut self, _: &H256) -> Result<Option<Bytes>, Error> {
            Ok(None)
        }
    }

    fn fresh() -> State {
        State::new(Box::new(EmptyReader))
    }

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    #[test]
    fn nested_snapshots_revert_in_layers() {
        let mut state = fresh();
        let a = addr(1);

        let s0 = state.snapshot();
        for _ in 0..5 {
            state.inc_nonce(&a).unwrap();
        }
        state.add_balance(&a, 100.into()).unwrap();

        let s1 = state.snapshot();
        state
            .set_storage(&a, H256::from_low_u64_be(1), H256::from_low_u64_be(7))
            .unwrap();
        assert_eq!(
            state.storage_at(&a, &H256::from_low_u64_be(1)).unwrap(),
            H256::from_low_u64_be(7)
        );

        state.revert_to_snapshot(s1);
        assert_eq!(
            state.storage_at(&a, &H256::from_low_u64_be(1)).unwrap(),
            H256::zero()
        );
        assert_eq!(state.nonce(&a).unwrap(), 5);
        assert_eq!(state.balance(&a).unwrap(), 100.into());

        state.revert_to_snapshot(s0);
        assert_eq!(state.nonce(&a).unwrap(), 0);
        assert_eq!(state.balance(&a).unwrap(), U256::zero());
        assert!(!state.exists(&a).unwrap());
    }

    #[test]
    fn full_revert_leaves_no_dirty_addresses() {
        let mut state = fresh();
        let s0 = state.snapshot();
        state.add_balance(&addr(1), 5.into()).unwrap();
        state.inc_nonce(&addr(2)).unwrap();
        state
            .set_storage(&addr(3), H256::from_low_u64_be(1), H256::from_low_u64_be(2))
            .unwrap();
        state.set_code(&addr(4), vec![0x60]).unwrap();
        assert_eq!(state.dirty_addresses().len(), 4);
        state.revert_to_snapshot(s0);
        assert!(state.dirty_addresses().is_empty());
    }

    #[test]
    fn refund_and_logs_do_not_dirty() {
        let mut state = fresh();
        state.add_refund(4800);
        state.add_log(LogEntry {
            address: addr(1),
            topics: vec![],
            data: vec![],
        });
        assert!(state.dirty_addresses().is_empty());
        assert_eq!(state.refund(), 4800);
        assert_eq!(state.logs().len(), 1);
    }

    #[test]
    fn access_list_reverts_with_journal() {
        let mut state = fresh();
        let s = state.snapshot();
        assert!(!state.access_address(&addr(9)));
        assert!(state.access_address(&addr(9)));
        assert!(!state.access_slot(&addr(9), &H256::from_low_u64_be(1)));
        state.revert_to_snapshot(s);
        assert!(!state.access_address(&addr(9)));
    }

    #[test]
    fn transient_storage_reverts() {
        let mut state = fresh();
        let a = addr(1);
        let s = state.snapshot();
        state.set_transient_storage(&a, H256::from_low_u64_be(1), H256::from_low_u64_be(9));
        assert_eq!(
            state.transient_storage_at(&a, &H256::from_low_u64_be(1)),
            H256::from_low_u64_be(9)
        );
        state.revert_to_snapshot(s);
        assert_eq!(
            state.transient_storage_at(&a, &H256::from_low_u64_be(1)),
            H256::zero()
        );
    }

    #[test]
    fn self_destruct_reverts_to_prior_account() {
        let mut state = fresh();
        let a = addr(1);
        state.add_balance(&a, 77.into()).unwrap();
        let s = state.snapshot();
        state.self_destruct(&a).unwrap();
        assert!(!state.exists(&a).unwrap());
        state.revert_to_snapshot(s);
        assert_eq!(state.balance(&a).unwrap(), 77.into());
    }

    #[test]
    fn new_contract_over_existing_bumps_incarnation() {
        let mut state = fresh();
        let a = addr(1);
        state.add_balance(&a, 1.into()).unwrap();
        state.new_contract(&a, 1.into(), 1).unwrap();
        let account = state.cache[&a].as_ref().unwrap();
        assert_eq!(account.incarnation, 2);
    }

    #[test]
    fn commit_flushes_into_domains() {
        use embercore_kv::KeyValueStore;

        let store = embercore_kv::MemoryStore::new();
        let domains = Domains::default();
        let mut state = fresh();
        let a = addr(1);
        state.add_balance(&a, 1000.into()).unwrap();
        state.inc_nonce(&a).unwrap();
        state
            .set_storage(&a, H256::from_low_u64_be(5), H256::from_low_u64_be(6))
            .unwrap();

        let mut tx = store.begin_write().unwrap();
        state.commit(tx.as_mut(), &domains, 42).unwrap();
        tx.commit().unwrap();

        let tx = store.begin_read().unwrap();
        let raw = domains
            .accounts
            .get_latest(tx.as_ref(), a.as_bytes())
            .unwrap()
            .expect("account flushed");
        let basic: BasicAccount = rlp::decode(&raw).unwrap();
        assert_eq!(basic.balance, 1000.into());
        assert_eq!(basic.nonce, 1);

        let slot_key = storage_key(&a, basic.incarnation, &H256::from_low_u64_be(5));
        let raw = domains
            .storage
            .get_latest(tx.as_ref(), &slot_key)
            .unwrap()
            .expect("slot flushed");
        assert_eq!(raw, H256::from_low_u64_be(6).as_bytes().to_vec());
    }

    #[test]
    fn touched_empty_accounts_are_removed_on_commit() {
        use embercore_kv::KeyValueStore;

        let store = embercore_kv::MemoryStore::new();
        let domains = Domains::default();
        let mut state = fresh();
        let a = addr(1);
        // zero-value transfer leaves the account empty but touched+dirty
        state.add_balance(&a, U256::zero()).unwrap();
        state.touch(&a);

        let mut tx = store.begin_write().unwrap();
        state.commit(tx.as_mut(), &domains, 1).unwrap();
        tx.commit().unwrap();

        let tx = store.begin_read().unwrap();
        assert!(domains
            .accounts
            .get_latest(tx.as_ref(), a.as_bytes())
            .unwrap()
            .is_none());
    }
}
