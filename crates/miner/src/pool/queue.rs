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

//! The queue itself: per-sender pending and queued buckets behind one
//! mutex, with replacement, promotion, eviction and expiry.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::Duration,
};

use common_types::transaction::{self, UnverifiedTransaction};
use ethereum_types::{Address, H256, U256};
use log::{debug, trace};
use parking_lot::Mutex;

use super::{
    client::Client,
    scoring::{self, Choice},
    verifier, Options, VerifiedTransaction,
};

/// Light-weight pool census.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Status {
    /// Transactions executable right away.
    pub pending: usize,
    /// Transactions waiting for a nonce gap to close.
    pub queued: usize,
}

#[derive(Default)]
struct SenderQueue {
    // consecutive run starting at the account nonce
    pending: BTreeMap<u64, Arc<VerifiedTransaction>>,
    // future nonces
    queued: BTreeMap<u64, Arc<VerifiedTransaction>>,
}

impl SenderQueue {
    fn len(&self) -> usize {
        self.pending.len() + self.queued.len()
    }

    fn get(&self, nonce: u64) -> Option<&Arc<VerifiedTransaction>> {
        self.pending.get(&nonce).or_else(|| self.queued.get(&nonce))
    }

    fn remove(&mut self, nonce: u64) -> Option<Arc<VerifiedTransaction>> {
        self.pending
            .remove(&nonce)
            .or_else(|| self.queued.remove(&nonce))
    }

    // Rebucket against the latest account nonce: drop everything mined,
    // promote the consecutive run, demote the rest.
    fn rebucket(&mut self, account_nonce: u64) -> Vec<Arc<VerifiedTransaction>> {
        let mut all: BTreeMap<u64, Arc<VerifiedTransaction>> = std::mem::take(&mut self.pending);
        all.append(&mut self.queued);
        let mut dropped = Vec::new();
        let mut expected = account_nonce;
        for (nonce, tx) in all {
            if nonce < account_nonce {
                dropped.push(tx);
            } else if nonce == expected {
                self.pending.insert(nonce, tx);
                expected += 1;
            } else {
                self.queued.insert(nonce, tx);
            }
        }
        dropped
    }
}

/// The transaction queue.
pub struct TransactionQueue {
    options: Options,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    by_hash: HashMap<H256, Arc<VerifiedTransaction>>,
    senders: HashMap<Address, SenderQueue>,
}

impl Inner {
    fn total(&self) -> usize {
        self.by_hash.len()
    }

    fn remove_tx(&mut self, tx: &Arc<VerifiedTransaction>) {
        self.by_hash.remove(&tx.hash());
        let empty = if let Some(sender) = self.senders.get_mut(&tx.sender()) {
            sender.remove(tx.nonce());
            sender.len() == 0
        } else {
            false
        };
        if empty {
            self.senders.remove(&tx.sender());
        }
    }

    // globally cheapest resident transaction
    fn cheapest(&self, base_fee: Option<U256>) -> Option<Arc<VerifiedTransaction>> {
        self.by_hash
            .values()
            .min_by_key(|tx| tx.effective_gas_price(base_fee))
            .cloned()
    }
}

impl TransactionQueue {
    /// New queue with the given limits.
    pub fn new(options: Options) -> Self {
        TransactionQueue {
            options,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Verify and admit one transaction. Returns its hash.
    pub fn import(
        &self,
        client: &dyn Client,
        tx: UnverifiedTransaction,
    ) -> Result<H256, transaction::Error> {
        let hash = tx.hash();
        {
            let inner = self.inner.lock();
            if inner.by_hash.contains_key(&hash) {
                return Err(transaction::Error::AlreadyImported);
            }
        }

        let signed = verifier::verify(client, &self.options, tx)?;
        let verified = VerifiedTransaction::new(signed);
        let sender = verified.sender();
        let nonce = verified.nonce();
        let account = client.account_details(&sender);
        let account_nonce = account.nonce.low_u64();
        let base_fee = client.base_fee();

        let mut inner = self.inner.lock();
        let resident = inner
            .senders
            .get(&sender)
            .and_then(|queue| queue.get(nonce))
            .cloned();
        if let Some(old) = resident {
            // same sender and nonce: a replacement race
            match scoring::choose(&old, &verified, base_fee) {
                Choice::RejectNew => return Err(transaction::Error::Underpriced),
                Choice::ReplaceOld => {
                    trace!(target: "txpool", "replacing {:?} with {:?}", old.hash(), hash);
                    inner.remove_tx(&old);
                }
            }
        } else {
            let sender_count = inner.senders.get(&sender).map_or(0, SenderQueue::len);
            if sender_count >= self.options.max_per_sender {
                return Err(transaction::Error::TooManyFromSender {
                    limit: self.options.max_per_sender,
                });
            }
            if nonce > account_nonce + self.options.max_per_sender as u64 {
                return Err(transaction::Error::NonceTooHigh {
                    limit: (account_nonce + self.options.max_per_sender as u64).into(),
                    got: nonce.into(),
                });
            }
        }

        if inner.total() >= self.options.max_count {
            let cheapest = inner
                .cheapest(base_fee)
                .expect("pool at capacity is non-empty; qed");
            if cheapest.effective_gas_price(base_fee) >= verified.effective_gas_price(base_fee) {
                return Err(transaction::Error::PoolFull);
            }
            debug!(target: "txpool", "evicting {:?} for {:?}", cheapest.hash(), hash);
            inner.remove_tx(&cheapest);
        }

        inner.by_hash.insert(hash, verified.clone());
        let queue = inner.senders.entry(sender).or_default();
        queue.queued.insert(nonce, verified);
        queue.rebucket(account_nonce);
        Ok(hash)
    }

    /// Re-bucket every sender after a new block: drop mined transactions,
    /// promote the ones whose nonce gap closed.
    pub fn cull(&self, client: &dyn Client) {
        let mut inner = self.inner.lock();
        let senders: Vec<Address> = inner.senders.keys().copied().collect();
        for sender in senders {
            let account_nonce = client.account_details(&sender).nonce.low_u64();
            let dropped = inner
                .senders
                .get_mut(&sender)
                .expect("sender key collected above; qed")
                .rebucket(account_nonce);
            for tx in dropped {
                trace!(target: "txpool", "dropping mined {:?}", tx.hash());
                inner.by_hash.remove(&tx.hash());
            }
            if inner.senders.get(&sender).map_or(false, |q| q.len() == 0) {
                inner.senders.remove(&sender);
            }
        }
    }

    /// Prune transactions older than the configured lifetime.
    pub fn evict_stale(&self) {
        let lifetime = Duration::from_secs(self.options.max_age_secs);
        let mut inner = self.inner.lock();
        let stale: Vec<Arc<VerifiedTransaction>> = inner
            .by_hash
            .values()
            .filter(|tx| tx.imported_at.elapsed() > lifetime)
            .cloned()
            .collect();
        for tx in stale {
            debug!(target: "txpool", "expiring {:?}", tx.hash());
            inner.remove_tx(&tx);
        }
    }

    /// Executable transactions, senders ordered by the price of their head
    /// transaction, nonces in order within a sender.
    pub fn pending(&self, base_fee: Option<U256>, max: usize) -> Vec<Arc<VerifiedTransaction>> {
        let inner = self.inner.lock();
        let mut groups: Vec<Vec<Arc<VerifiedTransaction>>> = inner
            .senders
            .values()
            .filter(|queue| !queue.pending.is_empty())
            .map(|queue| queue.pending.values().cloned().collect())
            .collect();
        groups.sort_by(|a, b| {
            let price_a = a[0].effective_gas_price(base_fee);
            let price_b = b[0].effective_gas_price(base_fee);
            price_b.cmp(&price_a)
        });
        groups.into_iter().flatten().take(max).collect()
    }

    /// Find a resident transaction by hash.
    pub fn find(&self, hash: &H256) -> Option<Arc<VerifiedTransaction>> {
        self.inner.lock().by_hash.get(hash).cloned()
    }

    /// Pool census.
    pub fn status(&self) -> Status {
        let inner = self.inner.lock();
        let pending = inner
            .senders
            .values()
            .map(|queue| queue.pending.len())
            .sum();
        let queued = inner.senders.values().map(|queue| queue.queued.len()).sum();
        Status { pending, queued }
    }
}
