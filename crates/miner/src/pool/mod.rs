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

//! Transaction Pool
//!
//! Incoming transactions are verified (signature, nonce, gas, funds),
//! bucketed per sender into pending (executable now) and queued (future
//! nonce), replaced only with a sufficient price bump, and evicted when the
//! pool overflows or entries outlive their welcome.

pub mod client;
pub mod queue;
pub mod scoring;
pub mod verifier;

#[cfg(test)]
mod tests;

use std::{sync::Arc, time::Instant};

use common_types::transaction::SignedTransaction;
use ethereum_types::{Address, H256, U256};

/// Pool configuration.
#[derive(Debug, Clone)]
pub struct Options {
    /// Global cap on resident transactions.
    pub max_count: usize,
    /// Cap on transactions per sender.
    pub max_per_sender: usize,
    /// Lowest admissible gas price.
    pub minimal_gas_price: U256,
    /// Seconds a transaction may stay resident before pruning.
    pub max_age_secs: u64,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_count: 8_192,
            max_per_sender: 16,
            minimal_gas_price: 1.into(),
            max_age_secs: 3 * 60 * 60,
        }
    }
}

/// A transaction resident in the pool.
#[derive(Debug)]
pub struct VerifiedTransaction {
    /// The verified transaction.
    pub signed: SignedTransaction,
    /// When it entered the pool.
    pub imported_at: Instant,
}

impl VerifiedTransaction {
    /// Pool wrapper around a verified transaction.
    pub fn new(signed: SignedTransaction) -> Arc<Self> {
        Arc::new(VerifiedTransaction {
            signed,
            imported_at: Instant::now(),
        })
    }

    /// Transaction hash.
    pub fn hash(&self) -> H256 {
        self.signed.hash()
    }

    /// Transaction sender.
    pub fn sender(&self) -> Address {
        self.signed.sender()
    }

    /// Transaction nonce.
    pub fn nonce(&self) -> u64 {
        self.signed.unsigned.tx().nonce.low_u64()
    }

    /// Price per gas under the given base fee.
    pub fn effective_gas_price(&self, base_fee: Option<U256>) -> U256 {
        self.signed.unsigned.effective_gas_price(base_fee)
    }
}
