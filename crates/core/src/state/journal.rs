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

//! The journal: one entry per reversible mutation, appended before the
//! mutation is applied and popped in LIFO order on revert. Each entry
//! carries exactly the prior state needed to undo itself.

use std::sync::Arc;

use ethereum_types::{Address, H256, U256};
use parity_bytes::Bytes;

use super::account::Account;

/// A single reversible mutation.
#[derive(Debug, Clone)]
pub enum JournalEntry {
    /// A previously absent account was created.
    AccountCreated {
        /// Created account.
        address: Address,
    },
    /// An existing account was replaced wholesale (re-creation over an
    /// empty shell, incarnation bump).
    AccountReset {
        /// Reset account.
        address: Address,
        /// Overlay state immediately before the reset.
        prior: Box<Account>,
    },
    /// An account self-destructed.
    SelfDestructed {
        /// Destroyed account.
        address: Address,
        /// Overlay state immediately before destruction.
        prior: Box<Account>,
    },
    /// Balance changed through spending.
    BalanceChange {
        /// Affected account.
        address: Address,
        /// Balance before the change.
        prior: U256,
    },
    /// Balance grew without a corresponding sender (rewards, withdrawals).
    BalanceIncrease {
        /// Affected account.
        address: Address,
        /// Balance before the change.
        prior: U256,
    },
    /// Nonce changed.
    NonceChange {
        /// Affected account.
        address: Address,
        /// Nonce before the change.
        prior: u64,
    },
    /// One storage slot changed.
    StorageChange {
        /// Affected account.
        address: Address,
        /// Affected slot.
        key: H256,
        /// Pending value before the change, `None` when the slot had no
        /// pending write yet.
        prior: Option<H256>,
    },
    /// Code (or delegation designation) changed.
    CodeChange {
        /// Affected account.
        address: Address,
        /// Code hash before the change.
        prior_code_hash: H256,
        /// Loaded code before the change.
        prior_code: Option<Arc<Bytes>>,
        /// Dirty flag before the change.
        prior_code_dirty: bool,
        /// Delegation before the change.
        prior_delegation: Option<Address>,
    },
    /// Gas refund counter changed.
    RefundChange {
        /// Counter value before the change.
        prior: i64,
    },
    /// A log was appended.
    LogAppend,
    /// An account was touched (EIP-161).
    Touched {
        /// Touched account.
        address: Address,
    },
    /// An address became warm (EIP-2929). Only journalled when it was cold.
    AccessListAddress {
        /// Warmed address.
        address: Address,
    },
    /// A storage slot became warm (EIP-2929). Only journalled when cold.
    AccessListSlot {
        /// Owning address.
        address: Address,
        /// Warmed slot.
        key: H256,
    },
    /// A transient storage slot changed (EIP-1153).
    TransientStorageChange {
        /// Affected account.
        address: Address,
        /// Affected slot.
        key: H256,
        /// Value before the change.
        prior: H256,
    },
}

impl JournalEntry {
    /// The account whose dirty count this entry contributes to, when it
    /// mutates persistent account state. Refunds, logs, access-list warmth
    /// and transient storage do not dirty an account.
    pub fn dirtied_address(&self) -> Option<Address> {
        match *self {
            JournalEntry::AccountCreated { address }
            | JournalEntry::AccountReset { address, .. }
            | JournalEntry::SelfDestructed { address, .. }
            | JournalEntry::BalanceChange { address, .. }
            | JournalEntry::BalanceIncrease { address, .. }
            | JournalEntry::NonceChange { address, .. }
            | JournalEntry::StorageChange { address, .. }
            | JournalEntry::CodeChange { address, .. }
            | JournalEntry::Touched { address } => Some(address),
            JournalEntry::RefundChange { .. }
            | JournalEntry::LogAppend
            | JournalEntry::AccessListAddress { .. }
            | JournalEntry::AccessListSlot { .. }
            | JournalEntry::TransientStorageChange { .. } => None,
        }
    }
}
