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

//! Transaction scoring and replacement.
//!
//! Transactions from the same sender with the same nonce compete: the
//! newcomer wins only with a price bump big enough to make reshuffling the
//! queue worth the miner's while.

use ethereum_types::U256;

use super::VerifiedTransaction;

/// Required price bump for a same-nonce replacement, in percent of the
/// resident transaction's price.
pub const REPLACEMENT_BUMP_PERCENT: u64 = 110;

/// Replacement decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Keep the resident transaction, reject the newcomer.
    RejectNew,
    /// Drop the resident transaction in favour of the newcomer.
    ReplaceOld,
}

/// Decide a same-sender same-nonce conflict.
pub fn choose(
    old: &VerifiedTransaction,
    new: &VerifiedTransaction,
    base_fee: Option<U256>,
) -> Choice {
    let old_price = old.effective_gas_price(base_fee);
    let new_price = new.effective_gas_price(base_fee);
    let required = old_price
        .saturating_mul(REPLACEMENT_BUMP_PERCENT.into())
        / U256::from(100);
    if new_price >= required {
        Choice::ReplaceOld
    } else {
        Choice::RejectNew
    }
}
