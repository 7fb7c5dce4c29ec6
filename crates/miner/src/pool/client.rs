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

//! What the pool needs to know about the chain.

use ethereum_types::{Address, U256};

/// Account state the verifier checks against.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountDetails {
    /// Latest nonce.
    pub nonce: U256,
    /// Latest balance.
    pub balance: U256,
}

/// Chain view the pool consults during admission and promotion.
pub trait Client: Send + Sync {
    /// Latest account state.
    fn account_details(&self, address: &Address) -> AccountDetails;

    /// Gas limit of the next block.
    fn block_gas_limit(&self) -> U256;

    /// Base fee of the next block, when EIP-1559 is active.
    fn base_fee(&self) -> Option<U256>;
}
