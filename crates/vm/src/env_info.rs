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

//! Environment information for transaction execution.

use ethereum_types::{Address, H256, U256};

/// Information concerning the execution environment for a message-call or
/// contract-creation transaction.
#[derive(Debug, Clone, Default)]
pub struct EnvInfo {
    /// The block number.
    pub number: u64,
    /// The fee recipient of the block.
    pub author: Address,
    /// The block timestamp.
    pub timestamp: u64,
    /// The block difficulty, or PREVRANDAO post-merge.
    pub difficulty: U256,
    /// PREVRANDAO as carried in the mix-digest field.
    pub prevrandao: H256,
    /// The block gas limit.
    pub gas_limit: U256,
    /// The base fee of the block, London onwards.
    pub base_fee: Option<U256>,
    /// The chain id.
    pub chain_id: u64,
}
