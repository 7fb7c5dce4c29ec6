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

//! `eth_feeHistory` response.

use ethereum_types::U256;

/// Fee history over a block range.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EthFeeHistory {
    /// First block of the range.
    pub oldest_block: U256,
    /// Base fee per block, plus the next block's projection.
    pub base_fee_per_gas: Vec<U256>,
    /// Ratio of gas used to gas limit per block.
    pub gas_used_ratio: Vec<f64>,
    /// Requested effective-tip percentiles per block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<Vec<Vec<U256>>>,
}
