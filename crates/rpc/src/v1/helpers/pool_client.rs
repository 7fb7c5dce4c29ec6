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

//! Adapter giving the transaction pool its view of the chain.

use std::sync::Arc;

use common_types::ids::BlockId;
use embercore::Client;
use embercore_miner::{AccountDetails, Client as PoolClient};
use ethereum_types::{Address, U256};

/// Pool chain view over the read client.
pub struct PoolClientAdapter {
    client: Arc<Client>,
}

impl PoolClientAdapter {
    /// Wrap a client.
    pub fn new(client: Arc<Client>) -> Self {
        PoolClientAdapter { client }
    }
}

impl PoolClient for PoolClientAdapter {
    fn account_details(&self, address: &Address) -> AccountDetails {
        AccountDetails {
            nonce: self
                .client
                .nonce(address, BlockId::Latest)
                .unwrap_or_default(),
            balance: self
                .client
                .balance(address, BlockId::Latest)
                .unwrap_or_default(),
        }
    }

    fn block_gas_limit(&self) -> U256 {
        self.client
            .block_header(BlockId::Latest)
            .map(|header| header.gas_limit)
            .unwrap_or_else(|| 30_000_000.into())
    }

    fn base_fee(&self) -> Option<U256> {
        let head = self.client.block_header(BlockId::Latest)?;
        self.client.spec().params.next_base_fee(&head)
    }
}
