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

//! Poll-based filter bookkeeping for `eth_newFilter` and friends.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use common_types::{filter::Filter as EthFilter, ids::BlockId, BlockNumber};
use embercore::Client;
use ethereum_types::{H256, U256};
use parking_lot::Mutex;

use crate::v1::types::FilterChanges;

enum PollFilter {
    Block {
        last_block: BlockNumber,
    },
    Logs {
        last_block: BlockNumber,
        filter: EthFilter,
    },
}

/// Installed filters, polled via `eth_getFilterChanges`.
pub struct FilterManager {
    client: Arc<Client>,
    filters: Mutex<HashMap<u64, PollFilter>>,
    next_id: AtomicU64,
}

impl FilterManager {
    /// Manager over the read client.
    pub fn new(client: Arc<Client>) -> Self {
        FilterManager {
            client,
            filters: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn install(&self, filter: PollFilter) -> U256 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.filters.lock().insert(id, filter);
        id.into()
    }

    /// Install a log filter.
    pub fn new_filter(&self, filter: EthFilter) -> U256 {
        let last_block = self.client.best_block_number();
        self.install(PollFilter::Logs { last_block, filter })
    }

    /// Install a block filter.
    pub fn new_block_filter(&self) -> U256 {
        let last_block = self.client.best_block_number();
        self.install(PollFilter::Block { last_block })
    }

    /// Drop a filter; true when it existed.
    pub fn uninstall(&self, id: U256) -> bool {
        self.filters.lock().remove(&id.low_u64()).is_some()
    }

    /// Everything that happened since the last poll of this filter.
    pub fn poll(&self, id: U256) -> Option<FilterChanges> {
        let best = self.client.best_block_number();
        let mut filters = self.filters.lock();
        match filters.get_mut(&id.low_u64())? {
            PollFilter::Block { last_block } => {
                let hashes: Vec<H256> = (*last_block + 1..=best)
                    .filter_map(|number| self.client.block_hash(number))
                    .collect();
                *last_block = best;
                Some(FilterChanges::Hashes(hashes))
            }
            PollFilter::Logs { last_block, filter } => {
                let mut window = filter.clone();
                window.from_block = BlockId::Number((*last_block + 1).min(best));
                window.to_block = BlockId::Number(best);
                let logs = if best > *last_block {
                    self.client
                        .logs(&window)
                        .into_iter()
                        .map(Into::into)
                        .collect()
                } else {
                    Vec::new()
                };
                *last_block = best;
                Some(FilterChanges::Logs(logs))
            }
        }
    }
}
