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

//! Blockchain filter

use crate::{ids::BlockId, log_entry::LogEntry};
use ethereum_types::{Address, Bloom, BloomInput, H256};

/// Blockchain log filter data.
#[derive(Debug, PartialEq, Clone)]
pub struct Filter {
    /// Blockchain will be searched from this block.
    pub from_block: BlockId,
    /// Till this block.
    pub to_block: BlockId,
    /// Search addresses.
    ///
    /// If None, match all.
    /// If specified, log must be produced by one of these addresses.
    pub address: Option<Vec<Address>>,
    /// Search topics.
    ///
    /// If None, match all.
    /// If specified, log must contain one of these topics at the given
    /// position.
    pub topics: Vec<Option<Vec<H256>>>,
    /// Logs limit
    ///
    /// If None, return all logs
    /// If specified, should only return *last* `n` logs.
    pub limit: Option<usize>,
}

impl Default for Filter {
    fn default() -> Self {
        Filter {
            from_block: BlockId::Latest,
            to_block: BlockId::Latest,
            address: None,
            topics: vec![None, None, None, None],
            limit: None,
        }
    }
}

impl Filter {
    /// Quick pre-check against a block bloom: false means the block cannot
    /// contain a matching log; true means it might.
    pub fn bloom_match(&self, bloom: &Bloom) -> bool {
        let address_ok = match self.address {
            Some(ref addresses) if !addresses.is_empty() => addresses
                .iter()
                .any(|address| bloom.contains_input(BloomInput::Raw(address.as_bytes()))),
            _ => true,
        };
        let topics_ok = self.topics.iter().all(|topic| match topic {
            Some(candidates) if !candidates.is_empty() => candidates
                .iter()
                .any(|topic| bloom.contains_input(BloomInput::Raw(topic.as_bytes()))),
            _ => true,
        });
        address_ok && topics_ok
    }

    /// Returns true if given log entry matches filter.
    pub fn matches(&self, log: &LogEntry) -> bool {
        let matches = match self.address {
            Some(ref addresses) if !addresses.is_empty() => {
                addresses.iter().any(|address| &log.address == address)
            }
            _ => true,
        };
        matches
            && self
                .topics
                .iter()
                .enumerate()
                .all(|(i, topic)| match topic {
                    Some(candidates) if !candidates.is_empty() => log
                        .topics
                        .get(i)
                        .map_or(false, |t| candidates.iter().any(|candidate| candidate == t)),
                    _ => true,
                })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(address: u64, topics: Vec<u64>) -> LogEntry {
        LogEntry {
            address: Address::from_low_u64_be(address),
            topics: topics.into_iter().map(H256::from_low_u64_be).collect(),
            data: vec![],
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = Filter::default();
        assert!(filter.matches(&log(1, vec![2, 3])));
        assert!(filter.matches(&log(9, vec![])));
    }

    #[test]
    fn address_filter() {
        let filter = Filter {
            address: Some(vec![Address::from_low_u64_be(1)]),
            ..Default::default()
        };
        assert!(filter.matches(&log(1, vec![])));
        assert!(!filter.matches(&log(2, vec![])));
    }

    #[test]
    fn positional_topic_filter() {
        let filter = Filter {
            topics: vec![
                Some(vec![H256::from_low_u64_be(5)]),
                None,
                None,
                None,
            ],
            ..Default::default()
        };
        assert!(filter.matches(&log(1, vec![5, 9])));
        assert!(!filter.matches(&log(1, vec![9, 5])));
        assert!(!filter.matches(&log(1, vec![])));
    }

    #[test]
    fn bloom_match_is_conservative() {
        let entry = log(1, vec![5]);
        let filter = Filter {
            address: Some(vec![Address::from_low_u64_be(1)]),
            topics: vec![Some(vec![H256::from_low_u64_be(5)]), None, None, None],
            ..Default::default()
        };
        assert!(filter.bloom_match(&entry.bloom()));
    }
}
