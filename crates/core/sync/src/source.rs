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

//! Where blocks come from. The network layer and the Engine API both feed
//! the pipeline through this interface; tests feed it scripted chains.

use common_types::{block::Block, block::BlockBody, header::Header, BlockNumber};
use ethereum_types::H256;
use parking_lot::RwLock;
use std::collections::HashMap;

/// A supplier of headers and bodies for the sync pipeline.
pub trait BlockSource: Send + Sync {
    /// Highest block the source can currently serve.
    fn announced_tip(&self) -> Option<(BlockNumber, H256)>;

    /// Consecutive headers starting at `from`, at most `max` of them.
    fn headers(&self, from: BlockNumber, max: usize) -> Vec<Header>;

    /// Header by hash, when the source knows it.
    fn header_by_hash(&self, hash: &H256) -> Option<Header>;

    /// Body of a block by header hash.
    fn body(&self, hash: &H256) -> Option<BlockBody>;
}

#[derive(Default)]
struct Inner {
    headers: HashMap<BlockNumber, Header>,
    bodies: HashMap<H256, BlockBody>,
    tip: Option<(BlockNumber, H256)>,
}

/// An in-memory block source. The Engine API pushes payloads into it; the
/// tests script whole chains, including replacement chains for reorgs.
#[derive(Default)]
pub struct MemorySource {
    inner: RwLock<Inner>,
}

impl MemorySource {
    /// Empty source.
    pub fn new() -> Self {
        MemorySource::default()
    }

    /// Add one block and advance the tip if it extends past it.
    pub fn insert_block(&self, block: Block) {
        let hash = block.header.hash();
        let number = block.header.number;
        let (header, body) = block.into_parts();
        let mut inner = self.inner.write();
        inner.headers.insert(number, header);
        inner.bodies.insert(hash, body);
        let past_tip = inner.tip.map_or(true, |(tip, _)| number >= tip);
        if past_tip {
            inner.tip = Some((number, hash));
        }
    }

    /// Replace the served chain from `from` onwards, rewinding the tip.
    /// Models a reorganisation announced by the network.
    pub fn replace_from(&self, from: BlockNumber, blocks: Vec<Block>) {
        let mut inner = self.inner.write();
        let stale: Vec<BlockNumber> = inner
            .headers
            .keys()
            .copied()
            .filter(|number| *number >= from)
            .collect();
        for number in stale {
            if let Some(header) = inner.headers.remove(&number) {
                inner.bodies.remove(&header.hash());
            }
        }
        inner.tip = None;
        drop(inner);
        for block in blocks {
            self.insert_block(block);
        }
    }
}

impl BlockSource for MemorySource {
    fn announced_tip(&self) -> Option<(BlockNumber, H256)> {
        self.inner.read().tip
    }

    fn headers(&self, from: BlockNumber, max: usize) -> Vec<Header> {
        let inner = self.inner.read();
        let mut out = Vec::new();
        let mut number = from;
        while out.len() < max {
            match inner.headers.get(&number) {
                Some(header) => out.push(header.clone()),
                None => break,
            }
            number += 1;
        }
        out
    }

    fn header_by_hash(&self, hash: &H256) -> Option<Header> {
        self.inner
            .read()
            .headers
            .values()
            .find(|header| header.hash() == *hash)
            .cloned()
    }

    fn body(&self, hash: &H256) -> Option<BlockBody> {
        self.inner.read().bodies.get(hash).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(number: BlockNumber, timestamp: u64) -> Block {
        Block {
            header: Header {
                number,
                timestamp,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn serves_consecutive_headers() {
        let source = MemorySource::new();
        for n in 0..5 {
            source.insert_block(block(n, n));
        }
        assert_eq!(source.headers(1, 3).len(), 3);
        assert_eq!(source.headers(4, 3).len(), 1);
        assert_eq!(source.headers(9, 3).len(), 0);
        assert_eq!(source.announced_tip().unwrap().0, 4);
    }

    #[test]
    fn replace_from_rewinds_the_tip() {
        let source = MemorySource::new();
        for n in 0..5 {
            source.insert_block(block(n, n));
        }
        source.replace_from(3, vec![block(3, 100)]);
        assert_eq!(source.announced_tip().unwrap().0, 3);
        assert_eq!(source.headers(3, 10).len(), 1);
        assert_eq!(source.headers(3, 10)[0].timestamp, 100);
        assert_eq!(source.headers(4, 1).len(), 0);
    }
}
