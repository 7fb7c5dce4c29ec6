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

//! Unique identifiers for blocks and transactions.

use crate::BlockNumber;
use ethereum_types::H256;

/// Uniquely identifies block.
#[derive(Debug, PartialEq, Copy, Clone, Hash, Eq)]
pub enum BlockId {
    /// Block's keccak.
    /// Querying by hash is always faster.
    Hash(H256),
    /// Block number within canon blockchain.
    Number(BlockNumber),
    /// Earliest block (genesis).
    Earliest,
    /// Latest mined block.
    Latest,
    /// Pending block (the latest block plus pending transactions).
    Pending,
    /// Most recent block considered safe by the consensus layer.
    Safe,
    /// Most recent finalized block.
    Finalized,
}

/// Uniquely identifies transaction.
#[derive(Debug, PartialEq, Copy, Clone, Hash, Eq)]
pub enum TransactionId {
    /// Transaction's keccak.
    Hash(H256),
    /// Block id and transaction index within this block.
    Location(BlockId, usize),
}
