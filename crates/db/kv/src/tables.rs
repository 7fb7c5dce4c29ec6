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

//! Logical table names. Numeric key components are big-endian throughout so
//! that byte order equals numeric order.

/// block number -> header RLP. Strictly linear for the canonical chain.
pub const HEADERS: &str = "Headers";
/// header hash -> block number.
pub const HEADER_NUMBERS: &str = "HeaderNumbers";
/// block number -> canonical header hash.
pub const CANONICAL_HASHES: &str = "CanonicalHashes";
/// block number -> body RLP.
pub const BODIES: &str = "Bodies";
/// block number -> receipts RLP list.
pub const BLOCK_RECEIPTS: &str = "BlockReceipts";
/// Hot table of the accounts domain: address ++ inverted step -> account RLP.
pub const PLAIN_STATE: &str = "PlainState";
/// Hot table of the storage domain: composite slot key ++ inverted step ->
/// slot value.
pub const PLAIN_STORAGE: &str = "PlainStorage";
/// code hash -> byte code.
pub const CODE: &str = "Code";
/// block number -> concatenated 20-byte sender addresses.
pub const SENDERS: &str = "Senders";
/// transaction hash -> block number.
pub const TX_LOOKUP: &str = "TxLookup";
/// stage name -> big-endian progress block number.
pub const SYNC_STAGE_PROGRESS: &str = "SyncStageProgress";
/// block number -> last transaction number assigned inside it.
pub const MAX_TX_NUM: &str = "MaxTxNum";
/// forkchoice pointer name ("head"/"safe"/"finalized") -> block hash.
pub const FORKCHOICE: &str = "Forkchoice";
