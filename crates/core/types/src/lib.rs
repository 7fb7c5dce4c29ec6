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

//! Types used in the public API
//!
//! This crate stores Ember specific types that are commonly used across
//! different separate modules of the codebase. It should only focus on data
//! structures, not any logic that relates to them.
//!
//! The interaction between modules should be possible by implementing a
//! required trait that potentially uses some of the data structures from
//! this crate.

#![warn(unused_extern_crates)]

pub use keccak_hash as hash;
pub use parity_bytes as bytes;
pub use parity_crypto as crypto;

pub mod address;
pub mod basic_account;
pub mod block;
pub mod filter;
pub mod header;
pub mod ids;
pub mod log_entry;
pub mod receipt;
pub mod transaction;
pub mod withdrawal;

/// Type for block number.
pub type BlockNumber = u64;

/// Type for a global, monotonically increasing transaction number. Assigned
/// to every executed transaction and used to index the temporal store.
pub type TxNumber = u64;
