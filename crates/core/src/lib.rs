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

//! Ember core library: chain specification, consensus engines, the
//! journaled state overlay, transaction execution, state commitment, and
//! the read client the RPC façades are built on.

#![warn(missing_docs)]

pub mod client;
pub mod commitment;
pub mod engines;
pub mod error;
pub mod executive;
pub mod spec;
pub mod state;

pub use crate::{
    client::{Client, LocalizedReceipt, SyncState},
    error::{BlockError, Error, ExecutionError},
    spec::{CommonParams, Spec},
};
