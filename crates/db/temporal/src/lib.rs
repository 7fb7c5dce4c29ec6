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

//! Temporal state store.
//!
//! A `Domain` is a flat key -> latest-value map with optional time travel.
//! Values are versioned by a global transaction number; the hot table keys
//! records by `K ++ !step` so the newest step for a key is the first one a
//! lexicographic seek finds. History keeps, per write, the value the key
//! held *before* that write, which makes an as-of read one inverted-index
//! seek plus one point lookup.

mod domain;

pub use crate::domain::{Domain, DomainConfig};

/// Step size used by the standard domains.
pub const DEFAULT_STEP_SIZE: u64 = 8_192;

/// The accounts domain: address -> account RLP.
pub fn accounts_domain() -> Domain {
    Domain::new(DomainConfig {
        name: "Accounts",
        hot_table: embercore_kv::tables::PLAIN_STATE,
        step_size: DEFAULT_STEP_SIZE,
        with_history: true,
    })
}

/// The storage domain: hashed composite slot key -> slot value.
pub fn storage_domain() -> Domain {
    Domain::new(DomainConfig {
        name: "Storage",
        hot_table: embercore_kv::tables::PLAIN_STORAGE,
        step_size: DEFAULT_STEP_SIZE,
        with_history: true,
    })
}
