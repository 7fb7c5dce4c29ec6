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

//! `eth_syncing` response.

use ethereum_types::U256;
use serde::{Serialize, Serializer};

/// Sync info
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncInfo {
    /// Starting block
    pub starting_block: U256,
    /// Current block
    pub current_block: U256,
    /// Highest block seen so far
    pub highest_block: U256,
}

/// Sync status: `false` when idle, progress numbers otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncStatus {
    /// Info when syncing
    Info(SyncInfo),
    /// Not syncing
    None,
}

impl Serialize for SyncStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            SyncStatus::Info(ref info) => info.serialize(serializer),
            SyncStatus::None => false.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_serializes_as_false() {
        assert_eq!(serde_json::to_string(&SyncStatus::None).unwrap(), "false");
    }

    #[test]
    fn in_flight_serializes_progress() {
        let status = SyncStatus::Info(SyncInfo {
            starting_block: 0.into(),
            current_block: 5.into(),
            highest_block: 9.into(),
        });
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["currentBlock"], "0x5");
        assert_eq!(json["highestBlock"], "0x9");
    }
}
