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

//! Web3 rpc implementation.

use ethereum_types::H256;
use jsonrpc_core::Result;
use keccak_hash::keccak;

use crate::v1::{traits::Web3, types::Bytes};

/// Web3 rpc implementation.
pub struct Web3Client;

impl Web3 for Web3Client {
    fn client_version(&self) -> Result<String> {
        Ok(format!(
            "Ember/v{}/{}",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS
        ))
    }

    fn sha3(&self, data: Bytes) -> Result<H256> {
        Ok(keccak(&data.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::v1::traits::Web3;

    #[test]
    fn sha3_of_empty_input() {
        let expected: H256 =
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
                .parse()
                .unwrap();
        assert_eq!(Web3Client.sha3(Bytes::new(vec![])).unwrap(), expected);
    }
}
