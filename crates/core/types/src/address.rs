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

//! EIP-55 mixed-case address checksumming.

use ethereum_types::Address;
use keccak_hash::keccak;

/// Apply the EIP-55 checksum to a hex address string. The input may carry a
/// `0x` prefix and any letter casing; the output is `0x`-prefixed with
/// checksum casing. Idempotent.
pub fn checksum_hex(addr: &str) -> String {
    let stripped = addr.strip_prefix("0x").unwrap_or(addr).to_lowercase();
    let hash = keccak(stripped.as_bytes());
    let mut out = String::with_capacity(stripped.len() + 2);
    out.push_str("0x");
    for (i, c) in stripped.chars().enumerate() {
        let nibble = (hash.as_bytes()[i / 2] >> (4 * (1 - i % 2))) & 0x0f;
        if c.is_ascii_alphabetic() && nibble > 7 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// EIP-55 representation of an address.
pub fn to_checksum(address: &Address) -> String {
    checksum_hex(&format!("{:x}", address))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksums_known_vectors() {
        assert_eq!(
            checksum_hex("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
        assert_eq!(
            checksum_hex("0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359"),
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359"
        );
    }

    #[test]
    fn checksum_is_idempotent() {
        let once = checksum_hex("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
        assert_eq!(checksum_hex(&once), once);
    }

    #[test]
    fn checksum_of_typed_address() {
        let address: Address = "5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
            .parse()
            .unwrap();
        assert_eq!(
            to_checksum(&address),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }
}
