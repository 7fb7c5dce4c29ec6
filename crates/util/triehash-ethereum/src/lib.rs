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

//! Trie-root helpers specialised to Keccak-256, used for transaction,
//! receipt and state roots.

use ethereum_types::H256;
use keccak_hasher::KeccakHasher;

/// Trie root of an ordered sequence of values, keyed by RLP-encoded index.
pub fn ordered_trie_root<I>(input: I) -> H256
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    triehash::ordered_trie_root::<KeccakHasher, I>(input)
}

/// Trie root of explicit key/value pairs.
pub fn trie_root<I, A, B>(input: I) -> H256
where
    I: IntoIterator<Item = (A, B)>,
    A: AsRef<[u8]> + Ord,
    B: AsRef<[u8]>,
{
    triehash::trie_root::<KeccakHasher, _, _, _>(input)
}

/// Trie root of key/value pairs with keys hashed by Keccak-256 first.
pub fn sec_trie_root<I, A, B>(input: I) -> H256
where
    I: IntoIterator<Item = (A, B)>,
    A: AsRef<[u8]>,
    B: AsRef<[u8]>,
{
    triehash::sec_trie_root::<KeccakHasher, _, _, _>(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_roots_agree() {
        // the empty trie root is keccak(rlp(""))
        let null_rlp: H256 =
            "56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421"
                .parse()
                .unwrap();
        let empty: Vec<Vec<u8>> = vec![];
        assert_eq!(ordered_trie_root(empty), null_rlp);
        let empty_pairs: Vec<(Vec<u8>, Vec<u8>)> = vec![];
        assert_eq!(trie_root(empty_pairs), null_rlp);
    }
}
