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

//! Base data structure of this module is `Block`.

use crate::{
    bytes::Bytes,
    header::Header,
    transaction::UnverifiedTransaction,
    withdrawal::Withdrawal,
};
use rlp::{DecoderError, Rlp, RlpStream};

/// A block, encoded as it is on the block chain.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    /// The header of this block.
    pub header: Header,
    /// The transactions in this block.
    pub transactions: Vec<UnverifiedTransaction>,
    /// The uncles of this block.
    pub uncles: Vec<Header>,
    /// The withdrawals pushed by the consensus layer, Shanghai onwards.
    pub withdrawals: Option<Vec<Withdrawal>>,
}

impl Block {
    /// Get the RLP-encoding of the block with the seal.
    pub fn rlp_bytes(&self) -> Bytes {
        let mut s = RlpStream::new_list(if self.withdrawals.is_some() { 4 } else { 3 });
        s.append(&self.header);
        s.begin_list(self.transactions.len());
        for tx in &self.transactions {
            tx.rlp_append(&mut s);
        }
        s.append_list(&self.uncles);
        if let Some(ref withdrawals) = self.withdrawals {
            s.append_list(withdrawals);
        }
        s.out()
    }

    /// Decode a full block.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecoderError> {
        let rlp = Rlp::new(bytes);
        let count = rlp.item_count()?;
        if count != 3 && count != 4 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let header = rlp.val_at(0)?;
        let body = BlockBody::decode_parts(&rlp.at(1)?, &rlp.at(2)?, if count == 4 {
            Some(rlp.at(3)?)
        } else {
            None
        })?;
        Ok(Block {
            header,
            transactions: body.transactions,
            uncles: body.uncles,
            withdrawals: body.withdrawals,
        })
    }

    /// Split into header and owned body.
    pub fn into_parts(self) -> (Header, BlockBody) {
        (
            self.header,
            BlockBody {
                transactions: self.transactions,
                uncles: self.uncles,
                withdrawals: self.withdrawals,
            },
        )
    }
}

/// A block body: the block minus its header, stored in the bodies table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockBody {
    /// The transactions in this block.
    pub transactions: Vec<UnverifiedTransaction>,
    /// The uncles of this block.
    pub uncles: Vec<Header>,
    /// The withdrawals in this block, Shanghai onwards.
    pub withdrawals: Option<Vec<Withdrawal>>,
}

impl BlockBody {
    /// RLP-encode for the bodies table.
    pub fn rlp_bytes(&self) -> Bytes {
        let mut s = RlpStream::new_list(if self.withdrawals.is_some() { 3 } else { 2 });
        s.begin_list(self.transactions.len());
        for tx in &self.transactions {
            tx.rlp_append(&mut s);
        }
        s.append_list(&self.uncles);
        if let Some(ref withdrawals) = self.withdrawals {
            s.append_list(withdrawals);
        }
        s.out()
    }

    /// Decode from the bodies table encoding.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecoderError> {
        let rlp = Rlp::new(bytes);
        let count = rlp.item_count()?;
        if count != 2 && count != 3 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Self::decode_parts(&rlp.at(0)?, &rlp.at(1)?, if count == 3 {
            Some(rlp.at(2)?)
        } else {
            None
        })
    }

    fn decode_parts(
        transactions: &Rlp,
        uncles: &Rlp,
        withdrawals: Option<Rlp>,
    ) -> Result<Self, DecoderError> {
        let mut txs = Vec::with_capacity(transactions.item_count()?);
        for item in transactions.iter() {
            txs.push(UnverifiedTransaction::decode_rlp(&item)?);
        }
        let withdrawals = match withdrawals {
            Some(rlp) => Some(rlp.as_list()?),
            None => None,
        };
        Ok(BlockBody {
            transactions: txs,
            uncles: uncles.as_list()?,
            withdrawals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Action, Transaction, TypedTransaction};
    use ethereum_types::Address;
    use parity_crypto::publickey::{Generator, Random};

    fn signed_tx(nonce: u64) -> UnverifiedTransaction {
        let keypair = Random.generate();
        TypedTransaction::Legacy(Transaction {
            nonce: nonce.into(),
            gas_price: 10.into(),
            gas: 21_000.into(),
            action: Action::Call(Address::from_low_u64_be(1)),
            value: 0.into(),
            data: vec![],
        })
        .sign(keypair.secret(), Some(5))
        .into()
    }

    #[test]
    fn body_round_trip() {
        let body = BlockBody {
            transactions: vec![signed_tx(0), signed_tx(1)],
            uncles: vec![Header::default()],
            withdrawals: None,
        };
        assert_eq!(BlockBody::decode(&body.rlp_bytes()).unwrap(), body);
    }

    #[test]
    fn body_round_trip_with_withdrawals() {
        let body = BlockBody {
            transactions: vec![signed_tx(0)],
            uncles: vec![],
            withdrawals: Some(vec![Withdrawal {
                index: 1,
                validator_index: 2,
                address: Address::from_low_u64_be(3),
                amount: 4,
            }]),
        };
        assert_eq!(BlockBody::decode(&body.rlp_bytes()).unwrap(), body);
    }

    #[test]
    fn block_round_trip() {
        let block = Block {
            header: Header {
                number: 12,
                ..Default::default()
            },
            transactions: vec![signed_tx(7)],
            uncles: vec![],
            withdrawals: None,
        };
        assert_eq!(Block::decode(&block.rlp_bytes()).unwrap(), block);
    }
}
