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

//! Receipt.

use crate::{
    bytes::Bytes,
    log_entry::LogEntry,
    transaction::TypedTxId,
};
use ethereum_types::{Bloom, U256};
use rlp::{DecoderError, Rlp, RlpStream};

/// Information describing execution of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Variant of the originating transaction, selects the envelope.
    pub tx_type: TypedTxId,
    /// Whether execution succeeded (EIP-658 status).
    pub success: bool,
    /// The total gas used in the block following execution of the
    /// transaction.
    pub cumulative_gas_used: U256,
    /// The OR-wide combination of all logs' blooms for this transaction.
    pub log_bloom: Bloom,
    /// The logs stemming from this transaction.
    pub logs: Vec<LogEntry>,
}

impl Receipt {
    /// Create a new receipt, computing the bloom from the logs.
    pub fn new(
        tx_type: TypedTxId,
        success: bool,
        cumulative_gas_used: U256,
        logs: Vec<LogEntry>,
    ) -> Self {
        let log_bloom = logs.iter().fold(Bloom::default(), |mut bloom, log| {
            bloom.accrue_bloom(&log.bloom());
            bloom
        });
        Receipt {
            tx_type,
            success,
            cumulative_gas_used,
            log_bloom,
            logs,
        }
    }

    fn rlp_append_payload(&self, s: &mut RlpStream) {
        s.begin_list(4);
        s.append(&if self.success { 1u8 } else { 0u8 });
        s.append(&self.cumulative_gas_used);
        s.append(&self.log_bloom);
        s.append_list(&self.logs);
    }

    fn decode_payload(tx_type: TypedTxId, d: &Rlp) -> Result<Self, DecoderError> {
        if d.item_count()? != 4 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let status: u8 = d.val_at(0)?;
        Ok(Receipt {
            tx_type,
            success: status == 1,
            cumulative_gas_used: d.val_at(1)?,
            log_bloom: d.val_at(2)?,
            logs: d.list_at(3)?,
        })
    }

    /// Wire encoding: plain RLP for legacy receipts, type byte plus payload
    /// for typed ones. This is the form hashed into the receipts root.
    pub fn encode(&self) -> Bytes {
        let mut s = RlpStream::new();
        match self.tx_type {
            TypedTxId::Legacy => {
                self.rlp_append_payload(&mut s);
                s.out()
            }
            ty => {
                self.rlp_append_payload(&mut s);
                let mut out = vec![ty.as_byte()];
                out.extend_from_slice(&s.out());
                out
            }
        }
    }

    /// Decode from a wire envelope.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecoderError> {
        let first = *bytes.first().ok_or(DecoderError::RlpIsTooShort)?;
        if first >= 0xc0 {
            Self::decode_payload(TypedTxId::Legacy, &Rlp::new(bytes))
        } else {
            let ty = TypedTxId::from_wire_byte(first)?;
            Self::decode_payload(ty, &Rlp::new(&bytes[1..]))
        }
    }

    /// Append to an RLP list as stored in the receipts table.
    pub fn rlp_append(&self, s: &mut RlpStream) {
        match self.tx_type {
            TypedTxId::Legacy => self.rlp_append_payload(s),
            _ => {
                s.append(&self.encode());
            }
        }
    }

    /// Decode from a position inside an RLP list.
    pub fn decode_rlp(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.is_list() {
            Self::decode_payload(TypedTxId::Legacy, rlp)
        } else {
            Self::decode(rlp.data()?)
        }
    }

    /// Encode a block's receipts as one RLP list.
    pub fn encode_list(receipts: &[Receipt]) -> Bytes {
        let mut s = RlpStream::new_list(receipts.len());
        for receipt in receipts {
            receipt.rlp_append(&mut s);
        }
        s.out()
    }

    /// Decode a block's receipts from one RLP list.
    pub fn decode_list(bytes: &[u8]) -> Result<Vec<Receipt>, DecoderError> {
        let rlp = Rlp::new(bytes);
        let mut receipts = Vec::with_capacity(rlp.item_count()?);
        for item in rlp.iter() {
            receipts.push(Self::decode_rlp(&item)?);
        }
        Ok(receipts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::{Address, H256};

    fn receipt(tx_type: TypedTxId) -> Receipt {
        Receipt::new(
            tx_type,
            true,
            40_000.into(),
            vec![LogEntry {
                address: Address::from_low_u64_be(0xdead),
                topics: vec![H256::from_low_u64_be(1)],
                data: vec![1, 2, 3],
            }],
        )
    }

    #[test]
    fn legacy_envelope_round_trip() {
        let r = receipt(TypedTxId::Legacy);
        assert_eq!(Receipt::decode(&r.encode()).unwrap(), r);
    }

    #[test]
    fn typed_envelope_round_trip() {
        let r = receipt(TypedTxId::DynamicFee);
        let encoded = r.encode();
        assert_eq!(encoded[0], 0x02);
        assert_eq!(Receipt::decode(&encoded).unwrap(), r);
    }

    #[test]
    fn list_round_trip_mixes_variants() {
        let receipts = vec![receipt(TypedTxId::Legacy), receipt(TypedTxId::Blob)];
        let encoded = Receipt::encode_list(&receipts);
        assert_eq!(Receipt::decode_list(&encoded).unwrap(), receipts);
    }

    #[test]
    fn bloom_covers_log_addresses() {
        use ethereum_types::BloomInput;
        let r = receipt(TypedTxId::Legacy);
        assert!(r
            .log_bloom
            .contains_input(BloomInput::Raw(Address::from_low_u64_be(0xdead).as_bytes())));
    }
}
