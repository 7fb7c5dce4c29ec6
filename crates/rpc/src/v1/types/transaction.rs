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

//! RPC view of a transaction.

use common_types::transaction::{Action, LocalizedTransaction, TypedTransaction};
use ethereum_types::{H256, U256, U64};

use super::Bytes;

/// Transaction as served over RPC.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Hash
    pub hash: H256,
    /// Transaction type byte.
    #[serde(rename = "type")]
    pub transaction_type: U64,
    /// Nonce
    pub nonce: U256,
    /// Block hash
    pub block_hash: Option<H256>,
    /// Block number
    pub block_number: Option<U256>,
    /// Transaction Index
    pub transaction_index: Option<U256>,
    /// Sender
    pub from: ethereum_types::H160,
    /// Recipient
    pub to: Option<ethereum_types::H160>,
    /// Transfered value
    pub value: U256,
    /// Gas Price
    pub gas_price: U256,
    /// Max fee per gas
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U256>,
    /// Max priority fee per gas
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
    /// Gas
    pub gas: U256,
    /// Data
    pub input: Bytes,
    /// The network id of the transaction, if any.
    pub chain_id: Option<U64>,
    /// The standardised V field of the signature.
    pub v: U64,
    /// The R field of the signature.
    pub r: U256,
    /// The S field of the signature.
    pub s: U256,
}

impl Transaction {
    /// Convert a localized transaction into the RPC view.
    pub fn from_localized(mut tx: LocalizedTransaction) -> Transaction {
        let sender = tx.sender();
        let signed = &tx.signed;
        let inner = signed.unsigned.tx();
        let (max_fee, max_priority) = match signed.unsigned {
            TypedTransaction::Legacy(_) | TypedTransaction::AccessList(_) => (None, None),
            _ => (
                Some(signed.unsigned.max_fee_per_gas()),
                Some(signed.unsigned.max_priority_fee_per_gas()),
            ),
        };
        Transaction {
            hash: signed.hash(),
            transaction_type: U64::from(signed.unsigned.tx_type().as_byte()),
            nonce: inner.nonce,
            block_hash: Some(tx.block_hash),
            block_number: Some(tx.block_number.into()),
            transaction_index: Some(tx.transaction_index.into()),
            from: sender,
            to: match inner.action {
                Action::Call(to) => Some(to),
                Action::Create => None,
            },
            value: inner.value,
            gas_price: inner.gas_price,
            max_fee_per_gas: max_fee,
            max_priority_fee_per_gas: max_priority,
            gas: inner.gas,
            input: Bytes::new(inner.data.clone()),
            chain_id: signed.chain_id.map(U64::from),
            v: U64::from(signed.signature.standard_v),
            r: signed.signature.r,
            s: signed.signature.s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_types::transaction::{SignedTransaction, Transaction as CoreTransaction};
    use parity_crypto::publickey::{Generator, Random};

    fn localized() -> LocalizedTransaction {
        let keypair = Random.generate();
        let signed: SignedTransaction = TypedTransaction::Legacy(CoreTransaction {
            nonce: 1.into(),
            gas_price: 5.into(),
            gas: 21_000.into(),
            action: Action::Call(ethereum_types::H160::from_low_u64_be(9)),
            value: 7.into(),
            data: vec![0xde, 0xad],
        })
        .sign(keypair.secret(), Some(1));
        LocalizedTransaction {
            signed: signed.into(),
            block_number: 3,
            block_hash: H256::from_low_u64_be(4),
            transaction_index: 0,
            cached_sender: None,
        }
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let tx = Transaction::from_localized(localized());
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "0x0");
        assert_eq!(json["blockNumber"], "0x3");
        assert_eq!(json["input"], "0xdead");
        assert_eq!(json["chainId"], "0x1");
    }
}
