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

//! Call request

use common_types::transaction::{
    AccessListTx, Action, DynamicFeeTx, Transaction, TypedTransaction,
};
use ethereum_types::{H160, U256};

use super::Bytes;

/// Call request
#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CallRequest {
    /// From
    pub from: Option<H160>,
    /// To
    pub to: Option<H160>,
    /// Gas Price
    pub gas_price: Option<U256>,
    /// Max fee per gas
    pub max_fee_per_gas: Option<U256>,
    /// Max priority fee per gas
    pub max_priority_fee_per_gas: Option<U256>,
    /// Gas
    pub gas: Option<U256>,
    /// Value
    pub value: Option<U256>,
    /// Data
    pub data: Option<Bytes>,
    /// Input, alias of data
    pub input: Option<Bytes>,
    /// Nonce
    pub nonce: Option<U256>,
}

impl CallRequest {
    /// Materialize the request as a transaction against the given block
    /// context. Missing gas defaults to the block gas limit.
    pub fn into_transaction(self, chain_id: u64, block_gas_limit: U256, nonce: U256) -> TypedTransaction {
        let data = self
            .data
            .or(self.input)
            .map(Bytes::into_vec)
            .unwrap_or_default();
        let action = self.to.map_or(Action::Create, Action::Call);
        let gas = self.gas.unwrap_or(block_gas_limit);
        let value = self.value.unwrap_or_default();
        let nonce = self.nonce.unwrap_or(nonce);
        match (self.max_fee_per_gas, self.max_priority_fee_per_gas) {
            (None, None) => TypedTransaction::Legacy(Transaction {
                nonce,
                gas_price: self.gas_price.unwrap_or_default(),
                gas,
                action,
                value,
                data,
            }),
            (max_fee, tip) => TypedTransaction::DynamicFee(DynamicFeeTx {
                max_priority_fee_per_gas: tip.unwrap_or_default(),
                transaction: AccessListTx {
                    chain_id,
                    transaction: Transaction {
                        nonce,
                        gas_price: max_fee.unwrap_or_default(),
                        gas,
                        action,
                        value,
                        data,
                    },
                    access_list: vec![],
                },
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_request() {
        let request: CallRequest =
            serde_json::from_str(r#"{"to": "0x0000000000000000000000000000000000000005"}"#)
                .unwrap();
        assert_eq!(request.to, Some(H160::from_low_u64_be(5)));
        let tx = request.into_transaction(1, 30_000_000.into(), 0.into());
        assert_eq!(tx.tx().gas, U256::from(30_000_000));
    }

    #[test]
    fn fee_fields_select_the_dynamic_variant() {
        let request: CallRequest = serde_json::from_str(
            r#"{"maxFeePerGas": "0x10", "maxPriorityFeePerGas": "0x2"}"#,
        )
        .unwrap();
        let tx = request.into_transaction(1, 30_000_000.into(), 0.into());
        assert_eq!(tx.max_fee_per_gas(), 0x10.into());
        assert_eq!(tx.max_priority_fee_per_gas(), 0x2.into());
    }
}
