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

//! Transaction data structures: the five wire variants, signature handling
//! and sender recovery.

mod error;

pub use self::error::Error;

use std::ops::Deref;

use crate::{bytes::Bytes, BlockNumber};
use ethereum_types::{Address, BigEndianHash, H256, U256};
use keccak_hash::keccak;
use parity_crypto::publickey::{
    self, public_to_address, recover, Public, Secret, Signature,
};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

/// Wire discriminator for the transaction variants. The byte precedes the
/// payload RLP for typed transactions and is absent for legacy ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypedTxId {
    /// Untyped, pre-EIP-2718 transaction.
    Legacy,
    /// EIP-2930 access list transaction.
    AccessList,
    /// EIP-1559 dynamic fee transaction.
    DynamicFee,
    /// EIP-4844 blob transaction.
    Blob,
    /// EIP-7702 set code transaction.
    SetCode,
}

impl TypedTxId {
    /// Envelope byte for this variant. Legacy is reported as zero even
    /// though it never appears on the wire.
    pub fn as_byte(self) -> u8 {
        match self {
            TypedTxId::Legacy => 0x00,
            TypedTxId::AccessList => 0x01,
            TypedTxId::DynamicFee => 0x02,
            TypedTxId::Blob => 0x03,
            TypedTxId::SetCode => 0x04,
        }
    }

    /// Decode an envelope byte. Legacy payloads start with an RLP list
    /// marker (>= 0xc0) and must not reach this function.
    pub fn from_wire_byte(byte: u8) -> Result<Self, DecoderError> {
        match byte {
            0x01 => Ok(TypedTxId::AccessList),
            0x02 => Ok(TypedTxId::DynamicFee),
            0x03 => Ok(TypedTxId::Blob),
            0x04 => Ok(TypedTxId::SetCode),
            _ => Err(DecoderError::Custom("unknown transaction type byte")),
        }
    }
}

/// Transaction action. The absent recipient means contract creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// Create creates new contract.
    Create,
    /// Calls contract at given address.
    Call(Address),
}

impl Default for Action {
    fn default() -> Action {
        Action::Create
    }
}

impl Decodable for Action {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.is_empty() {
            Ok(Action::Create)
        } else {
            Ok(Action::Call(rlp.as_val()?))
        }
    }
}

fn append_action(s: &mut RlpStream, action: &Action) {
    match *action {
        Action::Create => {
            s.append_empty_data();
        }
        Action::Call(ref address) => {
            s.append(address);
        }
    }
}

/// One EIP-2930 access tuple.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessListItem {
    /// Address to pre-warm.
    pub address: Address,
    /// Storage keys to pre-warm.
    pub storage_keys: Vec<H256>,
}

/// The EIP-2930 access list.
pub type AccessList = Vec<AccessListItem>;

impl Encodable for AccessListItem {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append(&self.address);
        s.append_list(&self.storage_keys);
    }
}

impl Decodable for AccessListItem {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 2 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(AccessListItem {
            address: rlp.val_at(0)?,
            storage_keys: rlp.list_at(1)?,
        })
    }
}

/// An EIP-7702 authorization tuple delegating the authority's code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    /// Chain the authorization is valid on; zero means any chain.
    pub chain_id: U256,
    /// Delegation target.
    pub address: Address,
    /// Nonce the authority account must have.
    pub nonce: u64,
    /// Signature parity bit.
    pub y_parity: u8,
    /// Signature r.
    pub r: U256,
    /// Signature s.
    pub s: U256,
}

/// Prefix byte of the EIP-7702 authorization preimage.
const AUTHORIZATION_MAGIC: u8 = 0x05;

impl Authorization {
    /// Hash signed by the authority.
    pub fn signature_hash(&self) -> H256 {
        let mut s = RlpStream::new_list(3);
        s.append(&self.chain_id);
        s.append(&self.address);
        s.append(&self.nonce);
        let mut preimage = vec![AUTHORIZATION_MAGIC];
        preimage.extend_from_slice(&s.out());
        keccak(preimage)
    }

    /// Recover the authorizing account.
    pub fn authority(&self) -> Result<Address, publickey::Error> {
        let signature = Signature::from_rsv(
            &H256::from_uint(&self.r),
            &H256::from_uint(&self.s),
            self.y_parity,
        );
        Ok(public_to_address(&recover(
            &signature,
            &self.signature_hash(),
        )?))
    }
}

impl Encodable for Authorization {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(6);
        s.append(&self.chain_id);
        s.append(&self.address);
        s.append(&self.nonce);
        s.append(&self.y_parity);
        s.append(&self.r);
        s.append(&self.s);
    }
}

impl Decodable for Authorization {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 6 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Authorization {
            chain_id: rlp.val_at(0)?,
            address: rlp.val_at(1)?,
            nonce: rlp.val_at(2)?,
            y_parity: rlp.val_at(3)?,
            r: rlp.val_at(4)?,
            s: rlp.val_at(5)?,
        })
    }
}

/// Fields shared by every transaction variant. Also the full body of a
/// legacy transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transaction {
    /// Nonce.
    pub nonce: U256,
    /// Gas price; doubles as the fee cap for dynamic-fee carriers.
    pub gas_price: U256,
    /// Gas paid up front for transaction execution.
    pub gas: U256,
    /// Action, see `Action`.
    pub action: Action,
    /// Transferred value.
    pub value: U256,
    /// Transaction data.
    pub data: Bytes,
}

impl Transaction {
    fn rlp_append_unsigned(&self, s: &mut RlpStream, chain_id: Option<u64>) {
        s.begin_list(if chain_id.is_some() { 9 } else { 6 });
        s.append(&self.nonce);
        s.append(&self.gas_price);
        s.append(&self.gas);
        append_action(s, &self.action);
        s.append(&self.value);
        s.append(&self.data);
        if let Some(n) = chain_id {
            s.append(&n);
            s.append(&0u8);
            s.append(&0u8);
        }
    }

    fn rlp_append_signed(&self, s: &mut RlpStream, signature: &SignatureComponents, chain_id: Option<u64>) {
        s.begin_list(9);
        s.append(&self.nonce);
        s.append(&self.gas_price);
        s.append(&self.gas);
        append_action(s, &self.action);
        s.append(&self.value);
        s.append(&self.data);
        s.append(&signature.legacy_v(chain_id));
        s.append(&signature.r);
        s.append(&signature.s);
    }

    /// Hash a legacy transaction for signing, optionally with EIP-155
    /// replay protection.
    pub fn signature_hash(&self, chain_id: Option<u64>) -> H256 {
        let mut s = RlpStream::new();
        self.rlp_append_unsigned(&mut s, chain_id);
        keccak(s.out())
    }

    fn decode_signed(d: &Rlp) -> Result<(Self, SignatureComponents, Option<u64>), DecoderError> {
        if d.item_count()? != 9 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let tx = Transaction {
            nonce: d.val_at(0)?,
            gas_price: d.val_at(1)?,
            gas: d.val_at(2)?,
            action: d.val_at(3)?,
            value: d.val_at(4)?,
            data: d.val_at(5)?,
        };
        let v: u64 = d.val_at(6)?;
        let (standard_v, chain_id) = SignatureComponents::split_legacy_v(v)?;
        let signature = SignatureComponents {
            standard_v,
            r: d.val_at(7)?,
            s: d.val_at(8)?,
        };
        Ok((tx, signature, chain_id))
    }
}

/// EIP-2930 transaction: legacy fields plus an explicit chain id and an
/// access list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessListTx {
    /// Shared fields.
    pub transaction: Transaction,
    /// Chain id, mandatory for typed transactions.
    pub chain_id: u64,
    /// Pre-warmed addresses and storage keys.
    pub access_list: AccessList,
}

impl AccessListTx {
    fn rlp_append_payload(&self, s: &mut RlpStream, signature: Option<&SignatureComponents>) {
        s.begin_list(if signature.is_some() { 11 } else { 8 });
        s.append(&self.chain_id);
        s.append(&self.transaction.nonce);
        s.append(&self.transaction.gas_price);
        s.append(&self.transaction.gas);
        append_action(s, &self.transaction.action);
        s.append(&self.transaction.value);
        s.append(&self.transaction.data);
        s.append_list(&self.access_list);
        if let Some(sig) = signature {
            sig.rlp_append(s);
        }
    }

    fn decode_payload(d: &Rlp) -> Result<(Self, SignatureComponents), DecoderError> {
        if d.item_count()? != 11 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let tx = AccessListTx {
            chain_id: d.val_at(0)?,
            transaction: Transaction {
                nonce: d.val_at(1)?,
                gas_price: d.val_at(2)?,
                gas: d.val_at(3)?,
                action: d.val_at(4)?,
                value: d.val_at(5)?,
                data: d.val_at(6)?,
            },
            access_list: d.list_at(7)?,
        };
        Ok((tx, SignatureComponents::decode_at(d, 8)?))
    }
}

/// EIP-1559 transaction. The fee cap rides in the inner `gas_price`; the
/// tip cap is the extra field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DynamicFeeTx {
    /// Access-list carrier; its `gas_price` is `max_fee_per_gas`.
    pub transaction: AccessListTx,
    /// Maximum priority fee (tip cap).
    pub max_priority_fee_per_gas: U256,
}

impl DynamicFeeTx {
    fn rlp_append_payload(&self, s: &mut RlpStream, signature: Option<&SignatureComponents>) {
        let inner = &self.transaction;
        s.begin_list(if signature.is_some() { 12 } else { 9 });
        s.append(&inner.chain_id);
        s.append(&inner.transaction.nonce);
        s.append(&self.max_priority_fee_per_gas);
        s.append(&inner.transaction.gas_price);
        s.append(&inner.transaction.gas);
        append_action(s, &inner.transaction.action);
        s.append(&inner.transaction.value);
        s.append(&inner.transaction.data);
        s.append_list(&inner.access_list);
        if let Some(sig) = signature {
            sig.rlp_append(s);
        }
    }

    fn decode_payload(d: &Rlp) -> Result<(Self, SignatureComponents), DecoderError> {
        if d.item_count()? != 12 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let tx = DynamicFeeTx {
            max_priority_fee_per_gas: d.val_at(2)?,
            transaction: AccessListTx {
                chain_id: d.val_at(0)?,
                transaction: Transaction {
                    nonce: d.val_at(1)?,
                    gas_price: d.val_at(3)?,
                    gas: d.val_at(4)?,
                    action: d.val_at(5)?,
                    value: d.val_at(6)?,
                    data: d.val_at(7)?,
                },
                access_list: d.list_at(8)?,
            },
        };
        Ok((tx, SignatureComponents::decode_at(d, 9)?))
    }
}

/// EIP-4844 blob-carrying transaction. Always a call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlobTx {
    /// Dynamic-fee carrier.
    pub transaction: DynamicFeeTx,
    /// Fee cap for blob gas.
    pub max_fee_per_blob_gas: U256,
    /// Commitments to the sidecar blobs.
    pub blob_versioned_hashes: Vec<H256>,
}

impl BlobTx {
    fn recipient(&self) -> Result<&Address, DecoderError> {
        match self.transaction.transaction.transaction.action {
            Action::Call(ref address) => Ok(address),
            Action::Create => Err(DecoderError::Custom("blob transaction without recipient")),
        }
    }

    fn rlp_append_payload(
        &self,
        s: &mut RlpStream,
        signature: Option<&SignatureComponents>,
    ) -> Result<(), DecoderError> {
        let dynamic = &self.transaction;
        let inner = &dynamic.transaction;
        s.begin_list(if signature.is_some() { 14 } else { 11 });
        s.append(&inner.chain_id);
        s.append(&inner.transaction.nonce);
        s.append(&dynamic.max_priority_fee_per_gas);
        s.append(&inner.transaction.gas_price);
        s.append(&inner.transaction.gas);
        s.append(self.recipient()?);
        s.append(&inner.transaction.value);
        s.append(&inner.transaction.data);
        s.append_list(&inner.access_list);
        s.append(&self.max_fee_per_blob_gas);
        s.append_list(&self.blob_versioned_hashes);
        if let Some(sig) = signature {
            sig.rlp_append(s);
        }
        Ok(())
    }

    fn decode_payload(d: &Rlp) -> Result<(Self, SignatureComponents), DecoderError> {
        if d.item_count()? != 14 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let to: Address = d.val_at(5)?;
        let tx = BlobTx {
            transaction: DynamicFeeTx {
                max_priority_fee_per_gas: d.val_at(2)?,
                transaction: AccessListTx {
                    chain_id: d.val_at(0)?,
                    transaction: Transaction {
                        nonce: d.val_at(1)?,
                        gas_price: d.val_at(3)?,
                        gas: d.val_at(4)?,
                        action: Action::Call(to),
                        value: d.val_at(6)?,
                        data: d.val_at(7)?,
                    },
                    access_list: d.list_at(8)?,
                },
            },
            max_fee_per_blob_gas: d.val_at(9)?,
            blob_versioned_hashes: d.list_at(10)?,
        };
        Ok((tx, SignatureComponents::decode_at(d, 11)?))
    }
}

/// EIP-7702 set-code transaction. Always a call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SetCodeTx {
    /// Dynamic-fee carrier.
    pub transaction: DynamicFeeTx,
    /// Delegations applied before execution.
    pub authorization_list: Vec<Authorization>,
}

impl SetCodeTx {
    fn recipient(&self) -> Result<&Address, DecoderError> {
        match self.transaction.transaction.transaction.action {
            Action::Call(ref address) => Ok(address),
            Action::Create => Err(DecoderError::Custom(
                "set-code transaction without recipient",
            )),
        }
    }

    fn rlp_append_payload(
        &self,
        s: &mut RlpStream,
        signature: Option<&SignatureComponents>,
    ) -> Result<(), DecoderError> {
        let dynamic = &self.transaction;
        let inner = &dynamic.transaction;
        s.begin_list(if signature.is_some() { 13 } else { 10 });
        s.append(&inner.chain_id);
        s.append(&inner.transaction.nonce);
        s.append(&dynamic.max_priority_fee_per_gas);
        s.append(&inner.transaction.gas_price);
        s.append(&inner.transaction.gas);
        s.append(self.recipient()?);
        s.append(&inner.transaction.value);
        s.append(&inner.transaction.data);
        s.append_list(&inner.access_list);
        s.append_list(&self.authorization_list);
        if let Some(sig) = signature {
            sig.rlp_append(s);
        }
        Ok(())
    }

    fn decode_payload(d: &Rlp) -> Result<(Self, SignatureComponents), DecoderError> {
        if d.item_count()? != 13 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let to: Address = d.val_at(5)?;
        let tx = SetCodeTx {
            transaction: DynamicFeeTx {
                max_priority_fee_per_gas: d.val_at(2)?,
                transaction: AccessListTx {
                    chain_id: d.val_at(0)?,
                    transaction: Transaction {
                        nonce: d.val_at(1)?,
                        gas_price: d.val_at(3)?,
                        gas: d.val_at(4)?,
                        action: Action::Call(to),
                        value: d.val_at(6)?,
                        data: d.val_at(7)?,
                    },
                    access_list: d.list_at(8)?,
                },
            },
            authorization_list: d.list_at(9)?,
        };
        if tx.authorization_list.is_empty() {
            return Err(DecoderError::Custom("empty authorization list"));
        }
        Ok((tx, SignatureComponents::decode_at(d, 10)?))
    }
}

/// The five transaction variants behind one closed enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedTransaction {
    /// Legacy transaction.
    Legacy(Transaction),
    /// EIP-2930 access list transaction.
    AccessList(AccessListTx),
    /// EIP-1559 dynamic fee transaction.
    DynamicFee(DynamicFeeTx),
    /// EIP-4844 blob transaction.
    Blob(BlobTx),
    /// EIP-7702 set code transaction.
    SetCode(SetCodeTx),
}

impl TypedTransaction {
    /// Variant discriminator.
    pub fn tx_type(&self) -> TypedTxId {
        match *self {
            TypedTransaction::Legacy(_) => TypedTxId::Legacy,
            TypedTransaction::AccessList(_) => TypedTxId::AccessList,
            TypedTransaction::DynamicFee(_) => TypedTxId::DynamicFee,
            TypedTransaction::Blob(_) => TypedTxId::Blob,
            TypedTransaction::SetCode(_) => TypedTxId::SetCode,
        }
    }

    /// Shared fields of any variant.
    pub fn tx(&self) -> &Transaction {
        match *self {
            TypedTransaction::Legacy(ref tx) => tx,
            TypedTransaction::AccessList(ref tx) => &tx.transaction,
            TypedTransaction::DynamicFee(ref tx) => &tx.transaction.transaction,
            TypedTransaction::Blob(ref tx) => &tx.transaction.transaction.transaction,
            TypedTransaction::SetCode(ref tx) => &tx.transaction.transaction.transaction,
        }
    }

    /// Chain id carried by the payload. Legacy transactions carry it in the
    /// signature, if at all.
    pub fn chain_id(&self) -> Option<u64> {
        match *self {
            TypedTransaction::Legacy(_) => None,
            TypedTransaction::AccessList(ref tx) => Some(tx.chain_id),
            TypedTransaction::DynamicFee(ref tx) => Some(tx.transaction.chain_id),
            TypedTransaction::Blob(ref tx) => Some(tx.transaction.transaction.chain_id),
            TypedTransaction::SetCode(ref tx) => Some(tx.transaction.transaction.chain_id),
        }
    }

    /// Access list, for the variants that have one.
    pub fn access_list(&self) -> Option<&AccessList> {
        match *self {
            TypedTransaction::Legacy(_) => None,
            TypedTransaction::AccessList(ref tx) => Some(&tx.access_list),
            TypedTransaction::DynamicFee(ref tx) => Some(&tx.transaction.access_list),
            TypedTransaction::Blob(ref tx) => Some(&tx.transaction.transaction.access_list),
            TypedTransaction::SetCode(ref tx) => Some(&tx.transaction.transaction.access_list),
        }
    }

    /// Authorization list of a set-code transaction.
    pub fn authorization_list(&self) -> Option<&[Authorization]> {
        match *self {
            TypedTransaction::SetCode(ref tx) => Some(&tx.authorization_list),
            _ => None,
        }
    }

    /// Fee cap: `gas_price` for legacy kinds, `max_fee_per_gas` otherwise.
    pub fn max_fee_per_gas(&self) -> U256 {
        self.tx().gas_price
    }

    /// Tip cap: equals the fee cap for legacy kinds.
    pub fn max_priority_fee_per_gas(&self) -> U256 {
        match *self {
            TypedTransaction::Legacy(_) | TypedTransaction::AccessList(_) => self.tx().gas_price,
            TypedTransaction::DynamicFee(ref tx) => tx.max_priority_fee_per_gas,
            TypedTransaction::Blob(ref tx) => tx.transaction.max_priority_fee_per_gas,
            TypedTransaction::SetCode(ref tx) => tx.transaction.max_priority_fee_per_gas,
        }
    }

    /// Price per unit of gas the sender will actually pay under the given
    /// base fee: `min(tip_cap + base_fee, fee_cap)`, which equals the
    /// specified `min(tip_cap, fee_cap - base_fee) + base_fee` whenever the
    /// fee cap covers the base fee, and degrades to the fee cap otherwise.
    pub fn effective_gas_price(&self, base_fee: Option<U256>) -> U256 {
        match base_fee {
            None => self.max_fee_per_gas(),
            Some(base_fee) => match *self {
                TypedTransaction::Legacy(_) | TypedTransaction::AccessList(_) => {
                    self.tx().gas_price
                }
                _ => std::cmp::min(
                    self.max_priority_fee_per_gas().saturating_add(base_fee),
                    self.max_fee_per_gas(),
                ),
            },
        }
    }

    /// Tip actually received by the block producer under the given base fee.
    pub fn effective_priority_fee(&self, base_fee: Option<U256>) -> U256 {
        self.effective_gas_price(base_fee)
            .saturating_sub(base_fee.unwrap_or_default())
    }

    /// Whether the transaction creates a contract.
    pub fn is_create(&self) -> bool {
        self.tx().action == Action::Create
    }

    /// The minimum gas this transaction burns before any byte-code runs:
    /// the fixed base, the calldata cost, and the per-item access-list and
    /// authorization charges.
    pub fn gas_required(&self) -> u64 {
        const TX_GAS: u64 = 21_000;
        const TX_CREATE_GAS: u64 = 53_000;
        const DATA_ZERO_GAS: u64 = 4;
        const DATA_NON_ZERO_GAS: u64 = 16;
        const ACCESS_ADDRESS_GAS: u64 = 2_400;
        const ACCESS_KEY_GAS: u64 = 1_900;
        const AUTHORIZATION_GAS: u64 = 25_000;

        let base = if self.is_create() { TX_CREATE_GAS } else { TX_GAS };
        let data: u64 = self
            .tx()
            .data
            .iter()
            .map(|byte| {
                if *byte == 0 {
                    DATA_ZERO_GAS
                } else {
                    DATA_NON_ZERO_GAS
                }
            })
            .sum();
        let access = self.access_list().map_or(0, |list| {
            list.iter()
                .map(|item| {
                    ACCESS_ADDRESS_GAS + ACCESS_KEY_GAS * item.storage_keys.len() as u64
                })
                .sum()
        });
        let authorizations =
            self.authorization_list().map_or(0, |list| list.len() as u64) * AUTHORIZATION_GAS;
        base + data + access + authorizations
    }

    /// Hash for signing. `chain_id` only affects legacy transactions; the
    /// typed kinds embed theirs in the payload.
    pub fn signature_hash(&self, chain_id: Option<u64>) -> H256 {
        match *self {
            TypedTransaction::Legacy(ref tx) => tx.signature_hash(chain_id),
            _ => {
                let mut payload = vec![self.tx_type().as_byte()];
                let mut s = RlpStream::new();
                self.rlp_append_payload(&mut s, None)
                    .expect("variant invariants hold for constructed transactions; qed");
                payload.extend_from_slice(&s.out());
                keccak(payload)
            }
        }
    }

    fn rlp_append_payload(
        &self,
        s: &mut RlpStream,
        signature: Option<&SignatureComponents>,
    ) -> Result<(), DecoderError> {
        match *self {
            TypedTransaction::Legacy(_) => {
                Err(DecoderError::Custom("legacy transactions have no payload"))
            }
            TypedTransaction::AccessList(ref tx) => {
                tx.rlp_append_payload(s, signature);
                Ok(())
            }
            TypedTransaction::DynamicFee(ref tx) => {
                tx.rlp_append_payload(s, signature);
                Ok(())
            }
            TypedTransaction::Blob(ref tx) => tx.rlp_append_payload(s, signature),
            TypedTransaction::SetCode(ref tx) => tx.rlp_append_payload(s, signature),
        }
    }

    /// Sign the transaction with the given secret. For legacy transactions
    /// `chain_id` selects EIP-155 replay protection.
    pub fn sign(self, secret: &Secret, chain_id: Option<u64>) -> SignedTransaction {
        let chain_id = match self.chain_id() {
            Some(embedded) => Some(embedded),
            None => chain_id,
        };
        let signature = publickey::sign(secret, &self.signature_hash(chain_id))
            .expect("data is valid and context has signing capabilities; qed");
        SignedTransaction::new(self.with_signature(signature, chain_id))
            .expect("secret is valid so sender is recoverable; qed")
    }

    /// Attach signature components recovered elsewhere.
    pub fn with_signature(self, signature: Signature, chain_id: Option<u64>) -> UnverifiedTransaction {
        let components = SignatureComponents {
            standard_v: signature.v(),
            r: signature.r().into(),
            s: signature.s().into(),
        };
        UnverifiedTransaction::new(self, components, chain_id)
    }
}

/// Raw signature split into the standard parity bit and the two scalars.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignatureComponents {
    /// Parity bit, 0 or 1.
    pub standard_v: u8,
    /// The R field of the signature.
    pub r: U256,
    /// The S field of the signature.
    pub s: U256,
}

impl SignatureComponents {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.append(&self.standard_v);
        s.append(&self.r);
        s.append(&self.s);
    }

    fn decode_at(d: &Rlp, offset: usize) -> Result<Self, DecoderError> {
        let standard_v: u8 = d.val_at(offset)?;
        if standard_v > 1 {
            return Err(DecoderError::Custom("invalid signature parity bit"));
        }
        Ok(SignatureComponents {
            standard_v,
            r: d.val_at(offset + 1)?,
            s: d.val_at(offset + 2)?,
        })
    }

    /// The `v` field as a legacy wire value, with replay protection when a
    /// chain id is present (EIP-155).
    pub fn legacy_v(&self, chain_id: Option<u64>) -> u64 {
        match chain_id {
            Some(n) => self.standard_v as u64 + 35 + n * 2,
            None => self.standard_v as u64 + 27,
        }
    }

    fn split_legacy_v(v: u64) -> Result<(u8, Option<u64>), DecoderError> {
        match v {
            27 | 28 => Ok(((v - 27) as u8, None)),
            v if v >= 35 => Ok((((v - 35) % 2) as u8, Some((v - 35) / 2))),
            _ => Err(DecoderError::Custom("invalid signature v")),
        }
    }

    /// Whether both scalars are in range and non-zero.
    pub fn is_plausible(&self) -> bool {
        !self.r.is_zero() && !self.s.is_zero()
    }
}

/// A transaction carrying an unverified signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnverifiedTransaction {
    /// Plain transaction.
    pub unsigned: TypedTransaction,
    /// Signature.
    pub signature: SignatureComponents,
    /// EIP-155 chain id for legacy transactions, the embedded chain id for
    /// typed ones.
    pub chain_id: Option<u64>,
    /// Hash of the wire encoding.
    hash: H256,
}

impl Deref for UnverifiedTransaction {
    type Target = TypedTransaction;

    fn deref(&self) -> &Self::Target {
        &self.unsigned
    }
}

impl UnverifiedTransaction {
    /// Build from parts, computing the wire hash.
    pub fn new(
        unsigned: TypedTransaction,
        signature: SignatureComponents,
        chain_id: Option<u64>,
    ) -> Self {
        let mut tx = UnverifiedTransaction {
            unsigned,
            signature,
            chain_id,
            hash: H256::zero(),
        };
        tx.hash = keccak(tx.encode());
        tx
    }

    /// The transaction hash (keccak of the wire envelope).
    pub fn hash(&self) -> H256 {
        self.hash
    }

    /// Wire encoding: plain RLP for legacy, type byte plus payload RLP for
    /// typed transactions.
    pub fn encode(&self) -> Bytes {
        match self.unsigned {
            TypedTransaction::Legacy(ref tx) => {
                let mut s = RlpStream::new();
                tx.rlp_append_signed(&mut s, &self.signature, self.chain_id);
                s.out()
            }
            _ => {
                let mut out = vec![self.unsigned.tx_type().as_byte()];
                let mut s = RlpStream::new();
                self.unsigned
                    .rlp_append_payload(&mut s, Some(&self.signature))
                    .expect("constructed transactions satisfy variant invariants; qed");
                out.extend_from_slice(&s.out());
                out
            }
        }
    }

    /// Decode from a wire envelope.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecoderError> {
        let first = *bytes.first().ok_or(DecoderError::RlpIsTooShort)?;
        if first >= 0xc0 {
            return Self::decode_legacy(&Rlp::new(bytes));
        }
        Self::decode_typed(bytes)
    }

    /// Decode from a position inside an RLP list: legacy transactions are
    /// nested lists, typed ones are opaque strings.
    pub fn decode_rlp(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.is_list() {
            Self::decode_legacy(rlp)
        } else {
            Self::decode_typed(rlp.data()?)
        }
    }

    fn decode_legacy(d: &Rlp) -> Result<Self, DecoderError> {
        let (tx, signature, chain_id) = Transaction::decode_signed(d)?;
        Ok(UnverifiedTransaction::new(
            TypedTransaction::Legacy(tx),
            signature,
            chain_id,
        ))
    }

    fn decode_typed(bytes: &[u8]) -> Result<Self, DecoderError> {
        let id = TypedTxId::from_wire_byte(*bytes.first().ok_or(DecoderError::RlpIsTooShort)?)?;
        let d = Rlp::new(&bytes[1..]);
        let (unsigned, signature) = match id {
            TypedTxId::AccessList => {
                let (tx, sig) = AccessListTx::decode_payload(&d)?;
                (TypedTransaction::AccessList(tx), sig)
            }
            TypedTxId::DynamicFee => {
                let (tx, sig) = DynamicFeeTx::decode_payload(&d)?;
                (TypedTransaction::DynamicFee(tx), sig)
            }
            TypedTxId::Blob => {
                let (tx, sig) = BlobTx::decode_payload(&d)?;
                (TypedTransaction::Blob(tx), sig)
            }
            TypedTxId::SetCode => {
                let (tx, sig) = SetCodeTx::decode_payload(&d)?;
                (TypedTransaction::SetCode(tx), sig)
            }
            TypedTxId::Legacy => unreachable!("from_wire_byte rejects zero; qed"),
        };
        let chain_id = unsigned.chain_id();
        Ok(UnverifiedTransaction::new(unsigned, signature, chain_id))
    }

    /// Append to an RLP list as a block-body item.
    pub fn rlp_append(&self, s: &mut RlpStream) {
        match self.unsigned {
            TypedTransaction::Legacy(ref tx) => {
                tx.rlp_append_signed(s, &self.signature, self.chain_id)
            }
            _ => {
                s.append(&self.encode());
            }
        }
    }

    /// Recover the signing public key.
    pub fn recover_public(&self) -> Result<Public, publickey::Error> {
        if !self.signature.is_plausible() {
            return Err(publickey::Error::InvalidSignature);
        }
        let signature = Signature::from_rsv(
            &H256::from_uint(&self.signature.r),
            &H256::from_uint(&self.signature.s),
            self.signature.standard_v,
        );
        recover(&signature, &self.unsigned.signature_hash(self.chain_id))
    }

    /// Recover the sender address.
    pub fn recover_sender(&self) -> Result<Address, publickey::Error> {
        Ok(public_to_address(&self.recover_public()?))
    }
}

/// A transaction with a successfully recovered sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    transaction: UnverifiedTransaction,
    sender: Address,
    public: Option<Public>,
}

impl Deref for SignedTransaction {
    type Target = UnverifiedTransaction;

    fn deref(&self) -> &Self::Target {
        &self.transaction
    }
}

impl From<SignedTransaction> for UnverifiedTransaction {
    fn from(tx: SignedTransaction) -> Self {
        tx.transaction
    }
}

impl SignedTransaction {
    /// Try to verify transaction and recover sender.
    pub fn new(transaction: UnverifiedTransaction) -> Result<Self, publickey::Error> {
        let public = transaction.recover_public()?;
        let sender = public_to_address(&public);
        Ok(SignedTransaction {
            transaction,
            sender,
            public: Some(public),
        })
    }

    /// Build from an already-known sender, skipping recovery. Used when the
    /// senders stage has the signer cached.
    pub fn new_unchecked(transaction: UnverifiedTransaction, sender: Address) -> Self {
        SignedTransaction {
            transaction,
            sender,
            public: None,
        }
    }

    /// Returns transaction sender.
    pub fn sender(&self) -> Address {
        self.sender
    }

    /// Returns the public key of the sender, when recovered here.
    pub fn public_key(&self) -> Option<Public> {
        self.public
    }
}

/// Signed transaction with successfully recovered `sender`, located in a
/// canonical block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedTransaction {
    /// Signed part.
    pub signed: UnverifiedTransaction,
    /// Block number.
    pub block_number: BlockNumber,
    /// Block hash.
    pub block_hash: H256,
    /// Transaction index within block.
    pub transaction_index: usize,
    /// Cached sender.
    pub cached_sender: Option<Address>,
}

impl LocalizedTransaction {
    /// Returns transaction sender, recovering it if not cached.
    pub fn sender(&mut self) -> Address {
        if let Some(sender) = self.cached_sender {
            return sender;
        }
        let sender = self
            .signed
            .recover_sender()
            .expect("locally stored transactions were verified on import; qed");
        self.cached_sender = Some(sender);
        sender
    }
}

impl Deref for LocalizedTransaction {
    type Target = UnverifiedTransaction;

    fn deref(&self) -> &Self::Target {
        &self.signed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parity_crypto::publickey::{Generator, Random};

    fn legacy() -> TypedTransaction {
        TypedTransaction::Legacy(Transaction {
            nonce: 3.into(),
            gas_price: 100.into(),
            gas: 21_000.into(),
            action: Action::Call(Address::from_low_u64_be(0xd00d)),
            value: 10.into(),
            data: vec![],
        })
    }

    fn dynamic_fee(tip: u64, fee_cap: u64) -> TypedTransaction {
        TypedTransaction::DynamicFee(DynamicFeeTx {
            max_priority_fee_per_gas: tip.into(),
            transaction: AccessListTx {
                chain_id: 1,
                transaction: Transaction {
                    nonce: 0.into(),
                    gas_price: fee_cap.into(),
                    gas: 30_000.into(),
                    action: Action::Call(Address::from_low_u64_be(0xd00d)),
                    value: 0.into(),
                    data: vec![0, 1, 0, 2],
                },
                access_list: vec![AccessListItem {
                    address: Address::from_low_u64_be(1),
                    storage_keys: vec![H256::from_low_u64_be(7)],
                }],
            },
        })
    }

    #[test]
    fn legacy_sign_encode_decode_recover() {
        let keypair = Random.generate();
        let signed = legacy().sign(keypair.secret(), Some(1));
        let encoded = signed.encode();
        let decoded = UnverifiedTransaction::decode(&encoded).unwrap();
        assert_eq!(decoded.hash(), signed.hash());
        assert_eq!(decoded.chain_id, Some(1));
        assert_eq!(decoded.recover_sender().unwrap(), keypair.address());
    }

    #[test]
    fn pre_eip155_legacy_round_trip() {
        let keypair = Random.generate();
        let signed = legacy().sign(keypair.secret(), None);
        let decoded = UnverifiedTransaction::decode(&signed.encode()).unwrap();
        assert_eq!(decoded.chain_id, None);
        assert_eq!(decoded.recover_sender().unwrap(), keypair.address());
    }

    #[test]
    fn dynamic_fee_envelope_round_trip() {
        let keypair = Random.generate();
        let signed = dynamic_fee(2, 100).sign(keypair.secret(), None);
        let encoded = signed.encode();
        assert_eq!(encoded[0], 0x02);
        let decoded = UnverifiedTransaction::decode(&encoded).unwrap();
        assert_eq!(decoded.unsigned, signed.unsigned);
        assert_eq!(decoded.recover_sender().unwrap(), keypair.address());
    }

    #[test]
    fn blob_transaction_requires_recipient() {
        let tx = BlobTx {
            transaction: DynamicFeeTx {
                max_priority_fee_per_gas: 1.into(),
                transaction: AccessListTx {
                    chain_id: 1,
                    transaction: Transaction::default(),
                    access_list: vec![],
                },
            },
            max_fee_per_blob_gas: 1.into(),
            blob_versioned_hashes: vec![H256::from_low_u64_be(1)],
        };
        let mut s = RlpStream::new();
        assert!(tx.rlp_append_payload(&mut s, None).is_err());
    }

    #[test]
    fn effective_gas_price_honours_base_fee() {
        let tx = dynamic_fee(2, 100);
        // plenty of headroom: tip above base fee
        assert_eq!(tx.effective_gas_price(Some(10.into())), U256::from(12));
        // squeezed against the cap
        assert_eq!(tx.effective_gas_price(Some(99.into())), U256::from(100));
        // no base fee context
        assert_eq!(tx.effective_gas_price(None), U256::from(100));
        // legacy ignores the base fee
        assert_eq!(legacy().effective_gas_price(Some(7.into())), U256::from(100));
    }

    #[test]
    fn intrinsic_gas_charges_each_component() {
        // 2 zero bytes, 2 non-zero bytes, 1 access address, 1 storage key
        let tx = dynamic_fee(1, 1);
        assert_eq!(
            tx.gas_required(),
            21_000 + 2 * 4 + 2 * 16 + 2_400 + 1_900
        );
        assert_eq!(legacy().gas_required(), 21_000);
    }

    #[test]
    fn signature_hash_differs_per_chain() {
        let tx = legacy();
        assert_ne!(tx.signature_hash(Some(1)), tx.signature_hash(Some(2)));
        assert_ne!(tx.signature_hash(Some(1)), tx.signature_hash(None));
    }
}
