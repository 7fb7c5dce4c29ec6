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

use std::collections::HashMap;

use common_types::transaction::{
    self, AccessListTx, Action, DynamicFeeTx, SignedTransaction, Transaction, TypedTransaction,
    UnverifiedTransaction,
};
use ethereum_types::{Address, U256};
use parity_crypto::publickey::{Generator, KeyPair, Random};
use parking_lot::Mutex;

use super::{
    client::{AccountDetails, Client},
    queue::TransactionQueue,
    Options,
};

#[derive(Clone)]
struct Tx {
    nonce: u64,
    gas: u64,
    gas_price: u64,
    value: u64,
}

impl Default for Tx {
    fn default() -> Self {
        Tx {
            nonce: 0,
            gas: 21_000,
            gas_price: 100,
            value: 100,
        }
    }
}

impl Tx {
    fn gas_price(gas_price: u64) -> Self {
        Tx {
            gas_price,
            ..Default::default()
        }
    }

    fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    fn unsigned(&self) -> TypedTransaction {
        TypedTransaction::Legacy(Transaction {
            nonce: self.nonce.into(),
            gas_price: self.gas_price.into(),
            gas: self.gas.into(),
            action: Action::Call(Address::from_low_u64_be(0xd00d)),
            value: self.value.into(),
            data: vec![],
        })
    }

    fn signed_by(&self, keypair: &KeyPair) -> SignedTransaction {
        self.unsigned().sign(keypair.secret(), None)
    }

    fn dynamic_by(&self, keypair: &KeyPair, tip: u64) -> SignedTransaction {
        TypedTransaction::DynamicFee(DynamicFeeTx {
            max_priority_fee_per_gas: tip.into(),
            transaction: AccessListTx {
                chain_id: 1337,
                transaction: Transaction {
                    nonce: self.nonce.into(),
                    gas_price: self.gas_price.into(),
                    gas: self.gas.into(),
                    action: Action::Call(Address::from_low_u64_be(0xd00d)),
                    value: self.value.into(),
                    data: vec![],
                },
                access_list: vec![],
            },
        })
        .sign(keypair.secret(), None)
    }
}

#[derive(Default)]
struct TestClient {
    nonces: Mutex<HashMap<Address, U256>>,
    balance: U256,
    base_fee: Option<U256>,
}

impl TestClient {
    fn rich() -> Self {
        TestClient {
            nonces: Mutex::new(HashMap::new()),
            balance: U256::from(1_000_000_000_000u64),
            base_fee: None,
        }
    }

    fn set_nonce(&self, address: Address, nonce: u64) {
        self.nonces.lock().insert(address, nonce.into());
    }
}

impl Client for TestClient {
    fn account_details(&self, address: &Address) -> AccountDetails {
        AccountDetails {
            nonce: self
                .nonces
                .lock()
                .get(address)
                .copied()
                .unwrap_or_default(),
            balance: self.balance,
        }
    }

    fn block_gas_limit(&self) -> U256 {
        30_000_000.into()
    }

    fn base_fee(&self) -> Option<U256> {
        self.base_fee
    }
}

fn queue() -> TransactionQueue {
    TransactionQueue::new(Options {
        max_count: 4,
        max_per_sender: 4,
        minimal_gas_price: 10.into(),
        max_age_secs: 3_600,
    })
}

fn unverified(signed: SignedTransaction) -> UnverifiedTransaction {
    signed.into()
}

#[test]
fn admits_and_reports_pending() {
    let q = queue();
    let client = TestClient::rich();
    let keypair = Random.generate();
    let hash = q
        .import(&client, unverified(Tx::default().signed_by(&keypair)))
        .unwrap();
    assert!(q.find(&hash).is_some());
    let status = q.status();
    assert_eq!(status.pending, 1);
    assert_eq!(status.queued, 0);
}

#[test]
fn duplicate_import_is_rejected() {
    let q = queue();
    let client = TestClient::rich();
    let keypair = Random.generate();
    let tx = Tx::default().signed_by(&keypair);
    q.import(&client, unverified(tx.clone())).unwrap();
    assert_eq!(
        q.import(&client, unverified(tx)),
        Err(transaction::Error::AlreadyImported)
    );
}

#[test]
fn replacement_requires_ten_percent_bump() {
    let q = queue();
    let client = TestClient::rich();
    let keypair = Random.generate();

    let first = q
        .import(&client, unverified(Tx::gas_price(100).signed_by(&keypair)))
        .unwrap();

    // 105 < 110: underpriced, resident stays
    assert_eq!(
        q.import(&client, unverified(Tx::gas_price(105).signed_by(&keypair))),
        Err(transaction::Error::Underpriced)
    );
    assert!(q.find(&first).is_some());

    // exactly 110%: replaces
    let second = q
        .import(&client, unverified(Tx::gas_price(110).signed_by(&keypair)))
        .unwrap();
    assert!(q.find(&first).is_none());
    assert!(q.find(&second).is_some());
    assert_eq!(q.status().pending, 1);
}

#[test]
fn future_nonces_queue_and_promote() {
    let q = queue();
    let client = TestClient::rich();
    let keypair = Random.generate();

    q.import(&client, unverified(Tx::default().nonce(2).signed_by(&keypair)))
        .unwrap();
    let status = q.status();
    assert_eq!((status.pending, status.queued), (0, 1));

    q.import(&client, unverified(Tx::default().nonce(0).signed_by(&keypair)))
        .unwrap();
    q.import(&client, unverified(Tx::default().nonce(1).signed_by(&keypair)))
        .unwrap();
    // the gap closed at import time
    let status = q.status();
    assert_eq!((status.pending, status.queued), (3, 0));

    // two mined: cull drops them and keeps the rest pending
    client.set_nonce(keypair.address(), 2);
    q.cull(&client);
    let status = q.status();
    assert_eq!((status.pending, status.queued), (1, 0));
}

#[test]
fn nonce_below_account_is_rejected() {
    let q = queue();
    let client = TestClient::rich();
    let keypair = Random.generate();
    client.set_nonce(keypair.address(), 5);
    assert!(matches!(
        q.import(&client, unverified(Tx::default().nonce(4).signed_by(&keypair))),
        Err(transaction::Error::NonceTooLow { .. })
    ));
}

#[test]
fn cheap_transactions_are_evicted_when_full() {
    let q = queue();
    let client = TestClient::rich();
    let mut hashes = Vec::new();
    for price in &[20u64, 30, 40, 50] {
        let keypair = Random.generate();
        hashes.push(
            q.import(&client, unverified(Tx::gas_price(*price).signed_by(&keypair)))
                .unwrap(),
        );
    }
    // a cheaper newcomer bounces
    let keypair = Random.generate();
    assert_eq!(
        q.import(&client, unverified(Tx::gas_price(15).signed_by(&keypair))),
        Err(transaction::Error::PoolFull)
    );
    // a richer newcomer evicts the cheapest resident
    let keypair = Random.generate();
    q.import(&client, unverified(Tx::gas_price(60).signed_by(&keypair)))
        .unwrap();
    assert!(q.find(&hashes[0]).is_none());
    assert_eq!(q.status().pending, 4);
}

#[test]
fn per_sender_cap_is_enforced() {
    let q = queue();
    let client = TestClient::rich();
    let keypair = Random.generate();
    for nonce in 0..4u64 {
        q.import(
            &client,
            unverified(Tx::gas_price(50).nonce(nonce).signed_by(&keypair)),
        )
        .unwrap();
    }
    assert_eq!(
        q.import(
            &client,
            unverified(Tx::gas_price(50).nonce(4).signed_by(&keypair))
        ),
        Err(transaction::Error::TooManyFromSender { limit: 4 })
    );
}

#[test]
fn gas_price_floor_applies() {
    let q = queue();
    let client = TestClient::rich();
    let keypair = Random.generate();
    assert!(matches!(
        q.import(&client, unverified(Tx::gas_price(5).signed_by(&keypair))),
        Err(transaction::Error::GasPriceTooLow { .. })
    ));
}

#[test]
fn pending_orders_senders_by_price() {
    let q = queue();
    let client = TestClient::rich();
    let cheap = Random.generate();
    let rich = Random.generate();
    q.import(&client, unverified(Tx::gas_price(20).signed_by(&cheap)))
        .unwrap();
    q.import(&client, unverified(Tx::gas_price(90).signed_by(&rich)))
        .unwrap();
    let pending = q.pending(None, 10);
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].sender(), rich.address());
    assert_eq!(pending[1].sender(), cheap.address());
}

#[test]
fn dynamic_fee_effective_price_drives_replacement() {
    let q = queue();
    let client = TestClient {
        base_fee: Some(10.into()),
        ..TestClient::rich()
    };
    let keypair = Random.generate();
    // fee cap 100, tip 10: effective 20 under base fee 10
    q.import(&client, unverified(Tx::gas_price(100).dynamic_by(&keypair, 10)))
        .unwrap();
    // tip 11 gives effective 21 < 22: not enough
    assert_eq!(
        q.import(&client, unverified(Tx::gas_price(100).dynamic_by(&keypair, 11))),
        Err(transaction::Error::Underpriced)
    );
    // tip 12 gives effective 22 = 110% of 20: replaces
    q.import(&client, unverified(Tx::gas_price(100).dynamic_by(&keypair, 12)))
        .unwrap();
}
