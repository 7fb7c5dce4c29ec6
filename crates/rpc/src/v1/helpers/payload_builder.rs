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

//! Payload building: assemble the best pending transactions into a sealed
//! block. Execution runs against a scratch copy of the hot state so the
//! header commitments are exact without touching the live store.

use std::sync::Arc;

use common_types::{
    block::Block, header::Header, receipt::Receipt, withdrawal::Withdrawal,
};
use embercore::{
    commitment,
    executive::Executive,
    state::{Domains, LatestReader, State},
    Client,
};
use embercore_kv::{tables, KeyValueStore, MemoryStore};
use embercore_miner::TransactionQueue;
use ethereum_types::{Address, Bloom, H256, U256};
use keccak_hash::KECCAK_EMPTY_LIST_RLP;
use log::{debug, trace};
use triehash_ethereum::ordered_trie_root;
use vm::{EnvInfo, NoopEvm};

/// What the builder hands back to the Engine API.
pub struct BuiltPayload {
    /// The sealed block.
    pub block: Block,
    /// Fees the block earns its proposer.
    pub fees: U256,
}

/// Inputs distilled from the payload attributes.
pub struct BuildRequest {
    /// Timestamp of the new block.
    pub timestamp: u64,
    /// PREVRANDAO value.
    pub prev_randao: H256,
    /// Fee recipient.
    pub fee_recipient: Address,
    /// Withdrawals to apply.
    pub withdrawals: Option<Vec<Withdrawal>>,
    /// Parent beacon block root.
    pub parent_beacon_block_root: Option<H256>,
}

// Clone the state-bearing tables into a private scratch store.
fn scratch_store(client: &Client) -> Result<MemoryStore, embercore::Error> {
    let scratch = MemoryStore::new();
    let read = client.store().begin_read()?;
    let mut tx = scratch.begin_write()?;
    for table in &[
        tables::PLAIN_STATE,
        tables::PLAIN_STORAGE,
        tables::CODE,
        tables::MAX_TX_NUM,
    ] {
        let mut cursor = read.cursor(table)?;
        let mut entry = cursor.first();
        while let Some((key, value)) = entry {
            tx.put(table, &key, &value)?;
            entry = cursor.next();
        }
    }
    tx.commit()?;
    Ok(scratch)
}

/// Build a payload on top of the current head.
pub fn build(
    client: &Arc<Client>,
    pool: &TransactionQueue,
    request: BuildRequest,
) -> Result<BuiltPayload, embercore::Error> {
    let parent = client
        .block_header(common_types::ids::BlockId::Latest)
        .ok_or(embercore_kv::Error::NotFound)?;
    let params = client.spec().params.clone();
    let number = parent.number + 1;
    let base_fee = params.next_base_fee(&parent);

    let scratch = scratch_store(client)?;
    let mut tx = scratch.begin_write()?;
    let first_tx_num = tx
        .get(tables::MAX_TX_NUM, &embercore_kv::encode_number(parent.number))?
        .map(|raw| embercore_kv::decode_number(&raw))
        .transpose()?
        .unwrap_or(0)
        + 1;

    let domains = Domains::default();
    let reader = LatestReader::new(tx.as_read())?;
    let mut state = State::new(Box::new(reader));
    let env = EnvInfo {
        number,
        author: request.fee_recipient,
        timestamp: request.timestamp,
        difficulty: U256::zero(),
        prevrandao: request.prev_randao,
        gas_limit: parent.gas_limit,
        base_fee,
        chain_id: params.chain_id,
    };

    let mut included = Vec::new();
    let mut receipts: Vec<Receipt> = Vec::new();
    let mut cumulative = U256::zero();
    let mut fees = U256::zero();
    for candidate in pool.pending(base_fee, 1_024) {
        let signed = &candidate.signed;
        if cumulative + signed.unsigned.tx().gas > env.gas_limit {
            continue;
        }
        let executed = {
            let mut executive = Executive::new(&mut state, &env, &params, &NoopEvm);
            executive.transact(signed)
        };
        match executed {
            Ok(executed) => {
                cumulative = cumulative + executed.gas_used;
                fees = fees
                    + executed.gas_used * signed.unsigned.effective_priority_fee(base_fee);
                receipts.push(Receipt::new(
                    signed.unsigned.tx_type(),
                    executed.success,
                    cumulative,
                    executed.logs,
                ));
                state.commit(
                    tx.as_mut(),
                    &domains,
                    first_tx_num + included.len() as u64,
                )?;
                included.push(signed.clone());
            }
            Err(error) => {
                // a stale pool entry; leave it for the next cull
                trace!(target: "miner", "skipping pool transaction: {}", error);
            }
        }
    }

    if let Some(ref withdrawals) = request.withdrawals {
        for withdrawal in withdrawals {
            state.balance_increase(&withdrawal.address, withdrawal.amount_wei())?;
        }
    }
    state.commit(tx.as_mut(), &domains, first_tx_num + included.len() as u64)?;

    let header = Header {
        parent_hash: parent.hash(),
        uncles_hash: KECCAK_EMPTY_LIST_RLP,
        author: request.fee_recipient,
        state_root: commitment::state_root(tx.as_read())?,
        transactions_root: ordered_trie_root(included.iter().map(|t| t.encode())),
        receipts_root: ordered_trie_root(receipts.iter().map(|r| r.encode())),
        log_bloom: receipts.iter().fold(Bloom::default(), |mut bloom, r| {
            bloom.accrue_bloom(&r.log_bloom);
            bloom
        }),
        difficulty: U256::zero(),
        number,
        gas_limit: parent.gas_limit,
        gas_used: cumulative,
        timestamp: request.timestamp,
        extra_data: b"ember".to_vec(),
        mix_digest: request.prev_randao,
        nonce: Default::default(),
        base_fee_per_gas: base_fee,
        withdrawals_root: request
            .withdrawals
            .as_ref()
            .map(|ws| ordered_trie_root(ws.iter().map(|w| rlp::encode(w)))),
        blob_gas_used: if params.is_cancun(number) { Some(0) } else { None },
        excess_blob_gas: if params.is_cancun(number) { Some(0) } else { None },
        parent_beacon_block_root: request.parent_beacon_block_root,
        requests_hash: None,
    };
    tx.rollback();
    debug!(
        target: "miner",
        "built payload #{} with {} transactions, fees {}",
        number,
        included.len(),
        fees
    );

    Ok(BuiltPayload {
        block: Block {
            header,
            transactions: included.into_iter().map(Into::into).collect(),
            uncles: vec![],
            withdrawals: request.withdrawals,
        },
        fees,
    })
}
