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

//! Execution stage: replay each block through the EVM against the state
//! overlay, verify the header commitments, and persist receipts and state
//! at monotonically increasing transaction numbers.

use common_types::{
    receipt::Receipt,
    transaction::SignedTransaction,
    BlockNumber,
};
use embercore::{
    commitment,
    error::ExecutionError,
    executive::Executive,
    state::{Domains, LatestReader, State},
};
use embercore_kv::{tables, ReadTransaction};
use ethereum_types::{Address, U256};
use log::{debug, trace};
use triehash_ethereum::ordered_trie_root;
use vm::{EnvInfo, Exec, NoopEvm};

use super::{read_body, read_header};
use crate::{Stage, StageContext, StageError, StageId};

/// Replays blocks and owns the write path into the temporal store.
pub struct ExecutionStage {
    domains: Domains,
    evm: Box<dyn Exec>,
}

impl ExecutionStage {
    /// Stage with the built-in interpreter adapter.
    pub fn new() -> Self {
        ExecutionStage {
            domains: Domains::default(),
            evm: Box::new(NoopEvm),
        }
    }

    fn senders_of(
        tx: &dyn ReadTransaction,
        number: BlockNumber,
        expected: usize,
    ) -> Result<Vec<Address>, StageError> {
        let raw = tx
            .get(tables::SENDERS, &embercore_kv::encode_number(number))?
            .ok_or(embercore_kv::Error::NotFound)?;
        if raw.len() != expected * 20 {
            return Err(embercore_kv::Error::CorruptedData(format!(
                "senders row of block {} has {} bytes, expected {}",
                number,
                raw.len(),
                expected * 20
            ))
            .into());
        }
        Ok(raw.chunks(20).map(Address::from_slice).collect())
    }

    fn max_tx_num(
        tx: &dyn ReadTransaction,
        number: BlockNumber,
    ) -> Result<u64, StageError> {
        let raw = tx
            .get(tables::MAX_TX_NUM, &embercore_kv::encode_number(number))?
            .ok_or(embercore_kv::Error::NotFound)?;
        Ok(embercore_kv::decode_number(&raw)?)
    }
}

impl Stage for ExecutionStage {
    fn id(&self) -> StageId {
        StageId::Execution
    }

    fn execute(
        &mut self,
        ctx: &mut StageContext,
        from: BlockNumber,
        to: BlockNumber,
    ) -> Result<BlockNumber, StageError> {
        let params = &ctx.spec.params;
        let mut progress = from;
        for number in from + 1..=to {
            if ctx.is_cancelled() {
                return Err(StageError::Cancelled);
            }
            let header = read_header(ctx.tx.as_read(), number)?;
            let body = read_body(ctx.tx.as_read(), number)?;
            let senders = Self::senders_of(ctx.tx.as_read(), number, body.transactions.len())?;
            let first_tx_num = Self::max_tx_num(ctx.tx.as_read(), number - 1)? + 1;

            let invalid = |error: embercore::Error| StageError::InvalidBlock { number, error };

            let reader = LatestReader::new(ctx.tx.as_read()).map_err(StageError::Core)?;
            let mut state = State::new(Box::new(reader));
            let env = EnvInfo {
                number: header.number,
                author: header.author,
                timestamp: header.timestamp,
                difficulty: header.difficulty,
                prevrandao: header.mix_digest,
                gas_limit: header.gas_limit,
                base_fee: header.base_fee_per_gas,
                chain_id: params.chain_id,
            };

            let mut receipts = Vec::with_capacity(body.transactions.len());
            let mut cumulative_gas = U256::zero();
            for (index, tx) in body.transactions.iter().enumerate() {
                let signed = SignedTransaction::new_unchecked(tx.clone(), senders[index]);
                let executed = {
                    let mut executive =
                        Executive::new(&mut state, &env, params, self.evm.as_ref());
                    executive.transact(&signed).map_err(&invalid)?
                };
                cumulative_gas = cumulative_gas + executed.gas_used;
                receipts.push(Receipt::new(
                    tx.unsigned.tx_type(),
                    executed.success,
                    cumulative_gas,
                    executed.logs,
                ));
                state
                    .commit(ctx.tx, &self.domains, first_tx_num + index as u64)
                    .map_err(StageError::Core)?;
                trace!(target: "sync", "executed tx {} of block {}", index, number);
            }

            // block epilogue: consensus rewards and withdrawals, settled at
            // a dedicated transaction number past the user transactions
            let engine = ctx.engines.engine_at(number);
            if !engine.is_pos(&header) {
                let reward = engine.block_reward(&header, &body.uncles);
                state
                    .balance_increase(&header.author, reward)
                    .map_err(StageError::Core)?;
                for uncle in &body.uncles {
                    let bonus = engine.uncle_reward(number, uncle.number);
                    if !bonus.is_zero() {
                        state
                            .balance_increase(&uncle.author, bonus)
                            .map_err(StageError::Core)?;
                    }
                }
            }
            if let Some(ref withdrawals) = body.withdrawals {
                for withdrawal in withdrawals {
                    state
                        .balance_increase(&withdrawal.address, withdrawal.amount_wei())
                        .map_err(StageError::Core)?;
                }
            }
            let epilogue_tx_num = first_tx_num + body.transactions.len() as u64;
            state
                .commit(ctx.tx, &self.domains, epilogue_tx_num)
                .map_err(StageError::Core)?;

            if cumulative_gas != header.gas_used {
                return Err(invalid(
                    ExecutionError::GasUsedMismatch {
                        number,
                        expected: header.gas_used,
                        got: cumulative_gas,
                    }
                    .into(),
                ));
            }
            let receipts_root = ordered_trie_root(receipts.iter().map(|r| r.encode()));
            if receipts_root != header.receipts_root {
                return Err(invalid(
                    ExecutionError::ReceiptRootMismatch {
                        number,
                        expected: header.receipts_root,
                        got: receipts_root,
                    }
                    .into(),
                ));
            }
            let state_root = commitment::state_root(ctx.tx.as_read()).map_err(StageError::Core)?;
            if state_root != header.state_root {
                debug!(target: "sync", "state root mismatch at block {}", number);
                return Err(invalid(
                    ExecutionError::StateRootMismatch {
                        number,
                        expected: header.state_root,
                        got: state_root,
                    }
                    .into(),
                ));
            }

            let key = embercore_kv::encode_number(number);
            ctx.tx
                .put(tables::BLOCK_RECEIPTS, &key, &Receipt::encode_list(&receipts))?;
            ctx.tx.put(
                tables::MAX_TX_NUM,
                &key,
                &embercore_kv::encode_number(epilogue_tx_num),
            )?;
            progress = number;
        }
        Ok(progress)
    }

    fn unwind(&mut self, ctx: &mut StageContext, to: BlockNumber) -> Result<(), StageError> {
        let target_tx_num = Self::max_tx_num(ctx.tx.as_read(), to)?;
        self.domains
            .accounts
            .unwind(ctx.tx, target_tx_num)
            .map_err(|e| StageError::Core(e.into()))?;
        self.domains
            .storage
            .unwind(ctx.tx, target_tx_num)
            .map_err(|e| StageError::Core(e.into()))?;
        super::clear_numbered_above(ctx.tx, tables::BLOCK_RECEIPTS, to)?;
        super::clear_numbered_above(ctx.tx, tables::MAX_TX_NUM, to)?;
        Ok(())
    }
}
