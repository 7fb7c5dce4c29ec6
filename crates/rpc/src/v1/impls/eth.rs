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

//! Eth rpc implementation.

use std::sync::{atomic::Ordering, Arc};

use common_types::{ids::BlockId, transaction::UnverifiedTransaction};
use embercore::Client;
use embercore_miner::TransactionQueue;
use ethereum_types::{BigEndianHash, H160, H256, U256, U64};
use jsonrpc_core::Result;

use crate::v1::{
    helpers::{errors, FilterManager, PoolClientAdapter},
    traits::Eth,
    types::{
        Block, BlockNumber, Bytes, CallRequest, EthFeeHistory, Filter, FilterChanges, Receipt,
        SyncStatus, Transaction,
    },
};

/// Eth rpc implementation.
pub struct EthClient {
    client: Arc<Client>,
    pool: Arc<TransactionQueue>,
    pool_client: PoolClientAdapter,
    filters: Arc<FilterManager>,
}

impl EthClient {
    /// New eth handler over the read client and the pool.
    pub fn new(
        client: Arc<Client>,
        pool: Arc<TransactionQueue>,
        filters: Arc<FilterManager>,
    ) -> Self {
        EthClient {
            pool_client: PoolClientAdapter::new(client.clone()),
            client,
            pool,
            filters,
        }
    }

    fn id_of(&self, number: Option<BlockNumber>) -> BlockId {
        number.unwrap_or_default().into()
    }
}

impl Eth for EthClient {
    fn block_number(&self) -> Result<U256> {
        Ok(self.client.best_block_number().into())
    }

    fn chain_id(&self) -> Result<U64> {
        Ok(self.client.spec().params.chain_id.into())
    }

    fn syncing(&self) -> Result<SyncStatus> {
        let state = self.client.sync_state();
        if state.is_syncing() {
            Ok(SyncStatus::Info(crate::v1::types::SyncInfo {
                starting_block: 0.into(),
                current_block: state.current.load(Ordering::Relaxed).into(),
                highest_block: state.target.load(Ordering::Relaxed).into(),
            }))
        } else {
            Ok(SyncStatus::None)
        }
    }

    fn block_by_number(&self, number: BlockNumber, full: bool) -> Result<Option<Block>> {
        Ok(self
            .client
            .block(number.into())
            .map(|block| Block::new(&block, full)))
    }

    fn block_by_hash(&self, hash: H256, full: bool) -> Result<Option<Block>> {
        Ok(self
            .client
            .block(BlockId::Hash(hash))
            .map(|block| Block::new(&block, full)))
    }

    fn balance(&self, address: H160, number: Option<BlockNumber>) -> Result<U256> {
        self.client
            .balance(&address, self.id_of(number))
            .ok_or_else(errors::unknown_block)
    }

    fn code_at(&self, address: H160, number: Option<BlockNumber>) -> Result<Bytes> {
        let id = self.id_of(number);
        if self.client.resolve_block_id(id).is_none() {
            return Err(errors::unknown_block());
        }
        Ok(Bytes::new(self.client.code(&address, id).unwrap_or_default()))
    }

    fn storage_at(
        &self,
        address: H160,
        position: U256,
        number: Option<BlockNumber>,
    ) -> Result<H256> {
        let slot = H256::from_uint(&position);
        self.client
            .storage_at(&address, &slot, self.id_of(number))
            .ok_or_else(errors::unknown_block)
    }

    fn transaction_count(&self, address: H160, number: Option<BlockNumber>) -> Result<U256> {
        self.client
            .nonce(&address, self.id_of(number))
            .ok_or_else(errors::unknown_block)
    }

    fn transaction_by_hash(&self, hash: H256) -> Result<Option<Transaction>> {
        Ok(self
            .client
            .transaction(&hash)
            .map(Transaction::from_localized))
    }

    fn transaction_receipt(&self, hash: H256) -> Result<Option<Receipt>> {
        Ok(self.client.transaction_receipt(&hash).map(Into::into))
    }

    fn call(&self, request: CallRequest, number: Option<BlockNumber>) -> Result<Bytes> {
        let id = self.id_of(number);
        let sender = request.from.unwrap_or_default();
        let chain_id = self.client.spec().params.chain_id;
        let gas_limit = self
            .client
            .block_header(id)
            .ok_or_else(errors::unknown_block)?
            .gas_limit;
        let nonce = self.client.nonce(&sender, id).unwrap_or_default();
        let tx = request.into_transaction(chain_id, gas_limit, nonce);
        let executed = self
            .client
            .call(&tx, sender, id)
            .map_err(errors::internal)?;
        Ok(Bytes::new(executed.output))
    }

    fn estimate_gas(&self, request: CallRequest, number: Option<BlockNumber>) -> Result<U256> {
        let id = self.id_of(number);
        let sender = request.from.unwrap_or_default();
        let chain_id = self.client.spec().params.chain_id;
        let gas_limit = self
            .client
            .block_header(id)
            .ok_or_else(errors::unknown_block)?
            .gas_limit;
        let nonce = self.client.nonce(&sender, id).unwrap_or_default();
        let tx = request.into_transaction(chain_id, gas_limit, nonce);
        self.client
            .estimate_gas(&tx, sender, id)
            .map_err(errors::internal)
    }

    fn send_raw_transaction(&self, raw: Bytes) -> Result<H256> {
        let tx = UnverifiedTransaction::decode(&raw.0)
            .map_err(|e| errors::transaction_rejected(e.into()))?;
        self.pool
            .import(&self.pool_client, tx)
            .map_err(errors::transaction_rejected)
    }

    fn gas_price(&self) -> Result<U256> {
        Ok(self.client.gas_price_median(20))
    }

    fn max_priority_fee_per_gas(&self) -> Result<U256> {
        Ok(self.client.priority_fee_median(20))
    }

    fn fee_history(
        &self,
        block_count: U64,
        newest: BlockNumber,
        percentiles: Option<Vec<f64>>,
    ) -> Result<EthFeeHistory> {
        let newest = self
            .client
            .resolve_block_id(newest.into())
            .ok_or_else(errors::unknown_block)?;
        let count = block_count.as_u64().min(1_024).max(1);
        let oldest = newest.saturating_sub(count - 1);
        let mut base_fees = Vec::new();
        let mut gas_used_ratio = Vec::new();
        let mut rewards = Vec::new();
        for number in oldest..=newest {
            let header = self
                .client
                .block_header(BlockId::Number(number))
                .ok_or_else(errors::unknown_block)?;
            base_fees.push(header.base_fee_per_gas.unwrap_or_default());
            let ratio = if header.gas_limit.is_zero() {
                0.0
            } else {
                header.gas_used.low_u64() as f64 / header.gas_limit.low_u64() as f64
            };
            gas_used_ratio.push(ratio);
            if let Some(ref percentiles) = percentiles {
                let mut tips: Vec<U256> = self
                    .client
                    .block_body(BlockId::Number(number))
                    .map(|body| {
                        body.transactions
                            .iter()
                            .map(|tx| {
                                tx.unsigned.effective_priority_fee(header.base_fee_per_gas)
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                tips.sort();
                let row = percentiles
                    .iter()
                    .map(|p| {
                        if tips.is_empty() {
                            U256::zero()
                        } else {
                            let index = ((tips.len() - 1) as f64 * p / 100.0).round() as usize;
                            tips[index.min(tips.len() - 1)]
                        }
                    })
                    .collect();
                rewards.push(row);
            }
        }
        // project the next block's base fee past the newest header
        if let Some(header) = self.client.block_header(BlockId::Number(newest)) {
            base_fees.push(
                self.client
                    .spec()
                    .params
                    .next_base_fee(&header)
                    .unwrap_or_default(),
            );
        }
        Ok(EthFeeHistory {
            oldest_block: oldest.into(),
            base_fee_per_gas: base_fees,
            gas_used_ratio,
            reward: percentiles.map(|_| rewards),
        })
    }

    fn new_filter(&self, filter: Filter) -> Result<U256> {
        Ok(self.filters.new_filter(filter.into()))
    }

    fn new_block_filter(&self) -> Result<U256> {
        Ok(self.filters.new_block_filter())
    }

    fn filter_changes(&self, id: U256) -> Result<FilterChanges> {
        self.filters.poll(id).ok_or_else(errors::filter_not_found)
    }
}
