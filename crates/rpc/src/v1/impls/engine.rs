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

//! Engine API implementation. Structural validation happens here; the
//! heavy lifting (execution, state commitment) stays with the sync driver,
//! which this handler only feeds.

use std::{collections::HashMap, sync::Arc};

use common_types::{block::Block, ids::BlockId};
use crossbeam_channel::Sender;
use embercore::Client;
use embercore_miner::TransactionQueue;
use embercore_sync::{DriverMessage, MemorySource};
use ethereum_types::{H256, H64, U64};
use jsonrpc_core::Result;
use keccak_hash::keccak;
use log::{debug, info};
use parking_lot::Mutex;

use crate::v1::{
    helpers::{
        errors,
        payload_builder::{self, BuildRequest, BuiltPayload},
    },
    traits::Engine,
    types::{
        Bytes, ExecutionPayload, ForkchoiceState, ForkchoiceUpdated, PayloadAttributes,
        PayloadBodyV1, PayloadStatus, PayloadV2,
    },
};

const CAPABILITIES: &[&str] = &[
    "engine_newPayloadV1",
    "engine_newPayloadV2",
    "engine_newPayloadV3",
    "engine_forkchoiceUpdatedV1",
    "engine_forkchoiceUpdatedV2",
    "engine_forkchoiceUpdatedV3",
    "engine_getPayloadV1",
    "engine_getPayloadV2",
    "engine_getPayloadV3",
    "engine_exchangeCapabilities",
    "engine_getPayloadBodiesByHashV1",
    "engine_getPayloadBodiesByRangeV1",
];

/// Engine API implementation.
pub struct EngineClient {
    client: Arc<Client>,
    source: Arc<MemorySource>,
    driver: Sender<DriverMessage>,
    pool: Arc<TransactionQueue>,
    payloads: Mutex<HashMap<H64, BuiltPayload>>,
}

impl EngineClient {
    /// New engine handler feeding the given source and driver queue.
    pub fn new(
        client: Arc<Client>,
        source: Arc<MemorySource>,
        driver: Sender<DriverMessage>,
        pool: Arc<TransactionQueue>,
    ) -> Self {
        EngineClient {
            client,
            source,
            driver,
            pool,
            payloads: Mutex::new(HashMap::new()),
        }
    }

    fn import_payload(
        &self,
        payload: ExecutionPayload,
        parent_beacon_root: Option<H256>,
    ) -> PayloadStatus {
        let block = match payload.try_into_block(parent_beacon_root) {
            Ok(block) => block,
            Err(reason) => {
                debug!(target: "engine", "malformed payload: {}", reason);
                return PayloadStatus::invalid(None, reason);
            }
        };
        let hash = block.header.hash();
        let parent = block.header.parent_hash;

        // already canonical and executed
        if let Some(number) = self.client.block_number_of(&hash) {
            if number <= self.client.best_block_number() {
                return PayloadStatus::valid(hash);
            }
        }

        let parent_known = self.client.block_number_of(&parent).is_some()
            || self.source.header_by_hash(&parent).is_some();
        self.source.insert_block(block);
        let _ = self.driver.send(DriverMessage::NewBlocks);
        if parent_known {
            PayloadStatus::syncing()
        } else {
            PayloadStatus::accepted()
        }
    }

    fn forkchoice(
        &self,
        state: ForkchoiceState,
        attributes: Option<PayloadAttributes>,
    ) -> Result<ForkchoiceUpdated> {
        info!(target: "engine", "forkchoice update to head {:?}", state.head_block_hash);
        let _ = self.driver.send(DriverMessage::Forkchoice {
            head: state.head_block_hash,
            safe: if state.safe_block_hash.is_zero() {
                None
            } else {
                Some(state.safe_block_hash)
            },
            finalized: if state.finalized_block_hash.is_zero() {
                None
            } else {
                Some(state.finalized_block_hash)
            },
        });

        let head_is_canonical = self
            .client
            .block_number_of(&state.head_block_hash)
            .map_or(false, |number| number <= self.client.best_block_number());
        let payload_status = if head_is_canonical {
            PayloadStatus::valid(state.head_block_hash)
        } else {
            PayloadStatus::syncing()
        };

        let payload_id = match attributes {
            None => None,
            Some(attributes) => {
                let request = BuildRequest {
                    timestamp: attributes.timestamp.as_u64(),
                    prev_randao: attributes.prev_randao,
                    fee_recipient: attributes.suggested_fee_recipient,
                    withdrawals: attributes
                        .withdrawals
                        .map(|ws| ws.into_iter().map(Into::into).collect()),
                    parent_beacon_block_root: attributes.parent_beacon_block_root,
                };
                let built =
                    payload_builder::build(&self.client, &self.pool, request)
                        .map_err(errors::internal)?;
                let id = payload_id(&state.head_block_hash, &built.block);
                self.payloads.lock().insert(id, built);
                Some(id)
            }
        };
        Ok(ForkchoiceUpdated {
            payload_status,
            payload_id,
        })
    }

    fn body_of(&self, block: Block) -> PayloadBodyV1 {
        PayloadBodyV1 {
            transactions: block
                .transactions
                .iter()
                .map(|tx| Bytes::new(tx.encode()))
                .collect(),
            withdrawals: block
                .withdrawals
                .as_ref()
                .map(|ws| ws.iter().map(Into::into).collect()),
        }
    }
}

fn payload_id(head: &H256, block: &Block) -> H64 {
    let mut preimage = head.as_bytes().to_vec();
    preimage.extend_from_slice(block.header.hash().as_bytes());
    H64::from_slice(&keccak(preimage).as_bytes()[..8])
}

impl Engine for EngineClient {
    fn new_payload_v1(&self, payload: ExecutionPayload) -> Result<PayloadStatus> {
        Ok(self.import_payload(payload, None))
    }

    fn new_payload_v2(&self, payload: ExecutionPayload) -> Result<PayloadStatus> {
        Ok(self.import_payload(payload, None))
    }

    fn new_payload_v3(
        &self,
        payload: ExecutionPayload,
        _blob_hashes: Vec<H256>,
        parent_beacon_root: H256,
    ) -> Result<PayloadStatus> {
        Ok(self.import_payload(payload, Some(parent_beacon_root)))
    }

    fn forkchoice_updated_v1(
        &self,
        state: ForkchoiceState,
        attributes: Option<PayloadAttributes>,
    ) -> Result<ForkchoiceUpdated> {
        self.forkchoice(state, attributes)
    }

    fn forkchoice_updated_v2(
        &self,
        state: ForkchoiceState,
        attributes: Option<PayloadAttributes>,
    ) -> Result<ForkchoiceUpdated> {
        self.forkchoice(state, attributes)
    }

    fn forkchoice_updated_v3(
        &self,
        state: ForkchoiceState,
        attributes: Option<PayloadAttributes>,
    ) -> Result<ForkchoiceUpdated> {
        self.forkchoice(state, attributes)
    }

    fn get_payload_v1(&self, id: H64) -> Result<ExecutionPayload> {
        self.payloads
            .lock()
            .get(&id)
            .map(|built| ExecutionPayload::from_block(&built.block))
            .ok_or_else(errors::unknown_payload)
    }

    fn get_payload_v2(&self, id: H64) -> Result<PayloadV2> {
        self.payloads
            .lock()
            .get(&id)
            .map(|built| PayloadV2 {
                execution_payload: ExecutionPayload::from_block(&built.block),
                block_value: built.fees,
            })
            .ok_or_else(errors::unknown_payload)
    }

    fn get_payload_v3(&self, id: H64) -> Result<PayloadV2> {
        self.get_payload_v2(id)
    }

    fn exchange_capabilities(&self, _peer: Vec<String>) -> Result<Vec<String>> {
        Ok(CAPABILITIES.iter().map(|s| s.to_string()).collect())
    }

    fn payload_bodies_by_hash(&self, hashes: Vec<H256>) -> Result<Vec<Option<PayloadBodyV1>>> {
        Ok(hashes
            .into_iter()
            .map(|hash| {
                self.client
                    .block(BlockId::Hash(hash))
                    .map(|block| self.body_of(block))
            })
            .collect())
    }

    fn payload_bodies_by_range(
        &self,
        start: U64,
        count: U64,
    ) -> Result<Vec<Option<PayloadBodyV1>>> {
        let start = start.as_u64();
        let count = count.as_u64().min(1_024);
        Ok((start..start + count)
            .map(|number| {
                self.client
                    .block(BlockId::Number(number))
                    .map(|block| self.body_of(block))
            })
            .collect())
    }
}
