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

//! Engine API interface, consumed by the consensus client.

use ethereum_types::{H256, H64, U64};
use jsonrpc_core::Result;
use jsonrpc_derive::rpc;

use crate::v1::types::{
    ExecutionPayload, ForkchoiceState, ForkchoiceUpdated, PayloadAttributes, PayloadBodyV1,
    PayloadStatus, PayloadV2,
};

/// Engine API interface.
#[rpc(server)]
pub trait Engine {
    /// Import a new payload.
    #[rpc(name = "engine_newPayloadV1")]
    fn new_payload_v1(&self, _: ExecutionPayload) -> Result<PayloadStatus>;

    /// Import a new payload with withdrawals.
    #[rpc(name = "engine_newPayloadV2")]
    fn new_payload_v2(&self, _: ExecutionPayload) -> Result<PayloadStatus>;

    /// Import a new payload with blob commitments and a beacon root.
    #[rpc(name = "engine_newPayloadV3")]
    fn new_payload_v3(
        &self,
        _: ExecutionPayload,
        _: Vec<H256>,
        _: H256,
    ) -> Result<PayloadStatus>;

    /// Update the forkchoice pointers, optionally starting a payload build.
    #[rpc(name = "engine_forkchoiceUpdatedV1")]
    fn forkchoice_updated_v1(
        &self,
        _: ForkchoiceState,
        _: Option<PayloadAttributes>,
    ) -> Result<ForkchoiceUpdated>;

    /// V2 of the forkchoice update.
    #[rpc(name = "engine_forkchoiceUpdatedV2")]
    fn forkchoice_updated_v2(
        &self,
        _: ForkchoiceState,
        _: Option<PayloadAttributes>,
    ) -> Result<ForkchoiceUpdated>;

    /// V3 of the forkchoice update.
    #[rpc(name = "engine_forkchoiceUpdatedV3")]
    fn forkchoice_updated_v3(
        &self,
        _: ForkchoiceState,
        _: Option<PayloadAttributes>,
    ) -> Result<ForkchoiceUpdated>;

    /// Fetch the payload being built, V1 shape.
    #[rpc(name = "engine_getPayloadV1")]
    fn get_payload_v1(&self, _: H64) -> Result<ExecutionPayload>;

    /// Fetch the payload being built with its value.
    #[rpc(name = "engine_getPayloadV2")]
    fn get_payload_v2(&self, _: H64) -> Result<PayloadV2>;

    /// V3 of the payload fetch.
    #[rpc(name = "engine_getPayloadV3")]
    fn get_payload_v3(&self, _: H64) -> Result<PayloadV2>;

    /// List the Engine API methods both sides support.
    #[rpc(name = "engine_exchangeCapabilities")]
    fn exchange_capabilities(&self, _: Vec<String>) -> Result<Vec<String>>;

    /// Bodies of the given blocks, by hash.
    #[rpc(name = "engine_getPayloadBodiesByHashV1")]
    fn payload_bodies_by_hash(&self, _: Vec<H256>) -> Result<Vec<Option<PayloadBodyV1>>>;

    /// Bodies of a range of canonical blocks.
    #[rpc(name = "engine_getPayloadBodiesByRangeV1")]
    fn payload_bodies_by_range(&self, _: U64, _: U64) -> Result<Vec<Option<PayloadBodyV1>>>;
}
