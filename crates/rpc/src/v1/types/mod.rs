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

//! RPC serializable types.

mod block;
mod block_number;
mod bytes;
mod call_request;
mod fee_history;
mod filter;
mod payload;
mod receipt;
mod sync;
mod transaction;

pub use self::{
    block::{Block, BlockTransactions},
    block_number::BlockNumber,
    bytes::Bytes,
    call_request::CallRequest,
    fee_history::EthFeeHistory,
    filter::{Filter, FilterChanges, VariadicValue},
    payload::{
        ExecutionPayload, ForkchoiceState, ForkchoiceUpdated, PayloadAttributes, PayloadBodyV1,
        PayloadStatus, PayloadStatusKind, PayloadV2, RpcWithdrawal,
    },
    receipt::{Log, Receipt},
    sync::{SyncInfo, SyncStatus},
    transaction::Transaction,
};
