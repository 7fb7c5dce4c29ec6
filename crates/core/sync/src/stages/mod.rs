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

//! The seven stages, in pipeline order.

mod block_hashes;
mod bodies;
mod execution;
mod finish;
mod headers;
mod senders;
mod tx_lookup;

pub use self::{
    block_hashes::BlockHashesStage,
    bodies::BodiesStage,
    execution::ExecutionStage,
    finish::FinishStage,
    headers::HeadersStage,
    senders::SendersStage,
    tx_lookup::TxLookupStage,
};

use common_types::{block::BlockBody, header::Header, BlockNumber};
use embercore_kv::{tables, ReadTransaction, WriteTransaction};

use crate::{Stage, StageError};

/// The standard pipeline.
pub fn default_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(HeadersStage::new()),
        Box::new(BlockHashesStage),
        Box::new(BodiesStage),
        Box::new(SendersStage),
        Box::new(ExecutionStage::new()),
        Box::new(TxLookupStage),
        Box::new(FinishStage),
    ]
}

pub(crate) fn read_header(
    tx: &dyn ReadTransaction,
    number: BlockNumber,
) -> Result<Header, StageError> {
    let raw = tx
        .get(tables::HEADERS, &embercore_kv::encode_number(number))?
        .ok_or(embercore_kv::Error::NotFound)?;
    Ok(rlp::decode(&raw)
        .map_err(|e| embercore_kv::Error::CorruptedData(format!("header {}: {}", number, e)))?)
}

pub(crate) fn read_body(
    tx: &dyn ReadTransaction,
    number: BlockNumber,
) -> Result<BlockBody, StageError> {
    let raw = tx
        .get(tables::BODIES, &embercore_kv::encode_number(number))?
        .ok_or(embercore_kv::Error::NotFound)?;
    Ok(BlockBody::decode(&raw)
        .map_err(|e| embercore_kv::Error::CorruptedData(format!("body {}: {}", number, e)))?)
}

// Drop every row of a block-number-keyed table above `to`.
pub(crate) fn clear_numbered_above(
    tx: &mut dyn WriteTransaction,
    table: &str,
    to: BlockNumber,
) -> Result<(), StageError> {
    let keys = embercore_kv::keys_from(tx.as_read(), table, &embercore_kv::encode_number(to + 1))?;
    for key in keys {
        tx.delete(table, &key)?;
    }
    Ok(())
}
