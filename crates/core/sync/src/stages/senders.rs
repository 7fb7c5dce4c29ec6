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

//! Senders stage: recover and cache every transaction signer.

use common_types::{transaction, BlockNumber};
use embercore_kv::tables;

use super::{clear_numbered_above, read_body};
use crate::{Stage, StageContext, StageError, StageId};

/// ECDSA-recovers the sender of each transaction and stores them as one
/// concatenated row per block, sparing execution the expensive recovery.
pub struct SendersStage;

impl Stage for SendersStage {
    fn id(&self) -> StageId {
        StageId::Senders
    }

    fn execute(
        &mut self,
        ctx: &mut StageContext,
        from: BlockNumber,
        to: BlockNumber,
    ) -> Result<BlockNumber, StageError> {
        for number in from + 1..=to {
            if ctx.is_cancelled() {
                return Err(StageError::Cancelled);
            }
            let body = read_body(ctx.tx.as_read(), number)?;
            let mut senders = Vec::with_capacity(body.transactions.len() * 20);
            for tx in &body.transactions {
                let sender = tx.recover_sender().map_err(|e| StageError::InvalidBlock {
                    number,
                    error: embercore::Error::Transaction(transaction::Error::from(e)),
                })?;
                senders.extend_from_slice(sender.as_bytes());
            }
            ctx.tx.put(
                tables::SENDERS,
                &embercore_kv::encode_number(number),
                &senders,
            )?;
        }
        Ok(to)
    }

    fn unwind(&mut self, ctx: &mut StageContext, to: BlockNumber) -> Result<(), StageError> {
        clear_numbered_above(ctx.tx, tables::SENDERS, to)
    }
}
