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

//! Finish stage: publish the canonical head.

use common_types::BlockNumber;
use embercore::client::FORKCHOICE_HEAD;
use embercore_kv::tables;
use log::info;

use crate::{Stage, StageContext, StageError, StageId};

/// Moves the head pointer once every earlier stage has processed a block.
pub struct FinishStage;

impl FinishStage {
    fn publish(ctx: &mut StageContext, number: BlockNumber) -> Result<(), StageError> {
        let hash = ctx
            .tx
            .get(tables::CANONICAL_HASHES, &embercore_kv::encode_number(number))?
            .ok_or(embercore_kv::Error::NotFound)?;
        ctx.tx.put(tables::FORKCHOICE, FORKCHOICE_HEAD, &hash)?;
        Ok(())
    }
}

impl Stage for FinishStage {
    fn id(&self) -> StageId {
        StageId::Finish
    }

    fn execute(
        &mut self,
        ctx: &mut StageContext,
        from: BlockNumber,
        to: BlockNumber,
    ) -> Result<BlockNumber, StageError> {
        if to > from {
            Self::publish(ctx, to)?;
            info!(target: "sync", "Imported to block #{}", to);
        }
        Ok(to)
    }

    fn unwind(&mut self, ctx: &mut StageContext, to: BlockNumber) -> Result<(), StageError> {
        Self::publish(ctx, to)
    }
}
