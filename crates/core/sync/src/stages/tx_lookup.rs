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

//! Transaction lookup stage: hash -> block number index.

use common_types::BlockNumber;
use embercore_kv::tables;

use super::read_body;
use crate::{Stage, StageContext, StageError, StageId};

/// Indexes every transaction hash to its containing block.
pub struct TxLookupStage;

impl Stage for TxLookupStage {
    fn id(&self) -> StageId {
        StageId::TxLookup
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
            let key = embercore_kv::encode_number(number);
            for tx in &body.transactions {
                ctx.tx
                    .put(tables::TX_LOOKUP, tx.hash().as_bytes(), &key)?;
            }
        }
        Ok(to)
    }

    fn unwind(&mut self, ctx: &mut StageContext, to: BlockNumber) -> Result<(), StageError> {
        // bodies are still present: this stage unwinds before the bodies
        // stage does
        let keys = embercore_kv::keys_from(
            ctx.tx.as_read(),
            tables::BODIES,
            &embercore_kv::encode_number(to + 1),
        )?;
        for key in keys {
            let number = embercore_kv::decode_number(&key)?;
            let body = read_body(ctx.tx.as_read(), number)?;
            for tx in &body.transactions {
                ctx.tx.delete(tables::TX_LOOKUP, tx.hash().as_bytes())?;
            }
        }
        Ok(())
    }
}
