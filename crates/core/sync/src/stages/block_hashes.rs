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

//! Block hashes stage: the canonical number -> hash bijection.

use common_types::BlockNumber;
use embercore_kv::tables;

use super::{clear_numbered_above, read_header};
use crate::{Stage, StageContext, StageError, StageId};

/// Maintains `CanonicalHashes` from the persisted headers.
pub struct BlockHashesStage;

impl Stage for BlockHashesStage {
    fn id(&self) -> StageId {
        StageId::BlockHashes
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
            let header = read_header(ctx.tx.as_read(), number)?;
            ctx.tx.put(
                tables::CANONICAL_HASHES,
                &embercore_kv::encode_number(number),
                header.hash().as_bytes(),
            )?;
        }
        Ok(to)
    }

    fn unwind(&mut self, ctx: &mut StageContext, to: BlockNumber) -> Result<(), StageError> {
        clear_numbered_above(ctx.tx, tables::CANONICAL_HASHES, to)
    }
}
