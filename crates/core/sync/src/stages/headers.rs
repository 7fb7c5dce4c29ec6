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

//! Headers stage: download, chain, validate and persist headers.

use common_types::BlockNumber;
use embercore_kv::tables;
use log::{debug, trace};

use super::read_header;
use crate::{Stage, StageContext, StageError, StageId};

const BATCH: usize = 512;

/// Downloads headers and verifies each against its parent and the engine
/// in charge of its height.
pub struct HeadersStage {
    batch: usize,
}

impl HeadersStage {
    /// Stage with the default batch size.
    pub fn new() -> Self {
        HeadersStage { batch: BATCH }
    }

    // Walk back from `from` until the stored chain and the source agree,
    // reporting the first divergent height.
    fn locate_divergence(
        &self,
        ctx: &StageContext,
        from: BlockNumber,
    ) -> Result<StageError, StageError> {
        let mut number = from;
        while number > 0 {
            let ours = read_header(ctx.tx.as_read(), number)?;
            let theirs = ctx.source.headers(number, 1);
            match theirs.first() {
                // the source cannot serve this depth; treat the tip as the
                // divergent height and let the driver retry later
                None => break,
                Some(header) if header.hash() == ours.hash() => {
                    return Ok(StageError::Divergence { number: number + 1 });
                }
                Some(_) => number -= 1,
            }
        }
        Ok(StageError::Divergence { number: 1 })
    }
}

impl Stage for HeadersStage {
    fn id(&self) -> StageId {
        StageId::Headers
    }

    fn execute(
        &mut self,
        ctx: &mut StageContext,
        from: BlockNumber,
        to: BlockNumber,
    ) -> Result<BlockNumber, StageError> {
        let mut progress = from;
        let mut parent = read_header(ctx.tx.as_read(), from)?;
        while progress < to {
            if ctx.is_cancelled() {
                return Err(StageError::Cancelled);
            }
            let want = ((to - progress) as usize).min(self.batch);
            let batch = ctx.source.headers(progress + 1, want);
            if batch.is_empty() {
                trace!(target: "sync", "headers: source dry at {}", progress);
                break;
            }
            for header in batch {
                if header.number != progress + 1 {
                    debug!(
                        target: "sync",
                        "headers: non-consecutive header {} (wanted {})",
                        header.number,
                        progress + 1
                    );
                    return Ok(progress);
                }
                if header.parent_hash != parent.hash() {
                    return Err(self.locate_divergence(ctx, progress)?);
                }
                let engine = ctx.engines.engine_at(header.number);
                engine
                    .validate_header(&header, &parent)
                    .map_err(|error| StageError::InvalidBlock {
                        number: header.number,
                        error: error.into(),
                    })?;
                engine
                    .verify_seal(&header)
                    .map_err(|error| StageError::InvalidBlock {
                        number: header.number,
                        error: error.into(),
                    })?;
                let key = embercore_kv::encode_number(header.number);
                ctx.tx.put(tables::HEADERS, &key, &header.rlp())?;
                ctx.tx
                    .put(tables::HEADER_NUMBERS, header.hash().as_bytes(), &key)?;
                progress = header.number;
                parent = header;
            }
        }
        Ok(progress)
    }

    fn unwind(&mut self, ctx: &mut StageContext, to: BlockNumber) -> Result<(), StageError> {
        let keys = embercore_kv::keys_from(
            ctx.tx.as_read(),
            tables::HEADERS,
            &embercore_kv::encode_number(to + 1),
        )?;
        for key in keys {
            if let Some(raw) = ctx.tx.get(tables::HEADERS, &key)? {
                let header: common_types::header::Header = rlp::decode(&raw)
                    .map_err(|e| embercore_kv::Error::CorruptedData(format!("header: {}", e)))?;
                ctx.tx
                    .delete(tables::HEADER_NUMBERS, header.hash().as_bytes())?;
            }
            ctx.tx.delete(tables::HEADERS, &key)?;
        }
        Ok(())
    }
}
