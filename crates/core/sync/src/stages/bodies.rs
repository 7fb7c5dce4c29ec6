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

//! Bodies stage: fetch bodies, verify them against the persisted headers,
//! and store them.

use common_types::BlockNumber;
use embercore::error::BlockError;
use embercore_kv::tables;
use ethereum_types::H256;
use log::trace;
use triehash_ethereum::ordered_trie_root;
use unexpected::Mismatch;

use super::{clear_numbered_above, read_header};
use crate::{Stage, StageContext, StageError, StageId};

/// Fetches each canonical block body and verifies the transaction,
/// withdrawal and uncle commitments before persisting it.
pub struct BodiesStage;

impl Stage for BodiesStage {
    fn id(&self) -> StageId {
        StageId::Bodies
    }

    fn execute(
        &mut self,
        ctx: &mut StageContext,
        from: BlockNumber,
        to: BlockNumber,
    ) -> Result<BlockNumber, StageError> {
        let mut progress = from;
        for number in from + 1..=to {
            if ctx.is_cancelled() {
                return Err(StageError::Cancelled);
            }
            let header = read_header(ctx.tx.as_read(), number)?;
            let hash = header.hash();
            let body = match ctx.source.body(&hash) {
                Some(body) => body,
                None => {
                    trace!(target: "sync", "bodies: {} not yet available", number);
                    break;
                }
            };

            let invalid = |error: BlockError| StageError::InvalidBlock {
                number,
                error: error.into(),
            };

            let tx_root = ordered_trie_root(body.transactions.iter().map(|tx| tx.encode()));
            if tx_root != header.transactions_root {
                return Err(invalid(BlockError::InvalidTransactionsRoot(Mismatch {
                    expected: header.transactions_root,
                    found: tx_root,
                })));
            }

            match (header.withdrawals_root, body.withdrawals.as_ref()) {
                (None, None) => {}
                (Some(expected), Some(withdrawals)) => {
                    let root: H256 =
                        ordered_trie_root(withdrawals.iter().map(|w| rlp::encode(w)));
                    if root != expected {
                        return Err(invalid(BlockError::InvalidWithdrawalsRoot(Mismatch {
                            expected,
                            found: root,
                        })));
                    }
                }
                (Some(expected), None) => {
                    return Err(invalid(BlockError::InvalidWithdrawalsRoot(Mismatch {
                        expected,
                        found: H256::zero(),
                    })));
                }
                (None, Some(_)) => {
                    return Err(invalid(BlockError::InvalidPoSBlock(
                        "withdrawals before Shanghai".into(),
                    )));
                }
            }

            let parent = read_header(ctx.tx.as_read(), number - 1)?;
            ctx.engines
                .verify_block(&header, &parent, &body.uncles)
                .map_err(invalid)?;

            ctx.tx.put(
                tables::BODIES,
                &embercore_kv::encode_number(number),
                &body.rlp_bytes(),
            )?;
            progress = number;
        }
        Ok(progress)
    }

    fn unwind(&mut self, ctx: &mut StageContext, to: BlockNumber) -> Result<(), StageError> {
        clear_numbered_above(ctx.tx, tables::BODIES, to)
    }
}
