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

//! Staged sync: an ordered list of resumable stages, each persisting its
//! own progress, driven forward by the pipeline and rewound on
//! reorganisation.

#![warn(missing_docs)]

pub mod pipeline;
pub mod source;
pub mod stages;

pub use crate::{
    pipeline::Pipeline,
    source::{BlockSource, MemorySource},
};

use std::{error, fmt, sync::atomic::AtomicBool};

use common_types::BlockNumber;
use embercore::{engines::EngineSelector, spec::Spec};
use embercore_kv::{tables, ReadTransaction, WriteTransaction};
use ethereum_types::H256;

/// Work the Engine API enqueues for the driver thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverMessage {
    /// The consensus layer moved its pointers; sync towards the head and
    /// persist the safe/finalized marks.
    Forkchoice {
        /// New head hash.
        head: H256,
        /// Safe block hash, when advertised.
        safe: Option<H256>,
        /// Finalized block hash, when advertised.
        finalized: Option<H256>,
    },
    /// New payloads landed in the source; extend towards its tip.
    NewBlocks,
    /// Shut the driver down.
    Shutdown,
}

/// Identifier of a sync stage, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    /// Download and chain headers.
    Headers,
    /// Maintain the number -> hash bijection.
    BlockHashes,
    /// Download and verify bodies.
    Bodies,
    /// Recover transaction senders.
    Senders,
    /// Execute transactions and commit state.
    Execution,
    /// Index transaction hashes.
    TxLookup,
    /// Publish the new head.
    Finish,
}

impl StageId {
    /// Every stage, in execution order.
    pub const ALL: [StageId; 7] = [
        StageId::Headers,
        StageId::BlockHashes,
        StageId::Bodies,
        StageId::Senders,
        StageId::Execution,
        StageId::TxLookup,
        StageId::Finish,
    ];

    /// The stage-progress table key.
    pub fn as_str(self) -> &'static str {
        match self {
            StageId::Headers => "Headers",
            StageId::BlockHashes => "BlockHashes",
            StageId::Bodies => "Bodies",
            StageId::Senders => "Senders",
            StageId::Execution => "Execution",
            StageId::TxLookup => "TxLookup",
            StageId::Finish => "Finish",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted progress of a stage, zero when the stage never ran.
pub fn stage_progress(
    tx: &dyn ReadTransaction,
    id: StageId,
) -> Result<BlockNumber, embercore_kv::Error> {
    match tx.get(tables::SYNC_STAGE_PROGRESS, id.as_str().as_bytes())? {
        Some(raw) => embercore_kv::decode_number(&raw),
        None => Ok(0),
    }
}

/// Persist the progress of a stage.
pub fn save_stage_progress(
    tx: &mut dyn WriteTransaction,
    id: StageId,
    number: BlockNumber,
) -> Result<(), embercore_kv::Error> {
    tx.put(
        tables::SYNC_STAGE_PROGRESS,
        id.as_str().as_bytes(),
        &embercore_kv::encode_number(number),
    )
}

/// Everything a stage sees while running.
pub struct StageContext<'a> {
    /// The open write transaction.
    pub tx: &'a mut dyn WriteTransaction,
    /// Chain specification.
    pub spec: &'a Spec,
    /// Consensus engines.
    pub engines: &'a EngineSelector,
    /// Where blocks come from.
    pub source: &'a dyn BlockSource,
    /// Cooperative cancellation flag, polled between block units.
    pub cancelled: &'a AtomicBool,
}

impl<'a> StageContext<'a> {
    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(std::sync::atomic::Ordering::Relaxed)
    }
}

/// One stage of the pipeline.
pub trait Stage: Send {
    /// Stage identifier.
    fn id(&self) -> StageId;

    /// Advance from `from` (the current progress) towards `to`. Returns
    /// the progress actually reached; stopping short is not an error.
    fn execute(
        &mut self,
        ctx: &mut StageContext,
        from: BlockNumber,
        to: BlockNumber,
    ) -> Result<BlockNumber, StageError>;

    /// Remove every row this stage wrote above `to`.
    fn unwind(&mut self, ctx: &mut StageContext, to: BlockNumber) -> Result<(), StageError>;
}

/// Stage failure modes.
#[derive(Debug)]
pub enum StageError {
    /// Cancellation was requested; progress so far is persisted.
    Cancelled,
    /// Headers diverged from the stored chain at this height; the driver
    /// must unwind below it and resync.
    Divergence {
        /// First height that no longer matches.
        number: BlockNumber,
    },
    /// A block failed validation or execution; the driver unwinds to its
    /// parent and refuses to advance until the input changes.
    InvalidBlock {
        /// Offending block.
        number: BlockNumber,
        /// Underlying failure.
        error: embercore::Error,
    },
    /// No stage could make progress towards the target.
    Stalled {
        /// Height the pipeline is stuck at.
        number: BlockNumber,
    },
    /// Everything else: storage, decode, internal.
    Core(embercore::Error),
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            StageError::Cancelled => write!(f, "Sync cancelled"),
            StageError::Divergence { number } => {
                write!(f, "Chain diverges at block {}", number)
            }
            StageError::InvalidBlock { number, ref error } => {
                write!(f, "Invalid block {}: {}", number, error)
            }
            StageError::Stalled { number } => {
                write!(f, "Pipeline stalled at block {}", number)
            }
            StageError::Core(ref error) => error.fmt(f),
        }
    }
}

impl error::Error for StageError {}

impl From<embercore::Error> for StageError {
    fn from(error: embercore::Error) -> Self {
        StageError::Core(error)
    }
}

impl From<embercore_kv::Error> for StageError {
    fn from(error: embercore_kv::Error) -> Self {
        StageError::Core(error.into())
    }
}
