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

//! General error types for use in ember.

use std::{error, fmt};

use common_types::{transaction, BlockNumber};
use ethereum_types::{H256, H64, U256};
use unexpected::{Mismatch, OutOfBounds};

/// Errors concerning block validation and consensus.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockError {
    /// Difficulty does not match the one recomputed from the parent.
    InvalidDifficulty(Mismatch<U256>),
    /// Proof-of-work seal did not check out.
    InvalidSeal,
    /// Nonce field is invalid for the engine in charge.
    InvalidNonce(Mismatch<H64>),
    /// Mix digest field is invalid for the engine in charge.
    InvalidMixDigest,
    /// Parent beacon block root missing or zero where one is required.
    InvalidBeaconRoot,
    /// Uncle hash does not match the uncle list.
    InvalidUncleHash(Mismatch<H256>),
    /// The engine in charge admits no uncles.
    UnclesNotAllowed,
    /// Too many or too distant uncles.
    TooManyUncles(OutOfBounds<usize>),
    /// Header is not a well-formed pre-merge block.
    InvalidPoWBlock(String),
    /// Header is not a well-formed post-merge block.
    InvalidPoSBlock(String),
    /// Parent hash field does not reference the preceding header.
    InvalidParentHash(Mismatch<H256>),
    /// Block number is not parent number + 1.
    InvalidNumber(Mismatch<BlockNumber>),
    /// Timestamp does not advance past the parent.
    InvalidTimestamp(OutOfBounds<u64>),
    /// Transactions root does not match the block body.
    InvalidTransactionsRoot(Mismatch<H256>),
    /// Withdrawals root does not match the block body.
    InvalidWithdrawalsRoot(Mismatch<H256>),
    /// Gas used is above the gas limit.
    TooMuchGasUsed(OutOfBounds<U256>),
}

impl fmt::Display for BlockError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::BlockError::*;
        let msg = match *self {
            InvalidDifficulty(ref mis) => format!("Invalid block difficulty: {}", mis),
            InvalidSeal => "Invalid block seal".into(),
            InvalidNonce(ref mis) => format!("Invalid block nonce: {}", mis),
            InvalidMixDigest => "Invalid mix digest".into(),
            InvalidBeaconRoot => "Missing or zero parent beacon block root".into(),
            InvalidUncleHash(ref mis) => format!("Invalid uncles hash: {}", mis),
            UnclesNotAllowed => "Uncles are not allowed post-merge".into(),
            TooManyUncles(ref oob) => format!("Too many uncles: {}", oob),
            InvalidPoWBlock(ref why) => format!("Invalid proof-of-work block: {}", why),
            InvalidPoSBlock(ref why) => format!("Invalid proof-of-stake block: {}", why),
            InvalidParentHash(ref mis) => format!("Invalid parent hash: {}", mis),
            InvalidNumber(ref mis) => format!("Invalid number: {}", mis),
            InvalidTimestamp(ref oob) => format!("Invalid timestamp: {}", oob),
            InvalidTransactionsRoot(ref mis) => format!("Invalid transactions root: {}", mis),
            InvalidWithdrawalsRoot(ref mis) => format!("Invalid withdrawals root: {}", mis),
            TooMuchGasUsed(ref oob) => format!("Block has too much gas used: {}", oob),
        };
        f.write_fmt(format_args!("Block error ({})", msg))
    }
}

impl error::Error for BlockError {}

/// Errors raised while replaying a block.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// Computed state root differs from the header.
    StateRootMismatch {
        /// Affected block.
        number: BlockNumber,
        /// Root claimed by the header.
        expected: H256,
        /// Root computed from execution.
        got: H256,
    },
    /// Computed cumulative gas differs from the header.
    GasUsedMismatch {
        /// Affected block.
        number: BlockNumber,
        /// Gas claimed by the header.
        expected: U256,
        /// Gas computed from execution.
        got: U256,
    },
    /// Computed receipts root differs from the header.
    ReceiptRootMismatch {
        /// Affected block.
        number: BlockNumber,
        /// Root claimed by the header.
        expected: H256,
        /// Root computed from execution.
        got: H256,
    },
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::ExecutionError::*;
        match *self {
            StateRootMismatch {
                number,
                expected,
                got,
            } => write!(
                f,
                "State root mismatch at block {} (expected {}, got {})",
                number, expected, got
            ),
            GasUsedMismatch {
                number,
                expected,
                got,
            } => write!(
                f,
                "Gas used mismatch at block {} (expected {}, got {})",
                number, expected, got
            ),
            ReceiptRootMismatch {
                number,
                expected,
                got,
            } => write!(
                f,
                "Receipt root mismatch at block {} (expected {}, got {})",
                number, expected, got
            ),
        }
    }
}

impl error::Error for ExecutionError {}

/// Ember core error.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Error concerning block processing.
    Block(BlockError),
    /// Error concerning block execution.
    Execution(ExecutionError),
    /// Error concerning transaction validation.
    Transaction(transaction::Error),
    /// Error concerning the storage engine.
    Storage(embercore_kv::Error),
    /// Error raised by the virtual machine.
    Vm(vm::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Block(ref err) => err.fmt(f),
            Error::Execution(ref err) => err.fmt(f),
            Error::Transaction(ref err) => err.fmt(f),
            Error::Storage(ref err) => err.fmt(f),
            Error::Vm(ref err) => err.fmt(f),
        }
    }
}

impl error::Error for Error {}

impl From<BlockError> for Error {
    fn from(err: BlockError) -> Error {
        Error::Block(err)
    }
}

impl From<ExecutionError> for Error {
    fn from(err: ExecutionError) -> Error {
        Error::Execution(err)
    }
}

impl From<transaction::Error> for Error {
    fn from(err: transaction::Error) -> Error {
        Error::Transaction(err)
    }
}

impl From<embercore_kv::Error> for Error {
    fn from(err: embercore_kv::Error) -> Error {
        Error::Storage(err)
    }
}

impl From<vm::Error> for Error {
    fn from(err: vm::Error) -> Error {
        Error::Vm(err)
    }
}
