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

use std::{error, fmt};

use crate::crypto;
use ethereum_types::U256;
use rlp;

/// Errors concerning transaction validation.
#[derive(Debug, PartialEq, Clone)]
pub enum Error {
    /// Transaction is already imported to the queue.
    AlreadyImported,
    /// Transaction nonce is behind the account nonce.
    NonceTooLow {
        /// Lowest admissible nonce.
        minimal: U256,
        /// Transaction nonce.
        got: U256,
    },
    /// Transaction nonce is too far ahead of the account nonce.
    NonceTooHigh {
        /// Highest admissible nonce.
        limit: U256,
        /// Transaction nonce.
        got: U256,
    },
    /// Sender doesn't have enough funds to pay for this transaction.
    InsufficientFunds {
        /// Sender's balance.
        balance: U256,
        /// Transaction cost.
        cost: U256,
    },
    /// Transaction's gas limit exceeds the block gas limit.
    GasLimitExceeded {
        /// Current block gas limit.
        limit: U256,
        /// Declared transaction gas.
        got: U256,
    },
    /// Transaction's declared gas is below its intrinsic gas.
    IntrinsicGasTooLow {
        /// Minimal gas required.
        minimal: U256,
        /// Gas declared by the transaction.
        got: U256,
    },
    /// Transaction's gas price is below the configured minimum.
    GasPriceTooLow {
        /// Minimal expected gas price.
        minimal: U256,
        /// Transaction gas price.
        got: U256,
    },
    /// A same-nonce replacement did not bump the price enough.
    Underpriced,
    /// The pool reached its global capacity and the transaction does not
    /// beat the cheapest resident.
    PoolFull,
    /// The sender has too many transactions queued already.
    TooManyFromSender {
        /// Per-sender slot cap.
        limit: usize,
    },
    /// Typed transaction used on a different chain than it was signed for.
    InvalidChainId,
    /// Blob and set-code transactions must name a recipient.
    RecipientRequired,
    /// Signature is invalid or does not recover.
    InvalidSignature(String),
    /// Transaction bytes do not decode.
    InvalidRlp(String),
}

impl From<crypto::publickey::Error> for Error {
    fn from(err: crypto::publickey::Error) -> Self {
        Error::InvalidSignature(format!("{}", err))
    }
}

impl From<rlp::DecoderError> for Error {
    fn from(err: rlp::DecoderError) -> Self {
        Error::InvalidRlp(format!("{}", err))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::Error::*;
        let msg = match *self {
            AlreadyImported => "Already imported".into(),
            NonceTooLow { minimal, got } => {
                format!("Nonce too low. Minimal: {}, given: {}", minimal, got)
            }
            NonceTooHigh { limit, got } => {
                format!("Nonce too high. Limit: {}, given: {}", limit, got)
            }
            InsufficientFunds { balance, cost } => format!(
                "Insufficient funds. Balance: {}, cost: {}",
                balance, cost
            ),
            GasLimitExceeded { limit, got } => {
                format!("Gas limit exceeded. Limit: {}, given: {}", limit, got)
            }
            IntrinsicGasTooLow { minimal, got } => {
                format!("Intrinsic gas too low. Minimal: {}, given: {}", minimal, got)
            }
            GasPriceTooLow { minimal, got } => {
                format!("Gas price too low. Minimal: {}, given: {}", minimal, got)
            }
            Underpriced => "Replacement transaction underpriced".into(),
            PoolFull => "Transaction pool is full".into(),
            TooManyFromSender { limit } => {
                format!("Too many transactions from sender. Limit: {}", limit)
            }
            InvalidChainId => "Transaction of this chain is not usable here".into(),
            RecipientRequired => "Transaction variant requires a recipient".into(),
            InvalidSignature(ref err) => format!("Invalid signature: {}", err),
            InvalidRlp(ref err) => format!("Invalid RLP: {}", err),
        };
        f.write_fmt(format_args!("Transaction error ({})", msg))
    }
}

impl error::Error for Error {
    fn description(&self) -> &str {
        "Transaction error"
    }
}
