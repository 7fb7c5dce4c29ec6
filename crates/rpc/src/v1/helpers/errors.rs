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

//! RPC error construction. Parse (-32700), invalid request (-32600),
//! method not found (-32601) and invalid params (-32602) are produced by
//! the JSON-RPC layer itself; what this module adds are the server-side
//! failures.

use common_types::transaction;
use jsonrpc_core::{Error, ErrorCode, Value};

/// Server error issued when a block or transaction is not available.
const UNKNOWN_BLOCK: i64 = -32000;
/// Server error issued when the pool rejects a transaction.
const TRANSACTION_REJECTED: i64 = -32010;
/// Server error issued when an unknown payload id is queried.
const UNKNOWN_PAYLOAD: i64 = -38001;

/// The queried block is not in the canonical chain.
pub fn unknown_block() -> Error {
    Error {
        code: ErrorCode::ServerError(UNKNOWN_BLOCK),
        message: "Unknown block".into(),
        data: None,
    }
}

/// The pool refused a submitted transaction.
pub fn transaction_rejected(error: transaction::Error) -> Error {
    Error {
        code: ErrorCode::ServerError(TRANSACTION_REJECTED),
        message: format!("{}", error),
        data: None,
    }
}

/// The filter id is not installed.
pub fn filter_not_found() -> Error {
    Error {
        code: ErrorCode::InvalidParams,
        message: "Filter not found".into(),
        data: None,
    }
}

/// Engine API: payload id unknown.
pub fn unknown_payload() -> Error {
    Error {
        code: ErrorCode::ServerError(UNKNOWN_PAYLOAD),
        message: "Unknown payload".into(),
        data: None,
    }
}

/// Catch-all for internal failures; the cause travels in `data`.
pub fn internal<T: std::fmt::Display>(error: T) -> Error {
    Error {
        code: ErrorCode::InternalError,
        message: "Internal error".into(),
        data: Some(Value::String(format!("{}", error))),
    }
}
