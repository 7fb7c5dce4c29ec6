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

//! Key-value engine contract: named tables over an ordered byte store,
//! byte-for-byte lexicographic cursors, single-writer transactions with
//! snapshot-isolated readers. The in-memory implementation lives in
//! `memorydb`; a memory-mapped engine would slot in behind the same traits.

pub mod memorydb;
pub mod tables;

use std::{error, fmt};

pub use crate::memorydb::MemoryStore;

/// Storage errors surfaced by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A value that must exist was absent.
    NotFound,
    /// A stored record failed to decode.
    CorruptedData(String),
    /// A write transaction is already open; the engine is single-writer.
    TransactionInProgress,
    /// An operation that requires an open transaction was called without
    /// one.
    NoTransactionActive,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::NotFound => write!(f, "Record not found"),
            Error::CorruptedData(ref what) => write!(f, "Corrupted data: {}", what),
            Error::TransactionInProgress => {
                write!(f, "A write transaction is already in progress")
            }
            Error::NoTransactionActive => write!(f, "No transaction is active"),
        }
    }
}

impl error::Error for Error {}

/// Result alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A positioned iterator over one table. Keys are ordered
/// lexicographically; numeric keys are big-endian so numeric order and byte
/// order agree. The cursor observes the table as it was when the cursor was
/// opened.
pub trait Cursor: Send {
    /// Position at the first entry.
    fn first(&mut self) -> Option<(Vec<u8>, Vec<u8>)>;
    /// Position at the last entry.
    fn last(&mut self) -> Option<(Vec<u8>, Vec<u8>)>;
    /// Position at the first entry with key >= `key`.
    fn seek(&mut self, key: &[u8]) -> Option<(Vec<u8>, Vec<u8>)>;
    /// Advance. An unpositioned cursor moves to the first entry.
    fn next(&mut self) -> Option<(Vec<u8>, Vec<u8>)>;
    /// Step back. An unpositioned cursor moves to the last entry.
    fn prev(&mut self) -> Option<(Vec<u8>, Vec<u8>)>;
}

/// Read access to the store at a fixed snapshot.
pub trait ReadTransaction: Send {
    /// Point lookup.
    fn get(&self, table: &str, key: &[u8]) -> Result<Option<Vec<u8>>>;
    /// Open a cursor over a table.
    fn cursor(&self, table: &str) -> Result<Box<dyn Cursor>>;
}

/// Exclusive write access. Reads observe writes made earlier in the same
/// transaction. Nothing is visible to readers until `commit`.
pub trait WriteTransaction: ReadTransaction {
    /// View this transaction as a reader, observing its own writes.
    fn as_read(&self) -> &dyn ReadTransaction;
    /// Insert or overwrite.
    fn put(&mut self, table: &str, key: &[u8], value: &[u8]) -> Result<()>;
    /// Remove a key; absent keys are ignored.
    fn delete(&mut self, table: &str, key: &[u8]) -> Result<()>;
    /// Atomically publish every write in this transaction.
    fn commit(self: Box<Self>) -> Result<()>;
    /// Discard every write in this transaction.
    fn rollback(self: Box<Self>);
}

/// A transactional, ordered, named-table store.
pub trait KeyValueStore: Send + Sync {
    /// Open a read-only snapshot transaction.
    fn begin_read(&self) -> Result<Box<dyn ReadTransaction>>;
    /// Open the write transaction. Errors with `TransactionInProgress` if
    /// one is already open.
    fn begin_write(&self) -> Result<Box<dyn WriteTransaction>>;
}

/// Big-endian encoding for numeric table keys.
pub fn encode_number(number: u64) -> [u8; 8] {
    number.to_be_bytes()
}

/// Inverse of `encode_number`.
pub fn decode_number(bytes: &[u8]) -> Result<u64> {
    if bytes.len() != 8 {
        return Err(Error::CorruptedData(format!(
            "expected 8-byte number, got {} bytes",
            bytes.len()
        )));
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    Ok(u64::from_be_bytes(buf))
}

/// Collect the keys of every entry with key >= `from`, usually to delete
/// them during an unwind.
pub fn keys_from(tx: &dyn ReadTransaction, table: &str, from: &[u8]) -> Result<Vec<Vec<u8>>> {
    let mut cursor = tx.cursor(table)?;
    let mut keys = Vec::new();
    let mut entry = cursor.seek(from);
    while let Some((key, _)) = entry {
        keys.push(key);
        entry = cursor.next();
    }
    Ok(keys)
}

/// Collect the keys of every entry whose key starts with `prefix`.
pub fn keys_with_prefix(
    tx: &dyn ReadTransaction,
    table: &str,
    prefix: &[u8],
) -> Result<Vec<Vec<u8>>> {
    let mut cursor = tx.cursor(table)?;
    let mut keys = Vec::new();
    let mut entry = cursor.seek(prefix);
    while let Some((key, _)) = entry {
        if !key.starts_with(prefix) {
            break;
        }
        keys.push(key);
        entry = cursor.next();
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_encoding_sorts_numerically() {
        let mut encoded: Vec<_> = [3u64, 256, 1, 65_536, 2]
            .iter()
            .map(|n| encode_number(*n).to_vec())
            .collect();
        encoded.sort();
        let decoded: Vec<u64> = encoded
            .iter()
            .map(|bytes| decode_number(bytes).unwrap())
            .collect();
        assert_eq!(decoded, vec![1, 2, 3, 256, 65_536]);
    }

    #[test]
    fn decode_rejects_bad_width() {
        assert!(decode_number(&[1, 2, 3]).is_err());
    }
}
