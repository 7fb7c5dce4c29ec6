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

//! In-memory ordered store. Tables are `BTreeMap`s published behind `Arc`s:
//! readers clone the `Arc`s (snapshot isolation for free), the single
//! writer mutates deep copies of the tables it touches and republishes them
//! atomically on commit.

use std::{
    collections::{BTreeMap, HashMap},
    ops::Bound,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use log::trace;
use parking_lot::RwLock;

use crate::{Cursor, Error, KeyValueStore, ReadTransaction, Result, WriteTransaction};

type Table = BTreeMap<Vec<u8>, Vec<u8>>;
type TableSet = BTreeMap<String, Arc<Table>>;

#[derive(Default)]
struct StoreInner {
    tables: RwLock<TableSet>,
    write_locked: AtomicBool,
}

/// Transactional in-memory store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<StoreInner>,
}

impl MemoryStore {
    /// Fresh, empty store.
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn begin_read(&self) -> Result<Box<dyn ReadTransaction>> {
        Ok(Box::new(MemoryReadTransaction {
            snapshot: self.inner.tables.read().clone(),
        }))
    }

    fn begin_write(&self) -> Result<Box<dyn WriteTransaction>> {
        if self.inner.write_locked.swap(true, Ordering::SeqCst) {
            return Err(Error::TransactionInProgress);
        }
        let snapshot = self.inner.tables.read().clone();
        Ok(Box::new(MemoryWriteTransaction {
            store: self.inner.clone(),
            base: snapshot,
            touched: HashMap::new(),
            finished: false,
        }))
    }
}

struct MemoryReadTransaction {
    snapshot: TableSet,
}

impl ReadTransaction for MemoryReadTransaction {
    fn get(&self, table: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self
            .snapshot
            .get(table)
            .and_then(|t| t.get(key).cloned()))
    }

    fn cursor(&self, table: &str) -> Result<Box<dyn Cursor>> {
        let table = self
            .snapshot
            .get(table)
            .cloned()
            .unwrap_or_default();
        Ok(Box::new(MemoryCursor {
            table,
            position: None,
        }))
    }
}

struct MemoryWriteTransaction {
    store: Arc<StoreInner>,
    base: TableSet,
    // deep copies of the tables written in this transaction
    touched: HashMap<String, Table>,
    finished: bool,
}

impl MemoryWriteTransaction {
    fn working(&mut self, table: &str) -> &mut Table {
        if !self.touched.contains_key(table) {
            let copy = self
                .base
                .get(table)
                .map(|t| Table::clone(t))
                .unwrap_or_default();
            self.touched.insert(table.to_string(), copy);
        }
        self.touched
            .get_mut(table)
            .expect("inserted in the branch above; qed")
    }

    fn view(&self, table: &str) -> Option<TableView<'_>> {
        if let Some(t) = self.touched.get(table) {
            return Some(TableView::Working(t));
        }
        self.base.get(table).map(|t| TableView::Base(t))
    }

    fn release(&mut self) {
        if !self.finished {
            self.finished = true;
            self.store.write_locked.store(false, Ordering::SeqCst);
        }
    }
}

enum TableView<'a> {
    Working(&'a Table),
    Base(&'a Arc<Table>),
}

impl ReadTransaction for MemoryWriteTransaction {
    fn get(&self, table: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(match self.view(table) {
            Some(TableView::Working(t)) => t.get(key).cloned(),
            Some(TableView::Base(t)) => t.get(key).cloned(),
            None => None,
        })
    }

    fn cursor(&self, table: &str) -> Result<Box<dyn Cursor>> {
        // cursors snapshot the table at creation, including writes made so
        // far in this transaction
        let table = match self.view(table) {
            Some(TableView::Working(t)) => Arc::new(t.clone()),
            Some(TableView::Base(t)) => t.clone(),
            None => Arc::new(Table::new()),
        };
        Ok(Box::new(MemoryCursor {
            table,
            position: None,
        }))
    }
}

impl WriteTransaction for MemoryWriteTransaction {
    fn as_read(&self) -> &dyn ReadTransaction {
        self
    }

    fn put(&mut self, table: &str, key: &[u8], value: &[u8]) -> Result<()> {
        self.working(table).insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, table: &str, key: &[u8]) -> Result<()> {
        self.working(table).remove(key);
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        let touched = std::mem::take(&mut self.touched);
        let mut tables = self.store.tables.write();
        for (name, table) in touched {
            trace!(target: "db", "commit table {} ({} entries)", name, table.len());
            tables.insert(name, Arc::new(table));
        }
        drop(tables);
        self.release();
        Ok(())
    }

    fn rollback(mut self: Box<Self>) {
        self.touched.clear();
        self.release();
    }
}

impl Drop for MemoryWriteTransaction {
    fn drop(&mut self) {
        // dropping without commit behaves as rollback
        self.release();
    }
}

struct MemoryCursor {
    table: Arc<Table>,
    position: Option<Vec<u8>>,
}

impl MemoryCursor {
    fn settle(&mut self, entry: Option<(Vec<u8>, Vec<u8>)>) -> Option<(Vec<u8>, Vec<u8>)> {
        self.position = entry.as_ref().map(|(key, _)| key.clone());
        entry
    }
}

impl Cursor for MemoryCursor {
    fn first(&mut self) -> Option<(Vec<u8>, Vec<u8>)> {
        let entry = self
            .table
            .iter()
            .next()
            .map(|(k, v)| (k.clone(), v.clone()));
        self.settle(entry)
    }

    fn last(&mut self) -> Option<(Vec<u8>, Vec<u8>)> {
        let entry = self
            .table
            .iter()
            .next_back()
            .map(|(k, v)| (k.clone(), v.clone()));
        self.settle(entry)
    }

    fn seek(&mut self, key: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
        let entry = self
            .table
            .range::<[u8], _>((Bound::Included(key), Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.clone(), v.clone()));
        self.settle(entry)
    }

    fn next(&mut self) -> Option<(Vec<u8>, Vec<u8>)> {
        match self.position.take() {
            None => self.first(),
            Some(position) => {
                let entry = self
                    .table
                    .range::<Vec<u8>, _>((Bound::Excluded(&position), Bound::Unbounded))
                    .next()
                    .map(|(k, v)| (k.clone(), v.clone()));
                self.settle(entry)
            }
        }
    }

    fn prev(&mut self) -> Option<(Vec<u8>, Vec<u8>)> {
        match self.position.take() {
            None => self.last(),
            Some(position) => {
                let entry = self
                    .table
                    .range::<Vec<u8>, _>((Bound::Unbounded, Bound::Excluded(&position)))
                    .next_back()
                    .map(|(k, v)| (k.clone(), v.clone()));
                self.settle(entry)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: &str = "TestTable";

    fn store_with(entries: &[(&[u8], &[u8])]) -> MemoryStore {
        let store = MemoryStore::new();
        let mut tx = store.begin_write().unwrap();
        for (k, v) in entries {
            tx.put(T, k, v).unwrap();
        }
        tx.commit().unwrap();
        store
    }

    #[test]
    fn get_put_round_trip() {
        let store = store_with(&[(b"a", b"1")]);
        let tx = store.begin_read().unwrap();
        assert_eq!(tx.get(T, b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(tx.get(T, b"b").unwrap(), None);
    }

    #[test]
    fn single_writer_enforced() {
        let store = MemoryStore::new();
        let tx = store.begin_write().unwrap();
        assert!(matches!(
            store.begin_write().err(),
            Some(Error::TransactionInProgress)
        ));
        tx.rollback();
        assert!(store.begin_write().is_ok());
    }

    #[test]
    fn readers_see_snapshot_not_in_flight_writes() {
        let store = store_with(&[(b"a", b"1")]);
        let reader = store.begin_read().unwrap();
        let mut writer = store.begin_write().unwrap();
        writer.put(T, b"a", b"2").unwrap();
        // uncommitted write invisible
        assert_eq!(reader.get(T, b"a").unwrap(), Some(b"1".to_vec()));
        writer.commit().unwrap();
        // the open reader still observes its snapshot
        assert_eq!(reader.get(T, b"a").unwrap(), Some(b"1".to_vec()));
        // a fresh reader observes the commit
        let fresh = store.begin_read().unwrap();
        assert_eq!(fresh.get(T, b"a").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn rollback_discards_writes() {
        let store = store_with(&[(b"a", b"1")]);
        let mut writer = store.begin_write().unwrap();
        writer.put(T, b"b", b"2").unwrap();
        writer.rollback();
        let reader = store.begin_read().unwrap();
        assert_eq!(reader.get(T, b"b").unwrap(), None);
    }

    #[test]
    fn dropping_writer_releases_the_lock() {
        let store = MemoryStore::new();
        {
            let mut tx = store.begin_write().unwrap();
            tx.put(T, b"x", b"y").unwrap();
        }
        // drop = rollback, and the next writer may begin
        let tx = store.begin_write().unwrap();
        assert_eq!(tx.get(T, b"x").unwrap(), None);
    }

    #[test]
    fn writer_reads_its_own_writes() {
        let store = MemoryStore::new();
        let mut tx = store.begin_write().unwrap();
        tx.put(T, b"k", b"v").unwrap();
        assert_eq!(tx.get(T, b"k").unwrap(), Some(b"v".to_vec()));
        let mut cursor = tx.cursor(T).unwrap();
        assert_eq!(cursor.first(), Some((b"k".to_vec(), b"v".to_vec())));
        tx.commit().unwrap();
    }

    #[test]
    fn cursor_walks_in_byte_order() {
        let store = store_with(&[(b"b", b"2"), (b"a", b"1"), (b"c", b"3")]);
        let tx = store.begin_read().unwrap();
        let mut cursor = tx.cursor(T).unwrap();
        assert_eq!(cursor.first().unwrap().0, b"a".to_vec());
        assert_eq!(cursor.next().unwrap().0, b"b".to_vec());
        assert_eq!(cursor.next().unwrap().0, b"c".to_vec());
        assert_eq!(cursor.next(), None);
        // walking off the end unpositions the cursor; prev restarts at last
        assert_eq!(cursor.prev().unwrap().0, b"c".to_vec());
        assert_eq!(cursor.prev().unwrap().0, b"b".to_vec());
    }

    #[test]
    fn seek_finds_first_at_or_after() {
        let store = store_with(&[(b"aa", b"1"), (b"ab", b"2"), (b"b", b"3")]);
        let tx = store.begin_read().unwrap();
        let mut cursor = tx.cursor(T).unwrap();
        assert_eq!(cursor.seek(b"ab").unwrap().0, b"ab".to_vec());
        assert_eq!(cursor.seek(b"ac").unwrap().0, b"b".to_vec());
        assert_eq!(cursor.seek(b"c"), None);
    }
}
