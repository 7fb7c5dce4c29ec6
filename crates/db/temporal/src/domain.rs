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

use embercore_kv::{Cursor, Error, ReadTransaction, Result, WriteTransaction};
use log::trace;

/// Static configuration of one domain.
#[derive(Debug, Clone)]
pub struct DomainConfig {
    /// Domain name; auxiliary table names derive from it.
    pub name: &'static str,
    /// Hot table holding the latest values.
    pub hot_table: &'static str,
    /// Transaction numbers per step.
    pub step_size: u64,
    /// Whether prior values are tracked for as-of reads.
    pub with_history: bool,
}

/// A flat key->value map versioned by transaction number.
///
/// Table layout:
/// - hot:         `K ++ !step(t)`  -> `!step(t) ++ value` (empty value = tombstone)
/// - history:     `K ++ t`         -> `!step(t_prev) ++ prior value`, or empty when
///                                    the key did not exist before `t`
/// - history keys: `t ++ K`        -> `[]` (drives unwind)
/// - index:       `K ++ t`         -> `[]` (the inverted index)
pub struct Domain {
    config: DomainConfig,
    history_table: String,
    history_keys_table: String,
    index_table: String,
}

fn invert_step(step: u64) -> [u8; 8] {
    (!step).to_be_bytes()
}

fn concat(key: &[u8], suffix: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(key.len() + suffix.len());
    out.extend_from_slice(key);
    out.extend_from_slice(suffix);
    out
}

fn trailing_number(key: &[u8]) -> Result<u64> {
    if key.len() < 8 {
        return Err(Error::CorruptedData("key too short for suffix".into()));
    }
    embercore_kv::decode_number(&key[key.len() - 8..])
}

impl Domain {
    /// Build a domain from its configuration.
    pub fn new(config: DomainConfig) -> Self {
        Domain {
            history_table: format!("{}History", config.name),
            history_keys_table: format!("{}HistoryKeys", config.name),
            index_table: format!("{}Idx", config.name),
            config,
        }
    }

    /// Domain name.
    pub fn name(&self) -> &'static str {
        self.config.name
    }

    /// The step a transaction number belongs to.
    pub fn step(&self, tx_number: u64) -> u64 {
        tx_number / self.config.step_size
    }

    fn hot_key(&self, key: &[u8], tx_number: u64) -> Vec<u8> {
        concat(key, &invert_step(self.step(tx_number)))
    }

    // Newest (step, raw value) for a key, from a hot-table cursor.
    fn latest_entry(&self, cursor: &mut dyn Cursor, key: &[u8]) -> Result<Option<(u64, Vec<u8>)>> {
        let mut entry = cursor.seek(key);
        while let Some((k, v)) = entry {
            if !k.starts_with(key) {
                return Ok(None);
            }
            // entries for longer keys sharing this prefix are skipped
            if k.len() == key.len() + 8 {
                if v.len() < 8 {
                    return Err(Error::CorruptedData(format!(
                        "{}: hot value shorter than its step prefix",
                        self.config.name
                    )));
                }
                let step = !embercore_kv::decode_number(&v[..8])?;
                return Ok(Some((step, v[8..].to_vec())));
            }
            entry = cursor.next();
        }
        Ok(None)
    }

    /// Latest value of `key`, tombstones decoded as `None`.
    pub fn get_latest(&self, tx: &dyn ReadTransaction, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let mut cursor = tx.cursor(self.config.hot_table)?;
        self.get_latest_from(cursor.as_mut(), key)
    }

    /// Latest value of `key` through a caller-held hot-table cursor. Lets a
    /// reader snapshot the table once and run many lookups against it.
    pub fn get_latest_from(
        &self,
        cursor: &mut dyn Cursor,
        key: &[u8],
    ) -> Result<Option<Vec<u8>>> {
        Ok(self
            .latest_entry(cursor, key)?
            .and_then(|(_, raw)| if raw.is_empty() { None } else { Some(raw) }))
    }

    /// Write `value` for `key` at transaction number `tx_number`.
    pub fn put(
        &self,
        tx: &mut dyn WriteTransaction,
        key: &[u8],
        value: &[u8],
        tx_number: u64,
    ) -> Result<()> {
        if self.config.with_history {
            let mut cursor = tx.as_read().cursor(self.config.hot_table)?;
            let prior = self.latest_entry(cursor.as_mut(), key)?;
            drop(cursor);
            let record = match prior {
                None => Vec::new(),
                Some((step, raw)) => concat(&invert_step(step), &raw),
            };
            let suffix = embercore_kv::encode_number(tx_number);
            tx.put(&self.history_keys_table, &concat(&suffix, key), &[])?;
            tx.put(&self.history_table, &concat(key, &suffix), &record)?;
            tx.put(&self.index_table, &concat(key, &suffix), &[])?;
        }
        let step = invert_step(self.step(tx_number));
        tx.put(self.config.hot_table, &self.hot_key(key, tx_number), &concat(&step, value))
    }

    /// Record deletion of `key` at `tx_number` by writing a tombstone.
    pub fn delete(&self, tx: &mut dyn WriteTransaction, key: &[u8], tx_number: u64) -> Result<()> {
        self.put(tx, key, &[], tx_number)
    }

    /// The largest change transaction number <= `t` for `key`.
    pub fn index_seek(
        &self,
        tx: &dyn ReadTransaction,
        key: &[u8],
        t: u64,
    ) -> Result<Option<u64>> {
        let mut cursor = tx.cursor(&self.index_table)?;
        let target = concat(key, &embercore_kv::encode_number(t));
        let entry = match cursor.seek(&target) {
            Some((k, _)) if k == target => return Ok(Some(t)),
            _ => cursor.prev(),
        };
        match entry {
            Some((k, _)) if k.starts_with(key) && k.len() == key.len() + 8 => {
                Ok(Some(trailing_number(&k)?))
            }
            _ => Ok(None),
        }
    }

    /// The smallest change transaction number > `t` for `key`.
    pub fn index_seek_after(
        &self,
        tx: &dyn ReadTransaction,
        key: &[u8],
        t: u64,
    ) -> Result<Option<u64>> {
        let from = match t.checked_add(1) {
            Some(from) => from,
            None => return Ok(None),
        };
        let mut cursor = tx.cursor(&self.index_table)?;
        match cursor.seek(&concat(key, &embercore_kv::encode_number(from))) {
            Some((k, _)) if k.starts_with(key) && k.len() == key.len() + 8 => {
                Ok(Some(trailing_number(&k)?))
            }
            _ => Ok(None),
        }
    }

    /// The value of `key` immediately after the last write with transaction
    /// number <= `t`, or `None` if the key did not exist at that time.
    pub fn get_as_of(
        &self,
        tx: &dyn ReadTransaction,
        key: &[u8],
        t: u64,
    ) -> Result<Option<Vec<u8>>> {
        if !self.config.with_history {
            return self.get_latest(tx, key);
        }
        match self.index_seek_after(tx, key, t)? {
            // the key changed after t; the history record of that change
            // holds the value as of t
            Some(change) => {
                let record = tx
                    .get(&self.history_table, &concat(key, &embercore_kv::encode_number(change)))?
                    .ok_or_else(|| {
                        Error::CorruptedData(format!(
                            "{}: indexed change {} has no history record",
                            self.config.name, change
                        ))
                    })?;
                if record.len() <= 8 {
                    // absent before the change, or a tombstone
                    return Ok(None);
                }
                Ok(Some(record[8..].to_vec()))
            }
            // no change after t, so the latest value is the as-of value
            None => self.get_latest(tx, key),
        }
    }

    /// Roll every write with transaction number > `target` back out of the
    /// hot table, consuming the history that recorded it.
    pub fn unwind(&self, tx: &mut dyn WriteTransaction, target: u64) -> Result<()> {
        debug_assert!(self.config.with_history, "unwind requires history");
        let from = match target.checked_add(1) {
            Some(from) => from,
            None => return Ok(()),
        };
        let changes = embercore_kv::keys_from(
            tx.as_read(),
            &self.history_keys_table,
            &embercore_kv::encode_number(from),
        )?;
        trace!(
            target: "db",
            "{}: unwinding {} writes above tx {}",
            self.config.name,
            changes.len(),
            target
        );
        // LIFO: the last surviving restore for a key is the oldest one
        for change_key in changes.iter().rev() {
            let t = embercore_kv::decode_number(&change_key[..8])?;
            let key = &change_key[8..];
            let history_key = concat(key, &embercore_kv::encode_number(t));
            let record = tx
                .get(&self.history_table, &history_key)?
                .ok_or_else(|| {
                    Error::CorruptedData(format!(
                        "{}: missing history record during unwind",
                        self.config.name
                    ))
                })?;
            let hot_key = self.hot_key(key, t);
            if record.is_empty() {
                // key did not exist before this write
                tx.delete(self.config.hot_table, &hot_key)?;
            } else {
                let prior_step = !embercore_kv::decode_number(&record[..8])?;
                if prior_step == self.step(t) {
                    // the prior write shares the hot slot; put its value back
                    tx.put(self.config.hot_table, &hot_key, &record)?;
                } else {
                    // the prior write lives in an older step and is intact
                    tx.delete(self.config.hot_table, &hot_key)?;
                }
            }
            tx.delete(&self.history_table, &history_key)?;
            tx.delete(&self.index_table, &history_key)?;
            tx.delete(&self.history_keys_table, change_key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embercore_kv::{KeyValueStore, MemoryStore};

    fn domain() -> Domain {
        Domain::new(DomainConfig {
            name: "Test",
            hot_table: "TestHot",
            step_size: 100,
            with_history: true,
        })
    }

    fn put(store: &MemoryStore, d: &Domain, key: &[u8], value: &[u8], t: u64) {
        let mut tx = store.begin_write().unwrap();
        d.put(tx.as_mut(), key, value, t).unwrap();
        tx.commit().unwrap();
    }

    fn delete(store: &MemoryStore, d: &Domain, key: &[u8], t: u64) {
        let mut tx = store.begin_write().unwrap();
        d.delete(tx.as_mut(), key, t).unwrap();
        tx.commit().unwrap();
    }

    fn as_of(store: &MemoryStore, d: &Domain, key: &[u8], t: u64) -> Option<Vec<u8>> {
        let tx = store.begin_read().unwrap();
        d.get_as_of(tx.as_ref(), key, t).unwrap()
    }

    #[test]
    fn latest_prefers_newest_step() {
        let store = MemoryStore::new();
        let d = domain();
        put(&store, &d, b"a", b"v1", 50); // step 0
        put(&store, &d, b"a", b"v2", 250); // step 2
        let tx = store.begin_read().unwrap();
        assert_eq!(d.get_latest(tx.as_ref(), b"a").unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn latest_ignores_longer_keys_sharing_a_prefix() {
        let store = MemoryStore::new();
        let d = domain();
        put(&store, &d, b"abcd", b"other", 10);
        let tx = store.begin_read().unwrap();
        assert_eq!(d.get_latest(tx.as_ref(), b"ab").unwrap(), None);
    }

    #[test]
    fn as_of_walks_versions() {
        let store = MemoryStore::new();
        let d = domain();
        put(&store, &d, b"a", b"v1", 100);
        put(&store, &d, b"a", b"v2", 200);
        put(&store, &d, b"a", b"v3", 300);

        assert_eq!(as_of(&store, &d, b"a", 50), None);
        assert_eq!(as_of(&store, &d, b"a", 100), Some(b"v1".to_vec()));
        assert_eq!(as_of(&store, &d, b"a", 150), Some(b"v1".to_vec()));
        assert_eq!(as_of(&store, &d, b"a", 250), Some(b"v2".to_vec()));
        assert_eq!(as_of(&store, &d, b"a", 350), Some(b"v3".to_vec()));

        delete(&store, &d, b"a", 400);
        assert_eq!(as_of(&store, &d, b"a", 350), Some(b"v3".to_vec()));
        assert_eq!(as_of(&store, &d, b"a", 450), None);
    }

    #[test]
    fn tombstone_hides_latest() {
        let store = MemoryStore::new();
        let d = domain();
        put(&store, &d, b"a", b"v1", 100);
        delete(&store, &d, b"a", 150);
        let tx = store.begin_read().unwrap();
        assert_eq!(d.get_latest(tx.as_ref(), b"a").unwrap(), None);
        drop(tx);
        // and a later write resurrects it
        put(&store, &d, b"a", b"v2", 500);
        let tx = store.begin_read().unwrap();
        assert_eq!(d.get_latest(tx.as_ref(), b"a").unwrap(), Some(b"v2".to_vec()));
        assert_eq!(d.get_as_of(tx.as_ref(), b"a", 200).unwrap(), None);
    }

    #[test]
    fn index_seeks_both_directions() {
        let store = MemoryStore::new();
        let d = domain();
        for t in &[100u64, 200, 300] {
            put(&store, &d, b"a", b"v", *t);
        }
        let tx = store.begin_read().unwrap();
        assert_eq!(d.index_seek(tx.as_ref(), b"a", 250).unwrap(), Some(200));
        assert_eq!(d.index_seek(tx.as_ref(), b"a", 200).unwrap(), Some(200));
        assert_eq!(d.index_seek(tx.as_ref(), b"a", 99).unwrap(), None);
        assert_eq!(d.index_seek_after(tx.as_ref(), b"a", 200).unwrap(), Some(300));
        assert_eq!(d.index_seek_after(tx.as_ref(), b"a", 300).unwrap(), None);
    }

    #[test]
    fn unwind_restores_prior_values() {
        let store = MemoryStore::new();
        let d = domain();
        put(&store, &d, b"a", b"v1", 100);
        put(&store, &d, b"a", b"v2", 200);
        put(&store, &d, b"b", b"w1", 210);

        let mut tx = store.begin_write().unwrap();
        d.unwind(tx.as_mut(), 150).unwrap();
        tx.commit().unwrap();

        let tx = store.begin_read().unwrap();
        assert_eq!(d.get_latest(tx.as_ref(), b"a").unwrap(), Some(b"v1".to_vec()));
        assert_eq!(d.get_latest(tx.as_ref(), b"b").unwrap(), None);
        // history above the target is gone
        assert_eq!(d.index_seek_after(tx.as_ref(), b"a", 150).unwrap(), None);
    }

    #[test]
    fn unwind_within_one_step_restores_the_slot() {
        let store = MemoryStore::new();
        let d = domain();
        // both writes land in step 0
        put(&store, &d, b"a", b"v1", 10);
        put(&store, &d, b"a", b"v2", 20);

        let mut tx = store.begin_write().unwrap();
        d.unwind(tx.as_mut(), 15).unwrap();
        tx.commit().unwrap();

        let tx = store.begin_read().unwrap();
        assert_eq!(d.get_latest(tx.as_ref(), b"a").unwrap(), Some(b"v1".to_vec()));
    }

    #[test]
    fn unwind_of_fresh_key_removes_it() {
        let store = MemoryStore::new();
        let d = domain();
        put(&store, &d, b"a", b"v1", 100);
        let mut tx = store.begin_write().unwrap();
        d.unwind(tx.as_mut(), 0).unwrap();
        tx.commit().unwrap();
        let tx = store.begin_read().unwrap();
        assert_eq!(d.get_latest(tx.as_ref(), b"a").unwrap(), None);
        assert_eq!(d.get_as_of(tx.as_ref(), b"a", 500).unwrap(), None);
    }

    #[test]
    fn writes_visible_inside_the_write_transaction() {
        let store = MemoryStore::new();
        let d = domain();
        let mut tx = store.begin_write().unwrap();
        d.put(tx.as_mut(), b"a", b"v1", 5).unwrap();
        assert_eq!(
            d.get_latest(tx.as_read(), b"a").unwrap(),
            Some(b"v1".to_vec())
        );
        tx.rollback();
    }
}
