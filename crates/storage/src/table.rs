// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Keyed rows with atomic per-row read-modify-write.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Result of a conditional row write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome<R = ()> {
    /// The row changed; carries what the mutation produced
    Replaced(R),
    /// The row exists but the mutation declined to change it
    Unchanged,
    /// No row under that key
    Absent,
}

impl<R> WriteOutcome<R> {
    pub fn is_replaced(&self) -> bool {
        matches!(self, WriteOutcome::Replaced(_))
    }
}

/// Result of a versioned compare-and-swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    Swapped { version: u64 },
    /// Another writer got there first
    Conflict { current: u64 },
    Absent,
}

/// A row value with the version it was last written at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<V> {
    pub version: u64,
    pub value: V,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("row already exists")]
pub struct DuplicateKey;

/// An ordered table of rows.
///
/// Each call holds the table lock only for the duration of a single row
/// operation; mutations run against a copy and are committed only when they
/// report a change.
#[derive(Debug)]
pub struct Table<K, V> {
    rows: RwLock<BTreeMap<K, Versioned<V>>>,
}

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self { rows: RwLock::new(BTreeMap::new()) }
    }
}

impl<K: Ord + Clone, V: Clone> Table<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from existing rows, all at version 0.
    pub fn from_rows(rows: impl IntoIterator<Item = (K, V)>) -> Self {
        let rows = rows.into_iter().map(|(k, value)| (k, Versioned { version: 0, value })).collect();
        Self { rows: RwLock::new(rows) }
    }

    /// Insert a new row. Fails if the key is taken.
    pub fn insert(&self, key: K, value: V) -> Result<(), DuplicateKey> {
        let mut rows = self.rows.write();
        if rows.contains_key(&key) {
            return Err(DuplicateKey);
        }
        rows.insert(key, Versioned { version: 0, value });
        Ok(())
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.rows.read().get(key).map(|row| row.value.clone())
    }

    pub fn get_versioned(&self, key: &K) -> Option<Versioned<V>> {
        self.rows.read().get(key).cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.rows.read().contains_key(key)
    }

    /// Atomically mutate one row.
    ///
    /// `f` returns `Some` when it changed the row, which commits the copy and
    /// bumps the version; `None` discards the copy.
    pub fn update<R>(&self, key: &K, f: impl FnOnce(&mut V) -> Option<R>) -> WriteOutcome<R> {
        let mut rows = self.rows.write();
        let Some(row) = rows.get_mut(key) else {
            return WriteOutcome::Absent;
        };
        let mut value = row.value.clone();
        match f(&mut value) {
            Some(out) => {
                row.value = value;
                row.version += 1;
                WriteOutcome::Replaced(out)
            }
            None => WriteOutcome::Unchanged,
        }
    }

    /// Replace the row only if it is still at `expected` version.
    pub fn compare_and_swap(&self, key: &K, expected: u64, value: V) -> CasOutcome {
        let mut rows = self.rows.write();
        let Some(row) = rows.get_mut(key) else {
            return CasOutcome::Absent;
        };
        if row.version != expected {
            return CasOutcome::Conflict { current: row.version };
        }
        row.value = value;
        row.version += 1;
        CasOutcome::Swapped { version: row.version }
    }

    /// Rows with keys at or after `from` for as long as `within` holds.
    pub fn range_while(&self, from: &K, within: impl Fn(&K) -> bool) -> Vec<V> {
        self.rows
            .read()
            .range(from.clone()..)
            .take_while(|(k, _)| within(k))
            .map(|(_, row)| row.value.clone())
            .collect()
    }

    /// Rows matching a predicate, in key order.
    pub fn filter(&self, pred: impl Fn(&V) -> bool) -> Vec<V> {
        self.rows.read().values().filter(|row| pred(&row.value)).map(|r| r.value.clone()).collect()
    }

    pub fn values(&self) -> Vec<V> {
        self.filter(|_| true)
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
