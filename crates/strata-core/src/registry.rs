//! Arena-style id tables
//!
//! Every runtime table (index spaces, field spaces, logical regions) is a
//! [`Registry`]: ids are handed out in increasing order and never reused, so a
//! handle that outlives its entry fails lookups with `NotFound` instead of
//! aliasing a newer entry.

use crate::error::{Error, HandleKind, Result};
use std::collections::HashMap;

/// Id table for one kind of handle.
pub struct Registry<V> {
    /// Live entries by id
    entries: HashMap<usize, V>,

    /// Next id to hand out
    next_index: usize,

    /// Reported in `NotFound` errors
    kind: HandleKind,
}

impl<V> Registry<V> {
    /// Creates an empty table whose lookups fail as `kind`.
    pub fn new(kind: HandleKind) -> Self {
        Self {
            entries: HashMap::new(),
            next_index: 0,
            kind,
        }
    }

    /// Stores `value` under a fresh id and returns the id.
    pub fn insert(&mut self, value: V) -> usize {
        let id = self.next_index;
        self.next_index += 1;
        self.entries.insert(id, value);
        id
    }

    /// Returns the entry for `id`, or [`Error::NotFound`] if it was never
    /// inserted or has been removed.
    pub fn get(&self, id: usize) -> Result<&V> {
        self.entries
            .get(&id)
            .ok_or_else(|| Error::not_found(self.kind, id))
    }

    /// Returns the entry for `id` for writing.
    pub fn get_mut(&mut self, id: usize) -> Result<&mut V> {
        let kind = self.kind;
        self.entries
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(kind, id))
    }

    /// Removes and returns the entry. The id is retired for good.
    pub fn remove(&mut self, id: usize) -> Result<V> {
        self.entries
            .remove(&id)
            .ok_or_else(|| Error::not_found(self.kind, id))
    }

    /// Returns true if `id` is live.
    pub fn contains(&self, id: usize) -> bool {
        self.entries.contains_key(&id)
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entry is live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over live `(id, entry)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &V)> {
        self.entries.iter().map(|(id, v)| (*id, v))
    }

    /// Drops every entry without resetting the id counter.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
