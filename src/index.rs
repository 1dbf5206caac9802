//! Lookup structures over a frozen entry set.
//!
//! Entries live in one name-sorted vector. Exact lookups go through a hash map
//! of positions; prefix lookups binary-search the vector for the first match
//! and walk forward, so a prefix result is always a contiguous slice.
//! Keys must already be canonical (upper case); case folding is the query
//! layer's concern.

use crate::entry::{Entry, IntrinsicName};
use std::collections::HashMap;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LookupIndex {
    entries: Vec<Entry>,
    by_name: HashMap<IntrinsicName, usize>,
}

impl LookupIndex {
    /// Sort `entries` by name and index them.
    ///
    /// Names are expected to be unique already; if not, the first entry after
    /// sorting wins and later ones are dropped from the index.
    pub fn build(mut entries: Vec<Entry>) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries.dedup_by(|later, earlier| later.name == earlier.name);

        let by_name = entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (entry.name.clone(), pos))
            .collect();
        Self { entries, by_name }
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.by_name.get(name).map(|&pos| &self.entries[pos])
    }

    /// All entries whose name starts with `partial`, in name order.
    pub fn prefix(&self, partial: &str) -> &[Entry] {
        let start = self
            .entries
            .partition_point(|entry| entry.name.as_str() < partial);
        let len = self.entries[start..]
            .partition_point(|entry| entry.name.as_str().starts_with(partial));
        &self.entries[start..start + len]
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
