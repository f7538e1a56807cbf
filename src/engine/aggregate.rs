use crate::model::{DedupKey, ItemKey};
use std::collections::BTreeMap;

/// Deduplicated set of terminal results
///
/// Results are keyed by their dedup key and tagged with the identity of the
/// work item that produced them. When two results share a key, the one whose
/// producing item sorts first is kept and the other is counted as a
/// collision. Each item is processed exactly once per run, so which value
/// survives depends only on the crawled content, never on which branch got
/// there first. Iteration follows key order.
pub struct ResultSet<R: DedupKey> {
    entries: BTreeMap<R::Key, Entry<R>>,
    collisions: u64,
}

struct Entry<R> {
    origin: ItemKey,
    result: R,
}

impl<R: DedupKey> ResultSet<R> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            collisions: 0,
        }
    }

    /// Collects the results produced by one work item
    pub fn from_item(origin: &ItemKey, results: impl IntoIterator<Item = R>) -> Self {
        let mut set = Self::new();
        for result in results {
            set.insert(origin, result);
        }
        set
    }

    /// Adds a result produced by `origin`
    ///
    /// Returns true if the result was stored. A result already present for
    /// the same key stays unless `origin` sorts strictly before its producer.
    pub fn insert(&mut self, origin: &ItemKey, result: R) -> bool {
        let key = result.dedup_key();
        self.place(
            key,
            Entry {
                origin: origin.clone(),
                result,
            },
        )
    }

    /// Folds `other` into this set
    ///
    /// The outcome is the same whichever side each result came from.
    pub fn merge(&mut self, other: ResultSet<R>) {
        self.collisions += other.collisions;

        if self.entries.is_empty() {
            self.entries = other.entries;
            return;
        }

        for (key, entry) in other.entries {
            self.place(key, entry);
        }
    }

    fn place(&mut self, key: R::Key, entry: Entry<R>) -> bool {
        match self.entries.get_mut(&key) {
            None => {
                self.entries.insert(key, entry);
                true
            }
            Some(existing) => {
                self.collisions += 1;
                if entry.origin < existing.origin {
                    *existing = entry;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of results dropped because another result had the same key
    pub fn collisions(&self) -> u64 {
        self.collisions
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.entries.values().map(|entry| &entry.result)
    }

    /// Results in key order
    pub fn into_vec(self) -> Vec<R> {
        self.entries.into_values().map(|entry| entry.result).collect()
    }
}

impl<R: DedupKey> Default for ResultSet<R> {
    fn default() -> Self {
        Self::new()
    }
}
