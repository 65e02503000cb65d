//! Committed key-value state shared by the backends.

use crate::backend::{CommitRequest, Version, Versioned};
use crate::error::{StorageError, StorageResult};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::ops::Bound;

/// The committed contents of a ledger.
#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    entries: BTreeMap<String, Versioned>,
    head: Version,
}

impl LedgerState {
    pub(crate) fn head(&self) -> Version {
        self.head
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn get(&self, key: &str) -> Option<Versioned> {
        self.entries.get(key).cloned()
    }

    pub(crate) fn range(&self, start: &str, end: &str) -> Vec<(String, Versioned)> {
        let lower = if start.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Included(start)
        };
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end)
        };

        // An inverted range is empty rather than a panic.
        if !start.is_empty() && !end.is_empty() && start >= end {
            return Vec::new();
        }

        self.entries
            .range::<str, _>((lower, upper))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Checks every observed version and range against the committed state.
    pub(crate) fn validate(&self, request: &CommitRequest) -> StorageResult<()> {
        for (key, observed) in &request.reads {
            let current = self.entries.get(key).map(|entry| entry.version);
            if current != *observed {
                return Err(StorageError::Conflict {
                    key: key.clone(),
                    observed: *observed,
                    current,
                });
            }
        }

        // Keys never delete, so a range can only change by gaining a key.
        for (start, end) in &request.ranges {
            for (key, entry) in self.range(start, end) {
                if !request.reads.contains_key(&key) {
                    return Err(StorageError::Conflict {
                        key,
                        observed: None,
                        current: Some(entry.version),
                    });
                }
            }
        }
        Ok(())
    }

    /// Applies a validated write set under the next version.
    pub(crate) fn apply(&mut self, writes: BTreeMap<String, Bytes>) -> Version {
        if writes.is_empty() {
            return self.head;
        }
        let version = self.head.next();
        self.apply_at(version, writes);
        version
    }

    /// Applies a write set at a known version (log replay).
    pub(crate) fn apply_at(&mut self, version: Version, writes: BTreeMap<String, Bytes>) {
        for (key, value) in writes {
            self.entries.insert(key, Versioned { value, version });
        }
        self.head = self.head.max(version);
    }
}
