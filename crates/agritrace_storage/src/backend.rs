//! Ledger backend trait definition.

use crate::error::StorageResult;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;

/// Commit sequence number.
///
/// Every successful commit receives the next version, and every key written
/// by that commit carries it until it is overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version(u64);

impl Version {
    /// The version of an empty ledger.
    pub const ZERO: Self = Self(0);

    /// Creates a version from its raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the version following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A stored value together with the version that wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    /// The opaque value bytes.
    pub value: Bytes,
    /// Version of the commit that last wrote the key.
    pub version: Version,
}

/// A buffered write set plus the read set it was derived from.
///
/// The backend applies `writes` only if every key in `reads` is still at the
/// observed version (`None` meaning "was absent") and no key has appeared in
/// a scanned range since the scan.
#[derive(Debug, Clone, Default)]
pub struct CommitRequest {
    /// Keys read by the invocation and the version each was observed at.
    pub reads: BTreeMap<String, Option<Version>>,
    /// Scanned `[start, end)` ranges. Every key they returned is in `reads`.
    pub ranges: Vec<(String, String)>,
    /// Keys to upsert.
    pub writes: BTreeMap<String, Bytes>,
}

impl CommitRequest {
    /// Records an observed version for `key`. The first observation wins.
    pub fn observe(&mut self, key: impl Into<String>, version: Option<Version>) {
        self.reads.entry(key.into()).or_insert(version);
    }

    /// Records a scan of `[start, end)`. The caller must also observe every
    /// key the scan returned.
    pub fn observe_range(&mut self, start: impl Into<String>, end: impl Into<String>) {
        let range = (start.into(), end.into());
        if !self.ranges.contains(&range) {
            self.ranges.push(range);
        }
    }

    /// Buffers an upsert of `key`.
    pub fn put(&mut self, key: impl Into<String>, value: Bytes) {
        self.writes.insert(key.into(), value);
    }

    /// Returns true if nothing would be written.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.writes.is_empty()
    }
}

/// A versioned, string-keyed ledger.
///
/// Backends are **opaque byte stores** with two query primitives: exact-key
/// lookup and ordered range scan. AgriTrace owns all record interpretation.
///
/// # Invariants
///
/// - `scan` yields keys in byte-lexicographic order
/// - `commit` is all-or-nothing
/// - `commit` fails with [`crate::StorageError::Conflict`] if any read key moved
///   or a key appeared inside an observed range
/// - Backends must be `Send + Sync`; concurrent invocations share one backend
pub trait LedgerBackend: Send + Sync {
    /// Returns the committed value and version for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get(&self, key: &str) -> StorageResult<Option<Versioned>>;

    /// Returns all committed entries with `start <= key < end`.
    ///
    /// An empty `start` means "from the first key"; an empty `end` means
    /// "through the last key".
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn scan(&self, start: &str, end: &str) -> StorageResult<Vec<(String, Versioned)>>;

    /// Validates `request.reads` and atomically applies `request.writes`.
    ///
    /// Returns the version assigned to the commit. A request without writes
    /// is validated but does not advance the version.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::Conflict`] if validation fails, or an
    /// I/O error if the write set cannot be made durable.
    fn commit(&self, request: CommitRequest) -> StorageResult<Version>;

    /// Returns the version of the latest commit.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn head(&self) -> StorageResult<Version>;

    /// Returns true if `key` holds a committed value.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
