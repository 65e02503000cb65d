//! Invocation state.

use crate::error::{CoreError, CoreResult};
use crate::record::Entity;
use agritrace_codec::{decode_record, encode_record, Record};
use agritrace_storage::{CommitRequest, LedgerBackend};
use bytes::Bytes;
use std::fmt;

/// Identifier of an invocation, unique within one [`crate::Ledger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InvocationId(u64);

impl InvocationId {
    /// Creates an id from its raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inv-{}", self.0)
    }
}

/// State of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    /// Reads and writes are accepted.
    Active,
    /// The write set has been applied.
    Committed,
    /// The write set was discarded.
    Aborted,
}

/// One contract call against the ledger.
///
/// Writes are buffered and only reach the ledger when the owning
/// [`crate::Ledger`] commits the invocation. Every key read is recorded with
/// the version it was observed at, and every scanned range is recorded too,
/// so that the commit is rejected if any of them changed in the meantime.
///
/// Point lookups see the invocation's own buffered writes. Scans see
/// committed state only.
pub struct Invocation<'l> {
    id: InvocationId,
    backend: &'l dyn LedgerBackend,
    state: InvocationState,
    request: CommitRequest,
}

impl fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("reads", &self.request.reads.len())
            .field("writes", &self.request.writes.len())
            .finish()
    }
}

impl<'l> Invocation<'l> {
    pub(crate) fn new(id: InvocationId, backend: &'l dyn LedgerBackend) -> Self {
        Self {
            id,
            backend,
            state: InvocationState::Active,
            request: CommitRequest::default(),
        }
    }

    /// Returns the invocation id.
    #[must_use]
    pub fn id(&self) -> InvocationId {
        self.id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> InvocationState {
        self.state
    }

    /// Checks if the invocation still accepts operations.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == InvocationState::Active
    }

    /// Returns the value of `key`, preferring this invocation's own writes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] if the ledger cannot be read.
    pub fn get(&mut self, key: &str) -> CoreResult<Option<Bytes>> {
        self.ensure_active()?;
        if let Some(pending) = self.request.writes.get(key) {
            return Ok(Some(pending.clone()));
        }
        let found = self.backend.get(key)?;
        self.request
            .observe(key, found.as_ref().map(|entry| entry.version));
        Ok(found.map(|entry| entry.value))
    }

    /// Returns true if `key` holds a value of any kind.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] if the ledger cannot be read.
    pub fn exists(&mut self, key: &str) -> CoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Buffers an upsert of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvocationClosed`] after commit or abort.
    pub fn put(&mut self, key: impl Into<String>, value: Bytes) -> CoreResult<()> {
        self.ensure_active()?;
        self.request.put(key, value);
        Ok(())
    }

    /// Returns committed entries with `start <= key < end` in key order.
    ///
    /// Buffered writes are not visible here.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] if the ledger cannot be read.
    pub fn scan(&mut self, start: &str, end: &str) -> CoreResult<Vec<(String, Bytes)>> {
        self.ensure_active()?;
        let entries = self.backend.scan(start, end)?;
        self.request.observe_range(start, end);
        Ok(entries
            .into_iter()
            .map(|(key, entry)| {
                self.request.observe(key.clone(), Some(entry.version));
                (key, entry.value)
            })
            .collect())
    }

    /// Looks up and decodes a record.
    ///
    /// # Errors
    ///
    /// Unlike during scans, a value of another kind or a malformed value is
    /// fatal here and returned as [`CoreError::Decode`].
    pub fn get_record<T: Record>(&mut self, key: &str) -> CoreResult<Option<T>> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(decode_record(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Encodes and buffers a record under its own key.
    ///
    /// # Errors
    ///
    /// Returns an error if the invocation is closed or encoding fails.
    pub fn put_record<T: Entity>(&mut self, record: &T) -> CoreResult<()> {
        let bytes = encode_record(record)?;
        self.put(record.entity_key().to_string(), bytes)
    }

    /// Returns the number of buffered writes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.request.writes.len()
    }

    /// Returns the number of keys observed.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.request.reads.len()
    }

    pub(crate) fn take_request(&mut self) -> CommitRequest {
        std::mem::take(&mut self.request)
    }

    pub(crate) fn mark_committed(&mut self) {
        self.state = InvocationState::Committed;
    }

    pub(crate) fn mark_aborted(&mut self) {
        self.state = InvocationState::Aborted;
        self.request = CommitRequest::default();
    }

    pub(crate) fn ensure_active(&self) -> CoreResult<()> {
        match self.state {
            InvocationState::Active => Ok(()),
            InvocationState::Committed | InvocationState::Aborted => {
                Err(CoreError::InvocationClosed)
            }
        }
    }
}
