//! In-memory ledger for testing.

use crate::backend::{CommitRequest, LedgerBackend, Version, Versioned};
use crate::error::{StorageError, StorageResult};
use crate::state::LedgerState;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// An in-memory ledger.
///
/// This backend keeps all state in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral ledgers that don't need persistence
///
/// It can be switched offline with [`InMemoryLedger::set_available`] to
/// exercise `Unavailable` propagation.
///
/// # Example
///
/// ```rust
/// use agritrace_storage::{CommitRequest, InMemoryLedger, LedgerBackend, Version};
/// use bytes::Bytes;
///
/// let ledger = InMemoryLedger::new();
/// let mut request = CommitRequest::default();
/// request.put("k", Bytes::from_static(b"v"));
/// assert_eq!(ledger.commit(request).unwrap(), Version::new(1));
/// ```
#[derive(Debug)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
    available: AtomicBool,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            available: AtomicBool::new(true),
        }
    }
}

impl InMemoryLedger {
    /// Creates a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().len()
    }

    /// Returns true if no key has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Toggles availability. While unavailable every call fails.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> StorageResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::unavailable("in-memory ledger is offline"))
        }
    }
}

impl LedgerBackend for InMemoryLedger {
    fn get(&self, key: &str) -> StorageResult<Option<Versioned>> {
        self.ensure_available()?;
        Ok(self.state.read().get(key))
    }

    fn scan(&self, start: &str, end: &str) -> StorageResult<Vec<(String, Versioned)>> {
        self.ensure_available()?;
        Ok(self.state.read().range(start, end))
    }

    fn commit(&self, request: CommitRequest) -> StorageResult<Version> {
        self.ensure_available()?;
        let mut state = self.state.write();
        state.validate(&request)?;
        Ok(state.apply(request.writes))
    }

    fn head(&self) -> StorageResult<Version> {
        self.ensure_available()?;
        Ok(self.state.read().head())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn put(ledger: &InMemoryLedger, key: &str, value: &'static [u8]) -> Version {
        let mut request = CommitRequest::default();
        request.put(key, Bytes::from_static(value));
        ledger.commit(request).unwrap()
    }

    #[test]
    fn memory_new_is_empty() {
        let ledger = InMemoryLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.head().unwrap(), Version::ZERO);
    }

    #[test]
    fn memory_commit_assigns_versions() {
        let ledger = InMemoryLedger::new();
        assert_eq!(put(&ledger, "a", b"1"), Version::new(1));
        assert_eq!(put(&ledger, "b", b"2"), Version::new(2));

        let a = ledger.get("a").unwrap().unwrap();
        assert_eq!(a.version, Version::new(1));
        assert_eq!(&a.value[..], b"1");
    }

    #[test]
    fn memory_exists() {
        let ledger = InMemoryLedger::new();
        put(&ledger, "a", b"1");
        assert!(ledger.exists("a").unwrap());
        assert!(!ledger.exists("b").unwrap());
    }

    #[test]
    fn memory_commit_is_all_or_nothing() {
        let ledger = InMemoryLedger::new();
        put(&ledger, "a", b"1");

        let mut request = CommitRequest::default();
        request.observe("a", Some(Version::ZERO));
        request.put("a", Bytes::from_static(b"2"));
        request.put("b", Bytes::from_static(b"3"));

        let err = ledger.commit(request).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(&ledger.get("a").unwrap().unwrap().value[..], b"1");
        assert!(ledger.get("b").unwrap().is_none());
    }

    #[test]
    fn memory_second_writer_conflicts() {
        let ledger = InMemoryLedger::new();
        let v1 = put(&ledger, "stock", b"10");

        let mut first = CommitRequest::default();
        first.observe("stock", Some(v1));
        first.put("stock", Bytes::from_static(b"6"));

        let mut second = CommitRequest::default();
        second.observe("stock", Some(v1));
        second.put("stock", Bytes::from_static(b"7"));

        ledger.commit(first).unwrap();
        assert!(ledger.commit(second).unwrap_err().is_conflict());
        assert_eq!(&ledger.get("stock").unwrap().unwrap().value[..], b"6");
    }

    #[test]
    fn memory_phantom_insert_conflicts() {
        let ledger = InMemoryLedger::new();

        let mut first = CommitRequest::default();
        first.observe_range("", "");
        first.put("PRICE_a", Bytes::from_static(b"5.0"));

        let mut second = CommitRequest::default();
        second.observe_range("", "");
        second.put("PRICE_b", Bytes::from_static(b"6.0"));

        ledger.commit(first).unwrap();
        assert!(ledger.commit(second).unwrap_err().is_conflict());
        assert!(ledger.get("PRICE_b").unwrap().is_none());
    }

    #[test]
    fn memory_offline_fails_every_call() {
        let ledger = InMemoryLedger::new();
        ledger.set_available(false);
        assert!(matches!(ledger.get("a"), Err(StorageError::Unavailable(_))));
        assert!(matches!(ledger.scan("", ""), Err(StorageError::Unavailable(_))));
        ledger.set_available(true);
        assert!(ledger.get("a").unwrap().is_none());
    }
}
