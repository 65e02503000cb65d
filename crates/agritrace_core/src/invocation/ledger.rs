use crate::error::{CoreError, CoreResult};
use crate::invocation::state::{Invocation, InvocationId};
use agritrace_storage::{InMemoryLedger, LedgerBackend, Version};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Handle to a ledger backend that runs invocations against it.
///
/// `Ledger` is cheap to share: clone the backend `Arc` into as many handles
/// as needed. Concurrent invocations are isolated only by commit-time
/// validation; a loser surfaces as [`CoreError::Conflict`] and is never
/// retried here.
///
/// # Example
///
/// ```rust
/// use agritrace_core::Ledger;
/// use bytes::Bytes;
///
/// let ledger = Ledger::in_memory();
/// ledger
///     .invoke(|inv| inv.put("P1", Bytes::from_static(b"...")))
///     .unwrap();
/// assert!(ledger.query(|inv| inv.exists("P1")).unwrap());
/// ```
pub struct Ledger {
    backend: Arc<dyn LedgerBackend>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Ledger {
    /// Wraps a backend.
    pub fn new(backend: Arc<dyn LedgerBackend>) -> Self {
        Self {
            backend,
            next_id: AtomicU64::new(1),
        }
    }

    /// Creates a ledger over a fresh [`InMemoryLedger`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryLedger::new()))
    }

    /// Returns the backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn LedgerBackend> {
        &self.backend
    }

    /// Returns the version of the latest commit.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] if the ledger cannot be read.
    pub fn head(&self) -> CoreResult<Version> {
        Ok(self.backend.head()?)
    }

    /// Begins a new invocation.
    pub fn begin(&self) -> Invocation<'_> {
        let id = InvocationId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        Invocation::new(id, self.backend.as_ref())
    }

    /// Commits an invocation's buffered writes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Conflict`] if anything the invocation read has
    /// changed, or [`CoreError::StoreUnavailable`] if the write fails. In both
    /// cases nothing is written and the invocation is aborted.
    pub fn commit(&self, inv: &mut Invocation<'_>) -> CoreResult<Version> {
        inv.ensure_active()?;
        let request = inv.take_request();
        let writes = request.writes.len();
        let reads = request.reads.len();

        match self.backend.commit(request) {
            Ok(version) => {
                inv.mark_committed();
                tracing::debug!(invocation = %inv.id(), %version, writes, reads, "invocation committed");
                Ok(version)
            }
            Err(err) => {
                inv.mark_aborted();
                let err = CoreError::from(err);
                tracing::debug!(invocation = %inv.id(), error = %err, "invocation rejected");
                Err(err)
            }
        }
    }

    /// Aborts an invocation, discarding its writes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvocationClosed`] if it already finished.
    pub fn abort(&self, inv: &mut Invocation<'_>) -> CoreResult<()> {
        inv.ensure_active()?;
        inv.mark_aborted();
        Ok(())
    }

    /// Runs `f` in a new invocation and commits it if `f` succeeds.
    ///
    /// If `f` returns an error the invocation is aborted and nothing is
    /// written.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or the commit error.
    pub fn invoke<F, T>(&self, f: F) -> CoreResult<T>
    where
        F: FnOnce(&mut Invocation<'_>) -> CoreResult<T>,
    {
        let mut inv = self.begin();
        match f(&mut inv) {
            Ok(value) => {
                self.commit(&mut inv)?;
                Ok(value)
            }
            Err(err) => {
                let _ = self.abort(&mut inv);
                Err(err)
            }
        }
    }

    /// Runs a read-only `f` in a new invocation that is never committed.
    ///
    /// Writes buffered by `f` are discarded.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`.
    pub fn query<F, T>(&self, f: F) -> CoreResult<T>
    where
        F: FnOnce(&mut Invocation<'_>) -> CoreResult<T>,
    {
        let mut inv = self.begin();
        let result = f(&mut inv);
        let _ = self.abort(&mut inv);
        result
    }
}
