//! # AgriTrace Storage
//!
//! Ledger store trait and backends for AgriTrace.
//!
//! This crate is the lowest layer of the system: a flat, string-keyed,
//! versioned key-value store. Values are **opaque bytes** - the store never
//! interprets them.
//!
//! ## Capabilities
//!
//! - Exact-key lookup ([`LedgerBackend::get`])
//! - Ordered range scan ([`LedgerBackend::scan`]), byte-lexicographic
//! - Atomic commit of a buffered write set, validated against the versions
//!   of every key the caller read ([`LedgerBackend::commit`])
//!
//! There are no secondary indexes and no deletes.
//!
//! ## Available Backends
//!
//! - [`InMemoryLedger`] - For testing and ephemeral use
//! - [`FileLedger`] - Durable, append-only commit log with an exclusive lock
//!
//! ## Example
//!
//! ```rust
//! use agritrace_storage::{CommitRequest, InMemoryLedger, LedgerBackend};
//! use bytes::Bytes;
//!
//! let ledger = InMemoryLedger::new();
//! let mut request = CommitRequest::default();
//! request.put("P1", Bytes::from_static(b"payload"));
//! ledger.commit(request).unwrap();
//!
//! let entry = ledger.get("P1").unwrap().unwrap();
//! assert_eq!(&entry.value[..], b"payload");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;
mod state;

pub use backend::{CommitRequest, LedgerBackend, Version, Versioned};
pub use error::{StorageError, StorageResult};
pub use file::FileLedger;
pub use memory::InMemoryLedger;
