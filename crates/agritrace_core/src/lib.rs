//! # AgriTrace Core
//!
//! Provenance and consistency engine for agricultural supply chains.
//!
//! This crate provides:
//! - Invocations: buffered writes that commit atomically against a
//!   versioned ledger, validated against everything they read
//! - The product lifecycle state machine
//! - Contract operations for products, cultivation, logistics, retail,
//!   consumers and end-to-end traces
//! - A name-based dispatcher for hosts that invoke operations by string
//!
//! ## Example
//!
//! ```rust
//! use agritrace_core::dispatch::{Caller, Dispatcher};
//! use agritrace_core::{AgriTrace, Ledger};
//!
//! let dispatcher = Dispatcher::new(AgriTrace::new(Ledger::in_memory()));
//! let caller = Caller::new("farmer-1");
//! dispatcher
//!     .invoke(&caller, "CreateProduct", &[r#"{"id":"P1","name":"Rice","farmerId":"F1"}"#])
//!     .unwrap();
//! let exists = dispatcher.invoke(&caller, "ProductExists", &["P1"]).unwrap();
//! assert_eq!(exists, "true");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
mod contract;
pub mod dispatch;
mod error;
mod invocation;
pub mod keys;
pub mod lifecycle;
pub mod query;
pub mod record;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Bounds, Config, TimestampPrecision};
pub use contract::{
    AgriTrace, AlertKind, BatchReport, EnvironmentAlert, EnvironmentBatch, OverrideRequest,
    ProductTrace, PurchaseReceipt, Reading, RejectedReading, SaleReceipt, StockUpdate,
    TraceEvent, TraceStage,
};
pub use dispatch::{Caller, Dispatcher, Operation};
pub use error::{CoreError, CoreResult};
pub use invocation::{Invocation, InvocationId, InvocationState, Ledger};

pub use agritrace_storage::{FileLedger, InMemoryLedger, LedgerBackend, Version};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
