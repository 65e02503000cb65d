//! Invocation management.
//!
//! An invocation is the unit of atomicity: all writes of one contract call
//! commit together or not at all, validated against everything it read.

mod ledger;
mod state;

pub use ledger::Ledger;
pub use state::{Invocation, InvocationId, InvocationState};
