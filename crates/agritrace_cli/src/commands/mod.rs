//! CLI command implementations.

pub mod inspect;
pub mod invoke;
pub mod trace;

use agritrace_core::{AgriTrace, FileLedger, Ledger};
use std::path::Path;
use std::sync::Arc;

/// Opens the ledger file at `path`, creating it if needed.
pub fn open_contract(path: &Path) -> Result<AgriTrace, Box<dyn std::error::Error>> {
    let backend = FileLedger::open_with_create_dirs(path)?;
    Ok(AgriTrace::new(Ledger::new(Arc::new(backend))))
}
