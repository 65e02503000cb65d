//! Inspect command implementation.

use agritrace_codec::peek_kind;
use agritrace_core::{FileLedger, LedgerBackend};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Ledger inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Ledger path.
    pub path: String,
    /// Log file size in bytes.
    pub file_size: u64,
    /// Version of the latest commit.
    pub head: u64,
    /// Number of keys.
    pub key_count: usize,
    /// Keys per record kind.
    pub kinds: BTreeMap<String, usize>,
    /// Keys whose value carries no readable kind.
    pub unreadable: usize,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No ledger found at {:?}", path).into());
    }

    let ledger = FileLedger::open(path)?;
    let result = inspect(&ledger, path)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn inspect(ledger: &FileLedger, path: &Path) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let mut kinds = BTreeMap::new();
    let mut unreadable = 0;
    let entries = ledger.scan("", "")?;

    for (key, entry) in &entries {
        match peek_kind(&entry.value) {
            Ok(kind) => *kinds.entry(kind).or_insert(0) += 1,
            Err(err) => {
                tracing::debug!(%key, error = %err, "value has no readable kind");
                unreadable += 1;
            }
        }
    }

    Ok(InspectResult {
        path: path.display().to_string(),
        file_size: std::fs::metadata(path)?.len(),
        head: ledger.head()?.as_u64(),
        key_count: entries.len(),
        kinds,
        unreadable,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("AgriTrace Ledger Inspection");
    println!("===========================");
    println!();
    println!("Path: {}", result.path);
    println!("Size: {}", format_size(result.file_size));
    println!("Head: v{}", result.head);
    println!();
    println!("Keys: {}", result.key_count);
    for (kind, count) in &result.kinds {
        println!("  {kind:<20} {count}");
    }
    if result.unreadable > 0 {
        println!("  {:<20} {}", "(unreadable)", result.unreadable);
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agritrace_core::record::{Consumer, Product};
    use agritrace_core::{AgriTrace, Ledger};
    use std::sync::Arc;

    #[test]
    fn counts_keys_per_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.log");
        {
            let contract = AgriTrace::new(Ledger::new(Arc::new(FileLedger::open(&path).unwrap())));
            let product: Product = serde_json::from_str(r#"{"id":"P1","name":"Rice"}"#).unwrap();
            contract.create_product(product).unwrap();
            let consumer: Consumer = serde_json::from_str(r#"{"id":"C1","name":"Ann"}"#).unwrap();
            contract.register_consumer(consumer).unwrap();
        }

        let ledger = FileLedger::open(&path).unwrap();
        let result = inspect(&ledger, &path).unwrap();
        assert_eq!(result.key_count, 2);
        assert_eq!(result.kinds.get("product"), Some(&1));
        assert_eq!(result.kinds.get("consumer"), Some(&1));
        assert_eq!(result.unreadable, 0);
        assert_eq!(result.head, 2);
    }

    #[test]
    fn sizes() {
        assert_eq!(format_size(10), "10 bytes");
        assert_eq!(format_size(2048), "2.0 KB");
    }
}
