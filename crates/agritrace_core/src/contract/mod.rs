//! Contract operations.
//!
//! [`AgriTrace`] is the public face of the core. Each mutating operation runs
//! in its own invocation and either commits every write it made or none.
//! Queries run in invocations that are never committed.

mod admin;
mod consumers;
mod cultivation;
mod iot;
mod logistics;
mod products;
mod retail;
mod trace;

pub use admin::OverrideRequest;
pub use iot::{AlertKind, BatchReport, EnvironmentAlert, EnvironmentBatch, Reading, RejectedReading};
pub use retail::{PurchaseReceipt, SaleReceipt, StockUpdate};
pub use trace::{ProductTrace, TraceEvent, TraceStage};

use crate::clock::{Clock, SystemClock};
use crate::config::{Bounds, Config};
use crate::error::{CoreError, CoreResult};
use crate::invocation::{Invocation, Ledger};
use crate::keys;
use crate::record::{Consumer, Product};
use std::sync::Arc;

/// The AgriTrace contract.
///
/// # Example
///
/// ```rust
/// use agritrace_core::record::{Product, ProductStatus};
/// use agritrace_core::{AgriTrace, Ledger};
///
/// let contract = AgriTrace::new(Ledger::in_memory());
/// let product: Product =
///     serde_json::from_str(r#"{"id":"P1","name":"Rice","farmerId":"F1"}"#).unwrap();
/// contract.create_product(product).unwrap();
/// assert_eq!(contract.query_product("P1").unwrap().status, ProductStatus::Planting);
/// ```
pub struct AgriTrace {
    ledger: Ledger,
    config: Config,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AgriTrace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgriTrace")
            .field("ledger", &self.ledger)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AgriTrace {
    /// Creates a contract over `ledger` with default configuration.
    #[must_use]
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            config: Config::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Replaces the clock used for server-stamped fields.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the ledger handle.
    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

pub(crate) fn require_id(label: &str, id: &str) -> CoreResult<()> {
    if id.trim().is_empty() {
        return Err(CoreError::invalid_argument(format!("{label} id is required")));
    }
    Ok(())
}

/// Like [`require_id`], and also refuses ids under a reserved key prefix.
pub(crate) fn require_primary_id(label: &str, id: &str) -> CoreResult<()> {
    require_id(label, id)?;
    if !keys::is_primary(id) {
        return Err(CoreError::invalid_argument(format!(
            "{label} id {id} uses a reserved key prefix"
        )));
    }
    Ok(())
}

pub(crate) fn ensure_vacant(inv: &mut Invocation<'_>, kind: &'static str, key: &str) -> CoreResult<()> {
    if inv.exists(key)? {
        return Err(CoreError::already_exists(kind, key));
    }
    Ok(())
}

pub(crate) fn load_product(inv: &mut Invocation<'_>, product_id: &str) -> CoreResult<Product> {
    inv.get_record::<Product>(product_id)?
        .ok_or_else(|| CoreError::product_not_found(product_id))
}

pub(crate) fn require_product(inv: &mut Invocation<'_>, product_id: &str) -> CoreResult<()> {
    load_product(inv, product_id).map(|_| ())
}

pub(crate) fn require_consumer(inv: &mut Invocation<'_>, consumer_id: &str) -> CoreResult<()> {
    inv.get_record::<Consumer>(consumer_id)?
        .map(|_| ())
        .ok_or_else(|| CoreError::consumer_not_found(consumer_id))
}

pub(crate) fn check_range(field: &'static str, value: f64, bounds: Bounds) -> CoreResult<()> {
    if bounds.contains(value) {
        Ok(())
    } else {
        Err(CoreError::OutOfRange {
            field,
            value,
            min: bounds.min,
            max: bounds.max,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::clock::ManualClock;
    use crate::record::{Consumer, Product, ProductStatus};
    use chrono::{DateTime, TimeZone, Utc};

    pub(crate) fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    pub(crate) fn contract() -> (AgriTrace, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        let contract = AgriTrace::new(Ledger::in_memory()).with_clock(clock.clone());
        (contract, clock)
    }

    pub(crate) fn product(id: &str) -> Product {
        Product {
            id: id.into(),
            name: "Rice".into(),
            area: 2.5,
            planting_date: "2024-03-01".into(),
            harvest_date: None,
            status: ProductStatus::Planting,
            farmer_id: "F1".into(),
            location: "North field".into(),
            created_at: DateTime::default(),
            updated_at: DateTime::default(),
        }
    }

    pub(crate) fn consumer(id: &str) -> Consumer {
        Consumer {
            id: id.into(),
            name: "Ann".into(),
            phone: "555-0100".into(),
            created_at: DateTime::default(),
        }
    }

    /// Forces a product into `status` without going through the lifecycle.
    pub(crate) fn force_status(contract: &AgriTrace, id: &str, status: ProductStatus) {
        contract
            .ledger()
            .invoke(|inv| {
                let mut p = load_product(inv, id)?;
                p.status = status;
                inv.put_record(&p)
            })
            .unwrap();
    }
}
