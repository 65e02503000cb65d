//! Typed ledger records.
//!
//! Every record type implements [`Record`] (its stable envelope kind) and
//! [`Entity`] (the key it is stored under). Field names and enum spellings
//! are part of the persisted and wire format.

mod audit;
mod farming;
mod logistics;
mod party;
mod product;
mod retail;

pub use audit::StatusOverride;
pub use farming::{
    EnvironmentRecord, ProductionRecord, ProductionType, QualityRecord, QualityStage,
};
pub use logistics::{LogisticsRecord, LogisticsStatus, LogisticsUpdate};
pub use party::{Consumer, ConsumerPurchase, ProductFeedback, Retailer};
pub use product::{Product, ProductStatus};
pub use retail::{LowStockAlert, PriceRecord, PriceStatus, RetailInventory, SalesRecord};

use agritrace_codec::Record;

/// A record that is stored under its own id.
pub trait Entity: Record {
    /// Human-readable name used in error messages.
    const LABEL: &'static str;

    /// Returns the ledger key of this record.
    fn entity_key(&self) -> &str;
}
