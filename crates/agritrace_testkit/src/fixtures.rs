//! Test fixtures and contract helpers.
//!
//! Provides contracts over throwaway ledgers and builders for the records
//! the contract operations take.

use agritrace_core::record::{
    Consumer, ConsumerPurchase, EnvironmentRecord, LogisticsRecord, LogisticsStatus, PriceRecord,
    PriceStatus, Product, ProductFeedback, ProductStatus, ProductionRecord, ProductionType,
    QualityRecord, QualityStage, RetailInventory, Retailer, SalesRecord,
};
use agritrace_core::{AgriTrace, Config, Ledger, ManualClock};
use agritrace_storage::{FileLedger, InMemoryLedger};
use chrono::{DateTime, TimeZone, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Start time of every fixture clock: 2024-05-01 08:00:00 UTC.
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0)
        .single()
        .expect("valid fixture time")
}

/// A contract over a throwaway ledger, driven by a manual clock.
pub struct TestChain {
    /// The contract under test.
    pub contract: AgriTrace,
    /// The clock the contract reads.
    pub clock: Arc<ManualClock>,
    memory: Option<Arc<InMemoryLedger>>,
    path: Option<PathBuf>,
    _temp_dir: Option<TempDir>,
}

impl TestChain {
    /// Creates a chain over an in-memory ledger.
    pub fn memory() -> Self {
        let backend = Arc::new(InMemoryLedger::new());
        let clock = Arc::new(ManualClock::new(start_time()));
        let contract = AgriTrace::new(Ledger::new(backend.clone())).with_clock(clock.clone());
        Self {
            contract,
            clock,
            memory: Some(backend),
            path: None,
            _temp_dir: None,
        }
    }

    /// Creates a chain over a ledger file in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("ledger.log");
        let clock = Arc::new(ManualClock::new(start_time()));
        let contract = Self::open_file(&path, clock.clone());
        Self {
            contract,
            clock,
            memory: None,
            path: Some(path),
            _temp_dir: Some(temp_dir),
        }
    }

    fn open_file(path: &std::path::Path, clock: Arc<ManualClock>) -> AgriTrace {
        let backend = FileLedger::open(path).expect("Failed to open ledger file");
        AgriTrace::new(Ledger::new(Arc::new(backend))).with_clock(clock)
    }

    /// Replaces the contract configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.contract = self.contract.with_config(config);
        self
    }

    /// Closes and reopens a file-backed chain, replaying its log.
    ///
    /// # Panics
    ///
    /// Panics for an in-memory chain.
    pub fn reopen(self) -> Self {
        let Self {
            contract,
            clock,
            path,
            _temp_dir,
            ..
        } = self;
        let path = path.expect("only file-backed chains can be reopened");
        drop(contract);
        let contract = Self::open_file(&path, clock.clone());
        Self {
            contract,
            clock,
            memory: None,
            path: Some(path),
            _temp_dir,
        }
    }

    /// Makes the in-memory ledger fail, or recover.
    ///
    /// # Panics
    ///
    /// Panics for a file-backed chain.
    pub fn set_available(&self, available: bool) {
        self.memory
            .as_ref()
            .expect("only in-memory chains can be taken offline")
            .set_available(available);
    }

    /// Advances the clock by whole seconds.
    pub fn tick(&self, seconds: i64) {
        self.clock.advance(chrono::Duration::seconds(seconds));
    }

    /// Returns the ledger file path if file-backed.
    pub fn path(&self) -> Option<&std::path::Path> {
        self.path.as_deref()
    }

    /// Creates a product and walks it to `ON_SALE`.
    pub fn product_on_sale(&self, product_id: &str) {
        self.contract
            .create_product(product(product_id, "F1"))
            .expect("create product");
        self.contract
            .add_production_record(production(
                &format!("{product_id}-harvest"),
                product_id,
                ProductionType::Harvesting,
            ))
            .expect("harvest");
        self.contract
            .put_product_on_sale(product_id)
            .expect("put on sale");
    }

    /// Creates a product, a consumer and a stocked inventory row.
    pub fn stocked(&self, product_id: &str, retailer_id: &str, quantity: u32, min_quantity: u32) {
        self.product_on_sale(product_id);
        self.contract
            .register_consumer(consumer("C1"))
            .expect("register consumer");
        self.contract
            .add_retail_inventory(inventory(
                &format!("{product_id}-{retailer_id}"),
                product_id,
                retailer_id,
                quantity,
                min_quantity,
            ))
            .expect("add inventory");
    }
}

impl std::ops::Deref for TestChain {
    type Target = AgriTrace;

    fn deref(&self) -> &Self::Target {
        &self.contract
    }
}

/// Runs a test with an in-memory chain.
pub fn with_chain<F, R>(f: F) -> R
where
    F: FnOnce(&TestChain) -> R,
{
    let chain = TestChain::memory();
    f(&chain)
}

/// A product owned by `farmer_id`.
pub fn product(id: &str, farmer_id: &str) -> Product {
    Product {
        id: id.into(),
        name: format!("product {id}"),
        area: 1.5,
        planting_date: "2024-03-01".into(),
        harvest_date: None,
        status: ProductStatus::Planting,
        farmer_id: farmer_id.into(),
        location: "North field".into(),
        created_at: DateTime::default(),
        updated_at: DateTime::default(),
    }
}

/// A production record dated 2024-05-01.
pub fn production(id: &str, product_id: &str, kind: ProductionType) -> ProductionRecord {
    ProductionRecord {
        id: id.into(),
        product_id: product_id.into(),
        kind,
        date: "2024-05-01".into(),
        description: String::new(),
        operator_id: "OP1".into(),
        created_at: DateTime::default(),
    }
}

/// An environment reading.
pub fn environment(id: &str, product_id: &str, temperature: f64, humidity: f64) -> EnvironmentRecord {
    EnvironmentRecord {
        id: id.into(),
        product_id: product_id.into(),
        temperature,
        humidity,
        record_time: DateTime::default(),
        operator_id: "OP1".into(),
    }
}

/// A quality inspection by inspector `Q1`.
pub fn quality(id: &str, product_id: &str, stage: QualityStage, qualified: bool) -> QualityRecord {
    QualityRecord {
        id: id.into(),
        product_id: product_id.into(),
        stage,
        test_type: "pesticide".into(),
        result: if qualified { "pass".into() } else { "fail".into() },
        is_qualified: qualified,
        record_time: DateTime::default(),
        inspector_id: "Q1".into(),
    }
}

/// A logistics checkpoint by operator `L1`.
pub fn logistics(id: &str, product_id: &str, status: LogisticsStatus, location: &str) -> LogisticsRecord {
    LogisticsRecord {
        id: id.into(),
        product_id: product_id.into(),
        location: location.into(),
        status,
        description: String::new(),
        operator_id: "L1".into(),
        record_time: DateTime::default(),
    }
}

/// An inventory row.
pub fn inventory(
    id: &str,
    product_id: &str,
    retailer_id: &str,
    quantity: u32,
    min_quantity: u32,
) -> RetailInventory {
    RetailInventory {
        id: id.into(),
        product_id: product_id.into(),
        retailer_id: retailer_id.into(),
        quantity,
        min_quantity,
        updated_at: DateTime::default(),
    }
}

/// A direct sale.
pub fn sale(id: &str, product_id: &str, retailer_id: &str, quantity: u32, unit_price: f64) -> SalesRecord {
    SalesRecord {
        id: id.into(),
        product_id: product_id.into(),
        retailer_id: retailer_id.into(),
        consumer_id: String::new(),
        quantity,
        unit_price,
        total_amount: 0.0,
        sale_time: DateTime::default(),
        payment_type: "cash".into(),
        purchase_code: String::new(),
    }
}

/// A consumer purchase.
pub fn purchase(
    id: &str,
    product_id: &str,
    consumer_id: &str,
    retailer_id: &str,
    quantity: u32,
    unit_price: f64,
) -> ConsumerPurchase {
    ConsumerPurchase {
        id: id.into(),
        sales_id: String::new(),
        product_id: product_id.into(),
        consumer_id: consumer_id.into(),
        retailer_id: retailer_id.into(),
        quantity,
        unit_price,
        total_amount: 0.0,
        purchase_time: DateTime::default(),
        payment_type: "card".into(),
        purchase_code: String::new(),
    }
}

/// A price offer.
pub fn price(id: &str, product_id: &str, retailer_id: &str, value: f64) -> PriceRecord {
    PriceRecord {
        id: id.into(),
        product_id: product_id.into(),
        retailer_id: retailer_id.into(),
        price: value,
        status: PriceStatus::Active,
        start_time: DateTime::default(),
        end_time: None,
    }
}

/// A consumer.
pub fn consumer(id: &str) -> Consumer {
    Consumer {
        id: id.into(),
        name: format!("consumer {id}"),
        phone: "555-0100".into(),
        created_at: DateTime::default(),
    }
}

/// A retailer.
pub fn retailer(id: &str, name: &str) -> Retailer {
    Retailer {
        id: id.into(),
        name: name.into(),
        address: String::new(),
        phone: String::new(),
        created_at: DateTime::default(),
    }
}

/// A rating.
pub fn feedback(id: &str, product_id: &str, consumer_id: &str, rating: i32) -> ProductFeedback {
    ProductFeedback {
        id: id.into(),
        product_id: product_id.into(),
        consumer_id: consumer_id.into(),
        rating,
        comment: String::new(),
        created_at: DateTime::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_chain_starts_empty() {
        with_chain(|chain| {
            assert!(chain.products_by_farmer("F1").unwrap().is_empty());
            assert!(chain.path().is_none());
        });
    }

    #[test]
    fn stocked_chain() {
        let chain = TestChain::memory();
        chain.stocked("P1", "R1", 10, 2);
        assert_eq!(chain.query_product("P1").unwrap().status, ProductStatus::OnSale);
        let rows = chain.inventory_by_retailer("R1").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "INV_P1-R1");
    }
}
