use super::{check_range, ensure_vacant, load_product, require_id, require_product, AgriTrace};
use crate::error::CoreResult;
use crate::invocation::Invocation;
use crate::lifecycle;
use crate::query::find;
use crate::record::{EnvironmentRecord, ProductionRecord, ProductionType, QualityRecord};
use std::cmp::Ordering;

impl AgriTrace {
    /// Attaches a field operation to a product.
    ///
    /// A `HARVESTING` record also harvests the product, in the same
    /// invocation, using the record's date as the harvest date.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::ProductNotFound`] for an unknown product,
    /// [`crate::CoreError::AlreadyExists`] for a taken id, or
    /// [`crate::CoreError::InvalidTransition`] when harvesting a product that
    /// is not planting.
    pub fn add_production_record(
        &self,
        mut record: ProductionRecord,
    ) -> CoreResult<ProductionRecord> {
        require_id("production record", &record.id)?;
        let now = self.clock.now();
        record.created_at = now;

        self.ledger.invoke(|inv| {
            let mut product = load_product(inv, &record.product_id)?;
            ensure_vacant(inv, "production record", &record.id)?;
            if record.kind == ProductionType::Harvesting {
                lifecycle::harvest(&mut product, &record.date, now)?;
                inv.put_record(&product)?;
                tracing::info!(product = %product.id, date = %record.date, "product harvested");
            }
            inv.put_record(&record)
        })?;
        Ok(record)
    }

    /// Records an environment reading.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::OutOfRange`] if temperature or humidity is
    /// outside the configured bounds, before anything is read or written.
    pub fn add_environment_record(
        &self,
        mut record: EnvironmentRecord,
    ) -> CoreResult<EnvironmentRecord> {
        require_id("environment record", &record.id)?;
        if let Err(err) = self.check_environment(&record) {
            tracing::warn!(
                product = %record.product_id,
                temperature = record.temperature,
                humidity = record.humidity,
                "environment reading rejected: {err}"
            );
            return Err(err);
        }
        record.record_time = self.clock.now();

        self.ledger.invoke(|inv| {
            require_product(inv, &record.product_id)?;
            ensure_vacant(inv, "environment record", &record.id)?;
            inv.put_record(&record)
        })?;
        Ok(record)
    }

    /// Records a quality inspection.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::ProductNotFound`] for an unknown product or
    /// [`crate::CoreError::AlreadyExists`] for a taken id.
    pub fn add_quality_record(&self, mut record: QualityRecord) -> CoreResult<QualityRecord> {
        require_id("quality record", &record.id)?;
        record.record_time = self.clock.now();

        self.ledger.invoke(|inv| {
            require_product(inv, &record.product_id)?;
            ensure_vacant(inv, "quality record", &record.id)?;
            inv.put_record(&record)
        })?;
        Ok(record)
    }

    /// Lists a product's field operations.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::ProductNotFound`] for an unknown product.
    pub fn production_records(&self, product_id: &str) -> CoreResult<Vec<ProductionRecord>> {
        self.ledger.query(|inv| {
            require_product(inv, product_id)?;
            production_of(inv, product_id)
        })
    }

    /// Lists a product's environment readings.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::StoreUnavailable`] if the scan fails.
    pub fn environment_records(&self, product_id: &str) -> CoreResult<Vec<EnvironmentRecord>> {
        self.ledger.query(|inv| {
            find::<EnvironmentRecord>()
                .filter(|r| r.product_id == product_id)
                .order_by(|a, b| a.record_time.cmp(&b.record_time))
                .run(inv)
        })
    }

    /// Lists a product's inspections, latest stage first.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::ProductNotFound`] for an unknown product.
    pub fn quality_records(&self, product_id: &str) -> CoreResult<Vec<QualityRecord>> {
        self.ledger.query(|inv| {
            require_product(inv, product_id)?;
            quality_of(inv, product_id)
        })
    }

    /// Lists an inspector's inspections, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::StoreUnavailable`] if the scan fails.
    pub fn quality_records_by_inspector(
        &self,
        inspector_id: &str,
    ) -> CoreResult<Vec<QualityRecord>> {
        self.ledger.query(|inv| {
            find::<QualityRecord>()
                .filter(|r| r.inspector_id == inspector_id)
                .order_by(|a, b| b.record_time.cmp(&a.record_time))
                .run(inv)
        })
    }

    pub(crate) fn check_environment(&self, record: &EnvironmentRecord) -> CoreResult<()> {
        check_range("temperature", record.temperature, self.config.temperature)?;
        check_range("humidity", record.humidity, self.config.humidity)
    }
}

pub(crate) fn production_of(
    inv: &mut Invocation<'_>,
    product_id: &str,
) -> CoreResult<Vec<ProductionRecord>> {
    find::<ProductionRecord>()
        .filter(|r| r.product_id == product_id)
        .order_by(|a, b| a.created_at.cmp(&b.created_at))
        .run(inv)
}

pub(crate) fn quality_of(inv: &mut Invocation<'_>, product_id: &str) -> CoreResult<Vec<QualityRecord>> {
    find::<QualityRecord>()
        .filter(|r| r.product_id == product_id)
        .order_by(quality_order)
        .run(inv)
}

/// Later stage first, then newest first.
pub(crate) fn quality_order(a: &QualityRecord, b: &QualityRecord) -> Ordering {
    b.stage
        .rank()
        .cmp(&a.stage.rank())
        .then_with(|| b.record_time.cmp(&a.record_time))
}
