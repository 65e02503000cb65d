use super::{ensure_vacant, require_id, require_product, AgriTrace};
use crate::error::{CoreError, CoreResult};
use crate::invocation::Invocation;
use crate::query::find;
use crate::record::{Entity, LogisticsRecord, LogisticsUpdate};

impl AgriTrace {
    /// Records a logistics checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::ProductNotFound`] for an unknown product or
    /// [`crate::CoreError::AlreadyExists`] for a taken id.
    pub fn add_logistics_record(&self, mut record: LogisticsRecord) -> CoreResult<LogisticsRecord> {
        require_id("logistics record", &record.id)?;
        record.record_time = self.clock.now();

        self.ledger.invoke(|inv| {
            require_product(inv, &record.product_id)?;
            ensure_vacant(inv, LogisticsRecord::LABEL, &record.id)?;
            inv.put_record(&record)
        })?;
        Ok(record)
    }

    /// Looks up a logistics record.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::NotFound`] if it does not exist.
    pub fn logistics_record(&self, record_id: &str) -> CoreResult<LogisticsRecord> {
        self.ledger.query(|inv| load_logistics(inv, record_id))
    }

    /// Updates a logistics record in place and restamps its time.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::NotFound`] if it does not exist.
    pub fn update_logistics_record(
        &self,
        record_id: &str,
        update: LogisticsUpdate,
    ) -> CoreResult<LogisticsRecord> {
        let now = self.clock.now();
        self.ledger.invoke(|inv| {
            let mut record = load_logistics(inv, record_id)?;
            record.apply(update, now);
            inv.put_record(&record)?;
            Ok(record)
        })
    }

    /// Lists a product's logistics records in time order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::StoreUnavailable`] if the scan fails.
    pub fn logistics_by_product(&self, product_id: &str) -> CoreResult<Vec<LogisticsRecord>> {
        self.ledger.query(|inv| logistics_of(inv, product_id))
    }

    /// Lists an operator's logistics records, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::StoreUnavailable`] if the scan fails.
    pub fn logistics_by_operator(&self, operator_id: &str) -> CoreResult<Vec<LogisticsRecord>> {
        self.ledger.query(|inv| {
            find::<LogisticsRecord>()
                .filter(|r| r.operator_id == operator_id)
                .order_by(|a, b| b.record_time.cmp(&a.record_time))
                .run(inv)
        })
    }
}

fn load_logistics(inv: &mut Invocation<'_>, record_id: &str) -> CoreResult<LogisticsRecord> {
    inv.get_record::<LogisticsRecord>(record_id)?
        .ok_or_else(|| CoreError::not_found(LogisticsRecord::LABEL, record_id))
}

pub(crate) fn logistics_of(
    inv: &mut Invocation<'_>,
    product_id: &str,
) -> CoreResult<Vec<LogisticsRecord>> {
    find::<LogisticsRecord>()
        .filter(|r| r.product_id == product_id)
        .order_by(|a, b| a.record_time.cmp(&b.record_time))
        .run(inv)
}
