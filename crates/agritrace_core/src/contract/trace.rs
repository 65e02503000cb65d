use super::consumers::feedback_of;
use super::cultivation::{production_of, quality_of};
use super::logistics::logistics_of;
use super::{load_product, AgriTrace};
use crate::error::CoreResult;
use crate::record::{LogisticsRecord, Product, ProductFeedback, ProductionRecord, QualityRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The full history of one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTrace {
    /// The product itself.
    pub product: Product,
    /// Field operations, oldest first.
    pub production_records: Vec<ProductionRecord>,
    /// Inspections, latest stage first then newest first.
    pub quality_records: Vec<QualityRecord>,
    /// Logistics checkpoints, oldest first.
    pub logistics_records: Vec<LogisticsRecord>,
    /// Consumer feedback, newest first.
    pub feedbacks: Vec<ProductFeedback>,
}

/// Which part of the chain a timeline event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraceStage {
    /// Product registration.
    Registered,
    /// A field operation.
    Production,
    /// A quality inspection.
    Quality,
    /// A logistics checkpoint.
    Logistics,
    /// Consumer feedback.
    Feedback,
}

/// One entry of a flattened trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEvent {
    /// Server time of the underlying record.
    pub at: DateTime<Utc>,
    /// Chain stage.
    pub stage: TraceStage,
    /// Id of the underlying record.
    pub record_id: String,
    /// One-line description.
    pub summary: String,
}

impl ProductTrace {
    /// Flattens the trace into events ordered by time.
    ///
    /// Events at the same instant keep chain order: registration, production,
    /// quality, logistics, feedback.
    #[must_use]
    pub fn timeline(&self) -> Vec<TraceEvent> {
        let mut events = vec![TraceEvent {
            at: self.product.created_at,
            stage: TraceStage::Registered,
            record_id: self.product.id.clone(),
            summary: format!("{} registered by {}", self.product.name, self.product.farmer_id),
        }];
        events.extend(self.production_records.iter().map(|r| TraceEvent {
            at: r.created_at,
            stage: TraceStage::Production,
            record_id: r.id.clone(),
            summary: format!("{:?} on {} by {}", r.kind, r.date, r.operator_id),
        }));
        events.extend(self.quality_records.iter().map(|r| TraceEvent {
            at: r.record_time,
            stage: TraceStage::Quality,
            record_id: r.id.clone(),
            summary: format!(
                "{:?} {} inspection: {} ({})",
                r.stage,
                r.test_type,
                r.result,
                if r.is_qualified { "qualified" } else { "not qualified" }
            ),
        }));
        events.extend(self.logistics_records.iter().map(|r| TraceEvent {
            at: r.record_time,
            stage: TraceStage::Logistics,
            record_id: r.id.clone(),
            summary: format!("{:?} at {}", r.status, r.location),
        }));
        events.extend(self.feedbacks.iter().map(|f| TraceEvent {
            at: f.created_at,
            stage: TraceStage::Feedback,
            record_id: f.id.clone(),
            summary: format!("rated {} by {}", f.rating, f.consumer_id),
        }));
        events.sort_by_key(|event| event.at);
        events
    }
}

impl AgriTrace {
    /// Assembles a product's full history in one read-only invocation.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::ProductNotFound`] before any query runs if
    /// the product does not exist. Any query failure aborts the assembly.
    pub fn product_trace(&self, product_id: &str) -> CoreResult<ProductTrace> {
        self.ledger.query(|inv| {
            let product = load_product(inv, product_id)?;
            Ok(ProductTrace {
                production_records: production_of(inv, product_id)?,
                quality_records: quality_of(inv, product_id)?,
                logistics_records: logistics_of(inv, product_id)?,
                feedbacks: feedback_of(inv, product_id)?,
                product,
            })
        })
    }
}
