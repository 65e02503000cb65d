use super::Entity;
use agritrace_codec::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of field operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductionType {
    /// Sowing.
    Planting,
    /// Fertilizer applied.
    Fertilizing,
    /// Crop harvested. Moves the product to `HARVESTED`.
    Harvesting,
}

/// A field operation performed on a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionRecord {
    /// Unique record id.
    pub id: String,
    /// The product operated on.
    pub product_id: String,
    /// What was done.
    #[serde(rename = "type")]
    pub kind: ProductionType,
    /// When it was done, as supplied by the operator.
    #[serde(default)]
    pub date: String,
    /// Free-form notes.
    #[serde(default)]
    pub description: String,
    /// Who did it.
    #[serde(default)]
    pub operator_id: String,
    /// Server time of recording.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl Record for ProductionRecord {
    const KIND: &'static str = "production_record";
}

impl Entity for ProductionRecord {
    const LABEL: &'static str = "production record";

    fn entity_key(&self) -> &str {
        &self.id
    }
}

/// A temperature and humidity reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentRecord {
    /// Unique record id.
    pub id: String,
    /// The product measured.
    pub product_id: String,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Server time of recording.
    #[serde(default)]
    pub record_time: DateTime<Utc>,
    /// Who or what recorded it.
    #[serde(default)]
    pub operator_id: String,
}

impl Record for EnvironmentRecord {
    const KIND: &'static str = "environment_record";
}

impl Entity for EnvironmentRecord {
    const LABEL: &'static str = "environment record";

    fn entity_key(&self) -> &str {
        &self.id
    }
}

/// Growth stage at which a quality inspection happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityStage {
    /// At sowing.
    Planting,
    /// During growth.
    Growing,
    /// At harvest.
    Harvesting,
}

impl QualityStage {
    /// Ordering weight: later stages rank higher.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Planting => 1,
            Self::Growing => 2,
            Self::Harvesting => 3,
        }
    }
}

/// A quality inspection result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityRecord {
    /// Unique record id.
    pub id: String,
    /// The product inspected.
    pub product_id: String,
    /// Stage of the inspection.
    pub stage: QualityStage,
    /// Kind of test.
    #[serde(default)]
    pub test_type: String,
    /// Test outcome.
    #[serde(default)]
    pub result: String,
    /// Whether the product passed.
    #[serde(default)]
    pub is_qualified: bool,
    /// Server time of recording.
    #[serde(default)]
    pub record_time: DateTime<Utc>,
    /// Who inspected.
    #[serde(default)]
    pub inspector_id: String,
}

impl Record for QualityRecord {
    const KIND: &'static str = "quality_record";
}

impl Entity for QualityRecord {
    const LABEL: &'static str = "quality record";

    fn entity_key(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_rank_orders_later_stages_higher() {
        assert!(QualityStage::Harvesting.rank() > QualityStage::Growing.rank());
        assert!(QualityStage::Growing.rank() > QualityStage::Planting.rank());
    }

    #[test]
    fn production_type_uses_type_field() {
        let record: ProductionRecord = serde_json::from_str(
            r#"{"id":"R1","productId":"P1","type":"HARVESTING","date":"2024-05-01"}"#,
        )
        .unwrap();
        assert_eq!(record.kind, ProductionType::Harvesting);
        assert_eq!(record.date, "2024-05-01");
    }

    #[test]
    fn unknown_stage_is_rejected() {
        let result: Result<QualityRecord, _> =
            serde_json::from_str(r#"{"id":"Q1","productId":"P1","stage":"RIPENING"}"#);
        assert!(result.is_err());
    }
}
