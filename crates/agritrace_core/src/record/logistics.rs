use super::Entity;
use agritrace_codec::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transport status of a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogisticsStatus {
    /// On the way.
    InTransit,
    /// Arrived.
    Delivered,
}

/// A logistics checkpoint for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogisticsRecord {
    /// Unique record id.
    pub id: String,
    /// The product shipped.
    pub product_id: String,
    /// Current location.
    #[serde(default)]
    pub location: String,
    /// Transport status.
    pub status: LogisticsStatus,
    /// Free-form notes.
    #[serde(default)]
    pub description: String,
    /// Who handled it.
    #[serde(default)]
    pub operator_id: String,
    /// Server time of the last write.
    #[serde(default)]
    pub record_time: DateTime<Utc>,
}

impl LogisticsRecord {
    /// Applies an in-place update. Absent fields are kept.
    pub fn apply(&mut self, update: LogisticsUpdate, at: DateTime<Utc>) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(location) = update.location {
            self.location = location;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        self.record_time = at;
    }
}

impl Record for LogisticsRecord {
    const KIND: &'static str = "logistics_record";
}

impl Entity for LogisticsRecord {
    const LABEL: &'static str = "logistics record";

    fn entity_key(&self) -> &str {
        &self.id
    }
}

/// Fields of a logistics record that may change after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogisticsUpdate {
    /// New status.
    #[serde(default)]
    pub status: Option<LogisticsStatus>,
    /// New location.
    #[serde(default)]
    pub location: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn update_keeps_absent_fields() {
        let mut record = LogisticsRecord {
            id: "L1".into(),
            product_id: "P1".into(),
            location: "Farm".into(),
            status: LogisticsStatus::InTransit,
            description: "loaded".into(),
            operator_id: "O1".into(),
            record_time: DateTime::default(),
        };
        let at = Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap();
        record.apply(
            LogisticsUpdate {
                status: Some(LogisticsStatus::Delivered),
                location: Some("Market".into()),
                description: None,
            },
            at,
        );
        assert_eq!(record.status, LogisticsStatus::Delivered);
        assert_eq!(record.location, "Market");
        assert_eq!(record.description, "loaded");
        assert_eq!(record.record_time, at);
    }
}
