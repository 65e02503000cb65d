use super::AgriTrace;
use crate::error::{CoreError, CoreResult};
use crate::record::EnvironmentRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A batch of sensor readings from one device for one product.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentBatch {
    /// Reporting device.
    pub device_id: String,
    /// Product the readings belong to.
    pub product_id: String,
    /// The readings, in device order.
    pub records: Vec<Reading>,
}

/// One sensor reading.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Device-side time of the reading.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Which measurement an alert is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    /// Temperature out of bounds.
    TemperatureAlert,
    /// Humidity out of bounds.
    HumidityAlert,
}

/// An out-of-bounds reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentAlert {
    /// What was out of bounds.
    #[serde(rename = "type")]
    pub kind: AlertKind,
    /// The offending value.
    pub value: f64,
    /// Position of the reading in the batch.
    pub index: usize,
    /// Device time of the reading, or server time if it had none.
    pub timestamp: DateTime<Utc>,
    /// Reporting device.
    pub device_id: String,
    /// Product concerned.
    pub product_id: String,
}

/// A reading that was not stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedReading {
    /// Position of the reading in the batch.
    pub index: usize,
    /// Why it was rejected.
    pub error: String,
}

/// Outcome of a batch ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Stored records.
    pub accepted: Vec<EnvironmentRecord>,
    /// Readings that were not stored.
    pub rejected: Vec<RejectedReading>,
    /// Out-of-bounds measurements.
    pub alerts: Vec<EnvironmentAlert>,
}

impl AgriTrace {
    /// Stores a device's readings, each in its own invocation.
    ///
    /// A rejected reading does not stop the batch. Readings outside the
    /// configured bounds are rejected and reported as alerts.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] and stops if the ledger goes
    /// away mid-batch. Readings stored before that stay stored.
    pub fn ingest_environment_batch(&self, mut batch: EnvironmentBatch) -> CoreResult<BatchReport> {
        let mut report = BatchReport::default();
        let operator_id = format!("IOT_DEVICE_{}", batch.device_id);
        let readings = std::mem::take(&mut batch.records);

        for (index, reading) in readings.into_iter().enumerate() {
            let now = self.clock.now();
            let at = reading.timestamp.unwrap_or(now);
            self.collect_alerts(&batch, &reading, index, at, &mut report.alerts);

            let record = EnvironmentRecord {
                id: reading_id(&batch.device_id, now),
                product_id: batch.product_id.clone(),
                temperature: reading.temperature,
                humidity: reading.humidity,
                record_time: now,
                operator_id: operator_id.clone(),
            };
            match self.add_environment_record(record) {
                Ok(stored) => report.accepted.push(stored),
                Err(err @ CoreError::StoreUnavailable(_)) => return Err(err),
                Err(err) => report.rejected.push(RejectedReading {
                    index,
                    error: err.to_string(),
                }),
            }
        }

        tracing::info!(
            device = %batch.device_id,
            product = %batch.product_id,
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            alerts = report.alerts.len(),
            "environment batch ingested"
        );
        Ok(report)
    }

    fn collect_alerts(
        &self,
        batch: &EnvironmentBatch,
        reading: &Reading,
        index: usize,
        at: DateTime<Utc>,
        alerts: &mut Vec<EnvironmentAlert>,
    ) {
        let checks = [
            (
                AlertKind::TemperatureAlert,
                reading.temperature,
                self.config.temperature,
            ),
            (AlertKind::HumidityAlert, reading.humidity, self.config.humidity),
        ];
        for (kind, value, bounds) in checks {
            if !bounds.contains(value) {
                alerts.push(EnvironmentAlert {
                    kind,
                    value,
                    index,
                    timestamp: at,
                    device_id: batch.device_id.clone(),
                    product_id: batch.product_id.clone(),
                });
            }
        }
    }
}

fn reading_id(device_id: &str, at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("env_{device_id}_{}_{}", at.timestamp_millis(), &suffix[..9])
}
