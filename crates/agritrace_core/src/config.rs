//! Contract configuration.

use chrono::{DateTime, Utc};

/// Granularity of the timestamp embedded in purchase codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampPrecision {
    /// Whole seconds since the Unix epoch.
    Seconds,
    /// Milliseconds since the Unix epoch.
    #[default]
    Millis,
}

impl TimestampPrecision {
    /// Renders `at` at this precision.
    #[must_use]
    pub fn stamp(self, at: DateTime<Utc>) -> i64 {
        match self {
            Self::Seconds => at.timestamp(),
            Self::Millis => at.timestamp_millis(),
        }
    }
}

/// An inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Lowest accepted value.
    pub min: f64,
    /// Highest accepted value.
    pub max: f64,
}

impl Bounds {
    /// Creates bounds `[min, max]`.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns true if `value` lies within the bounds.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Configuration for the AgriTrace contract.
#[derive(Debug, Clone)]
pub struct Config {
    /// Accepted environment temperature, in degrees Celsius.
    pub temperature: Bounds,

    /// Accepted relative humidity, in percent.
    pub humidity: Bounds,

    /// Accepted feedback rating.
    pub rating: Bounds,

    /// Whether low-stock alerts are logged at warn level.
    pub low_stock_alerts: bool,

    /// Timestamp granularity used in purchase codes.
    pub purchase_code_precision: TimestampPrecision,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            temperature: Bounds::new(0.0, 35.0),
            humidity: Bounds::new(0.0, 100.0),
            rating: Bounds::new(1.0, 5.0),
            low_stock_alerts: true,
            purchase_code_precision: TimestampPrecision::Millis,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the accepted temperature range.
    #[must_use]
    pub const fn temperature(mut self, min: f64, max: f64) -> Self {
        self.temperature = Bounds::new(min, max);
        self
    }

    /// Sets the accepted humidity range.
    #[must_use]
    pub const fn humidity(mut self, min: f64, max: f64) -> Self {
        self.humidity = Bounds::new(min, max);
        self
    }

    /// Sets the accepted rating range.
    #[must_use]
    pub const fn rating(mut self, min: f64, max: f64) -> Self {
        self.rating = Bounds::new(min, max);
        self
    }

    /// Sets whether low-stock alerts are logged.
    #[must_use]
    pub const fn low_stock_alerts(mut self, value: bool) -> Self {
        self.low_stock_alerts = value;
        self
    }

    /// Sets the purchase-code timestamp granularity.
    #[must_use]
    pub const fn purchase_code_precision(mut self, value: TimestampPrecision) -> Self {
        self.purchase_code_precision = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_bounds() {
        let config = Config::default();
        assert!(config.temperature.contains(0.0));
        assert!(config.temperature.contains(35.0));
        assert!(!config.temperature.contains(35.1));
        assert!(!config.humidity.contains(-0.5));
        assert!(config.rating.contains(5.0));
        assert!(!config.rating.contains(0.0));
    }

    #[test]
    fn builder_overrides() {
        let config = Config::new()
            .temperature(-10.0, 50.0)
            .low_stock_alerts(false)
            .purchase_code_precision(TimestampPrecision::Seconds);
        assert!(config.temperature.contains(-5.0));
        assert!(!config.low_stock_alerts);
        assert_eq!(config.purchase_code_precision, TimestampPrecision::Seconds);
    }

    #[test]
    fn stamp_precision() {
        let at = Utc.timestamp_millis_opt(1_714_521_600_123).unwrap();
        assert_eq!(TimestampPrecision::Seconds.stamp(at), 1_714_521_600);
        assert_eq!(TimestampPrecision::Millis.stamp(at), 1_714_521_600_123);
    }
}
