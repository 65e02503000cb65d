use super::{Entity, ProductStatus};
use agritrace_codec::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit entry for an administrative status override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOverride {
    /// Audit id, `AUDIT_`-prefixed.
    pub id: String,
    /// The product whose status was forced.
    pub product_id: String,
    /// Status before the override.
    pub from: ProductStatus,
    /// Status after the override.
    pub to: ProductStatus,
    /// Caller that performed it.
    pub actor: String,
    /// Stated reason.
    #[serde(default)]
    pub reason: String,
    /// Server time of the override.
    pub recorded_at: DateTime<Utc>,
}

impl Record for StatusOverride {
    const KIND: &'static str = "status_override";
}

impl Entity for StatusOverride {
    const LABEL: &'static str = "status override";

    fn entity_key(&self) -> &str {
        &self.id
    }
}
