use super::Entity;
use agritrace_codec::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    /// Growing in the field.
    #[default]
    Planting,
    /// Harvested, not yet offered.
    Harvested,
    /// Offered for sale.
    OnSale,
    /// Offered but out of stock.
    SoldOut,
    /// Withdrawn from sale.
    OffShelf,
}

impl ProductStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Planting,
        Self::Harvested,
        Self::OnSale,
        Self::SoldOut,
        Self::OffShelf,
    ];

    /// Returns the persisted spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planting => "PLANTING",
            Self::Harvested => "HARVESTED",
            Self::OnSale => "ON_SALE",
            Self::SoldOut => "SOLD_OUT",
            Self::OffShelf => "OFF_SHELF",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown product status {s:?}"))
    }
}

/// An agricultural product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product id.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Planted area.
    #[serde(default)]
    pub area: f64,
    /// Planting date as supplied by the farmer.
    #[serde(default)]
    pub planting_date: String,
    /// Harvest date, set when the product is harvested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harvest_date: Option<String>,
    /// Lifecycle status.
    #[serde(default)]
    pub status: ProductStatus,
    /// Owning farmer.
    #[serde(default)]
    pub farmer_id: String,
    /// Where it is grown.
    #[serde(default)]
    pub location: String,
    /// Creation time.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl Record for Product {
    const KIND: &'static str = "product";
}

impl Entity for Product {
    const LABEL: &'static str = "product";

    fn entity_key(&self) -> &str {
        &self.id
    }
}
