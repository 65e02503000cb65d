use super::Entity;
use crate::error::{CoreError, CoreResult};
use agritrace_codec::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stock of one product at one retailer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetailInventory {
    /// Inventory id, always `INV_`-prefixed once stored.
    pub id: String,
    /// The product stocked.
    pub product_id: String,
    /// The retailer holding it.
    pub retailer_id: String,
    /// Units on hand.
    pub quantity: u32,
    /// Alert threshold.
    #[serde(default)]
    pub min_quantity: u32,
    /// Server time of the last quantity change.
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl RetailInventory {
    /// Returns true if stock is at or below the alert threshold.
    #[must_use]
    pub fn is_low(&self) -> bool {
        self.quantity <= self.min_quantity
    }

    /// Sets the quantity on hand, returning an alert if it is now low.
    pub fn set_quantity(&mut self, quantity: u32, at: DateTime<Utc>) -> Option<LowStockAlert> {
        self.quantity = quantity;
        self.updated_at = at;
        self.is_low().then(|| LowStockAlert::for_inventory(self))
    }

    /// Removes `requested` units.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InsufficientStock`] and leaves the row untouched
    /// if fewer than `requested` units are on hand.
    pub fn withdraw(
        &mut self,
        requested: u32,
        at: DateTime<Utc>,
    ) -> CoreResult<Option<LowStockAlert>> {
        let remaining = self
            .quantity
            .checked_sub(requested)
            .ok_or(CoreError::InsufficientStock {
                available: self.quantity,
                requested,
            })?;
        Ok(self.set_quantity(remaining, at))
    }
}

impl Record for RetailInventory {
    const KIND: &'static str = "retail_inventory";
}

impl Entity for RetailInventory {
    const LABEL: &'static str = "inventory";

    fn entity_key(&self) -> &str {
        &self.id
    }
}

/// Raised when an inventory row drops to or below its threshold.
///
/// Alerts are informational; they never block the write that caused them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockAlert {
    /// The inventory row.
    pub inventory_id: String,
    /// Its product.
    pub product_id: String,
    /// Its retailer.
    pub retailer_id: String,
    /// Units left.
    pub quantity: u32,
    /// The threshold crossed.
    pub min_quantity: u32,
}

impl LowStockAlert {
    fn for_inventory(inventory: &RetailInventory) -> Self {
        Self {
            inventory_id: inventory.id.clone(),
            product_id: inventory.product_id.clone(),
            retailer_id: inventory.retailer_id.clone(),
            quantity: inventory.quantity,
            min_quantity: inventory.min_quantity,
        }
    }
}

/// A completed sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesRecord {
    /// Sale id, always `SALE_`-prefixed once stored.
    pub id: String,
    /// The product sold.
    pub product_id: String,
    /// The retailer that sold it.
    pub retailer_id: String,
    /// The buyer, if known.
    #[serde(default)]
    pub consumer_id: String,
    /// Units sold.
    pub quantity: u32,
    /// Price per unit.
    pub unit_price: f64,
    /// `unit_price * quantity`, computed on write.
    #[serde(default)]
    pub total_amount: f64,
    /// Server time of the sale.
    #[serde(default)]
    pub sale_time: DateTime<Utc>,
    /// Payment method as reported by the point of sale.
    #[serde(default)]
    pub payment_type: String,
    /// Code of the consumer purchase that generated this sale.
    #[serde(default)]
    pub purchase_code: String,
}

impl Record for SalesRecord {
    const KIND: &'static str = "sales_record";
}

impl Entity for SalesRecord {
    const LABEL: &'static str = "sales record";

    fn entity_key(&self) -> &str {
        &self.id
    }
}

/// Whether a price is in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceStatus {
    /// The current price.
    #[default]
    Active,
    /// Superseded.
    Inactive,
}

/// A retail price for a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    /// Price id, always `PRICE_`-prefixed once stored.
    pub id: String,
    /// The product priced.
    pub product_id: String,
    /// The retailer setting the price.
    pub retailer_id: String,
    /// Unit price.
    pub price: f64,
    /// Whether this price is in force.
    #[serde(default)]
    pub status: PriceStatus,
    /// When this price took effect.
    #[serde(default)]
    pub start_time: DateTime<Utc>,
    /// When it was superseded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl PriceRecord {
    /// Returns true if the price is in force.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == PriceStatus::Active
    }

    /// Supersedes an active price at `at`. Returns false if it was already
    /// inactive.
    pub fn deactivate(&mut self, at: DateTime<Utc>) -> bool {
        if !self.is_active() {
            return false;
        }
        self.status = PriceStatus::Inactive;
        self.end_time = Some(at);
        true
    }
}

impl Record for PriceRecord {
    const KIND: &'static str = "price_record";
}

impl Entity for PriceRecord {
    const LABEL: &'static str = "price record";

    fn entity_key(&self) -> &str {
        &self.id
    }
}
