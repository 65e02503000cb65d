use super::Entity;
use agritrace_codec::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consumer {
    /// Unique consumer id.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Contact phone.
    #[serde(default)]
    pub phone: String,
    /// Registration time.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl Record for Consumer {
    const KIND: &'static str = "consumer";
}

impl Entity for Consumer {
    const LABEL: &'static str = "consumer";

    fn entity_key(&self) -> &str {
        &self.id
    }
}

/// A registered retailer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Retailer {
    /// Unique retailer id, stored without any `RETAILER_` prefix.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Street address.
    #[serde(default)]
    pub address: String,
    /// Contact phone.
    #[serde(default)]
    pub phone: String,
    /// Registration time.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl Record for Retailer {
    const KIND: &'static str = "retailer";
}

impl Entity for Retailer {
    const LABEL: &'static str = "retailer";

    fn entity_key(&self) -> &str {
        &self.id
    }
}

/// A consumer's rating of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFeedback {
    /// Feedback id, always `FEEDBACK_`-prefixed once stored.
    pub id: String,
    /// The product rated.
    pub product_id: String,
    /// The consumer rating it.
    pub consumer_id: String,
    /// Score, validated against the configured range.
    pub rating: i32,
    /// Free-form comment.
    #[serde(default)]
    pub comment: String,
    /// Server time of submission.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl Record for ProductFeedback {
    const KIND: &'static str = "product_feedback";
}

impl Entity for ProductFeedback {
    const LABEL: &'static str = "feedback";

    fn entity_key(&self) -> &str {
        &self.id
    }
}

/// A consumer's purchase, backed by a `SALE_<id>` sales record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerPurchase {
    /// Unique purchase id.
    pub id: String,
    /// Id of the companion sales record.
    #[serde(default)]
    pub sales_id: String,
    /// The product bought.
    pub product_id: String,
    /// The buyer.
    pub consumer_id: String,
    /// The seller.
    pub retailer_id: String,
    /// Units bought.
    pub quantity: u32,
    /// Price per unit.
    pub unit_price: f64,
    /// `unit_price * quantity`, computed on write.
    #[serde(default)]
    pub total_amount: f64,
    /// Server time of purchase.
    #[serde(default)]
    pub purchase_time: DateTime<Utc>,
    /// Payment method.
    #[serde(default)]
    pub payment_type: String,
    /// Proof-of-purchase code, generated on write.
    #[serde(default)]
    pub purchase_code: String,
}

impl Record for ConsumerPurchase {
    const KIND: &'static str = "consumer_purchase";
}

impl Entity for ConsumerPurchase {
    const LABEL: &'static str = "purchase";

    fn entity_key(&self) -> &str {
        &self.id
    }
}
