//! Key prefixes of the persisted format.
//!
//! Primary entities (products, records, consumers, retailers) live under
//! their bare id. Derived and retail entities carry a prefix so that scans
//! can discard most foreign entries before decoding.

/// Retail inventory rows.
pub const INVENTORY: &str = "INV_";
/// Sales records.
pub const SALE: &str = "SALE_";
/// Price records.
pub const PRICE: &str = "PRICE_";
/// Product feedback.
pub const FEEDBACK: &str = "FEEDBACK_";
/// Administrative audit records.
pub const AUDIT: &str = "AUDIT_";
/// Retailer ids as sent by some clients; stripped before storage.
pub const RETAILER: &str = "RETAILER_";

/// Prefixes that mark a key as something other than a primary entity.
pub const RESERVED: [&str; 5] = [INVENTORY, SALE, PRICE, FEEDBACK, AUDIT];

/// Returns `id` carrying `prefix` exactly once.
#[must_use]
pub fn with_prefix(prefix: &str, id: &str) -> String {
    if id.starts_with(prefix) {
        id.to_string()
    } else {
        format!("{prefix}{id}")
    }
}

/// Returns `id` without a leading `prefix`.
#[must_use]
pub fn strip_prefix<'a>(prefix: &str, id: &'a str) -> &'a str {
    id.strip_prefix(prefix).unwrap_or(id)
}

/// Key of the sales record generated by a consumer purchase.
#[must_use]
pub fn sale_for_purchase(purchase_id: &str) -> String {
    format!("{SALE}{purchase_id}")
}

/// Returns true if `key` holds a primary entity.
#[must_use]
pub fn is_primary(key: &str) -> bool {
    !RESERVED.iter().any(|prefix| key.starts_with(prefix))
}
