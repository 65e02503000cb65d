//! Error types for AgriTrace core.

use crate::record::ProductStatus;
use agritrace_codec::CodecError;
use agritrace_storage::StorageError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in AgriTrace core operations.
///
/// Every error is returned synchronously to the caller. No variant is retried
/// internally and none leaves a partial write behind.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The ledger could not serve a read or write.
    #[error("store unavailable: {0}")]
    StoreUnavailable(StorageError),

    /// A key read by the invocation changed before commit.
    #[error("conflict: {0}")]
    Conflict(StorageError),

    /// A payload or point-looked-up value could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] CodecError),

    /// The referenced product does not exist.
    #[error("product not found: {product_id}")]
    ProductNotFound {
        /// The missing product id.
        product_id: String,
    },

    /// The referenced consumer does not exist.
    #[error("consumer not found: {consumer_id}")]
    ConsumerNotFound {
        /// The missing consumer id.
        consumer_id: String,
    },

    /// No inventory row exists for the product at the retailer.
    #[error("no inventory for product {product_id} at retailer {retailer_id}")]
    InventoryNotFound {
        /// The product being sold.
        product_id: String,
        /// The retailer selling it.
        retailer_id: String,
    },

    /// A record looked up by id or code does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Human-readable record kind.
        kind: &'static str,
        /// The id or code that was looked up.
        id: String,
    },

    /// A create targeted a key that already holds a value.
    #[error("{kind} already exists: {id}")]
    AlreadyExists {
        /// Human-readable record kind.
        kind: &'static str,
        /// The conflicting id.
        id: String,
    },

    /// The product lifecycle does not allow the requested move.
    #[error("cannot {action} product {product_id} in status {from}")]
    InvalidTransition {
        /// The product being moved.
        product_id: String,
        /// Its current status.
        from: ProductStatus,
        /// The attempted transition.
        action: &'static str,
    },

    /// A measured or rated value is outside its allowed range.
    #[error("{field} {value} outside allowed range [{min}, {max}]")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },

    /// A sale asked for more than the inventory holds.
    #[error("insufficient stock: {available} available, {requested} requested")]
    InsufficientStock {
        /// Quantity on hand.
        available: u32,
        /// Quantity asked for.
        requested: u32,
    },

    /// A payload decoded but is semantically unusable.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong.
        message: String,
    },

    /// The host denied the caller.
    #[error("{caller} is not authorized to invoke {operation}")]
    Unauthorized {
        /// The operation name.
        operation: &'static str,
        /// The caller id.
        caller: String,
    },

    /// The dispatcher does not know the function name.
    #[error("unknown operation: {name}")]
    UnknownOperation {
        /// The requested function name.
        name: String,
    },

    /// The invocation was already committed or aborted.
    #[error("invocation is no longer active")]
    InvocationClosed,
}

impl CoreError {
    /// Creates a product-not-found error.
    pub fn product_not_found(product_id: impl Into<String>) -> Self {
        Self::ProductNotFound {
            product_id: product_id.into(),
        }
    }

    /// Creates a consumer-not-found error.
    pub fn consumer_not_found(consumer_id: impl Into<String>) -> Self {
        Self::ConsumerNotFound {
            consumer_id: consumer_id.into(),
        }
    }

    /// Creates a generic not-found error.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Creates an already-exists error.
    pub fn already_exists(kind: &'static str, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            id: id.into(),
        }
    }

    /// Creates an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Returns true if resubmitting the same request may succeed.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Returns true for any of the not-found family.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProductNotFound { .. }
                | Self::ConsumerNotFound { .. }
                | Self::InventoryNotFound { .. }
                | Self::NotFound { .. }
        )
    }
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        if err.is_conflict() {
            Self::Conflict(err)
        } else {
            Self::StoreUnavailable(err)
        }
    }
}
