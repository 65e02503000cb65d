//! Product lifecycle.
//!
//! ```text
//! PLANTING --harvest--> HARVESTED --put on sale--> ON_SALE --mark sold out--> SOLD_OUT
//!                                                  ON_SALE <--put on sale-- OFF_SHELF
//!                                   ON_SALE, SOLD_OUT --take off shelf--> OFF_SHELF
//! ```
//!
//! Harvest only happens through a `HARVESTING` production record. Any move
//! not drawn above fails with [`CoreError::InvalidTransition`].

use crate::error::{CoreError, CoreResult};
use crate::record::{Product, ProductStatus};
use chrono::{DateTime, Utc};

/// A validated lifecycle move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// PLANTING to HARVESTED.
    Harvest,
    /// HARVESTED or OFF_SHELF to ON_SALE.
    PutOnSale,
    /// ON_SALE or SOLD_OUT to OFF_SHELF.
    TakeOffShelf,
    /// ON_SALE to SOLD_OUT.
    MarkSoldOut,
}

impl Transition {
    /// Status the product ends up in.
    #[must_use]
    pub const fn target(self) -> ProductStatus {
        match self {
            Self::Harvest => ProductStatus::Harvested,
            Self::PutOnSale => ProductStatus::OnSale,
            Self::TakeOffShelf => ProductStatus::OffShelf,
            Self::MarkSoldOut => ProductStatus::SoldOut,
        }
    }

    /// Statuses the move may start from.
    #[must_use]
    pub const fn sources(self) -> &'static [ProductStatus] {
        match self {
            Self::Harvest => &[ProductStatus::Planting],
            Self::PutOnSale => &[ProductStatus::Harvested, ProductStatus::OffShelf],
            Self::TakeOffShelf => &[ProductStatus::OnSale, ProductStatus::SoldOut],
            Self::MarkSoldOut => &[ProductStatus::OnSale],
        }
    }

    /// Verb phrase for messages.
    #[must_use]
    pub const fn action(self) -> &'static str {
        match self {
            Self::Harvest => "harvest",
            Self::PutOnSale => "put on sale",
            Self::TakeOffShelf => "take off shelf",
            Self::MarkSoldOut => "mark sold out",
        }
    }

    /// Returns true if the move may start from `status`.
    #[must_use]
    pub fn allowed_from(self, status: ProductStatus) -> bool {
        self.sources().contains(&status)
    }
}

/// Applies `transition` to `product`, stamping `updated_at`.
///
/// Returns the status the product had before.
///
/// # Errors
///
/// Returns [`CoreError::InvalidTransition`] and leaves the product untouched
/// if the move is not allowed from the current status.
pub fn apply(
    product: &mut Product,
    transition: Transition,
    at: DateTime<Utc>,
) -> CoreResult<ProductStatus> {
    let from = product.status;
    if !transition.allowed_from(from) {
        return Err(CoreError::InvalidTransition {
            product_id: product.id.clone(),
            from,
            action: transition.action(),
        });
    }
    product.status = transition.target();
    product.updated_at = at;
    Ok(from)
}

/// Harvests `product` on `date`, which becomes its harvest date.
///
/// # Errors
///
/// Returns [`CoreError::InvalidTransition`] unless the product is planting.
pub fn harvest(product: &mut Product, date: &str, at: DateTime<Utc>) -> CoreResult<()> {
    apply(product, Transition::Harvest, at)?;
    product.harvest_date = Some(date.to_string());
    Ok(())
}
