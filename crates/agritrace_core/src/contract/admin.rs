use super::{load_product, AgriTrace};
use crate::error::{CoreError, CoreResult};
use crate::keys;
use crate::query::find;
use crate::record::{ProductStatus, StatusOverride};
use serde::Deserialize;
use uuid::Uuid;

/// Parameters of an administrative status override.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideRequest {
    /// Status to force.
    pub status: ProductStatus,
    /// Who is forcing it.
    pub actor: String,
    /// Why.
    pub reason: String,
}

impl AgriTrace {
    /// Forces a product into any status, bypassing the lifecycle.
    ///
    /// This is an administrative escape hatch. The override and an
    /// `AUDIT_`-keyed [`StatusOverride`] entry are written in the same
    /// invocation. Forcing `PLANTING` clears the harvest date; forcing
    /// `HARVESTED` on a product without one stamps today's date.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ProductNotFound`] for an unknown product, or
    /// [`CoreError::InvalidArgument`] if actor or reason is empty.
    pub fn override_product_status(
        &self,
        product_id: &str,
        request: OverrideRequest,
    ) -> CoreResult<StatusOverride> {
        if request.actor.trim().is_empty() || request.reason.trim().is_empty() {
            return Err(CoreError::invalid_argument(
                "status override requires an actor and a reason",
            ));
        }
        let now = self.clock.now();

        let entry = self.ledger.invoke(|inv| {
            let mut product = load_product(inv, product_id)?;
            let entry = StatusOverride {
                id: format!("{}{}", keys::AUDIT, Uuid::new_v4()),
                product_id: product.id.clone(),
                from: product.status,
                to: request.status,
                actor: request.actor,
                reason: request.reason,
                recorded_at: now,
            };
            product.status = request.status;
            product.updated_at = now;
            match request.status {
                ProductStatus::Planting => product.harvest_date = None,
                ProductStatus::Harvested if product.harvest_date.is_none() => {
                    product.harvest_date = Some(now.format("%Y-%m-%d").to_string());
                }
                _ => {}
            }
            inv.put_record(&product)?;
            inv.put_record(&entry)?;
            Ok(entry)
        })?;
        tracing::warn!(
            product = %entry.product_id,
            from = %entry.from,
            to = %entry.to,
            actor = %entry.actor,
            reason = %entry.reason,
            "product status overridden"
        );
        Ok(entry)
    }

    /// Lists the overrides applied to a product, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] if the scan fails.
    pub fn status_overrides(&self, product_id: &str) -> CoreResult<Vec<StatusOverride>> {
        self.ledger.query(|inv| {
            find::<StatusOverride>()
                .with_prefix(keys::AUDIT)
                .filter(|o| o.product_id == product_id)
                .order_by(|a, b| a.recorded_at.cmp(&b.recorded_at))
                .run(inv)
        })
    }
}
