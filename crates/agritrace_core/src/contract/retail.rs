use super::{ensure_vacant, require_consumer, require_id, require_product, AgriTrace};
use crate::error::{CoreError, CoreResult};
use crate::invocation::Invocation;
use crate::keys;
use crate::query::find;
use crate::record::{
    ConsumerPurchase, Entity, LowStockAlert, PriceRecord, PriceStatus, RetailInventory,
    SalesRecord,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of setting an inventory quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdate {
    /// The row after the write.
    pub inventory: RetailInventory,
    /// Present if the row is now at or below its threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<LowStockAlert>,
}

/// Result of a direct sale.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    /// The stored sales record.
    pub sale: SalesRecord,
    /// The decremented inventory row.
    pub inventory: RetailInventory,
    /// Present if stock is now low.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<LowStockAlert>,
}

/// Result of a consumer purchase.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    /// The stored purchase, including its generated code.
    pub purchase: ConsumerPurchase,
    /// The companion sales record.
    pub sale: SalesRecord,
    /// The decremented inventory row.
    pub inventory: RetailInventory,
    /// Present if stock is now low.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<LowStockAlert>,
}

impl AgriTrace {
    /// Opens an inventory row for a product at a retailer.
    ///
    /// The id is stored with an `INV_` prefix whether or not the caller
    /// supplied one.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ProductNotFound`] for an unknown product, or
    /// [`CoreError::AlreadyExists`] if the id is taken or the retailer
    /// already stocks the product.
    pub fn add_retail_inventory(&self, mut inventory: RetailInventory) -> CoreResult<StockUpdate> {
        require_id("inventory", &inventory.id)?;
        require_id("retailer", &inventory.retailer_id)?;
        inventory.id = keys::with_prefix(keys::INVENTORY, &inventory.id);
        let now = self.clock.now();

        let update = self.ledger.invoke(|inv| {
            require_product(inv, &inventory.product_id)?;
            ensure_vacant(inv, RetailInventory::LABEL, &inventory.id)?;
            if let Some(existing) =
                inventory_row(inv, &inventory.product_id, &inventory.retailer_id)?
            {
                return Err(CoreError::already_exists(RetailInventory::LABEL, existing.id));
            }
            let quantity = inventory.quantity;
            let alert = inventory.set_quantity(quantity, now);
            inv.put_record(&inventory)?;
            Ok(StockUpdate { inventory, alert })
        })?;
        self.emit_alert(update.alert.as_ref());
        Ok(update)
    }

    /// Sets the quantity on hand, e.g. after replenishment.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the row does not exist.
    pub fn update_inventory_quantity(
        &self,
        inventory_id: &str,
        quantity: u32,
    ) -> CoreResult<StockUpdate> {
        let key = keys::with_prefix(keys::INVENTORY, inventory_id);
        let now = self.clock.now();

        let update = self.ledger.invoke(|inv| {
            let mut inventory = inv
                .get_record::<RetailInventory>(&key)?
                .ok_or_else(|| CoreError::not_found(RetailInventory::LABEL, &key))?;
            let alert = inventory.set_quantity(quantity, now);
            inv.put_record(&inventory)?;
            Ok(StockUpdate { inventory, alert })
        })?;
        tracing::info!(inventory = %key, quantity, "inventory quantity set");
        self.emit_alert(update.alert.as_ref());
        Ok(update)
    }

    /// Lists a retailer's inventory rows.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] if the scan fails.
    pub fn inventory_by_retailer(&self, retailer_id: &str) -> CoreResult<Vec<RetailInventory>> {
        self.ledger.query(|inv| {
            find::<RetailInventory>()
                .with_prefix(keys::INVENTORY)
                .filter(|row| row.retailer_id == retailer_id)
                .run(inv)
        })
    }

    /// Sells from a retailer's stock.
    ///
    /// Checks and decrements the inventory row and writes the sales record in
    /// one invocation.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InventoryNotFound`] if the retailer does not stock
    /// the product, [`CoreError::InsufficientStock`] if it has too few units,
    /// or [`CoreError::InvalidArgument`] for a zero quantity or a negative
    /// price.
    pub fn add_sales_record(&self, mut sale: SalesRecord) -> CoreResult<SaleReceipt> {
        require_id("sales record", &sale.id)?;
        check_price("unit price", sale.unit_price)?;
        sale.id = keys::with_prefix(keys::SALE, &sale.id);
        let now = self.clock.now();

        let receipt = self.ledger.invoke(|inv| {
            require_product(inv, &sale.product_id)?;
            ensure_vacant(inv, SalesRecord::LABEL, &sale.id)?;
            let (inventory, alert) =
                withdraw(inv, &sale.product_id, &sale.retailer_id, sale.quantity, now)?;
            sale.total_amount = sale.unit_price * f64::from(sale.quantity);
            sale.sale_time = now;
            inv.put_record(&sale)?;
            Ok(SaleReceipt {
                sale,
                inventory,
                alert,
            })
        })?;
        tracing::info!(
            sale = %receipt.sale.id,
            product = %receipt.sale.product_id,
            retailer = %receipt.sale.retailer_id,
            quantity = receipt.sale.quantity,
            remaining = receipt.inventory.quantity,
            "sale recorded"
        );
        self.emit_alert(receipt.alert.as_ref());
        Ok(receipt)
    }

    /// Lists a retailer's sales, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] if the scan fails.
    pub fn sales_by_retailer(&self, retailer_id: &str) -> CoreResult<Vec<SalesRecord>> {
        self.ledger.query(|inv| {
            find::<SalesRecord>()
                .with_prefix(keys::SALE)
                .filter(|sale| sale.retailer_id == retailer_id)
                .order_by(|a, b| b.sale_time.cmp(&a.sale_time))
                .run(inv)
        })
    }

    /// Records a consumer purchase.
    ///
    /// Decrements stock, writes the purchase with a generated purchase code
    /// and writes its companion sales record `SALE_<purchase id>`, all in one
    /// invocation.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ProductNotFound`], [`CoreError::ConsumerNotFound`],
    /// [`CoreError::InventoryNotFound`] or [`CoreError::InsufficientStock`]
    /// when the corresponding check fails, and [`CoreError::AlreadyExists`]
    /// if the generated purchase code was already issued.
    pub fn add_consumer_purchase(
        &self,
        mut purchase: ConsumerPurchase,
    ) -> CoreResult<PurchaseReceipt> {
        require_id("purchase", &purchase.id)?;
        check_price("unit price", purchase.unit_price)?;
        let now = self.clock.now();

        let receipt = self.ledger.invoke(|inv| {
            require_product(inv, &purchase.product_id)?;
            require_consumer(inv, &purchase.consumer_id)?;
            ensure_vacant(inv, ConsumerPurchase::LABEL, &purchase.id)?;
            let sale_id = keys::sale_for_purchase(&purchase.id);
            ensure_vacant(inv, SalesRecord::LABEL, &sale_id)?;

            let (inventory, alert) = withdraw(
                inv,
                &purchase.product_id,
                &purchase.retailer_id,
                purchase.quantity,
                now,
            )?;

            purchase.purchase_code = self.purchase_code(&purchase, now);
            let issued = find::<ConsumerPurchase>()
                .filter(|p| p.purchase_code == purchase.purchase_code)
                .first(inv)?;
            if issued.is_some() {
                return Err(CoreError::already_exists(
                    "purchase code",
                    purchase.purchase_code.clone(),
                ));
            }
            purchase.purchase_time = now;
            purchase.total_amount = purchase.unit_price * f64::from(purchase.quantity);
            purchase.sales_id = sale_id.clone();

            let sale = SalesRecord {
                id: sale_id,
                product_id: purchase.product_id.clone(),
                retailer_id: purchase.retailer_id.clone(),
                consumer_id: purchase.consumer_id.clone(),
                quantity: purchase.quantity,
                unit_price: purchase.unit_price,
                total_amount: purchase.total_amount,
                sale_time: now,
                payment_type: purchase.payment_type.clone(),
                purchase_code: purchase.purchase_code.clone(),
            };
            inv.put_record(&purchase)?;
            inv.put_record(&sale)?;
            Ok(PurchaseReceipt {
                purchase,
                sale,
                inventory,
                alert,
            })
        })?;
        tracing::info!(
            purchase = %receipt.purchase.id,
            code = %receipt.purchase.purchase_code,
            consumer = %receipt.purchase.consumer_id,
            remaining = receipt.inventory.quantity,
            "purchase recorded"
        );
        self.emit_alert(receipt.alert.as_ref());
        Ok(receipt)
    }

    /// Sets a new active price for a product.
    ///
    /// Every active price of the product is superseded, with its end time set
    /// to the new price's start time, in the same invocation.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ProductNotFound`] for an unknown product,
    /// [`CoreError::AlreadyExists`] for a taken id, or
    /// [`CoreError::InvalidArgument`] for a missing retailer or a negative
    /// price.
    pub fn set_product_price(&self, mut price: PriceRecord) -> CoreResult<PriceRecord> {
        require_id("price", &price.id)?;
        require_id("retailer", &price.retailer_id)?;
        check_price("price", price.price)?;
        price.id = keys::with_prefix(keys::PRICE, &price.id);
        let now = self.clock.now();
        price.status = PriceStatus::Active;
        price.start_time = now;
        price.end_time = None;

        let superseded = self.ledger.invoke(|inv| {
            require_product(inv, &price.product_id)?;
            ensure_vacant(inv, PriceRecord::LABEL, &price.id)?;

            let active = find::<PriceRecord>()
                .with_prefix(keys::PRICE)
                .filter(|p| p.product_id == price.product_id && p.is_active())
                .run(inv)?;
            let superseded = active.len();
            for mut old in active {
                old.deactivate(now);
                inv.put_record(&old)?;
            }
            inv.put_record(&price)?;
            Ok(superseded)
        })?;
        tracing::info!(
            product = %price.product_id,
            price = price.price,
            superseded,
            "price activated"
        );
        Ok(price)
    }

    /// Lists a product's prices, newest first. An unknown product has none.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] if the scan fails.
    pub fn price_history(&self, product_id: &str) -> CoreResult<Vec<PriceRecord>> {
        self.ledger.query(|inv| {
            find::<PriceRecord>()
                .with_prefix(keys::PRICE)
                .filter(|p| p.product_id == product_id)
                .order_by(|a, b| b.start_time.cmp(&a.start_time))
                .run(inv)
        })
    }

    /// Returns a product's active price.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no price is active.
    pub fn current_price(&self, product_id: &str) -> CoreResult<PriceRecord> {
        self.price_history(product_id)?
            .into_iter()
            .find(PriceRecord::is_active)
            .ok_or_else(|| CoreError::not_found("active price", product_id))
    }

    fn purchase_code(&self, purchase: &ConsumerPurchase, at: DateTime<Utc>) -> String {
        format!(
            "{}_{}_{}",
            purchase.product_id,
            purchase.consumer_id,
            self.config.purchase_code_precision.stamp(at)
        )
    }

    fn emit_alert(&self, alert: Option<&LowStockAlert>) {
        if !self.config.low_stock_alerts {
            return;
        }
        if let Some(alert) = alert {
            tracing::warn!(
                inventory = %alert.inventory_id,
                product = %alert.product_id,
                retailer = %alert.retailer_id,
                quantity = alert.quantity,
                min_quantity = alert.min_quantity,
                "low stock"
            );
        }
    }
}

fn check_price(field: &str, value: f64) -> CoreResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CoreError::invalid_argument(format!(
            "{field} must be a non-negative number, got {value}"
        )))
    }
}

fn inventory_row(
    inv: &mut Invocation<'_>,
    product_id: &str,
    retailer_id: &str,
) -> CoreResult<Option<RetailInventory>> {
    find::<RetailInventory>()
        .with_prefix(keys::INVENTORY)
        .filter(|row| row.product_id == product_id && row.retailer_id == retailer_id)
        .first(inv)
}

/// Locates the (product, retailer) row, decrements it and buffers the write.
fn withdraw(
    inv: &mut Invocation<'_>,
    product_id: &str,
    retailer_id: &str,
    quantity: u32,
    at: DateTime<Utc>,
) -> CoreResult<(RetailInventory, Option<LowStockAlert>)> {
    if quantity == 0 {
        return Err(CoreError::invalid_argument("quantity must be positive"));
    }
    let mut inventory =
        inventory_row(inv, product_id, retailer_id)?.ok_or_else(|| {
            CoreError::InventoryNotFound {
                product_id: product_id.to_string(),
                retailer_id: retailer_id.to_string(),
            }
        })?;
    let alert = inventory.withdraw(quantity, at)?;
    inv.put_record(&inventory)?;
    Ok((inventory, alert))
}
