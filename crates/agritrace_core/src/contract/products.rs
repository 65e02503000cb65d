use super::{ensure_vacant, load_product, require_primary_id, AgriTrace};
use crate::error::CoreResult;
use crate::lifecycle::{self, Transition};
use crate::query::find;
use crate::record::{Product, ProductStatus};

impl AgriTrace {
    /// Registers a new product. Its status always starts at `PLANTING`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::AlreadyExists`] if the id is taken by any
    /// record, or [`crate::CoreError::InvalidArgument`] for an empty id or one
    /// under a reserved key prefix.
    pub fn create_product(&self, mut product: Product) -> CoreResult<Product> {
        require_primary_id("product", &product.id)?;
        let now = self.clock.now();
        product.status = ProductStatus::Planting;
        product.harvest_date = None;
        product.created_at = now;
        product.updated_at = now;

        self.ledger.invoke(|inv| {
            ensure_vacant(inv, "product", &product.id)?;
            inv.put_record(&product)
        })?;
        tracing::info!(product = %product.id, farmer = %product.farmer_id, "product created");
        Ok(product)
    }

    /// Looks up a product.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::ProductNotFound`] if it does not exist.
    pub fn query_product(&self, product_id: &str) -> CoreResult<Product> {
        self.ledger.query(|inv| load_product(inv, product_id))
    }

    /// Returns true if a product with this id exists.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Decode`] if the id holds another kind of
    /// record.
    pub fn product_exists(&self, product_id: &str) -> CoreResult<bool> {
        self.ledger
            .query(|inv| Ok(inv.get_record::<Product>(product_id)?.is_some()))
    }

    /// Lists a farmer's products.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::StoreUnavailable`] if the scan fails.
    pub fn products_by_farmer(&self, farmer_id: &str) -> CoreResult<Vec<Product>> {
        self.ledger.query(|inv| {
            find::<Product>()
                .filter(|p| p.farmer_id == farmer_id)
                .run(inv)
        })
    }

    /// Lists products in `status`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::StoreUnavailable`] if the scan fails.
    pub fn products_by_status(&self, status: ProductStatus) -> CoreResult<Vec<Product>> {
        self.ledger
            .query(|inv| find::<Product>().filter(|p| p.status == status).run(inv))
    }

    /// Offers a harvested or shelved product for sale.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidTransition`] from any other status.
    pub fn put_product_on_sale(&self, product_id: &str) -> CoreResult<Product> {
        self.transition(product_id, Transition::PutOnSale)
    }

    /// Withdraws a product from sale.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidTransition`] unless it is on sale
    /// or sold out.
    pub fn take_product_off_shelf(&self, product_id: &str) -> CoreResult<Product> {
        self.transition(product_id, Transition::TakeOffShelf)
    }

    /// Marks a product on sale as sold out.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidTransition`] unless it is on sale.
    pub fn mark_product_sold_out(&self, product_id: &str) -> CoreResult<Product> {
        self.transition(product_id, Transition::MarkSoldOut)
    }

    fn transition(&self, product_id: &str, transition: Transition) -> CoreResult<Product> {
        let now = self.clock.now();
        let (product, from) = self.ledger.invoke(|inv| {
            let mut product = load_product(inv, product_id)?;
            let from = lifecycle::apply(&mut product, transition, now)?;
            inv.put_record(&product)?;
            Ok((product, from))
        })?;
        tracing::info!(
            product = %product.id,
            %from,
            to = %product.status,
            "product status changed"
        );
        Ok(product)
    }
}
