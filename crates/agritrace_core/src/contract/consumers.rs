use super::{
    check_range, ensure_vacant, require_consumer, require_id, require_primary_id, require_product,
    AgriTrace,
};
use crate::error::{CoreError, CoreResult};
use crate::invocation::Invocation;
use crate::keys;
use crate::query::find;
use crate::record::{Consumer, ConsumerPurchase, Entity, ProductFeedback, Retailer};

impl AgriTrace {
    /// Registers a consumer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyExists`] if the id is taken.
    pub fn register_consumer(&self, mut consumer: Consumer) -> CoreResult<Consumer> {
        require_primary_id("consumer", &consumer.id)?;
        consumer.created_at = self.clock.now();
        self.ledger.invoke(|inv| {
            ensure_vacant(inv, Consumer::LABEL, &consumer.id)?;
            inv.put_record(&consumer)
        })?;
        tracing::info!(consumer = %consumer.id, "consumer registered");
        Ok(consumer)
    }

    /// Registers a retailer. A leading `RETAILER_` is dropped from the id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyExists`] if the id is taken.
    pub fn register_retailer(&self, mut retailer: Retailer) -> CoreResult<Retailer> {
        retailer.id = keys::strip_prefix(keys::RETAILER, &retailer.id).to_string();
        require_primary_id("retailer", &retailer.id)?;
        retailer.created_at = self.clock.now();
        self.ledger.invoke(|inv| {
            ensure_vacant(inv, Retailer::LABEL, &retailer.id)?;
            inv.put_record(&retailer)
        })?;
        tracing::info!(retailer = %retailer.id, "retailer registered");
        Ok(retailer)
    }

    /// Lists retailers that have a name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] if the scan fails.
    pub fn retailers(&self) -> CoreResult<Vec<Retailer>> {
        self.ledger
            .query(|inv| find::<Retailer>().filter(|r| !r.name.is_empty()).run(inv))
    }

    /// Records a consumer's rating of a product.
    ///
    /// The id is stored with a `FEEDBACK_` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::OutOfRange`] for a rating outside the configured
    /// bounds, or [`CoreError::ProductNotFound`] /
    /// [`CoreError::ConsumerNotFound`] for unknown references.
    pub fn add_product_feedback(&self, mut feedback: ProductFeedback) -> CoreResult<ProductFeedback> {
        require_id("feedback", &feedback.id)?;
        feedback.id = keys::with_prefix(keys::FEEDBACK, &feedback.id);
        feedback.created_at = self.clock.now();

        self.ledger.invoke(|inv| {
            require_product(inv, &feedback.product_id)?;
            require_consumer(inv, &feedback.consumer_id)?;
            check_range("rating", f64::from(feedback.rating), self.config.rating)?;
            ensure_vacant(inv, ProductFeedback::LABEL, &feedback.id)?;
            inv.put_record(&feedback)
        })?;
        Ok(feedback)
    }

    /// Lists a product's feedback, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ProductNotFound`] for an unknown product.
    pub fn product_feedbacks(&self, product_id: &str) -> CoreResult<Vec<ProductFeedback>> {
        self.ledger.query(|inv| {
            require_product(inv, product_id)?;
            feedback_of(inv, product_id)
        })
    }

    /// Lists a consumer's feedback, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConsumerNotFound`] for an unknown consumer.
    pub fn consumer_feedbacks(&self, consumer_id: &str) -> CoreResult<Vec<ProductFeedback>> {
        self.ledger.query(|inv| {
            require_consumer(inv, consumer_id)?;
            find::<ProductFeedback>()
                .with_prefix(keys::FEEDBACK)
                .filter(|f| f.consumer_id == consumer_id)
                .order_by(|a, b| b.created_at.cmp(&a.created_at))
                .run(inv)
        })
    }

    /// Lists a consumer's purchases, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConsumerNotFound`] for an unknown consumer.
    pub fn consumer_purchases(&self, consumer_id: &str) -> CoreResult<Vec<ConsumerPurchase>> {
        self.ledger.query(|inv| {
            require_consumer(inv, consumer_id)?;
            find::<ConsumerPurchase>()
                .filter(|p| p.consumer_id == consumer_id)
                .order_by(|a, b| b.purchase_time.cmp(&a.purchase_time))
                .run(inv)
        })
    }

    /// Finds the purchase a code was issued for.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no purchase carries the code.
    pub fn verify_purchase(&self, purchase_code: &str) -> CoreResult<ConsumerPurchase> {
        if purchase_code.is_empty() {
            return Err(CoreError::invalid_argument("purchase code is required"));
        }
        self.ledger
            .query(|inv| {
                find::<ConsumerPurchase>()
                    .filter(|p| p.purchase_code == purchase_code)
                    .first(inv)
            })?
            .ok_or_else(|| CoreError::not_found(ConsumerPurchase::LABEL, purchase_code))
    }
}

pub(crate) fn feedback_of(
    inv: &mut Invocation<'_>,
    product_id: &str,
) -> CoreResult<Vec<ProductFeedback>> {
    find::<ProductFeedback>()
        .with_prefix(keys::FEEDBACK)
        .filter(|f| f.product_id == product_id)
        .order_by(|a, b| b.created_at.cmp(&a.created_at))
        .run(inv)
}
