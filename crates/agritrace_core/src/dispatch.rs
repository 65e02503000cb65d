//! Invoking contract operations by name.
//!
//! Hosts hand the dispatcher a function name and positional string
//! arguments. Mutating operations take one JSON payload (plus ids where the
//! operation targets an existing record); every operation answers with JSON.
//! Payloads are decoded before any ledger access.

use crate::contract::{AgriTrace, EnvironmentBatch, OverrideRequest};
use crate::error::{CoreError, CoreResult};
use crate::record::{LogisticsStatus, LogisticsUpdate, ProductStatus};
use agritrace_codec::{from_payload, to_json, CodecError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// The identity of whoever is invoking, as established by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Caller {
    /// Opaque caller id.
    pub id: String,
}

impl Caller {
    /// Creates a caller.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Host-side access decision.
///
/// The core only consumes a yes or no. Policies such as role tables live in
/// the host.
pub trait Authorizer: Send + Sync {
    /// Returns true if `caller` may invoke `operation`.
    fn authorize(&self, caller: &Caller, operation: Operation) -> bool;
}

impl<F> Authorizer for F
where
    F: Fn(&Caller, Operation) -> bool + Send + Sync,
{
    fn authorize(&self, caller: &Caller, operation: Operation) -> bool {
        self(caller, operation)
    }
}

/// Permits everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, _caller: &Caller, _operation: Operation) -> bool {
        true
    }
}

/// Permits queries only.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnly;

impl Authorizer for ReadOnly {
    fn authorize(&self, _caller: &Caller, operation: Operation) -> bool {
        !operation.is_mutating()
    }
}

/// A contract operation, named as hosts invoke it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Operation {
    CreateProduct,
    QueryProduct,
    ProductExists,
    QueryProductsByFarmer,
    QueryProductsByStatus,
    PutProductOnSale,
    TakeProductOffShelf,
    MarkProductAsSoldOut,
    OverrideProductStatus,
    QueryStatusOverrides,
    AddProductionRecord,
    QueryProductionRecordsByProduct,
    AddEnvironmentRecord,
    QueryEnvironmentRecords,
    IngestEnvironmentBatch,
    AddQualityRecord,
    QueryQualityRecordsByProduct,
    QueryQualityRecordsByInspector,
    AddLogisticsRecord,
    QueryLogisticsRecord,
    QueryLogisticsRecordsByProduct,
    QueryLogisticsRecordsByOperator,
    UpdateLogisticsRecord,
    AddRetailInventory,
    UpdateInventoryQuantity,
    QueryInventoryByRetailer,
    AddSalesRecord,
    QuerySalesByRetailer,
    SetProductPrice,
    QueryPriceHistory,
    QueryCurrentPrice,
    RegisterConsumer,
    RegisterRetailer,
    QueryRetailers,
    AddProductFeedback,
    QueryProductFeedbacks,
    QueryConsumerFeedbacks,
    AddConsumerPurchase,
    QueryConsumerPurchases,
    VerifyPurchase,
    QueryProductTrace,
}

impl Operation {
    /// Every operation.
    pub const ALL: [Self; 41] = [
        Self::CreateProduct,
        Self::QueryProduct,
        Self::ProductExists,
        Self::QueryProductsByFarmer,
        Self::QueryProductsByStatus,
        Self::PutProductOnSale,
        Self::TakeProductOffShelf,
        Self::MarkProductAsSoldOut,
        Self::OverrideProductStatus,
        Self::QueryStatusOverrides,
        Self::AddProductionRecord,
        Self::QueryProductionRecordsByProduct,
        Self::AddEnvironmentRecord,
        Self::QueryEnvironmentRecords,
        Self::IngestEnvironmentBatch,
        Self::AddQualityRecord,
        Self::QueryQualityRecordsByProduct,
        Self::QueryQualityRecordsByInspector,
        Self::AddLogisticsRecord,
        Self::QueryLogisticsRecord,
        Self::QueryLogisticsRecordsByProduct,
        Self::QueryLogisticsRecordsByOperator,
        Self::UpdateLogisticsRecord,
        Self::AddRetailInventory,
        Self::UpdateInventoryQuantity,
        Self::QueryInventoryByRetailer,
        Self::AddSalesRecord,
        Self::QuerySalesByRetailer,
        Self::SetProductPrice,
        Self::QueryPriceHistory,
        Self::QueryCurrentPrice,
        Self::RegisterConsumer,
        Self::RegisterRetailer,
        Self::QueryRetailers,
        Self::AddProductFeedback,
        Self::QueryProductFeedbacks,
        Self::QueryConsumerFeedbacks,
        Self::AddConsumerPurchase,
        Self::QueryConsumerPurchases,
        Self::VerifyPurchase,
        Self::QueryProductTrace,
    ];

    /// The function name hosts use.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CreateProduct => "CreateProduct",
            Self::QueryProduct => "QueryProduct",
            Self::ProductExists => "ProductExists",
            Self::QueryProductsByFarmer => "QueryProductsByFarmer",
            Self::QueryProductsByStatus => "QueryProductsByStatus",
            Self::PutProductOnSale => "PutProductOnSale",
            Self::TakeProductOffShelf => "TakeProductOffShelf",
            Self::MarkProductAsSoldOut => "MarkProductAsSoldOut",
            Self::OverrideProductStatus => "OverrideProductStatus",
            Self::QueryStatusOverrides => "QueryStatusOverrides",
            Self::AddProductionRecord => "AddProductionRecord",
            Self::QueryProductionRecordsByProduct => "QueryProductionRecordsByProduct",
            Self::AddEnvironmentRecord => "AddEnvironmentRecord",
            Self::QueryEnvironmentRecords => "QueryEnvironmentRecords",
            Self::IngestEnvironmentBatch => "IngestEnvironmentBatch",
            Self::AddQualityRecord => "AddQualityRecord",
            Self::QueryQualityRecordsByProduct => "QueryQualityRecordsByProduct",
            Self::QueryQualityRecordsByInspector => "QueryQualityRecordsByInspector",
            Self::AddLogisticsRecord => "AddLogisticsRecord",
            Self::QueryLogisticsRecord => "QueryLogisticsRecord",
            Self::QueryLogisticsRecordsByProduct => "QueryLogisticsRecordsByProduct",
            Self::QueryLogisticsRecordsByOperator => "QueryLogisticsRecordsByOperator",
            Self::UpdateLogisticsRecord => "UpdateLogisticsRecord",
            Self::AddRetailInventory => "AddRetailInventory",
            Self::UpdateInventoryQuantity => "UpdateInventoryQuantity",
            Self::QueryInventoryByRetailer => "QueryInventoryByRetailer",
            Self::AddSalesRecord => "AddSalesRecord",
            Self::QuerySalesByRetailer => "QuerySalesByRetailer",
            Self::SetProductPrice => "SetProductPrice",
            Self::QueryPriceHistory => "QueryPriceHistory",
            Self::QueryCurrentPrice => "QueryCurrentPrice",
            Self::RegisterConsumer => "RegisterConsumer",
            Self::RegisterRetailer => "RegisterRetailer",
            Self::QueryRetailers => "QueryRetailers",
            Self::AddProductFeedback => "AddProductFeedback",
            Self::QueryProductFeedbacks => "QueryProductFeedbacks",
            Self::QueryConsumerFeedbacks => "QueryConsumerFeedbacks",
            Self::AddConsumerPurchase => "AddConsumerPurchase",
            Self::QueryConsumerPurchases => "QueryConsumerPurchases",
            Self::VerifyPurchase => "VerifyPurchase",
            Self::QueryProductTrace => "QueryProductTrace",
        }
    }

    /// Resolves a function name. Two legacy short names are accepted.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "QueryProductionRecords" => Some(Self::QueryProductionRecordsByProduct),
            "QueryQualityRecords" => Some(Self::QueryQualityRecordsByProduct),
            _ => Self::ALL.into_iter().find(|op| op.name() == name),
        }
    }

    /// Returns true if the operation can write to the ledger.
    #[must_use]
    pub const fn is_mutating(self) -> bool {
        matches!(
            self,
            Self::CreateProduct
                | Self::PutProductOnSale
                | Self::TakeProductOffShelf
                | Self::MarkProductAsSoldOut
                | Self::OverrideProductStatus
                | Self::AddProductionRecord
                | Self::AddEnvironmentRecord
                | Self::IngestEnvironmentBatch
                | Self::AddQualityRecord
                | Self::AddLogisticsRecord
                | Self::UpdateLogisticsRecord
                | Self::AddRetailInventory
                | Self::UpdateInventoryQuantity
                | Self::AddSalesRecord
                | Self::SetProductPrice
                | Self::RegisterConsumer
                | Self::RegisterRetailer
                | Self::AddProductFeedback
                | Self::AddConsumerPurchase
        )
    }

    /// Number of positional arguments.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::QueryRetailers => 0,
            Self::UpdateInventoryQuantity => 2,
            Self::OverrideProductStatus => 3,
            Self::UpdateLogisticsRecord => 4,
            _ => 1,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Routes named invocations to an [`AgriTrace`] contract.
pub struct Dispatcher {
    contract: AgriTrace,
    authorizer: Arc<dyn Authorizer>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("contract", &self.contract)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher that permits everything.
    #[must_use]
    pub fn new(contract: AgriTrace) -> Self {
        Self {
            contract,
            authorizer: Arc::new(AllowAll),
        }
    }

    /// Replaces the authorizer consulted before mutating operations.
    #[must_use]
    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    /// Returns the contract.
    #[must_use]
    pub fn contract(&self) -> &AgriTrace {
        &self.contract
    }

    /// Invokes `function` with positional `args` and returns the JSON answer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownOperation`] for an unknown name,
    /// [`CoreError::InvalidArgument`] for a wrong argument count,
    /// [`CoreError::Unauthorized`] if the authorizer refuses a mutating
    /// operation, [`CoreError::Decode`] for a malformed argument, or whatever
    /// the operation returns.
    pub fn invoke<S: AsRef<str>>(
        &self,
        caller: &Caller,
        function: &str,
        args: &[S],
    ) -> CoreResult<String> {
        let operation = Operation::from_name(function).ok_or_else(|| CoreError::UnknownOperation {
            name: function.to_string(),
        })?;
        if args.len() != operation.arity() {
            return Err(CoreError::invalid_argument(format!(
                "{operation} takes {} argument(s), got {}",
                operation.arity(),
                args.len()
            )));
        }
        if operation.is_mutating() && !self.authorizer.authorize(caller, operation) {
            tracing::warn!(caller = %caller.id, %operation, "invocation denied");
            return Err(CoreError::Unauthorized {
                operation: operation.name(),
                caller: caller.id.clone(),
            });
        }

        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        tracing::debug!(caller = %caller.id, %operation, "dispatching");
        self.route(caller, operation, &args)
    }

    fn route(&self, caller: &Caller, operation: Operation, args: &[&str]) -> CoreResult<String> {
        let c = &self.contract;
        let a0 = args.first().copied().unwrap_or_default();
        match operation {
            Operation::CreateProduct => respond(&c.create_product(payload(a0)?)?),
            Operation::QueryProduct => respond(&c.query_product(a0)?),
            Operation::ProductExists => respond(&c.product_exists(a0)?),
            Operation::QueryProductsByFarmer => respond(&c.products_by_farmer(a0)?),
            Operation::QueryProductsByStatus => {
                let status: ProductStatus = a0.parse().map_err(CodecError::invalid_payload)?;
                respond(&c.products_by_status(status)?)
            }
            Operation::PutProductOnSale => respond(&c.put_product_on_sale(a0)?),
            Operation::TakeProductOffShelf => respond(&c.take_product_off_shelf(a0)?),
            Operation::MarkProductAsSoldOut => respond(&c.mark_product_sold_out(a0)?),
            Operation::OverrideProductStatus => {
                let status: ProductStatus = args[1].parse().map_err(CodecError::invalid_payload)?;
                let request = OverrideRequest {
                    status,
                    actor: caller.id.clone(),
                    reason: args[2].to_string(),
                };
                respond(&c.override_product_status(a0, request)?)
            }
            Operation::QueryStatusOverrides => respond(&c.status_overrides(a0)?),
            Operation::AddProductionRecord => respond(&c.add_production_record(payload(a0)?)?),
            Operation::QueryProductionRecordsByProduct => respond(&c.production_records(a0)?),
            Operation::AddEnvironmentRecord => {
                respond(&c.add_environment_record(payload(a0)?)?)
            }
            Operation::QueryEnvironmentRecords => respond(&c.environment_records(a0)?),
            Operation::IngestEnvironmentBatch => {
                let batch: EnvironmentBatch = payload(a0)?;
                respond(&c.ingest_environment_batch(batch)?)
            }
            Operation::AddQualityRecord => respond(&c.add_quality_record(payload(a0)?)?),
            Operation::QueryQualityRecordsByProduct => respond(&c.quality_records(a0)?),
            Operation::QueryQualityRecordsByInspector => {
                respond(&c.quality_records_by_inspector(a0)?)
            }
            Operation::AddLogisticsRecord => respond(&c.add_logistics_record(payload(a0)?)?),
            Operation::QueryLogisticsRecord => respond(&c.logistics_record(a0)?),
            Operation::QueryLogisticsRecordsByProduct => respond(&c.logistics_by_product(a0)?),
            Operation::QueryLogisticsRecordsByOperator => {
                respond(&c.logistics_by_operator(a0)?)
            }
            Operation::UpdateLogisticsRecord => {
                let update = logistics_update(args[1], args[2], args[3])?;
                respond(&c.update_logistics_record(a0, update)?)
            }
            Operation::AddRetailInventory => respond(&c.add_retail_inventory(payload(a0)?)?),
            Operation::UpdateInventoryQuantity => {
                let quantity: u32 = args[1]
                    .trim()
                    .parse()
                    .map_err(|e| CodecError::invalid_payload(format!("quantity: {e}")))?;
                respond(&c.update_inventory_quantity(a0, quantity)?)
            }
            Operation::QueryInventoryByRetailer => respond(&c.inventory_by_retailer(a0)?),
            Operation::AddSalesRecord => respond(&c.add_sales_record(payload(a0)?)?),
            Operation::QuerySalesByRetailer => respond(&c.sales_by_retailer(a0)?),
            Operation::SetProductPrice => respond(&c.set_product_price(payload(a0)?)?),
            Operation::QueryPriceHistory => respond(&c.price_history(a0)?),
            Operation::QueryCurrentPrice => respond(&c.current_price(a0)?),
            Operation::RegisterConsumer => respond(&c.register_consumer(payload(a0)?)?),
            Operation::RegisterRetailer => respond(&c.register_retailer(payload(a0)?)?),
            Operation::QueryRetailers => respond(&c.retailers()?),
            Operation::AddProductFeedback => respond(&c.add_product_feedback(payload(a0)?)?),
            Operation::QueryProductFeedbacks => respond(&c.product_feedbacks(a0)?),
            Operation::QueryConsumerFeedbacks => respond(&c.consumer_feedbacks(a0)?),
            Operation::AddConsumerPurchase => respond(&c.add_consumer_purchase(payload(a0)?)?),
            Operation::QueryConsumerPurchases => respond(&c.consumer_purchases(a0)?),
            Operation::VerifyPurchase => respond(&c.verify_purchase(a0)?),
            Operation::QueryProductTrace => respond(&c.product_trace(a0)?),
        }
    }
}

fn payload<T: DeserializeOwned>(raw: &str) -> CoreResult<T> {
    Ok(from_payload(raw)?)
}

fn respond<T: Serialize + ?Sized>(value: &T) -> CoreResult<String> {
    Ok(to_json(value)?)
}

/// Positional logistics update; an empty argument keeps the current value.
fn logistics_update(status: &str, location: &str, description: &str) -> CoreResult<LogisticsUpdate> {
    let status = match status {
        "" => None,
        raw => Some(payload::<LogisticsStatus>(&format!("{raw:?}"))?),
    };
    let keep_or = |value: &str| (!value.is_empty()).then(|| value.to_string());
    Ok(LogisticsUpdate {
        status,
        location: keep_or(location),
        description: keep_or(description),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::Ledger;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(AgriTrace::new(Ledger::in_memory()))
    }

    fn admin() -> Caller {
        Caller::new("admin")
    }

    #[test]
    fn names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_name(op.name()), Some(op));
        }
        assert_eq!(
            Operation::from_name("QueryQualityRecords"),
            Some(Operation::QueryQualityRecordsByProduct)
        );
        assert_eq!(Operation::from_name("DeleteProduct"), None);
    }

    #[test]
    fn unknown_function() {
        let err = dispatcher()
            .invoke(&admin(), "DeleteProduct", &["P1"])
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownOperation { .. }));
    }

    #[test]
    fn wrong_arity() {
        let err = dispatcher()
            .invoke::<&str>(&admin(), "QueryProduct", &[])
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument { .. }));
    }

    #[test]
    fn malformed_payload_is_decode_error() {
        let d = dispatcher();
        let err = d
            .invoke(&admin(), "CreateProduct", &["{not json"])
            .unwrap_err();
        assert!(matches!(err, CoreError::Decode(_)));
        assert_eq!(d.contract().ledger().head().unwrap().as_u64(), 0);
    }

    #[test]
    fn create_then_query_as_json() {
        let d = dispatcher();
        d.invoke(
            &admin(),
            "CreateProduct",
            &[r#"{"id":"P1","name":"Rice","farmerId":"F1","plantingDate":"2024-03-01"}"#],
        )
        .unwrap();

        let json = d.invoke(&admin(), "QueryProduct", &["P1"]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "PLANTING");
        assert_eq!(value["farmerId"], "F1");

        assert_eq!(d.invoke(&admin(), "ProductExists", &["P1"]).unwrap(), "true");
        assert_eq!(
            d.invoke(&admin(), "QueryProductsByStatus", &["ON_SALE"]).unwrap(),
            "[]"
        );
    }

    #[test]
    fn read_only_authorizer_blocks_writes() {
        let d = dispatcher().with_authorizer(Arc::new(ReadOnly));
        let err = d
            .invoke(&admin(), "CreateProduct", &[r#"{"id":"P1"}"#])
            .unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized { .. }));
        assert_eq!(d.invoke(&admin(), "QueryRetailers", &[] as &[&str]).unwrap(), "[]");
    }

    #[test]
    fn closure_authorizer() {
        let d = dispatcher().with_authorizer(Arc::new(|caller: &Caller, op: Operation| {
            caller.id == "farmer" || !op.is_mutating()
        }));
        assert!(d
            .invoke(&Caller::new("farmer"), "CreateProduct", &[r#"{"id":"P1"}"#])
            .is_ok());
        assert!(d
            .invoke(&Caller::new("guest"), "CreateProduct", &[r#"{"id":"P2"}"#])
            .is_err());
    }

    #[test]
    fn override_uses_caller_as_actor() {
        let d = dispatcher();
        d.invoke(&admin(), "CreateProduct", &[r#"{"id":"P1"}"#]).unwrap();
        let json = d
            .invoke(&admin(), "OverrideProductStatus", &["P1", "OFF_SHELF", "recall"])
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["actor"], "admin");
        assert_eq!(value["to"], "OFF_SHELF");

        let err = d
            .invoke(&admin(), "OverrideProductStatus", &["P1", "GONE", "x"])
            .unwrap_err();
        assert!(matches!(err, CoreError::Decode(_)));
    }

    #[test]
    fn positional_logistics_update() {
        let update = logistics_update("DELIVERED", "", "unloaded").unwrap();
        assert_eq!(update.status, Some(LogisticsStatus::Delivered));
        assert_eq!(update.location, None);
        assert_eq!(update.description.as_deref(), Some("unloaded"));
        assert!(logistics_update("LOST", "", "").is_err());
    }

    #[test]
    fn non_numeric_quantity_is_decode_error() {
        let err = dispatcher()
            .invoke(&admin(), "UpdateInventoryQuantity", &["INV_1", "ten"])
            .unwrap_err();
        assert!(matches!(err, CoreError::Decode(_)));
    }
}
