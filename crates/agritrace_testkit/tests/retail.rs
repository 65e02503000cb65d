//! Inventory, sales, pricing and purchase tests.

use agritrace_core::record::PriceStatus;
use agritrace_core::{Config, CoreError, TimestampPrecision};
use agritrace_testkit::prelude::*;

#[test]
fn sales_draw_down_inventory() {
    let chain = TestChain::memory();
    chain.stocked("P1", "R1", 10, 0);

    let receipt = chain.add_sales_record(sale("S1", "P1", "R1", 5, 2.0)).unwrap();
    assert_eq!(receipt.inventory.quantity, 5);
    assert_eq!(receipt.sale.id, "SALE_S1");
    assert_eq!(receipt.sale.total_amount, 10.0);

    let err = chain
        .add_sales_record(sale("S2", "P1", "R1", 6, 2.0))
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::InsufficientStock {
            available: 5,
            requested: 6
        }
    ));

    chain.add_sales_record(sale("S3", "P1", "R1", 5, 2.0)).unwrap();
    assert_eq!(chain.inventory_by_retailer("R1").unwrap()[0].quantity, 0);
    assert_eq!(chain.sales_by_retailer("R1").unwrap().len(), 2);
}

#[test]
fn low_stock_alert_is_returned() {
    let chain = TestChain::memory();
    chain.stocked("P1", "R1", 10, 4);

    let receipt = chain.add_sales_record(sale("S1", "P1", "R1", 5, 1.0)).unwrap();
    assert!(receipt.alert.is_none());
    let receipt = chain.add_sales_record(sale("S2", "P1", "R1", 1, 1.0)).unwrap();
    let alert = receipt.alert.unwrap();
    assert_eq!(alert.quantity, 4);
    assert_eq!(alert.min_quantity, 4);
}

#[test]
fn sale_without_inventory() {
    let chain = TestChain::memory();
    chain.product_on_sale("P1");
    assert!(matches!(
        chain.add_sales_record(sale("S1", "P1", "R9", 1, 1.0)),
        Err(CoreError::InventoryNotFound { .. })
    ));
}

#[test]
fn one_row_per_product_and_retailer() {
    let chain = TestChain::memory();
    chain.stocked("P1", "R1", 10, 0);
    let err = chain
        .add_retail_inventory(inventory("other", "P1", "R1", 3, 0))
        .unwrap_err();
    assert!(matches!(err, CoreError::AlreadyExists { .. }));

    chain
        .add_retail_inventory(inventory("P1-R2", "P1", "R2", 3, 0))
        .unwrap();
    let update = chain.update_inventory_quantity("INV_P1-R2", 1).unwrap();
    assert_eq!(update.inventory.quantity, 1);
    assert!(matches!(
        chain.update_inventory_quantity("INV_missing", 1),
        Err(CoreError::NotFound { .. })
    ));
}

#[test]
fn new_price_supersedes_old() {
    let chain = TestChain::memory();
    chain.product_on_sale("P1");

    chain.set_product_price(price("1", "P1", "R1", 5.0)).unwrap();
    chain.tick(60);
    chain.set_product_price(price("2", "P1", "R1", 6.0)).unwrap();

    let current = chain.current_price("P1").unwrap();
    assert_eq!(current.id, "PRICE_2");
    assert_eq!(current.price, 6.0);

    let history = chain.price_history("P1").unwrap();
    assert_eq!(history.len(), 2);
    let old = &history[1];
    assert_eq!(old.status, PriceStatus::Inactive);
    assert_eq!(old.end_time, Some(current.start_time));
    assert_eq!(
        history.iter().filter(|p| p.status == PriceStatus::Active).count(),
        1
    );
}

#[test]
fn price_of_unknown_product() {
    let chain = TestChain::memory();
    assert!(chain.price_history("P9").unwrap().is_empty());
    assert!(matches!(
        chain.current_price("P9"),
        Err(CoreError::NotFound { .. })
    ));
    assert!(matches!(
        chain.set_product_price(price("1", "P9", "R1", 1.0)),
        Err(CoreError::ProductNotFound { .. })
    ));
}

#[test]
fn negative_price_is_invalid() {
    let chain = TestChain::memory();
    chain.product_on_sale("P1");
    assert!(matches!(
        chain.set_product_price(price("1", "P1", "R1", -0.5)),
        Err(CoreError::InvalidArgument { .. })
    ));
}

#[test]
fn purchase_writes_sale_and_code() {
    let chain = TestChain::memory();
    chain.stocked("P1", "R1", 10, 0);

    let receipt = chain
        .add_consumer_purchase(purchase("BUY1", "P1", "C1", "R1", 3, 4.0))
        .unwrap();
    let millis = start_time().timestamp_millis();
    assert_eq!(receipt.purchase.purchase_code, format!("P1_C1_{millis}"));
    assert_eq!(receipt.purchase.sales_id, "SALE_BUY1");
    assert_eq!(receipt.sale.purchase_code, receipt.purchase.purchase_code);
    assert_eq!(receipt.inventory.quantity, 7);
    assert_eq!(receipt.purchase.total_amount, 12.0);

    let verified = chain.verify_purchase(&receipt.purchase.purchase_code).unwrap();
    assert_eq!(verified.id, "BUY1");
    assert_eq!(chain.consumer_purchases("C1").unwrap().len(), 1);
    assert!(matches!(
        chain.verify_purchase("P1_C1_0"),
        Err(CoreError::NotFound { .. })
    ));
}

#[test]
fn purchase_code_in_seconds() {
    let chain = TestChain::memory()
        .with_config(Config::new().purchase_code_precision(TimestampPrecision::Seconds));
    chain.stocked("P1", "R1", 10, 0);
    let receipt = chain
        .add_consumer_purchase(purchase("BUY1", "P1", "C1", "R1", 1, 1.0))
        .unwrap();
    assert_eq!(
        receipt.purchase.purchase_code,
        format!("P1_C1_{}", start_time().timestamp())
    );
}

#[test]
fn purchase_code_is_never_reissued() {
    let chain = TestChain::memory();
    chain.stocked("P1", "R1", 10, 0);

    let first = chain
        .add_consumer_purchase(purchase("U1", "P1", "C1", "R1", 1, 2.0))
        .unwrap();
    let err = chain
        .add_consumer_purchase(purchase("U2", "P1", "C1", "R1", 1, 2.0))
        .unwrap_err();
    assert!(matches!(err, CoreError::AlreadyExists { .. }));
    assert_eq!(chain.consumer_purchases("C1").unwrap().len(), 1);
    assert_eq!(chain.inventory_by_retailer("R1").unwrap()[0].quantity, 9);

    chain.tick(1);
    let second = chain
        .add_consumer_purchase(purchase("U2", "P1", "C1", "R1", 1, 2.0))
        .unwrap();
    assert_ne!(first.purchase.purchase_code, second.purchase.purchase_code);
    let verified = chain.verify_purchase(&second.purchase.purchase_code).unwrap();
    assert_eq!(verified.id, "U2");
}

#[test]
fn failed_purchase_leaves_no_trace() {
    let chain = TestChain::memory();
    chain.stocked("P1", "R1", 2, 0);

    assert!(matches!(
        chain.add_consumer_purchase(purchase("BUY1", "P1", "C9", "R1", 1, 1.0)),
        Err(CoreError::ConsumerNotFound { .. })
    ));
    assert!(matches!(
        chain.add_consumer_purchase(purchase("BUY1", "P1", "C1", "R1", 3, 1.0)),
        Err(CoreError::InsufficientStock { .. })
    ));
    assert!(chain.consumer_purchases("C1").unwrap().is_empty());
    assert!(chain.sales_by_retailer("R1").unwrap().is_empty());
    assert_eq!(chain.inventory_by_retailer("R1").unwrap()[0].quantity, 2);
}

#[test]
fn retailers_with_names_only() {
    let chain = TestChain::memory();
    chain.register_retailer(retailer("RETAILER_R1", "Corner Shop")).unwrap();
    chain.register_retailer(retailer("R2", "")).unwrap();
    let listed = chain.retailers().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "R1");
}

#[test]
fn threshold_scenario() {
    let chain = TestChain::memory();
    chain.product_on_sale("P1");
    chain
        .add_retail_inventory(inventory("1", "P1", "R1", 10, 5))
        .unwrap();

    let first = chain.add_sales_record(sale("A", "P1", "R1", 4, 1.0)).unwrap();
    assert_eq!(first.inventory.quantity, 6);
    assert!(first.alert.is_none());

    let second = chain.add_sales_record(sale("B", "P1", "R1", 3, 1.0)).unwrap();
    assert_eq!(second.inventory.quantity, 3);
    assert_eq!(second.alert.map(|a| a.inventory_id), Some("INV_1".to_string()));

    assert!(matches!(
        chain.add_sales_record(sale("C", "P1", "R1", 10, 1.0)),
        Err(CoreError::InsufficientStock { .. })
    ));
    assert_eq!(chain.inventory_by_retailer("R1").unwrap()[0].quantity, 3);
}
