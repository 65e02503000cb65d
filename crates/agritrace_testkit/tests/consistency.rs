//! Atomicity, conflict and durability tests.

use agritrace_core::record::{Entity, ProductStatus, RetailInventory};
use agritrace_core::{CoreError, EnvironmentBatch, OverrideRequest, Reading};
use agritrace_testkit::prelude::*;

#[test]
fn interleaved_sales_conflict() {
    let chain = TestChain::memory();
    chain.stocked("P1", "R1", 10, 0);
    let ledger = chain.ledger();
    let key = "INV_P1-R1";

    let mut first = ledger.begin();
    let mut second = ledger.begin();
    for (inv, quantity) in [(&mut first, 4), (&mut second, 3)] {
        let mut row = inv.get_record::<RetailInventory>(key).unwrap().unwrap();
        row.withdraw(quantity, start_time()).unwrap();
        inv.put_record(&row).unwrap();
        assert_eq!(row.entity_key(), key);
    }

    ledger.commit(&mut first).unwrap();
    let err = ledger.commit(&mut second).unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(chain.inventory_by_retailer("R1").unwrap()[0].quantity, 6);
}

#[test]
fn concurrent_sales_never_oversell() {
    let chain = TestChain::memory();
    chain.stocked("P1", "R1", 20, 0);

    let sold: u32 = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let chain = &chain;
                scope.spawn(move || {
                    let mut sold = 0;
                    for j in 0..5 {
                        let id = format!("T{i}-{j}");
                        match chain.add_sales_record(sale(&id, "P1", "R1", 1, 1.0)) {
                            Ok(receipt) => sold += receipt.sale.quantity,
                            Err(err) => assert!(
                                err.is_conflict()
                                    || matches!(err, CoreError::InsufficientStock { .. }),
                                "unexpected error: {err}"
                            ),
                        }
                    }
                    sold
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    let remaining = chain.inventory_by_retailer("R1").unwrap()[0].quantity;
    assert_eq!(remaining + sold, 20);
    assert_eq!(chain.sales_by_retailer("R1").unwrap().len(), sold as usize);
}

#[test]
fn concurrent_first_prices_leave_one_active() {
    let chain = TestChain::memory();
    for round in 0..20 {
        let product_id = format!("P{round}");
        chain.create_product(product(&product_id, "F1")).unwrap();
        let barrier = std::sync::Barrier::new(8);

        let accepted: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let (chain, barrier, product_id) = (&chain, &barrier, &product_id);
                    scope.spawn(move || {
                        let id = format!("{product_id}-{i}");
                        barrier.wait();
                        match chain.set_product_price(price(&id, product_id, "R1", 2.0 + f64::from(i))) {
                            Ok(_) => 1,
                            Err(err) => {
                                assert!(err.is_conflict(), "unexpected error: {err}");
                                0
                            }
                        }
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        let history = chain.price_history(&product_id).unwrap();
        let active = history.iter().filter(|p| p.is_active()).count();
        assert!(accepted >= 1);
        assert_eq!(active, 1, "round {round}");
        assert_eq!(history.len(), accepted);
    }
}

#[test]
fn unavailable_store_surfaces_and_recovers() {
    let chain = TestChain::memory();
    chain.create_product(product("P1", "F1")).unwrap();

    chain.set_available(false);
    assert!(matches!(
        chain.query_product("P1"),
        Err(CoreError::StoreUnavailable(_))
    ));
    assert!(matches!(
        chain.put_product_on_sale("P1"),
        Err(CoreError::StoreUnavailable(_))
    ));

    chain.set_available(true);
    assert_eq!(chain.query_product("P1").unwrap().status, ProductStatus::Planting);
}

#[test]
fn iot_batch_stops_when_store_goes_away() {
    let chain = TestChain::memory();
    chain.create_product(product("P1", "F1")).unwrap();
    chain.set_available(false);
    let batch = EnvironmentBatch {
        device_id: "D1".into(),
        product_id: "P1".into(),
        records: vec![Reading {
            temperature: 20.0,
            humidity: 50.0,
            timestamp: None,
        }],
    };
    assert!(matches!(
        chain.ingest_environment_batch(batch),
        Err(CoreError::StoreUnavailable(_))
    ));
}

#[test]
fn ledger_file_survives_reopen() {
    let chain = TestChain::file();
    chain.stocked("P1", "R1", 10, 0);
    chain.add_sales_record(sale("S1", "P1", "R1", 4, 1.0)).unwrap();
    let path = chain.path().map(|p| p.to_path_buf());

    let chain = chain.reopen();
    assert_eq!(chain.path().map(|p| p.to_path_buf()), path);
    assert_eq!(chain.query_product("P1").unwrap().status, ProductStatus::OnSale);
    assert_eq!(chain.inventory_by_retailer("R1").unwrap()[0].quantity, 6);
    assert_eq!(chain.sales_by_retailer("R1").unwrap().len(), 1);

    // Writes after replay continue the version sequence.
    let head = chain.ledger().head().unwrap();
    chain.add_sales_record(sale("S2", "P1", "R1", 1, 1.0)).unwrap();
    assert!(chain.ledger().head().unwrap() > head);
}

#[test]
fn override_is_audited() {
    let chain = TestChain::memory();
    chain.product_on_sale("P1");
    chain.tick(5);
    let entry = chain
        .override_product_status(
            "P1",
            OverrideRequest {
                status: ProductStatus::Planting,
                actor: "admin".into(),
                reason: "data entry error".into(),
            },
        )
        .unwrap();
    assert_eq!(entry.from, ProductStatus::OnSale);
    assert!(entry.id.starts_with("AUDIT_"));
    assert_eq!(chain.query_product("P1").unwrap().status, ProductStatus::Planting);
    assert_eq!(chain.status_overrides("P1").unwrap(), vec![entry]);

    assert!(matches!(
        chain.override_product_status(
            "P1",
            OverrideRequest {
                status: ProductStatus::OnSale,
                actor: "admin".into(),
                reason: " ".into(),
            },
        ),
        Err(CoreError::InvalidArgument { .. })
    ));
}
