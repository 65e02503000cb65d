//! Property tests over operation sequences.

use agritrace_core::lifecycle::{self, Transition};
use agritrace_core::record::{PriceStatus, ProductStatus};
use agritrace_core::{CoreError, EnvironmentBatch};
use agritrace_testkit::prelude::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn inventory_never_goes_negative(initial in 0u32..40, sales in sale_sequence_strategy()) {
        let chain = TestChain::memory();
        chain.stocked("P1", "R1", initial, 0);

        let mut expected = initial;
        for (i, quantity) in sales.into_iter().enumerate() {
            let result = chain.add_sales_record(sale(&format!("S{i}"), "P1", "R1", quantity, 1.0));
            match result {
                Ok(receipt) => {
                    prop_assert!(quantity > 0 && quantity <= expected);
                    expected -= quantity;
                    prop_assert_eq!(receipt.inventory.quantity, expected);
                }
                Err(CoreError::InvalidArgument { .. }) => prop_assert_eq!(quantity, 0),
                Err(CoreError::InsufficientStock { available, requested }) => {
                    prop_assert_eq!(available, expected);
                    prop_assert!(requested > expected);
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }
        prop_assert_eq!(chain.inventory_by_retailer("R1").unwrap()[0].quantity, expected);
    }

    #[test]
    fn at_most_one_active_price(prices in price_sequence_strategy()) {
        let chain = TestChain::memory();
        chain.product_on_sale("P1");

        let mut last_ok = None;
        for (i, value) in prices.into_iter().enumerate() {
            chain.tick(1);
            if chain.set_product_price(price(&i.to_string(), "P1", "R1", value)).is_ok() {
                last_ok = Some(format!("PRICE_{i}"));
            }
        }

        let history = chain.price_history("P1").unwrap();
        let active: Vec<_> = history.iter().filter(|p| p.status == PriceStatus::Active).collect();
        prop_assert!(active.len() <= 1);
        prop_assert_eq!(active.first().map(|p| p.id.clone()), last_ok);
    }

    #[test]
    fn lifecycle_follows_the_table(moves in prop::collection::vec(transition_strategy(), 0..10)) {
        let chain = TestChain::memory();
        chain.create_product(product("P1", "F1")).unwrap();

        let mut model = ProductStatus::Planting;
        for (i, transition) in moves.into_iter().enumerate() {
            let result = match transition {
                Transition::Harvest => chain
                    .add_production_record(production(
                        &format!("PR{i}"),
                        "P1",
                        agritrace_core::record::ProductionType::Harvesting,
                    ))
                    .map(|_| ()),
                Transition::PutOnSale => chain.put_product_on_sale("P1").map(|_| ()),
                Transition::TakeOffShelf => chain.take_product_off_shelf("P1").map(|_| ()),
                Transition::MarkSoldOut => chain.mark_product_sold_out("P1").map(|_| ()),
            };
            if transition.allowed_from(model) {
                prop_assert!(result.is_ok());
                model = transition.target();
            } else {
                let is_invalid = matches!(result, Err(CoreError::InvalidTransition { .. }));
                prop_assert!(is_invalid);
            }
            prop_assert_eq!(chain.query_product("P1").unwrap().status, model);
        }
    }

    #[test]
    fn batch_accounts_for_every_reading(readings in prop::collection::vec(reading_strategy(), 0..10)) {
        let chain = TestChain::memory();
        chain.create_product(product("P1", "F1")).unwrap();
        let total = readings.len();

        let report = chain
            .ingest_environment_batch(EnvironmentBatch {
                device_id: "D1".into(),
                product_id: "P1".into(),
                records: readings,
            })
            .unwrap();
        prop_assert_eq!(report.accepted.len() + report.rejected.len(), total);
        prop_assert_eq!(chain.environment_records("P1").unwrap().len(), report.accepted.len());
        prop_assert!(report.alerts.len() >= report.rejected.len());
    }

    #[test]
    fn apply_is_all_or_nothing(status in product_status_strategy(), transition in transition_strategy()) {
        let mut p = product("P1", "F1");
        p.status = status;
        let before = p.clone();
        match lifecycle::apply(&mut p, transition, start_time()) {
            Ok(from) => {
                prop_assert_eq!(from, status);
                prop_assert_eq!(p.status, transition.target());
            }
            Err(_) => prop_assert_eq!(p, before),
        }
    }
}
