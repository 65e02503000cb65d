//! End-to-end tests from planting to consumer feedback.

use agritrace_core::record::{
    LogisticsStatus, LogisticsUpdate, ProductStatus, ProductionType, QualityStage,
};
use agritrace_core::{CoreError, TraceStage};
use agritrace_testkit::prelude::*;

#[test]
fn harvest_record_moves_product_to_harvested() {
    let chain = TestChain::memory();
    chain.create_product(product("P1", "F1")).unwrap();
    chain
        .add_production_record(production("PR1", "P1", ProductionType::Planting))
        .unwrap();
    chain.tick(60);
    chain
        .add_production_record(production("PR2", "P1", ProductionType::Harvesting))
        .unwrap();

    let p = chain.query_product("P1").unwrap();
    assert_eq!(p.status, ProductStatus::Harvested);
    assert_eq!(p.harvest_date.as_deref(), Some("2024-05-01"));

    let records = chain.production_records("P1").unwrap();
    let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["PR1", "PR2"]);
}

#[test]
fn second_harvest_writes_nothing() {
    let chain = TestChain::memory();
    chain.create_product(product("P1", "F1")).unwrap();
    chain
        .add_production_record(production("PR1", "P1", ProductionType::Harvesting))
        .unwrap();

    let err = chain
        .add_production_record(production("PR2", "P1", ProductionType::Harvesting))
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition { .. }));
    assert_eq!(chain.production_records("P1").unwrap().len(), 1);
}

#[test]
fn status_queries_are_exact() {
    let chain = TestChain::memory();
    chain.product_on_sale("P1");
    chain.create_product(product("P2", "F1")).unwrap();
    chain.product_on_sale("P3");
    chain.mark_product_sold_out("P3").unwrap();

    let on_sale = chain.products_by_status(ProductStatus::OnSale).unwrap();
    assert_eq!(on_sale.len(), 1);
    assert_eq!(on_sale[0].id, "P1");
    assert_eq!(chain.products_by_status(ProductStatus::Planting).unwrap().len(), 1);
    assert!(chain.products_by_status(ProductStatus::OffShelf).unwrap().is_empty());
    assert_eq!(chain.products_by_farmer("F1").unwrap().len(), 3);
}

#[test]
fn shelf_round_trip() {
    let chain = TestChain::memory();
    chain.product_on_sale("P1");
    chain.take_product_off_shelf("P1").unwrap();
    assert!(matches!(
        chain.mark_product_sold_out("P1"),
        Err(CoreError::InvalidTransition { .. })
    ));
    chain.put_product_on_sale("P1").unwrap();
    assert_eq!(chain.query_product("P1").unwrap().status, ProductStatus::OnSale);
}

#[test]
fn out_of_range_environment_is_rejected_before_lookup() {
    let chain = TestChain::memory();
    // The product does not exist, but the range check comes first.
    let err = chain
        .add_environment_record(environment("E1", "P9", 40.0, 50.0))
        .unwrap_err();
    assert!(matches!(err, CoreError::OutOfRange { field: "temperature", .. }));

    let err = chain
        .add_environment_record(environment("E1", "P9", 20.0, 50.0))
        .unwrap_err();
    assert!(matches!(err, CoreError::ProductNotFound { .. }));
}

#[test]
fn logistics_update_keeps_unset_fields() {
    let chain = TestChain::memory();
    chain.create_product(product("P1", "F1")).unwrap();
    chain
        .add_logistics_record(logistics("L1", "P1", LogisticsStatus::InTransit, "Depot"))
        .unwrap();
    chain.tick(3600);
    let updated = chain
        .update_logistics_record(
            "L1",
            LogisticsUpdate {
                status: Some(LogisticsStatus::Delivered),
                ..LogisticsUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(updated.status, LogisticsStatus::Delivered);
    assert_eq!(updated.location, "Depot");
    assert_eq!(chain.logistics_by_operator("L1").unwrap().len(), 1);
}

#[test]
fn full_trace() {
    let chain = TestChain::memory();
    chain.create_product(product("P1", "F1")).unwrap();
    chain.register_consumer(consumer("C1")).unwrap();
    chain.tick(10);
    chain
        .add_quality_record(quality("Q-PLANT", "P1", QualityStage::Planting, true))
        .unwrap();
    chain.tick(10);
    chain
        .add_production_record(production("PR1", "P1", ProductionType::Harvesting))
        .unwrap();
    chain.tick(10);
    chain
        .add_quality_record(quality("Q-HARV", "P1", QualityStage::Harvesting, true))
        .unwrap();
    chain.tick(10);
    chain
        .add_logistics_record(logistics("L1", "P1", LogisticsStatus::InTransit, "Depot"))
        .unwrap();
    chain.tick(10);
    chain.add_product_feedback(feedback("1", "P1", "C1", 5)).unwrap();

    let trace = chain.product_trace("P1").unwrap();
    assert_eq!(trace.product.status, ProductStatus::Harvested);
    assert_eq!(trace.production_records.len(), 1);
    assert_eq!(trace.quality_records[0].id, "Q-HARV");
    assert_eq!(trace.logistics_records.len(), 1);
    assert_eq!(trace.feedbacks[0].id, "FEEDBACK_1");

    let stages: Vec<_> = trace.timeline().iter().map(|e| e.stage).collect();
    assert_eq!(
        stages,
        vec![
            TraceStage::Registered,
            TraceStage::Quality,
            TraceStage::Production,
            TraceStage::Quality,
            TraceStage::Logistics,
            TraceStage::Feedback,
        ]
    );
}

#[test]
fn trace_of_missing_product() {
    let chain = TestChain::memory();
    assert!(matches!(
        chain.product_trace("NOPE"),
        Err(CoreError::ProductNotFound { .. })
    ));
}

#[test]
fn feedback_rating_bounds() {
    let chain = TestChain::memory();
    chain.create_product(product("P1", "F1")).unwrap();
    chain.register_consumer(consumer("C1")).unwrap();
    assert!(matches!(
        chain.add_product_feedback(feedback("F1", "P1", "C1", 6)),
        Err(CoreError::OutOfRange { field: "rating", .. })
    ));
    assert!(chain.product_feedbacks("P1").unwrap().is_empty());
    assert!(matches!(
        chain.consumer_feedbacks("C9"),
        Err(CoreError::ConsumerNotFound { .. })
    ));
}
