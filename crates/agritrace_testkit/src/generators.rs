//! Property-based test generators using proptest.
//!
//! Provides strategies for ids, statuses and operation sequences that the
//! contract must survive without breaking its invariants.

use agritrace_core::lifecycle::Transition;
use agritrace_core::record::{ProductStatus, QualityStage};
use agritrace_core::Reading;
use proptest::prelude::*;

/// Strategy for record ids that need no prefix handling.
pub fn id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][A-Z0-9]{0,7}").expect("Invalid regex")
}

/// Strategy for any product status.
pub fn product_status_strategy() -> impl Strategy<Value = ProductStatus> {
    prop::sample::select(ProductStatus::ALL.to_vec())
}

/// Strategy for any lifecycle move.
pub fn transition_strategy() -> impl Strategy<Value = Transition> {
    prop::sample::select(vec![
        Transition::Harvest,
        Transition::PutOnSale,
        Transition::TakeOffShelf,
        Transition::MarkSoldOut,
    ])
}

/// Strategy for any quality stage.
pub fn quality_stage_strategy() -> impl Strategy<Value = QualityStage> {
    prop::sample::select(vec![
        QualityStage::Planting,
        QualityStage::Growing,
        QualityStage::Harvesting,
    ])
}

/// Strategy for a sequence of sale quantities, zeros included.
pub fn sale_sequence_strategy() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(0u32..20, 0..12)
}

/// Strategy for a sequence of prices, one of which may be invalid.
pub fn price_sequence_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(
        prop_oneof![
            9 => 0.0f64..500.0,
            1 => Just(-1.0),
        ],
        1..8,
    )
}

/// Strategy for sensor readings, some outside the default bounds.
pub fn reading_strategy() -> impl Strategy<Value = Reading> {
    (-20.0f64..60.0, -10.0f64..120.0).prop_map(|(temperature, humidity)| Reading {
        temperature,
        humidity,
        timestamp: None,
    })
}
