//! Trace command implementation.

use super::open_contract;
use agritrace_core::{ProductTrace, TraceEvent};
use std::path::Path;

/// Runs the trace command.
pub fn run(
    path: &Path,
    product_id: &str,
    timeline: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let trace = open_contract(path)?.product_trace(product_id)?;

    match (format, timeline) {
        ("json", true) => println!("{}", serde_json::to_string_pretty(&trace.timeline())?),
        ("json", false) => println!("{}", serde_json::to_string_pretty(&trace)?),
        (_, true) => print_timeline(&trace.timeline()),
        (_, false) => print_text_output(&trace),
    }
    Ok(())
}

fn print_text_output(trace: &ProductTrace) {
    let product = &trace.product;
    println!("Product {} ({})", product.id, product.name);
    println!("==========================");
    println!();
    println!("  Status:    {}", product.status);
    println!("  Farmer:    {}", product.farmer_id);
    println!("  Planted:   {}", product.planting_date);
    if let Some(date) = &product.harvest_date {
        println!("  Harvested: {date}");
    }
    println!();
    println!("Production records: {}", trace.production_records.len());
    for r in &trace.production_records {
        println!("  [{}] {:?} on {} by {}", r.id, r.kind, r.date, r.operator_id);
    }
    println!("Quality records:    {}", trace.quality_records.len());
    for r in &trace.quality_records {
        println!(
            "  [{}] {:?} {}: {} (qualified: {})",
            r.id, r.stage, r.test_type, r.result, r.is_qualified
        );
    }
    println!("Logistics records:  {}", trace.logistics_records.len());
    for r in &trace.logistics_records {
        println!("  [{}] {:?} at {}", r.id, r.status, r.location);
    }
    println!("Feedback:           {}", trace.feedbacks.len());
    for f in &trace.feedbacks {
        println!("  [{}] {} stars from {}: {}", f.id, f.rating, f.consumer_id, f.comment);
    }
}

fn print_timeline(events: &[TraceEvent]) {
    for event in events {
        println!(
            "{}  {:<10} {:<24} {}",
            event.at.format("%Y-%m-%d %H:%M:%S"),
            format!("{:?}", event.stage),
            event.record_id,
            event.summary
        );
    }
}
