//! Counter Example - click-driven updates
//!
//! A button bound to a method and a label bound to the value it changes:
//! - `v-click` calls `increment` with the store
//! - `v-bind` pushes every change of `count` into the label
//!
//! Run with: RUST_LOG=spark_bind=trace cargo run --example counter

use serde_json::json;
use spark_bind::dom::{Dom, Element};
use spark_bind::{Engine, EngineOptions, Store, Value};
use tracing_subscriber::EnvFilter;

fn increment(data: &Store) -> anyhow::Result<()> {
    data.modify("count", |n| Value::from(n.as_number().unwrap_or(0.0) + 1.0))?;
    Ok(())
}

fn reset(data: &Store) -> anyhow::Result<()> {
    data.set("count", 0)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== spark-bind Counter Example ===\n");

    let label = Element::new("span").attr("v-bind", "count");
    let plus = Element::new("button").attr("v-click", "increment").text("+");
    let zero = Element::new("button").attr("v-click", "reset").text("0");
    let dom = Dom::new(
        Element::new("div")
            .attr("id", "app")
            .child(label.clone())
            .child(plus.clone())
            .child(zero.clone()),
    );

    let options = EngineOptions::from_json("#app", json!({ "count": 0 }))?
        .method("increment", increment)
        .method("reset", reset);
    let engine = Engine::new(&dom, options)?;

    println!("Mounted: {:?}", engine.wiring());
    println!("count = {}", label.content());

    for _ in 0..3 {
        plus.click()?;
        println!("clicked + -> count = {}", label.content());
    }

    zero.click()?;
    println!("clicked 0 -> count = {}", label.content());

    // Writing the same value again does not touch the label
    let writes = label.slot_writes();
    engine.set("count", 0)?;
    println!("equal write, label writes unchanged: {}", label.slot_writes() == writes);

    println!("\n=== Example Complete ===");
    Ok(())
}
