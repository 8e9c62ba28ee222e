//! Form Example - two-way binding
//!
//! Two inputs share one path through `v-model` and a preview paragraph
//! follows it through `v-bind`. Typing into either input updates the others.
//! The preview's content slot is a spark-signals signal, read directly here.
//!
//! Run with: RUST_LOG=spark_bind=debug cargo run --example form

use serde_json::json;
use spark_bind::dom::{self, Dom, Element};
use spark_bind::{Engine, EngineOptions};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== spark-bind Form Example ===\n");

    let name = Element::new("input").attr("id", "name").attr("v-model", "user.name");
    let mirror = Element::new("textarea").attr("id", "mirror").attr("v-model", "user.name");
    let preview = Element::new("p").attr("v-bind", "user.name");
    let settings = Element::new("pre").attr("v-bind", "user");
    let dom = Dom::new(
        Element::new("form")
            .attr("class", "profile")
            .child(name.clone())
            .child(mirror.clone())
            .child(preview.clone())
            .child(settings.clone()),
    );

    let options = EngineOptions::from_json(
        ".profile",
        json!({ "user": { "name": "Ada", "langs": ["en", "fr"] } }),
    )?;
    let engine = Engine::new(&dom, options)?;
    let preview_signal = preview.content_signal();

    println!("initial preview: {}", preview_signal.get());
    println!("user object:     {}", settings.content());

    name.input("Grace")?;
    println!("\ntyped into #name");
    println!("  mirror:  {}", mirror.value());
    println!("  preview: {}", preview_signal.get());
    if let Some(event) = dom::last_event() {
        println!("  last event: {:?} on {:?}", event.kind, event.id);
    }

    mirror.input("Hopper")?;
    println!("\ntyped into #mirror");
    println!("  name:    {}", name.value());
    println!("  preview: {}", preview_signal.get());

    // Replacing a nested value leaves the parent's observers alone
    println!("\nuser object is only refreshed when `user` itself is written:");
    println!("  {}", settings.content());
    engine.set("user.langs.1", "de")?;
    println!("  after user.langs.1 = de: {}", settings.content());
    println!("  store: {:?}", engine.get("user.langs.1"));

    println!("\n=== Example Complete ===");
    Ok(())
}
