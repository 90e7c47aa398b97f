//! Demonstrates keys that carry their own defaults.
//!
//! A request pipeline shares one map between stages. Each stage declares the
//! keys it reads or writes; keys with a default never need an "initialize if
//! missing" step at the call site.
//!
//! Run with: cargo run --example keyed_defaults

use keyed_typemap::{
    BackedTypedMap, FactoryKey, Key, MapError, MutableTypedMap, SharedTypedMap, TypedMap,
};
use std::collections::BTreeMap;
use std::thread;

// ============================================================================
// Keys - one static per slot
// ============================================================================

static REQUEST_PATH: Key<String> = Key::new("request_path");
static STATUS: Key<u16> = Key::new("status");
static HEADERS: FactoryKey<BTreeMap<String, String>> = FactoryKey::new("headers", BTreeMap::new);
static TIMINGS: FactoryKey<Vec<(&'static str, u32)>> = FactoryKey::new("timings", Vec::new);

fn main() -> Result<(), MapError> {
    env_logger::init();

    let mut request = BackedTypedMap::new();
    request.put(&REQUEST_PATH, "/api/users".to_string());

    authenticate(&mut request);
    route(&mut request);
    finish(&request);

    // The same keys work against a map shared between threads
    let shared = SharedTypedMap::from_map(request);
    let workers: Vec<_> = ["cache", "db", "render"]
        .into_iter()
        .enumerate()
        .map(|(i, stage)| {
            let shared = shared.clone();
            thread::spawn(move || {
                shared.compute_if_absent_with(&TIMINGS, |timings| timings.push((stage, i as u32)))
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker panicked")?;
    }

    println!("\nTimings after workers:");
    shared.with(&TIMINGS, |timings| {
        for (stage, ms) in timings {
            println!("  {}: {}ms", stage, ms);
        }
    })?;

    Ok(())
}

// ============================================================================
// Pipeline stages
// ============================================================================

fn authenticate(request: &mut BackedTypedMap) {
    request
        .compute_if_absent(&HEADERS)
        .insert("x-user".to_string(), "alice".to_string());
    request.compute_if_absent(&TIMINGS).push(("auth", 2));
}

fn route(request: &mut BackedTypedMap) {
    let status = match request.get(&REQUEST_PATH).map(String::as_str) {
        Some(path) if path.starts_with("/api/") => 200,
        _ => 404,
    };
    request.put(&STATUS, status);
    request.compute_if_absent(&TIMINGS).push(("route", 1));
}

fn finish(request: &BackedTypedMap) {
    println!("Request:");
    println!(
        "  Path: {}",
        request.get(&REQUEST_PATH).map_or("<none>", String::as_str)
    );
    println!("  Status: {}", request.get_or(&STATUS, &500));

    if let Some(headers) = request.get(&HEADERS) {
        for (name, value) in headers {
            println!("  Header {}: {}", name, value);
        }
    }

    println!("  Slots in use: {}", request.len());
    for key in request.keys() {
        println!("    {} ({})", key, key.value_type_name());
    }
}
