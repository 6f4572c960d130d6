//! Fuzzing target for template evaluation
//!
//! Every template that parses is evaluated against a handful of documents.
//! Filters may fail, evaluation must not panic.

#![no_main]

use dtomap_core::expression::{parse_with_filters, EvalContext};
use dtomap_core::FilterRegistry;
use libfuzzer_sys::fuzz_target;
use serde_json::json;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let registry = FilterRegistry::with_builtins();

    let Ok(expr) = parse_with_filters(&text, &registry) else {
        return;
    };

    let docs = [
        json!(null),
        json!({"a": 1, "b": "  text  ", "c": null}),
        json!({"a": {"b": [1, {"c": "deep"}]}}),
        json!([["x"], {"0": "zero"}]),
    ];

    let ctx = EvalContext::new("fuzz", &registry);
    for doc in &docs {
        let _ = expr.evaluate(doc, &ctx);
    }
});
