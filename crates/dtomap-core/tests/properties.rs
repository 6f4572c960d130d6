//! Property-based tests for the mapping engine
//!
//! These tests verify invariants that hold for all generated field names,
//! values and filter orders.


use dtomap_core::filter::{FilterRegistry, FilterSpec};
use dtomap_core::path::{resolve, Resolution};
use dtomap_core::pipeline::PipelineExecutor;
use dtomap_core::{Engine, Overrides, SourceKind, TypeDescriptor};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

/// Strategy for field names that are valid single path segments
fn field_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z_]{0,11}"
}

/// Strategy for a distinct, non-empty list of field names
fn field_names_strategy() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::btree_set(field_name_strategy(), 1..8)
        .prop_map(|set| set.into_iter().collect())
}

/// Strategy for scalar JSON values
fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[ a-zA-Z0-9]{0,16}".prop_map(Value::String),
    ]
}

proptest! {
    #[test]
    fn prop_template_fields_ignore_declared_and_others_use_convention(
        names in field_names_strategy(),
        covered in any::<prop::sample::Index>(),
    ) {
        let mut builder = TypeDescriptor::builder("T");
        for name in &names {
            builder = builder.field_from(name.clone(), format!("declared.{}", name));
        }
        let engine = Engine::builder().register_type(builder.build().unwrap()).build().unwrap();

        let chosen = covered.get(&names).clone();
        let overrides = Overrides::new().template(chosen.clone(), format!("{{{{ t.{} }}}}", chosen));
        let plan = engine.resolve_plan("T", &overrides).unwrap();

        for field in plan.fields() {
            let expected = if field.name == chosen { SourceKind::Template } else { SourceKind::Convention };
            prop_assert_eq!(field.source.kind(), expected);
        }
    }

    #[test]
    fn prop_pipeline_reaches_convention_fields(
        names in field_names_strategy(),
        text in "[a-z]{1,10}",
    ) {
        let mut builder = TypeDescriptor::builder("T").pipeline("upper");
        for name in &names {
            builder = builder.field(name.clone());
        }
        let engine = Engine::builder().register_type(builder.build().unwrap()).build().unwrap();

        let input: Map<String, Value> = names
            .iter()
            .map(|n| (n.clone(), Value::String(text.clone())))
            .collect();
        let out = engine.resolve("T", &input, &Overrides::new()).unwrap();

        for name in &names {
            prop_assert_eq!(&out[name.as_str()], &json!(text.to_uppercase()));
        }
    }

    #[test]
    fn prop_repeated_resolve_hits_cache(names in field_names_strategy(), calls in 2usize..6) {
        let mut builder = TypeDescriptor::builder("T");
        for name in &names {
            builder = builder.field(name.clone());
        }
        let engine = Engine::builder().register_type(builder.build().unwrap()).build().unwrap();

        let first = engine.resolve_plan("T", &Overrides::new()).unwrap();
        for _ in 1..calls {
            let again = engine.resolve_plan("T", &Overrides::new()).unwrap();
            prop_assert_eq!(&first, &again);
        }

        let stats = engine.cache_stats();
        prop_assert_eq!(stats.misses, 1);
        prop_assert_eq!(stats.hits, (calls - 1) as u64);
    }

    #[test]
    fn prop_null_is_found_and_missing_is_absent(key in field_name_strategy(), value in scalar_strategy()) {
        let data = json!({ key.clone(): value.clone() });
        prop_assert_eq!(resolve(&data, &key), Resolution::Found(&value));
        let missing = format!("{}_missing", key);
        prop_assert!(resolve(&data, &missing).is_absent());
    }

    #[test]
    fn prop_default_triggers_only_on_absent(key in field_name_strategy(), value in scalar_strategy()) {
        let engine = Engine::builder()
            .register_type(TypeDescriptor::builder("T").field("out").build().unwrap())
            .build()
            .unwrap();
        let overrides = Overrides::new().template("out", format!("{{{{ {} ?? 'fallback' }}}}", key));

        let present = engine.resolve("T", &json!({ key.clone(): value.clone() }), &overrides).unwrap();
        prop_assert_eq!(&present["out"], &value);

        let absent = engine.resolve("T", &json!({}), &overrides).unwrap();
        prop_assert_eq!(&absent["out"], &json!("fallback"));
    }

    #[test]
    fn prop_filter_order_is_respected(text in " {1,3}[a-z]{1,6}") {
        let registry = FilterRegistry::with_builtins();
        let trim_then_prefix = registry
            .bind_all(&[FilterSpec::new("trim"), FilterSpec::with_args("prefix", ["#"])])
            .unwrap();
        let prefix_then_trim = registry
            .bind_all(&[FilterSpec::with_args("prefix", ["#"]), FilterSpec::new("trim")])
            .unwrap();

        let executor = PipelineExecutor::new();
        let a = executor.execute("f", json!(text.clone()), &trim_then_prefix, &[]).unwrap();
        let b = executor.execute("f", json!(text.clone()), &prefix_then_trim, &[]).unwrap();

        prop_assert_eq!(a, json!(format!("#{}", text.trim())));
        prop_assert_eq!(b, json!(format!("#{}", text)));
    }
}
