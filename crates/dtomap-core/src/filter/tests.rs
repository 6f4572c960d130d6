//! Tests for the filter registry and the built-in filters
//!
//! Copyright (c) 2025 Dtomap Team
//! Licensed under the Apache-2.0 license

use super::*;
use serde_json::json;

fn run(name: &str, value: Value, args: &[Value]) -> Value {
    FilterRegistry::with_builtins()
        .get(name)
        .unwrap()
        .apply(&value, args)
        .unwrap()
}

fn fails(name: &str, value: Value, args: &[Value]) -> bool {
    FilterRegistry::with_builtins()
        .get(name)
        .unwrap()
        .apply(&value, args)
        .is_err()
}

#[test]
fn test_register_and_get() {
    let mut registry = FilterRegistry::new();
    assert!(registry.is_empty());

    registry.register("shout", |v: &Value, _: &[Value]| {
        Ok(json!(format!("{}!", v.as_str().unwrap_or_default())))
    });

    assert!(registry.contains("shout"));
    let filter = registry.get("shout").unwrap();
    assert_eq!(filter.name(), "shout");
    assert_eq!(filter.apply(&json!("hey"), &[]).unwrap(), json!("hey!"));
}

#[test]
fn test_get_unknown_filter() {
    let registry = FilterRegistry::with_builtins();
    let err = registry.get("nope").unwrap_err();
    assert_eq!(err, BuildError::filter_not_found("nope"));
}

#[test]
fn test_register_replaces_existing() {
    let mut registry = FilterRegistry::with_builtins();
    let before = registry.len();
    registry.register("upper", |_: &Value, _: &[Value]| Ok(json!("replaced")));
    assert_eq!(registry.len(), before);
    assert_eq!(registry.apply("name", "upper", &json!("x"), &[]).unwrap(), json!("replaced"));
}

#[test]
fn test_registry_apply_wraps_failure() {
    let registry = FilterRegistry::with_builtins();
    let err = registry.apply("age", "int", &json!("abc"), &[]).unwrap_err();
    assert!(matches!(
        err,
        crate::Error::FilterExecution { ref field, ref filter, .. } if field == "age" && filter == "int"
    ));
    assert!(err.to_string().contains("field 'age'"));
}

#[test]
fn test_names_are_sorted() {
    let registry = FilterRegistry::with_builtins();
    let names = registry.names();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    assert!(names.contains(&"trim"));
    assert!(names.contains(&"date"));
}

#[test]
fn test_bind_preserves_order_and_args() {
    let registry = FilterRegistry::with_builtins();
    let specs = vec![
        FilterSpec::new("trim"),
        FilterSpec::with_args("limit", [json!(3), json!("~")]),
    ];
    let bound = registry.bind_all(&specs).unwrap();
    assert_eq!(bound.len(), 2);
    assert_eq!(bound[0].name(), "trim");
    assert_eq!(bound[1].spec(), &specs[1]);
    assert_eq!(bound[1].apply(&json!("abcdef")).unwrap(), json!("abc~"));
}

#[test]
fn test_bind_unknown_filter() {
    let registry = FilterRegistry::with_builtins();
    let err = registry
        .bind_all(&[FilterSpec::new("trim"), FilterSpec::new("missing")])
        .unwrap_err();
    assert!(matches!(err, BuildError::FilterNotFound { ref name, .. } if name == "missing"));
}

#[test]
fn test_filter_spec_from_str() {
    let spec: FilterSpec = "substr:0:3".parse().unwrap();
    assert_eq!(spec, FilterSpec::with_args("substr", [json!(0), json!(3)]));

    let spec: FilterSpec = "replace:'a b':\"c\"".parse().unwrap();
    assert_eq!(spec.args, vec![json!("a b"), json!("c")]);

    assert!("".parse::<FilterSpec>().is_err());
    assert!("trim:".parse::<FilterSpec>().is_err());
}

#[test]
fn test_filter_spec_display() {
    let spec = FilterSpec::with_args("replace", [json!("a b"), json!(1)]);
    assert_eq!(spec.to_string(), "replace:'a b':1");
    let reparsed: FilterSpec = spec.to_string().parse().unwrap();
    assert_eq!(reparsed, spec);
}

#[test]
fn test_filter_spec_deserialize_both_forms() {
    let specs: Vec<FilterSpec> =
        serde_json::from_value(json!(["lower", {"name": "limit", "args": [5]}])).unwrap();
    assert_eq!(specs[0], FilterSpec::new("lower"));
    assert_eq!(specs[1], FilterSpec::with_args("limit", [5]));

    let bad: std::result::Result<FilterSpec, _> = serde_json::from_value(json!("lower |"));
    assert!(bad.is_err());
}

#[test]
fn test_string_filters() {
    assert_eq!(run("trim", json!("  x  "), &[]), json!("x"));
    assert_eq!(run("trim", json!("--x--"), &[json!("-")]), json!("x"));
    assert_eq!(run("ltrim", json!("  x  "), &[]), json!("x  "));
    assert_eq!(run("rtrim", json!("  x  "), &[]), json!("  x"));
    assert_eq!(run("lower", json!("JOHN@X.COM"), &[]), json!("john@x.com"));
    assert_eq!(run("upper", json!("abc"), &[]), json!("ABC"));
    assert_eq!(run("ucfirst", json!("john doe"), &[]), json!("John doe"));
    assert_eq!(run("lcfirst", json!("John"), &[]), json!("john"));
    assert_eq!(run("ucwords", json!("john doe"), &[]), json!("John Doe"));
    assert_eq!(run("snake", json!("fullName"), &[]), json!("full_name"));
    assert_eq!(run("camel", json!("full_name"), &[]), json!("fullName"));
    assert_eq!(run("kebab", json!("fullName"), &[]), json!("full-name"));
    assert_eq!(run("slug", json!("Hello World!"), &[]), json!("hello-world"));
}

#[test]
fn test_string_filters_pass_non_strings_through() {
    assert_eq!(run("trim", Value::Null, &[]), Value::Null);
    assert_eq!(run("upper", json!(42), &[]), json!(42));
    assert_eq!(run("lower", json!([" A "]), &[]), json!([" A "]));
}

#[test]
fn test_replace_filters() {
    assert_eq!(
        run("replace", json!("a-b-c"), &[json!("-"), json!("+")]),
        json!("a+b+c")
    );
    assert_eq!(run("replace", json!("a-b"), &[json!("-")]), json!("ab"));
    assert!(fails("replace", json!("a"), &[]));
    assert_eq!(
        run("regex_replace", json!("a1b22c"), &[json!("[0-9]+"), json!("#")]),
        json!("a#b#c")
    );
    assert!(fails("regex_replace", json!("a"), &[json!("(")]));
}

#[test]
fn test_substr_and_limit() {
    assert_eq!(run("substr", json!("abcdef"), &[json!(1), json!(3)]), json!("bcd"));
    assert_eq!(run("substr", json!("abcdef"), &[json!(-2)]), json!("ef"));
    assert_eq!(run("substr", json!("abc"), &[json!(10)]), json!(""));
    assert_eq!(run("limit", json!("abcdef"), &[json!(3)]), json!("abc..."));
    assert_eq!(run("limit", json!("abc"), &[json!(3)]), json!("abc"));
    assert!(fails("limit", json!("abc"), &[]));
}

#[test]
fn test_affix_and_padding() {
    assert_eq!(run("prefix", json!("42"), &[json!("#")]), json!("#42"));
    assert_eq!(run("suffix", json!(5), &[json!("kg")]), json!("5kg"));
    assert_eq!(run("prefix", Value::Null, &[json!("#")]), Value::Null);
    assert_eq!(run("pad_left", json!(7), &[json!(3), json!("0")]), json!("007"));
    assert_eq!(run("pad_left", json!("abcd"), &[json!(2)]), json!("abcd"));
}

#[test]
fn test_collection_filters() {
    assert_eq!(run("split", json!("a,b"), &[]), json!(["a", "b"]));
    assert_eq!(run("split", json!("a b"), &[json!(" ")]), json!(["a", "b"]));
    assert_eq!(run("split", json!(""), &[]), json!([]));
    assert_eq!(run("join", json!(["a", 1, null]), &[json!("-")]), json!("a-1-"));
    assert_eq!(run("first", json!([3, 4]), &[]), json!(3));
    assert_eq!(run("last", json!([3, 4]), &[]), json!(4));
    assert_eq!(run("first", json!([]), &[]), Value::Null);
    assert_eq!(run("count", json!([1, 2, 3]), &[]), json!(3));
    assert_eq!(run("count", json!("héé"), &[]), json!(3));
    assert_eq!(run("count", Value::Null, &[]), json!(0));
    assert!(fails("count", json!(true), &[]));
}

#[test]
fn test_conversion_filters() {
    assert_eq!(run("int", json!(" 42 "), &[]), json!(42));
    assert_eq!(run("int", json!("3.9"), &[]), json!(3));
    assert_eq!(run("int", json!(true), &[]), json!(1));
    assert_eq!(run("int", Value::Null, &[]), Value::Null);
    assert!(fails("int", json!("abc"), &[]));

    assert_eq!(run("float", json!("1.5"), &[]), json!(1.5));
    assert!(fails("float", json!("x"), &[]));

    assert_eq!(run("bool", json!("yes"), &[]), json!(true));
    assert_eq!(run("bool", json!("off"), &[]), json!(false));
    assert_eq!(run("bool", json!(0), &[]), json!(false));
    assert!(fails("bool", json!("maybe"), &[]));

    assert_eq!(run("string", json!(12), &[]), json!("12"));
    assert_eq!(run("string", Value::Null, &[]), Value::Null);
}

#[test]
fn test_int_rejects_out_of_range_values() {
    assert!(fails("int", json!(1e30), &[]));
    assert!(fails("int", json!(-1e30), &[]));
    assert!(fails("int", json!("1e30"), &[]));
    assert_eq!(run("int", json!(-2.7), &[]), json!(-2));

    assert_eq!(run("int", json!(u64::MAX), &[]), json!(u64::MAX));
    assert_eq!(run("int", json!("18446744073709551615"), &[]), json!(u64::MAX));
}

#[test]
fn test_round_rejects_out_of_range_values() {
    assert!(fails("round", json!(1e30), &[]));
    assert_eq!(run("round", json!(u64::MAX), &[]), json!(u64::MAX));
    assert!(fails("round", json!(-1e30), &[]));
}

#[test]
fn test_numeric_filters() {
    assert_eq!(run("round", json!(2.5), &[]), json!(3));
    assert_eq!(run("round", json!(3.14159), &[json!(2)]), json!(3.14));
    assert_eq!(run("round", json!(7), &[]), json!(7));
    assert!(fails("round", json!("x"), &[]));
    assert_eq!(run("abs", json!(-4), &[]), json!(4));
    assert_eq!(run("abs", json!(-1.5), &[]), json!(1.5));
}

#[test]
fn test_json_filters() {
    assert_eq!(run("json", json!({"a": [1]}), &[]), json!("{\"a\":[1]}"));
    assert_eq!(run("json_decode", json!("{\"a\":1}"), &[]), json!({"a": 1}));
    assert!(fails("json_decode", json!("{oops"), &[]));
}

#[test]
fn test_date_filter() {
    assert_eq!(
        run("date", json!("2024-03-05T10:20:30Z"), &[json!("%d/%m/%Y")]),
        json!("05/03/2024")
    );
    assert_eq!(
        run("date", json!("2024-03-05"), &[json!("%Y")]),
        json!("2024")
    );
    assert_eq!(
        run("date", json!("05.03.2024"), &[json!("%Y-%m-%d"), json!("%d.%m.%Y")]),
        json!("2024-03-05")
    );
    assert_eq!(run("date", json!(0), &[json!("%Y-%m-%d")]), json!("1970-01-01"));
    assert_eq!(run("date", Value::Null, &[json!("%Y")]), Value::Null);
    assert!(fails("date", json!("not a date"), &[json!("%Y")]));
    assert!(fails("date", json!("2024-03-05"), &[]));
}

#[test]
fn test_nullify_and_default() {
    assert_eq!(run("nullify", json!("   "), &[]), Value::Null);
    assert_eq!(run("nullify", json!("x"), &[]), json!("x"));
    assert_eq!(run("default", Value::Null, &[json!("n/a")]), json!("n/a"));
    assert_eq!(run("default", json!(""), &[json!("n/a")]), json!(""));
}
