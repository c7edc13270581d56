//! Transform behavior: per-key strategies (identity, rename, default,
//! absence wrapping), the stock transforms, projections, and warnings.

mod common;

use common::*;
use json_codec::ast::{
    Ast, KeyStrategy, PropertyTransformation, Transformation,
};
use json_codec::schema::*;
use json_codec::{Codec, ParseOptions, ParseResult};
use serde_json::{Value, json};
use std::sync::Arc;

fn property_transform(
    from: Codec,
    to: Codec,
    transformations: Vec<PropertyTransformation>,
) -> Codec {
    Codec::make(Ast::transform(
        from.ast().clone(),
        to.ast().clone(),
        Transformation::PropertySignatures(transformations),
    ))
}

// ————————————————————————————————————————————————————————————————————————————
// PER-KEY STRATEGIES
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn identity_passthrough() {
    let schema = property_transform(
        struct_(vec![("a", number_from_string().into())]),
        struct_(vec![("a", number().into())]),
        vec![],
    );
    expect_decode(&schema, json!({ "a": "1" }), json!({ "a": 1 }));
    expect_decode_failure(
        &schema,
        json!({ "a": "a" }),
        "/a Expected string -> number, actual \"a\"",
    );
    expect_encode(&schema, json!({ "a": 1 }), json!({ "a": "1" }));
    expect_encode(&schema, json!({ "a": 0 }), json!({ "a": "0" }));
}

#[test]
fn rename() {
    let schema = property_transform(
        struct_(vec![("a", number().into())]),
        struct_(vec![("b", number().into())]),
        vec![PropertyTransformation {
            from_key: "a".into(),
            to_key: "b".into(),
            strategy: KeyStrategy::Identity,
        }],
    );
    expect_decode(&schema, json!({ "a": 1 }), json!({ "b": 1 }));
    expect_encode(&schema, json!({ "b": 1 }), json!({ "a": 1 }));
}

#[test]
fn default_injects_on_decode() {
    let schema = struct_(vec![(
        "a",
        optional(number_from_string()).with_default(|| json!(0)),
    )]);
    expect_decode(&schema, json!({}), json!({ "a": 0 }));
    expect_decode(&schema, json!({ "a": "1" }), json!({ "a": 1 }));
    expect_decode_failure(
        &schema,
        json!({ "a": "a" }),
        "/a Expected string -> number, actual \"a\"",
    );
    expect_encode(&schema, json!({ "a": 1 }), json!({ "a": "1" }));
    expect_encode(&schema, json!({ "a": 0 }), json!({ "a": "0" }));
}

#[test]
fn bidirectional_default_omits_on_encode() {
    let schema = struct_(vec![(
        "a",
        optional(number_from_string())
            .with_default(|| json!(0))
            .omit_when_default(),
    )]);
    expect_decode(&schema, json!({}), json!({ "a": 0 }));
    expect_decode(&schema, json!({ "a": "1" }), json!({ "a": 1 }));
    expect_encode(&schema, json!({ "a": 1 }), json!({ "a": "1" }));
    expect_encode(&schema, json!({ "a": 0 }), json!({}));
}

#[test]
fn to_option_wraps_absence() {
    let schema = struct_(vec![("a", optional(number_from_string()).to_option())]);
    expect_decode(&schema, json!({}), json!({ "a": { "_tag": "None" } }));
    expect_decode(
        &schema,
        json!({ "a": "1" }),
        json!({ "a": { "_tag": "Some", "value": 1 } }),
    );
    expect_decode_failure(
        &schema,
        json!({ "a": "a" }),
        "/a Expected string -> number, actual \"a\"",
    );
    expect_encode(
        &schema,
        json!({ "a": { "_tag": "Some", "value": 1 } }),
        json!({ "a": "1" }),
    );
    expect_encode(&schema, json!({ "a": { "_tag": "None" } }), json!({}));
}

#[test]
fn mixed_field_strategies() {
    let schema = struct_(vec![
        ("a", boolean().into()),
        ("b", optional(number_from_string())),
        ("c", optional(trim()).with_default(|| json!("-"))),
        ("d", optional(date_from_string()).to_option()),
    ]);
    expect_decode(
        &schema,
        json!({ "a": true }),
        json!({ "a": true, "c": "-", "d": { "_tag": "None" } }),
    );
    expect_decode(
        &schema,
        json!({ "a": true, "b": "1" }),
        json!({ "a": true, "b": 1, "c": "-", "d": { "_tag": "None" } }),
    );
    expect_decode(
        &schema,
        json!({ "a": true, "c": " a " }),
        json!({ "a": true, "c": "a", "d": { "_tag": "None" } }),
    );
    expect_decode(
        &schema,
        json!({ "a": true, "d": "1970-01-01T00:00:00Z" }),
        json!({
            "a": true,
            "c": "-",
            "d": { "_tag": "Some", "value": "1970-01-01T00:00:00.000Z" }
        }),
    );
}

// ————————————————————————————————————————————————————————————————————————————
// STOCK TRANSFORMS
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn number_from_string_decodes() {
    let schema = number_from_string();
    expect_decode(&schema, json!("1"), json!(1));
    expect_decode(&schema, json!("1.5"), json!(1.5));
    expect_decode(&schema, json!("-2"), json!(-2));
    expect_decode_failure(&schema, json!("a"), "Expected string -> number, actual \"a\"");
    expect_decode_failure(&schema, json!(""), "Expected string -> number, actual \"\"");
    expect_decode_failure(&schema, json!(null), "Expected string, actual null");
}

#[test]
fn number_from_string_rejects_non_finite() {
    // JSON numbers are finite; the special strings have no representation
    let schema = number_from_string();
    expect_decode_failure(&schema, json!("NaN"), "Expected string -> number, actual \"NaN\"");
    expect_decode_failure(
        &schema,
        json!("Infinity"),
        "Expected string -> number, actual \"Infinity\"",
    );
}

#[test]
fn number_from_string_composes_with_int() {
    let schema = number_from_string().int();
    expect_decode(&schema, json!("1"), json!(1));
    expect_decode_failure(&schema, json!("1.2"), "Expected integer, actual 1.2");
    expect_decode_failure(&schema, json!(null), "Expected string, actual null");
}

#[test]
fn trim_removes_surrounding_whitespace() {
    let schema = trim();
    expect_decode(&schema, json!(" a "), json!("a"));
    expect_decode(&schema, json!("a"), json!("a"));
    expect_encode(&schema, json!("a"), json!("a"));
}

#[test]
fn clamp_bounds_on_decode() {
    let schema = number().clamp(-1.0, 1.0);
    expect_decode(&schema, json!(3), json!(1));
    expect_decode(&schema, json!(0.5), json!(0.5));
    expect_decode(&schema, json!(-3), json!(-1));
}

#[test]
fn date_from_string_normalizes() {
    let schema = date_from_string();
    expect_decode(
        &schema,
        json!("1970-01-01T00:00:00Z"),
        json!("1970-01-01T00:00:00.000Z"),
    );
    expect_decode(
        &schema,
        json!("1970-01-01T01:00:00+01:00"),
        json!("1970-01-01T00:00:00.000Z"),
    );
    expect_decode_failure(
        &schema,
        json!("not a date"),
        "Expected string -> a valid date-time string, actual \"not a date\"",
    );
    expect_encode(
        &schema,
        json!("1970-01-01T00:00:00.000Z"),
        json!("1970-01-01T00:00:00.000Z"),
    );
}

#[test]
fn compose_chains_both_directions() {
    let schema = trim().compose(number_from_string());
    expect_decode(&schema, json!(" 1 "), json!(1));
    expect_encode(&schema, json!(1), json!("1"));
}

#[test]
fn negate_flips_booleans() {
    let schema = boolean().negate();
    expect_decode(&schema, json!(true), json!(false));
    expect_encode(&schema, json!(false), json!(true));
}

#[test]
fn declaration_delegates_both_directions() {
    let decode: json_codec::ast::TransformFn = Arc::new(|v, _, ast| match v.as_str() {
        Some(s) if s.chars().all(|c| c.is_ascii_hexdigit()) => {
            ParseResult::success(Value::String(s.to_lowercase()))
        }
        _ => ParseResult::failure(json_codec::ParseError::r#type(ast.clone(), v)),
    });
    let encode: json_codec::ast::TransformFn = Arc::new(|v, _, _| ParseResult::success(v.clone()));
    let schema = declaration("HexString", decode, encode);
    expect_decode(&schema, json!("AB12"), json!("ab12"));
    expect_decode_failure(&schema, json!("xyz"), "Expected HexString, actual \"xyz\"");
}

// ————————————————————————————————————————————————————————————————————————————
// PROJECTIONS & GUARDS
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn from_side_is_the_source_schema() {
    let schema = number_from_string().from_side();
    expect_decode(&schema, json!("a"), json!("a"));
    expect_decode_failure(&schema, json!(null), "Expected string, actual null");
    expect_decode_failure(&schema, json!(1), "Expected string, actual 1");
}

#[test]
fn to_side_is_the_target_schema() {
    let schema = number_from_string().to_side();
    expect_decode(&schema, json!(1), json!(1));
    expect_decode_failure(&schema, json!(null), "Expected number, actual null");
    expect_decode_failure(&schema, json!("a"), "Expected number, actual \"a\"");
}

#[test]
fn is_checks_the_target_side() {
    let schema = number_from_string();
    assert!(schema.is(&json!(1)));
    assert!(!schema.is(&json!("1")));

    let positive = number().greater_than(0.0);
    assert!(positive.is(&json!(1)));
    assert!(!positive.is(&json!(0)));
}

#[test]
fn pick_restricts_a_struct() {
    let schema = struct_(vec![("a", string().into()), ("b", number().into())]).pick(&["b"]);
    expect_decode(&schema, json!({ "a": "x", "b": 1 }), json!({ "b": 1 }));
    expect_decode_failure(&schema, json!({ "a": "x" }), "/b is missing");
}

#[test]
fn omit_drops_keys_from_a_struct() {
    let schema = struct_(vec![("a", string().into()), ("b", number().into())]).omit(&["b"]);
    expect_decode(&schema, json!({ "a": "x", "b": 1 }), json!({ "a": "x" }));
    expect_decode_failure(&schema, json!({ "b": 1 }), "/a is missing");
}

#[test]
fn pick_keeps_matching_property_transformations() {
    let schema = struct_(vec![
        ("a", optional(number_from_string()).with_default(|| json!(0))),
        ("b", string().into()),
    ])
    .pick(&["a"]);
    expect_decode(&schema, json!({}), json!({ "a": 0 }));
    expect_decode(&schema, json!({ "a": "1" }), json!({ "a": 1 }));
}

#[test]
fn pick_degrades_to_the_plain_projection() {
    let schema = struct_(vec![
        ("a", optional(number_from_string()).with_default(|| json!(0))),
        ("b", string().into()),
    ])
    .pick(&["b"]);
    expect_decode(&schema, json!({ "b": "x" }), json!({ "b": "x" }));
    expect_decode_failure(&schema, json!({}), "/b is missing");
}

// ————————————————————————————————————————————————————————————————————————————
// WARNINGS
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn warnings_gain_path_segments_through_nesting() {
    use json_codec::result::PathSegment;
    let schema = struct_(vec![("ns", array(integer()).into())]);
    match schema.decode(&json!({ "ns": [1, 2.0] }), &ParseOptions::DEFAULT) {
        ParseResult::Success { value, warnings } => {
            assert_eq!(value, json!({ "ns": [1, 2] }));
            assert_eq!(warnings.len(), 1);
            assert_eq!(
                warnings[0].path,
                vec![PathSegment::Key("ns".into()), PathSegment::Index(1)]
            );
        }
        other => panic!("expected success with warnings, got {other:?}"),
    }
}

#[test]
fn warnings_survive_transform_steps() {
    let schema = struct_(vec![("n", optional(integer()).with_default(|| json!(0)))]);
    match schema.decode(&json!({ "n": 3.0 }), &ParseOptions::DEFAULT) {
        ParseResult::Success { value, warnings } => {
            assert_eq!(value, json!({ "n": 3 }));
            assert_eq!(warnings.len(), 1);
        }
        other => panic!("expected success with warnings, got {other:?}"),
    }
}

#[test]
fn user_transforms_can_attach_warnings() {
    use json_codec::result::Warning;
    let schema = transform_result(
        string(),
        string(),
        Arc::new(|v, _, _| {
            ParseResult::success_with_warnings(v.clone(), vec![Warning::new("looked at")])
        }),
        Arc::new(|v, _, _| ParseResult::success(v.clone())),
    );
    match schema.decode(&json!("x"), &ParseOptions::DEFAULT) {
        ParseResult::Success { warnings, .. } => assert_eq!(warnings.len(), 1),
        other => panic!("expected success, got {other:?}"),
    }
}
