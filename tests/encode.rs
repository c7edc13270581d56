//! Encoder behavior: the mirror walk, refinement checks on the narrowed
//! side, transform inversion, and round-trips.

mod common;

use common::*;
use json_codec::schema::*;
use serde_json::json;

#[test]
fn primitives_encode_to_themselves() {
    expect_encode(&string(), json!("a"), json!("a"));
    expect_encode(&number(), json!(1.5), json!(1.5));
    expect_encode(&boolean(), json!(true), json!(true));
    expect_encode_failure(&string(), json!(1), "Expected string, actual 1");
}

#[test]
fn number_from_string_encodes_via_rendering() {
    let schema = number_from_string();
    expect_encode(&schema, json!(1), json!("1"));
    expect_encode(&schema, json!(1.5), json!("1.5"));
    expect_encode(&schema, json!(0), json!("0"));
}

#[test]
fn refinements_check_before_widening() {
    let schema = number_from_string()
        .greater_than_or_equal_to(1.0)
        .less_than_or_equal_to(2.0);
    expect_encode(&schema, json!(1), json!("1"));
    expect_encode_failure(
        &schema,
        json!(0),
        "Expected a number greater than or equal to 1, actual 0",
    );
    expect_encode_failure(
        &schema,
        json!(3),
        "Expected a number less than or equal to 2, actual 3",
    );
}

#[test]
fn struct_encodes_each_property() {
    let schema = struct_(vec![("a", number_from_string().into()), ("b", boolean().into())]);
    expect_encode(
        &schema,
        json!({ "a": 1, "b": true }),
        json!({ "a": "1", "b": true }),
    );
}

#[test]
fn tuple_encodes_each_element() {
    let schema = tuple(vec![number_from_string()]).rest(boolean());
    expect_encode(&schema, json!([1, true, false]), json!(["1", true, false]));
}

#[test]
fn union_encodes_through_the_matching_member() {
    let schema = union(vec![number_from_string(), boolean()]);
    expect_encode(&schema, json!(1), json!("1"));
    expect_encode(&schema, json!(true), json!(true));
}

#[test]
fn union_tag_narrowing_uses_the_target_side() {
    let circle = struct_(vec![("kind", literal("circle").into()), ("radius", number().into())]);
    let square = struct_(vec![
        ("kind", literal("square").into()),
        ("side_length", number().into()),
    ]);
    let schema = union(vec![circle, square]);
    expect_encode(
        &schema,
        json!({ "kind": "square", "side_length": 2 }),
        json!({ "kind": "square", "side_length": 2 }),
    );
}

#[test]
fn decode_then_encode_round_trips() {
    let schema = struct_(vec![
        ("a", number_from_string().into()),
        ("b", optional(boolean())),
    ]);
    let input = json!({ "a": "42", "b": false });
    let decoded = schema
        .decode(&input, &json_codec::ParseOptions::DEFAULT)
        .ok()
        .expect("decode should succeed");
    expect_encode(&schema, decoded, input);
}

#[test]
fn encode_result_shape_carries_the_error_tree() {
    let schema = number_from_string();
    let err = schema
        .encode_result(&json!("not a number"), &json_codec::ParseOptions::DEFAULT)
        .expect_err("encoding a string through a number schema must fail");
    assert!(err.to_string().starts_with("error(s) found"));
}
