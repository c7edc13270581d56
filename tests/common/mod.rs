//! Shared assertion helpers for the integration suites.
#![allow(dead_code)]

use json_codec::format::{format_errors, format_errors_tree};
use json_codec::{Codec, ParseOptions, ParseResult};
use serde_json::Value;

pub fn expect_decode(codec: &Codec, input: Value, expected: Value) {
    expect_decode_with(codec, input, expected, &ParseOptions::DEFAULT);
}

pub fn expect_decode_with(codec: &Codec, input: Value, expected: Value, options: &ParseOptions) {
    match codec.decode(&input, options) {
        ParseResult::Success { value, .. } => assert_eq!(value, expected),
        ParseResult::Failure { errors } => {
            panic!("expected success, got: {}", format_errors(&errors))
        }
    }
}

pub fn expect_decode_failure(codec: &Codec, input: Value, message: &str) {
    expect_decode_failure_with(codec, input, message, &ParseOptions::DEFAULT);
}

pub fn expect_decode_failure_with(
    codec: &Codec,
    input: Value,
    message: &str,
    options: &ParseOptions,
) {
    match codec.decode(&input, options) {
        ParseResult::Success { value, .. } => {
            panic!("expected failure {message:?}, got success: {value}")
        }
        ParseResult::Failure { errors } => assert_eq!(format_errors(&errors), message),
    }
}

pub fn expect_decode_failure_tree(codec: &Codec, input: Value, message: &str) {
    match codec.decode(&input, &ParseOptions::DEFAULT) {
        ParseResult::Success { value, .. } => {
            panic!("expected failure, got success: {value}")
        }
        ParseResult::Failure { errors } => assert_eq!(format_errors_tree(&errors), message),
    }
}

pub fn expect_encode(codec: &Codec, value: Value, expected: Value) {
    expect_encode_with(codec, value, expected, &ParseOptions::DEFAULT);
}

pub fn expect_encode_with(codec: &Codec, value: Value, expected: Value, options: &ParseOptions) {
    match codec.encode(&value, options) {
        ParseResult::Success { value, .. } => assert_eq!(value, expected),
        ParseResult::Failure { errors } => {
            panic!("expected success, got: {}", format_errors(&errors))
        }
    }
}

pub fn expect_encode_failure(codec: &Codec, value: Value, message: &str) {
    match codec.encode(&value, &ParseOptions::DEFAULT) {
        ParseResult::Success { value, .. } => {
            panic!("expected failure {message:?}, got success: {value}")
        }
        ParseResult::Failure { errors } => assert_eq!(format_errors(&errors), message),
    }
}
