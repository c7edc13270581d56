//! Tuple walker: fixed/optional elements, rest span, post-rest elements.
//!
//! Pass order matters for error reporting: missing required indexes first,
//! then unexpected indexes, then element values left to right.

use serde_json::Value;

use crate::ast::Tuple;
use crate::engine::{Dir, unknown_array};
use crate::result::{
    ErrorSink, ParseError, ParseOptions, ParseResult, PathSegment, Warning, prefix_warnings,
};

pub(crate) fn run(
    tu: &Tuple,
    input: &Value,
    options: &ParseOptions,
    dir: Dir,
) -> ParseResult {
    let Some(arr) = input.as_array() else {
        return ParseResult::failure(ParseError::r#type(unknown_array(), input));
    };

    let mut sink = ErrorSink::new(options);
    let mut warnings: Vec<Warning> = Vec::new();

    let required_elements = tu.elements.iter().filter(|el| !el.optional).count();
    let tail_len = tu.rest.as_ref().map(|r| r.len() - 1).unwrap_or(0);
    let required_len = required_elements + tail_len;

    // ---------------- missing indexes ----------------
    for i in arr.len()..required_len {
        let e = ParseError::index(i, vec![ParseError::Missing]);
        if sink.push(e) {
            return sink.into_failure();
        }
    }

    // ---------------- unexpected indexes ----------------
    if tu.rest.is_none() {
        for i in tu.elements.len()..arr.len() {
            let e = ParseError::index(i, vec![ParseError::Unexpected]);
            if sink.push(e) {
                return sink.into_failure();
            }
        }
    }

    let mut output: Vec<Value> = Vec::with_capacity(arr.len());

    // ---------------- elements ----------------
    for (i, el) in tu.elements.iter().enumerate() {
        if i >= arr.len() {
            // required absences were reported above; optionals just end
            break;
        }
        match super::run(&el.ty, &arr[i], options, dir) {
            ParseResult::Success { value, warnings: ws } => {
                warnings.extend(prefix_warnings(ws, PathSegment::Index(i)));
                output.push(value);
            }
            ParseResult::Failure { errors } => {
                let e = ParseError::index(i, errors);
                if sink.push(e) {
                    return sink.into_failure();
                }
            }
        }
    }

    // ---------------- rest span + post-rest elements ----------------
    if let Some(rest) = &tu.rest {
        let head = &rest[0];
        let tail = &rest[1..];
        let start = tu.elements.len();
        let end = arr.len().saturating_sub(tail.len());

        for i in start..end {
            match super::run(head, &arr[i], options, dir) {
                ParseResult::Success { value, warnings: ws } => {
                    warnings.extend(prefix_warnings(ws, PathSegment::Index(i)));
                    output.push(value);
                }
                ParseResult::Failure { errors } => {
                    let e = ParseError::index(i, errors);
                    if sink.push(e) {
                        return sink.into_failure();
                    }
                }
            }
        }

        let base = start.max(end);
        for (j, ty) in tail.iter().enumerate() {
            let i = base + j;
            if i >= arr.len() {
                // already reported as missing
                continue;
            }
            match super::run(ty, &arr[i], options, dir) {
                ParseResult::Success { value, warnings: ws } => {
                    warnings.extend(prefix_warnings(ws, PathSegment::Index(i)));
                    output.push(value);
                }
                ParseResult::Failure { errors } => {
                    let e = ParseError::index(i, errors);
                    if sink.push(e) {
                        return sink.into_failure();
                    }
                }
            }
        }
    }

    if sink.is_empty() {
        ParseResult::Success { value: Value::Array(output), warnings }
    } else {
        sink.into_failure()
    }
}
