//! Struct (type literal) walker: declared keys, index signatures, excess
//! keys.

use serde_json::{Map, Value};

use crate::ast::{Ast, TypeLiteral};
use crate::engine::{Dir, unknown_object};
use crate::result::{
    ErrorSink, ExcessProperty, ParseError, ParseOptions, ParseResult, PathSegment, Warning,
    prefix_warnings,
};

pub(crate) fn run(
    tl: &TypeLiteral,
    ast: &Ast,
    input: &Value,
    options: &ParseOptions,
    dir: Dir,
) -> ParseResult {
    // a signature-free struct accepts any object or array, unchanged
    if tl.property_signatures.is_empty() && tl.index_signatures.is_empty() {
        return match input {
            Value::Object(_) | Value::Array(_) => ParseResult::success(input.clone()),
            _ => ParseResult::failure(ParseError::r#type(ast.clone(), input)),
        };
    }

    let Some(obj) = input.as_object() else {
        return ParseResult::failure(ParseError::r#type(unknown_object(), input));
    };

    let mut sink = ErrorSink::new(options);
    let mut warnings: Vec<Warning> = Vec::new();
    let mut output: Map<String, Value> = Map::new();

    // ---------------- excess keys ----------------
    // Checked first so strict mode reports unexpected keys before value
    // errors. Any index signature covers every string key; refinements on
    // the parameter are enforced below, not here.
    if options.on_excess_property == ExcessProperty::Error && tl.index_signatures.is_empty() {
        for key in obj.keys() {
            if !is_declared(tl, key) {
                let e = ParseError::key(key.as_str(), vec![ParseError::Unexpected]);
                if sink.push(e) {
                    return sink.into_failure();
                }
            }
        }
    }

    // ---------------- declared signatures ----------------
    for ps in &tl.property_signatures {
        match obj.get(&ps.key) {
            Some(v) => match super::run(&ps.ty, v, options, dir) {
                ParseResult::Success { value, warnings: ws } => {
                    warnings.extend(prefix_warnings(ws, PathSegment::Key(ps.key.clone())));
                    output.insert(ps.key.clone(), value);
                }
                ParseResult::Failure { errors } => {
                    let e = ParseError::key(ps.key.as_str(), errors);
                    if sink.push(e) {
                        return sink.into_failure();
                    }
                }
            },
            None => {
                if !ps.optional {
                    let e = ParseError::key(ps.key.as_str(), vec![ParseError::Missing]);
                    if sink.push(e) {
                        return sink.into_failure();
                    }
                }
            }
        }
    }

    // ---------------- index signatures ----------------
    // Every non-declared key is validated against the parameter (so a
    // refined key type rejects bad keys under either excess policy), then
    // its value against the value type.
    for is_ in &tl.index_signatures {
        for (key, v) in obj {
            if is_declared(tl, key) {
                continue;
            }
            let key_value = Value::String(key.clone());
            match super::run(&is_.parameter, &key_value, options, dir) {
                ParseResult::Failure { errors } => {
                    let e = ParseError::key(key.as_str(), errors);
                    if sink.push(e) {
                        return sink.into_failure();
                    }
                }
                ParseResult::Success { .. } => match super::run(&is_.ty, v, options, dir) {
                    ParseResult::Success { value, warnings: ws } => {
                        warnings.extend(prefix_warnings(ws, PathSegment::Key(key.clone())));
                        output.insert(key.clone(), value);
                    }
                    ParseResult::Failure { errors } => {
                        let e = ParseError::key(key.as_str(), errors);
                        if sink.push(e) {
                            return sink.into_failure();
                        }
                    }
                },
            }
        }
    }

    if sink.is_empty() {
        ParseResult::Success { value: Value::Object(output), warnings }
    } else {
        sink.into_failure()
    }
}

fn is_declared(tl: &TypeLiteral, key: &str) -> bool {
    tl.property_signatures.iter().any(|ps| ps.key == key)
}
