//! The decode/encode interpreter.
//!
//! One structural recursion serves both directions; a `Dir` flag flips the
//! behavior at Transform and Refinement nodes. Everything else — literal
//! identity, struct keys, tuple arity, union candidates, lazy resolution —
//! is direction-agnostic.
//!
//! Validation failures come back as data (`ParseResult::Failure`); the
//! engine never panics on bad input.

pub mod object;
pub mod tuple;
pub mod union;

use once_cell::sync::Lazy as SyncLazy;
use serde_json::{Value, json};

use crate::ast::{Ast, IndexSignature, Keyword, KeyStrategy, Node, PropertyTransformation, Transform, Transformation};
use crate::result::{ParseError, ParseOptions, ParseResult, Warning};

/// Direction of the walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Decode,
    Encode,
}

/// Decode untyped input into the schema's target representation.
pub fn decode(ast: &Ast, input: &Value, options: &ParseOptions) -> ParseResult {
    run(ast, input, options, Dir::Decode)
}

/// Encode a target-side value back into the source representation.
pub fn encode(ast: &Ast, value: &Value, options: &ParseOptions) -> ParseResult {
    run(ast, value, options, Dir::Encode)
}

pub(crate) fn run(ast: &Ast, input: &Value, options: &ParseOptions, dir: Dir) -> ParseResult {
    match &ast.node {
        Node::Literal(expected) => {
            if value_eq(input, expected) {
                ParseResult::success(input.clone())
            } else {
                ParseResult::failure(ParseError::r#type(ast.clone(), input))
            }
        }
        Node::Keyword(k) => run_keyword(*k, ast, input),
        Node::TemplateLiteral(t) => match input.as_str() {
            Some(s) if t.regex.is_match(s) => ParseResult::success(input.clone()),
            _ => ParseResult::failure(ParseError::r#type(ast.clone(), input)),
        },
        Node::TypeLiteral(t) => object::run(t, ast, input, options, dir),
        Node::Tuple(t) => tuple::run(t, input, options, dir),
        Node::Union(u) => union::run(u, input, options, dir),
        Node::Refinement(r) => match dir {
            // decode the base first, then narrow
            Dir::Decode => match run(&r.from, input, options, dir) {
                ParseResult::Success { value, warnings } => match (r.filter)(&value, options, ast) {
                    None => ParseResult::Success { value, warnings },
                    Some(e) => ParseResult::failure(e),
                },
                failure => failure,
            },
            // the input already has the narrowed type: check, then widen
            Dir::Encode => match (r.filter)(input, options, ast) {
                None => run(&r.from, input, options, dir),
                Some(e) => ParseResult::failure(e),
            },
        },
        Node::Transform(t) => run_transform(t, ast, input, options, dir),
        Node::Lazy(l) => run(l.resolve(), input, options, dir),
        Node::Declaration(d) => match dir {
            Dir::Decode => (d.decode)(input, options, ast),
            Dir::Encode => (d.encode)(input, options, ast),
        },
    }
}

fn run_keyword(keyword: Keyword, ast: &Ast, input: &Value) -> ParseResult {
    let matches = match keyword {
        Keyword::Null => input.is_null(),
        Keyword::Boolean => input.is_boolean(),
        Keyword::Number => input.is_number(),
        Keyword::String => input.is_string(),
        Keyword::Object => input.is_object() || input.is_array(),
        Keyword::Any | Keyword::Unknown => true,
        Keyword::Never => false,
        Keyword::Integer => {
            return run_integer(ast, input);
        }
    };
    if matches {
        ParseResult::success(input.clone())
    } else {
        ParseResult::failure(ParseError::r#type(ast.clone(), input))
    }
}

/// `5` is an integer; `5.0` is accepted as `5` with a warning (serde_json
/// keeps the two distinct); anything else is a type error.
fn run_integer(ast: &Ast, input: &Value) -> ParseResult {
    if let Value::Number(n) = input {
        if n.is_i64() || n.is_u64() {
            return ParseResult::success(input.clone());
        }
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                return ParseResult::success_with_warnings(
                    json!(f as i64),
                    vec![Warning::new(format!("integral float {n} accepted as integer"))],
                );
            }
        }
    }
    ParseResult::failure(ParseError::r#type(ast.clone(), input))
}

fn run_transform(
    t: &Transform,
    ast: &Ast,
    input: &Value,
    options: &ParseOptions,
    dir: Dir,
) -> ParseResult {
    match &t.transformation {
        // the user function's output is trusted, never revalidated
        Transformation::Final { decode, encode } => match dir {
            Dir::Decode => run(&t.from, input, options, dir)
                .and_then(|a| decode(&a, options, ast)),
            Dir::Encode => encode(input, options, ast)
                .and_then(|a| run(&t.from, &a, options, dir)),
        },
        Transformation::PropertySignatures(pts) => match dir {
            Dir::Decode => run(&t.from, input, options, dir)
                .map(|v| apply_property_transformations(v, pts, dir)),
            Dir::Encode => {
                let prepared = apply_property_transformations(input.clone(), pts, dir);
                run(&t.from, &prepared, options, dir)
            }
        },
        Transformation::Compose => match dir {
            Dir::Decode => run(&t.from, input, options, dir)
                .and_then(|a| run(&t.to, &a, options, dir)),
            Dir::Encode => run(&t.to, input, options, dir)
                .and_then(|a| run(&t.from, &a, options, dir)),
        },
    }
}

/// Apply the per-key strategies to an already-validated struct value.
/// Pure key surgery; strategies themselves cannot fail.
fn apply_property_transformations(
    value: Value,
    pts: &[PropertyTransformation],
    dir: Dir,
) -> Value {
    let mut map = match value {
        Value::Object(map) => map,
        other => return other,
    };
    for pt in pts {
        let (take, put) = match dir {
            Dir::Decode => (&pt.from_key, &pt.to_key),
            Dir::Encode => (&pt.to_key, &pt.from_key),
        };
        let prev = map.shift_remove(take.as_str());
        let next = match (&pt.strategy, dir) {
            (KeyStrategy::Identity, _) => prev,
            (KeyStrategy::Default { make, .. }, Dir::Decode) => prev.or_else(|| Some(make())),
            (KeyStrategy::Default { make, omit_when_default }, Dir::Encode) => match prev {
                Some(v) if *omit_when_default && value_eq(&v, &make()) => None,
                prev => prev,
            },
            (KeyStrategy::WrapAbsence, Dir::Decode) => Some(match prev {
                None => json!({ "_tag": "None" }),
                Some(v) => json!({ "_tag": "Some", "value": v }),
            }),
            (KeyStrategy::WrapAbsence, Dir::Encode) => prev.and_then(|marker| {
                match marker.get("_tag").and_then(Value::as_str) {
                    Some("Some") => marker.get("value").cloned(),
                    _ => None,
                }
            }),
        };
        if let Some(v) = next {
            map.insert(put.clone(), v);
        }
    }
    Value::Object(map)
}

/// Literal identity with JS-style numeric equality: `1` and `1.0` are the
/// same literal even though serde_json stores them differently.
pub(crate) fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

static UNKNOWN_OBJECT: SyncLazy<Ast> = SyncLazy::new(|| {
    Ast::type_literal(
        Vec::new(),
        vec![IndexSignature {
            parameter: Ast::keyword(Keyword::String),
            ty: Ast::keyword(Keyword::Unknown),
        }],
    )
    .with_description("a generic object")
});

static UNKNOWN_ARRAY: SyncLazy<Ast> = SyncLazy::new(|| {
    Ast::tuple(Vec::new(), Some(vec![Ast::keyword(Keyword::Unknown)]))
        .with_description("a generic array")
});

/// Expected node reported when struct input is not an object.
pub(crate) fn unknown_object() -> Ast {
    UNKNOWN_OBJECT.clone()
}

/// Expected node reported when tuple input is not an array.
pub(crate) fn unknown_array() -> Ast {
    UNKNOWN_ARRAY.clone()
}
