//! Constructor catalogue: keywords, literals, structs, tuples, records,
//! unions, filters, and the stock transforms.
//!
//! Thin builders over the AST. Shape invariants are checked here eagerly —
//! a bad combination (required element after optional, unsupported template
//! span, struct-only combinator on a non-struct) panics at construction
//! time, never at decode time.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat};
use regex::Regex;
use serde_json::{Value, json};

use crate::ast::{
    self, Ast, FilterFn, IndexSignature, Keyword, KeyStrategy, Node, PropertySignature,
    PropertyTransformation, TemplateHole, TemplateSpan, Transformation, TransformFn, TupleElement,
};
use crate::codec::Codec;
use crate::format::format_expected;
use crate::result::{ParseError, ParseResult};

// ————————————————————————————————————————————————————————————————————————————
// PRIMITIVES
// ————————————————————————————————————————————————————————————————————————————

pub fn string() -> Codec {
    Codec::make(Ast::keyword(Keyword::String))
}

pub fn number() -> Codec {
    Codec::make(Ast::keyword(Keyword::Number))
}

pub fn integer() -> Codec {
    Codec::make(Ast::keyword(Keyword::Integer))
}

pub fn boolean() -> Codec {
    Codec::make(Ast::keyword(Keyword::Boolean))
}

pub fn null() -> Codec {
    Codec::make(Ast::keyword(Keyword::Null))
}

/// Any JSON object or array.
pub fn object() -> Codec {
    Codec::make(Ast::keyword(Keyword::Object))
}

pub fn any() -> Codec {
    Codec::make(Ast::keyword(Keyword::Any))
}

pub fn unknown() -> Codec {
    Codec::make(Ast::keyword(Keyword::Unknown))
}

pub fn never() -> Codec {
    Codec::make(Ast::keyword(Keyword::Never))
}

/// A single exact value.
pub fn literal(value: impl Into<Value>) -> Codec {
    Codec::make(Ast::literal(value.into()))
}

/// One of several exact values.
pub fn literals(values: Vec<Value>) -> Codec {
    Codec::make(Ast::union(values.into_iter().map(Ast::literal).collect()))
}

// ————————————————————————————————————————————————————————————————————————————
// TEMPLATE LITERALS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Default)]
struct Pattern {
    head: String,
    spans: Vec<TemplateSpan>,
}

impl Pattern {
    fn push_literal(&mut self, text: &str) {
        match self.spans.last_mut() {
            Some(span) => span.literal.push_str(text),
            None => self.head.push_str(text),
        }
    }

    fn push_hole(&mut self, hole: TemplateHole) {
        self.spans.push(TemplateSpan { hole, literal: String::new() });
    }

    fn into_ast(self) -> Ast {
        if self.spans.is_empty() {
            Ast::literal(Value::String(self.head))
        } else {
            Ast::template_literal(self.head, self.spans)
        }
    }
}

/// Concatenate literal spans and typed holes into a string pattern.
/// Adjacent literals collapse; a union of literals distributes into a union
/// of patterns; an all-literal template collapses to a plain literal.
/// Panics on span schemas a template cannot express.
pub fn template_literal(parts: Vec<Codec>) -> Codec {
    let mut patterns = vec![Pattern::default()];
    for part in &parts {
        expand_span(part.ast(), &mut patterns);
    }
    Codec::make(Ast::union(patterns.into_iter().map(Pattern::into_ast).collect()))
}

fn expand_span(ast: &Ast, patterns: &mut Vec<Pattern>) {
    match &ast.node {
        Node::Literal(Value::String(s)) => {
            for p in patterns.iter_mut() {
                p.push_literal(s);
            }
        }
        Node::Keyword(Keyword::String) => {
            for p in patterns.iter_mut() {
                p.push_hole(TemplateHole::String);
            }
        }
        Node::Keyword(Keyword::Number) => {
            for p in patterns.iter_mut() {
                p.push_hole(TemplateHole::Number);
            }
        }
        Node::Union(u) => {
            let current = std::mem::take(patterns);
            for p in current {
                for member in &u.types {
                    let Node::Literal(Value::String(s)) = &member.node else {
                        panic!(
                            "templateLiteral: unsupported template literal span {}",
                            format_expected(member)
                        );
                    };
                    let mut q = p.clone();
                    q.push_literal(s);
                    patterns.push(q);
                }
            }
        }
        _ => panic!(
            "templateLiteral: unsupported template literal span {}",
            format_expected(ast)
        ),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// STRUCTS & RECORDS
// ————————————————————————————————————————————————————————————————————————————

/// One struct field: a schema plus its presence/transformation behavior.
pub struct Field {
    codec: Codec,
    kind: FieldKind,
}

enum FieldKind {
    Required,
    Optional,
    Default { make: ast::DefaultFn, omit_when_default: bool },
    ToOption,
}

impl From<Codec> for Field {
    fn from(codec: Codec) -> Field {
        Field { codec, kind: FieldKind::Required }
    }
}

/// A field that may be absent from the input.
pub fn optional(codec: Codec) -> Field {
    Field { codec, kind: FieldKind::Optional }
}

impl Field {
    /// Inject `make()` when the key is absent on decode.
    pub fn with_default(self, make: impl Fn() -> Value + Send + Sync + 'static) -> Field {
        match self.kind {
            FieldKind::Optional => Field {
                codec: self.codec,
                kind: FieldKind::Default { make: Arc::new(make), omit_when_default: false },
            },
            _ => panic!("withDefault: only an optional field can take a default"),
        }
    }

    /// Make the default bidirectional: encoding drops a value equal to it.
    pub fn omit_when_default(self) -> Field {
        match self.kind {
            FieldKind::Default { make, .. } => Field {
                codec: self.codec,
                kind: FieldKind::Default { make, omit_when_default: true },
            },
            _ => panic!("omitWhenDefault: requires a defaulted field"),
        }
    }

    /// Surface presence explicitly: decode to `{"_tag":"Some","value":v}` /
    /// `{"_tag":"None"}` markers, encode back to presence/absence.
    pub fn to_option(self) -> Field {
        match self.kind {
            FieldKind::Optional => Field { codec: self.codec, kind: FieldKind::ToOption },
            _ => panic!("toOption: only an optional field can surface as an option"),
        }
    }
}

/// A struct schema. Builds a plain type literal when every field passes
/// through, and a property-signature transform when any field defaults,
/// renames, or wraps absence.
pub fn struct_(fields: Vec<(&str, Field)>) -> Codec {
    let mut plain: Vec<PropertySignature> = Vec::new();
    let mut froms: Vec<PropertySignature> = Vec::new();
    let mut tos: Vec<PropertySignature> = Vec::new();
    let mut transformations: Vec<PropertyTransformation> = Vec::new();

    for (key, field) in fields {
        let from_ty = field.codec.ast().clone();
        let to_ty = ast::to(&from_ty);
        match field.kind {
            FieldKind::Required => {
                plain.push(sig(key, from_ty.clone(), false));
                froms.push(sig(key, from_ty, false));
                tos.push(sig(key, to_ty, false));
            }
            FieldKind::Optional => {
                plain.push(sig(key, from_ty.clone(), true));
                froms.push(sig(key, from_ty, true));
                tos.push(sig(key, to_ty, true));
            }
            FieldKind::Default { make, omit_when_default } => {
                froms.push(sig(key, from_ty, true));
                tos.push(sig(key, to_ty, false));
                transformations.push(PropertyTransformation {
                    from_key: key.to_string(),
                    to_key: key.to_string(),
                    strategy: KeyStrategy::Default { make, omit_when_default },
                });
            }
            FieldKind::ToOption => {
                froms.push(sig(key, from_ty, true));
                tos.push(sig(key, option_marker(to_ty), false));
                transformations.push(PropertyTransformation {
                    from_key: key.to_string(),
                    to_key: key.to_string(),
                    strategy: KeyStrategy::WrapAbsence,
                });
            }
        }
    }

    if transformations.is_empty() {
        Codec::make(Ast::type_literal(plain, Vec::new()))
    } else {
        Codec::make(Ast::transform(
            Ast::type_literal(froms, Vec::new()),
            Ast::type_literal(tos, Vec::new()),
            Transformation::PropertySignatures(transformations),
        ))
    }
}

fn sig(key: &str, ty: Ast, optional: bool) -> PropertySignature {
    PropertySignature { key: key.to_string(), ty, optional }
}

/// Target-side shape of a `to_option` field.
fn option_marker(value: Ast) -> Ast {
    Ast::union(vec![
        Ast::type_literal(vec![sig("_tag", Ast::literal(json!("None")), false)], Vec::new()),
        Ast::type_literal(
            vec![
                sig("_tag", Ast::literal(json!("Some")), false),
                sig("value", value, false),
            ],
            Vec::new(),
        ),
    ])
}

/// A homogeneous string-keyed map. Literal keys (and unions of them) become
/// required signatures; string-like keys become an index signature; `never`
/// keys accept any object.
pub fn record(key: Codec, value: Codec) -> Codec {
    let mut signatures: Vec<PropertySignature> = Vec::new();
    let mut index_signatures: Vec<IndexSignature> = Vec::new();
    record_keys(key.ast(), value.ast(), &mut signatures, &mut index_signatures);
    Codec::make(Ast::type_literal(signatures, index_signatures))
}

fn record_keys(
    key: &Ast,
    value: &Ast,
    signatures: &mut Vec<PropertySignature>,
    index_signatures: &mut Vec<IndexSignature>,
) {
    match &key.node {
        Node::Literal(Value::String(s)) => signatures.push(sig(s, value.clone(), false)),
        Node::Keyword(Keyword::String) | Node::TemplateLiteral(_) | Node::Refinement(_) => {
            index_signatures
                .push(IndexSignature { parameter: key.clone(), ty: value.clone() });
        }
        Node::Union(u) => {
            for member in &u.types {
                record_keys(member, value, signatures, index_signatures);
            }
        }
        Node::Keyword(Keyword::Never) => {}
        _ => panic!("record: unsupported key schema {}", format_expected(key)),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TUPLES & ARRAYS
// ————————————————————————————————————————————————————————————————————————————

/// A fixed-arity tuple of required elements. Extend with
/// `optional_element`/`rest`/`element`.
pub fn tuple(elements: Vec<Codec>) -> Codec {
    Codec::make(Ast::tuple(
        elements
            .into_iter()
            .map(|c| TupleElement { ty: c.into_ast(), optional: false })
            .collect(),
        None,
    ))
}

/// Zero or more elements of one type.
pub fn array(item: Codec) -> Codec {
    Codec::make(Ast::tuple(Vec::new(), Some(vec![item.into_ast()])))
}

pub fn non_empty_array(item: Codec) -> Codec {
    tuple(vec![item.clone()]).rest(item)
}

impl Codec {
    /// Append an optional element. Panics on a non-tuple schema or after a
    /// rest element.
    pub fn optional_element(self, element: Codec) -> Codec {
        self.map_tuple("optionalElement", |t| {
            if t.rest.is_some() {
                panic!("optionalElement: an optional element cannot follow a rest element");
            }
            t.elements.push(TupleElement { ty: element.into_ast(), optional: true });
        })
    }

    /// Append a required element — after a rest span it becomes a post-rest
    /// element. Panics on a non-tuple schema or directly after an optional
    /// element.
    pub fn element(self, element: Codec) -> Codec {
        self.map_tuple("element", |t| match &mut t.rest {
            Some(rest) => rest.push(element.into_ast()),
            None => {
                if t.elements.last().is_some_and(|el| el.optional) {
                    panic!("element: a required element cannot follow an optional element");
                }
                t.elements.push(TupleElement { ty: element.into_ast(), optional: false });
            }
        })
    }

    /// Let the tuple absorb any number of trailing `item`s. Panics on a
    /// non-tuple schema or a second rest element.
    pub fn rest(self, item: Codec) -> Codec {
        self.map_tuple("rest", |t| {
            if t.rest.is_some() {
                panic!("rest: a rest element cannot follow another rest element");
            }
            t.rest = Some(vec![item.into_ast()]);
        })
    }

    fn map_tuple(self, op: &str, edit: impl FnOnce(&mut ast::Tuple)) -> Codec {
        let Ast { node, annotations } = self.into_ast();
        match node {
            Node::Tuple(mut t) => {
                edit(&mut t);
                Codec::make(Ast { node: Node::Tuple(t), annotations })
            }
            _ => panic!("{op}: not supported on this schema"),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// COMBINATORS
// ————————————————————————————————————————————————————————————————————————————

pub fn union(members: Vec<Codec>) -> Codec {
    Codec::make(Ast::union(members.into_iter().map(Codec::into_ast).collect()))
}

pub fn nullable(codec: Codec) -> Codec {
    union(vec![null(), codec])
}

/// A self-referential schema; the thunk is resolved (and memoized) on first
/// use, so recursion never unfolds eagerly.
pub fn lazy(f: impl Fn() -> Codec + Send + Sync + 'static) -> Codec {
    Codec::make(Ast::lazy(move || f().into_ast()))
}

/// Escape hatch for externally-defined shapes: the engine delegates both
/// directions to the supplied capabilities.
pub fn declaration(id: impl Into<String>, decode: TransformFn, encode: TransformFn) -> Codec {
    Codec::make(Ast::declaration(id, decode, encode))
}

/// A bidirectional mapping with infallible steps.
pub fn transform(
    from: Codec,
    to: Codec,
    decode: impl Fn(&Value) -> Value + Send + Sync + 'static,
    encode: impl Fn(&Value) -> Value + Send + Sync + 'static,
) -> Codec {
    transform_result(
        from,
        to,
        Arc::new(move |v, _, _| ParseResult::success(decode(v))),
        Arc::new(move |v, _, _| ParseResult::success(encode(v))),
    )
}

/// A bidirectional mapping whose steps may fail or warn.
pub fn transform_result(
    from: Codec,
    to: Codec,
    decode: TransformFn,
    encode: TransformFn,
) -> Codec {
    Codec::make(Ast::transform(
        from.into_ast(),
        to.into_ast(),
        Transformation::Final { decode, encode },
    ))
}

impl Codec {
    /// Validate through `self`, then through `that`; encode mirrors.
    pub fn compose(self, that: Codec) -> Codec {
        Codec::make(Ast::transform(self.into_ast(), that.into_ast(), Transformation::Compose))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// FILTERS
// ————————————————————————————————————————————————————————————————————————————

impl Codec {
    /// Layer a predicate over this schema. The description becomes the
    /// expected text of the refinement's errors.
    pub fn refine(
        self,
        description: impl Into<String>,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Codec {
        let filter: FilterFn = Arc::new(move |value, _options, self_ast| {
            if predicate(value) {
                None
            } else {
                Some(ParseError::r#type(self_ast.clone(), value))
            }
        });
        Codec::make(Ast::refinement(self.into_ast(), filter).with_description(description))
    }

    // ——— strings ———

    pub fn min_length(self, n: usize) -> Codec {
        self.refine(format!("a string at least {n} character(s) long"), move |v| {
            v.as_str().is_some_and(|s| s.chars().count() >= n)
        })
    }

    pub fn max_length(self, n: usize) -> Codec {
        self.refine(format!("a string at most {n} character(s) long"), move |v| {
            v.as_str().is_some_and(|s| s.chars().count() <= n)
        })
    }

    pub fn non_empty(self) -> Codec {
        self.min_length(1)
    }

    pub fn length(self, n: usize) -> Codec {
        self.max_length(n).min_length(n)
    }

    /// Panics on an invalid pattern — a schema-construction error.
    pub fn pattern(self, pattern: &str) -> Codec {
        let re = Regex::new(pattern)
            .unwrap_or_else(|e| panic!("pattern: invalid regular expression: {e}"));
        self.refine(format!("a string matching the pattern {pattern}"), move |v| {
            v.as_str().is_some_and(|s| re.is_match(s))
        })
    }

    pub fn starts_with(self, prefix: &str) -> Codec {
        let prefix = prefix.to_string();
        let description = format!("a string starting with {:?}", prefix);
        self.refine(description, move |v| v.as_str().is_some_and(|s| s.starts_with(&prefix)))
    }

    pub fn ends_with(self, suffix: &str) -> Codec {
        let suffix = suffix.to_string();
        let description = format!("a string ending with {:?}", suffix);
        self.refine(description, move |v| v.as_str().is_some_and(|s| s.ends_with(&suffix)))
    }

    pub fn includes(self, search: &str) -> Codec {
        let search = search.to_string();
        let description = format!("a string including {:?}", search);
        self.refine(description, move |v| v.as_str().is_some_and(|s| s.contains(&search)))
    }

    /// No leading or trailing whitespace. Validation only — see `trim()`
    /// for the transform.
    pub fn trimmed(self) -> Codec {
        self.refine("a string with no leading or trailing whitespace", |v| {
            v.as_str().is_some_and(|s| s == s.trim())
        })
    }

    // ——— numbers ———

    pub fn greater_than(self, min: f64) -> Codec {
        self.refine(format!("a number greater than {min}"), move |v| {
            v.as_f64().is_some_and(|f| f > min)
        })
    }

    pub fn greater_than_or_equal_to(self, min: f64) -> Codec {
        self.refine(format!("a number greater than or equal to {min}"), move |v| {
            v.as_f64().is_some_and(|f| f >= min)
        })
    }

    pub fn less_than(self, max: f64) -> Codec {
        self.refine(format!("a number less than {max}"), move |v| {
            v.as_f64().is_some_and(|f| f < max)
        })
    }

    pub fn less_than_or_equal_to(self, max: f64) -> Codec {
        self.refine(format!("a number less than or equal to {max}"), move |v| {
            v.as_f64().is_some_and(|f| f <= max)
        })
    }

    pub fn between(self, min: f64, max: f64) -> Codec {
        self.refine(format!("a number between {min} and {max}"), move |v| {
            v.as_f64().is_some_and(|f| f >= min && f <= max)
        })
    }

    pub fn int(self) -> Codec {
        self.refine("integer", |v| v.as_f64().is_some_and(|f| f.fract() == 0.0))
    }

    pub fn positive(self) -> Codec {
        self.greater_than(0.0).describe("a positive number")
    }

    pub fn negative(self) -> Codec {
        self.less_than(0.0).describe("a negative number")
    }

    pub fn non_negative(self) -> Codec {
        self.greater_than_or_equal_to(0.0).describe("a non-negative number")
    }

    pub fn non_positive(self) -> Codec {
        self.less_than_or_equal_to(0.0).describe("a non-positive number")
    }

    pub fn multiple_of(self, divisor: f64) -> Codec {
        self.refine(format!("a number divisible by {divisor}"), move |v| {
            v.as_f64().is_some_and(|f| (f % divisor) == 0.0)
        })
    }

    // ——— arrays ———

    pub fn min_items(self, n: usize) -> Codec {
        self.refine(format!("an array of at least {n} items"), move |v| {
            v.as_array().is_some_and(|a| a.len() >= n)
        })
    }

    pub fn max_items(self, n: usize) -> Codec {
        self.refine(format!("an array of at most {n} items"), move |v| {
            v.as_array().is_some_and(|a| a.len() <= n)
        })
    }

    pub fn items_count(self, n: usize) -> Codec {
        self.refine(format!("an array of exactly {n} items"), move |v| {
            v.as_array().is_some_and(|a| a.len() == n)
        })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// STOCK TRANSFORMS
// ————————————————————————————————————————————————————————————————————————————

/// Parse a string into a number. Rejects non-numeric strings and the
/// special values JSON cannot represent (`NaN`, `Infinity`).
pub fn number_from_string() -> Codec {
    let decode: TransformFn = Arc::new(|value, _options, ast| {
        let Some(s) = value.as_str() else {
            return ParseResult::failure(ParseError::r#type(ast.clone(), value));
        };
        let s = s.trim();
        if s.is_empty() {
            return ParseResult::failure(ParseError::r#type(ast.clone(), value));
        }
        match s.parse::<f64>() {
            Ok(f) if f.is_finite() => ParseResult::success(number_value(f)),
            _ => ParseResult::failure(ParseError::r#type(ast.clone(), value)),
        }
    });
    let encode: TransformFn = Arc::new(|value, _options, ast| match value {
        Value::Number(_) => ParseResult::success(Value::String(render_number(value))),
        _ => ParseResult::failure(ParseError::r#type(ast.clone(), value)),
    });
    transform_result(string(), number(), decode, encode)
}

fn number_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        json!(f as i64)
    } else {
        json!(f)
    }
}

fn render_number(v: &Value) -> String {
    match v.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => format!("{}", f as i64),
        _ => v.to_string(),
    }
}

/// Remove surrounding whitespace on decode; encoding passes through.
pub fn trim() -> Codec {
    transform(
        string(),
        string().trimmed(),
        |v| Value::String(v.as_str().unwrap_or_default().trim().to_string()),
        |v| v.clone(),
    )
}

/// Parse an RFC 3339 date-time string, normalizing to millisecond-precision
/// UTC (`1970-01-01T00:00:00.000Z`-style). Encoding validates and passes
/// the normalized rendering through.
pub fn date_from_string() -> Codec {
    let decode: TransformFn = Arc::new(|value, _options, ast| match parse_date(value) {
        Some(rendered) => ParseResult::success(Value::String(rendered)),
        None => ParseResult::failure(ParseError::r#type(ast.clone(), value)),
    });
    let encode: TransformFn = Arc::new(|value, _options, ast| match parse_date(value) {
        Some(rendered) => ParseResult::success(Value::String(rendered)),
        None => ParseResult::failure(ParseError::r#type(ast.clone(), value)),
    });
    let to = string().refine("a valid date-time string", |v| parse_date(v).is_some());
    transform_result(string(), to, decode, encode)
}

fn parse_date(v: &Value) -> Option<String> {
    let s = v.as_str()?;
    let dt = DateTime::parse_from_rfc3339(s).ok()?;
    Some(dt.to_utc().to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl Codec {
    /// Clamp a number into `[min, max]` on decode; encoding passes through.
    pub fn clamp(self, min: f64, max: f64) -> Codec {
        let to = self.to_side().between(min, max);
        transform(
            self,
            to,
            move |v| match v.as_f64() {
                Some(f) => number_value(f.clamp(min, max)),
                None => v.clone(),
            },
            |v| v.clone(),
        )
    }

    /// Negate a boolean in both directions.
    pub fn negate(self) -> Codec {
        let to = self.to_side();
        let flip = |v: &Value| match v.as_bool() {
            Some(b) => Value::Bool(!b),
            None => v.clone(),
        };
        transform(self, to, flip, flip)
    }
}
