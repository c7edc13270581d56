//! Parse outcome algebra: options, errors, warnings, results.
//!
//! Every decode/encode step returns a `ParseResult`. Failures carry a
//! non-empty, ordered list of `ParseError` nodes whose tree mirrors the
//! input's shape (`Key`/`Index`/`UnionMember` wrap nested error sets).
//! Successes may carry warnings; warnings never escalate into failures.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ast::Ast;

// ————————————————————————————————————————————————————————————————————————————
// OPTIONS
// ————————————————————————————————————————————————————————————————————————————

/// Error-accumulation policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Errors {
    /// Stop at the first error (fast path).
    #[default]
    First,
    /// Accumulate one error per failing key/index at every level.
    All,
}

/// What to do with input object keys the schema does not declare.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExcessProperty {
    /// Silently drop excess keys from the decoded output.
    #[default]
    Ignore,
    /// Raise `Unexpected` at each excess key.
    Error,
}

/// Per-call configuration, recognized by every level of the recursion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParseOptions {
    pub errors: Errors,
    pub on_excess_property: ExcessProperty,
}

impl ParseOptions {
    pub const DEFAULT: ParseOptions = ParseOptions {
        errors: Errors::First,
        on_excess_property: ExcessProperty::Ignore,
    };

    pub fn all_errors() -> ParseOptions {
        ParseOptions { errors: Errors::All, ..Default::default() }
    }

    pub fn on_excess_property_error() -> ParseOptions {
        ParseOptions { on_excess_property: ExcessProperty::Error, ..Default::default() }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ERRORS
// ————————————————————————————————————————————————————————————————————————————

/// One node of the error tree.
#[derive(Clone, Debug)]
pub enum ParseError {
    /// The value did not match the expected node.
    Type {
        expected: Ast,
        actual: Value,
        /// Overrides the default `Expected X, actual Y` text when present.
        message: Option<String>,
    },
    /// A required key/element is absent.
    Missing,
    /// A key/element is present but not declared (strict mode).
    Unexpected,
    /// Structurally valid but forbidden by policy.
    Forbidden,
    /// Nested tuple-position error.
    Index { index: usize, errors: Vec<ParseError> },
    /// Nested struct-field error.
    Key { key: String, errors: Vec<ParseError> },
    /// Per-alternative error of a failed union candidate.
    UnionMember { errors: Vec<ParseError> },
}

impl ParseError {
    pub fn r#type(expected: Ast, actual: &Value) -> ParseError {
        ParseError::Type { expected, actual: actual.clone(), message: None }
    }

    pub fn type_with_message(expected: Ast, actual: &Value, message: impl Into<String>) -> ParseError {
        ParseError::Type { expected, actual: actual.clone(), message: Some(message.into()) }
    }

    pub fn index(index: usize, errors: Vec<ParseError>) -> ParseError {
        ParseError::Index { index, errors }
    }

    pub fn key(key: impl Into<String>, errors: Vec<ParseError>) -> ParseError {
        ParseError::Key { key: key.into(), errors }
    }

    pub fn union_member(errors: Vec<ParseError>) -> ParseError {
        ParseError::UnionMember { errors }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// WARNINGS
// ————————————————————————————————————————————————————————————————————————————

/// Path step inside the input value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Non-fatal note attached to a successful result (e.g. an integral float
/// accepted where an integer was expected).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl Warning {
    pub fn new(message: impl Into<String>) -> Warning {
        Warning { path: Vec::new(), message: message.into() }
    }
}

/// Prefix every warning's path with `segment` while unwinding one level.
pub(crate) fn prefix_warnings(mut warnings: Vec<Warning>, segment: PathSegment) -> Vec<Warning> {
    for w in &mut warnings {
        w.path.insert(0, segment.clone());
    }
    warnings
}

// ————————————————————————————————————————————————————————————————————————————
// RESULT
// ————————————————————————————————————————————————————————————————————————————

/// Outcome of one decode/encode attempt.
#[derive(Clone, Debug)]
pub enum ParseResult {
    Success { value: Value, warnings: Vec<Warning> },
    /// Invariant: `errors` is non-empty.
    Failure { errors: Vec<ParseError> },
}

impl ParseResult {
    pub fn success(value: Value) -> ParseResult {
        ParseResult::Success { value, warnings: Vec::new() }
    }

    pub fn success_with_warnings(value: Value, warnings: Vec<Warning>) -> ParseResult {
        ParseResult::Success { value, warnings }
    }

    pub fn failure(error: ParseError) -> ParseResult {
        ParseResult::Failure { errors: vec![error] }
    }

    pub fn failures(errors: Vec<ParseError>) -> ParseResult {
        debug_assert!(!errors.is_empty(), "a failure must carry at least one error");
        ParseResult::Failure { errors }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ParseResult::Success { .. })
    }

    pub fn ok(self) -> Option<Value> {
        match self {
            ParseResult::Success { value, .. } => Some(value),
            ParseResult::Failure { .. } => None,
        }
    }

    pub fn into_result(self) -> Result<Value, Vec<ParseError>> {
        match self {
            ParseResult::Success { value, .. } => Ok(value),
            ParseResult::Failure { errors } => Err(errors),
        }
    }

    pub fn map(self, f: impl FnOnce(Value) -> Value) -> ParseResult {
        match self {
            ParseResult::Success { value, warnings } => {
                ParseResult::Success { value: f(value), warnings }
            }
            failure => failure,
        }
    }

    /// Sequence another step, merging the warnings of both.
    pub fn and_then(self, f: impl FnOnce(Value) -> ParseResult) -> ParseResult {
        match self {
            ParseResult::Success { value, mut warnings } => match f(value) {
                ParseResult::Success { value, warnings: more } => {
                    warnings.extend(more);
                    ParseResult::Success { value, warnings }
                }
                failure => failure,
            },
            failure => failure,
        }
    }

    pub fn map_err(self, f: impl FnOnce(Vec<ParseError>) -> Vec<ParseError>) -> ParseResult {
        match self {
            ParseResult::Failure { errors } => ParseResult::Failure { errors: f(errors) },
            success => success,
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        match self {
            ParseResult::Success { warnings, .. } => warnings,
            ParseResult::Failure { .. } => &[],
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ACCUMULATION
// ————————————————————————————————————————————————————————————————————————————

/// Error sink threading the `errors: first | all` policy through a walker.
///
/// `push` returns `true` when the walker must stop immediately (first-error
/// mode); in all-errors mode it keeps collecting.
pub(crate) struct ErrorSink {
    all: bool,
    errors: Vec<ParseError>,
}

impl ErrorSink {
    pub(crate) fn new(options: &ParseOptions) -> ErrorSink {
        ErrorSink { all: options.errors == Errors::All, errors: Vec::new() }
    }

    #[must_use]
    pub(crate) fn push(&mut self, error: ParseError) -> bool {
        self.errors.push(error);
        !self.all
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn into_failure(self) -> ParseResult {
        ParseResult::failures(self.errors)
    }
}
