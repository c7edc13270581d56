//! Public façade: a typed handle over an AST with decode/encode entry
//! points in several result shapes.
//!
//! Every derived shape is a thin wrapper over the same base computation, so
//! success/failure behavior is identical across them.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde_json::Value;
use thiserror::Error;

use crate::ast::{self, Ast};
use crate::engine;
use crate::format::format_errors_tree;
use crate::result::{ParseError, ParseOptions, ParseResult};

/// Decode/encode failure surfaced through the `Result`-shaped entry points.
/// Displays as the indented error tree.
#[derive(Clone, Debug, Error)]
#[error("{}", format_errors_tree(.errors))]
pub struct CodecError {
    pub errors: Vec<ParseError>,
}

/// A schema handle. Cheap to clone; projections are computed once.
#[derive(Clone)]
pub struct Codec {
    ast: Arc<Ast>,
    from_cache: OnceCell<Arc<Ast>>,
    to_cache: OnceCell<Arc<Ast>>,
}

impl Codec {
    pub fn make(ast: Ast) -> Codec {
        Codec { ast: Arc::new(ast), from_cache: OnceCell::new(), to_cache: OnceCell::new() }
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// The source-side schema (what `decode` accepts).
    pub fn from_side(&self) -> Codec {
        let ast = self.from_cache.get_or_init(|| Arc::new(ast::from(&self.ast)));
        Codec::make((**ast).clone())
    }

    /// The target-side schema (what `decode` produces).
    pub fn to_side(&self) -> Codec {
        let ast = self.to_ast().clone();
        Codec::make(ast)
    }

    fn to_ast(&self) -> &Ast {
        self.to_cache.get_or_init(|| Arc::new(ast::to(&self.ast)))
    }

    // ---------------- decoding ----------------

    pub fn decode(&self, input: &Value, options: &ParseOptions) -> ParseResult {
        engine::decode(&self.ast, input, options)
    }

    pub fn decode_result(
        &self,
        input: &Value,
        options: &ParseOptions,
    ) -> Result<Value, CodecError> {
        shape(self.decode(input, options))
    }

    pub fn decode_option(&self, input: &Value, options: &ParseOptions) -> Option<Value> {
        self.decode(input, options).ok()
    }

    // ---------------- encoding ----------------

    pub fn encode(&self, value: &Value, options: &ParseOptions) -> ParseResult {
        engine::encode(&self.ast, value, options)
    }

    pub fn encode_result(
        &self,
        value: &Value,
        options: &ParseOptions,
    ) -> Result<Value, CodecError> {
        shape(self.encode(value, options))
    }

    pub fn encode_option(&self, value: &Value, options: &ParseOptions) -> Option<Value> {
        self.encode(value, options).ok()
    }

    // ---------------- parsing / guarding ----------------

    /// Decode fully untyped input. Alias of `decode`: the engine assumes
    /// nothing about its input either way.
    pub fn parse(&self, input: &Value, options: &ParseOptions) -> ParseResult {
        self.decode(input, options)
    }

    /// Does `value` inhabit the target-side schema?
    pub fn is(&self, value: &Value) -> bool {
        engine::decode(self.to_ast(), value, &ParseOptions::DEFAULT).is_success()
    }

    // ---------------- structural combinators ----------------

    /// Restrict a struct schema to the given keys.
    pub fn pick(&self, keys: &[&str]) -> Codec {
        Codec::make(ast::pick(&self.ast, keys))
    }

    /// Drop the given keys from a struct schema.
    pub fn omit(&self, keys: &[&str]) -> Codec {
        Codec::make(ast::omit(&self.ast, keys))
    }

    // ---------------- annotations ----------------

    pub fn identifier(self, s: impl Into<String>) -> Codec {
        Codec::make(self.into_ast().with_identifier(s))
    }

    pub fn describe(self, s: impl Into<String>) -> Codec {
        Codec::make(self.into_ast().with_description(s))
    }

    /// Override the error text produced when this node rejects a value.
    pub fn message(self, f: impl Fn(&Value) -> String + Send + Sync + 'static) -> Codec {
        Codec::make(self.into_ast().with_message(f))
    }

    /// Take the AST out of the handle (cloning only when shared).
    pub(crate) fn into_ast(self) -> Ast {
        Arc::try_unwrap(self.ast).unwrap_or_else(|arc| (*arc).clone())
    }
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec").field("ast", &self.ast).finish()
    }
}

fn shape(result: ParseResult) -> Result<Value, CodecError> {
    match result {
        ParseResult::Success { value, .. } => Ok(value),
        ParseResult::Failure { errors } => Err(CodecError { errors }),
    }
}
