//! Bidirectional schema codec over `serde_json::Value`.
//!
//! A schema is an immutable AST (structs, tuples, unions, refinements,
//! bidirectional transforms, lazy/recursive nodes). The engine walks an AST
//! against an input value and either produces the decoded/encoded value or a
//! path-tagged error tree.
//!
//! Design goals:
//! - Decode and encode share one structural recursion; only Transform and
//!   Refinement nodes are direction-sensitive.
//! - Validation failures are data, never panics; panics are reserved for
//!   schema construction bugs (required-after-optional, bad template spans).
//! - Error accumulation policy (`first` vs `all`) and excess-key policy are
//!   threaded uniformly through every level of the walk.
//! - Recursive schemas resolve through identity-memoized thunks; resolution
//!   is idempotent and never unfolds eagerly.

pub mod ast;
pub mod codec;
pub mod engine;
pub mod format;
pub mod result;
pub mod schema;

pub use codec::{Codec, CodecError};
pub use result::{Errors, ExcessProperty, ParseError, ParseOptions, ParseResult, Warning};
