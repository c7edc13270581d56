//! Schema AST: a closed set of node variants plus an annotation record.
//!
//! Pure data. Constructors validate shape invariants eagerly and panic on
//! violations (these are programmer errors, not input errors). The only
//! behavior beyond construction is a handful of structural queries:
//! `from`/`to` projection, `pick`/`omit`, and the union weight used to order
//! candidates.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use regex::Regex;
use serde_json::Value;

use crate::result::{ParseError, ParseOptions, ParseResult};

// ————————————————————————————————————————————————————————————————————————————
// ANNOTATIONS
// ————————————————————————————————————————————————————————————————————————————

/// Produces the override text for a `Type` error from the offending value.
pub type MessageFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Metadata attached to every node. Opaque to validation except for
/// `message` (error-text override) and `identifier`/`title`/`description`
/// (expected-text rendering).
#[derive(Clone, Default)]
pub struct Annotations {
    pub identifier: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub documentation: Option<String>,
    pub message: Option<MessageFn>,
    pub custom: BTreeMap<String, Value>,
}

impl Annotations {
    /// The text used when rendering this node as an expectation.
    pub fn expected(&self) -> Option<&str> {
        self.identifier
            .as_deref()
            .or(self.title.as_deref())
            .or(self.description.as_deref())
    }
}

impl fmt::Debug for Annotations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Annotations")
            .field("identifier", &self.identifier)
            .field("title", &self.title)
            .field("description", &self.description)
            .field("documentation", &self.documentation)
            .field("message", &self.message.as_ref().map(|_| "<fn>"))
            .field("custom", &self.custom)
            .finish()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// NODES
// ————————————————————————————————————————————————————————————————————————————

/// A schema node: variant + annotations. Immutable once built.
#[derive(Clone, Debug)]
pub struct Ast {
    pub node: Node,
    pub annotations: Annotations,
}

#[derive(Clone, Debug)]
pub enum Node {
    /// A single exact JSON value.
    Literal(Value),
    /// A primitive category.
    Keyword(Keyword),
    /// A string pattern of literal spans and typed holes.
    TemplateLiteral(TemplateLiteral),
    /// A struct: ordered property signatures + index signatures.
    TypeLiteral(TypeLiteral),
    /// Fixed/optional/rest elements, ordered.
    Tuple(Tuple),
    /// Alternatives, ordered by descending structural weight.
    Union(Union),
    /// A value-level predicate layered on a base node.
    Refinement(Refinement),
    /// A bidirectional mapping between a `from` and a `to` node.
    Transform(Transform),
    /// A self-referential node resolved by a memoized thunk.
    Lazy(Lazy),
    /// Externally-defined shape carrying its own decode/encode capability.
    Declaration(Declaration),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Null,
    Boolean,
    /// JSON numbers that are exact integers; an integral float is accepted
    /// with a warning.
    Integer,
    Number,
    String,
    /// Any JSON object or array.
    Object,
    Any,
    Unknown,
    Never,
}

#[derive(Clone, Debug)]
pub struct TemplateLiteral {
    pub head: String,
    pub spans: Vec<TemplateSpan>,
    /// Anchored matcher compiled at construction.
    pub(crate) regex: Regex,
}

#[derive(Clone, Debug)]
pub struct TemplateSpan {
    pub hole: TemplateHole,
    pub literal: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateHole {
    String,
    Number,
}

#[derive(Clone, Debug)]
pub struct TypeLiteral {
    pub property_signatures: Vec<PropertySignature>,
    pub index_signatures: Vec<IndexSignature>,
}

#[derive(Clone, Debug)]
pub struct PropertySignature {
    pub key: String,
    pub ty: Ast,
    pub optional: bool,
}

#[derive(Clone, Debug)]
pub struct IndexSignature {
    /// Key schema: a string keyword, template literal, or refinement thereof.
    pub parameter: Ast,
    pub ty: Ast,
}

#[derive(Clone, Debug)]
pub struct Tuple {
    pub elements: Vec<TupleElement>,
    /// Non-empty when present: first entry is the repeated element type,
    /// the remainder are required post-rest elements.
    pub rest: Option<Vec<Ast>>,
}

#[derive(Clone, Debug)]
pub struct TupleElement {
    pub ty: Ast,
    pub optional: bool,
}

#[derive(Clone, Debug)]
pub struct Union {
    pub types: Vec<Ast>,
}

/// `filter(value, options, self) -> Option<error>`; `None` means pass.
pub type FilterFn = Arc<dyn Fn(&Value, &ParseOptions, &Ast) -> Option<ParseError> + Send + Sync>;

#[derive(Clone)]
pub struct Refinement {
    pub from: Box<Ast>,
    pub filter: FilterFn,
}

impl fmt::Debug for Refinement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refinement").field("from", &self.from).finish_non_exhaustive()
    }
}

/// A user transformation step. Receives the value, the call options, and the
/// owning node (for error attribution).
pub type TransformFn = Arc<dyn Fn(&Value, &ParseOptions, &Ast) -> ParseResult + Send + Sync>;

#[derive(Clone)]
pub struct Transform {
    pub from: Box<Ast>,
    pub to: Box<Ast>,
    pub transformation: Transformation,
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("transformation", &self.transformation)
            .finish()
    }
}

#[derive(Clone)]
pub enum Transformation {
    /// Direct function pair; results are trusted, not revalidated.
    Final { decode: TransformFn, encode: TransformFn },
    /// Per-key structural strategies applied by the struct walker.
    PropertySignatures(Vec<PropertyTransformation>),
    /// Decode through `from` then `to`; encode mirrors.
    Compose,
}

impl fmt::Debug for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transformation::Final { .. } => f.write_str("Final"),
            Transformation::PropertySignatures(ts) => {
                f.debug_tuple("PropertySignatures").field(ts).finish()
            }
            Transformation::Compose => f.write_str("Compose"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PropertyTransformation {
    pub from_key: String,
    /// Differs from `from_key` for renames.
    pub to_key: String,
    pub strategy: KeyStrategy,
}

pub type DefaultFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Closed set of per-key mapping strategies.
#[derive(Clone)]
pub enum KeyStrategy {
    /// Presence and value pass through unchanged.
    Identity,
    /// Absent optional gets `make()` on decode; when `omit_when_default` is
    /// set, encoding drops a value equal to `make()`.
    Default { make: DefaultFn, omit_when_default: bool },
    /// Decode wraps presence in `{"_tag":"Some","value":v}` / `{"_tag":"None"}`
    /// markers; encode unwraps and omits the key for `None`.
    WrapAbsence,
}

impl fmt::Debug for KeyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyStrategy::Identity => f.write_str("Identity"),
            KeyStrategy::Default { omit_when_default, .. } => f
                .debug_struct("Default")
                .field("omit_when_default", omit_when_default)
                .finish_non_exhaustive(),
            KeyStrategy::WrapAbsence => f.write_str("WrapAbsence"),
        }
    }
}

/// Deferred node. The thunk runs at most once per `Lazy` instance; cloning
/// shares the memo cell, so resolution is identity-keyed.
#[derive(Clone)]
pub struct Lazy {
    inner: Arc<LazyInner>,
}

struct LazyInner {
    f: Box<dyn Fn() -> Ast + Send + Sync>,
    cell: OnceCell<Ast>,
}

impl Lazy {
    pub fn new(f: impl Fn() -> Ast + Send + Sync + 'static) -> Lazy {
        Lazy { inner: Arc::new(LazyInner { f: Box::new(f), cell: OnceCell::new() }) }
    }

    /// Resolve the thunk, memoizing the result.
    pub fn resolve(&self) -> &Ast {
        self.inner.cell.get_or_init(|| (self.inner.f)())
    }
}

impl fmt::Debug for Lazy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("resolved", &self.inner.cell.get().is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct Declaration {
    pub id: String,
    pub decode: TransformFn,
    pub encode: TransformFn,
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declaration").field("id", &self.id).finish_non_exhaustive()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

impl Ast {
    fn new(node: Node) -> Ast {
        Ast { node, annotations: Annotations::default() }
    }

    pub fn literal(value: Value) -> Ast {
        Ast::new(Node::Literal(value))
    }

    pub fn keyword(keyword: Keyword) -> Ast {
        Ast::new(Node::Keyword(keyword))
    }

    /// Build a template-literal node and compile its matcher. `spans` pair a
    /// typed hole with the literal text that follows it.
    pub fn template_literal(head: impl Into<String>, spans: Vec<TemplateSpan>) -> Ast {
        let head = head.into();
        let mut pattern = format!("^{}", regex::escape(&head));
        for span in &spans {
            match span.hole {
                TemplateHole::String => pattern.push_str(".*"),
                // numeric-literal grammar: sign, digits, optional fraction/exponent
                TemplateHole::Number => {
                    pattern.push_str(r"[+-]?\d*\.?\d+(?:[Ee][+-]?\d+)?")
                }
            }
            pattern.push_str(&regex::escape(&span.literal));
        }
        pattern.push('$');
        let regex = Regex::new(&pattern)
            .unwrap_or_else(|e| panic!("templateLiteral: failed to compile matcher: {e}"));
        Ast::new(Node::TemplateLiteral(TemplateLiteral { head, spans, regex }))
    }

    /// Panics on duplicate property keys.
    pub fn type_literal(
        property_signatures: Vec<PropertySignature>,
        index_signatures: Vec<IndexSignature>,
    ) -> Ast {
        let mut seen = std::collections::BTreeSet::new();
        for ps in &property_signatures {
            if !seen.insert(ps.key.as_str()) {
                panic!("typeLiteral: duplicate property signature {:?}", ps.key);
            }
        }
        Ast::new(Node::TypeLiteral(TypeLiteral { property_signatures, index_signatures }))
    }

    /// Panics on a required element after an optional one, or an empty rest.
    pub fn tuple(elements: Vec<TupleElement>, rest: Option<Vec<Ast>>) -> Ast {
        let mut saw_optional = false;
        for el in &elements {
            if el.optional {
                saw_optional = true;
            } else if saw_optional {
                panic!("tuple: a required element cannot follow an optional element");
            }
        }
        if let Some(rest) = &rest {
            if rest.is_empty() {
                panic!("tuple: a rest span must contain at least the repeated element");
            }
        }
        Ast::new(Node::Tuple(Tuple { elements, rest }))
    }

    /// Flattens nested unions, drops `Never` members, and stably sorts the
    /// rest by descending structural weight so more-specific alternatives
    /// are attempted first. Zero members behave as `Never`; one member is
    /// returned unchanged.
    pub fn union(members: Vec<Ast>) -> Ast {
        let mut flat = Vec::with_capacity(members.len());
        for m in members {
            match m.node {
                Node::Union(u) => flat.extend(u.types),
                Node::Keyword(Keyword::Never) => {}
                _ => flat.push(m),
            }
        }
        match flat.len() {
            0 => Ast::keyword(Keyword::Never),
            1 => flat.remove(0),
            _ => {
                flat.sort_by_key(|m| std::cmp::Reverse(m.weight()));
                Ast::new(Node::Union(Union { types: flat }))
            }
        }
    }

    pub fn refinement(from: Ast, filter: FilterFn) -> Ast {
        Ast::new(Node::Refinement(Refinement { from: Box::new(from), filter }))
    }

    pub fn transform(from: Ast, to: Ast, transformation: Transformation) -> Ast {
        Ast::new(Node::Transform(Transform {
            from: Box::new(from),
            to: Box::new(to),
            transformation,
        }))
    }

    pub fn lazy(f: impl Fn() -> Ast + Send + Sync + 'static) -> Ast {
        Ast::new(Node::Lazy(Lazy::new(f)))
    }

    pub fn declaration(id: impl Into<String>, decode: TransformFn, encode: TransformFn) -> Ast {
        Ast::new(Node::Declaration(Declaration { id: id.into(), decode, encode }))
    }

    // ——— annotation helpers ———

    pub fn with_identifier(mut self, s: impl Into<String>) -> Ast {
        self.annotations.identifier = Some(s.into());
        self
    }

    pub fn with_title(mut self, s: impl Into<String>) -> Ast {
        self.annotations.title = Some(s.into());
        self
    }

    pub fn with_description(mut self, s: impl Into<String>) -> Ast {
        self.annotations.description = Some(s.into());
        self
    }

    pub fn with_message(mut self, f: impl Fn(&Value) -> String + Send + Sync + 'static) -> Ast {
        self.annotations.message = Some(Arc::new(f));
        self
    }

    // ——— structural queries ———

    /// Candidate-ordering weight: property/element count, looking through
    /// refinements and transforms; lazy nodes are heaviest so recursive
    /// members are attempted before bare primitives.
    pub(crate) fn weight(&self) -> usize {
        match &self.node {
            Node::TypeLiteral(t) => t.property_signatures.len() + t.index_signatures.len(),
            Node::Tuple(t) => {
                t.elements.len() + t.rest.as_ref().map(|r| r.len()).unwrap_or(0)
            }
            Node::Union(u) => u.types.iter().map(Ast::weight).max().unwrap_or(0),
            Node::Refinement(r) => r.from.weight(),
            Node::Transform(t) => t.from.weight(),
            Node::Lazy(_) => 10,
            _ => 0,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PROJECTIONS
// ————————————————————————————————————————————————————————————————————————————

/// Project to the source-side node: every Transform is replaced by its
/// `from` child, and refinements are stripped (a refinement narrows the
/// decoded side; its source side is the base's).
pub fn from(ast: &Ast) -> Ast {
    match &ast.node {
        Node::Transform(t) => from(&t.from),
        Node::Refinement(r) => from(&r.from),
        _ => map_children(ast, from),
    }
}

/// Project to the target-side node: every Transform is replaced by its `to`
/// child; refinements stay in place over the projected base.
pub fn to(ast: &Ast) -> Ast {
    match &ast.node {
        Node::Transform(t) => to(&t.to),
        Node::Refinement(r) => Ast {
            node: Node::Refinement(Refinement {
                from: Box::new(to(&r.from)),
                filter: r.filter.clone(),
            }),
            annotations: ast.annotations.clone(),
        },
        _ => map_children(ast, to),
    }
}

/// Rebuild `ast` with `f` applied to every child node. Leaves (literals,
/// keywords, templates, declarations) are cloned unchanged.
fn map_children(ast: &Ast, f: fn(&Ast) -> Ast) -> Ast {
    let node = match &ast.node {
        Node::TypeLiteral(t) => Node::TypeLiteral(TypeLiteral {
            property_signatures: t
                .property_signatures
                .iter()
                .map(|ps| PropertySignature { key: ps.key.clone(), ty: f(&ps.ty), optional: ps.optional })
                .collect(),
            index_signatures: t
                .index_signatures
                .iter()
                .map(|is| IndexSignature { parameter: f(&is.parameter), ty: f(&is.ty) })
                .collect(),
        }),
        Node::Tuple(t) => Node::Tuple(Tuple {
            elements: t
                .elements
                .iter()
                .map(|el| TupleElement { ty: f(&el.ty), optional: el.optional })
                .collect(),
            rest: t.rest.as_ref().map(|r| r.iter().map(f).collect()),
        }),
        Node::Union(u) => Node::Union(Union { types: u.types.iter().map(f).collect() }),
        Node::Lazy(l) => {
            let l = l.clone();
            Node::Lazy(Lazy::new(move || f(l.resolve())))
        }
        other => other.clone(),
    };
    Ast { node, annotations: ast.annotations.clone() }
}

/// Restrict a struct (or a struct transform) to the given keys.
pub fn pick(ast: &Ast, keys: &[&str]) -> Ast {
    restrict(ast, &|key| keys.contains(&key))
}

/// Restrict a struct (or a struct transform) to everything but the given keys.
pub fn omit(ast: &Ast, keys: &[&str]) -> Ast {
    restrict(ast, &|key| !keys.contains(&key))
}

fn restrict(ast: &Ast, keep: &dyn Fn(&str) -> bool) -> Ast {
    match &ast.node {
        Node::TypeLiteral(t) => Ast::type_literal(
            t.property_signatures.iter().filter(|ps| keep(&ps.key)).cloned().collect(),
            Vec::new(),
        ),
        Node::Transform(t) => match &t.transformation {
            Transformation::PropertySignatures(pts) => {
                let kept: Vec<PropertyTransformation> =
                    pts.iter().filter(|pt| keep(&pt.to_key)).cloned().collect();
                if kept.is_empty() {
                    restrict(&t.from, keep)
                } else {
                    Ast::transform(
                        restrict(&t.from, keep),
                        restrict(&t.to, keep),
                        Transformation::PropertySignatures(kept),
                    )
                }
            }
            _ => panic!("pick/omit: cannot handle this kind of transformation"),
        },
        _ => panic!("pick/omit: only type literals can be restricted"),
    }
}
