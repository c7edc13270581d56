//! Union walker: tag narrowing + ordered candidate attempts.
//!
//! Members carrying required literal-valued signatures are bucketed by tag
//! so the engine only attempts (and only reports errors for) plausible
//! candidates. Members are already weight-sorted at construction; the first
//! successful candidate wins.

use indexmap::IndexMap;
use serde_json::Value;

use crate::ast::{Ast, Node, Union};
use crate::engine::{Dir, unknown_object};
use crate::result::{ParseError, ParseOptions, ParseResult};

#[derive(Default)]
struct KeyBucket {
    /// Rendered literal → member indices.
    buckets: IndexMap<String, Vec<usize>>,
    /// Declared literals in first-seen order, for the mismatch error.
    literals: Vec<Value>,
}

#[derive(Default)]
struct SearchTree {
    keys: IndexMap<String, KeyBucket>,
    otherwise: Vec<usize>,
}

pub(crate) fn run(u: &Union, input: &Value, options: &ParseOptions, dir: Dir) -> ParseResult {
    let tree = build_search_tree(&u.types, dir);

    let mut errors: Vec<ParseError> = Vec::new();
    let mut candidates: Vec<usize> = Vec::new();

    if tree.keys.is_empty() {
        candidates.extend(0..u.types.len());
    } else if let Some(obj) = input.as_object() {
        for (key, bucket) in &tree.keys {
            match obj.get(key) {
                None => errors.push(ParseError::key(key.as_str(), vec![ParseError::Missing])),
                Some(v) => match bucket.buckets.get(&render_tag(v)) {
                    Some(members) => candidates.extend(members.iter().copied()),
                    None => {
                        let expected = Ast::union(
                            bucket.literals.iter().cloned().map(Ast::literal).collect(),
                        );
                        errors.push(ParseError::key(key.as_str(), vec![ParseError::r#type(expected, v)]));
                    }
                },
            }
        }
        candidates.extend(tree.otherwise.iter().copied());
    } else {
        // tagged members need an object; untagged ones still get a chance
        candidates.extend(tree.otherwise.iter().copied());
        if candidates.is_empty() {
            return ParseResult::failure(ParseError::r#type(unknown_object(), input));
        }
    }

    for idx in candidates {
        match super::run(&u.types[idx], input, options, dir) {
            success @ ParseResult::Success { .. } => return success,
            ParseResult::Failure { errors: es } => {
                errors.push(ParseError::union_member(es));
            }
        }
    }

    ParseResult::failures(errors)
}

/// Index each tagged member under its first non-conflicting tag key; a
/// member whose every tag collides joins the colliding bucket. Untagged
/// members fall into `otherwise`.
fn build_search_tree(members: &[Ast], dir: Dir) -> SearchTree {
    let mut tree = SearchTree::default();
    for (idx, member) in members.iter().enumerate() {
        let tags = literal_tags(member, dir);
        if tags.is_empty() {
            tree.otherwise.push(idx);
            continue;
        }
        let last = tags.len() - 1;
        for (j, (key, value)) in tags.iter().enumerate() {
            let rendered = render_tag(value);
            let entry = tree.keys.entry(key.clone()).or_default();
            match entry.buckets.get_mut(&rendered) {
                Some(bucket) => {
                    if j < last {
                        continue;
                    }
                    bucket.push(idx);
                }
                None => {
                    entry.buckets.insert(rendered, vec![idx]);
                    entry.literals.push(value.clone());
                }
            }
            break;
        }
    }
    tree
}

/// Required literal-valued signatures of a member, looking through lazy,
/// refinement, and the direction-relevant side of a transform.
fn literal_tags(ast: &Ast, dir: Dir) -> Vec<(String, Value)> {
    match &ast.node {
        Node::TypeLiteral(tl) => tl
            .property_signatures
            .iter()
            .filter(|ps| !ps.optional)
            .filter_map(|ps| match &ps.ty.node {
                Node::Literal(v) => Some((ps.key.clone(), v.clone())),
                _ => None,
            })
            .collect(),
        Node::Lazy(l) => literal_tags(l.resolve(), dir),
        Node::Refinement(r) => literal_tags(&r.from, dir),
        Node::Transform(t) => match dir {
            Dir::Decode => literal_tags(&t.from, dir),
            Dir::Encode => literal_tags(&t.to, dir),
        },
        _ => Vec::new(),
    }
}

/// Bucket key for a tag value: bare string content, integral-normalized
/// numbers, `true`/`false`, `null`. Distinct from display rendering — tags
/// compare like JS `String(v)`.
fn render_tag(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
