//! Error-tree rendering. Boundary-only: the engine never formats.
//!
//! Two deterministic renderings of the same error list:
//! - flat: `/a is missing, /b Expected number, actual "b"`
//! - tree: indented with `├─`/`└─` connectors, one node per error.

use serde_json::Value;

use crate::ast::{Ast, Keyword, Node, TemplateHole};
use crate::result::ParseError;

/// Comma-joined single-line rendering.
pub fn format_errors(errors: &[ParseError]) -> String {
    errors.iter().map(format_error).collect::<Vec<_>>().join(", ")
}

fn format_error(e: &ParseError) -> String {
    match e {
        ParseError::Type { expected, actual, message } => type_message(expected, actual, message),
        ParseError::Missing => "is missing".to_string(),
        ParseError::Unexpected => "is unexpected".to_string(),
        ParseError::Forbidden => "is forbidden".to_string(),
        ParseError::Index { index, errors } => format!("/{index} {}", format_errors(errors)),
        ParseError::Key { key, errors } => format!("/{key} {}", format_errors(errors)),
        ParseError::UnionMember { errors } => {
            format!("union member: {}", format_errors(errors))
        }
    }
}

/// Message for a `Type` error: annotation override, then the error's own
/// message, then the default `Expected X, actual Y` text.
fn type_message(expected: &Ast, actual: &Value, message: &Option<String>) -> String {
    if let Some(f) = &expected.annotations.message {
        return f(actual);
    }
    if let Some(m) = message {
        return m.clone();
    }
    format!("Expected {}, actual {}", format_expected(expected), format_actual(actual))
}

/// Compact JSON rendering of the offending value.
pub fn format_actual(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

/// Human rendering of an expected node. An `identifier`/`title`/`description`
/// annotation wins over the structural rendering.
pub fn format_expected(ast: &Ast) -> String {
    if let Some(s) = ast.annotations.expected() {
        return s.to_string();
    }
    match &ast.node {
        Node::Literal(v) => format_actual(v),
        Node::Keyword(k) => keyword_name(*k).to_string(),
        Node::TemplateLiteral(t) => {
            let mut out = t.head.clone();
            for span in &t.spans {
                out.push_str(match span.hole {
                    TemplateHole::String => "${string}",
                    TemplateHole::Number => "${number}",
                });
                out.push_str(&span.literal);
            }
            out
        }
        Node::Union(u) => {
            u.types.iter().map(format_expected).collect::<Vec<_>>().join(" or ")
        }
        Node::Refinement(r) => format_expected(&r.from),
        Node::Transform(t) => {
            format!("{} -> {}", format_expected(&t.from), format_expected(&t.to))
        }
        Node::TypeLiteral(_) => "<anonymous type literal schema>".to_string(),
        Node::Tuple(_) => "<anonymous tuple schema>".to_string(),
        Node::Lazy(_) => "<anonymous lazy schema>".to_string(),
        Node::Declaration(d) => d.id.clone(),
    }
}

fn keyword_name(k: Keyword) -> &'static str {
    match k {
        Keyword::Null => "null",
        Keyword::Boolean => "boolean",
        Keyword::Integer => "integer",
        Keyword::Number => "number",
        Keyword::String => "string",
        Keyword::Object => "object",
        Keyword::Any => "any",
        Keyword::Unknown => "unknown",
        Keyword::Never => "never",
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TREE RENDERING
// ————————————————————————————————————————————————————————————————————————————

struct Tree {
    value: String,
    forest: Vec<Tree>,
}

impl Tree {
    fn leaf(value: String) -> Tree {
        Tree { value, forest: Vec::new() }
    }
}

/// Indented-tree rendering, rooted at `error(s) found`.
pub fn format_errors_tree(errors: &[ParseError]) -> String {
    let forest: Vec<Tree> = errors.iter().map(to_tree).collect();
    format!("error(s) found{}", draw("", &forest))
}

fn to_tree(e: &ParseError) -> Tree {
    match e {
        ParseError::Type { expected, actual, message } => {
            Tree::leaf(type_message(expected, actual, message))
        }
        ParseError::Missing => Tree::leaf("is missing".to_string()),
        ParseError::Unexpected => Tree::leaf("is unexpected".to_string()),
        ParseError::Forbidden => Tree::leaf("is forbidden".to_string()),
        ParseError::Index { index, errors } => Tree {
            value: format!("index {index}"),
            forest: errors.iter().map(to_tree).collect(),
        },
        ParseError::Key { key, errors } => Tree {
            value: format!("key {key}"),
            forest: errors.iter().map(to_tree).collect(),
        },
        ParseError::UnionMember { errors } => Tree {
            value: "union member".to_string(),
            forest: errors.iter().map(to_tree).collect(),
        },
    }
}

fn draw(indentation: &str, forest: &[Tree]) -> String {
    let mut out = String::new();
    for (i, tree) in forest.iter().enumerate() {
        let last = i == forest.len() - 1;
        out.push('\n');
        out.push_str(indentation);
        out.push_str(if last { "└─ " } else { "├─ " });
        out.push_str(&tree.value);
        let nested = format!("{indentation}{}", if last { "   " } else { "│  " });
        out.push_str(&draw(&nested, &tree.forest));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_joins_with_paths() {
        let errors = vec![
            ParseError::index(0, vec![ParseError::Missing]),
            ParseError::index(1, vec![ParseError::Missing]),
        ];
        assert_eq!(format_errors(&errors), "/0 is missing, /1 is missing");
    }

    #[test]
    fn tree_draws_union_members() {
        let errors = vec![
            ParseError::union_member(vec![ParseError::r#type(
                Ast::literal(json!(1)),
                &json!(null),
            )]),
            ParseError::union_member(vec![ParseError::r#type(
                Ast::literal(json!("a")),
                &json!(null),
            )]),
        ];
        let expected = [
            "error(s) found",
            "├─ union member",
            "│  └─ Expected 1, actual null",
            "└─ union member",
            "   └─ Expected \"a\", actual null",
        ]
        .join("\n");
        assert_eq!(format_errors_tree(&errors), expected);
    }

    #[test]
    fn message_annotation_overrides_default_text() {
        let expected = Ast::keyword(Keyword::String).with_message(|_| "not a string".to_string());
        let e = ParseError::r#type(expected, &json!(null));
        assert_eq!(format_errors(&[e]), "not a string");
    }

    #[test]
    fn transform_renders_as_arrow() {
        use crate::ast::Transformation;
        let t = Ast::transform(
            Ast::keyword(Keyword::String),
            Ast::keyword(Keyword::Number),
            Transformation::Compose,
        );
        assert_eq!(format_expected(&t), "string -> number");
    }
}
