//! Reduces the argument of a dynamic `component` invocation to something the
//! oracle can look up.

use serde::{Deserialize, Serialize};

use crate::ir::{AttrValue, Expression, MustacheNode, SourceLocation};
use crate::scope::ScopeStack;

pub const COMPONENT_KEYWORD: &str = "component";
pub const HELPER_KEYWORD: &str = "helper";
pub const MODIFIER_KEYWORD: &str = "modifier";
pub const ENSURE_SAFE_COMPONENT: &str = "ensure-safe-component";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ComponentLocator {
    Literal { path: String },
    LexicalPath { path: String },
    Opaque,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Ask the oracle.
    Resolve(ComponentLocator),
    /// An inner `component` invocation handles itself, or the value went
    /// through `ensure-safe-component`.
    Deferred,
    /// A value some enclosing component is known to yield as a component.
    KnownSafe,
}

/// Anything that can appear as a dynamic component argument: a positional or
/// named argument expression, or the value of an `@argument` attribute.
#[derive(Debug, Clone, Copy)]
pub enum LocatorSource<'a> {
    Expression(&'a Expression),
    Attribute(&'a AttrValue),
}

impl<'a> From<&'a Expression> for LocatorSource<'a> {
    fn from(expr: &'a Expression) -> Self {
        LocatorSource::Expression(expr)
    }
}

impl<'a> From<&'a AttrValue> for LocatorSource<'a> {
    fn from(value: &'a AttrValue) -> Self {
        LocatorSource::Attribute(value)
    }
}

impl LocatorSource<'_> {
    pub fn location(&self) -> SourceLocation {
        match self {
            LocatorSource::Expression(expr) => expr.location(),
            LocatorSource::Attribute(AttrValue::Text(t)) => t.location,
            LocatorSource::Attribute(AttrValue::Mustache(m)) => m.location,
            LocatorSource::Attribute(AttrValue::Concat(c)) => c.location,
        }
    }
}

pub fn classify(source: LocatorSource<'_>, scope: &mut ScopeStack) -> Classification {
    let classification = match source {
        LocatorSource::Expression(expr) => classify_expression(expr),
        LocatorSource::Attribute(AttrValue::Text(text)) => {
            Classification::Resolve(ComponentLocator::Literal {
                path: text.value.clone(),
            })
        }
        LocatorSource::Attribute(AttrValue::Mustache(mustache)) => classify_mustache(mustache),
        LocatorSource::Attribute(AttrValue::Concat(_)) => {
            Classification::Resolve(ComponentLocator::Opaque)
        }
    };

    // Literals are never scope-checked.
    if let Classification::Resolve(ComponentLocator::LexicalPath { path }) = &classification {
        if scope.safe_component_in_scope(path) {
            tracing::debug!(path = path.as_str(), "known-safe component reference");
            return Classification::KnownSafe;
        }
    }
    classification
}

fn classify_expression(expr: &Expression) -> Classification {
    match expr {
        Expression::StringLiteral(s) => Classification::Resolve(ComponentLocator::Literal {
            path: s.value.clone(),
        }),
        Expression::Path(p) => Classification::Resolve(ComponentLocator::LexicalPath {
            path: p.original.clone(),
        }),
        Expression::SubExpression(sub) => match sub.path.as_path() {
            Some(head)
                if head.original == COMPONENT_KEYWORD
                    || head.original == ENSURE_SAFE_COMPONENT =>
            {
                Classification::Deferred
            }
            _ => Classification::Resolve(ComponentLocator::Opaque),
        },
        _ => Classification::Resolve(ComponentLocator::Opaque),
    }
}

fn classify_mustache(mustache: &MustacheNode) -> Classification {
    if mustache.params.is_empty() && mustache.hash.is_empty() {
        return classify_expression(&mustache.path);
    }
    match mustache.path.as_path() {
        Some(head)
            if head.original == COMPONENT_KEYWORD || head.original == ENSURE_SAFE_COMPONENT =>
        {
            Classification::Deferred
        }
        _ => Classification::Resolve(ComponentLocator::Opaque),
    }
}

/// Dynamic `helper` / `modifier` arguments: only string literals are looked
/// up. Anything else is already a bound reference.
pub fn literal_only(expr: &Expression) -> Option<ComponentLocator> {
    match expr {
        Expression::StringLiteral(s) => Some(ComponentLocator::Literal {
            path: s.value.clone(),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ConcatNode, ConcatPart, TextNode};
    use crate::resolver::{ComponentResolution, YieldedComponent};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn literal(path: &str) -> Classification {
        Classification::Resolve(ComponentLocator::Literal {
            path: path.to_string(),
        })
    }

    fn lexical(path: &str) -> Classification {
        Classification::Resolve(ComponentLocator::LexicalPath {
            path: path.to_string(),
        })
    }

    #[test]
    fn test_literal_and_path_arguments() {
        let mut scope = ScopeStack::new();
        let string = Expression::string("my-button");
        let path = Expression::path("this.button");

        assert_eq!(classify((&string).into(), &mut scope), literal("my-button"));
        assert_eq!(classify((&path).into(), &mut scope), lexical("this.button"));
    }

    #[test]
    fn test_attribute_values() {
        let mut scope = ScopeStack::new();
        let text = AttrValue::text("my-icon");
        let bare = AttrValue::mustache(MustacheNode::new("this.icon"));
        let called = AttrValue::mustache(
            MustacheNode::new("component").with_param(Expression::string("x")),
        );
        let other_call =
            AttrValue::mustache(MustacheNode::new("pick").with_param(Expression::string("x")));
        let concat = AttrValue::Concat(ConcatNode {
            parts: vec![ConcatPart::Text(TextNode {
                value: "a".to_string(),
                location: SourceLocation::default(),
            })],
            location: SourceLocation::default(),
        });

        assert_eq!(classify((&text).into(), &mut scope), literal("my-icon"));
        assert_eq!(classify((&bare).into(), &mut scope), lexical("this.icon"));
        assert_eq!(classify((&called).into(), &mut scope), Classification::Deferred);
        assert_eq!(
            classify((&other_call).into(), &mut scope),
            Classification::Resolve(ComponentLocator::Opaque)
        );
        assert_eq!(
            classify((&concat).into(), &mut scope),
            Classification::Resolve(ComponentLocator::Opaque)
        );
    }

    #[test]
    fn test_nested_component_and_escape_are_deferred() {
        let mut scope = ScopeStack::new();
        let inner = Expression::sub("component", vec![Expression::string("x")]);
        let trusted = Expression::sub(ENSURE_SAFE_COMPONENT, vec![Expression::path("this.x")]);
        let other = Expression::sub("concat", vec![Expression::string("x")]);

        assert_eq!(classify((&inner).into(), &mut scope), Classification::Deferred);
        assert_eq!(classify((&trusted).into(), &mut scope), Classification::Deferred);
        assert_eq!(
            classify((&other).into(), &mut scope),
            Classification::Resolve(ComponentLocator::Opaque)
        );
    }

    #[test]
    fn test_yielded_component_is_known_safe() {
        let mut scope = ScopeStack::new();
        scope.enter_component_block(Arc::new(ComponentResolution {
            yields_components: vec![YieldedComponent::Flag(true)],
            ..Default::default()
        }));
        scope.push(&["bar".to_string()]);

        let path = Expression::path("bar");
        let literal_bar = Expression::string("bar");
        assert_eq!(classify((&path).into(), &mut scope), Classification::KnownSafe);
        assert_eq!(classify((&literal_bar).into(), &mut scope), literal("bar"));
    }

    #[test]
    fn test_literal_only_rule() {
        assert_eq!(
            literal_only(&Expression::string("t")),
            Some(ComponentLocator::Literal {
                path: "t".to_string()
            })
        );
        assert_eq!(literal_only(&Expression::path("this.t")), None);
        assert_eq!(literal_only(&Expression::number(1.0)), None);
    }
}
