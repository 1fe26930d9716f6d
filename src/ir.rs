//! Document tree handed to the resolver.
//!
//! The tree arrives already parsed (usually as JSON from the host), so every
//! type here is plain data with serde derives. Node enums are tagged by
//! `type`, fields are camelCase.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// LOCATIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATEMENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Root of one parsed document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default)]
    pub block_params: Vec<String>,
    #[serde(default)]
    pub children: Vec<TemplateNode>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TemplateNode {
    Block(BlockNode),
    Mustache(MustacheNode),
    Element(ElementNode),
    Text(TextNode),
    Comment(CommentNode),
}

/// `{{#head params hash as |block params|}} ... {{else}} ... {{/head}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockNode {
    pub path: Expression,
    #[serde(default)]
    pub params: Vec<Expression>,
    #[serde(default)]
    pub hash: Hash,
    pub program: Body,
    #[serde(default)]
    pub inverse: Option<Body>,
    #[serde(default)]
    pub location: SourceLocation,
}

/// Child sequence owned by a block, with the names it binds.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[serde(default)]
    pub block_params: Vec<String>,
    #[serde(default)]
    pub children: Vec<TemplateNode>,
    #[serde(default)]
    pub location: SourceLocation,
}

/// `{{head params hash}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MustacheNode {
    pub path: Expression,
    #[serde(default)]
    pub params: Vec<Expression>,
    #[serde(default)]
    pub hash: Hash,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    pub tag: String,
    #[serde(default)]
    pub attributes: Vec<AttrNode>,
    #[serde(default)]
    pub modifiers: Vec<ElementModifier>,
    #[serde(default)]
    pub block_params: Vec<String>,
    #[serde(default)]
    pub children: Vec<TemplateNode>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    pub value: String,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub value: String,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttrNode {
    pub name: String,
    pub value: AttrValue,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AttrValue {
    Text(TextNode),
    Mustache(MustacheNode),
    Concat(ConcatNode),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcatNode {
    pub parts: Vec<ConcatPart>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ConcatPart {
    Text(TextNode),
    Mustache(MustacheNode),
}

/// `<div {{head params hash}}>`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementModifier {
    pub path: Expression,
    #[serde(default)]
    pub params: Vec<Expression>,
    #[serde(default)]
    pub hash: Hash,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Hash {
    #[serde(default)]
    pub pairs: Vec<HashPair>,
}

impl Hash {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&HashPair> {
        self.pairs.iter().find(|pair| pair.key == key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashPair {
    pub key: String,
    pub value: Expression,
    #[serde(default)]
    pub location: SourceLocation,
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPRESSIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Expression {
    Path(PathExpression),
    SubExpression(SubExpression),
    StringLiteral(StringLiteral),
    NumberLiteral(NumberLiteral),
    BooleanLiteral(BooleanLiteral),
    NullLiteral(EmptyLiteral),
    UndefinedLiteral(EmptyLiteral),
}

impl Expression {
    pub fn location(&self) -> SourceLocation {
        match self {
            Expression::Path(p) => p.location,
            Expression::SubExpression(s) => s.location,
            Expression::StringLiteral(s) => s.location,
            Expression::NumberLiteral(n) => n.location,
            Expression::BooleanLiteral(b) => b.location,
            Expression::NullLiteral(e) | Expression::UndefinedLiteral(e) => e.location,
        }
    }

    pub fn as_path(&self) -> Option<&PathExpression> {
        match self {
            Expression::Path(p) => Some(p),
            _ => None,
        }
    }

    pub fn path(original: &str) -> Self {
        Expression::Path(PathExpression::new(original))
    }

    pub fn string(value: &str) -> Self {
        Expression::StringLiteral(StringLiteral {
            value: value.to_string(),
            location: SourceLocation::default(),
        })
    }

    pub fn number(value: f64) -> Self {
        Expression::NumberLiteral(NumberLiteral {
            value,
            location: SourceLocation::default(),
        })
    }

    pub fn sub(head: &str, params: Vec<Expression>) -> Self {
        Expression::SubExpression(SubExpression {
            path: Expression::path(head).into(),
            params,
            hash: Hash::default(),
            location: SourceLocation::default(),
        })
    }
}

/// A dotted reference. `this.` and `@` prefixes are kept in `original`;
/// `parts()` strips them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PathExpression {
    pub original: String,
    #[serde(default)]
    pub location: SourceLocation,
}

impl PathExpression {
    pub fn new(original: &str) -> Self {
        Self {
            original: original.to_string(),
            location: SourceLocation::default(),
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.location = SourceLocation::new(line, column);
        self
    }

    /// True for `this` and `this.*`.
    pub fn is_this(&self) -> bool {
        self.original == "this" || self.original.starts_with("this.")
    }

    /// True for frame-local data references (`@name`).
    pub fn is_data(&self) -> bool {
        self.original.starts_with('@')
    }

    pub fn parts(&self) -> Vec<&str> {
        let rest = if self.original == "this" {
            ""
        } else if let Some(rest) = self.original.strip_prefix("this.") {
            rest
        } else if let Some(rest) = self.original.strip_prefix('@') {
            rest
        } else {
            self.original.as_str()
        };
        if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('.').collect()
        }
    }

    pub fn head(&self) -> Option<&str> {
        self.parts().first().copied()
    }

    pub fn is_multi_segment(&self) -> bool {
        self.parts().len() > 1
    }
}

/// `(head params hash)`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubExpression {
    pub path: Box<Expression>,
    #[serde(default)]
    pub params: Vec<Expression>,
    #[serde(default)]
    pub hash: Hash,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringLiteral {
    pub value: String,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberLiteral {
    pub value: f64,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanLiteral {
    pub value: bool,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EmptyLiteral {
    #[serde(default)]
    pub location: SourceLocation,
}

// ═══════════════════════════════════════════════════════════════════════════════
// BUILDERS
// ═══════════════════════════════════════════════════════════════════════════════

impl Template {
    pub fn new(children: Vec<TemplateNode>) -> Self {
        Self {
            children,
            ..Default::default()
        }
    }
}

impl MustacheNode {
    pub fn new(head: &str) -> Self {
        Self {
            path: Expression::path(head),
            params: Vec::new(),
            hash: Hash::default(),
            location: SourceLocation::default(),
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.location = SourceLocation::new(line, column);
        if let Expression::Path(p) = &mut self.path {
            p.location = self.location;
        }
        self
    }

    pub fn with_param(mut self, param: Expression) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_pair(mut self, key: &str, value: Expression) -> Self {
        self.hash.pairs.push(HashPair {
            key: key.to_string(),
            value,
            location: self.location,
        });
        self
    }
}

impl From<MustacheNode> for TemplateNode {
    fn from(node: MustacheNode) -> Self {
        TemplateNode::Mustache(node)
    }
}

impl BlockNode {
    pub fn new(head: &str, block_params: &[&str], children: Vec<TemplateNode>) -> Self {
        Self {
            path: Expression::path(head),
            params: Vec::new(),
            hash: Hash::default(),
            program: Body {
                block_params: block_params.iter().map(|p| p.to_string()).collect(),
                children,
                location: SourceLocation::default(),
            },
            inverse: None,
            location: SourceLocation::default(),
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.location = SourceLocation::new(line, column);
        if let Expression::Path(p) = &mut self.path {
            p.location = self.location;
        }
        self
    }

    pub fn with_param(mut self, param: Expression) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_pair(mut self, key: &str, value: Expression) -> Self {
        self.hash.pairs.push(HashPair {
            key: key.to_string(),
            value,
            location: self.location,
        });
        self
    }

    pub fn with_inverse(mut self, block_params: &[&str], children: Vec<TemplateNode>) -> Self {
        self.inverse = Some(Body {
            block_params: block_params.iter().map(|p| p.to_string()).collect(),
            children,
            location: self.location,
        });
        self
    }
}

impl From<BlockNode> for TemplateNode {
    fn from(node: BlockNode) -> Self {
        TemplateNode::Block(node)
    }
}

impl ElementNode {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: Vec::new(),
            modifiers: Vec::new(),
            block_params: Vec::new(),
            children: Vec::new(),
            location: SourceLocation::default(),
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.location = SourceLocation::new(line, column);
        self
    }

    pub fn with_attr(mut self, name: &str, value: AttrValue) -> Self {
        self.attributes.push(AttrNode {
            name: name.to_string(),
            value,
            location: self.location,
        });
        self
    }

    pub fn with_modifier(mut self, head: &str, params: Vec<Expression>) -> Self {
        self.modifiers.push(ElementModifier {
            path: Expression::path(head),
            params,
            hash: Hash::default(),
            location: self.location,
        });
        self
    }

    pub fn with_block_params(mut self, names: &[&str]) -> Self {
        self.block_params = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_children(mut self, children: Vec<TemplateNode>) -> Self {
        self.children = children;
        self
    }
}

impl From<ElementNode> for TemplateNode {
    fn from(node: ElementNode) -> Self {
        TemplateNode::Element(node)
    }
}

impl AttrValue {
    pub fn text(value: &str) -> Self {
        AttrValue::Text(TextNode {
            value: value.to_string(),
            location: SourceLocation::default(),
        })
    }

    pub fn mustache(node: MustacheNode) -> Self {
        AttrValue::Mustache(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_path_parts_strip_prefixes() {
        assert_eq!(PathExpression::new("foo.bar").parts(), vec!["foo", "bar"]);
        assert_eq!(PathExpression::new("this.foo").parts(), vec!["foo"]);
        assert_eq!(PathExpression::new("@icon").parts(), vec!["icon"]);
        assert!(PathExpression::new("this").parts().is_empty());
        assert!(PathExpression::new("this").is_this());
        assert!(!PathExpression::new("thisThing").is_this());
        assert!(PathExpression::new("@icon").is_data());
    }

    #[test]
    fn test_template_from_json() {
        let json = serde_json::json!({
            "children": [
                {
                    "type": "block",
                    "path": { "type": "path", "original": "my-list" },
                    "program": { "blockParams": ["item"], "children": [] },
                    "location": { "line": 3, "column": 1 }
                },
                {
                    "type": "element",
                    "tag": "MyButton",
                    "attributes": [
                        { "name": "@label", "value": { "type": "text", "value": "hi" } }
                    ]
                }
            ]
        });
        let template: Template = serde_json::from_value(json).unwrap();
        assert_eq!(template.children.len(), 2);
        match &template.children[0] {
            TemplateNode::Block(block) => {
                assert_eq!(block.program.block_params, vec!["item".to_string()]);
                assert_eq!(block.location, SourceLocation::new(3, 1));
                assert!(block.hash.is_empty());
            }
            other => panic!("expected block, got {:?}", other),
        }
    }
}
