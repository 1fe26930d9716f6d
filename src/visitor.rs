use crate::ir::{
    AttrNode, AttrValue, BlockNode, Body, ConcatPart, ElementModifier, ElementNode, Expression,
    Hash, MustacheNode, SubExpression, Template, TemplateNode,
};

/// Which node a scope frame belongs to, handed to `exit_scope`.
#[derive(Debug, Clone, Copy)]
pub enum ScopeOwner<'a> {
    Template(&'a Template),
    BlockProgram(&'a BlockNode),
    BlockInverse(&'a BlockNode),
    Element(&'a ElementNode),
}

/// The TemplateVisitor trait defines the single authoritative traversal mechanism for document trees.
///
/// Rules:
/// 1. Traversal order is necessary and fixed.
/// 2. Implementers override `visit_*` methods to add behavior.
/// 3. Implementers MUST call `walk_*` functions to continue traversal unless pruning is intended.
/// 4. Every `enter_scope` is matched by exactly one `exit_scope`, and a body's
///    children are visited strictly between the two.
pub trait TemplateVisitor {
    fn visit_template(&mut self, template: &Template) {
        walk_template(self, template);
    }

    fn visit_node(&mut self, node: &TemplateNode) {
        walk_node(self, node);
    }

    fn visit_block(&mut self, block: &BlockNode) {
        walk_block(self, block);
    }

    fn visit_mustache(&mut self, mustache: &MustacheNode) {
        walk_mustache(self, mustache);
    }

    fn visit_element(&mut self, element: &ElementNode) {
        walk_element(self, element);
    }

    fn visit_attribute(&mut self, attribute: &AttrNode) {
        walk_attribute(self, attribute);
    }

    fn visit_modifier(&mut self, modifier: &ElementModifier) {
        walk_modifier(self, modifier);
    }

    fn visit_expression(&mut self, expression: &Expression) {
        walk_expression(self, expression);
    }

    fn visit_sub_expression(&mut self, sub: &SubExpression) {
        walk_sub_expression(self, sub);
    }

    fn enter_scope(&mut self, _block_params: &[String]) {}

    fn exit_scope(&mut self, _owner: ScopeOwner<'_>) {}
}

pub fn walk_template<V: TemplateVisitor + ?Sized>(visitor: &mut V, template: &Template) {
    visitor.enter_scope(&template.block_params);
    walk_children(visitor, &template.children);
    visitor.exit_scope(ScopeOwner::Template(template));
}

pub fn walk_children<V: TemplateVisitor + ?Sized>(visitor: &mut V, children: &[TemplateNode]) {
    for node in children {
        visitor.visit_node(node);
    }
}

pub fn walk_node<V: TemplateVisitor + ?Sized>(visitor: &mut V, node: &TemplateNode) {
    match node {
        TemplateNode::Block(b) => visitor.visit_block(b),
        TemplateNode::Mustache(m) => visitor.visit_mustache(m),
        TemplateNode::Element(e) => visitor.visit_element(e),
        TemplateNode::Text(_) | TemplateNode::Comment(_) => {}
    }
}

fn walk_call<V: TemplateVisitor + ?Sized>(
    visitor: &mut V,
    path: &Expression,
    params: &[Expression],
    hash: &Hash,
) {
    visitor.visit_expression(path);
    for param in params {
        visitor.visit_expression(param);
    }
    for pair in &hash.pairs {
        visitor.visit_expression(&pair.value);
    }
}

fn walk_body<V: TemplateVisitor + ?Sized>(visitor: &mut V, body: &Body, owner: ScopeOwner<'_>) {
    visitor.enter_scope(&body.block_params);
    walk_children(visitor, &body.children);
    visitor.exit_scope(owner);
}

pub fn walk_block<V: TemplateVisitor + ?Sized>(visitor: &mut V, block: &BlockNode) {
    walk_call(visitor, &block.path, &block.params, &block.hash);
    walk_body(visitor, &block.program, ScopeOwner::BlockProgram(block));
    if let Some(inverse) = &block.inverse {
        walk_body(visitor, inverse, ScopeOwner::BlockInverse(block));
    }
}

pub fn walk_mustache<V: TemplateVisitor + ?Sized>(visitor: &mut V, mustache: &MustacheNode) {
    walk_call(visitor, &mustache.path, &mustache.params, &mustache.hash);
}

pub fn walk_element<V: TemplateVisitor + ?Sized>(visitor: &mut V, element: &ElementNode) {
    visitor.enter_scope(&element.block_params);
    for attribute in &element.attributes {
        visitor.visit_attribute(attribute);
    }
    for modifier in &element.modifiers {
        visitor.visit_modifier(modifier);
    }
    walk_children(visitor, &element.children);
    visitor.exit_scope(ScopeOwner::Element(element));
}

pub fn walk_attribute<V: TemplateVisitor + ?Sized>(visitor: &mut V, attribute: &AttrNode) {
    match &attribute.value {
        AttrValue::Text(_) => {}
        AttrValue::Mustache(m) => visitor.visit_mustache(m),
        AttrValue::Concat(concat) => {
            for part in &concat.parts {
                if let ConcatPart::Mustache(m) = part {
                    visitor.visit_mustache(m);
                }
            }
        }
    }
}

pub fn walk_modifier<V: TemplateVisitor + ?Sized>(visitor: &mut V, modifier: &ElementModifier) {
    walk_call(visitor, &modifier.path, &modifier.params, &modifier.hash);
}

pub fn walk_expression<V: TemplateVisitor + ?Sized>(visitor: &mut V, expression: &Expression) {
    if let Expression::SubExpression(sub) = expression {
        visitor.visit_sub_expression(sub);
    }
}

pub fn walk_sub_expression<V: TemplateVisitor + ?Sized>(visitor: &mut V, sub: &SubExpression) {
    walk_call(visitor, &sub.path, &sub.params, &sub.hash);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BlockNode, ElementNode, Expression, MustacheNode, Template};
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct EventLog {
        events: Vec<String>,
    }

    impl TemplateVisitor for EventLog {
        fn visit_mustache(&mut self, mustache: &MustacheNode) {
            if let Some(p) = mustache.path.as_path() {
                self.events.push(format!("mustache {}", p.original));
            }
            walk_mustache(self, mustache);
        }

        fn visit_sub_expression(&mut self, sub: &SubExpression) {
            if let Some(p) = sub.path.as_path() {
                self.events.push(format!("sub {}", p.original));
            }
            walk_sub_expression(self, sub);
        }

        fn enter_scope(&mut self, block_params: &[String]) {
            self.events.push(format!("enter {}", block_params.join(",")));
        }

        fn exit_scope(&mut self, owner: ScopeOwner<'_>) {
            let label = match owner {
                ScopeOwner::Template(_) => "template",
                ScopeOwner::BlockProgram(_) => "program",
                ScopeOwner::BlockInverse(_) => "inverse",
                ScopeOwner::Element(_) => "element",
            };
            self.events.push(format!("exit {}", label));
        }
    }

    #[test]
    fn test_scopes_bracket_children_in_order() {
        let template = Template::new(vec![
            BlockNode::new(
                "each",
                &["item"],
                vec![ElementNode::new("li")
                    .with_attr(
                        "class",
                        crate::ir::AttrValue::mustache(MustacheNode::new("item.kind")),
                    )
                    .into()],
            )
            .with_param(Expression::sub("sort", vec![Expression::path("this.items")]))
            .with_inverse(&[], vec![MustacheNode::new("empty").into()])
            .into(),
        ]);

        let mut log = EventLog::default();
        log.visit_template(&template);

        assert_eq!(
            log.events,
            vec![
                "enter ",
                "sub sort",
                "enter item",
                "enter ",
                "mustache item.kind",
                "exit element",
                "exit program",
                "enter ",
                "mustache empty",
                "exit inverse",
                "exit template",
            ]
        );
    }
}
