//! Lexical scope tracking for one document pass.
//!
//! ## Frame Pairing
//!
//! A `ComponentBlock` marker is always pushed immediately before the
//! `BlockParams` frame of the body it annotates, and both leave the stack
//! together in `pop`. Safe-component lookups rely on that adjacency: a
//! block-params frame directly above a marker binds the names the marked
//! component yields.

use std::sync::Arc;

use crate::resolver::ComponentResolution;

#[derive(Debug, Clone)]
pub struct ComponentBlockMarker {
    resolution: Arc<ComponentResolution>,
    arguments_are_components: Vec<String>,
}

impl ComponentBlockMarker {
    fn new(resolution: Arc<ComponentResolution>) -> Self {
        let arguments_are_components = resolution.arguments_are_components.clone();
        Self {
            resolution,
            arguments_are_components,
        }
    }

    pub fn resolution(&self) -> &ComponentResolution {
        &self.resolution
    }

    /// Seeded from the resolution, grown by propagation while the body is open.
    pub fn arguments_are_components(&self) -> &[String] {
        &self.arguments_are_components
    }

    fn record_argument(&mut self, name: &str) {
        if !self.arguments_are_components.iter().any(|a| a == name) {
            tracing::debug!(argument = name, "argument propagated as component");
            self.arguments_are_components.push(name.to_string());
        }
    }
}

#[derive(Debug, Clone)]
pub enum ScopeFrame {
    BlockParams(Vec<String>),
    ComponentBlock(ComponentBlockMarker),
}

/// Frames are stored bottom-first; the top of the stack is the last element.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<ScopeFrame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push(&mut self, block_params: &[String]) {
        tracing::trace!(params = ?block_params, depth = self.frames.len(), "push scope");
        self.frames.push(ScopeFrame::BlockParams(block_params.to_vec()));
    }

    /// Remove the top frame. When a component marker sat directly below it,
    /// the marker leaves too and is handed back, finalized, so the caller can
    /// act on its `arguments_are_components`.
    pub fn pop(&mut self) -> Option<ComponentBlockMarker> {
        let Some(top) = self.frames.pop() else {
            debug_assert!(false, "pop on empty scope stack");
            tracing::error!("pop on empty scope stack");
            return None;
        };
        if let ScopeFrame::ComponentBlock(_) = top {
            tracing::error!("popped a component marker without its block params");
        }
        tracing::trace!(depth = self.frames.len(), "pop scope");

        if let Some(ScopeFrame::ComponentBlock(_)) = self.frames.last() {
            if let Some(ScopeFrame::ComponentBlock(marker)) = self.frames.pop() {
                return Some(marker);
            }
        }
        None
    }

    pub fn in_scope(&self, name: &str) -> bool {
        self.frames.iter().rev().any(|frame| match frame {
            ScopeFrame::BlockParams(params) => params.iter().any(|p| p == name),
            ScopeFrame::ComponentBlock(_) => false,
        })
    }

    /// Must be called right before the body's `push`.
    pub fn enter_component_block(&mut self, resolution: Arc<ComponentResolution>) {
        self.frames
            .push(ScopeFrame::ComponentBlock(ComponentBlockMarker::new(resolution)));
    }

    /// Whether `path` names a value some enclosing component is known to
    /// yield as a component. Yielded arguments get recorded on the marker so
    /// the invocation's own named argument is resolved when the body closes.
    pub fn safe_component_in_scope(&mut self, path: &str) -> bool {
        let parts: Vec<&str> = path.split('.').collect();
        if parts.len() > 2 {
            // Rules describe yielded components or objects of components,
            // nothing deeper.
            return false;
        }

        for i in (1..self.frames.len()).rev() {
            let (below, above) = self.frames.split_at_mut(i);
            let (ScopeFrame::BlockParams(params), ScopeFrame::ComponentBlock(marker)) =
                (&above[0], &mut below[i - 1])
            else {
                continue;
            };
            let Some(index) = params.iter().position(|p| p == parts[0]) else {
                continue;
            };

            if parts.len() == 1 {
                if marker.resolution.yields_component_at(index) {
                    return true;
                }
                if let Some(argument) = marker.resolution.yielded_argument_at(index) {
                    let argument = argument.to_string();
                    marker.record_argument(&argument);
                    return true;
                }
            } else {
                if marker.resolution.yields_component_field(index, parts[1]) {
                    return true;
                }
                if let Some(argument) = marker.resolution.yielded_argument_field(index, parts[1]) {
                    let argument = argument.to_string();
                    marker.record_argument(&argument);
                    return true;
                }
            }
            // This frame is where the name comes from and no rule covers it.
            // Frames further out bind different values.
            return false;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{YieldedArgument, YieldedComponent};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    fn yielding(components: Vec<YieldedComponent>) -> Arc<ComponentResolution> {
        Arc::new(ComponentResolution {
            yields_components: components,
            ..Default::default()
        })
    }

    #[test]
    fn test_in_scope_follows_push_and_pop() {
        let mut scope = ScopeStack::new();
        scope.push(&names(&[]));
        scope.push(&names(&["item", "index"]));
        assert!(scope.in_scope("item"));
        scope.push(&names(&["other"]));
        assert!(scope.in_scope("item"));
        assert!(scope.in_scope("other"));
        assert!(scope.pop().is_none());
        assert!(!scope.in_scope("other"));
        assert!(scope.in_scope("index"));
        scope.pop();
        assert!(!scope.in_scope("item"));
        assert_eq!(scope.depth(), 1);
    }

    #[test]
    fn test_markers_are_transparent_to_in_scope() {
        let mut scope = ScopeStack::new();
        scope.enter_component_block(yielding(vec![YieldedComponent::Flag(true)]));
        assert!(!scope.in_scope("bar"));
        scope.push(&names(&["bar"]));
        assert!(scope.in_scope("bar"));
    }

    #[test]
    fn test_pop_returns_paired_marker() {
        let mut scope = ScopeStack::new();
        scope.push(&names(&[]));
        scope.enter_component_block(Arc::new(ComponentResolution {
            arguments_are_components: names(&["trigger"]),
            ..Default::default()
        }));
        scope.push(&names(&["bar"]));

        let marker = scope.pop().expect("marker should be finalized with its frame");
        assert_eq!(marker.arguments_are_components(), &names(&["trigger"])[..]);
        assert_eq!(scope.depth(), 1);
    }

    #[test]
    fn test_yielded_component_is_safe() {
        let mut scope = ScopeStack::new();
        scope.enter_component_block(yielding(vec![YieldedComponent::Flag(true)]));
        scope.push(&names(&["bar"]));
        assert!(scope.safe_component_in_scope("bar"));
        assert!(!scope.safe_component_in_scope("baz"));
    }

    #[test]
    fn test_more_than_two_segments_never_safe() {
        let mut fields = HashMap::new();
        fields.insert("b".to_string(), true);
        let mut scope = ScopeStack::new();
        scope.enter_component_block(yielding(vec![YieldedComponent::Fields(fields)]));
        scope.push(&names(&["a"]));
        assert!(scope.safe_component_in_scope("a.b"));
        assert!(!scope.safe_component_in_scope("a.b.c"));
    }

    #[test]
    fn test_yielded_argument_field_propagates() {
        let mut fields = HashMap::new();
        fields.insert("icon".to_string(), "iconName".to_string());
        let mut scope = ScopeStack::new();
        scope.enter_component_block(Arc::new(ComponentResolution {
            yields_arguments: vec![Some(YieldedArgument::Fields(fields))],
            ..Default::default()
        }));
        scope.push(&names(&["obj"]));

        assert!(scope.safe_component_in_scope("obj.icon"));
        assert!(scope.safe_component_in_scope("obj.icon"));
        assert!(!scope.safe_component_in_scope("obj.title"));

        let marker = scope.pop().unwrap();
        assert_eq!(marker.arguments_are_components(), &names(&["iconName"])[..]);
    }

    #[test]
    fn test_identified_source_without_rule_stops_search() {
        let mut scope = ScopeStack::new();
        // Outer component yields `bar` as a component.
        scope.enter_component_block(yielding(vec![YieldedComponent::Flag(true)]));
        scope.push(&names(&["bar"]));
        // Inner component also binds `bar`, with no rule for it.
        scope.enter_component_block(yielding(vec![YieldedComponent::Flag(false)]));
        scope.push(&names(&["bar"]));

        assert!(!scope.safe_component_in_scope("bar"));
        scope.pop();
        assert!(scope.safe_component_in_scope("bar"));
    }

    #[test]
    fn test_unmarked_frames_are_skipped() {
        let mut scope = ScopeStack::new();
        scope.enter_component_block(yielding(vec![YieldedComponent::Flag(true)]));
        scope.push(&names(&["bar"]));
        // A plain block nested inside, not binding `bar`.
        scope.push(&names(&["item"]));
        assert!(scope.safe_component_in_scope("bar"));
        assert!(!scope.safe_component_in_scope("item"));
    }
}
