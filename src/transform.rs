//! # Build-Time Resolver Transform
//!
//! Walks one document tree and replaces runtime name lookups with static
//! module bindings.
//!
//! ## Dispatch Rules
//!
//! Only a head that is a plain path, not bound by an enclosing block, not
//! `this`-rooted and a single segment is resolved. Dotted heads are
//! contextual references and need nothing at build time.
//!
//! | Site          | Special keywords                   | Oracle query               |
//! |---------------|------------------------------------|----------------------------|
//! | block         | `component`                        | `resolve_invocation(true)` |
//! | mustache      | `component`, `helper`              | `resolve_invocation(args)` |
//! | sub-expression| `component`, `helper`, `modifier`  | `resolve_call_expression`  |
//! | modifier      | (also skips `@data` heads)         | `resolve_modifier_invocation` |
//! | element       | (tag head must not be in scope)    | `resolve_element`          |
//!
//! ## Failure Policy
//!
//! Oracle errors are collected, never raised mid-walk. A document with any
//! error fails as a whole, once, after the root scope closes, and none of its
//! bindings reach the sink.

use std::collections::HashSet;
use std::sync::Arc;

use crate::codegen::{EmissionSink, ModuleBinding};
use crate::diagnostic::{ResolutionFail, ResolutionFailure};
use crate::ir::{
    BlockNode, ElementModifier, ElementNode, Expression, MustacheNode, PathExpression,
    SourceLocation, SubExpression, Template,
};
use crate::locator::{
    classify, literal_only, Classification, LocatorSource, COMPONENT_KEYWORD, HELPER_KEYWORD,
    MODIFIER_KEYWORD,
};
use crate::resolver::{ComponentResolution, ModuleReference, Provenance, ResolutionResult, Resolver};
use crate::scope::ScopeStack;
use crate::visitor::{
    walk_block, walk_element, walk_modifier, walk_mustache, walk_sub_expression, ScopeOwner,
    TemplateVisitor,
};

pub struct ResolverTransform<R> {
    resolver: R,
}

impl<R: Resolver> ResolverTransform<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Resolve one document. Returns the deduplicated bindings in discovery
    /// order, or every collected failure at once.
    pub fn resolve(
        &self,
        template: &Template,
        file: &str,
        contents: &str,
    ) -> Result<Vec<ModuleBinding>, ResolutionFailure> {
        let mut pass = ResolutionPass::new(&self.resolver, file);
        pass.visit_template(template);
        pass.finish(contents)
    }

    /// Like `resolve`, but hands the bindings to `sink`. Returns how many
    /// were emitted.
    pub fn run<S: EmissionSink + ?Sized>(
        &self,
        template: &Template,
        file: &str,
        contents: &str,
        sink: &mut S,
    ) -> Result<usize, ResolutionFailure> {
        let bindings = self.resolve(template, file, contents)?;
        let count = bindings.len();
        for binding in bindings {
            sink.emit(binding);
        }
        Ok(count)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PER-DOCUMENT PASS
// ═══════════════════════════════════════════════════════════════════════════════

struct ResolutionPass<'a, R: ?Sized> {
    resolver: &'a R,
    file: &'a str,
    scope: ScopeStack,
    /// Runtime names already bound in this document.
    emitted: HashSet<String>,
    bindings: Vec<ModuleBinding>,
    errors: Vec<ResolutionFail>,
}

impl<'a, R: Resolver + ?Sized> ResolutionPass<'a, R> {
    fn new(resolver: &'a R, file: &'a str) -> Self {
        Self {
            resolver,
            file,
            scope: ScopeStack::new(),
            emitted: HashSet::new(),
            bindings: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn finish(self, contents: &str) -> Result<Vec<ModuleBinding>, ResolutionFailure> {
        debug_assert_eq!(self.scope.depth(), 0, "unbalanced scope stack");
        if self.errors.is_empty() {
            tracing::debug!(file = self.file, bindings = self.bindings.len(), "resolved");
            Ok(self.bindings)
        } else {
            tracing::debug!(file = self.file, errors = self.errors.len(), "resolution failed");
            Err(ResolutionFailure::new(self.file, contents, &self.errors))
        }
    }

    fn emit(&mut self, modules: &[ModuleReference]) {
        for module in modules {
            if self.emitted.insert(module.runtime_name.clone()) {
                tracing::debug!(
                    path = module.path.as_str(),
                    runtime_name = module.runtime_name.as_str(),
                    "emit binding"
                );
                self.bindings.push(module.into());
            }
        }
    }

    /// Store errors, emit modules. Hands back component resolutions so the
    /// caller can act on their rules.
    fn record(&mut self, result: Option<ResolutionResult>) -> Option<Arc<ComponentResolution>> {
        match result? {
            ResolutionResult::Error(fail) => {
                self.errors.push(fail);
                None
            }
            ResolutionResult::Helper(helper) => {
                self.emit(&helper.modules);
                None
            }
            ResolutionResult::Component(component) => {
                self.emit(&component.modules);
                Some(component)
            }
        }
    }

    /// The head path, when this site has something to resolve.
    fn resolvable_head<'n>(&self, path: &'n Expression) -> Option<&'n PathExpression> {
        let head = path.as_path()?;
        if head.head().is_some_and(|name| self.scope.in_scope(name)) {
            return None;
        }
        if head.is_this() {
            return None;
        }
        if head.is_multi_segment() {
            return None;
        }
        Some(head)
    }

    fn handle_component_argument(
        &mut self,
        source: LocatorSource<'_>,
        provenance: Option<&Provenance>,
    ) {
        let locator = match classify(source, &mut self.scope) {
            Classification::Resolve(locator) => locator,
            Classification::Deferred | Classification::KnownSafe => return,
        };
        match self.resolver.resolve_component_locator(
            &locator,
            self.file,
            source.location(),
            provenance,
        ) {
            Ok(Some(resolution)) => self.emit(&resolution.modules),
            Ok(None) => {}
            Err(fail) => self.errors.push(fail),
        }
    }

    fn handle_dynamic_helper(&mut self, param: &Expression) {
        if let Some(locator) = literal_only(param) {
            self.resolver
                .resolve_dynamic_helper_locator(&locator, self.file, param.location());
        }
    }

    fn handle_dynamic_modifier(&mut self, param: &Expression) {
        if let Some(locator) = literal_only(param) {
            self.resolver
                .resolve_dynamic_modifier_locator(&locator, self.file, param.location());
        }
    }

    /// Named arguments a component rule marks as components get resolved
    /// like `component` arguments.
    fn resolve_component_arguments<'n>(
        &mut self,
        invoking_name: &str,
        names: &[String],
        lookup: impl Fn(&str) -> Option<LocatorSource<'n>>,
    ) {
        for name in names {
            if let Some(source) = lookup(name) {
                let provenance = Provenance {
                    invoking_name: invoking_name.to_string(),
                    argument_name: name.clone(),
                };
                self.handle_component_argument(source, Some(&provenance));
            }
        }
    }
}

fn site_location(head: &PathExpression, node: SourceLocation) -> SourceLocation {
    if head.location == SourceLocation::default() {
        node
    } else {
        head.location
    }
}

fn argument_attribute<'n>(element: &'n ElementNode, name: &str) -> Option<LocatorSource<'n>> {
    element
        .attributes
        .iter()
        .find(|attr| attr.name.strip_prefix('@') == Some(name))
        .map(|attr| LocatorSource::from(&attr.value))
}

impl<R: Resolver + ?Sized> TemplateVisitor for ResolutionPass<'_, R> {
    fn visit_block(&mut self, block: &BlockNode) {
        if let Some(head) = self.resolvable_head(&block.path) {
            if head.original == COMPONENT_KEYWORD && !block.params.is_empty() {
                self.handle_component_argument((&block.params[0]).into(), None);
            } else {
                // A block is enough to prove this is a component, not content.
                let result = self.resolver.resolve_invocation(
                    &head.original,
                    true,
                    self.file,
                    site_location(head, block.location),
                );
                if let Some(resolution) = self.record(result) {
                    self.scope.enter_component_block(resolution);
                }
            }
        }
        walk_block(self, block);
    }

    fn visit_mustache(&mut self, mustache: &MustacheNode) {
        if let Some(head) = self.resolvable_head(&mustache.path) {
            let first_param = mustache.params.first();
            match (head.original.as_str(), first_param) {
                (COMPONENT_KEYWORD, Some(param)) => {
                    self.handle_component_argument(param.into(), None);
                }
                (HELPER_KEYWORD, Some(param)) => self.handle_dynamic_helper(param),
                _ => {
                    let has_arguments = !mustache.params.is_empty() || !mustache.hash.is_empty();
                    let result = self.resolver.resolve_invocation(
                        &head.original,
                        has_arguments,
                        self.file,
                        site_location(head, mustache.location),
                    );
                    if let Some(resolution) = self.record(result) {
                        self.resolve_component_arguments(
                            &head.original,
                            &resolution.arguments_are_components,
                            |name| mustache.hash.get(name).map(|pair| LocatorSource::from(&pair.value)),
                        );
                    }
                }
            }
        }
        walk_mustache(self, mustache);
    }

    fn visit_sub_expression(&mut self, sub: &SubExpression) {
        if let Some(head) = self.resolvable_head(&sub.path) {
            match (head.original.as_str(), sub.params.first()) {
                (COMPONENT_KEYWORD, Some(param)) => {
                    self.handle_component_argument(param.into(), None);
                }
                (HELPER_KEYWORD, Some(param)) => self.handle_dynamic_helper(param),
                (MODIFIER_KEYWORD, Some(param)) => self.handle_dynamic_modifier(param),
                _ => {
                    let result = self.resolver.resolve_call_expression(
                        &head.original,
                        self.file,
                        site_location(head, sub.location),
                    );
                    self.record(result);
                }
            }
        }
        walk_sub_expression(self, sub);
    }

    fn visit_modifier(&mut self, modifier: &ElementModifier) {
        if let Some(head) = self.resolvable_head(&modifier.path) {
            if !head.is_data() {
                let result = self.resolver.resolve_modifier_invocation(
                    &head.original,
                    self.file,
                    site_location(head, modifier.location),
                );
                self.record(result);
            }
        }
        walk_modifier(self, modifier);
    }

    fn visit_element(&mut self, element: &ElementNode) {
        let tag = element.tag.as_str();
        // Dotted tags are contextual; otherwise the whole tag is its first segment.
        if !tag.contains('.') && !self.scope.in_scope(tag) {
            let result = self
                .resolver
                .resolve_element(tag, self.file, element.location);
            if let Some(resolution) = self.record(result) {
                self.scope.enter_component_block(resolution);
            }
        }
        walk_element(self, element);
    }

    fn enter_scope(&mut self, block_params: &[String]) {
        self.scope.push(block_params);
    }

    fn exit_scope(&mut self, owner: ScopeOwner<'_>) {
        let Some(marker) = self.scope.pop() else {
            return;
        };
        match owner {
            ScopeOwner::BlockProgram(block) => {
                let invoking_name = block
                    .path
                    .as_path()
                    .map(|p| p.original.as_str())
                    .unwrap_or_default();
                self.resolve_component_arguments(
                    invoking_name,
                    marker.arguments_are_components(),
                    |name| block.hash.get(name).map(|pair| LocatorSource::from(&pair.value)),
                );
            }
            ScopeOwner::Element(element) => {
                self.resolve_component_arguments(
                    &element.tag,
                    marker.arguments_are_components(),
                    |name| argument_attribute(element, name),
                );
            }
            ScopeOwner::Template(_) | ScopeOwner::BlockInverse(_) => {
                tracing::error!("component marker closed by a scope it does not annotate");
            }
        }
    }
}
