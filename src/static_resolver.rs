//! Table-driven resolver.
//!
//! Answers every oracle query from a `ResolverConfig`. Names the runtime
//! provides itself (template keywords, built-in modifiers) never resolve.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::config::ResolverConfig;
use crate::diagnostic::{FailureKind, ResolutionFail};
use crate::ir::SourceLocation;
use crate::locator::ComponentLocator;
use crate::resolver::{
    ComponentResolution, HelperResolution, ModuleReference, Provenance, ResolutionResult, Resolver,
};

lazy_static! {
    pub static ref BUILTIN_KEYWORDS: HashSet<&'static str> = {
        let mut s = HashSet::new();
        // Control flow
        s.insert("if");
        s.insert("unless");
        s.insert("each");
        s.insert("each-in");
        s.insert("let");
        s.insert("with");
        s.insert("yield");
        s.insert("outlet");
        s.insert("in-element");
        s.insert("-in-element");
        s.insert("debugger");
        s.insert("has-block");
        s.insert("has-block-params");
        s.insert("hasBlock");
        s.insert("hasBlockParams");

        // Built-in helpers
        s.insert("action");
        s.insert("array");
        s.insert("concat");
        s.insert("fn");
        s.insert("get");
        s.insert("hash");
        s.insert("log");
        s.insert("mut");
        s.insert("readonly");
        s.insert("unbound");
        s.insert("unique-id");
        s.insert("query-params");
        s.insert("mount");
        s.insert("input");
        s.insert("textarea");
        s.insert("link-to");

        // Dynamic keywords, handled by the transform itself
        s.insert("component");
        s.insert("helper");
        s.insert("modifier");
        s.insert("ensure-safe-component");
        s
    };

    pub static ref BUILTIN_MODIFIERS: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("action");
        s.insert("on");
        s
    };

    static ref CASE_BOUNDARY: Regex = Regex::new(r"([a-z\d])([A-Z])").unwrap();
}

/// `FooBar::BazQux` -> `foo-bar/baz-qux`
pub fn dasherize_tag(tag: &str) -> String {
    tag.split("::")
        .map(|segment| CASE_BOUNDARY.replace_all(segment, "$1-$2").to_lowercase())
        .collect::<Vec<_>>()
        .join("/")
}

/// Angle-bracket tags name components only when they start uppercase;
/// everything else is HTML or a custom element.
fn is_component_tag(tag: &str) -> bool {
    tag.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DynamicKind {
    Helper,
    Modifier,
}

/// A literal seen as the argument of a dynamic `helper` / `modifier`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicReference {
    pub kind: DynamicKind,
    pub name: String,
    pub file: String,
    pub location: SourceLocation,
    pub module: Option<ModuleReference>,
}

#[derive(Debug, Default)]
pub struct StaticResolver {
    config: ResolverConfig,
    components: HashMap<String, Arc<ComponentResolution>>,
    dynamic: Mutex<Vec<DynamicReference>>,
}

impl StaticResolver {
    pub fn new(config: ResolverConfig) -> Self {
        let components = config
            .components
            .iter()
            .map(|(name, resolution)| (name.clone(), Arc::new(resolution.clone())))
            .collect();
        Self {
            config,
            components,
            dynamic: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Everything registered through dynamic `helper` / `modifier` literals.
    pub fn dynamic_references(&self) -> Vec<DynamicReference> {
        self.dynamic
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn component(&self, name: &str) -> Option<Arc<ComponentResolution>> {
        self.components.get(name).cloned()
    }

    fn helper(&self, name: &str) -> Option<ResolutionResult> {
        self.config.helpers.get(name).map(|module| {
            ResolutionResult::Helper(HelperResolution {
                modules: vec![module.clone()],
            })
        })
    }

    fn record_dynamic(
        &self,
        kind: DynamicKind,
        locator: &ComponentLocator,
        file: &str,
        location: SourceLocation,
    ) {
        let ComponentLocator::Literal { path } = locator else {
            return;
        };
        let table = match kind {
            DynamicKind::Helper => &self.config.helpers,
            DynamicKind::Modifier => &self.config.modifiers,
        };
        tracing::debug!(name = path.as_str(), kind = ?kind, "dynamic reference");
        let reference = DynamicReference {
            kind,
            name: path.clone(),
            file: file.to_string(),
            location,
            module: table.get(path).cloned(),
        };
        self.dynamic
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(reference);
    }
}

fn missing(message: String, location: SourceLocation) -> ResolutionResult {
    ResolutionResult::Error(ResolutionFail::new(
        FailureKind::UnresolvableReference,
        message,
        location,
    ))
}

fn with_provenance(fail: ResolutionFail, provenance: Option<&Provenance>) -> ResolutionFail {
    match provenance {
        Some(p) => fail.with_detail(format!(
            "passed as the `{}` argument of `{}`",
            p.argument_name, p.invoking_name
        )),
        None => fail,
    }
}

impl Resolver for StaticResolver {
    fn resolve_invocation(
        &self,
        name: &str,
        has_arguments: bool,
        _file: &str,
        location: SourceLocation,
    ) -> Option<ResolutionResult> {
        if BUILTIN_KEYWORDS.contains(name) {
            return None;
        }
        if let Some(helper) = self.helper(name) {
            return Some(helper);
        }
        if let Some(component) = self.component(name) {
            return Some(ResolutionResult::Component(component));
        }
        // Without arguments this may just be a property read.
        if has_arguments && self.config.static_components && self.config.static_helpers {
            return Some(missing(
                format!("Missing component or helper: {}", name),
                location,
            ));
        }
        None
    }

    fn resolve_call_expression(
        &self,
        name: &str,
        _file: &str,
        location: SourceLocation,
    ) -> Option<ResolutionResult> {
        if BUILTIN_KEYWORDS.contains(name) {
            return None;
        }
        if let Some(helper) = self.helper(name) {
            return Some(helper);
        }
        if self.config.static_helpers {
            return Some(missing(format!("Missing helper: {}", name), location));
        }
        None
    }

    fn resolve_modifier_invocation(
        &self,
        name: &str,
        _file: &str,
        location: SourceLocation,
    ) -> Option<ResolutionResult> {
        if BUILTIN_MODIFIERS.contains(name) {
            return None;
        }
        if let Some(module) = self.config.modifiers.get(name) {
            return Some(ResolutionResult::Helper(HelperResolution {
                modules: vec![module.clone()],
            }));
        }
        if self.config.static_modifiers {
            return Some(missing(format!("Missing modifier: {}", name), location));
        }
        None
    }

    fn resolve_element(
        &self,
        tag: &str,
        _file: &str,
        location: SourceLocation,
    ) -> Option<ResolutionResult> {
        if !is_component_tag(tag) {
            return None;
        }
        let name = dasherize_tag(tag);
        if let Some(component) = self.component(&name) {
            return Some(ResolutionResult::Component(component));
        }
        if self.config.static_components {
            return Some(missing(
                format!("Missing component: <{}> ({})", tag, name),
                location,
            ));
        }
        None
    }

    fn resolve_component_locator(
        &self,
        locator: &ComponentLocator,
        _file: &str,
        location: SourceLocation,
        provenance: Option<&Provenance>,
    ) -> Result<Option<Arc<ComponentResolution>>, ResolutionFail> {
        match locator {
            ComponentLocator::Literal { path } => {
                if let Some(component) = self.component(path) {
                    return Ok(Some(component));
                }
                if self.config.static_components {
                    return Err(with_provenance(
                        ResolutionFail::new(
                            FailureKind::UnresolvableReference,
                            format!("Missing component: {}", path),
                            location,
                        ),
                        provenance,
                    ));
                }
                Ok(None)
            }
            ComponentLocator::LexicalPath { path } => {
                if self.config.static_components {
                    return Err(with_provenance(
                        ResolutionFail::new(
                            FailureKind::InvalidComponentHelperUsage,
                            format!(
                                "cannot statically resolve the component named by `{}`",
                                path
                            ),
                            location,
                        )
                        .with_detail(
                            "pass a string literal, or wrap the value in ensure-safe-component",
                        ),
                        provenance,
                    ));
                }
                Ok(None)
            }
            ComponentLocator::Opaque => {
                if self.config.static_components {
                    return Err(with_provenance(
                        ResolutionFail::new(
                            FailureKind::AmbiguousDynamicArgument,
                            "cannot statically resolve a dynamic component argument",
                            location,
                        ),
                        provenance,
                    ));
                }
                Ok(None)
            }
        }
    }

    fn resolve_dynamic_helper_locator(
        &self,
        locator: &ComponentLocator,
        file: &str,
        location: SourceLocation,
    ) {
        self.record_dynamic(DynamicKind::Helper, locator, file, location);
    }

    fn resolve_dynamic_modifier_locator(
        &self,
        locator: &ComponentLocator,
        file: &str,
        location: SourceLocation,
    ) {
        self.record_dynamic(DynamicKind::Modifier, locator, file, location);
    }
}
