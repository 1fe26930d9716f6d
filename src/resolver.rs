//! Interface to the name-resolution oracle.
//!
//! The oracle maps a name (or a dynamic locator) in a given file to the
//! modules that implement it. The transform only consumes it; see
//! `static_resolver` for a table-driven implementation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::diagnostic::ResolutionFail;
use crate::ir::SourceLocation;
use crate::locator::ComponentLocator;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ModuleReference {
    pub path: String,
    /// Legacy string key the module is also registered under at runtime.
    pub runtime_name: String,
}

impl ModuleReference {
    pub fn new(path: &str, runtime_name: &str) -> Self {
        Self {
            path: path.to_string(),
            runtime_name: runtime_name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HelperResolution {
    pub modules: Vec<ModuleReference>,
}

/// What a block-yielded value is known to be, by block-param position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum YieldedComponent {
    Flag(bool),
    /// Object-shaped yield: field name -> is that field a component.
    Fields(HashMap<String, bool>),
}

/// Which of the invocation's own named arguments a yielded value comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum YieldedArgument {
    Argument(String),
    Fields(HashMap<String, String>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ComponentResolution {
    pub modules: Vec<ModuleReference>,
    #[serde(default)]
    pub yields_components: Vec<YieldedComponent>,
    #[serde(default)]
    pub yields_arguments: Vec<Option<YieldedArgument>>,
    /// Named arguments of this invocation that are themselves components.
    #[serde(default)]
    pub arguments_are_components: Vec<String>,
}

impl ComponentResolution {
    pub fn yields_component_at(&self, index: usize) -> bool {
        matches!(self.yields_components.get(index), Some(YieldedComponent::Flag(true)))
    }

    pub fn yields_component_field(&self, index: usize, field: &str) -> bool {
        match self.yields_components.get(index) {
            Some(YieldedComponent::Fields(fields)) => fields.get(field).copied().unwrap_or(false),
            _ => false,
        }
    }

    pub fn yielded_argument_at(&self, index: usize) -> Option<&str> {
        match self.yields_arguments.get(index) {
            Some(Some(YieldedArgument::Argument(name))) => Some(name),
            _ => None,
        }
    }

    pub fn yielded_argument_field(&self, index: usize, field: &str) -> Option<&str> {
        match self.yields_arguments.get(index) {
            Some(Some(YieldedArgument::Fields(fields))) => fields.get(field).map(String::as_str),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ResolutionResult {
    Error(ResolutionFail),
    Helper(HelperResolution),
    Component(Arc<ComponentResolution>),
}

impl ResolutionResult {
    pub fn modules(&self) -> &[ModuleReference] {
        match self {
            ResolutionResult::Error(_) => &[],
            ResolutionResult::Helper(h) => &h.modules,
            ResolutionResult::Component(c) => &c.modules,
        }
    }
}

/// Why a component locator was resolved: it was the value of `argument_name`
/// on an invocation of `invoking_name`. Only used for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub invoking_name: String,
    pub argument_name: String,
}

pub trait Resolver {
    /// A name in mustache or block position. Ambiguous between component
    /// and helper; `has_arguments` is evidence of either.
    fn resolve_invocation(
        &self,
        name: &str,
        has_arguments: bool,
        file: &str,
        location: SourceLocation,
    ) -> Option<ResolutionResult>;

    /// A name in sub-expression position. Never a component.
    fn resolve_call_expression(
        &self,
        name: &str,
        file: &str,
        location: SourceLocation,
    ) -> Option<ResolutionResult>;

    fn resolve_modifier_invocation(
        &self,
        name: &str,
        file: &str,
        location: SourceLocation,
    ) -> Option<ResolutionResult>;

    fn resolve_element(
        &self,
        tag: &str,
        file: &str,
        location: SourceLocation,
    ) -> Option<ResolutionResult>;

    fn resolve_component_locator(
        &self,
        locator: &ComponentLocator,
        file: &str,
        location: SourceLocation,
        provenance: Option<&Provenance>,
    ) -> Result<Option<Arc<ComponentResolution>>, ResolutionFail>;

    /// Registration only; nothing is emitted for dynamic helpers.
    fn resolve_dynamic_helper_locator(
        &self,
        locator: &ComponentLocator,
        file: &str,
        location: SourceLocation,
    );

    fn resolve_dynamic_modifier_locator(
        &self,
        locator: &ComponentLocator,
        file: &str,
        location: SourceLocation,
    );
}

impl<R: Resolver + ?Sized> Resolver for &R {
    fn resolve_invocation(
        &self,
        name: &str,
        has_arguments: bool,
        file: &str,
        location: SourceLocation,
    ) -> Option<ResolutionResult> {
        (**self).resolve_invocation(name, has_arguments, file, location)
    }

    fn resolve_call_expression(
        &self,
        name: &str,
        file: &str,
        location: SourceLocation,
    ) -> Option<ResolutionResult> {
        (**self).resolve_call_expression(name, file, location)
    }

    fn resolve_modifier_invocation(
        &self,
        name: &str,
        file: &str,
        location: SourceLocation,
    ) -> Option<ResolutionResult> {
        (**self).resolve_modifier_invocation(name, file, location)
    }

    fn resolve_element(
        &self,
        tag: &str,
        file: &str,
        location: SourceLocation,
    ) -> Option<ResolutionResult> {
        (**self).resolve_element(tag, file, location)
    }

    fn resolve_component_locator(
        &self,
        locator: &ComponentLocator,
        file: &str,
        location: SourceLocation,
        provenance: Option<&Provenance>,
    ) -> Result<Option<Arc<ComponentResolution>>, ResolutionFail> {
        (**self).resolve_component_locator(locator, file, location, provenance)
    }

    fn resolve_dynamic_helper_locator(
        &self,
        locator: &ComponentLocator,
        file: &str,
        location: SourceLocation,
    ) {
        (**self).resolve_dynamic_helper_locator(locator, file, location)
    }

    fn resolve_dynamic_modifier_locator(
        &self,
        locator: &ComponentLocator,
        file: &str,
        location: SourceLocation,
    ) {
        (**self).resolve_dynamic_modifier_locator(locator, file, location)
    }
}
