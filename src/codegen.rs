//! Rendering of resolved bindings into module code.
//!
//! Each binding becomes a default import plus a registration under its
//! runtime name, so string-keyed runtime lookups keep working for code that
//! has not moved to static bindings yet.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::resolver::ModuleReference;

/// One emitted binding: import `path`, register it as `runtime_name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleBinding {
    pub path: String,
    pub runtime_name: String,
}

impl From<&ModuleReference> for ModuleBinding {
    fn from(module: &ModuleReference) -> Self {
        Self {
            path: module.path.clone(),
            runtime_name: module.runtime_name.clone(),
        }
    }
}

/// Receives the bindings of a successful pass, in discovery order.
pub trait EmissionSink {
    fn emit(&mut self, binding: ModuleBinding);
}

impl EmissionSink for Vec<ModuleBinding> {
    fn emit(&mut self, binding: ModuleBinding) {
        self.push(binding);
    }
}

/// Sink that renders JS: imports first, registrations after.
#[derive(Debug, Default)]
pub struct BindingEmitter {
    identifiers: HashMap<String, String>,
    imports: Vec<(String, String)>,
    registrations: Vec<(String, String)>,
}

impl BindingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    fn import_default(&mut self, path: &str) -> String {
        if let Some(identifier) = self.identifiers.get(path) {
            return identifier.clone();
        }
        let identifier = format!("_resolved{}", self.imports.len());
        self.identifiers.insert(path.to_string(), identifier.clone());
        self.imports.push((identifier.clone(), path.to_string()));
        identifier
    }

    pub fn render(&self) -> String {
        let imports = self
            .imports
            .iter()
            .map(|(identifier, path)| format!("import {} from {};", identifier, js_string(path)));
        let registrations = self.registrations.iter().map(|(runtime_name, identifier)| {
            format!("window.define({}, () => {});", js_string(runtime_name), identifier)
        });
        imports.chain(registrations).collect::<Vec<_>>().join("\n")
    }
}

impl EmissionSink for BindingEmitter {
    fn emit(&mut self, binding: ModuleBinding) {
        let identifier = self.import_default(&binding.path);
        self.registrations.push((binding.runtime_name, identifier));
    }
}

fn js_string(value: &str) -> String {
    // serde_json string escaping is valid JS string syntax
    serde_json::Value::String(value.to_string()).to_string()
}
