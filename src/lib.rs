//! # Build-Time Template Resolution
//!
//! ## Resolution Invariants
//!
//! 1. **Single Walk**: each document is walked once, depth first. Every scope
//!    opened for a body is closed after that body's children and before its
//!    siblings.
//!
//! 2. **Lexical Shadowing**: a name bound by any enclosing block is never
//!    resolved. Neither are `this.` paths or multi-segment heads.
//!
//! 3. **Oracle Authority**: all naming knowledge lives behind the `Resolver`
//!    trait. The transform only decides *which* sites to ask about.
//!
//! 4. **Deduplication**: a runtime name is bound at most once per document.
//!
//! 5. **Safe Components**: a block param proven to carry a component (via the
//!    yielding component's rules) needs no runtime check and no oracle query.
//!
//! 6. **All-or-Nothing**: errors are collected during the walk and raised as one
//!    `ResolutionFailure` at the end. A failing document emits nothing.
//!
//! ## Data Flow
//!
//! `Template` (JSON) -> `ResolverTransform::run` -> `EmissionSink`
//! (`BindingEmitter` renders imports plus `window.define` registrations).

#[cfg(feature = "napi")]
use napi_derive::napi;

pub mod codegen;
pub mod config;
pub mod diagnostic;
pub mod ir;
pub mod locator;
pub mod pipeline;
pub mod resolver;
pub mod scope;
pub mod static_resolver;
pub mod tracked_imports;
pub mod transform;
pub mod visitor;


pub use codegen::{BindingEmitter, EmissionSink, ModuleBinding};
pub use config::{ConfigError, ResolverConfig};
pub use diagnostic::{CompilerError, FailureKind, ResolutionFail, ResolutionFailure};
pub use ir::{SourceLocation, Template};
pub use locator::ComponentLocator;
pub use pipeline::{make_resolver_transform, ParallelSpec, SourceDocument};
pub use resolver::{ComponentResolution, ModuleReference, Provenance, ResolutionResult, Resolver};
pub use static_resolver::StaticResolver;
pub use tracked_imports::{AddonMeta, TrackedImport, TrackedImports};
pub use transform::ResolverTransform;

/// Resolve one serialized template and render its bindings as JS.
#[cfg(feature = "napi")]
#[napi]
pub fn resolve_template_native(
    template_json: String,
    file_path: String,
    contents: String,
    config_json: String,
) -> napi::Result<String> {
    let template: Template = serde_json::from_str(&template_json)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;
    let config = ResolverConfig::from_json(&config_json)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;

    let transform = make_resolver_transform(config);
    let mut emitter = BindingEmitter::new();
    transform
        .run(&template, &file_path, &contents, &mut emitter)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;
    Ok(emitter.render())
}
