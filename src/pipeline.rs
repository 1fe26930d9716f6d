//! Batch resolution and out-of-process rebuild.
//!
//! Every document gets its own pass, so documents resolve in parallel with no
//! shared mutable state beyond what the resolver itself guards.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::codegen::ModuleBinding;
use crate::config::{ConfigError, ResolverConfig};
use crate::diagnostic::ResolutionFailure;
use crate::ir::Template;
use crate::resolver::Resolver;
use crate::static_resolver::StaticResolver;
use crate::transform::ResolverTransform;

pub const REQUIRE_FILE: &str = "resolver-native";
pub const BUILD_USING: &str = "make_resolver_transform";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    pub file_path: String,
    pub contents: String,
    pub template: Template,
}

/// Outcome of one document in a batch.
#[derive(Debug)]
pub struct DocumentResult {
    pub file_path: String,
    pub result: Result<Vec<ModuleBinding>, ResolutionFailure>,
}

impl DocumentResult {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

impl<R: Resolver + Sync> ResolverTransform<R> {
    /// Resolve a batch of documents in parallel. Results keep input order.
    pub fn resolve_documents(&self, documents: &[SourceDocument]) -> Vec<DocumentResult> {
        let results: Vec<DocumentResult> = documents
            .par_iter()
            .map(|doc| DocumentResult {
                file_path: doc.file_path.clone(),
                result: self.resolve(&doc.template, &doc.file_path, &doc.contents),
            })
            .collect();

        let failed = results.iter().filter(|r| !r.is_ok()).count();
        tracing::debug!(documents = results.len(), failed, "batch resolved");
        results
    }
}

/// Everything a worker needs to rebuild an equivalent transform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParallelSpec {
    pub require_file: String,
    pub build_using: String,
    pub params: ResolverConfig,
}

impl ParallelSpec {
    pub fn instantiate(&self) -> Result<ResolverTransform<StaticResolver>, ConfigError> {
        if self.require_file != REQUIRE_FILE || self.build_using != BUILD_USING {
            return Err(ConfigError::UnknownEntryPoint(format!(
                "{}#{}",
                self.require_file, self.build_using
            )));
        }
        Ok(make_resolver_transform(self.params.clone()))
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }
}

pub fn make_resolver_transform(config: ResolverConfig) -> ResolverTransform<StaticResolver> {
    ResolverTransform::new(StaticResolver::new(config))
}

impl ResolverTransform<StaticResolver> {
    pub fn parallel_spec(&self) -> ParallelSpec {
        ParallelSpec {
            require_file: REQUIRE_FILE.to_string(),
            build_using: BUILD_USING.to_string(),
            params: self.resolver().config().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::MustacheNode;
    use crate::resolver::ModuleReference;
    use pretty_assertions::assert_eq;

    fn config() -> ResolverConfig {
        let mut config = ResolverConfig {
            static_helpers: true,
            static_components: true,
            ..Default::default()
        };
        config.helpers.insert(
            "t".to_string(),
            ModuleReference::new("./helpers/t.js", "app/helpers/t"),
        );
        config
    }

    fn document(file_path: &str, head: &str) -> SourceDocument {
        SourceDocument {
            file_path: file_path.to_string(),
            contents: format!("{{{{{} \"x\"}}}}", head),
            template: Template::new(vec![MustacheNode::new(head)
                .with_param(crate::ir::Expression::string("x"))
                .into()]),
        }
    }

    #[test]
    fn test_batch_keeps_order_and_isolates_failures() {
        let transform = make_resolver_transform(config());
        let docs = vec![
            document("a.hbs", "t"),
            document("b.hbs", "missing"),
            document("c.hbs", "t"),
        ];

        let results = transform.resolve_documents(&docs);
        let files: Vec<_> = results.iter().map(|r| r.file_path.as_str()).collect();
        assert_eq!(files, vec!["a.hbs", "b.hbs", "c.hbs"]);
        assert!(results[0].is_ok());
        assert!(!results[1].is_ok());
        assert_eq!(results[2].result.as_ref().map(|b| b.len()).ok(), Some(1));
    }

    #[test]
    fn test_parallel_spec_rebuilds_equivalent_transform() {
        let transform = make_resolver_transform(config());
        let spec = transform.parallel_spec();
        let json = spec.to_json().unwrap();

        let rebuilt = ParallelSpec::from_json(&json).unwrap().instantiate().unwrap();
        assert_eq!(rebuilt.resolver().config(), transform.resolver().config());
    }

    #[test]
    fn test_unknown_entry_point_is_rejected() {
        let spec = ParallelSpec {
            require_file: "elsewhere".to_string(),
            build_using: BUILD_USING.to_string(),
            params: ResolverConfig::default(),
        };
        assert!(matches!(
            spec.instantiate(),
            Err(ConfigError::UnknownEntryPoint(_))
        ));
    }
}
