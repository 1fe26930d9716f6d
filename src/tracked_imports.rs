//! Implicit-import metadata for legacy packages.
//!
//! Packages that pushed assets into the app's vendor bundles declare them as
//! tracked imports. They are translated into the `implicit-*` lists of the
//! package's v2 metadata.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

lazy_static! {
    static ref JS_ASSET: Regex = Regex::new(r"(?i)\.js$").unwrap();
    static ref CSS_ASSET: Regex = Regex::new(r"(?i)\.css$").unwrap();
}

const VENDOR_JS_OUTPUT: &str = "/assets/vendor.js";
const VENDOR_CSS_OUTPUT: &str = "/assets/vendor.css";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportOptions {
    #[serde(rename = "type")]
    pub import_type: String,
    #[serde(default)]
    pub output_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrackedImport {
    pub asset_path: String,
    pub options: ImportOptions,
}

impl TrackedImport {
    pub fn new(asset_path: &str, import_type: &str) -> Self {
        Self {
            asset_path: asset_path.to_string(),
            options: ImportOptions {
                import_type: import_type.to_string(),
                output_file: None,
            },
        }
    }

    pub fn with_output_file(mut self, output_file: &str) -> Self {
        self.options.output_file = Some(output_file.to_string());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizedImports {
    pub app_js: Vec<String>,
    pub app_css: Vec<String>,
    pub test_js: Vec<String>,
    pub test_css: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct AddonMeta {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implicit_scripts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implicit_styles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implicit_test_scripts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implicit_test_styles: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct TrackedImports {
    package_name: String,
    imports: Vec<TrackedImport>,
    categorized: OnceLock<CategorizedImports>,
}

impl TrackedImports {
    pub fn new(package_name: &str, imports: Vec<TrackedImport>) -> Self {
        Self {
            package_name: package_name.to_string(),
            imports,
            categorized: OnceLock::new(),
        }
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Computed once; later calls return the same lists.
    pub fn categorized(&self) -> &CategorizedImports {
        self.categorized.get_or_init(|| self.categorize())
    }

    pub fn meta(&self) -> AddonMeta {
        let lists = self.categorized();
        let non_empty = |list: &Vec<String>| (!list.is_empty()).then(|| list.clone());
        AddonMeta {
            version: 2,
            implicit_scripts: non_empty(&lists.app_js),
            implicit_styles: non_empty(&lists.app_css),
            implicit_test_scripts: non_empty(&lists.test_js),
            implicit_test_styles: non_empty(&lists.test_css),
        }
    }

    fn categorize(&self) -> CategorizedImports {
        let mut out = CategorizedImports::default();
        for import in &self.imports {
            let Some(specifier) = self.standardize(&import.asset_path) else {
                continue;
            };
            let (app, test, standard_output, kind) = if JS_ASSET.is_match(&import.asset_path) {
                (&mut out.app_js, &mut out.test_js, VENDOR_JS_OUTPUT, "JS")
            } else if CSS_ASSET.is_match(&import.asset_path) {
                (&mut out.app_css, &mut out.test_css, VENDOR_CSS_OUTPUT, "CSS")
            } else {
                continue;
            };
            match import.options.import_type.as_str() {
                "vendor" => {
                    if let Some(output) = import
                        .options
                        .output_file
                        .as_deref()
                        .filter(|output| *output != standard_output)
                    {
                        tracing::warn!(
                            package = self.package_name.as_str(),
                            output_file = output,
                            "vendor {} imported into a nonstandard output file",
                            kind
                        );
                    }
                    app.push(specifier);
                }
                "test" => test.push(specifier),
                other => {
                    tracing::warn!(
                        package = self.package_name.as_str(),
                        import_type = other,
                        asset = import.asset_path.as_str(),
                        "non-standard import type"
                    );
                }
            }
        }
        out
    }

    fn standardize(&self, asset_path: &str) -> Option<String> {
        let (first, rest) = asset_path.split_once('/').unwrap_or((asset_path, ""));
        match first {
            "vendor" => Some(format!("./vendor/{}", rest)),
            "node_modules" => Some(rest.to_string()),
            _ => {
                tracing::warn!(
                    package = self.package_name.as_str(),
                    asset = asset_path,
                    "import from unknown path"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_paths_are_standardized_and_categorized() {
        let tracked = TrackedImports::new(
            "legacy-addon",
            vec![
                TrackedImport::new("vendor/shim.js", "vendor"),
                TrackedImport::new("node_modules/lib/dist/lib.CSS", "vendor"),
                TrackedImport::new("vendor/qunit-extras.js", "test"),
                TrackedImport::new("node_modules/qunit/qunit.css", "test"),
                TrackedImport::new("public/logo.js", "vendor"),
                TrackedImport::new("vendor/font.woff", "vendor"),
                TrackedImport::new("vendor/odd.js", "other"),
            ],
        );

        assert_eq!(
            tracked.categorized(),
            &CategorizedImports {
                app_js: vec!["./vendor/shim.js".to_string()],
                app_css: vec!["lib/dist/lib.CSS".to_string()],
                test_js: vec!["./vendor/qunit-extras.js".to_string()],
                test_css: vec!["qunit/qunit.css".to_string()],
            }
        );
    }

    #[test]
    fn test_categorized_is_memoized() {
        let tracked = TrackedImports::new("a", vec![TrackedImport::new("vendor/a.js", "vendor")]);
        let first: *const CategorizedImports = tracked.categorized();
        let second: *const CategorizedImports = tracked.categorized();
        assert_eq!(first, second);
    }

    #[test]
    fn test_nonstandard_output_file_still_counts() {
        let tracked = TrackedImports::new(
            "a",
            vec![TrackedImport::new("vendor/a.js", "vendor").with_output_file("/assets/other.js")],
        );
        assert_eq!(tracked.categorized().app_js, vec!["./vendor/a.js".to_string()]);
    }

    #[test]
    fn test_meta_omits_empty_lists() {
        let tracked = TrackedImports::new("a", vec![TrackedImport::new("vendor/a.css", "vendor")]);
        let meta = serde_json::to_value(tracked.meta()).unwrap();
        assert_eq!(
            meta,
            serde_json::json!({ "version": 2, "implicit-styles": ["./vendor/a.css"] })
        );
    }

    #[test]
    fn test_tracked_import_json_shape() {
        let import: TrackedImport = serde_json::from_str(
            r#"{ "assetPath": "vendor/a.js", "options": { "type": "vendor", "outputFile": "/assets/vendor.js" } }"#,
        )
        .unwrap();
        assert_eq!(
            import,
            TrackedImport::new("vendor/a.js", "vendor").with_output_file("/assets/vendor.js")
        );
    }
}
