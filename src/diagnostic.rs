#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ir::SourceLocation;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_UNRESOLVABLE_REFERENCE: &str = "R-ERR-RESOLVE-001";
pub const ERR_AMBIGUOUS_DYNAMIC_ARGUMENT: &str = "R-ERR-RESOLVE-002";
pub const ERR_INVALID_COMPONENT_HELPER: &str = "R-ERR-RESOLVE-003";

fn get_guarantee(code: &str) -> &'static str {
    match code {
        ERR_UNRESOLVABLE_REFERENCE => {
            "Every component, helper and modifier is bound to a module at build time."
        }
        ERR_AMBIGUOUS_DYNAMIC_ARGUMENT => {
            "Dynamic component arguments are string literals or known-safe references."
        }
        ERR_INVALID_COMPONENT_HELPER => {
            "The component keyword only receives statically analyzable locators."
        }
        _ => "Unknown guarantee.",
    }
}

/// Why the oracle refused a reference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    UnresolvableReference,
    AmbiguousDynamicArgument,
    InvalidComponentHelperUsage,
}

impl FailureKind {
    pub fn code(self) -> &'static str {
        match self {
            FailureKind::UnresolvableReference => ERR_UNRESOLVABLE_REFERENCE,
            FailureKind::AmbiguousDynamicArgument => ERR_AMBIGUOUS_DYNAMIC_ARGUMENT,
            FailureKind::InvalidComponentHelperUsage => ERR_INVALID_COMPONENT_HELPER,
        }
    }
}

/// A single failed lookup, as returned by the oracle.
///
/// Non-fatal while walking; the pass collects these and fails once at the end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionFail {
    pub kind: FailureKind,
    pub message: String,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub location: SourceLocation,
}

impl ResolutionFail {
    pub fn new(kind: FailureKind, message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
            location,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER ERROR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct CompilerError {
    pub code: String,
    pub error_type: String,
    pub message: String,
    pub guarantee: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub context: Option<String>,
    pub hints: Vec<String>,
}

impl CompilerError {
    pub fn new(code: &str, message: &str, file: &str, line: u32, column: u32) -> Self {
        Self::with_details(code, message, file, line, column, None, vec![])
    }

    pub fn with_details(
        code: &str,
        message: &str,
        file: &str,
        line: u32,
        column: u32,
        context: Option<String>,
        hints: Vec<String>,
    ) -> Self {
        CompilerError {
            code: code.to_string(),
            error_type: "RESOLUTION_FAILURE".to_string(),
            message: message.to_string(),
            guarantee: get_guarantee(code).to_string(),
            file: file.to_string(),
            line,
            column,
            context,
            hints,
        }
    }

    /// Attach file identity and the offending source line to an oracle failure.
    pub fn from_fail(fail: &ResolutionFail, file: &str, contents: &str) -> Self {
        let context = source_line(contents, fail.location.line);
        let hints = fail.detail.iter().cloned().collect();
        Self::with_details(
            fail.kind.code(),
            &fail.message,
            file,
            fail.location.line,
            fail.location.column,
            context,
            hints,
        )
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{} [{}] {}",
            self.file, self.line, self.column, self.code, self.message
        )
    }
}

fn source_line(contents: &str, line: u32) -> Option<String> {
    if line == 0 {
        return None;
    }
    contents
        .lines()
        .nth(line as usize - 1)
        .map(|l| l.trim_end().to_string())
}

// ═══════════════════════════════════════════════════════════════════════════════
// PASS FAILURE
// ═══════════════════════════════════════════════════════════════════════════════

/// Every unresolved reference of one document, raised once when the walk ends.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", render_failure(.file, .source_text, .errors))]
pub struct ResolutionFailure {
    pub file: String,
    pub source_text: String,
    pub errors: Vec<CompilerError>,
}

impl ResolutionFailure {
    pub fn new(file: &str, contents: &str, fails: &[ResolutionFail]) -> Self {
        Self {
            file: file.to_string(),
            source_text: contents.to_string(),
            errors: fails
                .iter()
                .map(|fail| CompilerError::from_fail(fail, file, contents))
                .collect(),
        }
    }
}

fn render_failure(file: &str, source_text: &str, errors: &[CompilerError]) -> String {
    let mut out = format!(
        "{} unresolved reference{} in {}:\n",
        errors.len(),
        if errors.len() == 1 { "" } else { "s" },
        file
    );
    for error in errors {
        out.push_str(&format!("  {}\n", error));
        for hint in &error.hints {
            out.push_str(&format!("    hint: {}\n", hint));
        }
    }
    out.push_str("\nSource:\n");
    out.push_str(source_text);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_compiler_error_carries_context_line() {
        let fail = ResolutionFail::new(
            FailureKind::UnresolvableReference,
            "Missing component: my-button",
            SourceLocation::new(2, 3),
        )
        .with_detail("passed as @icon");
        let contents = "<div>\n  {{my-button}}\n</div>";
        let err = CompilerError::from_fail(&fail, "app/templates/index.hbs", contents);

        assert_eq!(err.code, ERR_UNRESOLVABLE_REFERENCE);
        assert_eq!(err.context.as_deref(), Some("  {{my-button}}"));
        assert_eq!(err.hints, vec!["passed as @icon".to_string()]);
        assert_eq!(
            err.to_string(),
            "app/templates/index.hbs:2:3 [R-ERR-RESOLVE-001] Missing component: my-button"
        );
    }

    #[test]
    fn test_failure_display_lists_every_error_and_source() {
        let fails = vec![
            ResolutionFail::new(
                FailureKind::UnresolvableReference,
                "Missing helper: a",
                SourceLocation::new(1, 1),
            ),
            ResolutionFail::new(
                FailureKind::AmbiguousDynamicArgument,
                "cannot resolve",
                SourceLocation::new(1, 8),
            ),
        ];
        let failure = ResolutionFailure::new("x.hbs", "{{(a)}} {{component this.c}}", &fails);
        let text = failure.to_string();

        assert!(text.starts_with("2 unresolved references in x.hbs:"));
        assert!(text.contains("x.hbs:1:1 [R-ERR-RESOLVE-001] Missing helper: a"));
        assert!(text.contains("x.hbs:1:8 [R-ERR-RESOLVE-002] cannot resolve"));
        assert!(text.ends_with("{{(a)}} {{component this.c}}"));
    }

    #[test]
    fn test_source_line_out_of_range() {
        assert_eq!(source_line("one line", 0), None);
        assert_eq!(source_line("one line", 5), None);
    }
}
