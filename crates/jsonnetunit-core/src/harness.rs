//! Snippets that wrap a test file (or suite case) for evaluation.

use std::path::Path;

use serde_json::{json, Value};

/// Spec-file runner, applied to the imported spec object.
pub const RUNSUITES: &str = include_str!("runsuites.libsonnet");

/// Default validation entry point for the validate harness.
pub const DEFAULT_VALIDATE_ENTRY: &str = "t.libsonnet";

/// Default module providing `validateBySchema` for suite mode.
pub const DEFAULT_VALIDATOR: &str = "validator.libsonnet";

/// How a single test file is wrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Harness {
    /// Run the file's assertions; the result is a JSON array of passed names.
    Spec,
    /// `validate` the file's content with the given entry module.
    Validate { entry: String },
}

impl Harness {
    pub fn validate(entry: &str) -> Self {
        Harness::Validate {
            entry: entry.to_string(),
        }
    }

    /// Whether evaluation output is the passed-assertion list.
    pub fn reports_assertions(&self) -> bool {
        matches!(self, Harness::Spec)
    }

    /// Compose the snippet evaluated for `file`.
    pub fn compose(&self, file: &Path) -> String {
        let target = quote(&file.to_string_lossy());
        match self {
            Harness::Spec => format!("({})(import {})\n", RUNSUITES, target),
            Harness::Validate { entry } => format!(
                "local t = import {};\nt.validate(import {})\n",
                quote(entry),
                target
            ),
        }
    }
}

/// Snippet evaluating `{schema, data, err}` for one suite case.
pub fn suite_case(validator: &str, schema: &Value, data: &Value) -> String {
    let case = json!({ "schema": schema, "data": data });
    format!(
        "local t = import {};\n\nlocal c = {};\n\nc + {{ err: t.validateBySchema(c.data, c.schema) }}\n",
        quote(validator),
        case
    )
}

/// Jsonnet string literal for `s` (JSON escapes are valid Jsonnet).
fn quote(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_harness_applies_runsuites() {
        let snippet = Harness::Spec.compose(Path::new("/work/a.spec.libsonnet"));
        assert!(snippet.starts_with('('));
        assert!(snippet.contains("function(spec)"));
        assert!(snippet.contains("(import \"/work/a.spec.libsonnet\")"));
    }

    #[test]
    fn test_validate_harness() {
        let snippet = Harness::validate("t.libsonnet").compose(Path::new("fixtures/ok.jsonnet"));
        assert_eq!(
            snippet,
            "local t = import \"t.libsonnet\";\nt.validate(import \"fixtures/ok.jsonnet\")\n"
        );
        assert!(!Harness::validate("t.libsonnet").reports_assertions());
        assert!(Harness::Spec.reports_assertions());
    }

    #[test]
    fn test_paths_are_escaped() {
        let snippet = Harness::Spec.compose(Path::new("/work/we\"ird.spec.libsonnet"));
        assert!(snippet.contains(r#"import "/work/we\"ird.spec.libsonnet""#));
    }

    #[test]
    fn test_suite_case_embeds_schema_and_data() {
        let snippet = suite_case(
            DEFAULT_VALIDATOR,
            &json!({"type": "string"}),
            &json!("x"),
        );
        assert!(snippet.starts_with("local t = import \"validator.libsonnet\";"));
        assert!(snippet.contains(r#""schema":{"type":"string"}"#));
        assert!(snippet.contains(r#""data":"x""#));
        assert!(snippet.contains("err: t.validateBySchema(c.data, c.schema)"));
    }
}
