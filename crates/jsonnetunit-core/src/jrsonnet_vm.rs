//! In-process evaluation on the jrsonnet VM.
//!
//! Every call builds a fresh VM with the standard library, the configured
//! library paths and exactly the natives it was handed, so specs reach the
//! host only through that table.

use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use jrsonnet_evaluator::error::{Error as VmError, LocError};
use jrsonnet_evaluator::native::NativeCallback;
use jrsonnet_evaluator::{EvaluationState, FileImportResolver, Val};
use jrsonnet_parser::{Param, ParamsDesc};
use serde_json::Value;
use tracing::debug;

use crate::error::EvaluatorError;
use crate::evaluator::Evaluator;
use crate::natives::{NativeFunction, NativeRegistry};

/// Default evaluator: jrsonnet running inside the harness process.
#[derive(Debug, Clone, Default)]
pub struct JrsonnetEvaluator {
    jpaths: Vec<PathBuf>,
}

impl JrsonnetEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jpaths(mut self, jpaths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.jpaths.extend(jpaths);
        self
    }

    fn vm(&self, natives: &NativeRegistry) -> EvaluationState {
        let state = EvaluationState::default();
        state.with_stdlib();
        state.set_import_resolver(Box::new(FileImportResolver {
            library_paths: self.jpaths.clone(),
        }));

        for name in natives.names() {
            if let Some(function) = natives.shared(name) {
                state.add_native(name.into(), Rc::new(bind(function)));
            }
        }
        state
    }
}

/// Expose `function` to the VM, converting values through JSON.
fn bind(function: Arc<NativeFunction>) -> NativeCallback {
    let params = function
        .params()
        .iter()
        .map(|p| Param(p.as_str().into(), None))
        .collect::<Vec<_>>();

    NativeCallback::new(ParamsDesc(Rc::new(params)), move |_caller, args| {
        let args = args
            .iter()
            .map(|v| Value::try_from(v))
            .collect::<Result<Vec<_>, LocError>>()?;
        let value = function.call(&args).map_err(|e| {
            let err: LocError = VmError::RuntimeError(e.to_string().into()).into();
            err
        })?;
        Ok(Val::from(&value))
    })
}

/// go-jsonnet and libjsonnet report `error` expressions as `RUNTIME ERROR: <msg>`;
/// the `error_` fixture convention depends on that shape.
fn describe(state: &EvaluationState, err: &LocError) -> String {
    match err.error() {
        VmError::RuntimeError(msg) => {
            let msg: &str = msg;
            format!("RUNTIME ERROR: {msg}")
        }
        _ => state.stringify_err(err).trim().to_string(),
    }
}

impl Evaluator for JrsonnetEvaluator {
    fn evaluate(
        &self,
        filename: &str,
        snippet: &str,
        natives: &NativeRegistry,
    ) -> Result<String, EvaluatorError> {
        debug!(filename = %filename, natives = natives.len(), "evaluating in process");
        let state = self.vm(natives);

        state
            .evaluate_snippet_raw(PathBuf::from(filename).into(), snippet.into())
            .and_then(|val| state.manifest(val))
            .map(|json| {
                let json: &str = &json;
                json.to_string()
            })
            .map_err(|e| EvaluatorError::new(describe(&state, &e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluates_with_stdlib() {
        let out = JrsonnetEvaluator::new()
            .evaluate("t.jsonnet", "std.length([1, 2, 3])", &NativeRegistry::new())
            .unwrap();
        assert_eq!(out.trim(), "3");
    }

    #[test]
    fn test_error_expression_has_runtime_prefix() {
        let err = JrsonnetEvaluator::new()
            .evaluate("t.jsonnet", "error '`$.name` is required'", &NativeRegistry::new())
            .unwrap_err();
        assert_eq!(err.message, "RUNTIME ERROR: `$.name` is required");
    }

    #[test]
    fn test_unregistered_native_is_an_error() {
        let result = JrsonnetEvaluator::new().evaluate(
            "t.jsonnet",
            "std.native('regexMatch')('a', 'a')",
            &NativeRegistry::new(),
        );
        assert!(result.is_err());
    }
}
