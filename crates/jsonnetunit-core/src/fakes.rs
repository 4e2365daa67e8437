//! Test doubles for the evaluator seam (testing only)
//!
//! `ScriptedEvaluator` answers each evaluation with a closure and keeps a log
//! of every snippet it was handed.

use std::sync::Mutex;

use crate::error::EvaluatorError;
use crate::evaluator::Evaluator;
use crate::natives::NativeRegistry;

type Script =
    Box<dyn Fn(&str, &str, &NativeRegistry) -> Result<String, EvaluatorError> + Send + Sync>;

/// Closure-backed evaluator.
pub struct ScriptedEvaluator {
    script: Script,
    snippets: Mutex<Vec<String>>,
}

impl ScriptedEvaluator {
    /// `script(filename, snippet, natives)` produces each result.
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&str, &str, &NativeRegistry) -> Result<String, EvaluatorError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            script: Box::new(script),
            snippets: Mutex::new(Vec::new()),
        }
    }

    /// Always return `output`.
    pub fn returning(output: &str) -> Self {
        let output = output.to_string();
        Self::new(move |_, _, _| Ok(output.clone()))
    }

    /// Always fail with `message`.
    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::new(move |_, _, _| Err(EvaluatorError::new(message.clone())))
    }

    /// Snippets evaluated so far, in order.
    pub fn snippets(&self) -> Vec<String> {
        self.snippets.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.snippets.lock().unwrap().len()
    }
}

impl Evaluator for ScriptedEvaluator {
    fn evaluate(
        &self,
        filename: &str,
        snippet: &str,
        natives: &NativeRegistry,
    ) -> Result<String, EvaluatorError> {
        self.snippets.lock().unwrap().push(snippet.to_string());
        (self.script)(filename, snippet, natives)
    }
}
