//! The evaluator seam.
//!
//! The Jsonnet runtime is an external collaborator. The harness only needs
//! "evaluate this snippet with these host functions available" and a textual
//! error when that fails.

use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use crate::error::EvaluatorError;
use crate::natives::NativeRegistry;

/// Evaluates a Jsonnet snippet to its manifested JSON text.
///
/// The native function table is passed on every call rather than installed
/// globally, so each evaluation sees exactly the capabilities it was given.
pub trait Evaluator {
    fn evaluate(
        &self,
        filename: &str,
        snippet: &str,
        natives: &NativeRegistry,
    ) -> Result<String, EvaluatorError>;
}

impl<E: Evaluator + ?Sized> Evaluator for &E {
    fn evaluate(
        &self,
        filename: &str,
        snippet: &str,
        natives: &NativeRegistry,
    ) -> Result<String, EvaluatorError> {
        (**self).evaluate(filename, snippet, natives)
    }
}

impl<E: Evaluator + ?Sized> Evaluator for Box<E> {
    fn evaluate(
        &self,
        filename: &str,
        snippet: &str,
        natives: &NativeRegistry,
    ) -> Result<String, EvaluatorError> {
        (**self).evaluate(filename, snippet, natives)
    }
}

/// Runs an external `jsonnet`-compatible executable per evaluation.
///
/// Invoked as `<program> -J <dir>... -e <snippet>`. A separate process cannot
/// call back into host functions, so specs that use `std.native` need
/// [`JrsonnetEvaluator`](crate::JrsonnetEvaluator) instead.
#[derive(Debug, Clone)]
pub struct CommandEvaluator {
    program: String,
    jpaths: Vec<PathBuf>,
}

impl CommandEvaluator {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            jpaths: Vec::new(),
        }
    }

    pub fn with_jpaths(mut self, jpaths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.jpaths.extend(jpaths);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, snippet: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        for dir in &self.jpaths {
            cmd.arg("-J").arg(dir);
        }
        cmd.arg("-e").arg(snippet);
        cmd
    }
}

impl Evaluator for CommandEvaluator {
    fn evaluate(
        &self,
        filename: &str,
        snippet: &str,
        natives: &NativeRegistry,
    ) -> Result<String, EvaluatorError> {
        if !natives.is_empty() {
            debug!(
                natives = ?natives.names(),
                "external evaluator cannot call host functions"
            );
        }
        debug!(program = %self.program, filename = %filename, "evaluating");

        let output = self.command(snippet).output().map_err(|e| {
            EvaluatorError::new(format!("failed to run {}: {}", self.program, e))
        })?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|_| {
                EvaluatorError::new(format!("{} printed output that is not UTF-8", self.program))
            })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr.trim();
            if message.is_empty() {
                Err(EvaluatorError::new(format!(
                    "{} exited with {}",
                    self.program, output.status
                )))
            } else {
                Err(EvaluatorError::new(message))
            }
        }
    }
}
