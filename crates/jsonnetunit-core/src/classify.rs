//! Outcome classification.
//!
//! Files whose name starts with [`ERROR_FILE_MARKER`] are fixtures that must
//! make evaluation fail, and must fail with an error text starting with
//! [`EXPECTED_ERROR_PREFIX`]. Everything else must evaluate cleanly.
//!
//! The prefix is whatever the evaluator prints for a failed `$`-rooted
//! validation assertion. It is a string contract with the evaluator, so it
//! lives here as a single constant.

use serde::{Deserialize, Serialize};

use crate::error::EvaluatorError;

/// Error-text prefix accepted from an expected-failure fixture.
pub const EXPECTED_ERROR_PREFIX: &str = "RUNTIME ERROR: `$";

/// File-name prefix marking an expected-failure fixture.
pub const ERROR_FILE_MARKER: &str = "error_";

/// Result of one test file or suite case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// Evaluated as expected; carries the evaluator output.
    Pass(String),
    /// Failed the way an `error_` fixture is supposed to; carries the error.
    ExpectedFailure(String),
    /// Anything else.
    UnexpectedFailure(String),
}

impl ExecutionOutcome {
    pub fn is_unexpected_failure(&self) -> bool {
        matches!(self, ExecutionOutcome::UnexpectedFailure(_))
    }

    pub fn detail(&self) -> &str {
        match self {
            ExecutionOutcome::Pass(d)
            | ExecutionOutcome::ExpectedFailure(d)
            | ExecutionOutcome::UnexpectedFailure(d) => d,
        }
    }
}

/// Whether `file_name` (a base name) marks an expected-failure fixture.
pub fn expects_failure(file_name: &str) -> bool {
    file_name.starts_with(ERROR_FILE_MARKER)
}

/// Classify an evaluation of the file named `file_name`.
pub fn classify(file_name: &str, result: Result<String, EvaluatorError>) -> ExecutionOutcome {
    match (expects_failure(file_name), result) {
        (false, Ok(output)) => ExecutionOutcome::Pass(output),
        (false, Err(err)) => ExecutionOutcome::UnexpectedFailure(err.message),
        (true, Ok(output)) => ExecutionOutcome::UnexpectedFailure(format!(
            "{file_name}: expected evaluation to fail, but it succeeded with {}",
            output.trim()
        )),
        (true, Err(err)) if err.message.starts_with(EXPECTED_ERROR_PREFIX) => {
            ExecutionOutcome::ExpectedFailure(err.message)
        }
        (true, Err(err)) => ExecutionOutcome::UnexpectedFailure(err.message),
    }
}
