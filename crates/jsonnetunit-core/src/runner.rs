//! Test execution.
//!
//! Single-file mode wraps each discovered file in a [`Harness`] and stops at the
//! first unexpected failure. Suite mode evaluates every case of every suite
//! independently and reports each one.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::classify::{classify, ExecutionOutcome};
use crate::discovery::display_path;
use crate::error::{DecodeError, Result};
use crate::evaluator::Evaluator;
use crate::harness::{suite_case, Harness};
use crate::natives::NativeRegistry;
use crate::report::{Reporter, RunReport};
use crate::suite::{TestCase, TestSuite};

/// Outcome of one test file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRun {
    pub path: PathBuf,
    pub outcome: ExecutionOutcome,
    /// Passed assertion names (spec harness only).
    pub assertions: Vec<String>,
}

/// How a suite case ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum CaseVerdict {
    /// `err` presence matched the declared validity.
    Passed,
    /// Declared valid but `err` was present, or declared invalid and it was absent.
    Mismatch { err: Option<Value> },
    /// The evaluator itself failed.
    EvaluatorFailed { message: String },
    /// Output was not the `{schema, data, err}` object.
    Undecodable { message: String },
}

/// Outcome of one suite case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    pub suite: String,
    pub case: String,
    pub expected_valid: bool,
    pub verdict: CaseVerdict,
}

impl CaseResult {
    pub fn id(&self) -> String {
        format!("{} / {}", self.suite, self.case)
    }

    pub fn passed(&self) -> bool {
        self.verdict == CaseVerdict::Passed
    }

    pub fn outcome(&self) -> ExecutionOutcome {
        match &self.verdict {
            CaseVerdict::Passed => ExecutionOutcome::Pass(String::new()),
            CaseVerdict::Mismatch { err } => {
                let detail = if self.expected_valid {
                    format!("expected valid, got err: {}", err.clone().unwrap_or(Value::Null))
                } else {
                    "expected invalid, but err is absent".to_string()
                };
                ExecutionOutcome::UnexpectedFailure(detail)
            }
            CaseVerdict::EvaluatorFailed { message } | CaseVerdict::Undecodable { message } => {
                ExecutionOutcome::UnexpectedFailure(message.clone())
            }
        }
    }
}

#[derive(Deserialize)]
struct CaseOutput {
    #[serde(default)]
    err: Option<Value>,
}

/// Drives an evaluator with a fixed native function table.
pub struct TestRunner<E> {
    evaluator: E,
    natives: NativeRegistry,
}

impl<E: Evaluator> TestRunner<E> {
    pub fn new(evaluator: E, natives: NativeRegistry) -> Self {
        Self { evaluator, natives }
    }

    pub fn natives(&self) -> &NativeRegistry {
        &self.natives
    }

    /// Evaluate one file under `harness` and classify the result.
    ///
    /// Fails only when the spec harness succeeds but its output is not a list
    /// of assertion names.
    pub fn run_file(&self, harness: &Harness, path: &Path) -> std::result::Result<FileRun, DecodeError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let snippet = harness.compose(path);

        let result = self.evaluator.evaluate(&file_name, &snippet, &self.natives);
        let outcome = classify(&file_name, result);

        let assertions = match &outcome {
            ExecutionOutcome::Pass(output) if harness.reports_assertions() => {
                serde_json::from_str(output).map_err(|source| DecodeError {
                    expected: "array of passed assertion names",
                    source,
                })?
            }
            _ => Vec::new(),
        };

        Ok(FileRun {
            path: path.to_path_buf(),
            outcome,
            assertions,
        })
    }

    /// Run `files` in order, streaming to `reporter` and appending to `report`;
    /// stop at the first unexpected failure.
    pub fn run_files<W: Write>(
        &self,
        harness: &Harness,
        cwd: &Path,
        files: &[PathBuf],
        reporter: &mut Reporter<W>,
        report: &mut RunReport,
    ) -> Result<()> {

        for path in files {
            let id = display_path(cwd, path);
            reporter.run_started(&id)?;
            info!(file = %id, "running test file");

            let outcome = match self.run_file(harness, path) {
                Ok(run) => {
                    reporter.assertions(&run.assertions)?;
                    run.outcome
                }
                Err(e) => ExecutionOutcome::UnexpectedFailure(e.to_string()),
            };

            let halt = outcome.is_unexpected_failure();
            match &outcome {
                ExecutionOutcome::UnexpectedFailure(detail) => {
                    warn!(file = %id, "unexpected failure");
                    reporter.failure(detail)?;
                }
                ExecutionOutcome::ExpectedFailure(detail) => {
                    info!(file = %id, error = %detail, "failed as expected");
                }
                ExecutionOutcome::Pass(_) => {}
            }
            report.push(id, outcome);

            if halt {
                break;
            }
        }

        Ok(())
    }

    /// Evaluate `{schema, data, err: validateBySchema(data, schema)}` for one case.
    pub fn run_case(&self, validator: &str, schema: &Value, case: &TestCase) -> CaseVerdict {
        let snippet = suite_case(validator, schema, &case.data);

        let output = match self.evaluator.evaluate("suite_case.jsonnet", &snippet, &self.natives) {
            Ok(output) => output,
            Err(e) => {
                return CaseVerdict::EvaluatorFailed { message: e.message };
            }
        };

        let decoded: CaseOutput = match serde_json::from_str(&output) {
            Ok(decoded) => decoded,
            Err(source) => {
                let err = DecodeError {
                    expected: "{schema, data, err} object",
                    source,
                };
                return CaseVerdict::Undecodable {
                    message: err.to_string(),
                };
            }
        };

        if decoded.err.is_none() == case.valid {
            CaseVerdict::Passed
        } else {
            CaseVerdict::Mismatch { err: decoded.err }
        }
    }

    /// Run every case of every suite; failures do not stop the run.
    pub fn run_suites<W: Write>(
        &self,
        validator: &str,
        suites: &[TestSuite],
        reporter: &mut Reporter<W>,
        report: &mut RunReport,
    ) -> Result<Vec<CaseResult>> {
        let mut results = Vec::new();

        for suite in suites {
            for case in &suite.tests {
                let result = CaseResult {
                    suite: suite.description.clone(),
                    case: case.description.clone(),
                    expected_valid: case.valid,
                    verdict: self.run_case(validator, &suite.schema, case),
                };

                let outcome = result.outcome();
                if !result.passed() {
                    warn!(case = %result.id(), "suite case failed");
                }
                reporter.case(&result.id(), &outcome)?;
                report.push(result.id(), outcome);
                results.push(result);
            }
        }

        Ok(results)
    }
}
