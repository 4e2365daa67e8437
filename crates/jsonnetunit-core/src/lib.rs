//! jsonnetunit core
//!
//! Runs Jsonnet validation specs against an [`Evaluator`] extended with a
//! fixed set of host capabilities:
//!
//! - [`natives`]: `fetch`, `parseJson`, `regexMatch`, `importDir`
//! - [`suite`]: JSON-Schema-Test-Suite download and local mirroring
//! - [`discovery`], [`harness`], [`classify`], [`runner`]: spec-file execution
//!   and the `error_` fixture convention
//! - [`report`]: transcript and run report

pub mod classify;
pub mod config;
pub mod discovery;
pub mod error;
pub mod evaluator;
pub mod fakes;
pub mod harness;
pub mod jrsonnet_vm;
pub mod natives;
pub mod report;
pub mod runner;
pub mod suite;
pub mod telemetry;

pub use classify::{
    classify, expects_failure, ExecutionOutcome, ERROR_FILE_MARKER, EXPECTED_ERROR_PREFIX,
};
pub use config::{HarnessConfig, DEFAULT_SUITE_URL, DEFAULT_TEST_SUFFIX};
pub use discovery::{discover, display_path};
pub use error::{
    DecodeError, DiscoveryError, EvaluatorError, HarnessError, NativeError, Result, SuiteLoadError,
};
pub use evaluator::{CommandEvaluator, Evaluator};
pub use harness::{Harness, DEFAULT_VALIDATE_ENTRY, DEFAULT_VALIDATOR};
pub use jrsonnet_vm::JrsonnetEvaluator;
pub use natives::{NativeFunction, NativeRegistry};
pub use report::{ReportEntry, Reporter, RunReport};
pub use runner::{CaseResult, CaseVerdict, FileRun, TestRunner};
pub use suite::{SuiteLoader, TestCase, TestSuite};
pub use telemetry::{init_tracing, RunMode, RunSpan};

pub use jsonnetunit_fetch as fetch;

/// jsonnetunit version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
