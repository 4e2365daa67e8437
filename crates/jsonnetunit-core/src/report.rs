//! Run reporting.
//!
//! `Reporter` streams the human-readable transcript to stdout as tests run;
//! `RunReport` accumulates the same outcomes for the exit code and an optional
//! JSON artifact.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::ExecutionOutcome;
use crate::error::Result;

/// One reported test: a file path or a `suite / case` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub id: String,
    pub outcome: ExecutionOutcome,
}

/// Ordered outcomes of one harness run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub run_at: DateTime<Utc>,
    pub entries: Vec<ReportEntry>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            run_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, id: impl Into<String>, outcome: ExecutionOutcome) {
        self.entries.push(ReportEntry {
            id: id.into(),
            outcome,
        });
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.outcome.is_unexpected_failure())
            .count()
    }

    pub fn passed(&self) -> usize {
        self.total() - self.failed()
    }

    pub fn has_unexpected_failure(&self) -> bool {
        self.failed() > 0
    }

    /// Process exit status: 0 when nothing failed unexpectedly, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.has_unexpected_failure() {
            1
        } else {
            0
        }
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Line-oriented transcript writer.
pub struct Reporter<W: Write> {
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// `=== RUN: <id>`
    pub fn run_started(&mut self, id: &str) -> Result<()> {
        writeln!(self.out, "=== RUN: {id}")?;
        Ok(())
    }

    /// One line per passed assertion, in evaluator order.
    pub fn assertions(&mut self, names: &[String]) -> Result<()> {
        for name in names {
            writeln!(self.out, "{name}")?;
        }
        Ok(())
    }

    /// Raw error text of a failure.
    pub fn failure(&mut self, detail: &str) -> Result<()> {
        writeln!(self.out, "{detail}")?;
        Ok(())
    }

    /// `--- PASS: <id>` or `--- FAIL: <id>: <detail>`
    pub fn case(&mut self, id: &str, outcome: &ExecutionOutcome) -> Result<()> {
        if outcome.is_unexpected_failure() {
            writeln!(self.out, "--- FAIL: {id}: {}", outcome.detail())?;
        } else {
            writeln!(self.out, "--- PASS: {id}")?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    /// Closing tally line.
    pub fn summary(&mut self, report: &RunReport) -> Result<()> {
        writeln!(
            self.out,
            "{} passed, {} failed",
            report.passed(),
            report.failed()
        )?;
        self.out.flush()?;
        Ok(())
    }
}
