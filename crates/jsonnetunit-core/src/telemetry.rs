//! Log setup for the `jsonnetunit` binary.
//!
//! Stdout carries only the run transcript, so every layer writes to stderr.

use tracing::span::EnteredSpan;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

/// Install the process-wide subscriber, plain text or JSON lines.
///
/// `RUST_LOG` wins over `level`. Returns `false` if a subscriber was already
/// installed, in which case nothing changes.
pub fn init_tracing(json: bool, level: Level) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let text = (!json).then(|| fmt::layer().with_target(false).with_writer(std::io::stderr));
    let lines = json.then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(lines)
        .try_init()
        .is_ok()
}

/// Which harness mode a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Files,
    Suites,
}

impl RunMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Files => "files",
            RunMode::Suites => "suites",
        }
    }
}

/// Keeps the `jsonnetunit.run` span entered; every event logged while it is
/// alive carries the run id and mode.
pub struct RunSpan {
    _entered: EnteredSpan,
}

impl RunSpan {
    pub fn enter(run_id: Uuid, mode: RunMode) -> Self {
        let span = tracing::info_span!("jsonnetunit.run", run_id = %run_id, mode = mode.as_str());
        Self {
            _entered: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_install_is_refused() {
        init_tracing(false, Level::INFO);
        assert!(!init_tracing(true, Level::DEBUG));
    }

    #[test]
    fn test_run_mode_names() {
        assert_eq!(RunMode::Files.as_str(), "files");
        assert_eq!(RunMode::Suites.as_str(), "suites");
        let _span = RunSpan::enter(Uuid::new_v4(), RunMode::Suites);
    }
}
