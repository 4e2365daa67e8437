//! Harness configuration
//!
//! Defaults come from `JSONNETUNIT_*` environment variables, falling back to
//! the conventional layout relative to the working directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use jsonnetunit_fetch::{DEFAULT_FIXTURES_DIR, LOOPBACK_PREFIX};
use serde::{Deserialize, Serialize};

/// Upstream JSON-Schema-Test-Suite test directory.
pub const DEFAULT_SUITE_URL: &str =
    "https://raw.githubusercontent.com/json-schema-org/JSON-Schema-Test-Suite/master/tests/";

/// Suffix that marks a file as a spec file.
pub const DEFAULT_TEST_SUFFIX: &str = ".spec.libsonnet";

/// Harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Directory holding cached fetches
    pub cache_dir: PathBuf,
    /// Local mirror of downloaded suites
    pub suites_dir: PathBuf,
    /// Suite repository base URL; suite names are appended verbatim
    pub suite_base_url: String,
    /// Directory serving URLs under `loopback_prefix`
    pub fixtures_dir: PathBuf,
    /// URL prefix redirected to `fixtures_dir`
    pub loopback_prefix: String,
    /// External Jsonnet executable; `None` evaluates in process
    pub jsonnet_bin: Option<String>,
    /// Library search paths handed to the evaluator
    pub jpaths: Vec<PathBuf>,
    /// File-name suffix of test files
    pub test_suffix: String,
    /// Per-request deadline for live fetches (seconds)
    pub fetch_timeout_secs: Option<u64>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            cache_dir: env_path("JSONNETUNIT_CACHE_DIR", ".cache"),
            suites_dir: env_path("JSONNETUNIT_SUITES_DIR", "suites"),
            suite_base_url: std::env::var("JSONNETUNIT_SUITE_URL")
                .unwrap_or_else(|_| DEFAULT_SUITE_URL.to_string()),
            fixtures_dir: env_path("JSONNETUNIT_FIXTURES_DIR", DEFAULT_FIXTURES_DIR),
            loopback_prefix: LOOPBACK_PREFIX.to_string(),
            jsonnet_bin: std::env::var("JSONNETUNIT_JSONNET").ok(),
            jpaths: Vec::new(),
            test_suffix: DEFAULT_TEST_SUFFIX.to_string(),
            fetch_timeout_secs: std::env::var("JSONNETUNIT_FETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }
}

impl HarnessConfig {
    /// Create a config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Re-root every relative directory at `root`.
    pub fn rooted_at(mut self, root: &Path) -> Self {
        self.cache_dir = root.join(&self.cache_dir);
        self.suites_dir = root.join(&self.suites_dir);
        self.fixtures_dir = root.join(&self.fixtures_dir);
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_suites_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.suites_dir = dir.into();
        self
    }

    pub fn with_fixtures_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fixtures_dir = dir.into();
        self
    }

    pub fn with_jsonnet_bin(mut self, bin: &str) -> Self {
        self.jsonnet_bin = Some(bin.to_string());
        self
    }

    pub fn with_jpath(mut self, dir: impl Into<PathBuf>) -> Self {
        self.jpaths.push(dir.into());
        self
    }

    pub fn with_test_suffix(mut self, suffix: &str) -> Self {
        self.test_suffix = suffix.to_string();
        self
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }
}

fn env_path(var: &str, default: &str) -> PathBuf {
    std::env::var_os(var)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_is_populated() {
        let config = HarnessConfig::default();
        assert!(!config.cache_dir.as_os_str().is_empty());
        assert!(!config.suites_dir.as_os_str().is_empty());
        assert!(config.suite_base_url.ends_with('/'));
        assert_eq!(config.loopback_prefix, "http://localhost:1234/");
        assert_eq!(config.test_suffix, ".spec.libsonnet");
    }

    #[test]
    fn test_config_builders() {
        let config = HarnessConfig::default()
            .with_cache_dir("/tmp/c")
            .with_suites_dir("/tmp/s")
            .with_jsonnet_bin("go-jsonnet")
            .with_jpath("lib")
            .with_jpath("vendor")
            .with_test_suffix(".jsonnet");
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/c"));
        assert_eq!(config.suites_dir, PathBuf::from("/tmp/s"));
        assert_eq!(config.jsonnet_bin.as_deref(), Some("go-jsonnet"));
        assert_eq!(config.jpaths.len(), 2);
        assert_eq!(config.test_suffix, ".jsonnet");
    }

    #[test]
    fn test_rooted_at_keeps_absolute_dirs() {
        let config = HarnessConfig::default()
            .with_cache_dir("/abs/cache")
            .with_suites_dir("suites")
            .rooted_at(Path::new("/work"));
        assert_eq!(config.cache_dir, PathBuf::from("/abs/cache"));
        assert_eq!(config.suites_dir, PathBuf::from("/work/suites"));
    }

    #[test]
    fn test_fetch_timeout() {
        let mut config = HarnessConfig::default();
        config.fetch_timeout_secs = Some(30);
        assert_eq!(config.fetch_timeout(), Some(Duration::from_secs(30)));
    }
}
