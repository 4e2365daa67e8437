//! jsonnetunit - run Jsonnet spec files and JSON-Schema suites
//!
//! ## Modes
//!
//! - default: discover spec files from the positional glob patterns and run
//!   each through the spec harness (or `--validate <entry>`), stopping at the
//!   first unexpected failure
//! - `--suite <name>`: run JSON-Schema-Test-Suite cases through
//!   `validateBySchema`, reporting every case

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use jsonnetunit_core::{
    discover, init_tracing, CommandEvaluator, Evaluator, Harness, HarnessConfig,
    JrsonnetEvaluator, NativeRegistry, Reporter, RunMode, RunReport, RunSpan, SuiteLoader,
    TestRunner, DEFAULT_TEST_SUFFIX, DEFAULT_VALIDATOR,
};
use jsonnetunit_fetch::{DiskCache, HttpTransport, LocalFixtures, RemoteFetcher, Transport};
use tracing::{info, warn, Level};

#[derive(Parser, Debug)]
#[command(name = "jsonnetunit")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run Jsonnet validation specs with host capabilities", long_about = None)]
struct Cli {
    /// Glob patterns selecting test files (default: every test file in the working directory)
    patterns: Vec<String>,

    /// File-name suffix that marks a test file
    #[arg(long, default_value = DEFAULT_TEST_SUFFIX)]
    suffix: String,

    /// Wrap each file in `t.validate(...)` from this entry module instead of the spec harness
    #[arg(long, value_name = "ENTRY")]
    validate: Option<String>,

    /// JSON-Schema-Test-Suite file to run (e.g. draft2020-12/type.json); repeatable
    #[arg(long = "suite", value_name = "NAME")]
    suites: Vec<String>,

    /// Module providing validateBySchema for suite runs
    #[arg(long, default_value = DEFAULT_VALIDATOR)]
    validator: String,

    /// Library search path for the evaluator; repeatable
    #[arg(short = 'J', long = "jpath", value_name = "DIR")]
    jpaths: Vec<PathBuf>,

    /// Evaluate with this external Jsonnet executable instead of in process
    /// (host functions are not available to it)
    #[arg(long, env = "JSONNETUNIT_JSONNET")]
    jsonnet: Option<String>,

    /// Fetch cache directory
    #[arg(long, env = "JSONNETUNIT_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Local suite mirror directory
    #[arg(long, env = "JSONNETUNIT_SUITES_DIR")]
    suites_dir: Option<PathBuf>,

    /// Directory serving http://localhost:1234/ URLs
    #[arg(long, env = "JSONNETUNIT_FIXTURES_DIR")]
    fixtures_dir: Option<PathBuf>,

    /// Write a JSON run report to this path
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn config(&self, cwd: &Path) -> HarnessConfig {
        let mut config = HarnessConfig::from_env().with_test_suffix(&self.suffix);
        if let Some(bin) = &self.jsonnet {
            config = config.with_jsonnet_bin(bin);
        }
        if let Some(dir) = &self.cache_dir {
            config = config.with_cache_dir(dir);
        }
        if let Some(dir) = &self.suites_dir {
            config = config.with_suites_dir(dir);
        }
        if let Some(dir) = &self.fixtures_dir {
            config = config.with_fixtures_dir(dir);
        }
        for dir in &self.jpaths {
            config = config.with_jpath(dir);
        }
        config.rooted_at(cwd)
    }

    fn harness(&self) -> Harness {
        match &self.validate {
            Some(entry) => Harness::validate(entry),
            None => Harness::Spec,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    let code = finish(run(&cli), &mut std::io::stdout());
    std::process::exit(code);
}

/// Exit status for a finished run; a harness error is printed to `out`.
fn finish(result: Result<i32>, out: &mut impl Write) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            let _ = writeln!(out, "{e:#}");
            let _ = out.flush();
            1
        }
    }
}

fn evaluator(config: &HarnessConfig) -> Box<dyn Evaluator> {
    let jpaths = config.jpaths.iter().cloned();
    match &config.jsonnet_bin {
        Some(bin) => {
            warn!(program = %bin, "external evaluator: std.native calls will fail");
            Box::new(CommandEvaluator::new(bin).with_jpaths(jpaths))
        }
        None => Box::new(JrsonnetEvaluator::new().with_jpaths(jpaths)),
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let config = cli.config(&cwd);

    let transport: Arc<dyn Transport> = Arc::new(
        HttpTransport::new(config.fetch_timeout()).context("Failed to create HTTP client")?,
    );
    let fetcher = RemoteFetcher::new(
        DiskCache::new(&config.cache_dir),
        LocalFixtures::new(&config.loopback_prefix, &config.fixtures_dir),
        transport.clone(),
    );
    let natives = NativeRegistry::standard(Arc::new(fetcher));
    let runner = TestRunner::new(evaluator(&config), natives);

    let mut report = RunReport::new();
    let mode = if cli.suites.is_empty() {
        RunMode::Files
    } else {
        RunMode::Suites
    };
    let _span = RunSpan::enter(report.run_id, mode);
    let mut reporter = Reporter::new(std::io::stdout().lock());

    match mode {
        RunMode::Files => {
            let files = discover(&cwd, &cli.patterns, &config.test_suffix)
                .context("Failed to discover test files")?;
            info!(count = files.len(), "discovered test files");

            runner.run_files(&cli.harness(), &cwd, &files, &mut reporter, &mut report)?;
            reporter.flush()?;
        }
        RunMode::Suites => {
            let loader = SuiteLoader::new(&config.suites_dir, &config.suite_base_url, transport);
            for name in &cli.suites {
                let suites = loader
                    .load(name)
                    .with_context(|| format!("Failed to load suite {name}"))?;
                info!(suite = %name, groups = suites.len(), "running suite");
                runner.run_suites(&cli.validator, &suites, &mut reporter, &mut report)?;
            }
            reporter.summary(&report)?;
        }
    }

    if let Some(path) = &cli.report {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write report to {:?}", path))?;
    }

    info!(
        passed = report.passed(),
        failed = report.failed(),
        "run finished"
    );
    Ok(report.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["jsonnetunit"]);
        assert!(cli.patterns.is_empty());
        assert!(cli.suites.is_empty());
        assert_eq!(cli.suffix, ".spec.libsonnet");
        assert_eq!(cli.validator, "validator.libsonnet");
        assert_eq!(cli.harness(), Harness::Spec);
    }

    #[test]
    fn test_cli_patterns_and_validate() {
        let cli = Cli::parse_from([
            "jsonnetunit",
            "fixtures/*.jsonnet",
            "extra/*.jsonnet",
            "--suffix",
            ".jsonnet",
            "--validate",
            "t.libsonnet",
            "-J",
            "..",
        ]);
        assert_eq!(cli.patterns, vec!["fixtures/*.jsonnet", "extra/*.jsonnet"]);
        assert_eq!(cli.harness(), Harness::validate("t.libsonnet"));
        assert_eq!(cli.jpaths, vec![PathBuf::from("..")]);
    }

    #[test]
    fn test_cli_config_overrides_are_rooted() {
        let cli = Cli::parse_from([
            "jsonnetunit",
            "--suite",
            "draft2020-12/type.json",
            "--cache-dir",
            "cache",
            "--suites-dir",
            "/abs/suites",
        ]);
        let config = cli.config(Path::new("/work"));
        assert_eq!(cli.suites, vec!["draft2020-12/type.json"]);
        assert_eq!(config.cache_dir, PathBuf::from("/work/cache"));
        assert_eq!(config.suites_dir, PathBuf::from("/abs/suites"));
    }

    #[test]
    fn test_harness_error_goes_to_stdout_with_failure_status() {
        let mut out = Vec::new();
        let err = anyhow::anyhow!("invalid suite name: \"../x\"").context("Failed to load suite ../x");
        assert_eq!(finish(Err(err), &mut out), 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Failed to load suite ../x: invalid suite name: \"../x\"\n"
        );

        let mut out = Vec::new();
        assert_eq!(finish(Ok(0), &mut out), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_default_evaluator_reaches_host_functions() {
        let mut config = HarnessConfig::default();
        config.jsonnet_bin = None;

        let mut natives = NativeRegistry::new();
        natives.register(jsonnetunit_core::NativeFunction::new(
            "regexMatch",
            &["regex", "str"],
            |_| Ok(serde_json::Value::Bool(true)),
        ));

        let output = evaluator(&config)
            .evaluate("x.jsonnet", "std.native('regexMatch')('a', 'a')", &natives)
            .unwrap();
        assert_eq!(output.trim(), "true");
    }
}
