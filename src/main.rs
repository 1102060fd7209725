//! qareport - containerized QA gate for Go services
//!
//! A CLI tool that runs Go quality tools inside a running container,
//! aggregates their results into a dated report and gates on them.
//!
//! Exit codes:
//!   0 - All quality gates passed
//!   1 - A quality gate failed, the container is unavailable, or a runtime error occurred

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod runner;

use analysis::{violations, AggregatorOptions, QaAggregator};
use anyhow::{Context, Result};
use chrono::Local;
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use models::{Report, ReportMetadata, Verdict};
use runner::{CommandRunner, Container, ProcessRunner};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("qareport v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_report(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("QA run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .qareport.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the container, runtime, timeout, and tools.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete QA workflow. Returns the process exit code.
async fn run_report(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let container = Container::new(&config.runner.runtime, &config.general.container)
        .with_workdir(config.runner.workdir.clone());
    let runner = ProcessRunner::new(Duration::from_secs(config.runner.timeout_seconds));

    if !args.quiet {
        println!("🐹 QA report for container: {}", container.name);
        println!("   Runtime: {}", container.runtime);
        println!("   Timeout: {}s per tool", runner.timeout().as_secs());
        if let Some(ref workdir) = container.workdir {
            println!("   Workdir: {}", workdir);
        }
        println!();
    }

    run_checks(&runner, &container, &config, &args).await
}

/// Preflight, run the tools, write the report and map the verdict to an
/// exit code. A container that is not running yields 1 and no report.
async fn run_checks<R: CommandRunner>(
    runner: &R,
    container: &Container,
    config: &Config,
    args: &Args,
) -> Result<i32> {
    let start_time = Instant::now();
    let generated_at = Local::now();

    let options = AggregatorOptions {
        fix: args.fix,
        tools: config.tools.clone(),
        show_progress: !args.quiet,
    };
    let aggregator = QaAggregator::new(runner, container, options);

    let metrics = match aggregator.run().await {
        Ok(metrics) => metrics,
        Err(e) => {
            error!("Preflight failed: {}", e);
            eprintln!("\n❌ {}", e);
            eprintln!(
                "   Start it first, e.g. `{} start {}`",
                container.runtime, container.name
            );
            return Ok(1);
        }
    };

    let metadata = ReportMetadata {
        container: container.name.clone(),
        runtime: container.runtime.clone(),
        generated_at,
        tool_timeout_seconds: config.runner.timeout_seconds,
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };
    let report = report::build_report(metadata, metrics);

    if !args.quiet {
        println!("\n📝 Generating report...");
    }
    let path = report::save_report(
        &report,
        Path::new(&config.general.output_dir),
        config.general.format,
        &config.report,
    )?;

    print_summary(&report);
    println!("\n📄 Report saved to: {}", path.display());

    Ok(report.verdict.exit_code())
}

/// Print the console summary with the verdict and any failing gates.
fn print_summary(report: &Report) {
    let m = &report.metrics;

    println!("\n📊 QA Summary:");
    println!(
        "   Lint: {} error(s), {} warning(s)",
        m.linter_errors, m.linter_warnings
    );
    println!(
        "   Tests: {} passed | {} failed | {} skipped",
        m.tests_passed, m.tests_failed, m.tests_skipped
    );
    println!("   Coverage: {:.1}%", m.coverage_percent);
    println!("   go vet: {} issue(s)", m.vet_issue_count());
    if m.staticcheck.status.ran() {
        println!("   staticcheck: {} issue(s)", m.staticcheck_issue_count());
    } else {
        println!("   staticcheck: {}", m.staticcheck.status.label());
    }
    println!("   Duration: {:.1}s", report.metadata.duration_seconds);

    let icon = match report.verdict {
        Verdict::Pass => "✅",
        Verdict::Fail => "❌",
    };
    println!("\n{} Verdict: {}", icon, report.verdict);
    for gate in violations(m) {
        eprintln!("   ⛔ {}", gate);
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use crate::runner::testing::ScriptedRunner;
    use crate::runner::CommandOutput;

    fn quiet_args() -> Args {
        Args::parse_from(["qareport", "--quiet"])
    }

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        config.general.output_dir = dir.join("qa-reports").display().to_string();
        config
    }

    #[tokio::test]
    async fn test_container_not_running_exits_one_without_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let container = Container::new("podman", "ocserv-agent-qa");
        let runner = ScriptedRunner::new()
            .on("ps --format", CommandOutput::new(0, "postgres\n", ""))
            .otherwise(CommandOutput::new(0, "", ""));

        let code = run_checks(&runner, &container, &config, &quiet_args())
            .await
            .unwrap();

        assert_eq!(code, 1);
        assert_eq!(runner.calls().len(), 1);
        assert!(!dir.path().join("qa-reports").exists());
    }

    #[tokio::test]
    async fn test_passing_run_exits_zero_and_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let container = Container::new("podman", "ocserv-agent-qa");
        let runner = ScriptedRunner::new()
            .on("ps --format", CommandOutput::new(0, "ocserv-agent-qa\n", ""))
            .on("go test", CommandOutput::new(0, "--- PASS: TestA (0.00s)\n", ""))
            .on(
                "go tool cover",
                CommandOutput::new(0, "total:\t(statements)\t91.0%\n", ""),
            )
            .otherwise(CommandOutput::new(0, "", ""));

        let code = run_checks(&runner, &container, &config, &quiet_args())
            .await
            .unwrap();

        assert_eq!(code, 0);
        let written: Vec<_> = std::fs::read_dir(dir.path().join("qa-reports"))
            .unwrap()
            .collect();
        assert_eq!(written.len(), 1);
    }

    #[tokio::test]
    async fn test_failing_gate_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let container = Container::new("podman", "ocserv-agent-qa");
        let runner = ScriptedRunner::new()
            .on("ps --format", CommandOutput::new(0, "ocserv-agent-qa\n", ""))
            .on(
                "go tool cover",
                CommandOutput::new(0, "total:\t(statements)\t79.9%\n", ""),
            )
            .otherwise(CommandOutput::new(0, "", ""));

        let code = run_checks(&runner, &container, &config, &quiet_args())
            .await
            .unwrap();

        assert_eq!(code, 1);
    }
}
