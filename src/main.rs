// Copyright (c) 2025 Chetan Conikee <conikee@gmail.com>
// Licensed under the MIT License

//! Specdrift CLI - documentation drift detection for identifier-tagged specs.

use clap::Parser;
use specdrift::modes::resolve_change_set;
use specdrift::{
    severity, AnalysisMode, DriftAnalyzer, OutputLocationConfig, ReportEmitter,
    ReportSummaryFormatter,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use tracing::{error, info, Level};
use tracing_subscriber::fmt;

/// Exit code for hard failures before any report is produced. Severity
/// values 0, 1, and 2 are reserved for completed runs.
const EXIT_HARD_FAILURE: u8 = 3;

/// Specdrift CLI - find where specs and code silently diverge.
#[derive(Parser)]
#[command(
    name = "specdrift",
    version = env!("CARGO_PKG_VERSION"),
    author = "Chetan Conikee <conikee@gmail.com>",
    about = "Detect drift between identifier-tagged documentation and multi-language code"
)]
struct Cli {
    /// Analysis mode: tc-mapping, ft-mapping, ft-tc-mapping,
    /// code-coverage, feature-impl, or all
    mode: String,

    /// Project root to analyze
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Override the test-case documentation file (relative to the root)
    #[arg(long)]
    docs: Option<PathBuf>,

    /// Report output path (defaults to specdrift-report.json in the root)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Suppress the terminal summary
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Restrict scanning to working-tree and staged changes
    #[arg(long)]
    changed_only: bool,

    /// Restrict scanning to files changed since a git ref
    #[arg(long, value_name = "REF")]
    changed_since: Option<String>,

    /// Restrict scanning to the diff against a base branch
    #[arg(long, value_name = "BRANCH")]
    pr_diff: Option<String>,

    /// Restrict scanning to files touched in the last N days
    #[arg(long, value_name = "N")]
    recent_days: Option<u32>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };
    fmt().with_max_level(log_level).with_target(false).init();

    match run(&cli) {
        Ok(severity_value) => ExitCode::from(severity_value),
        Err(e) => {
            error!("{}", e);
            ExitCode::from(EXIT_HARD_FAILURE)
        }
    }
}

fn run(cli: &Cli) -> specdrift::Result<u8> {
    let root = expand_path(cli.root.clone());
    let mode = AnalysisMode::from_str(&cli.mode)?;

    let change_set = resolve_change_set(
        &root,
        cli.changed_only,
        cli.changed_since.as_deref(),
        cli.pr_diff.as_deref(),
        cli.recent_days,
    );

    let mut analyzer = DriftAnalyzer::new(&root);
    if let Some(docs) = &cli.docs {
        analyzer = analyzer.with_docs_override(docs);
    }

    let report = analyzer.analyze(mode, change_set.as_ref())?;
    let severity_value = severity(&report);

    let output = match &cli.output {
        Some(path) => OutputLocationConfig {
            report_path: expand_path(path.clone()),
        },
        None => OutputLocationConfig::rooted_at(&root),
    };
    let emitter = ReportEmitter::new(output);
    let report_path = emitter.emit(&report)?;

    if !cli.quiet {
        let formatter = ReportSummaryFormatter::new();
        println!("{}", formatter.format_report(&report, severity_value));
    }

    info!(
        "Analysis complete: severity {} ({} findings, report at {})",
        severity_value,
        report.total_findings(),
        report_path.display()
    );

    Ok(severity_value)
}

/// Expands ~ in file paths to the home directory.
fn expand_path(path: PathBuf) -> PathBuf {
    let Some(path_str) = path.to_str() else {
        return path;
    };
    if let Some(stripped) = path_str.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path
}
