// Copyright (c) 2025 Chetan Conikee <conikee@gmail.com>
// Licensed under the MIT License

//! Report serialization and severity classification.
//!
//! The emitter writes the aggregate report as a stable-field JSON document
//! to an explicit output location, and derives the 0/1/2 severity value
//! that becomes the process exit code. Output paths are configuration, not
//! ambient state: callers construct an [`OutputLocationConfig`] instead of
//! relying on process-wide directories.

use crate::error::{DriftError, Result};
use crate::types::DriftReport;
use std::path::PathBuf;
use tracing::info;

/// Default report file name, relative to the project root.
pub const DEFAULT_REPORT_FILE: &str = "specdrift-report.json";

/// Explicit output locations for one analysis run.
#[derive(Debug, Clone)]
pub struct OutputLocationConfig {
    /// Where the JSON report document is written.
    pub report_path: PathBuf,
}

impl OutputLocationConfig {
    /// Output configuration rooted at the given project directory.
    #[must_use]
    pub fn rooted_at(root: &std::path::Path) -> Self {
        Self {
            report_path: root.join(DEFAULT_REPORT_FILE),
        }
    }
}

/// Serializes drift reports to their configured location.
pub struct ReportEmitter {
    output: OutputLocationConfig,
}

impl ReportEmitter {
    /// Creates an emitter for the given output configuration.
    #[must_use]
    pub fn new(output: OutputLocationConfig) -> Self {
        Self { output }
    }

    /// Writes the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be
    /// written.
    pub fn emit(&self, report: &DriftReport) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(&self.output.report_path, json)
            .map_err(|e| DriftError::file_access(&self.output.report_path, e))?;
        info!("Report written to {}", self.output.report_path.display());
        Ok(self.output.report_path.clone())
    }

    /// Reloads a previously emitted report.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn reload(&self) -> Result<DriftReport> {
        let content = std::fs::read_to_string(&self.output.report_path)
            .map_err(|e| DriftError::file_access(&self.output.report_path, e))?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Derives the 0/1/2 severity classification for a report.
///
/// Per mode: `tc-mapping` ranks the ratio of unimplemented and untagged
/// entries to everything known; `code-coverage` ranks the coverage
/// percentage; `feature-impl` and `ft-mapping` rank issue counts; the
/// combined modes take the maximum of their parts.
#[must_use]
pub fn severity(report: &DriftReport) -> u8 {
    match report.mode.as_str() {
        "tc-mapping" => tc_mapping_severity(report),
        "code-coverage" => coverage_severity(report),
        "feature-impl" => feature_impl_severity(report),
        "ft-mapping" => ft_mapping_severity(report),
        "ft-tc-mapping" => tc_mapping_severity(report).max(ft_mapping_severity(report)),
        "all" => tc_mapping_severity(report)
            .max(coverage_severity(report))
            .max(feature_impl_severity(report)),
        _ => 0,
    }
}

fn tc_mapping_severity(report: &DriftReport) -> u8 {
    let drifted = report.unimplemented_test_cases.len() + report.untagged_implementations.len();
    let known = report.metadata.total_test_cases + report.metadata.total_test_functions;
    if known == 0 {
        return 0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = drifted as f64 / known as f64;
    if ratio > 0.25 {
        2
    } else if ratio > 0.10 {
        1
    } else {
        0
    }
}

fn coverage_severity(report: &DriftReport) -> u8 {
    let Some(percent) = report.metadata.coverage_percent else {
        return 0;
    };
    if percent >= 80.0 {
        0
    } else if percent >= 60.0 {
        1
    } else {
        2
    }
}

fn feature_impl_severity(report: &DriftReport) -> u8 {
    let count = report.features_without_tests.len()
        + report.tests_without_feature_reference.len()
        + report.orphaned_feature_ids.len();
    issue_count_severity(count)
}

fn ft_mapping_severity(report: &DriftReport) -> u8 {
    let count: usize = report
        .feature_mappings
        .iter()
        .map(|mapping| mapping.issues.len())
        .sum();
    issue_count_severity(count)
}

fn issue_count_severity(count: usize) -> u8 {
    if count == 0 {
        0
    } else if count <= 3 {
        1
    } else {
        2
    }
}
