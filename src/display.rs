// Copyright (c) 2025 Chetan Conikee <conikee@gmail.com>
// Licensed under the MIT License

//! Terminal display formatting for drift reports.

#![allow(clippy::format_push_string)]
#![allow(clippy::unused_self)]

use crate::types::{DriftReport, DriftSeverity};
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use console::Term;

/// Maximum entries listed per finding section before truncation.
const MAX_LISTED: usize = 10;

/// Formatter for human-readable report summaries.
pub struct ReportSummaryFormatter {
    /// Whether to use colors in output.
    use_colors: bool,
}

impl Default for ReportSummaryFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportSummaryFormatter {
    /// Creates a formatter, detecting terminal color support.
    #[must_use]
    pub fn new() -> Self {
        Self {
            use_colors: Term::stdout().features().colors_supported(),
        }
    }

    /// Creates a formatter with explicit color settings.
    #[must_use]
    pub fn with_settings(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats the full report summary.
    #[must_use]
    pub fn format_report(&self, report: &DriftReport, severity: u8) -> String {
        let mut output = String::new();

        output.push_str(&self.format_header(report));
        output.push('\n');
        output.push_str(&self.format_metadata_table(report));
        output.push('\n');

        self.push_id_section(
            &mut output,
            "Unimplemented test cases",
            &report
                .unimplemented_test_cases
                .iter()
                .map(|record| format!("{} ({})", record.id, record.title))
                .collect::<Vec<_>>(),
        );
        self.push_id_section(&mut output, "Orphaned identifiers", &report.orphaned_ids);
        self.push_id_section(
            &mut output,
            "Untagged implementations",
            &report
                .untagged_implementations
                .iter()
                .map(|record| format!("{} ({})", record.qualified_name, record.file.display()))
                .collect::<Vec<_>>(),
        );
        self.push_id_section(
            &mut output,
            "Features without tests",
            &report.features_without_tests,
        );
        self.push_id_section(
            &mut output,
            "Orphaned feature identifiers",
            &report.orphaned_feature_ids,
        );

        let mapping_issues: Vec<String> = report
            .feature_mappings
            .iter()
            .flat_map(|mapping| mapping.issues.iter().cloned())
            .collect();
        self.push_id_section(&mut output, "Feature mapping issues", &mapping_issues);

        let coverage: Vec<String> = report
            .coverage_issues
            .iter()
            .map(|issue| {
                format!(
                    "{} in {} [{}]",
                    issue.function,
                    issue.file.display(),
                    match issue.kind {
                        crate::types::CoverageIssueKind::MissingTestFile => "missing test file",
                        crate::types::CoverageIssueKind::MissingTest => "missing test",
                        crate::types::CoverageIssueKind::UntestedFunction => "untested",
                        crate::types::CoverageIssueKind::OrphanedTest => "orphaned test",
                    }
                )
            })
            .collect();
        self.push_id_section(&mut output, "Coverage issues", &coverage);

        let drift: Vec<String> = report
            .drift_issues
            .iter()
            .map(|issue| {
                let line = issue
                    .line
                    .map(|line| format!(":{line}"))
                    .unwrap_or_default();
                format!(
                    "{} {} ({}{}): {}",
                    issue.severity.emoji(),
                    issue.drift_type,
                    issue.location,
                    line,
                    issue.description
                )
            })
            .collect();
        self.push_id_section(&mut output, "Heuristic findings", &drift);

        output.push_str(&self.format_verdict(report, severity));
        output
    }

    fn format_header(&self, report: &DriftReport) -> String {
        let title = format!("Drift Report — {} mode", report.mode);
        if self.use_colors {
            format!("{}", title.bold().cyan())
        } else {
            title
        }
    }

    fn format_metadata_table(&self, report: &DriftReport) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![Cell::new("Metric"), Cell::new("Value")]);

        table.add_row(vec![
            Cell::new("Test cases"),
            Cell::new(report.metadata.total_test_cases),
        ]);
        table.add_row(vec![
            Cell::new("Test functions"),
            Cell::new(report.metadata.total_test_functions),
        ]);
        if report.metadata.total_features > 0 {
            table.add_row(vec![
                Cell::new("Features"),
                Cell::new(report.metadata.total_features),
            ]);
        }
        if let Some(percent) = report.metadata.coverage_percent {
            table.add_row(vec![
                Cell::new("Coverage"),
                Cell::new(format!("{percent:.1}%")),
            ]);
        }
        if !report.metadata.detected_languages.is_empty() {
            table.add_row(vec![
                Cell::new("Languages"),
                Cell::new(
                    report
                        .metadata
                        .detected_languages
                        .iter()
                        .cloned()
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
            ]);
        }
        table.add_row(vec![
            Cell::new("Total findings"),
            Cell::new(report.total_findings()),
        ]);

        format!("{table}\n")
    }

    fn push_id_section(&self, output: &mut String, title: &str, entries: &[String]) {
        if entries.is_empty() {
            return;
        }

        let heading = format!("{} ({})", title, entries.len());
        if self.use_colors {
            output.push_str(&format!("{}\n", heading.bold()));
        } else {
            output.push_str(&format!("{heading}\n"));
        }

        for entry in entries.iter().take(MAX_LISTED) {
            output.push_str(&format!("  - {entry}\n"));
        }
        if entries.len() > MAX_LISTED {
            output.push_str(&format!("  ... and {} more\n", entries.len() - MAX_LISTED));
        }
        output.push('\n');
    }

    fn format_verdict(&self, report: &DriftReport, severity: u8) -> String {
        let (label, emoji) = match severity {
            0 => ("documentation and code are aligned", DriftSeverity::Info.emoji()),
            1 => ("moderate drift detected", DriftSeverity::Warning.emoji()),
            _ => ("severe drift detected", DriftSeverity::Critical.emoji()),
        };
        let line = format!(
            "{} {} ({} findings, severity {})",
            emoji,
            label,
            report.total_findings(),
            severity
        );

        if !self.use_colors {
            return line;
        }
        match severity {
            0 => format!("{}", line.green()),
            1 => format!("{}", line.yellow()),
            _ => format!("{}", line.red()),
        }
    }
}
