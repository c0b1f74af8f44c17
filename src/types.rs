// Copyright (c) 2025 Chetan Conikee <conikee@gmail.com>
// Licensed under the MIT License

//! Core types for documentation and implementation drift records.
//!
//! This module defines the fundamental data types used throughout the
//! specdrift engine: parsed documentation records, scanned test-function
//! records, coverage and drift findings, and the aggregate report consumed
//! by the emitter. Every record is owned by the single analysis pass that
//! created it and is never mutated after construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Documentation-defined identifier such as `TC-CORE-001` or `FT-API-002`.
pub type IdentifierTag = String;

/// Lifecycle state of a documented test case or feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Checklist entry marked `[x]`.
    Completed,
    /// Checklist entry marked `[~]` or left blank.
    Pending,
}

impl LifecycleState {
    /// Maps a checklist mark character to a lifecycle state.
    ///
    /// `x` means completed; `~` and blank both mean pending.
    #[must_use]
    pub fn from_mark(mark: &str) -> Self {
        match mark.trim() {
            "x" | "X" => Self::Completed,
            _ => Self::Pending,
        }
    }

    /// Gets the string name for this state.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
        }
    }
}

/// A test case parsed from checklist documentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseRecord {
    /// Documentation identifier, e.g. `TC-CORE-001`.
    pub id: IdentifierTag,
    /// Human-readable title.
    pub title: String,
    /// Lifecycle state derived from the checklist mark.
    pub state: LifecycleState,
    /// Execution-type label, e.g. `Automated` or `Manual`.
    pub execution_type: String,
    /// Priority label, e.g. `High`.
    pub priority: String,
    /// Whether this entry was indented under another entry.
    pub is_sub_item: bool,
    /// Identifier of the owning top-level entry, when a sub-item.
    pub parent_id: Option<IdentifierTag>,
}

/// A feature parsed from checklist documentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Documentation identifier, e.g. `FT-API-001`.
    pub id: IdentifierTag,
    /// Human-readable title.
    pub title: String,
    /// Free-form description text.
    pub description: String,
    /// Acceptance-criteria text.
    pub criteria: String,
    /// Lifecycle state derived from the checklist mark.
    pub state: LifecycleState,
    /// Whether this entry was indented under another entry.
    pub is_sub_item: bool,
    /// Identifier of the owning top-level entry, when a sub-item.
    pub parent_id: Option<IdentifierTag>,
    /// Test-case identifiers referenced near this feature in the raw text.
    pub test_case_ids: Vec<IdentifierTag>,
}

/// How a test construct is declared in its language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructKind {
    /// A method nested inside a test-container class.
    ClassMethod,
    /// A standalone prefix-named test function.
    Standalone,
    /// A call expression declaring a test with a string-literal name.
    CallExpression,
    /// A function marked by an annotation or attribute.
    Annotated,
}

impl ConstructKind {
    /// Gets the string name for this construct kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ClassMethod => "class_method",
            Self::Standalone => "standalone",
            Self::CallExpression => "call_expression",
            Self::Annotated => "annotated",
        }
    }
}

/// A test function or test case discovered in an implementation file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFunctionRecord {
    /// The file the construct was found in.
    pub file: PathBuf,
    /// Bare function, method, or literal test name.
    pub name: String,
    /// Fully-qualified name, e.g. `TestPayments.test_refund` or
    /// `checkout > accepts coupons`.
    pub qualified_name: String,
    /// How the construct is declared.
    pub kind: ConstructKind,
    /// Owning class or suite, when nested.
    pub owner: Option<String>,
    /// Documentation identifiers found within the proximity window.
    ///
    /// May be empty: an implementation without any documentation tag.
    pub identifiers: BTreeSet<IdentifierTag>,
    /// 1-based line number of the construct, when computable.
    pub line: Option<usize>,
}

/// Kind of coverage gap detected between production code and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageIssueKind {
    /// No test file exists for the source file under any naming convention.
    MissingTestFile,
    /// A test file exists but no test matches the function by name.
    MissingTest,
    /// A function with no coverage signal at all.
    UntestedFunction,
    /// A test file whose source counterpart no longer exists.
    OrphanedTest,
}

/// Severity of a coverage gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageSeverity {
    /// Minor gap.
    Low,
    /// Moderate gap.
    Medium,
    /// Significant gap.
    High,
}

/// A production function lacking a discoverable or content-matching test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageIssue {
    /// Source file containing the function.
    pub file: PathBuf,
    /// Function or method name.
    pub function: String,
    /// 1-based line number of the function, when known.
    pub line: Option<usize>,
    /// The kind of gap.
    pub kind: CoverageIssueKind,
    /// How urgent the gap is.
    pub severity: CoverageSeverity,
}

/// Cross-reference between one feature and the test cases it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureTestMapping {
    /// Feature identifier.
    pub feature_id: IdentifierTag,
    /// Feature title.
    pub feature_title: String,
    /// Referenced test-case ids that exist in the parsed test-case set.
    pub matched_test_case_ids: Vec<IdentifierTag>,
    /// Referenced test-case ids that are not declared anywhere.
    pub missing_test_case_ids: Vec<IdentifierTag>,
    /// Human-readable mapping problems for this feature.
    pub issues: Vec<String>,
}

/// Severity of a generic drift finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftSeverity {
    /// Informational; no action strictly required.
    Info,
    /// Should be addressed soon.
    Warning,
    /// Needs immediate attention.
    Critical,
}

impl DriftSeverity {
    /// Gets the numeric score for this severity level.
    #[must_use]
    pub fn score(&self) -> u8 {
        match self {
            Self::Info => 1,
            Self::Warning => 2,
            Self::Critical => 3,
        }
    }

    /// Gets the string name for this severity level.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    /// Gets the emoji representation for this severity level.
    #[must_use]
    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Info => "🟢",
            Self::Warning => "🟡",
            Self::Critical => "🚨",
        }
    }
}

/// A generic drift finding produced by a heuristic strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftIssue {
    /// Strategy that produced the finding, e.g. `identifier_prefix`.
    pub strategy: String,
    /// Finding category within the strategy, e.g. `doc_only_identifier`.
    pub drift_type: String,
    /// How urgently the finding should be addressed.
    pub severity: DriftSeverity,
    /// Human-readable description.
    pub description: String,
    /// Where the drift was observed (file, document, or config key).
    pub location: String,
    /// What the documentation or configuration declares.
    pub expected: String,
    /// What the code or file tree actually contains.
    pub actual: String,
    /// Suggested remediation.
    pub suggestion: String,
    /// File the finding anchors to, when applicable.
    pub file: Option<PathBuf>,
    /// 1-based line number, when applicable.
    pub line: Option<usize>,
}

/// Aggregate counts and context attached to every report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// When the report was generated.
    pub generated_at: Option<DateTime<Utc>>,
    /// Project root the analysis ran against.
    pub project_root: PathBuf,
    /// Total documented test cases.
    pub total_test_cases: usize,
    /// Total documented features.
    pub total_features: usize,
    /// Total scanned test functions.
    pub total_test_functions: usize,
    /// Total production functions considered for coverage.
    pub total_source_functions: usize,
    /// Languages observed during scanning.
    pub detected_languages: BTreeSet<String>,
    /// Percentage of production functions with a matching test, when the
    /// coverage analyzer ran.
    pub coverage_percent: Option<f64>,
    /// Issue counts keyed by severity name, populated in `all` mode.
    pub issue_counts_by_severity: BTreeMap<String, usize>,
    /// Files skipped because they could not be read.
    pub unreadable_files: usize,
    /// Whether scanning was restricted to a version-control changeset.
    pub incremental: bool,
}

/// The aggregate result of one analysis invocation.
///
/// Constructed once per run, consumed immediately by the report emitter,
/// and discarded. Collections a mode does not populate stay empty, so field
/// names are stable per mode and reports can be diffed across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    /// The analysis mode that produced this report.
    pub mode: String,
    /// Aggregate counts and context.
    pub metadata: ReportMetadata,
    /// Documented test cases with no tagged implementation.
    pub unimplemented_test_cases: Vec<TestCaseRecord>,
    /// Identifiers found in code but never declared in documentation.
    pub orphaned_ids: Vec<IdentifierTag>,
    /// Test functions carrying no documentation identifier at all.
    pub untagged_implementations: Vec<TestFunctionRecord>,
    /// Per-feature test-case cross-references.
    pub feature_mappings: Vec<FeatureTestMapping>,
    /// Features with no referencing test anywhere in the tree.
    pub features_without_tests: Vec<IdentifierTag>,
    /// Qualified test names with no feature reference in their file.
    pub tests_without_feature_reference: Vec<String>,
    /// Feature identifiers found in code but never declared.
    pub orphaned_feature_ids: Vec<IdentifierTag>,
    /// Coverage gaps between production code and tests.
    pub coverage_issues: Vec<CoverageIssue>,
    /// Findings from the comprehensive heuristic strategies.
    pub drift_issues: Vec<DriftIssue>,
}

impl DriftReport {
    /// Creates an empty report for the given mode.
    #[must_use]
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            ..Self::default()
        }
    }

    /// Total findings across every collection.
    #[must_use]
    pub fn total_findings(&self) -> usize {
        self.unimplemented_test_cases.len()
            + self.orphaned_ids.len()
            + self.untagged_implementations.len()
            + self.features_without_tests.len()
            + self.tests_without_feature_reference.len()
            + self.orphaned_feature_ids.len()
            + self.coverage_issues.len()
            + self.drift_issues.len()
    }
}
