// Copyright (c) 2025 Chetan Conikee <conikee@gmail.com>
// Licensed under the MIT License

//! Specdrift - documentation drift detection for identifier-tagged specs.
//!
//! This library keeps project documentation (feature specs, test-case
//! specs) and multi-language source code from silently diverging. It
//! parses identifier-tagged checklist entries, scans test and source
//! files across several languages for matching identifiers, and reports
//! where documentation and code disagree.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::struct_excessive_bools)]

pub mod changeset;
pub mod comprehensive;
pub mod coverage;
pub mod display;
pub mod docs;
pub mod error;
pub mod ft_drift;
pub mod languages;
pub mod modes;
pub mod patterns;
pub mod report;
pub mod scanner;
pub mod search;
pub mod tc_drift;
pub mod types;

// Re-export commonly used types
pub use display::ReportSummaryFormatter;
pub use error::{DriftError, Result};
pub use languages::{LanguageRule, LanguageRuleRegistry, SupportedLanguage};
pub use modes::{AnalysisMode, DriftAnalyzer};
pub use patterns::{IdentifierPatternConfig, PatternConfig};
pub use report::{severity, OutputLocationConfig, ReportEmitter};
pub use types::{
    CoverageIssue, CoverageIssueKind, CoverageSeverity, DriftIssue, DriftReport, DriftSeverity,
    FeatureRecord, FeatureTestMapping, LifecycleState, TestCaseRecord, TestFunctionRecord,
};
