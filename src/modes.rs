// Copyright (c) 2025 Chetan Conikee <conikee@gmail.com>
// Licensed under the MIT License

//! Multi-mode analysis dispatch.
//!
//! Each mode is a pure dispatch over the documentation parsers, the
//! implementation scanner, and the drift analyzers; `all` merges every
//! sub-report into one. An unrecognized mode string is a hard, immediate
//! failure with no partial report. Targeted modes are strict about their
//! documentation file; the combined `all` sweep degrades to empty record
//! sets with a warning instead.

use crate::changeset;
use crate::comprehensive::ComprehensiveDriftDetector;
use crate::coverage::CoverageAnalyzer;
use crate::docs::DocumentationParser;
use crate::error::{DriftError, Result};
use crate::ft_drift;
use crate::languages::LanguageRuleRegistry;
use crate::patterns::PatternConfig;
use crate::scanner::{ImplementationScanner, ScanOutcome};
use crate::search::SemanticSearch;
use crate::tc_drift;
use crate::types::{DriftReport, FeatureRecord, TestCaseRecord};
use chrono::Utc;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// The analysis modes the engine dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Test-case ↔ implementation mapping.
    TcMapping,
    /// Feature ↔ test-case documentation cross-reference.
    FtMapping,
    /// Both test-case and feature analyzers combined.
    FtTcMapping,
    /// Production-code coverage analysis.
    CodeCoverage,
    /// Feature ↔ implementation mapping.
    FeatureImpl,
    /// Every analyzer plus the comprehensive heuristics.
    All,
}

impl AnalysisMode {
    /// The stable mode tag used in reports and on the command line.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TcMapping => "tc-mapping",
            Self::FtMapping => "ft-mapping",
            Self::FtTcMapping => "ft-tc-mapping",
            Self::CodeCoverage => "code-coverage",
            Self::FeatureImpl => "feature-impl",
            Self::All => "all",
        }
    }
}

impl FromStr for AnalysisMode {
    type Err = DriftError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "tc-mapping" => Ok(Self::TcMapping),
            "ft-mapping" => Ok(Self::FtMapping),
            "ft-tc-mapping" => Ok(Self::FtTcMapping),
            "code-coverage" => Ok(Self::CodeCoverage),
            "feature-impl" => Ok(Self::FeatureImpl),
            "all" => Ok(Self::All),
            other => Err(DriftError::unknown_mode(other)),
        }
    }
}

/// The single caller-facing entry point for drift analysis.
///
/// Owns the loaded pattern configuration and language rules for the
/// lifetime of a run; a single instance is not safe for concurrent use.
pub struct DriftAnalyzer {
    root: PathBuf,
    patterns: PatternConfig,
    registry: LanguageRuleRegistry,
    docs_override: Option<PathBuf>,
    semantic_search: Option<Box<dyn SemanticSearch>>,
}

impl DriftAnalyzer {
    /// Creates an analyzer over the given project root, loading pattern
    /// configuration from it.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let patterns = PatternConfig::load(&root);
        Self {
            root,
            patterns,
            registry: LanguageRuleRegistry::new(),
            docs_override: None,
            semantic_search: None,
        }
    }

    /// Overrides the test-case documentation file location.
    #[must_use]
    pub fn with_docs_override(mut self, path: impl Into<PathBuf>) -> Self {
        self.docs_override = Some(path.into());
        self
    }

    /// Attaches an optional semantic-search collaborator.
    #[must_use]
    pub fn with_semantic_search(mut self, search: Box<dyn SemanticSearch>) -> Self {
        self.semantic_search = Some(search);
        self
    }

    /// The loaded pattern configuration.
    #[must_use]
    pub fn patterns(&self) -> &PatternConfig {
        &self.patterns
    }

    /// Runs one analysis pass and returns the aggregate report.
    ///
    /// # Errors
    ///
    /// Fails only on a missing documentation file required by the mode;
    /// everything else degrades with warnings.
    pub fn analyze(
        &self,
        mode: AnalysisMode,
        change_set: Option<&HashSet<PathBuf>>,
    ) -> Result<DriftReport> {
        info!("Running {} analysis on {}", mode.as_str(), self.root.display());

        let mut report = DriftReport::new(mode.as_str());
        report.metadata.generated_at = Some(Utc::now());
        report.metadata.project_root = self.root.clone();
        report.metadata.incremental = change_set.is_some();

        match mode {
            AnalysisMode::TcMapping => {
                let test_cases = self.load_test_cases(mode, true)?;
                let scan = self.run_scan(change_set);
                self.apply_tc_analysis(&mut report, &test_cases, &scan);
            }
            AnalysisMode::FtMapping => {
                let features = self.load_features(mode, true)?;
                let test_cases = self.load_test_cases(mode, false)?;
                self.apply_ft_mapping(&mut report, &features, &test_cases);
            }
            AnalysisMode::FtTcMapping => {
                let test_cases = self.load_test_cases(mode, true)?;
                let features = self.load_features(mode, true)?;
                let scan = self.run_scan(change_set);
                self.apply_tc_analysis(&mut report, &test_cases, &scan);
                self.apply_ft_mapping(&mut report, &features, &test_cases);
            }
            AnalysisMode::CodeCoverage => {
                let scan = self.run_scan(change_set);
                self.apply_coverage(&mut report, &scan, change_set);
            }
            AnalysisMode::FeatureImpl => {
                let features = self.load_features(mode, true)?;
                let scan = self.run_scan(change_set);
                self.apply_feature_impl(&mut report, &features, &scan);
            }
            AnalysisMode::All => {
                let test_cases = self.load_test_cases(mode, false)?;
                let features = self.load_features(mode, false)?;
                let scan = self.run_scan(change_set);

                self.apply_tc_analysis(&mut report, &test_cases, &scan);
                self.apply_ft_mapping(&mut report, &features, &test_cases);
                self.apply_feature_impl(&mut report, &features, &scan);
                self.apply_coverage(&mut report, &scan, change_set);

                let detector =
                    ComprehensiveDriftDetector::new(&self.root, &self.patterns, &self.registry);
                report.drift_issues = detector.detect(&scan.test_functions);

                // Issue counts by severity across every finding class.
                for issue in &report.drift_issues {
                    *report
                        .metadata
                        .issue_counts_by_severity
                        .entry(issue.severity.name().to_string())
                        .or_insert(0) += 1;
                }
                for issue in &report.coverage_issues {
                    let name = match issue.severity {
                        crate::types::CoverageSeverity::Low => "low",
                        crate::types::CoverageSeverity::Medium => "medium",
                        crate::types::CoverageSeverity::High => "high",
                    };
                    *report
                        .metadata
                        .issue_counts_by_severity
                        .entry(name.to_string())
                        .or_insert(0) += 1;
                }
            }
        }

        Ok(report)
    }

    /// Convenience wrapper: parses the mode string, then analyzes.
    ///
    /// # Errors
    ///
    /// Fails immediately on an unrecognized mode, producing no report.
    pub fn analyze_mode_str(
        &self,
        mode: &str,
        change_set: Option<&HashSet<PathBuf>>,
    ) -> Result<DriftReport> {
        let mode = AnalysisMode::from_str(mode)?;
        self.analyze(mode, change_set)
    }

    fn run_scan(&self, change_set: Option<&HashSet<PathBuf>>) -> ScanOutcome {
        let scanner = ImplementationScanner::new(&self.root, &self.registry, &self.patterns);
        let scanner = match self.semantic_search.as_deref() {
            Some(search) => scanner.with_semantic_search(search),
            None => scanner,
        };
        scanner.scan_all(change_set)
    }

    fn test_case_doc_path(&self) -> PathBuf {
        if let Some(path) = &self.docs_override {
            return path.clone();
        }
        self.patterns
            .primary_files("TC-")
            .first()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("docs/test-cases.md"))
    }

    fn feature_doc_path(&self) -> PathBuf {
        self.patterns
            .primary_files("FT-")
            .first()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("docs/features.md"))
    }

    fn load_test_cases(
        &self,
        mode: AnalysisMode,
        required: bool,
    ) -> Result<Vec<TestCaseRecord>> {
        let path = self.root.join(self.test_case_doc_path());
        match DocumentationParser::read_documentation(&path) {
            Some(text) => {
                let parser = DocumentationParser::new(&self.patterns);
                Ok(parser.parse_test_cases(&text))
            }
            None if required => Err(DriftError::missing_documentation(path, mode.as_str())),
            None => {
                warn!("Continuing without test-case documentation");
                Ok(Vec::new())
            }
        }
    }

    fn load_features(&self, mode: AnalysisMode, required: bool) -> Result<Vec<FeatureRecord>> {
        let path = self.root.join(self.feature_doc_path());
        match DocumentationParser::read_documentation(&path) {
            Some(text) => {
                let parser = DocumentationParser::new(&self.patterns);
                Ok(parser.parse_features(&text))
            }
            None if required => Err(DriftError::missing_documentation(path, mode.as_str())),
            None => {
                warn!("Continuing without feature documentation");
                Ok(Vec::new())
            }
        }
    }

    fn apply_tc_analysis(
        &self,
        report: &mut DriftReport,
        test_cases: &[TestCaseRecord],
        scan: &ScanOutcome,
    ) {
        let analysis = tc_drift::analyze(test_cases, &scan.test_functions);
        report.unimplemented_test_cases = analysis.unimplemented;
        report.orphaned_ids = analysis.orphaned_ids;
        report.untagged_implementations = analysis.untagged_implementations;

        report.metadata.total_test_cases = test_cases.len();
        report.metadata.total_test_functions = scan.test_functions.len();
        report.metadata.unreadable_files += scan.unreadable_files;
        report
            .metadata
            .detected_languages
            .extend(scan.detected_languages.iter().cloned());
    }

    fn apply_ft_mapping(
        &self,
        report: &mut DriftReport,
        features: &[FeatureRecord],
        test_cases: &[TestCaseRecord],
    ) {
        report.feature_mappings =
            ft_drift::cross_reference_feature_test_cases(features, test_cases, &self.patterns);
        report.metadata.total_features = features.len();
        report.metadata.total_test_cases = test_cases.len();
    }

    fn apply_feature_impl(
        &self,
        report: &mut DriftReport,
        features: &[FeatureRecord],
        scan: &ScanOutcome,
    ) {
        let analysis = ft_drift::map_features_to_tests(
            &self.root,
            features,
            &scan.test_functions,
            &self.patterns,
        );
        report.features_without_tests = analysis.features_without_tests;
        report.tests_without_feature_reference = analysis.tests_without_feature_reference;
        report.orphaned_feature_ids = analysis.orphaned_feature_ids;

        report.metadata.total_features = features.len();
        report.metadata.total_test_functions = scan.test_functions.len();
        report
            .metadata
            .detected_languages
            .extend(scan.detected_languages.iter().cloned());
    }

    fn apply_coverage(
        &self,
        report: &mut DriftReport,
        scan: &ScanOutcome,
        change_set: Option<&HashSet<PathBuf>>,
    ) {
        let analyzer = CoverageAnalyzer::new(&self.root, &self.registry);
        let outcome = analyzer.scan_coverage_issues(&scan.test_functions, change_set);

        report.metadata.total_source_functions = outcome.total_functions;
        report.metadata.coverage_percent = Some(outcome.coverage_percent());
        report.metadata.unreadable_files += outcome.unreadable_files;
        report.metadata.total_test_functions = scan.test_functions.len();
        report
            .metadata
            .detected_languages
            .extend(outcome.detected_languages.iter().cloned());
        report
            .metadata
            .detected_languages
            .extend(scan.detected_languages.iter().cloned());
        report.coverage_issues = outcome.issues;
    }
}

/// Resolves the incremental-scan flags into an optional changeset.
///
/// `None` means scan everything; an empty resolved set outside a
/// repository also degrades to `None` so incremental flags never silently
/// produce an empty report.
#[must_use]
pub fn resolve_change_set(
    root: &Path,
    changed_only: bool,
    changed_since: Option<&str>,
    pr_diff: Option<&str>,
    recent_days: Option<u32>,
) -> Option<HashSet<PathBuf>> {
    let resolver = changeset::ChangeSetResolver::new(root);

    let requested = changed_only || changed_since.is_some() || pr_diff.is_some() || recent_days.is_some();
    if !requested {
        return None;
    }
    if !resolver.is_repository() {
        warn!("Incremental scan requested outside version control, scanning everything");
        return None;
    }

    let mut set = HashSet::new();
    if changed_only {
        set.extend(resolver.changed_and_staged());
        set.extend(resolver.untracked());
    }
    if let Some(reference) = changed_since {
        set.extend(resolver.changed_since(reference));
    }
    if let Some(branch) = pr_diff {
        set.extend(resolver.changed_vs_base_branch(branch));
    }
    if let Some(days) = recent_days {
        set.extend(resolver.changed_in_last_n_days(days));
    }

    Some(set)
}
