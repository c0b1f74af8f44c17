// Copyright (c) 2025 Chetan Conikee <conikee@gmail.com>
// Licensed under the MIT License

//! Production-code coverage analysis.
//!
//! Scans production source files, extracts candidate public functions with
//! a per-language surface heuristic, and checks each for a
//! conventionally-named, content-matching test. Functions without a test
//! file rank high; functions whose test file exists but contains no
//! matching test name rank medium.

use crate::changeset::filter_by_change_set;
use crate::languages::{LanguageRuleRegistry, SupportedLanguage};
use crate::types::{CoverageIssue, CoverageIssueKind, CoverageSeverity, TestFunctionRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

static PYTHON_FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^def\s+(\w+)\s*\(").expect("python function pattern"));
static GO_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^func\s+(?:\([^)]*\)\s*)?([A-Za-z]\w*)\s*\(").expect("go function pattern")
});
static RUST_FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*pub\s+(?:async\s+)?fn\s+(\w+)").expect("rust function pattern"));
static JS_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^export\s+(?:default\s+)?(?:async\s+)?function\s+(\w+)")
        .expect("javascript function pattern")
});
static JAVA_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*public\s+(?:static\s+)?(?:final\s+)?[\w<>\[\], ]+\s+(\w+)\s*\(")
        .expect("java method pattern")
});

/// Directories never descended into during discovery.
const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "__pycache__",
    ".venv",
    "venv",
    "dist",
    "build",
];

/// Aggregate result of one coverage scan.
#[derive(Debug, Default)]
pub struct CoverageOutcome {
    /// Detected coverage gaps.
    pub issues: Vec<CoverageIssue>,
    /// Total production functions considered.
    pub total_functions: usize,
    /// Functions with a content-matching test.
    pub covered_functions: usize,
    /// Languages observed during the scan.
    pub detected_languages: BTreeSet<String>,
    /// Files skipped because they could not be read.
    pub unreadable_files: usize,
}

impl CoverageOutcome {
    /// Percentage of production functions with a matching test.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn coverage_percent(&self) -> f64 {
        if self.total_functions == 0 {
            return 100.0;
        }
        self.covered_functions as f64 / self.total_functions as f64 * 100.0
    }
}

/// Analyzes production source files for missing or unmatched tests.
pub struct CoverageAnalyzer<'a> {
    root: PathBuf,
    registry: &'a LanguageRuleRegistry,
}

impl<'a> CoverageAnalyzer<'a> {
    /// Creates a coverage analyzer over the given project root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, registry: &'a LanguageRuleRegistry) -> Self {
        Self {
            root: root.into(),
            registry,
        }
    }

    /// Scans every production source file for coverage gaps.
    ///
    /// `test_functions` is the implementation scanner's output; it supplies
    /// the content-matching side of the check.
    #[must_use]
    pub fn scan_coverage_issues(
        &self,
        test_functions: &[TestFunctionRecord],
        change_set: Option<&HashSet<PathBuf>>,
    ) -> CoverageOutcome {
        let all_sources = self.find_source_files();
        let source_stems: HashSet<(SupportedLanguage, String)> = all_sources
            .iter()
            .filter_map(|(path, language)| {
                let stem = path.file_stem()?.to_str()?;
                Some((normalize_language(*language), stem.to_lowercase()))
            })
            .collect();

        let sources = filter_by_change_set(
            all_sources.into_iter().map(|(p, _)| p).collect(),
            change_set,
        );

        info!("Checking coverage for {} source files", sources.len());

        let mut outcome = CoverageOutcome::default();
        for relative_path in sources {
            let Some(language) = self.registry.detect_language(&relative_path) else {
                continue;
            };

            let absolute = self.root.join(&relative_path);
            let content = match std::fs::read_to_string(&absolute) {
                Ok(content) => content,
                Err(e) => {
                    warn!("Skipping unreadable file {}: {}", absolute.display(), e);
                    outcome.unreadable_files += 1;
                    continue;
                }
            };

            let functions = extract_functions(&content, language);
            if functions.is_empty() {
                continue;
            }
            outcome.detected_languages.insert(language.name().to_string());

            let test_file = self.find_corresponding_test_file(&relative_path, language);
            let file_tests: Vec<&TestFunctionRecord> = match &test_file {
                Some(test_path) => test_functions
                    .iter()
                    .filter(|record| &record.file == test_path)
                    .collect(),
                None => Vec::new(),
            };

            for (name, line) in functions {
                outcome.total_functions += 1;
                match &test_file {
                    None => outcome.issues.push(CoverageIssue {
                        file: relative_path.clone(),
                        function: name,
                        line: Some(line),
                        kind: CoverageIssueKind::MissingTestFile,
                        severity: CoverageSeverity::High,
                    }),
                    Some(_) => {
                        if has_matching_test(&name, &file_tests) {
                            outcome.covered_functions += 1;
                        } else {
                            outcome.issues.push(CoverageIssue {
                                file: relative_path.clone(),
                                function: name,
                                line: Some(line),
                                kind: CoverageIssueKind::MissingTest,
                                severity: CoverageSeverity::Medium,
                            });
                        }
                    }
                }
            }
        }

        // Test files whose source counterpart no longer exists anywhere in
        // the tree.
        let mut seen_test_files: HashSet<&Path> = HashSet::new();
        for record in test_functions {
            if !seen_test_files.insert(record.file.as_path()) {
                continue;
            }
            let Some(language) = self.registry.detect_language(&record.file) else {
                continue;
            };
            let Some(stem) = record.file.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let candidates = source_stem_candidates(stem);
            if candidates.is_empty() {
                continue;
            }
            let language = normalize_language(language);
            if candidates
                .iter()
                .any(|candidate| source_stems.contains(&(language, candidate.clone())))
            {
                continue;
            }
            outcome.issues.push(CoverageIssue {
                file: record.file.clone(),
                function: stem.to_string(),
                line: None,
                kind: CoverageIssueKind::OrphanedTest,
                severity: CoverageSeverity::Low,
            });
        }

        outcome
    }

    /// Finds production source files: language source globs minus anything
    /// the language's test-file heuristic also matches.
    #[must_use]
    pub fn find_source_files(&self) -> Vec<(PathBuf, SupportedLanguage)> {
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let name = entry.file_name().to_string_lossy();
                if entry.depth() == 0 {
                    return true;
                }
                !name.starts_with('.') && !EXCLUDED_DIRS.contains(&name.as_ref())
            });

        for entry in walker.flatten() {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let Some(language) = self.registry.detect_language(relative) else {
                continue;
            };
            if self.registry.rules_for(language).is_source_file(relative) {
                files.push((relative.to_path_buf(), language));
            }
        }

        files
    }

    /// Resolves the conventional test file for a source file, when one
    /// exists on disk.
    #[must_use]
    pub fn find_corresponding_test_file(
        &self,
        source: &Path,
        language: SupportedLanguage,
    ) -> Option<PathBuf> {
        let stem = source.file_stem()?.to_str()?;
        let parent = source.parent().unwrap_or_else(|| Path::new(""));

        let candidates: Vec<PathBuf> = match language {
            SupportedLanguage::Python => vec![
                parent.join(format!("test_{stem}.py")),
                parent.join(format!("{stem}_test.py")),
                PathBuf::from("tests").join(format!("test_{stem}.py")),
            ],
            SupportedLanguage::JavaScript => vec![
                parent.join(format!("{stem}.test.js")),
                parent.join(format!("{stem}.spec.js")),
                parent.join("__tests__").join(format!("{stem}.test.js")),
            ],
            SupportedLanguage::TypeScript => vec![
                parent.join(format!("{stem}.test.ts")),
                parent.join(format!("{stem}.spec.ts")),
                parent.join("__tests__").join(format!("{stem}.test.ts")),
            ],
            SupportedLanguage::Java => {
                let mut candidates = vec![parent.join(format!("{stem}Test.java"))];
                // Mirrored src/test tree: src/main/java/... -> src/test/java/...
                let mirrored = source
                    .to_str()
                    .map(|s| s.replace("/main/", "/test/"))
                    .map(PathBuf::from);
                if let Some(mirrored) = mirrored {
                    if let (Some(dir), Some(_)) = (mirrored.parent(), mirrored.file_name()) {
                        candidates.push(dir.join(format!("{stem}Test.java")));
                    }
                }
                candidates
            }
            SupportedLanguage::Go => vec![parent.join(format!("{stem}_test.go"))],
            SupportedLanguage::Rust => vec![
                PathBuf::from("tests").join(format!("{stem}_test.rs")),
                parent.join(format!("{stem}_test.rs")),
            ],
        };

        candidates
            .into_iter()
            .find(|candidate| self.root.join(candidate).is_file())
    }
}

/// Extracts candidate public functions with their 1-based line numbers.
///
/// Per-language surface heuristics: Python skips `_`-prefixed names, Go
/// requires an initial uppercase letter, Rust takes `pub fn`, JavaScript
/// and TypeScript take exported functions, Java takes `public` methods.
#[must_use]
pub fn extract_functions(content: &str, language: SupportedLanguage) -> Vec<(String, usize)> {
    let pattern: &Regex = match language {
        SupportedLanguage::Python => &PYTHON_FUNCTION,
        SupportedLanguage::Go => &GO_FUNCTION,
        SupportedLanguage::Rust => &RUST_FUNCTION,
        SupportedLanguage::JavaScript | SupportedLanguage::TypeScript => &JS_FUNCTION,
        SupportedLanguage::Java => &JAVA_METHOD,
    };

    pattern
        .captures_iter(content)
        .filter_map(|captures| {
            let name_match = captures.get(1)?;
            let name = name_match.as_str();
            let visible = match language {
                SupportedLanguage::Python => !name.starts_with('_'),
                SupportedLanguage::Go => name.chars().next().is_some_and(char::is_uppercase),
                _ => true,
            };
            if !visible {
                return None;
            }
            Some((
                name.to_string(),
                crate::scanner::line_number_at(content, name_match.start()),
            ))
        })
        .collect()
}

/// JavaScript and TypeScript share test naming conventions, so their
/// stems compare within one bucket.
fn normalize_language(language: SupportedLanguage) -> SupportedLanguage {
    match language {
        SupportedLanguage::TypeScript => SupportedLanguage::JavaScript,
        other => other,
    }
}

/// Candidate source stems a test file name could correspond to, lowered
/// for case-insensitive comparison. Unconventional names yield nothing.
fn source_stem_candidates(test_stem: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    let lowered = test_stem.to_lowercase();

    if let Some(stripped) = lowered.strip_prefix("test_") {
        candidates.push(stripped.to_string());
    }
    if let Some(stripped) = lowered.strip_suffix("_test") {
        candidates.push(stripped.to_string());
    }
    for suffix in [".test", ".spec"] {
        if let Some(stripped) = lowered.strip_suffix(suffix) {
            candidates.push(stripped.to_string());
        }
    }
    if let Some(stripped) = lowered.strip_suffix("test") {
        if !stripped.is_empty() && !candidates.contains(&stripped.to_string()) {
            candidates.push(stripped.to_string());
        }
    }
    if let Some(stripped) = lowered.strip_prefix("test") {
        if !stripped.is_empty() && !candidates.contains(&stripped.to_string()) {
            candidates.push(stripped.trim_start_matches('_').to_string());
        }
    }

    candidates.retain(|candidate| !candidate.is_empty());
    candidates
}

/// Case-insensitive content match between a source function and the test
/// functions scanned from its test file.
///
/// A test counts when its name contains the function name or one of the
/// conventional variants (`test_<name>`, `Test<Name>`, `<name>_test`).
fn has_matching_test(function: &str, file_tests: &[&TestFunctionRecord]) -> bool {
    let lowered = function.to_lowercase();
    let variants = [
        lowered.clone(),
        format!("test_{lowered}"),
        format!("test{lowered}"),
        format!("{lowered}_test"),
    ];

    file_tests.iter().any(|record| {
        let test_name = record.name.to_lowercase();
        variants.iter().any(|variant| test_name.contains(variant))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::PatternConfig;
    use crate::scanner::ImplementationScanner;

    #[test]
    fn test_extract_python_functions_skips_private() {
        let content = concat!(
            "def process_payment(amount):\n",
            "    return amount\n",
            "\n",
            "def _internal_helper():\n",
            "    pass\n",
        );
        let functions = extract_functions(content, SupportedLanguage::Python);
        assert_eq!(functions, vec![("process_payment".to_string(), 1)]);
    }

    #[test]
    fn test_extract_go_functions_requires_exported() {
        let content = concat!(
            "func Put(key string) error { return nil }\n",
            "func internalGet(key string) {}\n",
        );
        let functions = extract_functions(content, SupportedLanguage::Go);
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].0, "Put");
    }

    #[test]
    fn test_extract_rust_pub_functions() {
        let content = concat!(
            "pub fn checkout(cart: &Cart) -> Receipt {\n",
            "    unimplemented!()\n",
            "}\n",
            "fn private_helper() {}\n",
        );
        let functions = extract_functions(content, SupportedLanguage::Rust);
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].0, "checkout");
    }

    #[test]
    fn test_missing_test_file_is_high_severity() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        std::fs::create_dir_all(&app).unwrap();
        std::fs::write(
            app.join("payments.py"),
            "def process_payment(amount):\n    return amount\n",
        )
        .unwrap();

        let registry = LanguageRuleRegistry::new();
        let analyzer = CoverageAnalyzer::new(dir.path(), &registry);
        let outcome = analyzer.scan_coverage_issues(&[], None);

        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].kind, CoverageIssueKind::MissingTestFile);
        assert_eq!(outcome.issues[0].severity, CoverageSeverity::High);
        assert_eq!(outcome.issues[0].function, "process_payment");
        assert_eq!(outcome.coverage_percent(), 0.0);
    }

    #[test]
    fn test_matching_test_counts_as_covered() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        std::fs::create_dir_all(&app).unwrap();
        std::fs::write(
            app.join("payments.py"),
            "def process_payment(amount):\n    return amount\n",
        )
        .unwrap();
        std::fs::write(
            app.join("test_payments.py"),
            "def test_process_payment():\n    assert True\n",
        )
        .unwrap();

        let registry = LanguageRuleRegistry::new();
        let patterns = PatternConfig::default();
        let scanner = ImplementationScanner::new(dir.path(), &registry, &patterns);
        let scan = scanner.scan_all(None);

        let analyzer = CoverageAnalyzer::new(dir.path(), &registry);
        let outcome = analyzer.scan_coverage_issues(&scan.test_functions, None);

        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.covered_functions, 1);
        assert_eq!(outcome.coverage_percent(), 100.0);
    }

    #[test]
    fn test_orphaned_test_file_is_low_severity() {
        let dir = tempfile::tempdir().unwrap();
        let tests_dir = dir.path().join("tests");
        std::fs::create_dir_all(&tests_dir).unwrap();
        std::fs::write(
            tests_dir.join("test_ghost.py"),
            "def test_ghost():\n    assert True\n",
        )
        .unwrap();

        let registry = LanguageRuleRegistry::new();
        let patterns = PatternConfig::default();
        let scanner = ImplementationScanner::new(dir.path(), &registry, &patterns);
        let scan = scanner.scan_all(None);

        let analyzer = CoverageAnalyzer::new(dir.path(), &registry);
        let outcome = analyzer.scan_coverage_issues(&scan.test_functions, None);

        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].kind, CoverageIssueKind::OrphanedTest);
        assert_eq!(outcome.issues[0].severity, CoverageSeverity::Low);
    }

    #[test]
    fn test_test_file_without_matching_name_is_medium() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        std::fs::create_dir_all(&app).unwrap();
        std::fs::write(
            app.join("payments.py"),
            "def process_payment(amount):\n    return amount\n",
        )
        .unwrap();
        std::fs::write(
            app.join("test_payments.py"),
            "def test_unrelated():\n    assert True\n",
        )
        .unwrap();

        let registry = LanguageRuleRegistry::new();
        let patterns = PatternConfig::default();
        let scanner = ImplementationScanner::new(dir.path(), &registry, &patterns);
        let scan = scanner.scan_all(None);

        let analyzer = CoverageAnalyzer::new(dir.path(), &registry);
        let outcome = analyzer.scan_coverage_issues(&scan.test_functions, None);

        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].kind, CoverageIssueKind::MissingTest);
        assert_eq!(outcome.issues[0].severity, CoverageSeverity::Medium);
    }
}
