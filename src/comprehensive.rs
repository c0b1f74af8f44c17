// Copyright (c) 2025 Chetan Conikee <conikee@gmail.com>
// Licensed under the MIT License

//! Secondary heuristic drift strategies.
//!
//! Four independent detectors, each producing zero or more generic
//! [`DriftIssue`] findings: identifier drift for prefixes beyond TC/FT,
//! unused imports in test files, stale assertion call forms, and build
//! configuration test paths that no longer exist. Every strategy tolerates
//! per-file parse failures by skipping that file.

use crate::languages::{LanguageRuleRegistry, SupportedLanguage};
use crate::patterns::PatternConfig;
use crate::scanner::line_number_at;
use crate::types::{DriftIssue, DriftSeverity, TestFunctionRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Prefixes checked by the identifier-drift strategy when none are
/// configured explicitly.
const DEFAULT_EXTRA_PREFIXES: &[&str] = &["REQ-", "US-", "BUG-", "AC-"];

/// Legacy assertion call forms and their suggested replacements.
const STALE_ASSERTIONS: &[(&str, &str)] = &[
    ("self.assertEquals(", "self.assertEqual(...)"),
    ("self.failUnless(", "self.assertTrue(...)"),
    ("self.failIf(", "self.assertFalse(...)"),
    ("assert.equal(", "expect(...).toBe(...)"),
    ("Assert.assertEquals(", "Assertions.assertEquals(...)"),
];

static PYTHON_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^import\s+([\w.]+)").expect("python import pattern"));
static PYTHON_FROM_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^from\s+[\w.]+\s+import\s+(.+)$").expect("python from pattern"));
static JS_NAMED_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^import\s+\{([^}]+)\}\s+from").expect("js named import pattern"));
static JS_DEFAULT_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^import\s+(\w+)\s+from").expect("js default import pattern"));
static JAVA_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^import\s+(?:static\s+)?[\w.]+\.(\w+);").expect("java import pattern")
});
static RUST_USE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^use\s+[\w:]+::(\w+);").expect("rust use pattern"));
static TESTPATHS_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^testpaths\s*=\s*(.+)$").expect("testpaths line pattern"));

/// Runs the comprehensive heuristic strategies over one project tree.
pub struct ComprehensiveDriftDetector<'a> {
    root: PathBuf,
    patterns: &'a PatternConfig,
    registry: &'a LanguageRuleRegistry,
    extra_prefixes: Vec<String>,
}

impl<'a> ComprehensiveDriftDetector<'a> {
    /// Creates a detector with the default extra-prefix set.
    #[must_use]
    pub fn new(
        root: impl Into<PathBuf>,
        patterns: &'a PatternConfig,
        registry: &'a LanguageRuleRegistry,
    ) -> Self {
        Self {
            root: root.into(),
            patterns,
            registry,
            extra_prefixes: DEFAULT_EXTRA_PREFIXES
                .iter()
                .map(|prefix| (*prefix).to_string())
                .collect(),
        }
    }

    /// Overrides the prefixes checked by the identifier-drift strategy.
    #[must_use]
    pub fn with_extra_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.extra_prefixes = prefixes;
        self
    }

    /// Runs all four strategies and concatenates their findings.
    #[must_use]
    pub fn detect(&self, test_functions: &[TestFunctionRecord]) -> Vec<DriftIssue> {
        let test_files = self.read_test_files(test_functions);
        let doc_files = self.read_documentation_files();

        let mut issues = Vec::new();
        issues.extend(self.detect_identifier_prefix_drift(&test_files, &doc_files));
        issues.extend(self.detect_unused_imports(&test_files));
        issues.extend(self.detect_stale_assertions(&test_files));
        issues.extend(self.detect_build_config_drift());
        issues
    }

    /// Reads each distinct scanned test file once, skipping failures.
    fn read_test_files(
        &self,
        test_functions: &[TestFunctionRecord],
    ) -> BTreeMap<PathBuf, String> {
        let files: BTreeSet<&PathBuf> = test_functions.iter().map(|record| &record.file).collect();
        let mut contents = BTreeMap::new();
        for file in files {
            match std::fs::read_to_string(self.root.join(file)) {
                Ok(content) => {
                    contents.insert(file.clone(), content);
                }
                Err(e) => warn!("Skipping unreadable test file {}: {}", file.display(), e),
            }
        }
        contents
    }

    /// Reads every markdown document in the tree, skipping failures.
    fn read_documentation_files(&self) -> BTreeMap<PathBuf, String> {
        let mut contents = BTreeMap::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let name = entry.file_name().to_string_lossy();
                entry.depth() == 0 || !name.starts_with('.')
            });

        for entry in walker.flatten() {
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|ext| ext.to_str()) != Some("md") {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            match std::fs::read_to_string(entry.path()) {
                Ok(content) => {
                    contents.insert(relative.to_path_buf(), content);
                }
                Err(e) => warn!("Skipping unreadable document {}: {}", entry.path().display(), e),
            }
        }
        contents
    }

    /// Strategy 1: symmetric difference between identifiers found in test
    /// files and identifiers found in documentation, per extra prefix.
    fn detect_identifier_prefix_drift(
        &self,
        test_files: &BTreeMap<PathBuf, String>,
        doc_files: &BTreeMap<PathBuf, String>,
    ) -> Vec<DriftIssue> {
        let mut issues = Vec::new();

        for prefix in &self.extra_prefixes {
            let matcher = self.patterns.matcher_for(prefix, true);

            let mut doc_ids: BTreeMap<String, PathBuf> = BTreeMap::new();
            for (file, content) in doc_files {
                for id_match in matcher.find_iter(content) {
                    doc_ids
                        .entry(id_match.as_str().to_string())
                        .or_insert_with(|| file.clone());
                }
            }

            let mut code_ids: BTreeMap<String, (PathBuf, usize)> = BTreeMap::new();
            for (file, content) in test_files {
                for id_match in matcher.find_iter(content) {
                    code_ids
                        .entry(id_match.as_str().to_string())
                        .or_insert_with(|| (file.clone(), line_number_at(content, id_match.start())));
                }
            }

            for (id, doc_file) in &doc_ids {
                if !code_ids.contains_key(id) {
                    issues.push(DriftIssue {
                        strategy: "identifier_prefix".to_string(),
                        drift_type: "documented_only".to_string(),
                        severity: DriftSeverity::Critical,
                        description: format!("{id} is documented but never referenced in tests"),
                        location: doc_file.display().to_string(),
                        expected: format!("{id} referenced by at least one test"),
                        actual: "no test references the identifier".to_string(),
                        suggestion: format!("Tag a test with {id} or retire the entry"),
                        file: Some(doc_file.clone()),
                        line: None,
                    });
                }
            }

            for (id, (code_file, line)) in &code_ids {
                if !doc_ids.contains_key(id) {
                    issues.push(DriftIssue {
                        strategy: "identifier_prefix".to_string(),
                        drift_type: "code_only".to_string(),
                        severity: DriftSeverity::Warning,
                        description: format!("{id} appears in tests but is not documented"),
                        location: code_file.display().to_string(),
                        expected: format!("{id} declared in a documentation file"),
                        actual: "identifier only exists in code".to_string(),
                        suggestion: format!("Document {id} or remove the stale tag"),
                        file: Some(code_file.clone()),
                        line: Some(*line),
                    });
                }
            }
        }

        issues
    }

    /// Strategy 2: imported symbols never referenced outside their own
    /// import statement.
    fn detect_unused_imports(&self, test_files: &BTreeMap<PathBuf, String>) -> Vec<DriftIssue> {
        let mut issues = Vec::new();

        for (file, content) in test_files {
            let Some(language) = self.registry.detect_language(file) else {
                continue;
            };
            for (symbol, import_line) in imported_symbols(content, language) {
                if symbol_is_referenced(content, &symbol) {
                    continue;
                }
                issues.push(DriftIssue {
                    strategy: "unused_import".to_string(),
                    drift_type: "unreferenced_symbol".to_string(),
                    severity: DriftSeverity::Info,
                    description: format!("Imported symbol '{symbol}' is never used"),
                    location: file.display().to_string(),
                    expected: format!("'{symbol}' referenced in the file body"),
                    actual: "symbol only appears in its import statement".to_string(),
                    suggestion: format!("Remove the unused import of '{symbol}'"),
                    file: Some(file.clone()),
                    line: Some(import_line),
                });
            }
        }

        issues
    }

    /// Strategy 3: legacy assertion call forms with modern replacements.
    fn detect_stale_assertions(&self, test_files: &BTreeMap<PathBuf, String>) -> Vec<DriftIssue> {
        let mut issues = Vec::new();

        for (file, content) in test_files {
            for (needle, replacement) in STALE_ASSERTIONS {
                let mut search_from = 0;
                while let Some(found) = content[search_from..].find(needle) {
                    let offset = search_from + found;
                    issues.push(DriftIssue {
                        strategy: "stale_assertion".to_string(),
                        drift_type: "legacy_call_form".to_string(),
                        severity: DriftSeverity::Warning,
                        description: format!("Legacy assertion form '{}'", needle.trim_end_matches('(')),
                        location: file.display().to_string(),
                        expected: (*replacement).to_string(),
                        actual: (*needle).to_string(),
                        suggestion: format!("Replace with {replacement}"),
                        file: Some(file.clone()),
                        line: Some(line_number_at(content, offset)),
                    });
                    search_from = offset + needle.len();
                }
            }
        }

        issues
    }

    /// Strategy 4: declared test paths in build configuration that do not
    /// correspond to an existing directory.
    fn detect_build_config_drift(&self) -> Vec<DriftIssue> {
        let mut issues = Vec::new();

        for (config_file, paths) in self.declared_test_paths() {
            for path in paths {
                if self.root.join(&path).is_dir() {
                    continue;
                }
                issues.push(DriftIssue {
                    strategy: "build_config".to_string(),
                    drift_type: "missing_test_path".to_string(),
                    severity: DriftSeverity::Warning,
                    description: format!(
                        "Configured test path '{path}' does not exist"
                    ),
                    location: config_file.clone(),
                    expected: format!("directory '{path}' present in the tree"),
                    actual: "directory is missing".to_string(),
                    suggestion: format!(
                        "Create '{path}' or update {config_file}"
                    ),
                    file: Some(PathBuf::from(&config_file)),
                    line: None,
                });
            }
        }

        issues
    }

    /// Collects declared test-path entries from known build/tooling
    /// configuration documents. Unparseable documents are skipped.
    fn declared_test_paths(&self) -> Vec<(String, Vec<String>)> {
        let mut declared = Vec::new();

        let pyproject = self.root.join("pyproject.toml");
        if let Ok(content) = std::fs::read_to_string(&pyproject) {
            match content.parse::<toml::Value>() {
                Ok(value) => {
                    let testpaths = value
                        .get("tool")
                        .and_then(|tool| tool.get("pytest"))
                        .and_then(|pytest| pytest.get("ini_options"))
                        .and_then(|options| options.get("testpaths"))
                        .and_then(toml::Value::as_array);
                    if let Some(paths) = testpaths {
                        declared.push((
                            "pyproject.toml".to_string(),
                            paths
                                .iter()
                                .filter_map(toml::Value::as_str)
                                .map(String::from)
                                .collect(),
                        ));
                    }
                }
                Err(e) => debug!("Skipping unparseable pyproject.toml: {}", e),
            }
        }

        let pytest_ini = self.root.join("pytest.ini");
        if let Ok(content) = std::fs::read_to_string(&pytest_ini) {
            if let Some(captures) = TESTPATHS_LINE.captures(&content) {
                declared.push((
                    "pytest.ini".to_string(),
                    captures[1]
                        .split_whitespace()
                        .map(String::from)
                        .collect(),
                ));
            }
        }

        let package_json = self.root.join("package.json");
        if let Ok(content) = std::fs::read_to_string(&package_json) {
            match serde_json::from_str::<serde_json::Value>(&content) {
                Ok(value) => {
                    let roots = value
                        .get("jest")
                        .and_then(|jest| jest.get("roots"))
                        .and_then(serde_json::Value::as_array);
                    if let Some(paths) = roots {
                        declared.push((
                            "package.json".to_string(),
                            paths
                                .iter()
                                .filter_map(serde_json::Value::as_str)
                                .map(|path| {
                                    path.trim_start_matches("<rootDir>/")
                                        .trim_start_matches("<rootDir>")
                                        .to_string()
                                })
                                .filter(|path| !path.is_empty())
                                .collect(),
                        ));
                    }
                }
                Err(e) => debug!("Skipping unparseable package.json: {}", e),
            }
        }

        declared
    }
}

/// Extracts imported symbol names with the line of their import.
fn imported_symbols(content: &str, language: SupportedLanguage) -> Vec<(String, usize)> {
    let mut symbols = Vec::new();

    match language {
        SupportedLanguage::Python => {
            for captures in PYTHON_IMPORT.captures_iter(content) {
                if let Some(module) = captures.get(1) {
                    let symbol = module.as_str().rsplit('.').next().unwrap_or("");
                    symbols.push((symbol.to_string(), line_number_at(content, module.start())));
                }
            }
            for captures in PYTHON_FROM_IMPORT.captures_iter(content) {
                if let Some(names) = captures.get(1) {
                    let line = line_number_at(content, names.start());
                    for name in names.as_str().split(',') {
                        // `import x as y` binds y; otherwise the name itself.
                        let bound = name
                            .split(" as ")
                            .last()
                            .unwrap_or(name)
                            .trim()
                            .trim_matches('(')
                            .trim_matches(')');
                        if !bound.is_empty() && bound != "*" {
                            symbols.push((bound.to_string(), line));
                        }
                    }
                }
            }
        }
        SupportedLanguage::JavaScript | SupportedLanguage::TypeScript => {
            for captures in JS_NAMED_IMPORT.captures_iter(content) {
                if let Some(names) = captures.get(1) {
                    let line = line_number_at(content, names.start());
                    for name in names.as_str().split(',') {
                        let bound = name.split(" as ").last().unwrap_or(name).trim();
                        if !bound.is_empty() {
                            symbols.push((bound.to_string(), line));
                        }
                    }
                }
            }
            for captures in JS_DEFAULT_IMPORT.captures_iter(content) {
                if let Some(name) = captures.get(1) {
                    symbols.push((
                        name.as_str().to_string(),
                        line_number_at(content, name.start()),
                    ));
                }
            }
        }
        SupportedLanguage::Java => {
            for captures in JAVA_IMPORT.captures_iter(content) {
                if let Some(name) = captures.get(1) {
                    symbols.push((
                        name.as_str().to_string(),
                        line_number_at(content, name.start()),
                    ));
                }
            }
        }
        SupportedLanguage::Rust => {
            for captures in RUST_USE.captures_iter(content) {
                if let Some(name) = captures.get(1) {
                    symbols.push((
                        name.as_str().to_string(),
                        line_number_at(content, name.start()),
                    ));
                }
            }
        }
        SupportedLanguage::Go => {
            // The Go compiler already rejects unused imports.
        }
    }

    symbols
}

/// Whether a symbol is referenced anywhere outside import statements.
fn symbol_is_referenced(content: &str, symbol: &str) -> bool {
    let body: String = content
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !trimmed.starts_with("import ")
                && !trimmed.starts_with("from ")
                && !trimmed.starts_with("use ")
        })
        .collect::<Vec<_>>()
        .join("\n");

    match Regex::new(&format!(r"\b{}\b", regex::escape(symbol))) {
        Ok(matcher) => matcher.is_match(&body),
        Err(_) => true,
    }
}
