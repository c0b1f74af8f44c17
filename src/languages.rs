// Copyright (c) 2025 Chetan Conikee <conikee@gmail.com>
// Licensed under the MIT License

//! Per-language scanning rules for test-construct detection.
//!
//! Every language is described by a [`LanguageRule`] data record: test-file
//! glob patterns, an ordered list of construct-detection patterns, and an
//! identifier-proximity window. The generic matching engine in the scanner
//! consumes these records, so adding a language means adding a rule, not a
//! code path.

#![allow(clippy::match_same_arms)]

use crate::types::ConstructKind;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// A language family supported by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportedLanguage {
    /// Python: indentation-scoped test methods in `Test*` classes plus
    /// `test_*` module functions.
    Python,
    /// JavaScript: `it`/`test` call expressions with literal names inside
    /// `describe` suites.
    JavaScript,
    /// TypeScript: same construct rules as JavaScript.
    TypeScript,
    /// Java: `@Test`-annotated methods.
    Java,
    /// Go: prefix-named top-level `TestXxx` functions.
    Go,
    /// Rust: `#[test]` attribute-marked functions.
    Rust,
}

impl SupportedLanguage {
    /// Gets the string representation of the language.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Java => "java",
            Self::Go => "go",
            Self::Rust => "rust",
        }
    }

    /// All supported languages, in stable order.
    #[must_use]
    pub fn all() -> &'static [SupportedLanguage] {
        &[
            Self::Python,
            Self::JavaScript,
            Self::TypeScript,
            Self::Java,
            Self::Go,
            Self::Rust,
        ]
    }
}

/// One construct-detection pattern within a language rule.
///
/// Patterns are tried in declaration order and the first structural match
/// wins for any given source offset. Capture group 1 of `pattern` is the
/// construct name.
#[derive(Debug, Clone)]
pub struct ConstructPattern {
    /// The construct kind produced by this pattern.
    pub kind: ConstructKind,
    /// Optional grouping construct (test class, suite call). When present,
    /// a detected construct is owned by the nearest preceding container
    /// match; for indentation-scoped languages the container must also sit
    /// at a smaller indentation than the member.
    pub container: Option<Regex>,
    /// The construct pattern itself.
    pub pattern: Regex,
    /// Whether container ownership is decided by indentation nesting.
    pub indentation_scoped: bool,
}

/// Declarative scanning rules for one language.
#[derive(Debug, Clone)]
pub struct LanguageRule {
    /// The language this rule describes.
    pub language: SupportedLanguage,
    /// Glob patterns selecting test files, relative to the project root.
    pub test_file_globs: Vec<Pattern>,
    /// Glob patterns selecting production source files.
    pub source_file_globs: Vec<Pattern>,
    /// Ordered construct-detection patterns.
    pub construct_patterns: Vec<ConstructPattern>,
    /// Symmetric character window searched around a construct for
    /// documentation identifiers.
    pub proximity_window: usize,
}

impl LanguageRule {
    /// Whether a root-relative path matches this language's test globs.
    #[must_use]
    pub fn is_test_file(&self, relative_path: &Path) -> bool {
        self.test_file_globs
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
    }

    /// Whether a root-relative path matches this language's source globs
    /// without also matching its test globs.
    #[must_use]
    pub fn is_source_file(&self, relative_path: &Path) -> bool {
        self.source_file_globs
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
            && !self.is_test_file(relative_path)
    }
}

/// Static table of per-language scanning rules.
pub struct LanguageRuleRegistry {
    rules: HashMap<SupportedLanguage, LanguageRule>,
}

impl LanguageRuleRegistry {
    /// Builds the registry with the built-in rule set.
    #[must_use]
    pub fn new() -> Self {
        let mut rules = HashMap::new();
        for language in SupportedLanguage::all() {
            rules.insert(*language, build_rule(*language));
        }
        Self { rules }
    }

    /// Maps a file path to its language by extension.
    #[must_use]
    pub fn detect_language(&self, path: &Path) -> Option<SupportedLanguage> {
        let extension = path.extension()?.to_str()?;
        let language = match extension {
            "py" => SupportedLanguage::Python,
            "js" | "jsx" | "mjs" => SupportedLanguage::JavaScript,
            "ts" | "tsx" => SupportedLanguage::TypeScript,
            "java" => SupportedLanguage::Java,
            "go" => SupportedLanguage::Go,
            "rs" => SupportedLanguage::Rust,
            _ => {
                debug!("No language rule for extension '{}'", extension);
                return None;
            }
        };
        Some(language)
    }

    /// The rule record for a language.
    #[must_use]
    pub fn rules_for(&self, language: SupportedLanguage) -> &LanguageRule {
        &self.rules[&language]
    }

    /// All rules, in stable language order.
    #[must_use]
    pub fn all_rules(&self) -> Vec<&LanguageRule> {
        SupportedLanguage::all()
            .iter()
            .map(|language| &self.rules[language])
            .collect()
    }
}

impl Default for LanguageRuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in construct pattern must compile")
}

fn globs(patterns: &[&str]) -> Vec<Pattern> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).expect("built-in glob pattern must compile"))
        .collect()
}

fn build_rule(language: SupportedLanguage) -> LanguageRule {
    match language {
        SupportedLanguage::Python => LanguageRule {
            language,
            test_file_globs: globs(&["**/test_*.py", "**/*_test.py", "**/tests/**/*.py"]),
            source_file_globs: globs(&["**/*.py"]),
            construct_patterns: vec![
                ConstructPattern {
                    kind: ConstructKind::ClassMethod,
                    container: Some(compile(r"(?m)^\s*class\s+(\w*Test\w*)\b")),
                    pattern: compile(r"(?m)^[ \t]+def\s+(test_\w+)\s*\("),
                    indentation_scoped: true,
                },
                ConstructPattern {
                    kind: ConstructKind::Standalone,
                    container: None,
                    pattern: compile(r"(?m)^def\s+(test_\w+)\s*\("),
                    indentation_scoped: false,
                },
            ],
            proximity_window: 400,
        },
        SupportedLanguage::JavaScript | SupportedLanguage::TypeScript => LanguageRule {
            language,
            test_file_globs: match language {
                SupportedLanguage::TypeScript => globs(&[
                    "**/*.test.ts",
                    "**/*.spec.ts",
                    "**/*.test.tsx",
                    "**/__tests__/**/*.ts",
                    "**/__tests__/**/*.tsx",
                ]),
                _ => globs(&[
                    "**/*.test.js",
                    "**/*.spec.js",
                    "**/*.test.jsx",
                    "**/__tests__/**/*.js",
                    "**/__tests__/**/*.jsx",
                ]),
            },
            source_file_globs: match language {
                SupportedLanguage::TypeScript => globs(&["**/*.ts", "**/*.tsx"]),
                _ => globs(&["**/*.js", "**/*.jsx"]),
            },
            construct_patterns: vec![ConstructPattern {
                kind: ConstructKind::CallExpression,
                container: Some(compile(r#"describe\s*\(\s*['"`]([^'"`]+)['"`]"#)),
                pattern: compile(r#"(?:^|[\s;(])(?:it|test)\s*\(\s*['"`]([^'"`]+)['"`]"#),
                indentation_scoped: false,
            }],
            proximity_window: 300,
        },
        SupportedLanguage::Java => LanguageRule {
            language,
            test_file_globs: globs(&["**/src/test/**/*.java", "**/*Test.java", "**/Test*.java"]),
            source_file_globs: globs(&["**/*.java"]),
            construct_patterns: vec![ConstructPattern {
                kind: ConstructKind::Annotated,
                container: Some(compile(r"class\s+(\w+)")),
                pattern: compile(r"@Test\s+(?:public\s+)?(?:static\s+)?void\s+(\w+)\s*\("),
                indentation_scoped: false,
            }],
            proximity_window: 350,
        },
        SupportedLanguage::Go => LanguageRule {
            language,
            test_file_globs: globs(&["**/*_test.go"]),
            source_file_globs: globs(&["**/*.go"]),
            construct_patterns: vec![ConstructPattern {
                kind: ConstructKind::Standalone,
                container: None,
                pattern: compile(r"(?m)^func\s+(Test\w+)\s*\("),
                indentation_scoped: false,
            }],
            proximity_window: 250,
        },
        SupportedLanguage::Rust => LanguageRule {
            language,
            test_file_globs: globs(&["**/tests/**/*.rs", "**/*_test.rs"]),
            source_file_globs: globs(&["**/src/**/*.rs"]),
            construct_patterns: vec![ConstructPattern {
                kind: ConstructKind::Annotated,
                container: None,
                pattern: compile(r"#\[(?:\w+::)?test\]\s*(?:async\s+)?fn\s+(\w+)"),
                indentation_scoped: false,
            }],
            proximity_window: 300,
        },
    }
}
