// Copyright (c) 2025 Chetan Conikee <conikee@gmail.com>
// Licensed under the MIT License

//! Implementation scanning: test-construct discovery across languages.
//!
//! Discovers test files through each language's glob patterns, applies the
//! language's ordered construct detectors, and associates every construct
//! with the documentation identifiers found inside its proximity window.
//! Per-file and per-construct failures are isolated: one unreadable file
//! never aborts the scan. Output order is stable (file-discovery order,
//! then construct offset) so reports are deterministic and diffable.

#![allow(clippy::cast_possible_truncation)]

use crate::changeset::filter_by_change_set;
use crate::languages::{ConstructPattern, LanguageRule, LanguageRuleRegistry};
use crate::patterns::PatternConfig;
use crate::search::{prioritize, SearchFilters, SemanticSearch};
use crate::types::{ConstructKind, TestFunctionRecord};
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

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

/// Aggregate result of one implementation scan.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// All discovered test constructs, in stable order.
    pub test_functions: Vec<TestFunctionRecord>,
    /// Languages observed during the scan.
    pub detected_languages: BTreeSet<String>,
    /// Files skipped because they could not be read.
    pub unreadable_files: usize,
}

/// Scans test files for test constructs and nearby identifiers.
pub struct ImplementationScanner<'a> {
    root: PathBuf,
    registry: &'a LanguageRuleRegistry,
    identifier_matcher: Regex,
    semantic_search: Option<&'a dyn SemanticSearch>,
}

impl<'a> ImplementationScanner<'a> {
    /// Creates a scanner over the given project root.
    #[must_use]
    pub fn new(
        root: impl Into<PathBuf>,
        registry: &'a LanguageRuleRegistry,
        patterns: &PatternConfig,
    ) -> Self {
        Self {
            root: root.into(),
            registry,
            identifier_matcher: patterns.matcher_for("TC-", true),
            semantic_search: None,
        }
    }

    /// Attaches an optional semantic-search collaborator that prioritizes
    /// (never narrows) file discovery.
    #[must_use]
    pub fn with_semantic_search(mut self, search: &'a dyn SemanticSearch) -> Self {
        self.semantic_search = Some(search);
        self
    }

    /// Scans every discovered test file, optionally restricted to a
    /// version-control changeset.
    #[must_use]
    pub fn scan_all(&self, change_set: Option<&HashSet<PathBuf>>) -> ScanOutcome {
        let mut discovered = self.discover_test_files();
        discovered = filter_by_change_set(discovered, change_set);

        if let Some(search) = self.semantic_search {
            let filters = SearchFilters {
                extensions: Vec::new(),
                limit: discovered.len(),
            };
            let ranked = search.search("test case identifiers", &filters);
            discovered = prioritize(discovered, &ranked);
        }

        info!("Scanning {} test files", discovered.len());

        let mut outcome = ScanOutcome::default();
        for relative_path in discovered {
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

            let rule = self.registry.rules_for(language);
            let records = self.scan_content(&relative_path, rule, &content);
            if !records.is_empty() {
                outcome.detected_languages.insert(language.name().to_string());
            }
            outcome.test_functions.extend(records);
        }

        outcome
    }

    /// Walks the project tree collecting root-relative test-file paths in
    /// stable order.
    #[must_use]
    pub fn discover_test_files(&self) -> Vec<PathBuf> {
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

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let Some(language) = self.registry.detect_language(relative) else {
                continue;
            };
            if self.registry.rules_for(language).is_test_file(relative) {
                files.push(relative.to_path_buf());
            }
        }

        files
    }

    /// Applies the language's ordered construct detectors to one file.
    ///
    /// The first pattern to claim an offset wins; later patterns cannot
    /// re-report the same construct.
    fn scan_content(
        &self,
        relative_path: &Path,
        rule: &LanguageRule,
        content: &str,
    ) -> Vec<TestFunctionRecord> {
        let mut records = Vec::new();
        let mut claimed_offsets: HashSet<usize> = HashSet::new();

        for pattern in &rule.construct_patterns {
            let containers = collect_containers(pattern, content);

            for captures in pattern.pattern.captures_iter(content) {
                let Some(name_match) = captures.get(1) else {
                    continue;
                };
                let construct_start = captures
                    .get(0)
                    .map_or(name_match.start(), |m| m.start());
                if !claimed_offsets.insert(name_match.start()) {
                    continue;
                }

                let owner = resolve_owner(pattern, &containers, content, name_match.start());
                if owner.is_none() && pattern.indentation_scoped {
                    // An indented member with no enclosing container is not
                    // a grouped test construct.
                    claimed_offsets.remove(&name_match.start());
                    continue;
                }

                let name = name_match.as_str().to_string();
                let qualified_name = match (&owner, pattern.kind) {
                    (Some(container), ConstructKind::CallExpression) => {
                        format!("{container} > {name}")
                    }
                    (Some(container), _) => format!("{container}.{name}"),
                    (None, _) => name.clone(),
                };

                let identifiers = identifiers_near(
                    content,
                    construct_start,
                    rule.proximity_window,
                    &self.identifier_matcher,
                );

                records.push(TestFunctionRecord {
                    file: relative_path.to_path_buf(),
                    name,
                    qualified_name,
                    kind: pattern.kind,
                    owner,
                    identifiers,
                    line: Some(line_number_at(content, construct_start)),
                });
            }
        }

        records.sort_by_key(|record| record.line);
        records
    }
}

/// A grouping construct located in the file: offset, indentation, name.
struct ContainerSite {
    start: usize,
    indent: usize,
    name: String,
}

fn collect_containers(pattern: &ConstructPattern, content: &str) -> Vec<ContainerSite> {
    let Some(container_pattern) = &pattern.container else {
        return Vec::new();
    };
    container_pattern
        .captures_iter(content)
        .filter_map(|captures| {
            let name_match = captures.get(1)?;
            Some(ContainerSite {
                start: captures.get(0)?.start(),
                indent: indentation_at(content, name_match.start()),
                name: name_match.as_str().to_string(),
            })
        })
        .collect()
}

/// Finds the owning container for a construct: the nearest preceding
/// container match, with an indentation-nesting requirement for
/// indentation-scoped languages.
///
/// `member_position` must point inside the construct name so indentation
/// reflects the member's own line.
fn resolve_owner(
    pattern: &ConstructPattern,
    containers: &[ContainerSite],
    content: &str,
    member_position: usize,
) -> Option<String> {
    if containers.is_empty() {
        return None;
    }
    let member_indent = indentation_at(content, member_position);

    containers
        .iter()
        .rev()
        .find(|site| {
            site.start < member_position
                && (!pattern.indentation_scoped || site.indent < member_indent)
        })
        .map(|site| site.name.clone())
}

/// Pure proximity-window association: the set of identifier matches inside
/// a symmetric character window around `offset`.
#[must_use]
pub fn identifiers_near(
    content: &str,
    offset: usize,
    window: usize,
    matcher: &Regex,
) -> BTreeSet<String> {
    let start = floor_char_boundary(content, offset.saturating_sub(window));
    let end = floor_char_boundary(content, offset.saturating_add(window));
    matcher
        .find_iter(&content[start..end])
        .map(|m| m.as_str().to_string())
        .collect()
}

/// 1-based line number of a byte offset.
#[must_use]
pub fn line_number_at(content: &str, offset: usize) -> usize {
    let clamped = offset.min(content.len());
    content[..clamped].bytes().filter(|b| *b == b'\n').count() + 1
}

/// Column depth of the line containing `offset`, counting leading
/// whitespace characters.
fn indentation_at(content: &str, offset: usize) -> usize {
    let clamped = offset.min(content.len());
    let line_start = content[..clamped]
        .rfind('\n')
        .map_or(0, |newline| newline + 1);
    content[line_start..clamped]
        .chars()
        .take_while(|c| c.is_whitespace())
        .count()
}

fn floor_char_boundary(content: &str, index: usize) -> usize {
    if index >= content.len() {
        return content.len();
    }
    let mut boundary = index;
    while !content.is_char_boundary(boundary) {
        boundary -= 1;
    }
    boundary
}
