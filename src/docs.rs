// Copyright (c) 2025 Chetan Conikee <conikee@gmail.com>
// Licensed under the MIT License

//! Checklist documentation parsing.
//!
//! Two parsers share one algorithm shape over line-oriented checklist
//! syntax: test-case entries
//! (`- [x] **TC-CORE-001** - Basic add (Automated, High)`) and feature
//! entries
//! (`- [x] **FT-API-001** Checkout - Cart totals (Criteria: sums match)`).
//! Parsing is tolerant: lines that do not match the grammar are ignored,
//! and indented matching lines become sub-items of the most recently seen
//! top-level entry.

use crate::patterns::PatternConfig;
use crate::types::{FeatureRecord, LifecycleState, TestCaseRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Default character window scanned after a feature id for test-case
/// references.
pub const DEFAULT_REFERENCE_WINDOW: usize = 500;

/// `- [x] **ID** - title (execType, priority)`
static TEST_CASE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\s*)-\s*\[([xX~ ]?)\]\s*\*\*([A-Za-z][A-Za-z0-9]*-[A-Za-z0-9_-]+)\*\*\s*-\s*(.+?)\s*\(([^,()]+),\s*([^()]+)\)\s*$",
    )
    .expect("test-case line grammar must compile")
});

/// `- [x] **ID** title - description (Criteria: ...)`
static FEATURE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\s*)-\s*\[([xX~ ]?)\]\s*\*\*([A-Za-z][A-Za-z0-9]*-[A-Za-z0-9_-]+)\*\*\s*(.+?)\s*-\s*(.+?)\s*\(Criteria:\s*(.+?)\)\s*$",
    )
    .expect("feature line grammar must compile")
});

/// Parser for identifier-tagged checklist documentation.
pub struct DocumentationParser {
    tc_matcher: Regex,
    ft_matcher: Regex,
    reference_window: usize,
}

impl DocumentationParser {
    /// Creates a parser bound to the loaded identifier patterns.
    #[must_use]
    pub fn new(patterns: &PatternConfig) -> Self {
        Self {
            tc_matcher: patterns.matcher_for("TC-", false),
            ft_matcher: patterns.matcher_for("FT-", false),
            reference_window: DEFAULT_REFERENCE_WINDOW,
        }
    }

    /// Overrides the feature-reference scan window.
    #[must_use]
    pub fn with_reference_window(mut self, window: usize) -> Self {
        self.reference_window = window;
        self
    }

    /// Reads a documentation file, returning `None` with a warning when it
    /// is missing or unreadable. Whether that is fatal depends on the
    /// requested analysis mode and is decided by the caller.
    #[must_use]
    pub fn read_documentation(path: &Path) -> Option<String> {
        match std::fs::read_to_string(path) {
            Ok(content) => Some(content),
            Err(e) => {
                warn!("Documentation file {} unavailable: {}", path.display(), e);
                None
            }
        }
    }

    /// Parses test-case entries out of checklist text.
    #[must_use]
    pub fn parse_test_cases(&self, text: &str) -> Vec<TestCaseRecord> {
        let mut records = Vec::new();
        let mut current_parent: Option<String> = None;

        for (line_index, line) in text.lines().enumerate() {
            let Some(captures) = TEST_CASE_LINE.captures(line) else {
                continue;
            };

            let id = captures[3].to_string();
            if !self.tc_matcher.is_match(&id) {
                debug!(
                    "Skipping non test-case entry '{}' at line {}",
                    id,
                    line_index + 1
                );
                continue;
            }

            let is_sub_item = !captures[1].is_empty();
            if !is_sub_item {
                current_parent = Some(id.clone());
            }

            records.push(TestCaseRecord {
                id: id.clone(),
                title: captures[4].trim().to_string(),
                state: LifecycleState::from_mark(&captures[2]),
                execution_type: captures[5].trim().to_string(),
                priority: captures[6].trim().to_string(),
                is_sub_item,
                parent_id: if is_sub_item {
                    current_parent.clone()
                } else {
                    None
                },
            });
        }

        records
    }

    /// Parses feature entries out of checklist text.
    ///
    /// Each feature's `test_case_ids` is populated from the reference
    /// window scan over the raw text.
    #[must_use]
    pub fn parse_features(&self, text: &str) -> Vec<FeatureRecord> {
        let references = self.extract_feature_test_refs(text);
        let mut records = Vec::new();
        let mut current_parent: Option<String> = None;

        for line in text.lines() {
            let Some(captures) = FEATURE_LINE.captures(line) else {
                continue;
            };

            let id = captures[3].to_string();
            if !self.ft_matcher.is_match(&id) {
                continue;
            }

            let is_sub_item = !captures[1].is_empty();
            if !is_sub_item {
                current_parent = Some(id.clone());
            }

            records.push(FeatureRecord {
                id: id.clone(),
                title: captures[4].trim().to_string(),
                description: captures[5].trim().to_string(),
                criteria: captures[6].trim().to_string(),
                state: LifecycleState::from_mark(&captures[2]),
                is_sub_item,
                parent_id: if is_sub_item {
                    current_parent.clone()
                } else {
                    None
                },
                test_case_ids: references.get(&id).cloned().unwrap_or_default(),
            });
        }

        records
    }

    /// Scans a fixed character window after each feature-id occurrence for
    /// test-case-id occurrences, producing a feature → test-case multimap.
    ///
    /// Used by cross-reference validation; order of first occurrence is
    /// preserved and duplicates per feature are dropped.
    #[must_use]
    pub fn extract_feature_test_refs(&self, text: &str) -> HashMap<String, Vec<String>> {
        let mut references: HashMap<String, Vec<String>> = HashMap::new();

        for feature_match in self.ft_matcher.find_iter(text) {
            let window_start = feature_match.end();
            let window_end = floor_char_boundary(text, window_start + self.reference_window);
            let window = &text[window_start..window_end];

            let entry = references
                .entry(feature_match.as_str().to_string())
                .or_default();
            for tc_match in self.tc_matcher.find_iter(window) {
                let id = tc_match.as_str().to_string();
                if !entry.contains(&id) {
                    entry.push(id);
                }
            }
        }

        references
    }
}

/// Largest char boundary at or below `index`, clamped to the text length.
fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut boundary = index;
    while !text.is_char_boundary(boundary) {
        boundary -= 1;
    }
    boundary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> DocumentationParser {
        DocumentationParser::new(&PatternConfig::default())
    }

    #[test]
    fn test_parse_test_case_line() {
        let text = "- [x] **TC-CORE-001** - Basic add (Automated, High)\n";
        let records = parser().parse_test_cases(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "TC-CORE-001");
        assert_eq!(records[0].title, "Basic add");
        assert_eq!(records[0].state, LifecycleState::Completed);
        assert_eq!(records[0].execution_type, "Automated");
        assert_eq!(records[0].priority, "High");
        assert!(!records[0].is_sub_item);
        assert!(records[0].parent_id.is_none());
    }

    #[test]
    fn test_pending_marks() {
        let text = concat!(
            "- [~] **TC-CORE-002** - In flight (Automated, Medium)\n",
            "- [ ] **TC-CORE-003** - Not started (Manual, Low)\n",
        );
        let records = parser().parse_test_cases(text);
        assert_eq!(records.len(), 2);
        assert!(records
            .iter()
            .all(|r| r.state == LifecycleState::Pending));
    }

    #[test]
    fn test_sub_items_track_current_parent() {
        let text = concat!(
            "- [x] **TC-API-001** - Parent case (Automated, High)\n",
            "  - [ ] **TC-API-002** - Child case (Automated, Low)\n",
            "- [x] **TC-API-003** - Next parent (Manual, High)\n",
            "  - [~] **TC-API-004** - Other child (Manual, Low)\n",
        );
        let records = parser().parse_test_cases(text);
        assert_eq!(records.len(), 4);
        assert_eq!(records[1].parent_id.as_deref(), Some("TC-API-001"));
        assert_eq!(records[3].parent_id.as_deref(), Some("TC-API-003"));
        assert!(!records[2].is_sub_item);
    }

    #[test]
    fn test_non_matching_lines_are_ignored() {
        let text = concat!(
            "# Test Cases\n",
            "\n",
            "Some prose about testing.\n",
            "- [x] **TC-CORE-001** - Basic add (Automated, High)\n",
            "- totally unstructured bullet\n",
        );
        let records = parser().parse_test_cases(text);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_empty_document_yields_no_records() {
        assert!(parser().parse_test_cases("").is_empty());
        assert!(parser().parse_features("").is_empty());
    }

    #[test]
    fn test_parse_feature_line() {
        let text =
            "- [x] **FT-API-001** Checkout flow - Cart totals update live (Criteria: totals match, TC-API-001 passes)\n";
        let records = parser().parse_features(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "FT-API-001");
        assert_eq!(records[0].title, "Checkout flow");
        assert_eq!(records[0].description, "Cart totals update live");
        assert!(records[0].criteria.contains("TC-API-001"));
        assert_eq!(records[0].test_case_ids, vec!["TC-API-001".to_string()]);
    }

    #[test]
    fn test_reference_window_is_bounded() {
        let padding = "x".repeat(600);
        let text = format!("FT-API-001 {padding} TC-API-009");
        let references = parser().extract_feature_test_refs(&text);
        // TC-API-009 sits beyond the 500-character window.
        assert!(references
            .get("FT-API-001")
            .map_or(true, std::vec::Vec::is_empty));

        let near = "FT-API-002 covered by TC-API-001 and TC-API-002";
        let references = parser().extract_feature_test_refs(near);
        assert_eq!(
            references.get("FT-API-002").unwrap(),
            &vec!["TC-API-001".to_string(), "TC-API-002".to_string()]
        );
    }
}
