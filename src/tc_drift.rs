// Copyright (c) 2025 Chetan Conikee <conikee@gmail.com>
// Licensed under the MIT License

//! Test-case ↔ implementation drift analysis.
//!
//! A stateless function of its inputs: builds an index from documented
//! test cases and an inverted index over the identifiers carried by
//! scanned test functions, then diffs the two. Deterministic and
//! idempotent given identical scan output.

use crate::types::{TestCaseRecord, TestFunctionRecord};
use std::collections::{BTreeMap, HashSet};

/// Result of diffing documented test cases against scanned implementations.
#[derive(Debug, Default)]
pub struct TcDriftAnalysis {
    /// Documented test cases with no tagged implementation, in
    /// documentation order.
    pub unimplemented: Vec<TestCaseRecord>,
    /// Identifiers found in code but never declared in documentation,
    /// in sorted order.
    pub orphaned_ids: Vec<String>,
    /// Test functions carrying no documentation identifier at all.
    pub untagged_implementations: Vec<TestFunctionRecord>,
}

/// Diffs documented test cases against scanned test functions.
#[must_use]
pub fn analyze(
    test_cases: &[TestCaseRecord],
    test_functions: &[TestFunctionRecord],
) -> TcDriftAnalysis {
    let documented: HashSet<&str> = test_cases.iter().map(|record| record.id.as_str()).collect();

    // Inverted index: identifier -> implementations that carry it.
    let mut implemented: BTreeMap<&str, Vec<&TestFunctionRecord>> = BTreeMap::new();
    for record in test_functions {
        for id in &record.identifiers {
            implemented.entry(id.as_str()).or_default().push(record);
        }
    }

    let unimplemented = test_cases
        .iter()
        .filter(|record| !implemented.contains_key(record.id.as_str()))
        .cloned()
        .collect();

    let orphaned_ids = implemented
        .keys()
        .filter(|id| !documented.contains(**id))
        .map(|id| (*id).to_string())
        .collect();

    let untagged_implementations = test_functions
        .iter()
        .filter(|record| record.identifiers.is_empty())
        .cloned()
        .collect();

    TcDriftAnalysis {
        unimplemented,
        orphaned_ids,
        untagged_implementations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConstructKind, LifecycleState};
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn test_case(id: &str) -> TestCaseRecord {
        TestCaseRecord {
            id: id.to_string(),
            title: "Example".to_string(),
            state: LifecycleState::Completed,
            execution_type: "Automated".to_string(),
            priority: "High".to_string(),
            is_sub_item: false,
            parent_id: None,
        }
    }

    fn test_function(name: &str, identifiers: &[&str]) -> TestFunctionRecord {
        TestFunctionRecord {
            file: PathBuf::from("tests/test_example.py"),
            name: name.to_string(),
            qualified_name: name.to_string(),
            kind: ConstructKind::Standalone,
            owner: None,
            identifiers: identifiers
                .iter()
                .map(|id| (*id).to_string())
                .collect::<BTreeSet<_>>(),
            line: Some(1),
        }
    }

    #[test]
    fn test_unimplemented_test_case_is_reported() {
        let cases = vec![test_case("TC-CORE-001")];
        let analysis = analyze(&cases, &[]);
        assert_eq!(analysis.unimplemented.len(), 1);
        assert_eq!(analysis.unimplemented[0].id, "TC-CORE-001");
    }

    #[test]
    fn test_orphaned_identifier_is_reported() {
        let functions = vec![test_function("test_mystery", &["TC-CORE-002"])];
        let analysis = analyze(&[], &functions);
        assert_eq!(analysis.orphaned_ids, vec!["TC-CORE-002".to_string()]);
    }

    #[test]
    fn test_tagged_and_documented_is_clean() {
        let cases = vec![test_case("TC-CORE-001")];
        let functions = vec![test_function("test_add", &["TC-CORE-001"])];
        let analysis = analyze(&cases, &functions);
        assert!(analysis.unimplemented.is_empty());
        assert!(analysis.orphaned_ids.is_empty());
        assert!(analysis.untagged_implementations.is_empty());
    }

    #[test]
    fn test_untagged_implementation_is_reported() {
        let functions = vec![test_function("test_untagged", &[])];
        let analysis = analyze(&[], &functions);
        assert_eq!(analysis.untagged_implementations.len(), 1);
        assert_eq!(analysis.untagged_implementations[0].name, "test_untagged");
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let cases = vec![test_case("TC-CORE-001"), test_case("TC-CORE-002")];
        let functions = vec![test_function("test_add", &["TC-CORE-001"])];

        let first = analyze(&cases, &functions);
        let second = analyze(&cases, &functions);
        assert_eq!(
            first
                .unimplemented
                .iter()
                .map(|r| r.id.clone())
                .collect::<Vec<_>>(),
            second
                .unimplemented
                .iter()
                .map(|r| r.id.clone())
                .collect::<Vec<_>>()
        );
        assert_eq!(first.orphaned_ids, second.orphaned_ids);
    }
}
