// Copyright (c) 2025 Chetan Conikee <conikee@gmail.com>
// Licensed under the MIT License

//! Feature ↔ implementation and feature ↔ test-case drift analysis.
//!
//! Feature references in code are matched at file granularity: a test
//! function references a feature when the feature's literal id occurs
//! anywhere in the function's source file. Feature references are
//! typically comments or docstrings, so the proximity binding used for
//! test-case identifiers would be too strict here.

use crate::patterns::PatternConfig;
use crate::types::{FeatureRecord, FeatureTestMapping, TestCaseRecord, TestFunctionRecord};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Result of mapping documented features onto scanned test functions.
#[derive(Debug, Default)]
pub struct FeatureImplAnalysis {
    /// Feature ids with no referencing test file anywhere in the tree.
    pub features_without_tests: Vec<String>,
    /// Qualified test names whose file contains no feature reference.
    pub tests_without_feature_reference: Vec<String>,
    /// Feature ids found in code but never declared in documentation,
    /// in sorted order.
    pub orphaned_feature_ids: Vec<String>,
}

/// Maps features to the test files that reference them.
#[must_use]
pub fn map_features_to_tests(
    root: &Path,
    features: &[FeatureRecord],
    test_functions: &[TestFunctionRecord],
    patterns: &PatternConfig,
) -> FeatureImplAnalysis {
    let ft_matcher = patterns.matcher_for("FT-", false);
    let declared: HashSet<&str> = features.iter().map(|record| record.id.as_str()).collect();

    // Read each distinct test file once; unreadable files are skipped.
    let files: BTreeSet<&PathBuf> = test_functions.iter().map(|record| &record.file).collect();
    let mut file_contents: HashMap<&PathBuf, String> = HashMap::new();
    for file in files {
        match std::fs::read_to_string(root.join(file)) {
            Ok(content) => {
                file_contents.insert(file, content);
            }
            Err(e) => warn!("Skipping unreadable test file {}: {}", file.display(), e),
        }
    }

    let mut referenced_features: HashSet<String> = HashSet::new();
    let mut found_in_code: BTreeSet<String> = BTreeSet::new();
    let mut files_with_references: HashSet<&PathBuf> = HashSet::new();

    for (file, content) in &file_contents {
        let mut any_reference = false;
        for id_match in ft_matcher.find_iter(content) {
            any_reference = true;
            found_in_code.insert(id_match.as_str().to_string());
            if declared.contains(id_match.as_str()) {
                referenced_features.insert(id_match.as_str().to_string());
            }
        }
        if any_reference {
            files_with_references.insert(*file);
        }
    }

    let features_without_tests = features
        .iter()
        .filter(|record| !referenced_features.contains(&record.id))
        .map(|record| record.id.clone())
        .collect();

    let tests_without_feature_reference = test_functions
        .iter()
        .filter(|record| !files_with_references.contains(&record.file))
        .map(|record| record.qualified_name.clone())
        .collect();

    let orphaned_feature_ids = found_in_code
        .into_iter()
        .filter(|id| !declared.contains(id.as_str()))
        .collect();

    FeatureImplAnalysis {
        features_without_tests,
        tests_without_feature_reference,
        orphaned_feature_ids,
    }
}

/// Validates the test-case references each feature makes in its
/// description and criteria text.
///
/// Every referenced id is checked against the parsed test-case set: valid
/// ones populate `matched_test_case_ids`, undefined ones populate
/// `missing_test_case_ids` with an explanatory issue. A feature with no
/// reference at all also receives an issue. When relationship validation
/// is enabled, references to prefixes outside the feature entry's allowed
/// relationship targets are flagged too.
#[must_use]
pub fn cross_reference_feature_test_cases(
    features: &[FeatureRecord],
    test_cases: &[TestCaseRecord],
    patterns: &PatternConfig,
) -> Vec<FeatureTestMapping> {
    let tc_matcher = patterns.matcher_for("TC-", false);
    let defined: HashSet<&str> = test_cases.iter().map(|record| record.id.as_str()).collect();

    let allowed_targets: Option<Vec<String>> = if patterns.validate_relationships() {
        patterns
            .config_for("FT-")
            .map(|config| config.relationship_targets.clone())
    } else {
        None
    };

    features
        .iter()
        .map(|feature| {
            let mut referenced: Vec<String> = Vec::new();
            let text = format!("{} {}", feature.description, feature.criteria);
            for id_match in tc_matcher.find_iter(&text) {
                let id = id_match.as_str().to_string();
                if !referenced.contains(&id) {
                    referenced.push(id);
                }
            }
            // Window-derived associations from the raw document count too.
            for id in &feature.test_case_ids {
                if !referenced.contains(id) {
                    referenced.push(id.clone());
                }
            }

            let mut mapping = FeatureTestMapping {
                feature_id: feature.id.clone(),
                feature_title: feature.title.clone(),
                matched_test_case_ids: Vec::new(),
                missing_test_case_ids: Vec::new(),
                issues: Vec::new(),
            };

            for id in referenced {
                if defined.contains(id.as_str()) {
                    mapping.matched_test_case_ids.push(id);
                } else {
                    mapping.issues.push(format!(
                        "{} references undefined test case {}",
                        feature.id, id
                    ));
                    mapping.missing_test_case_ids.push(id);
                }
            }

            if mapping.matched_test_case_ids.is_empty() && mapping.missing_test_case_ids.is_empty()
            {
                mapping
                    .issues
                    .push(format!("{}: no test-case reference found", feature.id));
            }

            if let Some(targets) = &allowed_targets {
                for prefix in patterns.enabled_prefixes() {
                    if prefix == "FT-" || prefix == "TC-" || targets.iter().any(|t| t == prefix) {
                        continue;
                    }
                    let matcher = patterns.matcher_for(prefix, false);
                    for id_match in matcher.find_iter(&text) {
                        mapping.issues.push(format!(
                            "{} references {} but '{}' is not an allowed relationship target",
                            feature.id,
                            id_match.as_str(),
                            prefix
                        ));
                    }
                }
            }

            mapping
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConstructKind, LifecycleState};
    use std::collections::BTreeSet;

    fn feature(id: &str, criteria: &str) -> FeatureRecord {
        FeatureRecord {
            id: id.to_string(),
            title: "Example feature".to_string(),
            description: "Does something".to_string(),
            criteria: criteria.to_string(),
            state: LifecycleState::Pending,
            is_sub_item: false,
            parent_id: None,
            test_case_ids: Vec::new(),
        }
    }

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

    #[test]
    fn test_missing_reference_is_flagged() {
        let features = vec![feature("FT-API-001", "covered by TC-API-001")];
        let mappings = cross_reference_feature_test_cases(&features, &[], &PatternConfig::default());
        assert_eq!(mappings.len(), 1);
        assert_eq!(
            mappings[0].missing_test_case_ids,
            vec!["TC-API-001".to_string()]
        );
        assert!(mappings[0].matched_test_case_ids.is_empty());
        assert!(!mappings[0].issues.is_empty());
    }

    #[test]
    fn test_matched_reference_is_recorded() {
        let features = vec![feature("FT-API-001", "covered by TC-API-001")];
        let cases = vec![test_case("TC-API-001")];
        let mappings =
            cross_reference_feature_test_cases(&features, &cases, &PatternConfig::default());
        assert_eq!(
            mappings[0].matched_test_case_ids,
            vec!["TC-API-001".to_string()]
        );
        assert!(mappings[0].missing_test_case_ids.is_empty());
        assert!(mappings[0].issues.is_empty());
    }

    #[test]
    fn test_feature_without_any_reference_gets_issue() {
        let features = vec![feature("FT-API-002", "no identifiers here")];
        let mappings = cross_reference_feature_test_cases(&features, &[], &PatternConfig::default());
        assert!(mappings[0].matched_test_case_ids.is_empty());
        assert!(mappings[0].missing_test_case_ids.is_empty());
        assert_eq!(mappings[0].issues.len(), 1);
        assert!(mappings[0].issues[0].contains("no test-case reference"));
    }

    #[test]
    fn test_disallowed_relationship_target_is_flagged() {
        // Default configuration allows FT- entries to reference TC- only.
        let features = vec![feature("FT-API-003", "depends on REQ-AUTH-001 and TC-API-003")];
        let cases = vec![test_case("TC-API-003")];
        let mappings =
            cross_reference_feature_test_cases(&features, &cases, &PatternConfig::default());
        assert_eq!(mappings[0].matched_test_case_ids, vec!["TC-API-003".to_string()]);
        assert_eq!(mappings[0].issues.len(), 1);
        assert!(mappings[0].issues[0].contains("REQ-AUTH-001"));
        assert!(mappings[0].issues[0].contains("not an allowed relationship target"));
    }

    #[test]
    fn test_file_granular_feature_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let tests_dir = dir.path().join("tests");
        std::fs::create_dir_all(&tests_dir).unwrap();
        std::fs::write(
            tests_dir.join("test_checkout.py"),
            "# Implements FT-CART-001\ndef test_totals():\n    pass\n",
        )
        .unwrap();
        std::fs::write(
            tests_dir.join("test_misc.py"),
            "def test_unrelated():\n    pass\n",
        )
        .unwrap();

        let features = vec![feature("FT-CART-001", ""), feature("FT-CART-002", "")];
        let functions = vec![
            TestFunctionRecord {
                file: PathBuf::from("tests/test_checkout.py"),
                name: "test_totals".to_string(),
                qualified_name: "test_totals".to_string(),
                kind: ConstructKind::Standalone,
                owner: None,
                identifiers: BTreeSet::new(),
                line: Some(2),
            },
            TestFunctionRecord {
                file: PathBuf::from("tests/test_misc.py"),
                name: "test_unrelated".to_string(),
                qualified_name: "test_unrelated".to_string(),
                kind: ConstructKind::Standalone,
                owner: None,
                identifiers: BTreeSet::new(),
                line: Some(1),
            },
        ];

        let analysis = map_features_to_tests(
            dir.path(),
            &features,
            &functions,
            &PatternConfig::default(),
        );

        assert_eq!(
            analysis.features_without_tests,
            vec!["FT-CART-002".to_string()]
        );
        assert_eq!(
            analysis.tests_without_feature_reference,
            vec!["test_unrelated".to_string()]
        );
        assert!(analysis.orphaned_feature_ids.is_empty());
    }

    #[test]
    fn test_orphaned_feature_id_in_code() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("test_ghost.py"),
            "# FT-GHOST-009\ndef test_ghost():\n    pass\n",
        )
        .unwrap();

        let functions = vec![TestFunctionRecord {
            file: PathBuf::from("test_ghost.py"),
            name: "test_ghost".to_string(),
            qualified_name: "test_ghost".to_string(),
            kind: ConstructKind::Standalone,
            owner: None,
            identifiers: BTreeSet::new(),
            line: Some(2),
        }];

        let analysis =
            map_features_to_tests(dir.path(), &[], &functions, &PatternConfig::default());
        assert_eq!(
            analysis.orphaned_feature_ids,
            vec!["FT-GHOST-009".to_string()]
        );
    }
}
