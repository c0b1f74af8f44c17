// Copyright (c) 2025 Chetan Conikee <conikee@gmail.com>
// Licensed under the MIT License

//! End-to-end drift detection over real project trees.

use specdrift::{
    severity, AnalysisMode, CoverageIssueKind, CoverageSeverity, DriftAnalyzer, DriftSeverity,
    OutputLocationConfig, ReportEmitter,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builds a project tree from (relative path, content) pairs.
fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("create temp project");
    for (path, content) in files {
        let absolute = dir.path().join(path);
        if let Some(parent) = absolute.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(absolute, content).expect("write project file");
    }
    dir
}

fn analyze(root: &Path, mode: AnalysisMode) -> specdrift::DriftReport {
    DriftAnalyzer::new(root)
        .analyze(mode, None)
        .expect("analysis should succeed")
}

#[test]
fn documented_test_case_without_implementation_is_unimplemented() {
    // Scenario: documentation declares TC-CORE-001 and no source file
    // mentions it.
    let dir = project(&[
        (
            "docs/test-cases.md",
            "- [x] **TC-CORE-001** - Basic add (Automated, High)\n",
        ),
        (
            "tests/test_math.py",
            "def test_multiply():\n    assert 2 * 2 == 4\n",
        ),
    ]);

    let report = analyze(dir.path(), AnalysisMode::TcMapping);
    let unimplemented: Vec<&str> = report
        .unimplemented_test_cases
        .iter()
        .map(|record| record.id.as_str())
        .collect();
    assert_eq!(unimplemented, vec!["TC-CORE-001"]);
}

#[test]
fn tagged_identifier_without_documentation_is_orphaned() {
    let dir = project(&[
        ("docs/test-cases.md", ""),
        (
            "tests/test_math.py",
            "def test_subtract():\n    # TC-CORE-002\n    assert 3 - 1 == 2\n",
        ),
    ]);

    let report = analyze(dir.path(), AnalysisMode::TcMapping);
    assert_eq!(report.orphaned_ids, vec!["TC-CORE-002".to_string()]);
}

#[test]
fn feature_referencing_undeclared_test_case_is_flagged() {
    let dir = project(&[
        ("docs/test-cases.md", ""),
        (
            "docs/features.md",
            "- [ ] **FT-API-001** Checkout - Cart totals (Criteria: TC-API-001 passes)\n",
        ),
    ]);

    let report = analyze(dir.path(), AnalysisMode::FtMapping);
    assert_eq!(report.feature_mappings.len(), 1);
    let mapping = &report.feature_mappings[0];
    assert_eq!(mapping.feature_id, "FT-API-001");
    assert_eq!(mapping.missing_test_case_ids, vec!["TC-API-001".to_string()]);
    assert!(mapping.matched_test_case_ids.is_empty());
}

#[test]
fn feature_mapping_invariant_holds() {
    let dir = project(&[
        (
            "docs/test-cases.md",
            "- [x] **TC-API-001** - Totals add up (Automated, High)\n",
        ),
        (
            "docs/features.md",
            concat!(
                "- [x] **FT-API-001** Checkout - Totals (Criteria: TC-API-001)\n",
                "- [ ] **FT-API-002** Refunds - Reversals (Criteria: TC-API-999)\n",
            ),
        ),
    ]);

    let report = analyze(dir.path(), AnalysisMode::FtMapping);
    let declared: HashSet<&str> = ["TC-API-001"].into_iter().collect();
    for mapping in &report.feature_mappings {
        for id in &mapping.matched_test_case_ids {
            assert!(declared.contains(id.as_str()));
        }
        for id in &mapping.missing_test_case_ids {
            assert!(!declared.contains(id.as_str()));
        }
    }
}

#[test]
fn source_function_without_test_file_is_high_severity_gap() {
    let dir = project(&[(
        "app/payments.py",
        "def process_payment(amount):\n    return amount\n",
    )]);

    let report = analyze(dir.path(), AnalysisMode::CodeCoverage);
    let issues: Vec<_> = report
        .coverage_issues
        .iter()
        .filter(|issue| issue.function == "process_payment")
        .collect();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, CoverageIssueKind::MissingTestFile);
    assert_eq!(issues[0].severity, CoverageSeverity::High);
}

#[test]
fn changeset_excludes_unchanged_files() {
    let dir = project(&[
        ("docs/test-cases.md", ""),
        ("tests/test_a.py", "def test_alpha():\n    pass\n"),
        ("tests/test_b.py", "def test_beta():\n    pass\n"),
    ]);

    let mut change_set = HashSet::new();
    change_set.insert(PathBuf::from("tests/test_a.py"));

    let report = DriftAnalyzer::new(dir.path())
        .analyze(AnalysisMode::TcMapping, Some(&change_set))
        .expect("analysis should succeed");

    assert_eq!(report.metadata.total_test_functions, 1);
    let names: Vec<&str> = report
        .untagged_implementations
        .iter()
        .map(|record| record.name.as_str())
        .collect();
    assert_eq!(names, vec!["test_alpha"]);
}

#[test]
fn legacy_assertion_produces_one_warning_with_location() {
    let dir = project(&[
        (
            "tests/test_legacy.py",
            concat!(
                "import unittest\n",
                "\n",
                "class TestLegacy(unittest.TestCase):\n",
                "    def test_old_form(self):\n",
                "        self.assertEquals(1, 1)\n",
            ),
        ),
    ]);

    let report = analyze(dir.path(), AnalysisMode::All);
    let stale: Vec<_> = report
        .drift_issues
        .iter()
        .filter(|issue| issue.strategy == "stale_assertion")
        .collect();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].severity, DriftSeverity::Warning);
    assert_eq!(stale[0].line, Some(5));
    assert!(!stale[0].suggestion.is_empty());
}

#[test]
fn consecutive_runs_are_idempotent() {
    let dir = project(&[
        (
            "docs/test-cases.md",
            concat!(
                "- [x] **TC-CORE-001** - Basic add (Automated, High)\n",
                "- [ ] **TC-CORE-002** - Basic subtract (Automated, Low)\n",
            ),
        ),
        (
            "tests/test_math.py",
            "def test_add():\n    # TC-CORE-001\n    assert 1 + 1 == 2\n\n# TC-GHOST-003 lingers here\n",
        ),
    ]);

    let first = analyze(dir.path(), AnalysisMode::TcMapping);
    let second = analyze(dir.path(), AnalysisMode::TcMapping);

    assert_eq!(
        first
            .unimplemented_test_cases
            .iter()
            .map(|record| record.id.clone())
            .collect::<Vec<_>>(),
        second
            .unimplemented_test_cases
            .iter()
            .map(|record| record.id.clone())
            .collect::<Vec<_>>()
    );
    assert_eq!(first.orphaned_ids, second.orphaned_ids);
}

#[test]
fn lifecycle_states_are_always_valid() {
    let dir = project(&[(
        "docs/test-cases.md",
        concat!(
            "- [x] **TC-ST-001** - Done (Automated, High)\n",
            "- [~] **TC-ST-002** - Started (Automated, High)\n",
            "- [ ] **TC-ST-003** - Open (Manual, Low)\n",
        ),
    )]);

    let report = analyze(dir.path(), AnalysisMode::TcMapping);
    for record in &report.unimplemented_test_cases {
        assert!(matches!(
            record.state,
            specdrift::LifecycleState::Completed | specdrift::LifecycleState::Pending
        ));
    }
    assert_eq!(report.metadata.total_test_cases, 3);
}

#[test]
fn emitted_report_round_trips_with_counts_intact() {
    let dir = project(&[
        (
            "docs/test-cases.md",
            "- [x] **TC-CORE-001** - Basic add (Automated, High)\n",
        ),
        (
            "tests/test_math.py",
            "def test_untagged():\n    assert True\n",
        ),
    ]);

    let report = analyze(dir.path(), AnalysisMode::TcMapping);
    let emitter = ReportEmitter::new(OutputLocationConfig::rooted_at(dir.path()));
    emitter.emit(&report).expect("emit report");
    let reloaded = emitter.reload().expect("reload report");

    assert_eq!(report, reloaded);
    assert_eq!(reloaded.total_findings(), report.total_findings());
    assert_eq!(severity(&report), severity(&reloaded));
}

#[test]
fn empty_documentation_is_clean_for_tc_but_irrelevant_for_coverage() {
    let dir = project(&[
        ("docs/test-cases.md", ""),
        (
            "app/orders.py",
            "def place_order(order):\n    return order\n",
        ),
    ]);

    let tc_report = analyze(dir.path(), AnalysisMode::TcMapping);
    assert_eq!(tc_report.metadata.total_test_cases, 0);
    assert!(tc_report.unimplemented_test_cases.is_empty());
    assert!(tc_report.orphaned_ids.is_empty());

    let coverage_report = analyze(dir.path(), AnalysisMode::CodeCoverage);
    assert_eq!(coverage_report.coverage_issues.len(), 1);
}

#[test]
fn all_mode_merges_every_analyzer() {
    let dir = project(&[
        (
            "docs/test-cases.md",
            "- [x] **TC-CART-001** - Totals (Automated, High)\n",
        ),
        (
            "docs/features.md",
            "- [x] **FT-CART-001** Checkout - Totals update (Criteria: TC-CART-001)\n",
        ),
        (
            "tests/test_cart.py",
            concat!(
                "# Implements FT-CART-001\n",
                "def test_totals():\n",
                "    # TC-CART-001\n",
                "    assert True\n",
            ),
        ),
        (
            "app/cart.py",
            "def totals(items):\n    return sum(items)\n",
        ),
        (
            "app/pricing.py",
            "def apply_discount(price):\n    return price\n",
        ),
    ]);

    let report = analyze(dir.path(), AnalysisMode::All);
    assert_eq!(report.mode, "all");
    assert_eq!(report.metadata.total_test_cases, 1);
    assert_eq!(report.metadata.total_features, 1);
    assert!(report.unimplemented_test_cases.is_empty());
    assert!(report.features_without_tests.is_empty());
    // app/pricing.py has no test file under any naming convention, while
    // app/cart.py is covered by tests/test_cart.py.
    assert!(report
        .coverage_issues
        .iter()
        .any(|issue| issue.kind == CoverageIssueKind::MissingTestFile
            && issue.function == "apply_discount"));
    assert!(report.metadata.coverage_percent.is_some());
}

#[test]
fn multi_language_constructs_are_detected() {
    let dir = project(&[
        ("docs/test-cases.md", ""),
        (
            "tests/test_py.py",
            concat!(
                "class TestCart:\n",
                "    def test_totals(self):\n",
                "        pass\n",
            ),
        ),
        (
            "web/cart.test.js",
            concat!(
                "describe('cart', () => {\n",
                "  it('sums totals', () => {});\n",
                "});\n",
            ),
        ),
        (
            "pkg/store_test.go",
            "package store\n\nfunc TestPut(t *testing.T) {}\n",
        ),
        (
            "src/test/java/CartTest.java",
            concat!(
                "class CartTest {\n",
                "    @Test\n",
                "    void addsItems() {}\n",
                "}\n",
            ),
        ),
    ]);

    let report = analyze(dir.path(), AnalysisMode::TcMapping);
    let names: HashSet<&str> = report
        .untagged_implementations
        .iter()
        .map(|record| record.qualified_name.as_str())
        .collect();

    assert!(names.contains("TestCart.test_totals"));
    assert!(names.contains("cart > sums totals"));
    assert!(names.contains("TestPut"));
    assert!(names.contains("CartTest.addsItems"));
    assert!(report.metadata.detected_languages.len() >= 4);
}
