// Copyright (c) 2025 Chetan Conikee <conikee@gmail.com>
// Licensed under the MIT License

//! Version-control changeset resolution for incremental scans.
//!
//! Wraps `git` subprocess queries and composes each into a single set of
//! root-relative file paths. When the working tree is not under version
//! control every accessor returns an empty set with a warning; callers
//! interpret an absent changeset as "scan everything" by convention.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// Resolves changed-file sets from git history for one project root.
pub struct ChangeSetResolver {
    root: PathBuf,
}

impl ChangeSetResolver {
    /// Creates a resolver for the given project root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Whether the project root is inside a git work tree.
    #[must_use]
    pub fn is_repository(&self) -> bool {
        Command::new("git")
            .args(["-C"])
            .arg(&self.root)
            .args(["rev-parse", "--is-inside-work-tree"])
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Files changed since the given ref.
    #[must_use]
    pub fn changed_since(&self, reference: &str) -> HashSet<PathBuf> {
        self.collect(&[&["diff", "--name-only", reference]])
    }

    /// Files with unstaged or staged modifications.
    #[must_use]
    pub fn changed_and_staged(&self) -> HashSet<PathBuf> {
        self.collect(&[
            &["diff", "--name-only"],
            &["diff", "--cached", "--name-only"],
        ])
    }

    /// Untracked files not covered by ignore rules.
    #[must_use]
    pub fn untracked(&self) -> HashSet<PathBuf> {
        self.collect(&[&["ls-files", "--others", "--exclude-standard"]])
    }

    /// Files touched by any commit in the last `days` days, plus current
    /// working-tree modifications.
    #[must_use]
    pub fn changed_in_last_n_days(&self, days: u32) -> HashSet<PathBuf> {
        let since = format!("{days} days ago");
        self.collect(&[
            &["log", "--since", &since, "--name-only", "--pretty=format:"],
            &["diff", "--name-only"],
        ])
    }

    /// Files changed on the current branch relative to a base branch,
    /// the pull-request diff.
    #[must_use]
    pub fn changed_vs_base_branch(&self, branch: &str) -> HashSet<PathBuf> {
        let range = format!("{branch}...HEAD");
        self.collect(&[&["diff", "--name-only", &range]])
    }

    /// Runs each git query and merges the results into one path set.
    fn collect(&self, queries: &[&[&str]]) -> HashSet<PathBuf> {
        let mut paths = HashSet::new();
        for args in queries {
            match self.run_git(args) {
                Some(files) => paths.extend(files),
                None => {
                    warn!(
                        "Version control unavailable for {}, treating changeset as empty",
                        self.root.display()
                    );
                    return HashSet::new();
                }
            }
        }
        debug!("Resolved changeset of {} paths", paths.len());
        paths
    }

    /// Runs one git subcommand, returning `None` when git is missing or
    /// the root is not a repository.
    fn run_git(&self, args: &[&str]) -> Option<Vec<PathBuf>> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Some(
            stdout
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(PathBuf::from)
                .collect(),
        )
    }
}

/// Restricts `files` to the changeset when one is supplied.
///
/// `None` means "do not filter": the full file list passes through
/// unchanged. Paths are compared root-relative on both sides.
#[must_use]
pub fn filter_by_change_set(
    files: Vec<PathBuf>,
    change_set: Option<&HashSet<PathBuf>>,
) -> Vec<PathBuf> {
    match change_set {
        None => files,
        Some(set) => files.into_iter().filter(|file| set.contains(file)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_changeset_is_identity() {
        let files = vec![PathBuf::from("a.py"), PathBuf::from("b.py")];
        let filtered = filter_by_change_set(files.clone(), None);
        assert_eq!(filtered, files);
    }

    #[test]
    fn test_changeset_intersects() {
        let files = vec![
            PathBuf::from("tests/test_a.py"),
            PathBuf::from("tests/test_b.py"),
        ];
        let mut change_set = HashSet::new();
        change_set.insert(PathBuf::from("tests/test_a.py"));

        let filtered = filter_by_change_set(files, Some(&change_set));
        assert_eq!(filtered, vec![PathBuf::from("tests/test_a.py")]);
    }

    #[test]
    fn test_empty_changeset_filters_everything() {
        let files = vec![PathBuf::from("a.py")];
        let change_set = HashSet::new();
        assert!(filter_by_change_set(files, Some(&change_set)).is_empty());
    }

    #[test]
    fn test_outside_repository_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ChangeSetResolver::new(dir.path());
        // A plain temp directory has no git history; every accessor
        // degrades to an empty set rather than failing.
        if !resolver.is_repository() {
            assert!(resolver.changed_and_staged().is_empty());
            assert!(resolver.untracked().is_empty());
            assert!(resolver.changed_in_last_n_days(7).is_empty());
        }
    }
}
