// Copyright (c) 2025 Chetan Conikee <conikee@gmail.com>
// Licensed under the MIT License

//! Optional semantic-search collaborator for file discovery.
//!
//! The engine never owns an index. When a collaborator is supplied it may
//! reorder discovered files so the most relevant ones are scanned first;
//! its absence degrades discovery to exhaustive glob order with no change
//! in correctness, only in prioritization.

use std::path::PathBuf;

/// Filters narrowing a semantic search to relevant files.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    /// File extensions to consider, without the leading dot.
    pub extensions: Vec<String>,
    /// Maximum number of ranked results to return.
    pub limit: usize,
}

/// A capability that ranks project files by relevance to a query.
pub trait SemanticSearch {
    /// Returns root-relative file paths ranked most relevant first.
    fn search(&self, query: &str, filters: &SearchFilters) -> Vec<PathBuf>;
}

/// Moves ranked paths to the front of `files`, preserving the relative
/// order of everything else. Ranking never adds or removes files.
#[must_use]
pub fn prioritize(files: Vec<PathBuf>, ranked: &[PathBuf]) -> Vec<PathBuf> {
    let mut prioritized = Vec::with_capacity(files.len());
    let mut remainder = files;

    for path in ranked {
        if let Some(index) = remainder.iter().position(|f| f == path) {
            prioritized.push(remainder.remove(index));
        }
    }
    prioritized.extend(remainder);
    prioritized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prioritize_reorders_without_narrowing() {
        let files = vec![
            PathBuf::from("a.py"),
            PathBuf::from("b.py"),
            PathBuf::from("c.py"),
        ];
        let ranked = vec![PathBuf::from("c.py"), PathBuf::from("missing.py")];

        let prioritized = prioritize(files, &ranked);
        assert_eq!(
            prioritized,
            vec![
                PathBuf::from("c.py"),
                PathBuf::from("a.py"),
                PathBuf::from("b.py"),
            ]
        );
    }
}
