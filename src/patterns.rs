// Copyright (c) 2025 Chetan Conikee <conikee@gmail.com>
// Licensed under the MIT License

//! Identifier-pattern configuration for drift detection.
//!
//! Patterns are defined in an optional `specdrift.yaml` at the project root
//! and map identifier prefixes (`TC-`, `FT-`, `REQ-`, ...) to strict and
//! permissive regex forms plus the documentation files that own them. When
//! the file is absent or malformed the built-in defaults apply; a single
//! malformed entry is dropped, never fatal to the whole load.

use crate::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// File name of the pattern configuration document, relative to the root.
pub const CONFIG_FILE_NAME: &str = "specdrift.yaml";

/// Configuration for one identifier prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierPatternConfig {
    /// Display name, e.g. `Test Case`.
    pub name: String,
    /// Strict pattern: the canonical identifier form.
    pub pattern: String,
    /// Permissive pattern: tolerates ad-hoc identifier spellings.
    pub flexible_pattern: String,
    /// Documentation files that declare identifiers with this prefix.
    #[serde(default)]
    pub primary_files: Vec<PathBuf>,
    /// Prefixes this identifier is allowed to reference.
    #[serde(default)]
    pub relationship_targets: Vec<String>,
    /// Deprecated prefixes are still scanned but excluded from the
    /// primary set.
    #[serde(default)]
    pub deprecated: bool,
}

/// On-disk shape of `specdrift.yaml`.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    patterns: BTreeMap<String, IdentifierPatternConfig>,
    #[serde(default = "default_validate_relationships")]
    validate_relationships: bool,
}

fn default_validate_relationships() -> bool {
    true
}

/// Loaded and validated identifier-pattern configuration.
///
/// Immutable once loaded; owned by the analyzer for the lifetime of a run.
#[derive(Debug, Clone)]
pub struct PatternConfig {
    patterns: BTreeMap<String, IdentifierPatternConfig>,
    validate_relationships: bool,
}

impl PatternConfig {
    /// Loads pattern configuration from `<root>/specdrift.yaml`.
    ///
    /// Never fails: a missing or malformed document falls back to the
    /// built-in defaults with a warning, and individual entries whose
    /// patterns do not compile are dropped.
    #[must_use]
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE_NAME);
        let content = match std::fs::read_to_string(&config_path) {
            Ok(content) => content,
            Err(_) => {
                warn!(
                    "No pattern configuration at {}, using built-in defaults",
                    config_path.display()
                );
                return Self::default();
            }
        };

        let raw: RawConfig = match serde_yaml::from_str(&content) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    "Malformed pattern configuration {}: {}, using built-in defaults",
                    config_path.display(),
                    e
                );
                return Self::default();
            }
        };

        let mut patterns = BTreeMap::new();
        for (prefix, entry) in raw.patterns {
            match Self::validate_entry(&prefix, &entry) {
                Ok(()) => {
                    patterns.insert(prefix, entry);
                }
                Err(e) => {
                    warn!("Dropping pattern entry '{}': {}", prefix, e);
                }
            }
        }

        if patterns.is_empty() {
            warn!("Pattern configuration defined no usable entries, using built-in defaults");
            return Self::default();
        }

        Self {
            patterns,
            validate_relationships: raw.validate_relationships,
        }
    }

    /// Checks that both regex forms of an entry compile.
    fn validate_entry(prefix: &str, entry: &IdentifierPatternConfig) -> Result<()> {
        Regex::new(&entry.pattern).map_err(|e| {
            crate::error::DriftError::pattern_compile(prefix, format!("strict pattern: {e}"))
        })?;
        Regex::new(&entry.flexible_pattern).map_err(|e| {
            crate::error::DriftError::pattern_compile(prefix, format!("flexible pattern: {e}"))
        })?;
        Ok(())
    }

    /// All configured prefixes, in stable order.
    #[must_use]
    pub fn enabled_prefixes(&self) -> Vec<&str> {
        self.patterns.keys().map(String::as_str).collect()
    }

    /// Non-deprecated prefixes, in stable order.
    #[must_use]
    pub fn primary_prefixes(&self) -> Vec<&str> {
        self.patterns
            .iter()
            .filter(|(_, entry)| !entry.deprecated)
            .map(|(prefix, _)| prefix.as_str())
            .collect()
    }

    /// Whether relationship targets should be validated during analysis.
    #[must_use]
    pub fn validate_relationships(&self) -> bool {
        self.validate_relationships
    }

    /// Configuration for one prefix, when configured.
    #[must_use]
    pub fn config_for(&self, prefix: &str) -> Option<&IdentifierPatternConfig> {
        self.patterns.get(prefix)
    }

    /// Documentation files that declare identifiers with the given prefix.
    #[must_use]
    pub fn primary_files(&self, prefix: &str) -> &[PathBuf] {
        self.patterns
            .get(prefix)
            .map(|entry| entry.primary_files.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the strict or permissive pattern string for a prefix.
    ///
    /// Unconfigured prefixes fall back to a generic
    /// `<prefix>` + alphanumeric pattern.
    #[must_use]
    pub fn pattern_for(&self, prefix: &str, strict: bool) -> String {
        match self.patterns.get(prefix) {
            Some(entry) if strict => entry.pattern.clone(),
            Some(entry) => entry.flexible_pattern.clone(),
            None => format!(r"\b{}[A-Za-z0-9-]+\b", regex::escape(prefix)),
        }
    }

    /// Compiled strict matcher for a prefix.
    ///
    /// Patterns are validated at load, so this only ever degrades to the
    /// generic form for prefixes that were never configured.
    #[must_use]
    pub fn matcher_for(&self, prefix: &str, strict: bool) -> Regex {
        let pattern = self.pattern_for(prefix, strict);
        match Regex::new(&pattern) {
            Ok(regex) => regex,
            Err(e) => {
                warn!("Pattern for '{}' failed to compile ({}), using generic form", prefix, e);
                let generic = format!(r"\b{}[A-Za-z0-9-]+\b", regex::escape(prefix));
                Regex::new(&generic).unwrap_or_else(|_| {
                    // The generic form is a constant shape over an escaped
                    // literal and always compiles.
                    unreachable!("generic identifier pattern must compile")
                })
            }
        }
    }

    /// Built-in default entries covering `TC-`, `FT-`, and `REQ-`.
    #[must_use]
    pub fn builtin_defaults() -> BTreeMap<String, IdentifierPatternConfig> {
        let mut patterns = BTreeMap::new();
        patterns.insert(
            "TC-".to_string(),
            IdentifierPatternConfig {
                name: "Test Case".to_string(),
                pattern: r"\bTC-[A-Z0-9]+-\d+\b".to_string(),
                flexible_pattern: r"\bTC-[A-Za-z0-9_-]+\b".to_string(),
                primary_files: vec![PathBuf::from("docs/test-cases.md")],
                relationship_targets: vec!["FT-".to_string()],
                deprecated: false,
            },
        );
        patterns.insert(
            "FT-".to_string(),
            IdentifierPatternConfig {
                name: "Feature".to_string(),
                pattern: r"\bFT-[A-Z0-9]+-\d+\b".to_string(),
                flexible_pattern: r"\bFT-[A-Za-z0-9_-]+\b".to_string(),
                primary_files: vec![PathBuf::from("docs/features.md")],
                relationship_targets: vec!["TC-".to_string()],
                deprecated: false,
            },
        );
        patterns.insert(
            "REQ-".to_string(),
            IdentifierPatternConfig {
                name: "Requirement".to_string(),
                pattern: r"\bREQ-[A-Z0-9]+-\d+\b".to_string(),
                flexible_pattern: r"\bREQ-[A-Za-z0-9_-]+\b".to_string(),
                primary_files: vec![PathBuf::from("docs/requirements.md")],
                relationship_targets: vec!["FT-".to_string(), "TC-".to_string()],
                deprecated: false,
            },
        );
        patterns
    }
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            patterns: Self::builtin_defaults(),
            validate_relationships: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_cover_core_prefixes() {
        let config = PatternConfig::default();
        let prefixes = config.enabled_prefixes();
        assert!(prefixes.contains(&"TC-"));
        assert!(prefixes.contains(&"FT-"));
        assert!(prefixes.contains(&"REQ-"));
        assert_eq!(config.primary_prefixes().len(), 3);
    }

    #[test]
    fn test_strict_matcher_matches_canonical_ids() {
        let config = PatternConfig::default();
        let matcher = config.matcher_for("TC-", true);
        assert!(matcher.is_match("TC-CORE-001"));
        assert!(!matcher.is_match("TC-core-lowercase"));

        let flexible = config.matcher_for("TC-", false);
        assert!(flexible.is_match("TC-core-lowercase"));
    }

    #[test]
    fn test_unconfigured_prefix_falls_back_to_generic() {
        let config = PatternConfig::default();
        let matcher = config.matcher_for("US-", true);
        assert!(matcher.is_match("US-LOGIN-7"));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PatternConfig::load(dir.path());
        assert_eq!(config.enabled_prefixes().len(), 3);
    }

    #[test]
    fn test_malformed_entry_is_dropped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            concat!(
                "patterns:\n",
                "  'GOOD-':\n",
                "    name: Good\n",
                "    pattern: 'GOOD-\\d+'\n",
                "    flexible_pattern: 'GOOD-[a-z0-9]+'\n",
                "  'BAD-':\n",
                "    name: Bad\n",
                "    pattern: 'BAD-[unclosed'\n",
                "    flexible_pattern: 'BAD-\\d+'\n",
            )
        )
        .unwrap();

        let config = PatternConfig::load(dir.path());
        assert!(config.config_for("GOOD-").is_some());
        assert!(config.config_for("BAD-").is_none());
    }

    #[test]
    fn test_fully_malformed_document_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "][ not yaml").unwrap();
        let config = PatternConfig::load(dir.path());
        assert!(config.config_for("TC-").is_some());
    }
}
