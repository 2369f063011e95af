// casup-core/src/plan.rs
//! Fallback synthesis and duplicate suppression across catalog rules.

use std::collections::HashSet;
use std::fmt;

use casup_common::model::ArtifactRule;
use tracing::debug;

/// Returns `rules` followed by one fallback for every rule that is chunked
/// with `chunk_fallback` set. Original rules keep their order and come first,
/// so they win over their fallbacks.
pub fn with_fallbacks(rules: Vec<ArtifactRule>) -> Vec<ArtifactRule> {
    let fallbacks: Vec<ArtifactRule> = rules.iter().filter_map(ArtifactRule::fallback).collect();
    for fallback in &fallbacks {
        debug!(
            "Added fallback for {} (unzip={}, chunk={})",
            fallback.pattern, fallback.unzip, fallback.chunk
        );
    }
    let mut expanded = rules;
    expanded.extend(fallbacks);
    expanded
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyUploaded,
    Suppressed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyUploaded => write!(f, "already uploaded under the same name"),
            SkipReason::Suppressed => write!(f, "already uploaded as chunked content"),
        }
    }
}

/// Run-scoped record of what has been uploaded.
#[derive(Debug, Default, Clone)]
pub struct DedupState {
    uploaded_names: HashSet<String>,
    skip_basenames: HashSet<String>,
}

impl DedupState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_reason(&self, name: &str, basename: &str) -> Option<SkipReason> {
        if self.uploaded_names.contains(name) {
            Some(SkipReason::AlreadyUploaded)
        } else if self.skip_basenames.contains(basename) {
            Some(SkipReason::Suppressed)
        } else {
            None
        }
    }

    pub fn should_skip(&self, name: &str, basename: &str) -> bool {
        self.skip_reason(name, basename).is_some()
    }

    /// Records a successful upload of `basename` under `name`.
    ///
    /// A chunked upload suppresses every later rule matching the same file,
    /// except when it is a single-file upload whose plain fallback is still
    /// wanted.
    pub fn record_success(&mut self, rule: &ArtifactRule, name: &str, basename: &str) {
        self.uploaded_names.insert(name.to_string());
        if rule.chunk && !(rule.chunk_fallback && !rule.is_directory_based()) {
            debug!("Suppressing further uploads of {}", basename);
            self.skip_basenames.insert(basename.to_string());
        }
    }

    #[cfg(test)]
    fn is_uploaded(&self, name: &str) -> bool {
        self.uploaded_names.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_fallback_per_chunk_fallback_rule() {
        let rules = vec![
            ArtifactRule::new("X-img-*zip", true).chunked(true),
            ArtifactRule::new("general-tests.zip", true),
            ArtifactRule::new("*-target_files-*.zip", false).chunked(true),
            ArtifactRule::new("chunk-only.zip", false).chunked(false),
        ];

        let expanded = with_fallbacks(rules.clone());
        assert_eq!(expanded.len(), 6);
        assert_eq!(&expanded[..4], &rules[..]);

        let first = &expanded[4];
        assert_eq!(first.pattern, "X-img-*zip");
        assert!(!first.unzip && first.chunk);

        let second = &expanded[5];
        assert_eq!(second.pattern, "*-target_files-*.zip");
        assert!(!second.unzip && !second.chunk);
    }

    #[test]
    fn test_chunked_directory_success_suppresses_its_fallback() {
        let rule = ArtifactRule::new("X-img-*zip", true).chunked(true);
        let fallback = rule.fallback().unwrap();
        let mut state = DedupState::new();

        let name = rule.display_name("X-img-001.zip");
        assert!(!state.should_skip(&name, "X-img-001.zip"));
        state.record_success(&rule, &name, "X-img-001.zip");

        let fallback_name = fallback.display_name("X-img-001.zip");
        assert_ne!(fallback_name, name);
        assert_eq!(
            state.skip_reason(&fallback_name, "X-img-001.zip"),
            Some(SkipReason::Suppressed)
        );
    }

    #[test]
    fn test_chunked_file_success_keeps_plain_fallback() {
        let rule = ArtifactRule::new("*-target_files-*.zip", false).chunked(true);
        let fallback = rule.fallback().unwrap();
        let mut state = DedupState::new();

        state.record_success(&rule, &rule.display_name("t-target_files-1.zip"), "t-target_files-1.zip");
        assert!(!state.should_skip(&fallback.display_name("t-target_files-1.zip"), "t-target_files-1.zip"));
    }

    #[test]
    fn test_chunk_only_rule_suppresses_generic_matches() {
        let rule = ArtifactRule::new("big-tests.zip", true).chunked(false);
        let generic = ArtifactRule::new("*-tests.zip", true);
        let mut state = DedupState::new();

        state.record_success(&rule, &rule.display_name("big-tests.zip"), "big-tests.zip");
        assert!(state.should_skip(&generic.display_name("big-tests.zip"), "big-tests.zip"));
        assert!(!state.should_skip(&generic.display_name("small-tests.zip"), "small-tests.zip"));
    }

    #[test]
    fn test_same_name_is_uploaded_once() {
        let rule = ArtifactRule::new("general-tests.zip", true);
        let mut state = DedupState::new();
        state.record_success(&rule, "general-tests.zip", "general-tests.zip");

        assert!(state.is_uploaded("general-tests.zip"));
        assert_eq!(
            state.skip_reason("general-tests.zip", "general-tests.zip"),
            Some(SkipReason::AlreadyUploaded)
        );
    }
}
