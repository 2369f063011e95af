// casup-common/src/model/artifact.rs
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Display-name prefix for artifacts uploaded as a single chunked file.
pub const CHUNKED_ARTIFACT_NAME_PREFIX: &str = "_chunked_";
/// Display-name prefix for zip artifacts expanded and uploaded as a chunked directory.
pub const CHUNKED_DIR_ARTIFACT_NAME_PREFIX: &str = "_chunked_dir_";

/// One matching policy of the artifact catalog.
///
/// A rule describes which files to pick up (a glob relative to the
/// distribution directory) and how the uploader client should treat them. A
/// rule is never bound to a concrete file; see [`ResolvedArtifact`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRule {
    /// Glob pattern matched recursively under the distribution directory.
    #[serde(alias = "source_path")]
    pub pattern: String,
    /// Upload the zip as the directory tree it contains.
    #[serde(default)]
    pub unzip: bool,
    /// Let the client split the content into chunks.
    #[serde(default)]
    pub chunk: bool,
    /// Also upload a non-chunked variant when chunking is enabled.
    #[serde(default)]
    pub chunk_fallback: bool,
    /// Regular expressions for files excluded from the upload.
    #[serde(default)]
    pub exclude_filters: Vec<String>,
}

impl ArtifactRule {
    pub fn new(pattern: impl Into<String>, unzip: bool) -> Self {
        Self {
            pattern: pattern.into(),
            unzip,
            chunk: false,
            chunk_fallback: false,
            exclude_filters: Vec::new(),
        }
    }

    pub fn chunked(mut self, chunk_fallback: bool) -> Self {
        self.chunk = true;
        self.chunk_fallback = chunk_fallback;
        self
    }

    pub fn with_exclude_filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_filters = filters.into_iter().map(Into::into).collect();
        self
    }

    /// True when the client receives directory-shaped content for this rule.
    pub fn is_directory_based(&self) -> bool {
        self.unzip
    }

    /// Name under which a file matched by this rule is recorded in the manifest.
    pub fn display_name(&self, basename: &str) -> String {
        match (self.chunk, self.unzip) {
            (false, _) => basename.to_string(),
            (true, true) => format!("{CHUNKED_DIR_ARTIFACT_NAME_PREFIX}{basename}"),
            (true, false) => format!("{CHUNKED_ARTIFACT_NAME_PREFIX}{basename}"),
        }
    }

    /// The non-chunked variant uploaded next to a chunked rule, if any.
    pub fn fallback(&self) -> Option<ArtifactRule> {
        if !(self.chunk && self.chunk_fallback) {
            return None;
        }
        let mut fallback = self.clone();
        fallback.chunk_fallback = false;
        if self.unzip {
            fallback.unzip = false;
        } else {
            fallback.chunk = false;
        }
        Some(fallback)
    }
}

/// A rule bound to one file it matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub rule: ArtifactRule,
    pub source_path: PathBuf,
}

impl ResolvedArtifact {
    pub fn new(rule: &ArtifactRule, source_path: impl Into<PathBuf>) -> Self {
        Self {
            rule: rule.clone(),
            source_path: source_path.into(),
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn basename(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_path.to_string_lossy().into_owned())
    }

    pub fn display_name(&self) -> String {
        self.rule.display_name(&self.basename())
    }
}
