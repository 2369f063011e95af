// casup-common/src/catalog.rs
//! The artifact catalog: which build outputs get uploaded, and how.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{CasupError, Result};
use crate::model::ArtifactRule;

/// Ordered artifact rules plus named experiment rules that are only used when
/// requested on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub artifacts: Vec<ArtifactRule>,
    #[serde(default)]
    pub experiments: BTreeMap<String, ArtifactRule>,
}

impl Catalog {
    pub fn new(artifacts: Vec<ArtifactRule>) -> Self {
        Self {
            artifacts,
            experiments: BTreeMap::new(),
        }
    }

    pub fn with_experiment(mut self, name: impl Into<String>, rule: ArtifactRule) -> Self {
        self.experiments.insert(name.into(), rule);
        self
    }

    /// Default catalog used when no catalog file is given.
    pub fn builtin() -> Self {
        let suites = [
            "android-cts.zip",
            "android-gts.zip",
            "android-mts.zip",
            "android-pts.zip",
            "android-vts.zip",
            "art-host-tests.zip",
            "bazel-test-suite.zip",
            "host-unit-tests.zip",
            "general-tests.zip",
            "general-tests_configs.zip",
            "general-tests_host-shared-libs.zip",
            "google-tradefed.zip",
            "robolectric-tests.zip",
        ];

        let mut artifacts: Vec<ArtifactRule> = suites
            .iter()
            .map(|name| ArtifactRule::new(*name, true))
            .collect();

        // Device target artifacts
        artifacts.push(ArtifactRule::new("androidTest.zip", true));
        artifacts.push(ArtifactRule::new("device-tests.zip", true));
        artifacts.push(ArtifactRule::new("*-img-*zip", false));

        Catalog::new(artifacts)
            .with_experiment(
                "device_image_chunked",
                ArtifactRule::new("*-img-*zip", true).chunked(true),
            )
            .with_experiment(
                "target_files",
                ArtifactRule::new("*-target_files-*.zip", true)
                    .chunked(true)
                    .with_exclude_filters([r"^prebuilts/jdk/.*"]),
            )
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let catalog: Catalog = toml::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        debug!("Loading artifact catalog from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| {
            CasupError::Config(format!(
                "Could not read artifact catalog {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Rejects rules the resolver or the client could not use.
    pub fn validate(&self) -> Result<()> {
        for rule in &self.artifacts {
            validate_rule("artifacts", rule)?;
        }
        for (name, rule) in &self.experiments {
            validate_rule(name, rule)?;
        }
        Ok(())
    }

    /// Looks up the experiment rules named on the command line. Unknown names
    /// are reported and ignored.
    pub fn select_experiments<S: AsRef<str>>(&self, names: &[S]) -> Vec<ArtifactRule> {
        let mut selected = Vec::new();
        for name in names {
            let name = name.as_ref();
            match self.experiments.get(name) {
                Some(rule) => {
                    info!("Added experiment artifact from arguments {}", rule.pattern);
                    selected.push(rule.clone());
                }
                None => warn!("Ignore invalid experiment_artifacts: {}", name),
            }
        }
        selected
    }

    /// Catalog rules in declared order, followed by the requested experiments.
    pub fn rules_with_experiments<S: AsRef<str>>(&self, names: &[S]) -> Vec<ArtifactRule> {
        let mut rules = self.artifacts.clone();
        rules.extend(self.select_experiments(names));
        rules
    }
}

fn validate_rule(section: &str, rule: &ArtifactRule) -> Result<()> {
    if rule.pattern.trim().is_empty() {
        return Err(CasupError::ValidationError(format!(
            "empty pattern in catalog section '{section}'"
        )));
    }
    glob::Pattern::new(&rule.pattern)?;
    for filter in &rule.exclude_filters {
        Regex::new(filter).map_err(|e| {
            CasupError::ValidationError(format!(
                "invalid exclude filter '{filter}' for pattern '{}': {e}",
                rule.pattern
            ))
        })?;
    }
    Ok(())
}
