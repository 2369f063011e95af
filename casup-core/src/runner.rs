// casup-core/src/runner.rs
//! Drives a whole run: rules in order, files one at a time, manifest last.

use std::path::PathBuf;
use std::time::Instant;

use casup_aio::process::CommandRunner;
use casup_common::config::{Config, UploadSettings};
use casup_common::error::Result;
use casup_common::model::{ArtifactRule, ResolvedArtifact, UploadClientInfo};
use tracing::{debug, info, warn};

use crate::manifest::ResultAggregator;
use crate::plan::{with_fallbacks, DedupState};
use crate::resolve::resolve;
use crate::upload::upload;

/// Everything a run needs besides the rules.
#[derive(Debug, Clone)]
pub struct UploadRun {
    pub config: Config,
    pub client: UploadClientInfo,
    pub settings: UploadSettings,
    /// Parent for the run's scratch directory. System temp dir when `None`.
    pub scratch_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub uploaded: Vec<String>,
    pub failed: Vec<String>,
    pub skipped: Vec<String>,
}

/// Uploads every file matched by `rules` (plus synthesized fallbacks) and
/// writes the manifests. Only configuration-level problems are returned as
/// errors; per-file failures end up in [`RunSummary::failed`].
pub async fn run_uploads<R: CommandRunner>(
    runner: &R,
    run: &UploadRun,
    rules: Vec<ArtifactRule>,
) -> Result<RunSummary> {
    let start = Instant::now();
    let working_dir = match &run.scratch_root {
        Some(root) => tempfile::tempdir_in(root)?,
        None => tempfile::tempdir()?,
    };
    info!("The working dir is {}", working_dir.path().display());

    let rules = with_fallbacks(rules);
    let log_file = run.config.log_file();
    let mut dedup = DedupState::new();
    let mut aggregator = ResultAggregator::new(&run.client);
    let mut summary = RunSummary::default();

    for rule in &rules {
        for path in resolve(rule, run.config.dist_dir())? {
            let artifact = ResolvedArtifact::new(rule, path);
            let name = artifact.display_name();
            let basename = artifact.basename();

            if let Some(reason) = dedup.skip_reason(&name, &basename) {
                debug!("Skip uploading {} ({}): {}", name, rule.pattern, reason);
                summary.skipped.push(name);
                continue;
            }

            match upload(
                runner,
                &run.client,
                &artifact,
                working_dir.path(),
                &log_file,
                &run.settings,
            )
            .await
            {
                Ok(result) => {
                    dedup.record_success(rule, &name, &basename);
                    aggregator.record(name.clone(), result);
                    summary.uploaded.push(name);
                }
                Err(failure) => {
                    warn!(
                        "Skip to save the digest of file {}, the uploading may fail: {}",
                        name, failure
                    );
                    summary.failed.push(name);
                }
            }
        }
    }

    aggregator.write(&run.config.digests_path(), &run.config.details_path())?;
    info!(
        "Total time of uploading build artifacts to CAS: {} seconds ({} uploaded, {} failed, {} skipped)",
        start.elapsed().as_secs(),
        summary.uploaded.len(),
        summary.failed.len(),
        summary.skipped.len()
    );
    Ok(summary)
}
