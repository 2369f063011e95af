// casup-core/src/upload.rs
//! One invocation of the uploader client for one matched file.

use std::path::{Path, PathBuf};
use std::time::Instant;

use casup_aio::fs::{read_to_string, scratch_dir, scratch_file, stage_file_into};
use casup_aio::process::{CommandRunner, Invocation};
use casup_common::config::UploadSettings;
use casup_common::error::UploadFailure;
use casup_common::model::{ResolvedArtifact, UploadClientInfo, UploadResult};
use serde_json::Value;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// How the matched file is handed to the client.
#[derive(Debug)]
pub enum StagedInput {
    /// The zip is expanded by the client and uploaded as a directory tree.
    Zip(PathBuf),
    /// The file is uploaded as-is, chunked by the client.
    File(PathBuf),
    /// A private directory holding only the file.
    Dir(TempDir),
}

impl StagedInput {
    pub fn flag(&self) -> &'static str {
        match self {
            StagedInput::Zip(_) => "-zip-path",
            StagedInput::File(_) => "-file-path",
            StagedInput::Dir(_) => "-dir-path",
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            StagedInput::Zip(path) | StagedInput::File(path) => path,
            StagedInput::Dir(dir) => dir.path(),
        }
    }
}

/// Picks the staging mode from the rule flags, staging into `working_dir` when
/// a directory is needed.
pub fn stage(artifact: &ResolvedArtifact, working_dir: &Path) -> Result<StagedInput, UploadFailure> {
    let rule = &artifact.rule;
    if rule.unzip {
        return Ok(StagedInput::Zip(artifact.source_path.clone()));
    }
    if rule.chunk {
        return Ok(StagedInput::File(artifact.source_path.clone()));
    }

    let dir = scratch_dir(working_dir, "stage").map_err(|e| UploadFailure::Staging(e.to_string()))?;
    stage_file_into(artifact.source_path(), dir.path())
        .map_err(|e| UploadFailure::Staging(e.to_string()))?;
    Ok(StagedInput::Dir(dir))
}

/// Arguments for uploading `input` according to `artifact`'s rule.
pub fn build_args(
    client: &UploadClientInfo,
    artifact: &ResolvedArtifact,
    input: &StagedInput,
    digest_file: &Path,
    details_file: Option<&Path>,
    settings: &UploadSettings,
) -> Vec<String> {
    let mut args = vec![
        "-cas-instance".to_string(),
        client.instance_id.clone(),
        "-cas-addr".to_string(),
        client.service_address.clone(),
        "-dump-digest".to_string(),
        digest_file.display().to_string(),
        "-use-adc".to_string(),
        input.flag().to_string(),
        input.path().display().to_string(),
    ];

    for exclude_filter in &artifact.rule.exclude_filters {
        args.push("-exclude-filters".to_string());
        args.push(exclude_filter.clone());
    }

    if artifact.rule.chunk {
        args.push("-chunk".to_string());
        args.push("-avg-chunk-size".to_string());
        args.push(settings.avg_chunk_size.to_string());
    }

    if let Some(path) = details_file {
        args.push("-dump-file-details".to_string());
        args.push(path.display().to_string());
    }
    args
}

/// Uploads one matched file and reads back its digest.
///
/// Every failure is scoped to this file. Scratch files and staging
/// directories are removed on all paths.
pub async fn upload<R: CommandRunner>(
    runner: &R,
    client: &UploadClientInfo,
    artifact: &ResolvedArtifact,
    working_dir: &Path,
    log_file: &Path,
    settings: &UploadSettings,
) -> Result<UploadResult, UploadFailure> {
    let start = Instant::now();
    let source = artifact.source_path().display().to_string();
    info!("Uploading {} to CAS instance {}", source, client.instance_id);

    let digest_file =
        scratch_file(working_dir, "digest").map_err(|e| UploadFailure::Staging(e.to_string()))?;
    let details_file = if client.client_version.supports_file_details() {
        Some(scratch_file(working_dir, "details").map_err(|e| UploadFailure::Staging(e.to_string()))?)
    } else {
        debug!(
            "Client version {} cannot dump file details",
            client.client_version
        );
        None
    };
    let input = stage(artifact, working_dir)?;

    let args = build_args(
        client,
        artifact,
        &input,
        digest_file.path(),
        details_file.as_ref().map(|f| f.path()),
        settings,
    );
    let invocation = Invocation::new(&client.client_executable_path, args, settings.timeout)
        .logging_to(log_file);

    let output = runner.run(&invocation).await.map_err(|e| {
        warn!("Failed to upload {} to CAS instance {}: {}", source, client.instance_id, e);
        UploadFailure::from(e)
    })?;
    if !output.success {
        warn!(
            "Failed to upload {} to CAS instance {} ({}). Skip.",
            source, client.instance_id, output.status
        );
        return Err(UploadFailure::NonZeroExit(output.status));
    }
    info!(
        "Elapsed time of uploading {}: {} seconds",
        source,
        start.elapsed().as_secs()
    );

    let digest = read_to_string(digest_file.path())
        .map(|d| d.trim().to_string())
        .unwrap_or_default();
    if digest.is_empty() {
        warn!("No digest is dumped for file {}, the uploading may fail.", source);
        return Err(UploadFailure::EmptyDigest);
    }
    info!("Uploaded {} to CAS. Digest: {}", source, digest);

    let file_details = details_file.and_then(|f| read_file_details(f.path()));
    Ok(UploadResult {
        digest,
        file_details,
    })
}

/// Parses the client's details dump. Anything unreadable degrades to `None`.
fn read_file_details(path: &Path) -> Option<Vec<Value>> {
    let content = match read_to_string(path) {
        Ok(content) if !content.trim().is_empty() => content,
        Ok(_) => {
            debug!("Empty file details dump at {}", path.display());
            return None;
        }
        Err(e) => {
            warn!("Failed to read file details {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Array(records)) => Some(records),
        Ok(other) => {
            warn!(
                "Unexpected file details format in {} (expected a list, got {})",
                path.display(),
                json_kind(&other)
            );
            None
        }
        Err(e) => {
            warn!("Failed to parse file details {}: {}", path.display(), e);
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
