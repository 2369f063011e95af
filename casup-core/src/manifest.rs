// casup-core/src/manifest.rs
use std::collections::BTreeMap;
use std::path::Path;

use casup_aio::json_io::{to_pretty_json, write_json_sync};
use casup_common::error::Result;
use casup_common::model::{ClientVersion, UploadClientInfo, UploadResult};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

/// The digest manifest written at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestManifest {
    pub cas_instance: String,
    pub cas_service: String,
    pub client_version: ClientVersion,
    /// Artifact display name -> `<hash>/<size>` digest.
    pub files: BTreeMap<String, String>,
}

/// Per-file content details of one artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactDetails {
    pub artifact: String,
    pub details: Vec<Value>,
}

/// Accumulates upload results for the whole run. Nothing is written until
/// [`ResultAggregator::write`].
#[derive(Debug, Clone)]
pub struct ResultAggregator {
    cas_instance: String,
    cas_service: String,
    client_version: ClientVersion,
    files: BTreeMap<String, String>,
    details: BTreeMap<String, Vec<Value>>,
}

impl ResultAggregator {
    pub fn new(client: &UploadClientInfo) -> Self {
        Self {
            cas_instance: client.instance_id.clone(),
            cas_service: client.service_address.clone(),
            client_version: client.client_version,
            files: BTreeMap::new(),
            details: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, name: impl Into<String>, result: UploadResult) {
        let name = name.into();
        if let Some(details) = result.file_details {
            self.details.insert(name.clone(), details);
        }
        self.files.insert(name, result.digest);
    }

    #[cfg(test)]
    fn digest_of(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn digest_manifest(&self) -> DigestManifest {
        DigestManifest {
            cas_instance: self.cas_instance.clone(),
            cas_service: self.cas_service.clone(),
            client_version: self.client_version,
            files: self.files.clone(),
        }
    }

    pub fn content_details(&self) -> Vec<ArtifactDetails> {
        self.details
            .iter()
            .map(|(artifact, details)| ArtifactDetails {
                artifact: artifact.clone(),
                details: details.clone(),
            })
            .collect()
    }

    pub fn render_digests(&self) -> Result<String> {
        to_pretty_json(&self.digest_manifest())
    }

    pub fn render_details(&self) -> Result<String> {
        to_pretty_json(&self.content_details())
    }

    /// Writes both manifests. Called once, at the end of the run.
    pub fn write(&self, digests_path: &Path, details_path: &Path) -> Result<()> {
        write_json_sync(digests_path, &self.digest_manifest())?;
        info!("Output digests to {}", digests_path.display());
        write_json_sync(details_path, &self.content_details())?;
        info!("Output content details to {}", details_path.display());
        Ok(())
    }
}
