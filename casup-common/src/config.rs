// casup-common/src/config.rs
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use super::error::{CasupError, Result};

pub const CAS_INSTANCE_ENV: &str = "RBE_instance";
pub const CAS_SERVICE_ENV: &str = "RBE_service";
pub const DIST_DIR_ENV: &str = "DIST_DIR";

/// Append-only uploader log, relative to the distribution directory.
pub const LOG_PATH: &str = "logs/cas_uploader.log";
pub const DIGESTS_FILENAME: &str = "cas_digests.json";
pub const CONTENT_DETAILS_FILENAME: &str = "cas_content_details.json";

pub const UPLOADER_TIMEOUT_SECS: u64 = 600; // 10 minutes
pub const AVG_CHUNK_SIZE_IN_KB: u64 = 128;

#[derive(Debug, Clone)]
pub struct Config {
    pub cas_instance: String,
    pub cas_service: String,
    pub dist_dir: PathBuf,
}

impl Config {
    /// Reads the run configuration from the process environment.
    pub fn load() -> Result<Self> {
        debug!("Loading casup configuration from environment");
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Missing or empty
    /// values are configuration errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key).filter(|v| !v.is_empty()).ok_or_else(|| {
                CasupError::Config(format!("the environment variable {key} is not set"))
            })
        };

        let cas_instance = required(CAS_INSTANCE_ENV)?;
        let cas_service = required(CAS_SERVICE_ENV)?;
        let dist_dir = PathBuf::from(required(DIST_DIR_ENV)?);

        debug!(
            "Configuration loaded: instance={}, service={}, dist_dir={}",
            cas_instance,
            cas_service,
            dist_dir.display()
        );
        Ok(Self {
            cas_instance,
            cas_service,
            dist_dir,
        })
    }

    pub fn dist_dir(&self) -> &Path {
        &self.dist_dir
    }

    pub fn log_file(&self) -> PathBuf {
        self.dist_dir.join(LOG_PATH)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.log_file()
            .parent()
            .map_or_else(|| self.dist_dir.clone(), Path::to_path_buf)
    }

    pub fn digests_path(&self) -> PathBuf {
        self.dist_dir.join(DIGESTS_FILENAME)
    }

    pub fn details_path(&self) -> PathBuf {
        self.dist_dir.join(CONTENT_DETAILS_FILENAME)
    }
}

/// Tunables for a single client invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadSettings {
    pub timeout: Duration,
    pub avg_chunk_size: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(UPLOADER_TIMEOUT_SECS),
            avg_chunk_size: AVG_CHUNK_SIZE_IN_KB * 1024,
        }
    }
}
