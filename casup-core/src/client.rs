// casup-core/src/client.rs
//! Locating the `casuploader` binary and asking it for its version.

use std::path::{Path, PathBuf};
use std::time::Duration;

use casup_aio::process::{CommandRunner, Invocation};
use casup_common::config::Config;
use casup_common::error::{CasupError, Result};
use casup_common::model::{ClientVersion, UploadClientInfo};
use regex::Regex;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const CAS_UPLOADER_PATH: &str = "tools/content_addressed_storage/prebuilts/";
pub const CAS_UPLOADER_PREBUILT_PATH: &str = "tools/tradefederation/prebuilts/";
pub const CAS_UPLOADER_BIN: &str = "casuploader";

const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// Finds the uploader below `search_root`: the installed location first, then
/// anywhere under the prebuilt tools tree.
pub fn locate_client(search_root: &Path) -> Result<PathBuf> {
    let installed = search_root.join(CAS_UPLOADER_PATH).join(CAS_UPLOADER_BIN);
    if installed.is_file() {
        info!("Using client at {}", installed.display());
        return Ok(installed);
    }

    let prebuilts = search_root.join(CAS_UPLOADER_PREBUILT_PATH);
    debug!(
        "{} not found, searching {}",
        installed.display(),
        prebuilts.display()
    );
    let found = WalkDir::new(&prebuilts)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| entry.file_type().is_file() && entry.file_name() == CAS_UPLOADER_BIN)
        .map(|entry| entry.into_path());

    match found {
        Some(path) => {
            info!("Using client at {}", path.display());
            Ok(path)
        }
        None => Err(CasupError::NotFound(format!(
            "Could not find {CAS_UPLOADER_BIN} binary under {} or {}",
            search_root.join(CAS_UPLOADER_PATH).display(),
            prebuilts.display()
        ))),
    }
}

/// Extracts the first `major.minor` pair from the client's version text.
pub fn parse_version(text: &str) -> Option<ClientVersion> {
    let re = Regex::new(r"(\d+)\.(\d+)").ok()?;
    let caps = re.captures(text)?;
    let major = caps.get(1)?.as_str().parse().ok()?;
    let minor = caps.get(2)?.as_str().parse().ok()?;
    Some(ClientVersion::new(major, minor))
}

/// Runs `<client> -version`. Any failure yields [`ClientVersion::UNKNOWN`],
/// which disables version-gated features instead of aborting.
pub async fn probe_version<R: CommandRunner>(runner: &R, client: &Path) -> ClientVersion {
    let invocation = Invocation::new(client, vec!["-version".to_string()], VERSION_PROBE_TIMEOUT);
    let output = match runner.run(&invocation).await {
        Ok(output) if output.success => output,
        Ok(output) => {
            warn!(
                "Failed to get the version of {} ({}), assuming 0.0",
                client.display(),
                output.status
            );
            return ClientVersion::UNKNOWN;
        }
        Err(e) => {
            warn!(
                "Failed to get the version of {}: {}, assuming 0.0",
                client.display(),
                e
            );
            return ClientVersion::UNKNOWN;
        }
    };

    let text = format!("{}\n{}", output.stdout, output.stderr);
    match parse_version(&text) {
        Some(version) => {
            info!("Client version: {}", version);
            version
        }
        None => {
            warn!(
                "Could not parse the client version from '{}', assuming 0.0",
                text.trim()
            );
            ClientVersion::UNKNOWN
        }
    }
}

/// Bundles the CAS endpoint from `config` with the client binary and its version.
pub async fn resolve_client_info<R: CommandRunner>(
    runner: &R,
    config: &Config,
    client: PathBuf,
) -> UploadClientInfo {
    let client_version = probe_version(runner, &client).await;
    UploadClientInfo {
        instance_id: config.cas_instance.clone(),
        service_address: config.cas_service.clone(),
        client_executable_path: client,
        client_version,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::test_support::FakeClient;

    #[test]
    fn test_parse_version() {
        assert_eq!(
            parse_version("casuploader version 1.3"),
            Some(ClientVersion::new(1, 3))
        );
        assert_eq!(
            parse_version("v0.9.2-beta"),
            Some(ClientVersion::new(0, 9))
        );
        assert_eq!(parse_version("unknown"), None);
    }

    #[test]
    fn test_prefers_installed_client() {
        let root = tempfile::tempdir().unwrap();
        let installed = root.path().join(CAS_UPLOADER_PATH);
        let prebuilt = root.path().join(CAS_UPLOADER_PREBUILT_PATH).join("linux-x86");
        fs::create_dir_all(&installed).unwrap();
        fs::create_dir_all(&prebuilt).unwrap();
        fs::write(installed.join(CAS_UPLOADER_BIN), b"").unwrap();
        fs::write(prebuilt.join(CAS_UPLOADER_BIN), b"").unwrap();

        let found = locate_client(root.path()).unwrap();
        assert_eq!(found, installed.join(CAS_UPLOADER_BIN));
    }

    #[test]
    fn test_falls_back_to_prebuilt_search() {
        let root = tempfile::tempdir().unwrap();
        let nested = root
            .path()
            .join(CAS_UPLOADER_PREBUILT_PATH)
            .join("filegroups/tools");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join(CAS_UPLOADER_BIN), b"").unwrap();

        let found = locate_client(root.path()).unwrap();
        assert_eq!(found, nested.join(CAS_UPLOADER_BIN));
    }

    #[test]
    fn test_missing_client_is_not_found() {
        let root = tempfile::tempdir().unwrap();
        let err = locate_client(root.path()).unwrap_err();
        assert!(matches!(err, CasupError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_probe_reads_version() {
        let client = FakeClient::with_version("casuploader version 1.2\n");
        let version = probe_version(&client, Path::new("casuploader")).await;
        assert_eq!(version, ClientVersion::new(1, 2));
        assert!(client.calls()[0].has_flag("-version"));
    }

    #[tokio::test]
    async fn test_probe_failure_defaults_to_unknown() {
        let failing = FakeClient::with_version("1.0").failing_version_probe();
        assert_eq!(
            probe_version(&failing, Path::new("casuploader")).await,
            ClientVersion::UNKNOWN
        );

        let garbled = FakeClient::with_version("no version here");
        assert_eq!(
            probe_version(&garbled, Path::new("casuploader")).await,
            ClientVersion::UNKNOWN
        );
    }

    #[tokio::test]
    async fn test_resolve_client_info() {
        let config = Config {
            cas_instance: "inst".to_string(),
            cas_service: "svc:443".to_string(),
            dist_dir: PathBuf::from("/dist"),
        };
        let client = FakeClient::with_version("1.0");
        let info = resolve_client_info(&client, &config, PathBuf::from("/bin/casuploader")).await;
        assert_eq!(info.instance_id, "inst");
        assert_eq!(info.service_address, "svc:443");
        assert_eq!(info.client_version, ClientVersion::new(1, 0));
    }
}
