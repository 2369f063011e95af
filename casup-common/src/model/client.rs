// casup-common/src/model/client.rs
use std::fmt;
use std::path::PathBuf;

use serde::{Serialize, Serializer};

/// `major.minor` version reported by the uploader client. `(0, 0)` means the
/// version could not be determined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientVersion {
    pub major: u32,
    pub minor: u32,
}

impl ClientVersion {
    pub const UNKNOWN: ClientVersion = ClientVersion { major: 0, minor: 0 };
    /// First client release able to dump per-file content details.
    pub const FILE_DETAILS: ClientVersion = ClientVersion { major: 1, minor: 0 };

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn supports_file_details(&self) -> bool {
        *self >= Self::FILE_DETAILS
    }
}

impl fmt::Display for ClientVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl Serialize for ClientVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Everything needed to invoke the uploader. Resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadClientInfo {
    pub instance_id: String,
    pub service_address: String,
    pub client_executable_path: PathBuf,
    pub client_version: ClientVersion,
}
