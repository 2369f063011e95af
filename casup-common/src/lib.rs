// casup-common/src/lib.rs
pub mod catalog;
pub mod config;
pub mod error;
pub mod model;

// Re-export key types
pub use catalog::Catalog;
pub use config::{Config, UploadSettings};
pub use error::{CasupError, Result, UploadFailure};
pub use model::{ArtifactRule, ClientVersion, ResolvedArtifact, UploadClientInfo, UploadResult};
