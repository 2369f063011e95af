// casup-common/src/model/mod.rs
pub mod artifact;
pub mod client;
pub mod upload;

pub use artifact::{ArtifactRule, ResolvedArtifact};
pub use client::{ClientVersion, UploadClientInfo};
pub use upload::UploadResult;
