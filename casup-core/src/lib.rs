// casup-core/src/lib.rs

// Declare the top-level modules within the library crate
pub mod client;
pub mod manifest;
pub mod plan;
pub mod resolve;
pub mod runner;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export key types for easier use by the CLI crate
pub use client::{locate_client, probe_version, resolve_client_info};
pub use manifest::{DigestManifest, ResultAggregator};
pub use plan::{with_fallbacks, DedupState};
pub use resolve::resolve;
pub use runner::{run_uploads, RunSummary, UploadRun};
pub use upload::upload;
