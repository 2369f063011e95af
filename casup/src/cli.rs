// casup/src/cli.rs
//! Defines the command-line argument structure using clap.
use std::path::PathBuf;
use std::time::Duration;

use casup_aio::process::SystemRunner;
use casup_common::config::{Config, UploadSettings, UPLOADER_TIMEOUT_SECS};
use casup_common::error::Result;
use casup_common::Catalog;
use casup_core::{locate_client, resolve_client_info, run_uploads, UploadRun};
use clap::{ArgAction, Parser};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "casup", bin_name = "casup")]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Name of an experiment artifact configuration to upload as well
    #[arg(
        long = "experiment_artifacts",
        alias = "experiment-artifacts",
        value_name = "NAME",
        action = ArgAction::Append
    )]
    pub experiment_artifacts: Vec<String>,

    /// TOML artifact catalog to use instead of the built-in one
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Path to the casuploader binary, skipping the prebuilt search
    #[arg(long, value_name = "PATH")]
    pub client: Option<PathBuf>,

    /// Directory the prebuilt client search starts from
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub tools_root: PathBuf,

    /// Timeout of a single client invocation
    #[arg(long, value_name = "SECS", default_value_t = UPLOADER_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

impl CliArgs {
    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog {
            Some(path) => Catalog::from_toml_file(path),
            None => {
                debug!("Using the built-in artifact catalog");
                Ok(Catalog::builtin())
            }
        }
    }

    pub fn upload_settings(&self) -> UploadSettings {
        UploadSettings {
            timeout: Duration::from_secs(self.timeout_secs),
            ..UploadSettings::default()
        }
    }

    pub async fn run(&self, config: &Config) -> Result<()> {
        let catalog = self.load_catalog()?;
        let client_path = match &self.client {
            Some(path) => {
                info!("Using client at {}", path.display());
                path.clone()
            }
            None => locate_client(&self.tools_root)?,
        };

        let rules = catalog.rules_with_experiments(&self.experiment_artifacts);
        let runner = SystemRunner;
        let client = resolve_client_info(&runner, config, client_path).await;
        let run = UploadRun {
            config: config.clone(),
            client,
            settings: self.upload_settings(),
            scratch_root: None,
        };

        let summary = run_uploads(&runner, &run, rules).await?;
        println!(
            "Uploaded {} artifact(s) to CAS ({} failed, {} skipped); digests in {}",
            summary.uploaded.len(),
            summary.failed.len(),
            summary.skipped.len(),
            config.digests_path().display()
        );
        Ok(())
    }
}
