// casup/src/main.rs
use std::path::Path;
use std::process;
use std::{env, fs};

use casup_common::config::Config;
use casup_common::error::{CasupError, Result as CasupResult};
use clap::Parser;
use colored::Colorize;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

mod cli;
use cli::CliArgs;

const LOG_ENV_VAR: &str = "CASUP_LOG";

/// Sends everything to the append-only log file and warnings to stderr.
/// The returned guard flushes the file writer when dropped.
fn init_logging(log_file: &Path, verbose_level: u8) -> Option<WorkerGuard> {
    let level_filter = match verbose_level {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy();

    let stderr_writer = std::io::stderr.with_max_level(tracing::Level::WARN);

    let log_dir = log_file.parent().unwrap_or_else(|| Path::new("."));
    let file_name = log_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "cas_uploader.log".into());

    if let Err(e) = fs::create_dir_all(log_dir) {
        eprintln!(
            "{} Failed to create log directory {}: {}",
            "Error:".red().bold(),
            log_dir.display(),
            e
        );
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .try_init();
        return None;
    }

    // `never` opens the file in append mode, so earlier runs and the
    // uploader's own output are kept.
    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(stderr_writer.and(non_blocking_appender))
        .with_ansi(false)
        .try_init();

    Some(guard)
}

#[tokio::main]
async fn main() -> CasupResult<()> {
    let cli_args = CliArgs::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            process::exit(1);
        }
    };

    let log_file = config.log_file();
    println!("casup will export logs to: {}", log_file.display());
    let log_guard = init_logging(&log_file, cli_args.verbose);

    debug!(
        "Environment variables of running server: {:?}",
        env::vars().collect::<Vec<_>>()
    );

    if let Err(e) = cli_args.run(&config).await {
        error!("Upload run failed: {:#}", e);
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        drop(log_guard);
        process::exit(exit_code(&e));
    }

    debug!("Upload run completed.");
    Ok(())
}

fn exit_code(err: &CasupError) -> i32 {
    match err {
        CasupError::Config(_) | CasupError::ValidationError(_) => 2,
        _ => 1,
    }
}
