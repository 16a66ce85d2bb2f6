//! modos runtime binary
//!
//! Usage:
//!   modos [--config <file>] [--modules-dir <dir>] [--data-dir <dir>]
//!         [--log-filter <filter>] [--no-discovery] [--json-logs]

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use modos::bootstrap::{Bootstrap, BootstrapOptions};
use modos::config::{LoggingConfig, RuntimeConfig};
use modos::module::{default_core_definitions, ModuleLoader};
use modos::services::builtin_factories;
use modos::utils::wait_for_shutdown_signal;

#[derive(Parser, Debug)]
#[command(name = "modos", version, about = "Modular runtime bootstrapper")]
struct Args {
    /// Configuration file (.json or .toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory scanned for extension modules
    #[arg(long)]
    modules_dir: Option<PathBuf>,

    /// Directory for module data and state
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log filter (RUST_LOG still takes precedence)
    #[arg(long)]
    log_filter: Option<String>,

    /// Skip extension discovery
    #[arg(long)]
    no_discovery: bool,

    /// Emit JSON logs (requires the json-logging feature)
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn load_config(&self) -> anyhow::Result<RuntimeConfig> {
        let mut config = match &self.config {
            Some(path) => RuntimeConfig::from_file(path)?,
            None => RuntimeConfig::default(),
        };
        config.apply_env_overrides();

        if let Some(dir) = &self.modules_dir {
            config.modules.modules_dir = dir.clone();
        }
        if let Some(dir) = &self.data_dir {
            config.modules.data_dir = dir.clone();
        }
        if self.log_filter.is_some() || self.json_logs {
            let logging = config.logging.get_or_insert_with(LoggingConfig::default);
            if let Some(filter) = &self.log_filter {
                logging.filter = Some(filter.clone());
            }
            logging.json_format |= self.json_logs;
        }
        if self.no_discovery {
            config.bootstrap.discovery = false;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("modos: {:#}", e);
            return ExitCode::from(2);
        }
    };

    let loader = ModuleLoader::new(builtin_factories(&config), &config.modules.data_dir);
    let mut bootstrap = Bootstrap::new(default_core_definitions(), loader)
        .with_options(BootstrapOptions::from(&config.bootstrap));

    match bootstrap.bootstrap().await {
        Ok(report) => {
            let skipped = report.skipped();
            let failed = report.failed();
            if !skipped.is_empty() {
                tracing::warn!("Skipped modules: {}", skipped.join(", "));
            }
            if !failed.is_empty() {
                tracing::warn!("Failed modules: {}", failed.join(", "));
            }
        }
        Err(e) => {
            eprintln!("modos: bootstrap failed: {}", e);
            return ExitCode::FAILURE;
        }
    }

    tracing::info!(
        "modos ready with {} module(s); waiting for shutdown signal",
        bootstrap.registry().len()
    );
    let signal = wait_for_shutdown_signal().await;
    tracing::debug!("Shutdown requested by {}", signal);

    let report = bootstrap.shutdown().await;
    if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        for (name, error) in &report.failures {
            tracing::error!("Module {} did not stop cleanly: {}", name, error);
        }
        ExitCode::FAILURE
    }
}
