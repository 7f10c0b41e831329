//! # Delta Share Fetcher
//!
//! Fetches every table exposed through a Delta Sharing endpoint and
//! persists it locally, either as one Parquet snapshot per table or as
//! streamed per-file CSVs with a combined output.
//!
//! The crate follows a **Ports and Adapters** layout: the orchestrator in
//! `application` only ever sees the `CatalogPort`, `EventSink`, and
//! `OperatorPrompt` traits; the Delta Sharing REST adapter and stdin
//! prompt in `infrastructure` are wired in here.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ports;

use crate::application::orchestrator::FetchOrchestrator;
use crate::application::reporter::{LogSink, RunReporter};
use crate::config::{AppConfig, CliArgs};
use crate::infrastructure::delta::profile::ShareProfile;
use crate::infrastructure::delta::rest_client::DeltaSharingClient;
use crate::infrastructure::stdio::StdinPrompt;
use crate::ports::prompt_port::{AlwaysYes, OperatorPrompt};
use clap::Parser;
use log::{error, info, warn};
use std::path::Path;
use std::process;
use std::sync::Arc;

fn main() {
    env_logger::init();

    let args = CliArgs::parse();

    let mut config = if let Some(config_path) = &args.config {
        match AppConfig::from_file(config_path) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to load config: {}", e);
                process::exit(1);
            }
        }
    } else {
        AppConfig::default_from_cli(&args)
    };

    if let Err(e) = config.merge_cli(&args) {
        error!("Invalid arguments: {}", e);
        process::exit(1);
    }
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        process::exit(1);
    }

    let profile = match ShareProfile::from_file(Path::new(&config.sharing.profile_path)) {
        Ok(p) => p,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };
    info!("Using sharing endpoint {}", profile.base_url());
    if profile.is_expired() {
        warn!(
            "Credential profile expired at {:?}; remote calls will likely fail",
            profile.expiration_time
        );
    }

    let catalog = match DeltaSharingClient::new(profile, config.sharing.request_timeout()) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let prompt: Arc<dyn OperatorPrompt> = if config.fetch.preflight() {
        Arc::new(StdinPrompt)
    } else {
        Arc::new(AlwaysYes)
    };

    let output_dir = config.fetch.output_dir.clone();
    let orchestrator = FetchOrchestrator::new(catalog, Arc::new(LogSink), prompt, config);

    info!("Starting fetch run...");
    match orchestrator.run() {
        Ok(summary) => {
            RunReporter::print_summary(&summary);
            match RunReporter::write_json_report(&summary, Path::new(&output_dir)) {
                Ok(path) => info!("Report written -> {}", path.display()),
                Err(e) => warn!("Could not write JSON report: {}", e),
            }
            // Per-table failures are reported, not signaled via the exit
            // code: the run itself completed.
        }
        Err(e) => {
            error!("Fetch run aborted: {:?}", e);
            process::exit(1);
        }
    }
}
