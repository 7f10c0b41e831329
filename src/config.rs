use crate::domain::entities::FetchMode;
use clap::Parser;
use serde::Deserialize;
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub sharing: SharingConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SharingConfig {
    /// Path to the Delta Sharing credential profile (JSON).
    pub profile_path: String,
    /// Per-request timeout in seconds for remote calls.
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    pub output_dir: String,
    pub mode: Option<FetchMode>,
    pub max_retries: Option<u32>,
    pub retry_delay_secs: Option<u64>,
    /// Pause between tables, throttling request rate.
    pub table_pause_secs: Option<u64>,
    /// Run the size-estimation/confirmation step before the full fetch.
    pub preflight: Option<bool>,
    /// Fetch the first table as a sample before anything else.
    pub sample_first: Option<bool>,
    pub preview_rows: Option<usize>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: AppConfig = if path.ends_with(".json") {
            serde_json::from_str(&contents)?
        } else {
            serde_yaml::from_str(&contents)?
        };

        Ok(config)
    }

    pub fn default_from_cli(args: &CliArgs) -> Self {
        Self {
            sharing: SharingConfig {
                profile_path: args
                    .profile
                    .clone()
                    .unwrap_or_else(|| "credentials/config.share".to_string()),
                request_timeout_secs: None,
            },
            fetch: FetchConfig {
                output_dir: args.output.clone().unwrap_or_else(|| "data/raw".to_string()),
                mode: None,
                max_retries: None,
                retry_delay_secs: None,
                table_pause_secs: None,
                preflight: None,
                sample_first: None,
                preview_rows: None,
            },
        }
    }

    pub fn merge_cli(&mut self, args: &CliArgs) -> Result<(), Box<dyn Error>> {
        if let Some(p) = &args.profile {
            self.sharing.profile_path = p.clone();
        }
        if let Some(o) = &args.output {
            self.fetch.output_dir = o.clone();
        }
        if let Some(m) = &args.mode {
            self.fetch.mode = Some(parse_mode(m)?);
        }
        if let Some(r) = args.max_retries {
            self.fetch.max_retries = Some(r);
        }
        if args.preflight {
            self.fetch.preflight = Some(true);
        }
        if args.yes {
            self.fetch.preflight = Some(false);
        }
        if args.sample {
            self.fetch.sample_first = Some(true);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sharing.profile_path.is_empty() {
            return Err("profile_path must not be empty".to_string());
        }
        if self.fetch.output_dir.is_empty() {
            return Err("output_dir must not be empty".to_string());
        }
        if self.fetch.max_retries == Some(0) {
            return Err("max_retries must be at least 1".to_string());
        }
        Ok(())
    }
}

impl SharingConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(300))
    }
}

impl FetchConfig {
    pub fn mode(&self) -> FetchMode {
        self.mode.unwrap_or(FetchMode::WholeTable)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(3)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs.unwrap_or(2))
    }

    pub fn table_pause(&self) -> Duration {
        Duration::from_secs(self.table_pause_secs.unwrap_or(3))
    }

    pub fn preflight(&self) -> bool {
        self.preflight.unwrap_or(true)
    }

    pub fn sample_first(&self) -> bool {
        self.sample_first.unwrap_or(false)
    }

    pub fn preview_rows(&self) -> usize {
        self.preview_rows.unwrap_or(5)
    }
}

fn parse_mode(s: &str) -> Result<FetchMode, Box<dyn Error>> {
    match s.to_lowercase().as_str() {
        "whole-table" | "whole_table" | "snapshot" => Ok(FetchMode::WholeTable),
        "per-file" | "per_file" | "csv" => Ok(FetchMode::PerFile),
        other => Err(format!("unknown fetch mode: {other} (expected whole-table or per-file)").into()),
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<String>,

    // Overrides for ad-hoc runs
    /// Path to the Delta Sharing credential profile
    #[arg(long)]
    pub profile: Option<String>,
    /// Local directory for fetched data
    #[arg(short, long)]
    pub output: Option<String>,
    /// Fetch strategy: whole-table or per-file
    #[arg(long)]
    pub mode: Option<String>,
    #[arg(long)]
    pub max_retries: Option<u32>,
    /// Force the pre-flight size estimation and confirmation prompt
    #[arg(long)]
    pub preflight: bool,
    /// Skip the confirmation prompt entirely
    #[arg(long)]
    pub yes: bool,
    /// Fetch the first table as a sample before the full run
    #[arg(long)]
    pub sample: bool,
}
