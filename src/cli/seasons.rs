//! CLI command for listing the seasons a harvest would process.

use clap::Args;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use crate::fetcher::HttpFetcher;
use crate::frontier::Frontier;

use super::CliError;

/// Seasons subcommand
#[derive(Debug, Args)]
pub struct SeasonsCommand {
    /// Newline-delimited file of season ids; overrides discovery
    #[arg(long)]
    pub seasons_file: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    pub format: ListFormat,
}

/// Output format for the seasons listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ListFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

impl SeasonsCommand {
    /// Execute the seasons command.
    pub async fn execute(&self, base_url: &str, max_retries: u32) -> Result<(), CliError> {
        let fetcher = Arc::new(
            HttpFetcher::with_base_url(base_url).with_max_retries(max_retries),
        );
        let frontier = match &self.seasons_file {
            Some(path) => Frontier::from_file(fetcher, path),
            None => Frontier::discover(fetcher),
        };

        let seasons = frontier.list_seasons().await?;

        match self.format {
            ListFormat::Human => {
                println!("{} season(s):", seasons.len());
                for season in &seasons {
                    println!("  {season}");
                }
            }
            ListFormat::Json => {
                let payload = json!({ "seasons": seasons });
                println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
            }
        }

        Ok(())
    }
}
