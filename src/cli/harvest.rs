//! Harvest command implementation.

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::extractor::HtmlGameExtractor;
use crate::fetcher::HttpFetcher;
use crate::frontier::Frontier;
use crate::harvester::{FrontierErrorPolicy, Harvester, HarvesterConfig};
use crate::shutdown::SharedShutdown;
use crate::store::{CsvClueStore, RecordStore, SqliteStore};

use super::CliError;

/// Maximum allowed concurrency to keep request pressure on the archive
/// within reason.
const MAX_CONCURRENCY: usize = 32;

/// Parse and validate the concurrency value.
fn parse_concurrency(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("concurrency must be at least 1".to_string());
    }
    if value > MAX_CONCURRENCY {
        return Err(format!(
            "concurrency {value} exceeds maximum of {MAX_CONCURRENCY}"
        ));
    }
    Ok(value)
}

/// J-Archive Harvester CLI
#[derive(Parser, Debug)]
#[command(name = "jarchive-harvester")]
#[command(about = "Harvest game data from the J-Archive", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Archive base URL (override for mirrors and tests)
    #[arg(long, global = true, default_value = "https://j-archive.com")]
    pub base_url: String,

    /// Root directory for the on-disk page cache
    #[arg(long, global = true, default_value = "data")]
    pub cache_dir: PathBuf,

    /// Checkpoint file path
    #[arg(long, global = true, default_value = "data/checkpoint.json")]
    pub checkpoint_file: PathBuf,

    /// Number of concurrent game fetches per season (default: 4, max: 32)
    #[arg(long, global = true, default_value = "4", value_parser = parse_concurrency)]
    pub concurrency: usize,

    /// Maximum number of retries for failed requests (default: 5, range: 1-20)
    #[arg(long, global = true, default_value = "5", value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_retries: u32,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Harvest seasons into a local store
    Harvest(HarvestArgs),

    /// List seasons the frontier would process
    Seasons(super::SeasonsCommand),
}

/// Output format for harvested records
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreFormat {
    /// SQLite database (gamelist, clues, game_roster, categories)
    Sqlite,
    /// Flat CSV, one row per clue
    Csv,
}

/// Arguments for the harvest command
#[derive(Parser, Debug)]
pub struct HarvestArgs {
    /// Comma-separated season ids (e.g. "40,39"). Omit to use
    /// --seasons-file or remote discovery.
    #[arg(long, value_delimiter = ',')]
    pub seasons: Vec<String>,

    /// Newline-delimited file of season ids; overrides discovery
    #[arg(long, conflicts_with = "seasons")]
    pub seasons_file: Option<PathBuf>,

    /// Store backend
    #[arg(long, value_enum, default_value = "sqlite")]
    pub format: StoreFormat,

    /// Output path (defaults to jeopardy.db or clues.csv by format)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Re-surface previously failed games into this run's pending set
    #[arg(long, default_value_t = false)]
    pub retry_failed: bool,

    /// Pause between seasons, in seconds
    #[arg(long, default_value_t = 2)]
    pub season_delay_secs: u64,

    /// What to do when a season's game list cannot be fetched
    #[arg(long, default_value = "abort")]
    pub on_frontier_error: FrontierErrorPolicy,
}

impl HarvestArgs {
    fn output_path(&self) -> PathBuf {
        if let Some(path) = &self.output {
            return path.clone();
        }
        match self.format {
            StoreFormat::Sqlite => PathBuf::from("jeopardy.db"),
            StoreFormat::Csv => PathBuf::from("clues.csv"),
        }
    }

    fn open_store(&self) -> Result<Box<dyn RecordStore>, CliError> {
        let path = self.output_path();
        Ok(match self.format {
            StoreFormat::Sqlite => Box::new(SqliteStore::open(&path)?),
            StoreFormat::Csv => Box::new(CsvClueStore::create(&path)?),
        })
    }

    /// Execute the harvest command.
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        let fetcher = Arc::new(
            HttpFetcher::with_base_url(&cli.base_url).with_max_retries(cli.max_retries),
        );

        let frontier = if !self.seasons.is_empty() {
            Frontier::from_list(fetcher.clone(), self.seasons.clone())
        } else if let Some(path) = &self.seasons_file {
            Frontier::from_file(fetcher.clone(), path)
        } else {
            Frontier::discover(fetcher.clone())
        };

        let config = HarvesterConfig {
            concurrency: cli.concurrency,
            cache_dir: cli.cache_dir.clone(),
            checkpoint_path: cli.checkpoint_file.clone(),
            season_delay: Duration::from_secs(self.season_delay_secs),
            retry_failed: self.retry_failed,
            frontier_error_policy: self.on_frontier_error,
            ..HarvesterConfig::default()
        };

        info!(
            output = %self.output_path().display(),
            concurrency = cli.concurrency,
            "Starting harvest"
        );

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("Harvesting...");
        spinner.enable_steady_tick(Duration::from_millis(120));

        let mut harvester = Harvester::new(
            fetcher,
            Arc::new(HtmlGameExtractor::new()),
            self.open_store()?,
            config,
        )
        .with_shutdown(shutdown);

        let result = harvester.run(&frontier).await;
        spinner.finish_and_clear();

        let summary = result?;
        println!(
            "Harvest complete: {} seasons processed, {} skipped, {} games harvested, {} failed",
            summary.seasons_processed,
            summary.seasons_skipped,
            summary.games_completed,
            summary.games_failed
        );
        Ok(())
    }
}
