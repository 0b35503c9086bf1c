//! CLI command implementations

pub mod error;
pub mod harvest;
pub mod seasons;

pub use error::CliError;
pub use harvest::{Cli, Commands, HarvestArgs};
pub use seasons::SeasonsCommand;
