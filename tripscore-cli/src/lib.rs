//! Command-line interface for the TripScore engine.
//!
//! `recommend` ranks a catalogue for a JSON request and prints the result;
//! `check-settings` validates a settings file, optionally with a request
//! override patch, and prints the effective tree.
#![forbid(unsafe_code)]

use camino::Utf8Path;
use clap::{Parser, Subcommand};

mod check_settings;
mod error;
mod recommend;

use check_settings::{CheckSettingsArgs, run_check_settings};
pub use error::CliError;
use recommend::{RecommendArgs, run_recommend};

const ARG_REQUEST: &str = "request";
const ARG_SETTINGS: &str = "settings";
const ARG_CATALOG: &str = "catalog";
const ARG_CATALOG_DETAILS: &str = "catalog-details";
const ARG_DISTRICT_FACTORS: &str = "district-factors";
const ARG_SNAPSHOT: &str = "snapshot";
const ARG_FORMAT: &str = "format";
const ARG_OVERRIDES: &str = "overrides";
const ENV_REQUEST: &str = "TRIPSCORE_CMDS_RECOMMEND_REQUEST_PATH";
const ENV_CATALOG: &str = "TRIPSCORE_CMDS_RECOMMEND_CATALOG";

/// Run the TripScore CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Recommend(args) => run_recommend(args),
        Command::CheckSettings(args) => run_check_settings(args),
    }
}

/// Require `path` to name an existing regular file.
fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match tripscore_data::fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Write `value` as pretty JSON followed by a newline.
fn write_json<T: serde::Serialize>(
    writer: &mut dyn std::io::Write,
    value: &T,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[derive(Debug, Parser)]
#[command(
    name = "tripscore",
    about = "Explainable destination ranking for day trips",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank the catalogue for a recommendation request.
    Recommend(RecommendArgs),
    /// Validate a settings file and an optional override patch.
    CheckSettings(CheckSettingsArgs),
}

#[cfg(test)]
mod tests;
