//! Check-settings command implementation for the TripScore CLI.

use std::io::{BufReader, Write};

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tripscore_core::Settings;
use tripscore_data::fs::open_utf8_file;
use tripscore_data::load_settings;

use crate::{ARG_OVERRIDES, ARG_SETTINGS, CliError, require_existing, write_json};

/// CLI arguments for the `check-settings` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Layer a settings file over the built-in defaults, validate \
                 the result, optionally apply a request override patch under \
                 the request policy, and print the effective settings.",
    about = "Validate settings and override patches"
)]
#[ortho_config(prefix = "TRIPSCORE")]
pub(crate) struct CheckSettingsArgs {
    /// Settings file to validate; the built-in defaults when omitted.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) settings_path: Option<Utf8PathBuf>,
    /// JSON override patch, checked as a request would be.
    #[arg(long = ARG_OVERRIDES, value_name = "path")]
    #[serde(default)]
    pub(crate) overrides: Option<Utf8PathBuf>,
}

impl CheckSettingsArgs {
    pub(crate) fn into_config(self) -> Result<CheckSettingsConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(CheckSettingsConfig::from(merged))
    }
}

/// Resolved `check-settings` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CheckSettingsConfig {
    pub(crate) settings_path: Option<Utf8PathBuf>,
    pub(crate) overrides: Option<Utf8PathBuf>,
}

impl CheckSettingsConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        if let Some(path) = &self.settings_path {
            require_existing(path, ARG_SETTINGS)?;
        }
        if let Some(path) = &self.overrides {
            require_existing(path, ARG_OVERRIDES)?;
        }
        Ok(())
    }
}

impl From<CheckSettingsArgs> for CheckSettingsConfig {
    fn from(args: CheckSettingsArgs) -> Self {
        Self {
            settings_path: args.settings_path,
            overrides: args.overrides,
        }
    }
}

pub(super) fn run_check_settings(args: CheckSettingsArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_check_settings_with(args, &mut stdout)
}

pub(super) fn run_check_settings_with(
    args: CheckSettingsArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let effective = effective_settings(&config)?;
    write_json(writer, &effective)
}

fn effective_settings(config: &CheckSettingsConfig) -> Result<Settings, CliError> {
    let base = match &config.settings_path {
        Some(path) => load_settings(path)?,
        None => {
            let defaults = Settings::default();
            defaults.validate()?;
            defaults
        }
    };
    let Some(path) = &config.overrides else {
        return Ok(base);
    };
    let patch = load_patch(path)?;
    let derived = base
        .with_overrides(&patch)
        .map_err(|source| CliError::RejectedOverrides {
            path: path.clone(),
            source,
        })?;
    log::info!("override patch {path} accepted");
    Ok(derived)
}

/// Loads a JSON object override patch from disk.
pub(super) fn load_patch(path: &Utf8Path) -> Result<Map<String, Value>, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenOverrides {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| CliError::ParseOverrides {
        path: path.to_path_buf(),
        source,
    })
}
