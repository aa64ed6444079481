//! Recommend command implementation for the TripScore CLI.

use std::io::{BufReader, Write};
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, ValueEnum};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tripscore_core::{ComponentName, Settings, TransitSource, UserPreferences, WeatherSource};
use tripscore_data::fs::open_utf8_file;
use tripscore_data::{
    SnapshotSource, load_catalog_with_details, load_district_factors, load_settings,
    resolve_relative,
};
use tripscore_recommender::{Recommendation, Recommender};
use tripscore_scorer::one_line_summary;

use crate::{
    ARG_CATALOG, ARG_CATALOG_DETAILS, ARG_DISTRICT_FACTORS, ARG_FORMAT, ARG_REQUEST, ARG_SETTINGS,
    ARG_SNAPSHOT, CliError, ENV_CATALOG, ENV_REQUEST, require_existing, write_json,
};

/// How results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum OutputFormat {
    /// The full recommendation as pretty JSON.
    #[default]
    Json,
    /// One line per result plus its component reasons.
    Summary,
}

/// CLI arguments for the `recommend` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Rank the destination catalogue for a JSON-encoded request. \
                 Data paths can come from CLI flags, configuration files, \
                 environment variables, or the catalog section of the \
                 settings file.",
    about = "Rank destinations for a request"
)]
#[ortho_config(prefix = "TRIPSCORE")]
pub(crate) struct RecommendArgs {
    /// Path to a JSON file containing the recommendation request.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) request_path: Option<Utf8PathBuf>,
    /// Settings file layered over the built-in defaults.
    #[arg(long = ARG_SETTINGS, value_name = "path")]
    #[serde(default)]
    pub(crate) settings: Option<Utf8PathBuf>,
    /// Destination catalogue; defaults to `catalog.path` in the settings.
    #[arg(long = ARG_CATALOG, value_name = "path")]
    #[serde(default)]
    pub(crate) catalog: Option<Utf8PathBuf>,
    /// Per-destination details merged into the catalogue.
    #[arg(long = ARG_CATALOG_DETAILS, value_name = "path")]
    #[serde(default)]
    pub(crate) catalog_details: Option<Utf8PathBuf>,
    /// District crowd and family baselines.
    #[arg(long = ARG_DISTRICT_FACTORS, value_name = "path")]
    #[serde(default)]
    pub(crate) district_factors: Option<Utf8PathBuf>,
    /// Transit and weather snapshot; without one every dataset is unavailable.
    #[arg(long = ARG_SNAPSHOT, value_name = "path")]
    #[serde(default)]
    pub(crate) snapshot: Option<Utf8PathBuf>,
    /// Output format.
    #[arg(long = ARG_FORMAT, value_enum)]
    #[serde(default)]
    pub(crate) format: Option<OutputFormat>,
}

impl RecommendArgs {
    pub(crate) fn into_config(self) -> Result<RecommendConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RecommendConfig::try_from(merged)
    }
}

/// Resolved `recommend` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecommendConfig {
    pub(crate) request_path: Utf8PathBuf,
    pub(crate) settings: Option<Utf8PathBuf>,
    pub(crate) catalog: Option<Utf8PathBuf>,
    pub(crate) catalog_details: Option<Utf8PathBuf>,
    pub(crate) district_factors: Option<Utf8PathBuf>,
    pub(crate) snapshot: Option<Utf8PathBuf>,
    pub(crate) format: OutputFormat,
}

/// Data file locations after falling back to the settings file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DataPaths {
    pub(crate) catalog: Utf8PathBuf,
    pub(crate) catalog_details: Option<Utf8PathBuf>,
    pub(crate) district_factors: Option<Utf8PathBuf>,
}

impl RecommendConfig {
    /// Check every path given explicitly.
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.request_path, ARG_REQUEST)?;
        let optional = [
            (&self.settings, ARG_SETTINGS),
            (&self.catalog, ARG_CATALOG),
            (&self.catalog_details, ARG_CATALOG_DETAILS),
            (&self.district_factors, ARG_DISTRICT_FACTORS),
            (&self.snapshot, ARG_SNAPSHOT),
        ];
        for (path, field) in optional {
            if let Some(given) = path {
                require_existing(given, field)?;
            }
        }
        Ok(())
    }

    /// Fill unset data paths from the `catalog` settings section.
    ///
    /// Configured paths are relative to the settings file. A configured
    /// details file is best-effort; the other configured files must exist.
    pub(crate) fn data_paths(&self, settings: &Settings) -> Result<DataPaths, CliError> {
        let configured = &settings.catalog;
        let catalog = match (&self.catalog, configured.path.as_deref()) {
            (Some(given), _) => given.clone(),
            (None, Some(path)) => {
                let resolved = self.resolve_configured(path);
                require_existing(&resolved, "catalog.path")?;
                resolved
            }
            (None, None) => {
                return Err(CliError::MissingArgument {
                    field: ARG_CATALOG,
                    env: ENV_CATALOG,
                });
            }
        };
        let district_factors = match (
            &self.district_factors,
            configured.district_factors_path.as_deref(),
        ) {
            (Some(given), _) => Some(given.clone()),
            (None, Some(path)) => {
                let resolved = self.resolve_configured(path);
                require_existing(&resolved, "catalog.district_factors_path")?;
                Some(resolved)
            }
            (None, None) => None,
        };
        let catalog_details = self.catalog_details.clone().or_else(|| {
            configured
                .details_path
                .as_deref()
                .map(|path| self.resolve_configured(path))
        });
        Ok(DataPaths {
            catalog,
            catalog_details,
            district_factors,
        })
    }

    fn resolve_configured(&self, configured: &str) -> Utf8PathBuf {
        self.settings.as_deref().map_or_else(
            || Utf8PathBuf::from(configured),
            |file| resolve_relative(file, configured),
        )
    }
}

impl TryFrom<RecommendArgs> for RecommendConfig {
    type Error = CliError;

    fn try_from(args: RecommendArgs) -> Result<Self, Self::Error> {
        let request_path = args.request_path.ok_or(CliError::MissingArgument {
            field: ARG_REQUEST,
            env: ENV_REQUEST,
        })?;
        Ok(Self {
            request_path,
            settings: args.settings,
            catalog: args.catalog,
            catalog_details: args.catalog_details,
            district_factors: args.district_factors,
            snapshot: args.snapshot,
            format: args.format.unwrap_or_default(),
        })
    }
}

/// The collaborators a recommendation is scored against.
pub(crate) struct Sources {
    pub(crate) transit: Arc<dyn TransitSource>,
    pub(crate) weather: Arc<dyn WeatherSource>,
}

/// Builds the transit and weather collaborators for one invocation.
pub(super) trait SourceBuilder {
    fn build(&self, config: &RecommendConfig) -> Result<Sources, CliError>;
}

/// Serves both collaborators from the configured snapshot file.
pub(super) struct SnapshotSourceBuilder;

impl SourceBuilder for SnapshotSourceBuilder {
    fn build(&self, config: &RecommendConfig) -> Result<Sources, CliError> {
        let source = match &config.snapshot {
            Some(path) => SnapshotSource::load(path)?,
            None => {
                log::warn!("no snapshot given; transit and weather data are unavailable");
                SnapshotSource::default()
            }
        };
        let shared = Arc::new(source);
        Ok(Sources {
            transit: Arc::<SnapshotSource>::clone(&shared),
            weather: shared,
        })
    }
}

pub(super) fn run_recommend(args: RecommendArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_recommend_with(args, &SnapshotSourceBuilder, &mut stdout)
}

pub(super) fn run_recommend_with(
    args: RecommendArgs,
    builder: &dyn SourceBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = resolve_recommend_config(args)?;
    let recommendation = execute_recommend(&config, builder)?;
    match config.format {
        OutputFormat::Json => write_json(writer, &recommendation),
        OutputFormat::Summary => write_summary(writer, &recommendation),
    }
}

fn resolve_recommend_config(args: RecommendArgs) -> Result<RecommendConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

fn execute_recommend(
    config: &RecommendConfig,
    builder: &dyn SourceBuilder,
) -> Result<Recommendation, CliError> {
    let settings = match &config.settings {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };
    let paths = config.data_paths(&settings)?;
    let catalog = load_catalog_with_details(&paths.catalog, paths.catalog_details.as_deref())?;
    let request = load_request(&config.request_path)?;
    let sources = builder.build(config)?;

    let mut recommender = Recommender::new(settings, catalog, sources.transit, sources.weather)?;
    if let Some(path) = &paths.district_factors {
        recommender = recommender.with_district_factors(load_district_factors(path)?);
    }
    recommender
        .recommend(&request)
        .map_err(|source| CliError::Recommend {
            path: config.request_path.clone(),
            source,
        })
}

/// Loads a JSON-encoded [`UserPreferences`] request from disk.
pub(super) fn load_request(path: &Utf8Path) -> Result<UserPreferences, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenRequest {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| CliError::ParseRequest {
        path: path.to_path_buf(),
        source,
    })
}

/// Reasons printed per component; accessibility explains more signals.
const fn reason_limit(name: ComponentName) -> usize {
    match name {
        ComponentName::Accessibility => 4,
        _ => 2,
    }
}

fn summary_lines(recommendation: &Recommendation) -> Vec<String> {
    let mut lines = Vec::new();
    for (rank, item) in recommendation.results.iter().enumerate() {
        let destination = &item.destination;
        let place = destination
            .district
            .as_deref()
            .or(destination.city.as_deref())
            .unwrap_or("-");
        lines.push(format!(
            "{:>2}. {} ({place})  {}",
            rank + 1,
            destination.name,
            one_line_summary(&item.breakdown)
        ));
        for component in &item.breakdown.components {
            let shown: Vec<&str> = component
                .reasons
                .iter()
                .take(reason_limit(component.name))
                .map(String::as_str)
                .collect();
            lines.push(format!(
                "    - {}: score={:.3} weight={:.2}  {}",
                component.name,
                component.score,
                component.weight,
                shown.join("; ")
            ));
        }
    }
    if recommendation.results.is_empty() {
        lines.push("No destinations matched the request.".to_owned());
    }
    lines.extend(
        recommendation
            .warnings
            .iter()
            .map(|warning| format!("warning {}: {}", warning.code, warning.message)),
    );
    lines
}

fn write_summary(writer: &mut dyn Write, recommendation: &Recommendation) -> Result<(), CliError> {
    for line in summary_lines(recommendation) {
        writeln!(writer, "{line}").map_err(CliError::WriteOutput)?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<RecommendConfig, CliError> {
    let merged = RecommendArgs::merge_from_layers(layers).map_err(CliError::from)?;
    RecommendConfig::try_from(merged)
}
