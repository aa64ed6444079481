//! The layered configuration tree.
//!
//! [`Settings`] carries every radius, cap, weight, and heuristic used by
//! the scorers. One instance is loaded per process, validated once, and
//! shared immutably. Requests that need different values derive a new
//! instance through [`Settings::with_overrides`] and never touch the
//! shared one.
//!
//! # Examples
//! ```
//! use tripscore_core::Settings;
//!
//! let settings = Settings::default();
//! assert!(settings.validate().is_ok());
//! assert!((settings.scoring.neutral_score - 0.5).abs() < f64::EPSILON);
//! ```

mod presets;
mod sections;
mod validation;

use std::collections::BTreeMap;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

pub use presets::Preset;
pub use sections::{
    AccessibilitySettings, AppSettings, BikeSignalSettings, BikeWeights, BlendWeights,
    CatalogSettings, ContextSettings, CountDistanceWeights, CrowdSettings, FamilySettings,
    ParkingSettings, ParkingWeights, PeakWindow, PreferenceSettings, ScoringSettings,
    SignalWeights, SourceSettings, TransitSignalSettings, WeatherSettings, WeatherWeights,
};
pub use validation::SettingsError;
pub(crate) use validation::unit as check_unit;

/// The complete configuration tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Process-level settings.
    pub app: AppSettings,
    /// Composite scoring and request knobs.
    pub scoring: ScoringSettings,
    /// Accessibility scorer.
    pub accessibility: AccessibilitySettings,
    /// Weather scorer.
    pub weather: WeatherSettings,
    /// Preference-match scorer.
    pub preference: PreferenceSettings,
    /// Parking availability signal.
    pub parking: ParkingSettings,
    /// Context scorer.
    pub context: ContextSettings,
    /// Data-source knobs.
    pub sources: SourceSettings,
    /// File locations.
    pub catalog: CatalogSettings,
    /// Named presets.
    pub presets: BTreeMap<String, Preset>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app: AppSettings::default(),
            scoring: ScoringSettings::default(),
            accessibility: AccessibilitySettings::default(),
            weather: WeatherSettings::default(),
            preference: PreferenceSettings::default(),
            parking: ParkingSettings::default(),
            context: ContextSettings::default(),
            sources: SourceSettings::default(),
            catalog: CatalogSettings::default(),
            presets: presets::builtin_presets(),
        }
    }
}

impl Settings {
    /// Check every range constraint, reporting the first violation.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.default_offset()?;
        validation::not_blank("app.name", &self.app.name)?;
        self.scoring.validate()?;
        self.accessibility.validate()?;
        self.weather.validate()?;
        self.preference.validate()?;
        self.parking.validate()?;
        self.context.validate()?;
        validation::not_blank("sources.default_city", &self.sources.default_city)?;
        for (name, preset) in &self.presets {
            validation::not_blank("presets", name)?;
            preset.validate(name)?;
        }
        Ok(())
    }

    /// Offset attached to timestamps that lack one.
    pub fn default_offset(&self) -> Result<FixedOffset, SettingsError> {
        let raw = self.app.default_utc_offset.trim();
        parse_utc_offset(raw).ok_or_else(|| SettingsError::InvalidOffset {
            path: "app.default_utc_offset".to_owned(),
            value: raw.to_owned(),
        })
    }

    /// Look up a preset by name, ignoring case and surrounding space.
    #[must_use]
    pub fn preset(&self, name: &str) -> Option<&Preset> {
        let wanted = name.trim();
        self.presets.get(wanted).or_else(|| {
            self.presets
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(wanted))
                .map(|(_, preset)| preset)
        })
    }
}

/// Parse `Z`, `UTC`, `+HH:MM`, `-HH:MM` or `+HH` into an offset.
fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = raw
        .strip_prefix('+')
        .map(|rest| (1, rest))
        .or_else(|| raw.strip_prefix('-').map(|rest| (-1, rest)))?;
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let h: i32 = hours.parse().ok()?;
    let m: i32 = minutes.parse().ok()?;
    if !(0..=23).contains(&h) || !(0..=59).contains(&m) {
        return None;
    }
    FixedOffset::east_opt(sign * (h * 3600 + m * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_validate() {
        assert_eq!(Settings::default().validate(), Ok(()));
    }

    #[rstest]
    fn inverted_comfort_band_is_rejected() {
        let mut settings = Settings::default();
        settings.weather.comfort_min_c = 30.0;
        assert_eq!(
            settings.validate(),
            Err(SettingsError::InvertedRange {
                path: "weather.comfort".to_owned()
            })
        );
    }

    #[rstest]
    #[case("+08:00", 8 * 3600)]
    #[case("-05:30", -(5 * 3600 + 1800))]
    #[case("Z", 0)]
    #[case("+09", 9 * 3600)]
    fn parses_offsets(#[case] raw: &str, #[case] seconds: i32) {
        let mut settings = Settings::default();
        settings.app.default_utc_offset = raw.to_owned();
        let offset = settings.default_offset().expect("valid offset");
        assert_eq!(offset.local_minus_utc(), seconds);
    }

    #[rstest]
    fn rejects_timezone_names() {
        let mut settings = Settings::default();
        settings.app.default_utc_offset = "Asia/Taipei".to_owned();
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidOffset { .. })
        ));
    }

    #[rstest]
    fn preset_lookup_ignores_case() {
        let settings = Settings::default();
        assert!(settings.preset("Rainy_Day").is_some());
        assert!(settings.preset("beach_day").is_none());
    }

    #[rstest]
    fn partial_json_fills_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"scoring": {"neutral_score": 0.4}}"#).expect("valid json");
        assert!((settings.scoring.neutral_score - 0.4).abs() < f64::EPSILON);
        assert_eq!(settings.scoring.top_n_default, 10);
    }

    #[rstest]
    fn unknown_sections_are_rejected() {
        assert!(serde_json::from_str::<Settings>(r#"{"cache": {"ttl": 10}}"#).is_err());
    }
}
