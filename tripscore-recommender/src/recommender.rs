//! The recommendation pipeline.

use std::sync::Arc;
use std::time::Duration;

use tripscore_core::{
    Destination, DistrictFactors, ScoreBreakdown, Settings, SettingsError, TransitSource,
    UserPreferences, WeatherSource,
};
use tripscore_scorer::Datasets;

use crate::fetch::{FetchPlan, fetch_all};
use crate::filter::filter_candidates;
use crate::pool::score_in_order;
use crate::query::{Resolved, resolve};
use crate::{Recommendation, RecommendError, RecommendationItem};

/// Ranks a destination catalogue for each request.
///
/// The recommender owns the validated base settings, the catalogue and the
/// district table, and shares them immutably across requests. Datasets are
/// fetched through the injected sources on every request.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use tripscore_core::test_support::{StubTransitSource, StubWeatherSource, point};
/// use tripscore_core::{Destination, Settings, UserPreferences, WeatherSummary};
/// use tripscore_recommender::Recommender;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let catalog = vec![Destination::new("tp-101", "Taipei 101", point(25.034, 121.5645), ["landmark"])?];
/// let recommender = Recommender::new(
///     Settings::default(),
///     catalog,
///     Arc::new(StubTransitSource::empty()),
///     Arc::new(StubWeatherSource::uniform(WeatherSummary::unknown())),
/// )?;
/// let request: UserPreferences = serde_json::from_str(
///     r#"{"origin": {"lat": 25.0478, "lon": 121.517},
///         "time_window": {"start": "2026-03-04T10:00:00", "end": "2026-03-04T14:00:00"}}"#,
/// )?;
/// let answer = recommender.recommend(&request)?;
/// assert_eq!(answer.ranked_ids(), ["tp-101"]);
/// # Ok(())
/// # }
/// ```
pub struct Recommender<T, W>
where
    T: TransitSource + ?Sized + 'static,
    W: WeatherSource + ?Sized + 'static,
{
    settings: Arc<Settings>,
    catalog: Vec<Destination>,
    district_factors: Arc<DistrictFactors>,
    transit: Arc<T>,
    weather: Arc<W>,
}

impl<T, W> Recommender<T, W>
where
    T: TransitSource + ?Sized + 'static,
    W: WeatherSource + ?Sized + 'static,
{
    /// Build a recommender, validating `settings` once.
    ///
    /// The catalogue order is the tie-break for equal scores.
    pub fn new(
        settings: Settings,
        catalog: Vec<Destination>,
        transit: Arc<T>,
        weather: Arc<W>,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            settings: Arc::new(settings),
            catalog,
            district_factors: Arc::new(DistrictFactors::default()),
            transit,
            weather,
        })
    }

    /// Use `factors` as the district crowd and family baselines.
    #[must_use]
    pub fn with_district_factors(mut self, factors: DistrictFactors) -> Self {
        self.district_factors = Arc::new(factors);
        self
    }

    /// The shared base settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The catalogue, in tie-break order.
    #[must_use]
    pub fn catalog(&self) -> &[Destination] {
        &self.catalog
    }

    /// Rank the catalogue for one request.
    ///
    /// Fails only when the request itself is malformed, before any dataset
    /// is fetched. Unavailable datasets degrade scores and add warnings.
    pub fn recommend(
        &self,
        preferences: &UserPreferences,
    ) -> Result<Recommendation, RecommendError> {
        let Resolved { plan, query } = resolve(preferences, &self.settings)?;
        log::debug!(
            "resolved request: weights {:?}, window {} to {}",
            query.component_weights,
            query.time_window.start,
            query.time_window.end
        );

        let filtered = filter_candidates(&self.catalog, &query.required_tags, &query.excluded_tags);
        let mut warnings = filtered.warnings();
        let candidates = filtered.candidates;
        if candidates.is_empty() {
            log::info!(
                "recommend: 0 of {} destinations passed the tag filter",
                self.catalog.len()
            );
            return Ok(Recommendation {
                query,
                results: Vec::new(),
                warnings,
                candidates_scored: 0,
            });
        }

        let scoring = &plan.settings.scoring;
        let fetched = fetch_all(
            &self.transit,
            &self.weather,
            FetchPlan::for_candidates(
                &candidates,
                &plan.settings.sources.default_city,
                plan.window,
                Duration::from_millis(scoring.fetch_timeout_ms),
                scoring.worker_threads,
            ),
        );
        warnings.extend(fetched.warnings());
        let datasets = Datasets {
            cities: fetched.cities,
            metro: fetched.metro,
            weather: fetched.weather,
            district_factors: Arc::clone(&self.district_factors),
        };
        log::debug!(
            "scoring {} candidates on up to {} threads",
            candidates.len(),
            scoring.worker_threads
        );

        let breakdowns = score_in_order(&candidates, scoring.worker_threads, |destination| {
            plan.score(destination, &datasets)
        });
        let mut ranked: Vec<(&Destination, ScoreBreakdown)> =
            candidates.iter().copied().zip(breakdowns).collect();
        // Stable: equal totals keep catalogue order.
        ranked.sort_by(|(_, a), (_, b)| b.total.total_cmp(&a.total));
        ranked.truncate(query.max_results);

        let results: Vec<RecommendationItem> = ranked
            .into_iter()
            .map(|(destination, breakdown)| RecommendationItem {
                destination: destination.clone(),
                breakdown,
            })
            .collect();
        log::info!(
            "recommend: {} candidates of {}, {} returned, {} warnings",
            candidates.len(),
            self.catalog.len(),
            results.len(),
            warnings.len()
        );
        Ok(Recommendation {
            query,
            results,
            warnings,
            candidates_scored: candidates.len(),
        })
    }
}
