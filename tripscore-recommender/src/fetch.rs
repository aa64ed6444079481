//! Fetching every external dataset once per request.
//!
//! Every dataset request is queued as a job once the candidate set is
//! known. The jobs are dealt round-robin onto at most `max_threads` detached
//! threads, and the answers are collected against a single request deadline.
//! A source that errors, panics or misses the deadline yields
//! [`Metric::Unavailable`]; nothing here returns an error. Threads that
//! overrun keep running until their source returns and their late answers
//! are discarded, so one timed-out request leaves at most `max_threads`
//! threads behind.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::json;
use tripscore_core::{
    Destination, Metric, SourceError, TransitSource, TransitStop, WeatherForecast,
    WeatherRequest, WeatherSource, ZonedTimeWindow,
};
use tripscore_scorer::{CityDatasets, StationIndex};

use crate::{Warning, WarningCode};

/// A dataset request in flight.
struct Pending<T> {
    dataset: String,
    answer: Receiver<Result<T, SourceError>>,
}

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Dataset requests waiting for a thread.
#[derive(Default)]
struct FetchQueue {
    jobs: Vec<Job>,
}

impl FetchQueue {
    fn push<S, T, F>(&mut self, source: &Arc<S>, dataset: String, call: F) -> Pending<T>
    where
        S: ?Sized + Send + Sync + 'static,
        T: Send + 'static,
        F: FnOnce(&S) -> Result<T, SourceError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let worker_source = Arc::clone(source);
        let label = dataset.clone();
        self.jobs.push(Box::new(move || {
            if tx.send(call(&worker_source)).is_err() {
                log::debug!("{label} answered after the request deadline");
            }
        }));
        Pending {
            dataset,
            answer: rx,
        }
    }

    /// Start every job on at most `max_threads` threads.
    ///
    /// A lane that cannot be started drops its jobs, which closes their
    /// channels so the datasets read as unavailable.
    fn start(self, max_threads: usize) -> usize {
        let threads = max_threads.clamp(1, self.jobs.len().max(1));
        let mut lanes: Vec<Vec<Job>> = (0..threads).map(|_| Vec::new()).collect();
        for (n, job) in (0..threads).cycle().zip(self.jobs) {
            if let Some(lane) = lanes.get_mut(n) {
                lane.push(job);
            }
        }
        let mut started = 0;
        for (n, lane) in lanes.into_iter().enumerate() {
            if lane.is_empty() {
                continue;
            }
            let spawned = thread::Builder::new()
                .name(format!("fetch-{n}"))
                .spawn(move || lane.into_iter().for_each(|job| job()));
            match spawned {
                Ok(_) => started += 1,
                Err(err) => log::warn!("could not start fetch thread {n}: {err}"),
            }
        }
        started
    }
}

impl<T> Pending<T> {
    /// Block until the answer arrives or `deadline` passes.
    fn collect(self, deadline: Instant, gaps: &mut Vec<String>) -> Metric<T> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let failure = match self.answer.recv_timeout(remaining) {
            Ok(Ok(records)) => return Metric::Value(records),
            Ok(Err(err)) => err.to_string(),
            Err(RecvTimeoutError::Timeout) => "timed out".to_owned(),
            Err(RecvTimeoutError::Disconnected) => {
                "fetch worker exited without answering".to_owned()
            }
        };
        log::warn!("{} unavailable ({failure}); continuing without it", self.dataset);
        gaps.push(self.dataset);
        Metric::Unavailable
    }
}

/// What to fetch for one request.
#[derive(Debug)]
pub(crate) struct FetchPlan {
    pub(crate) cities: BTreeSet<String>,
    pub(crate) weather_requests: Vec<WeatherRequest>,
    pub(crate) window: ZonedTimeWindow,
    pub(crate) timeout: Duration,
    pub(crate) max_threads: usize,
}

impl FetchPlan {
    /// Plan fetches for `candidates`, grouping transit by city key.
    pub(crate) fn for_candidates(
        candidates: &[&Destination],
        default_city: &str,
        window: ZonedTimeWindow,
        timeout: Duration,
        max_threads: usize,
    ) -> Self {
        Self {
            cities: candidates
                .iter()
                .map(|d| d.city_key(default_city))
                .collect(),
            weather_requests: candidates
                .iter()
                .map(|d| WeatherRequest {
                    destination_id: d.id.clone(),
                    location: d.location,
                })
                .collect(),
            window,
            timeout,
            max_threads,
        }
    }
}

/// Indexed datasets plus a record of what could not be fetched.
#[derive(Debug)]
pub(crate) struct Fetched {
    pub(crate) cities: BTreeMap<String, CityDatasets>,
    pub(crate) metro: Metric<StationIndex<TransitStop>>,
    pub(crate) weather: Metric<WeatherForecast>,
    /// Labels of transit datasets that were unavailable.
    pub(crate) transit_gaps: Vec<String>,
    /// Candidates the forecast did not cover.
    pub(crate) forecast_missing: usize,
}

/// Fetch every dataset in `plan` exactly once.
pub(crate) fn fetch_all<T, W>(transit: &Arc<T>, weather: &Arc<W>, plan: FetchPlan) -> Fetched
where
    T: TransitSource + ?Sized + 'static,
    W: WeatherSource + ?Sized + 'static,
{
    let deadline = Instant::now() + plan.timeout;
    let mut queue = FetchQueue::default();
    let requests = plan.weather_requests;
    let expected: Vec<String> = requests.iter().map(|r| r.destination_id.clone()).collect();
    let window = plan.window;
    let forecast = queue.push(weather, "weather".to_owned(), move |s: &W| {
        s.forecast(&requests, &window)
    });
    let metro = queue.push(transit, "metro_stations".to_owned(), |s: &T| {
        s.metro_stations()
    });
    let per_city: Vec<_> = plan
        .cities
        .into_iter()
        .map(|city| {
            let bus_city = city.clone();
            let bike_city = city.clone();
            let parking_city = city.clone();
            let bus = queue.push(transit, format!("bus_stops ({city})"), move |s: &T| {
                s.bus_stops(&bus_city)
            });
            let bike = queue.push(transit, format!("bike_stations ({city})"), move |s: &T| {
                s.bike_stations(&bike_city)
            });
            let parking = queue.push(transit, format!("parking_lots ({city})"), move |s: &T| {
                s.parking_lots(&parking_city)
            });
            (city, bus, bike, parking)
        })
        .collect();
    let threads = queue.start(plan.max_threads);
    log::debug!("fetching datasets on {threads} threads");

    let mut transit_gaps = Vec::new();
    let cities = per_city
        .into_iter()
        .map(|(city, bus, bike, parking)| {
            let datasets = CityDatasets {
                bus: bus.collect(deadline, &mut transit_gaps).map(StationIndex::new),
                bike: bike.collect(deadline, &mut transit_gaps).map(StationIndex::new),
                parking: parking
                    .collect(deadline, &mut transit_gaps)
                    .map(StationIndex::new),
            };
            (city, datasets)
        })
        .collect();
    let metro_index = metro
        .collect(deadline, &mut transit_gaps)
        .map(StationIndex::new);
    let mut weather_gaps = Vec::new();
    let forecast_metric = forecast.collect(deadline, &mut weather_gaps);
    let forecast_missing = forecast_metric.value().map_or(0, |by_id| {
        expected.iter().filter(|id| !by_id.contains_key(*id)).count()
    });
    Fetched {
        cities,
        metro: metro_index,
        weather: forecast_metric,
        transit_gaps,
        forecast_missing,
    }
}

impl Fetched {
    /// Warnings describing unavailable datasets.
    pub(crate) fn warnings(&self) -> Vec<Warning> {
        let mut warnings = Vec::new();
        if !self.transit_gaps.is_empty() {
            warnings.push(
                Warning::new(
                    WarningCode::TransitPartial,
                    "Some transit, bike or parking datasets are unavailable; accessibility and crowd scores may be less precise.",
                )
                .with_detail(json!({ "missing": self.transit_gaps })),
            );
        }
        if self.weather.is_unavailable() {
            warnings.push(Warning::new(
                WarningCode::WeatherUnavailable,
                "Weather data is unavailable; weather scores are neutral.",
            ));
        } else if self.forecast_missing > 0 {
            warnings.push(
                Warning::new(
                    WarningCode::WeatherUnavailable,
                    "Weather data is missing for some destinations; their weather scores are neutral.",
                )
                .with_detail(json!({ "missing_destination_count": self.forecast_missing })),
            );
        }
        warnings
    }
}
