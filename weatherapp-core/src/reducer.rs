//! Weather acquisition and the UI state it reduces to.
//!
//! Every refresh takes a new generation number. Its result is committed only
//! if no newer refresh was started in the meantime, so the last refresh
//! *issued* always wins regardless of which fetch pair finishes last.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, warn};

use crate::{
    location::LocationProvider,
    model::{Coordinates, CurrentWeatherReport, ForecastReport, Units},
    provider::{QueryPath, WeatherSource},
};

/// Both reports of a successful refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct Weather {
    pub current: CurrentWeatherReport,
    pub forecast: ForecastReport,
}

/// What the view renders.
#[derive(Debug, Clone, PartialEq)]
pub enum UiState {
    Loading,
    Error,
    Success(Arc<Weather>),
}

impl UiState {
    pub fn is_loading(&self) -> bool {
        matches!(self, UiState::Loading)
    }

    pub fn weather(&self) -> Option<&Weather> {
        match self {
            UiState::Success(weather) => Some(weather),
            _ => None,
        }
    }
}

/// Synchronous half of a refresh: the generation it runs under and the
/// coordinates it fetches for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshTicket {
    pub generation: u64,
    pub at: Coordinates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The result was published.
    Committed,
    /// A newer refresh started first; the result was dropped.
    Superseded,
}

pub struct WeatherStateReducer {
    source: Arc<dyn WeatherSource>,
    api_key: String,
    units: Units,
    coordinates: watch::Sender<Coordinates>,
    state: watch::Sender<UiState>,
    generation: AtomicU64,
}

impl fmt::Debug for WeatherStateReducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherStateReducer")
            .field("source", &self.source)
            .field("units", &self.units)
            .field("coordinates", &*self.coordinates.borrow())
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

impl WeatherStateReducer {
    /// The state starts out as [`UiState::Loading`] and the coordinates at (0, 0).
    pub fn new(source: Arc<dyn WeatherSource>, api_key: impl Into<String>, units: Units) -> Self {
        let (coordinates, _) = watch::channel(Coordinates::default());
        let (state, _) = watch::channel(UiState::Loading);

        Self {
            source,
            api_key: api_key.into(),
            units,
            coordinates,
            state,
            generation: AtomicU64::new(0),
        }
    }

    pub fn units(&self) -> Units {
        self.units
    }

    pub fn coordinates(&self) -> Coordinates {
        *self.coordinates.borrow()
    }

    /// Generation of the latest refresh, 0 before the first one.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> UiState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.state.subscribe()
    }

    /// Overwrite the coordinates used by the next refresh. No range check.
    pub fn set_location(&self, latitude: f64, longitude: f64) {
        let at = Coordinates::new(latitude, longitude);
        self.coordinates.send_replace(at);
        debug!(%at, "location set");
    }

    /// Publish `Loading` and claim a new generation.
    pub fn begin_refresh(&self) -> RefreshTicket {
        let mut generation = 0;

        // Bumped under the state lock so a commit can't slip in between.
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = UiState::Loading;
        });

        let at = self.coordinates();
        debug!(generation, %at, "refresh started");

        RefreshTicket { generation, at }
    }

    /// Fetch both reports for `ticket` and publish the result if still current.
    pub async fn complete(&self, ticket: RefreshTicket) -> RefreshOutcome {
        let current_path = QueryPath::current(ticket.at, &self.api_key, self.units);
        let forecast_path = QueryPath::forecast(ticket.at, &self.api_key, self.units);
        let source = Arc::clone(&self.source);

        // Separate task so a panicking source still resolves to `Error`.
        let fetched = tokio::spawn(async move {
            tokio::join!(
                source.fetch_current(&current_path),
                source.fetch_forecast(&forecast_path),
            )
        })
        .await;

        let generation = ticket.generation;
        let next = match fetched {
            Ok((Ok(current), Ok(forecast))) => {
                UiState::Success(Arc::new(Weather { current, forecast }))
            }
            Ok((current, forecast)) => {
                if let Err(e) = &current {
                    warn!(generation, "current weather fetch failed: {e}");
                }
                if let Err(e) = &forecast {
                    warn!(generation, "forecast fetch failed: {e}");
                }
                UiState::Error
            }
            Err(e) => {
                warn!(generation, "weather fetch aborted: {e}");
                UiState::Error
            }
        };

        self.commit(generation, next)
    }

    /// Start a refresh on the current tokio runtime.
    ///
    /// `Loading` is already published when this returns.
    ///
    /// # Panics
    ///
    /// Outside of a tokio runtime.
    pub fn refresh(self: &Arc<Self>) -> JoinHandle<RefreshOutcome> {
        let ticket = self.begin_refresh();
        let this = Arc::clone(self);
        tokio::spawn(async move { this.complete(ticket).await })
    }

    /// Refresh and wait for the result.
    pub async fn refresh_and_wait(&self) -> RefreshOutcome {
        let ticket = self.begin_refresh();
        self.complete(ticket).await
    }

    /// Ask `locator` for a location and refresh for it.
    ///
    /// Without a location nothing is fetched, the state stays where it was and
    /// `None` is returned.
    pub async fn locate_and_refresh(
        &self,
        locator: &dyn LocationProvider,
    ) -> Option<RefreshOutcome> {
        let Some(at) = locator.last_known_location().await else {
            warn!("no location available, not refreshing");
            return None;
        };

        self.set_location(at.latitude, at.longitude);
        Some(self.refresh_and_wait().await)
    }

    fn commit(&self, generation: u64, next: UiState) -> RefreshOutcome {
        let committed = self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = next;
            true
        });

        if committed {
            debug!(generation, "refresh committed");
            RefreshOutcome::Committed
        } else {
            debug!(
                generation,
                latest = self.generation(),
                "stale refresh result dropped"
            );
            RefreshOutcome::Superseded
        }
    }
}
