//! Core library for the `weatherapp` front-ends.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client and its report models
//! - Connectivity and location sources
//! - The reducer that turns a location into a `Loading` / `Success` / `Error` state
//!
//! It is used by `weatherapp-cli`, but any view layer can drive it the same way:
//! read [`UiState`] and [`ConnectivityState`], call `set_location` and `refresh`.

pub mod config;
pub mod connectivity;
pub mod error;
pub mod format;
pub mod location;
pub mod model;
pub mod provider;
pub mod reducer;

pub use config::Config;
pub use connectivity::{ConnectivitySignal, ConnectivityState};
pub use error::{WeatherError, WeatherResult};
pub use location::LocationProvider;
pub use model::{Coordinates, CurrentWeatherReport, ForecastEntry, ForecastReport, Units};
pub use provider::{OpenWeatherClient, QueryPath, WeatherSource};
pub use reducer::{RefreshOutcome, UiState, Weather, WeatherStateReducer};
