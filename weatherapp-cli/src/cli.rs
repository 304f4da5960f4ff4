use std::{sync::Arc, time::Duration};

use anyhow::{Context, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use inquire::{Confirm, CustomType, Select, Text};
use tracing::{info, warn};
use weatherapp_core::{
    Config, ConnectivitySignal, ConnectivityState, Coordinates, LocationProvider, UiState, Units,
    Weather, WeatherStateReducer,
    connectivity::{LinkProbe, StaticProbe, host_link_lookup},
    location::{FixedLocation, IpApiLocation},
    provider::source_from_config,
};

use crate::render;

/// A location lookup that never answers must not hang the CLI.
const LOCATE_TIMEOUT: Duration = Duration::from_secs(15);

const NO_LOCATION: &str = "No location available.\n\
    Hint: pass --lat/--lon, use --locate, or store one with `weatherapp configure`.";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherapp", version, about = "Current weather and 5-day forecast")]
pub struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key, unit system and default location.
    Configure,

    /// Show current conditions.
    Now(ShowArgs),

    /// Show the 5-day / 3-hour forecast.
    Forecast(ShowArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ShowArgs {
    /// Latitude in decimal degrees.
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    pub lat: Option<f64>,

    /// Longitude in decimal degrees.
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    pub lon: Option<f64>,

    /// Locate through the public IP address.
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    pub locate: bool,

    /// metric, imperial or standard; defaults to the configured units.
    #[arg(long, value_parser = parse_units)]
    pub units: Option<Units>,

    /// Skip the link check and fetch anyway.
    #[arg(long)]
    pub assume_online: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Current,
    Forecast,
}

impl View {
    fn loading_message(self) -> &'static str {
        match self {
            View::Current => render::LOADING_CURRENT,
            View::Forecast => render::LOADING_FORECAST,
        }
    }

    fn failed_message(self) -> &'static str {
        match self {
            View::Current => render::FAILED_CURRENT,
            View::Forecast => render::FAILED_FORECAST,
        }
    }
}

fn parse_units(s: &str) -> Result<Units, String> {
    Units::try_from(s).map_err(|e| e.to_string())
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Now(args) => show(args, View::Current).await,
            Command::Forecast(args) => show(args, View::Forecast).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = Text::new("OpenWeather API key:")
        .with_default(cfg.api_key.as_deref().unwrap_or_default())
        .prompt()
        .context("Configuration aborted")?;
    if api_key.trim().is_empty() {
        bail!("The API key can not be empty.");
    }
    cfg.set_api_key(api_key.trim().to_string());

    let start = Units::all()
        .iter()
        .position(|u| *u == cfg.units)
        .unwrap_or_default();
    cfg.units = Select::new("Units:", Units::all().to_vec())
        .with_starting_cursor(start)
        .prompt()
        .context("Configuration aborted")?;

    let set_location = Confirm::new("Store a default location?")
        .with_default(cfg.location.is_some())
        .prompt()
        .context("Configuration aborted")?;

    cfg.location = if set_location {
        let latitude = CustomType::<f64>::new("Latitude:")
            .prompt()
            .context("Configuration aborted")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .prompt()
            .context("Configuration aborted")?;
        Some(Coordinates::new(latitude, longitude))
    } else {
        None
    };

    let path = cfg.save()?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}

async fn show(args: ShowArgs, view: View) -> anyhow::Result<()> {
    let cfg = Config::load()?;

    let lookup: Box<dyn LinkProbe> = if args.assume_online {
        Box::new(StaticProbe(ConnectivityState::Available))
    } else {
        host_link_lookup()
    };
    require_online(&ConnectivitySignal::from_probe(lookup.as_ref()))?;

    let units = args.units.unwrap_or(cfg.units);
    let source = source_from_config(&cfg)?;
    let reducer = Arc::new(WeatherStateReducer::new(
        Arc::new(source),
        cfg.api_key()?,
        units,
    ));

    let locator = locator_for(&args, &cfg);

    eprintln!("{}", view.loading_message());
    locate_and_load(&reducer, locator.as_ref(), LOCATE_TIMEOUT).await?;

    loop {
        match reducer.state() {
            UiState::Success(weather) => {
                print!("{}", render_view(&weather, view, units));
                return Ok(());
            }
            UiState::Error => {
                eprintln!("{}", view.failed_message());
                // A closed or non-interactive stdin counts as "no".
                let retry = Confirm::new("Retry?")
                    .with_default(true)
                    .prompt()
                    .unwrap_or(false);
                if !retry {
                    bail!("{}", view.failed_message());
                }
                info!("retrying");
                eprintln!("{}", view.loading_message());
                reducer.refresh_and_wait().await;
            }
            // Nothing else refreshes this reducer, so a commit always lands.
            UiState::Loading => {
                reducer.refresh_and_wait().await;
            }
        }
    }
}

/// Offline is a failed run: nothing was shown.
fn require_online(connectivity: &ConnectivitySignal) -> anyhow::Result<()> {
    if !connectivity.current().is_available() {
        bail!("{}", render::OFFLINE);
    }
    Ok(())
}

/// Wait at most `limit` for a location, then refresh for it with no deadline.
async fn locate_and_load(
    reducer: &WeatherStateReducer,
    locator: &dyn LocationProvider,
    limit: Duration,
) -> anyhow::Result<()> {
    let at = match tokio::time::timeout(limit, locator.last_known_location()).await {
        Ok(at) => at,
        Err(_) => {
            warn!("location lookup timed out after {limit:?}");
            None
        }
    };
    let Some(at) = at else {
        bail!(NO_LOCATION);
    };

    reducer.set_location(at.latitude, at.longitude);
    reducer.refresh_and_wait().await;
    Ok(())
}

fn locator_for(args: &ShowArgs, cfg: &Config) -> Box<dyn LocationProvider> {
    if args.locate {
        return Box::new(IpApiLocation::new());
    }

    let given = args.lat.zip(args.lon).map(|(lat, lon)| Coordinates::new(lat, lon));
    Box::new(FixedLocation(given.or(cfg.location)))
}

fn render_view(weather: &Weather, view: View, units: Units) -> String {
    match view {
        View::Current => render::current(&weather.current, units),
        View::Forecast => render::forecast(&weather.forecast, units),
    }
}
