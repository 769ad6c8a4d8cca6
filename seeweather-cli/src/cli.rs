use anyhow::bail;
use clap::{Parser, Subcommand};
use std::sync::Arc;

use seeweather_core::{
    Config, Consent, Coordinate, HomeCoordinate, LocationProvider, LocationSource, Phase,
    WeatherApp, WeatherFetcher,
};

use crate::source::{ConsoleSource, FixedSource};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "seeweather", version, about = "Current weather for where you are")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeatherMap API key and a home coordinate.
    Configure,

    /// Show the current weather at your location.
    Show {
        /// Latitude, bypassing the configured home location.
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude, bypassing the configured home location.
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { lat, lon } => show(lat, lon).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key =
        inquire::Password::new("OpenWeatherMap API key:").without_confirmation().prompt()?;
    config.set_api_key(api_key);

    let set_home = inquire::Confirm::new("Set a home coordinate for `seeweather show`?")
        .with_default(true)
        .prompt()?;
    if set_home {
        let lat = inquire::CustomType::<f64>::new("Latitude:").prompt()?;
        let lon = inquire::CustomType::<f64>::new("Longitude:").prompt()?;
        config.location.home = Some(HomeCoordinate { lat, lon });
    }

    // reconfiguring restarts the consent flow
    config.record_consent(Consent::Undetermined);
    config.save()?;

    println!("Configuration written to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(lat: Option<f64>, lon: Option<f64>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let api_key = config.require_api_key()?;

    let fetcher = WeatherFetcher::new(api_key)?;
    let app = WeatherApp::new(fetcher);

    let source: Arc<dyn LocationSource> = match (lat, lon) {
        (Some(lat), Some(lon)) => Arc::new(FixedSource::new(Coordinate::new(lat, lon))),
        _ => Arc::new(ConsoleSource::new(config)),
    };
    let provider = LocationProvider::new(source);

    let mut state_rx = app.subscribe();
    tokio::spawn(Arc::clone(&app).drive(provider.subscribe()));

    provider.request_location().await;

    let state = loop {
        {
            let state = state_rx.borrow_and_update();
            if state.is_terminal() {
                break state.clone();
            }
        }
        state_rx.changed().await?;
    };

    match (state.phase, state.snapshot) {
        (Phase::Ready, Some(snapshot)) => {
            println!("{}", snapshot.temperature_label());
            println!("{}", snapshot.location_name);
            if !snapshot.condition.is_empty() {
                println!("{}", snapshot.condition);
            }
            Ok(())
        }
        (Phase::NoLocation(err), _) => bail!("{err}"),
        (Phase::Failed(err), _) => bail!("{err}"),
        (phase, _) => bail!("weather pipeline stopped in an unexpected phase: {phase:?}"),
    }
}
