use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use tracing::warn;

use seeweather_core::{
    Authorization, Config, Consent, Coordinate, LocationError, LocationSource,
};

/// Location source backed by the config file: consent is asked once on the
/// console and persisted, the fix is the configured home coordinate.
#[derive(Debug)]
pub struct ConsoleSource {
    config: Mutex<Config>,
}

impl ConsoleSource {
    pub fn new(config: Config) -> Self {
        Self { config: Mutex::new(config) }
    }
}

#[async_trait]
impl LocationSource for ConsoleSource {
    async fn request_authorization(&self) -> Authorization {
        let mut config = self.config.lock().unwrap_or_else(PoisonError::into_inner);

        match config.location.consent {
            Consent::Granted => Authorization::Granted,
            Consent::Denied => Authorization::Denied,
            Consent::Undetermined => {
                let allowed =
                    inquire::Confirm::new("Allow seeweather to use your home location?")
                        .with_default(true)
                        .prompt()
                        .unwrap_or(false);

                config.record_consent(if allowed { Consent::Granted } else { Consent::Denied });
                if let Err(err) = config.save() {
                    warn!("could not persist location consent: {err:#}");
                }

                if allowed { Authorization::Granted } else { Authorization::Denied }
            }
        }
    }

    async fn request_fix(&self) -> Result<Coordinate, LocationError> {
        let config = self.config.lock().unwrap_or_else(PoisonError::into_inner);
        config.location.home.map(Coordinate::from).ok_or(LocationError::Unavailable)
    }
}

/// Source for a coordinate the user supplied directly on the command line.
/// No consent prompt: handing us the coordinate is the consent.
#[derive(Debug)]
pub struct FixedSource {
    coordinate: Coordinate,
}

impl FixedSource {
    pub fn new(coordinate: Coordinate) -> Self {
        Self { coordinate }
    }
}

#[async_trait]
impl LocationSource for FixedSource {
    async fn request_authorization(&self) -> Authorization {
        Authorization::Granted
    }

    async fn request_fix(&self) -> Result<Coordinate, LocationError> {
        Ok(self.coordinate)
    }
}
