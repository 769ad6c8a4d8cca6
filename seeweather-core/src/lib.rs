//! Core library for the `seeweather` app.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The location pipeline: permission, one-shot fix, publication
//! - The weather fetcher and the observable display state
//!
//! It is used by `seeweather-cli`, but can also be reused by other binaries or services.

pub mod app;
pub mod config;
pub mod error;
pub mod fetch;
pub mod location;
pub mod model;

pub use app::{DisplayState, Phase, WeatherApp};
pub use config::{Config, Consent, HomeCoordinate};
pub use error::{FetchError, LocationError};
pub use fetch::WeatherFetcher;
pub use location::{Authorization, LocationProvider, LocationSource, LocationState};
pub use model::{Coordinate, WeatherSnapshot};
