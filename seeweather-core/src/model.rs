use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A device position: latitude and longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Normalized, display-ready weather record for one location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub temperature_c: f64,
    pub condition: String,
    pub observed_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    /// Temperature as shown to the user, e.g. `31°c`.
    ///
    /// The fractional part is truncated toward zero, so `31.5` renders as
    /// `31°c` and `-2.7` as `-2°c`.
    pub fn temperature_label(&self) -> String {
        format!("{}°c", self.temperature_c.trunc() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(temp: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            location_name: "Jakarta".to_string(),
            temperature_c: temp,
            condition: "haze".to_string(),
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn temperature_label_truncates_toward_zero() {
        assert_eq!(snapshot(31.5).temperature_label(), "31°c");
        assert_eq!(snapshot(31.0).temperature_label(), "31°c");
        assert_eq!(snapshot(-2.7).temperature_label(), "-2°c");
        assert_eq!(snapshot(0.4).temperature_label(), "0°c");
    }
}
