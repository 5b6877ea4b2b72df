//! Threshold checks over normalized weather records.
//!
//! Alerts are regenerated on every cycle. Nothing here remembers what fired
//! last time.

use std::fmt;

use crate::{
    config::ThresholdConfig,
    model::{Location, WeatherRecord},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    HighTemperature,
    LowTemperature,
    HighPrecipitation,
}

/// A threshold crossing for one location. `Display` renders the report line.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub kind: AlertKind,
    pub location: Location,
    /// The observed value that crossed the threshold.
    pub value: f64,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AlertKind::HighTemperature => {
                write!(f, "High temperature alert in {}: {:.1}°F", self.location, self.value)
            }
            AlertKind::LowTemperature => {
                write!(f, "Low temperature alert in {}: {:.1}°F", self.location, self.value)
            }
            AlertKind::HighPrecipitation => {
                write!(f, "High precipitation chance in {}: {:.0}%", self.location, self.value)
            }
        }
    }
}

/// Check one record. Output order is always high temp, low temp, precipitation.
pub fn evaluate(location: &Location, record: &WeatherRecord, thresholds: &ThresholdConfig) -> Vec<Alert> {
    let mut alerts = Vec::new();
    let mut push = |kind, value| alerts.push(Alert { kind, location: location.clone(), value });

    if record.temperature > thresholds.temperature_high {
        push(AlertKind::HighTemperature, record.temperature);
    }

    if record.temperature < thresholds.temperature_low {
        push(AlertKind::LowTemperature, record.temperature);
    }

    if record.precipitation_chance > thresholds.precipitation_chance {
        push(AlertKind::HighPrecipitation, record.precipitation_chance);
    }

    alerts
}

/// Check every observation, preserving input order.
pub fn evaluate_all<'a, I>(observations: I, thresholds: &ThresholdConfig) -> Vec<Alert>
where
    I: IntoIterator<Item = &'a (Location, WeatherRecord)>,
{
    observations
        .into_iter()
        .flat_map(|(location, record)| evaluate(location, record, thresholds))
        .collect()
}
