use std::fmt::Write;

use crate::{
    alert::Alert,
    model::{Location, WeatherRecord},
};

pub const REPORT_TITLE: &str = "Daily Weather Report";
pub const REPORT_SUBJECT: &str = "Weather Report";

/// Render the plain-text report body.
///
/// Sections follow the order of `observations`. The `ALERTS:` block is only
/// present when `alerts` is non-empty.
pub fn format_report<'a, I>(observations: I, alerts: &[Alert]) -> String
where
    I: IntoIterator<Item = &'a (Location, WeatherRecord)>,
{
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "{REPORT_TITLE}\n");

    for (location, record) in observations {
        let _ = writeln!(out, "=== {location} ===");
        let _ = writeln!(out, "Temperature: {:.1}°F", record.temperature);
        let _ = writeln!(out, "Condition: {}", record.condition);
        let _ = writeln!(out, "Humidity: {}%", record.humidity);
        let _ = writeln!(out, "Wind: {:.1} mph", record.wind_speed);
        let _ = writeln!(out, "Precipitation Chance: {:.0}%\n", record.precipitation_chance);
    }

    if !alerts.is_empty() {
        out.push_str("ALERTS:\n");
        for alert in alerts {
            let _ = writeln!(out, "- {alert}");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertKind;
    use chrono::Utc;

    fn observation(name: &str, temperature: f64) -> (Location, WeatherRecord) {
        (
            Location::new(name).unwrap(),
            WeatherRecord {
                temperature,
                condition: "light rain".into(),
                humidity: 81,
                wind_speed: 12.34,
                precipitation_chance: 35.0,
                observed_at: Utc::now(),
            },
        )
    }

    #[test]
    fn renders_fixed_layout() {
        let report = format_report(&vec![observation("Paris", 61.24)], &[]);

        assert_eq!(
            report,
            "Daily Weather Report\n\n\
             === Paris ===\n\
             Temperature: 61.2°F\n\
             Condition: light rain\n\
             Humidity: 81%\n\
             Wind: 12.3 mph\n\
             Precipitation Chance: 35%\n\n"
        );
    }

    #[test]
    fn no_alerts_means_no_alerts_section() {
        let report = format_report(&vec![observation("Paris", 60.0), observation("Oslo", 40.0)], &[]);
        assert!(!report.contains("ALERTS"));
    }

    #[test]
    fn alerts_section_lists_alerts_in_order() {
        let alerts = vec![
            Alert { kind: AlertKind::HighTemperature, location: Location::new("Paris").unwrap(), value: 95.0 },
            Alert { kind: AlertKind::HighPrecipitation, location: Location::new("Oslo").unwrap(), value: 70.0 },
        ];
        let report = format_report(&vec![observation("Paris", 95.0)], &alerts);

        let tail = report.split("ALERTS:\n").nth(1).expect("alerts section present");
        assert_eq!(
            tail,
            "- High temperature alert in Paris: 95.0°F\n- High precipitation chance in Oslo: 70%\n"
        );
    }

    #[test]
    fn sections_follow_input_order() {
        let report = format_report(
            &vec![observation("Tokyo", 60.0), observation("Paris", 60.0), observation("Lima", 60.0)],
            &[],
        );

        let tokyo = report.find("=== Tokyo ===").unwrap();
        let paris = report.find("=== Paris ===").unwrap();
        let lima = report.find("=== Lima ===").unwrap();
        assert!(tokyo < paris && paris < lima);
    }
}
