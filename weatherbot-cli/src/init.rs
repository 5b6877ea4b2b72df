use anyhow::{Context, Result, bail};
use inquire::{Confirm, CustomType, MultiSelect, Text, validator::Validation};
use std::path::{Path, PathBuf};
use weatherbot_core::{
    Config, Location, NotificationMethod, ThresholdConfig,
    config::{API_KEY_ENV, CONFIG_FILE_NAME, DEFAULT_API_BASE_URL, DEFAULT_REPORT_TIME},
    scheduler::parse_time_of_day,
};

const CONSOLE: &str = "console";
const WEBHOOK: &str = "webhook";

pub fn default_path() -> PathBuf {
    PathBuf::from(CONFIG_FILE_NAME)
}

/// Prompt for every setting and write the config file to `path`.
pub fn run(path: &Path) -> Result<()> {
    if path.exists() {
        let overwrite = Confirm::new(&format!("{} already exists. Overwrite?", path.display()))
            .with_default(false)
            .prompt()?;
        if !overwrite {
            println!("Keeping existing configuration.");
            return Ok(());
        }
    }

    let locations = Text::new("Locations (comma separated):")
        .with_placeholder("Paris, Tokyo")
        .with_validator(|input: &str| {
            Ok(match parse_locations(input) {
                Ok(_) => Validation::Valid,
                Err(e) => Validation::Invalid(e.to_string().into()),
            })
        })
        .prompt()?;
    let locations = parse_locations(&locations)?;

    let temperature_high = CustomType::<f64>::new("Alert when temperature is above (°F):")
        .with_default(90.0)
        .prompt()?;
    let temperature_low = CustomType::<f64>::new("Alert when temperature is below (°F):")
        .with_default(20.0)
        .prompt()?;
    let precipitation_chance = CustomType::<f64>::new("Alert when precipitation chance is above (%):")
        .with_default(50.0)
        .prompt()?;

    let report_time = Text::new("Daily report time (HH:MM, local):")
        .with_default(DEFAULT_REPORT_TIME)
        .with_validator(|input: &str| {
            Ok(match parse_time_of_day(input) {
                Ok(_) => Validation::Valid,
                Err(e) => Validation::Invalid(e.to_string().into()),
            })
        })
        .prompt()?;

    let channels = MultiSelect::new("Notification channels:", vec![CONSOLE, WEBHOOK])
        .with_default(&[0])
        .prompt()?;

    let mut notification_methods = Vec::new();
    for channel in channels {
        match channel {
            CONSOLE => notification_methods.push(NotificationMethod::Console),
            _ => {
                let url = Text::new("Webhook URL:").prompt()?;
                notification_methods.push(NotificationMethod::Webhook { url: url.trim().to_string() });
            }
        }
    }

    let config = Config {
        locations,
        notification_methods,
        alert_thresholds: ThresholdConfig { temperature_high, temperature_low, precipitation_chance },
        report_time: report_time.trim().to_string(),
        api_base_url: DEFAULT_API_BASE_URL.to_string(),
    };

    config.validate().context("Configuration is not valid")?;
    config.save(path)?;

    println!("Configuration written to {}", path.display());
    println!("Set {API_KEY_ENV} before running `weatherbot run`.");
    Ok(())
}

fn parse_locations(input: &str) -> Result<Vec<Location>> {
    let locations = input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(Location::new)
        .collect::<Result<Vec<_>, _>>()?;

    if locations.is_empty() {
        bail!("Enter at least one location");
    }
    Ok(locations)
}
