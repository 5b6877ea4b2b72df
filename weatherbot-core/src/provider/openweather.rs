use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    config::DEFAULT_API_BASE_URL,
    error::FetchError,
    model::{Location, WeatherRecord},
};

use super::WeatherSource;

const CURRENT_WEATHER_PATH: &str = "/data/2.5/weather";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// OpenWeather "current weather" client, imperial units.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Result<Self, FetchError> {
        Self::with_base_url(api_key, DEFAULT_API_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn current_weather_url(&self) -> String {
        format!("{}{}", self.base_url, CURRENT_WEATHER_PATH)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    /// Probability of precipitation, 0.0-1.0. Usually absent on current weather.
    #[serde(default)]
    pop: Option<f64>,
}

impl TryFrom<OwCurrentResponse> for WeatherRecord {
    type Error = FetchError;

    fn try_from(parsed: OwCurrentResponse) -> Result<Self, Self::Error> {
        let condition = parsed
            .weather
            .into_iter()
            .next()
            .map(|w| w.description)
            .ok_or_else(|| FetchError::MalformedResponse("empty 'weather' array".to_string()))?;

        let observed_at = DateTime::<Utc>::from_timestamp(parsed.dt, 0).ok_or_else(|| {
            FetchError::MalformedResponse(format!("observation timestamp {} out of range", parsed.dt))
        })?;

        Ok(WeatherRecord {
            temperature: parsed.main.temp,
            condition,
            humidity: parsed.main.humidity,
            wind_speed: parsed.wind.speed,
            // A missing `pop` reads as 0%, not as "unknown". Report consumers rely on this.
            precipitation_chance: parsed.pop.map(|p| p * 100.0).unwrap_or(0.0),
            observed_at,
        })
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn fetch(&self, location: &Location) -> Result<WeatherRecord, FetchError> {
        tracing::debug!(%location, "requesting current weather");

        let res = self
            .http
            .get(self.current_weather_url())
            .query(&[
                ("q", location.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "imperial"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Transport(format!("request to OpenWeather failed: {e}")))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            FetchError::Transport(format!("failed to read OpenWeather response body: {e}"))
        })?;

        if !status.is_success() {
            return Err(FetchError::Transport(format!(
                "OpenWeather request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body).map_err(|e| {
            FetchError::MalformedResponse(format!("failed to parse OpenWeather JSON: {e}"))
        })?;

        WeatherRecord::try_from(parsed)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
