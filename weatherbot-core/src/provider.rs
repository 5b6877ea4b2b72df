use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::FetchError,
    model::{Location, WeatherRecord},
};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Source of current conditions for a single location.
///
/// Each call is independent: no retry, no caching.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch(&self, location: &Location) -> Result<WeatherRecord, FetchError>;
}
