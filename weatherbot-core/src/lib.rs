//! Core library for the `weatherbot` daily report service.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind the [`WeatherSource`] seam
//! - Threshold alerts and the plain-text report
//! - Notification channels behind the [`Notifier`] seam
//! - A polling wall-clock scheduler and the [`WeatherBot`] orchestrator
//!
//! It is used by `weatherbot-cli`, but can also be embedded in other binaries.

pub mod alert;
pub mod bot;
pub mod config;
pub mod error;
pub mod model;
pub mod notifier;
pub mod provider;
pub mod report;
pub mod scheduler;

pub use alert::{Alert, AlertKind, evaluate, evaluate_all};
pub use bot::{Report, ReportOutcome, WeatherBot};
pub use config::{Config, NotificationMethod, ThresholdConfig};
pub use error::{ConfigError, FetchError, NotificationError, SchedulerError};
pub use model::{Location, Observations, WeatherRecord};
pub use notifier::{ConsoleNotifier, MultiNotifier, Notifier, WebhookNotifier};
pub use provider::{OpenWeatherClient, WeatherSource};
pub use report::format_report;
pub use scheduler::{Cadence, Clock, Job, PeriodicScheduler, SystemClock};
