//! The report cycle and the long-running scheduler loop.

use async_trait::async_trait;
use std::{future::Future, path::Path, sync::Arc, time::Duration};

use crate::{
    alert::{Alert, evaluate_all},
    config::{Config, api_key_from_env},
    error::{ConfigError, FetchError, SchedulerError},
    model::{Location, Observations, WeatherRecord},
    notifier::{Notifier, notifier_from_config},
    provider::{OpenWeatherClient, WeatherSource},
    report::{REPORT_SUBJECT, format_report},
    scheduler::{Clock, Job, PeriodicScheduler},
};

/// Pause between scheduler polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A formatted report plus the data it was built from.
#[derive(Debug, Clone)]
pub struct Report {
    pub observations: Observations,
    pub alerts: Vec<Alert>,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    Sent,
    /// No location could be fetched; nothing was sent.
    NoData,
    DeliveryFailed,
}

#[derive(Debug)]
pub struct WeatherBot {
    config: Config,
    source: Box<dyn WeatherSource>,
    notifier: Box<dyn Notifier>,
}

impl WeatherBot {
    pub fn new(config: Config, source: Box<dyn WeatherSource>, notifier: Box<dyn Notifier>) -> Self {
        Self { config, source, notifier }
    }

    /// Wire the OpenWeather client and the configured notification channels.
    pub fn from_config(config: Config, api_key: String) -> Result<Self, ConfigError> {
        let source = OpenWeatherClient::with_base_url(api_key, &config.api_base_url)
            .map_err(|e| ConfigError::Invalid(format!("weather client: {e}")))?;
        let notifier = notifier_from_config(&config.notification_methods)
            .map_err(|e| ConfigError::Invalid(format!("notification methods: {e}")))?;

        Ok(Self::new(config, Box::new(source), Box::new(notifier)))
    }

    /// Load the config file and the API key from the environment.
    pub fn from_env(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = Config::resolve_path(config_path)?;
        let config = Config::load(&path)?;
        tracing::info!(
            path = %path.display(),
            locations = config.locations.len(),
            "configuration loaded"
        );

        let api_key = api_key_from_env()?;
        Self::from_config(config, api_key)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch every configured location in order, one request at a time.
    pub async fn fetch_all(&self) -> Vec<(Location, Result<WeatherRecord, FetchError>)> {
        let mut results = Vec::with_capacity(self.config.locations.len());
        for location in &self.config.locations {
            let result = self.source.fetch(location).await;
            results.push((location.clone(), result));
        }
        results
    }

    /// Build the report from whatever locations could be fetched.
    ///
    /// Returns `None` when every fetch failed.
    pub async fn generate_report(&self) -> Option<Report> {
        let mut observations = Observations::new();

        for (location, result) in self.fetch_all().await {
            match result {
                Ok(record) => {
                    tracing::info!(%location, "weather data fetched");
                    observations.push((location, record));
                }
                Err(err) => {
                    tracing::error!(%location, error = %err, "error fetching weather, omitting from report");
                }
            }
        }

        if observations.is_empty() {
            return None;
        }

        let alerts = evaluate_all(&observations, &self.config.alert_thresholds);
        let body = format_report(&observations, &alerts);

        Some(Report { observations, alerts, body })
    }

    pub async fn generate_and_send_report(&self) -> ReportOutcome {
        tracing::info!("preparing daily weather report");

        let Some(report) = self.generate_report().await else {
            tracing::warn!("no weather data available for report");
            return ReportOutcome::NoData;
        };

        match self.notifier.send_notification(REPORT_SUBJECT, &report.body).await {
            Ok(()) => {
                tracing::info!(
                    locations = report.observations.len(),
                    alerts = report.alerts.len(),
                    "daily weather report sent"
                );
                ReportOutcome::Sent
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to deliver weather report");
                ReportOutcome::DeliveryFailed
            }
        }
    }

    /// Schedule the daily report and poll until Ctrl-C.
    pub async fn run(self: Arc<Self>) -> Result<(), SchedulerError> {
        self.run_until(PeriodicScheduler::new(), shutdown_signal()).await
    }

    /// Schedule the daily report on `scheduler` and poll until `shutdown` resolves.
    pub async fn run_until<C, F>(
        self: Arc<Self>,
        mut scheduler: PeriodicScheduler<C>,
        shutdown: F,
    ) -> Result<(), SchedulerError>
    where
        C: Clock,
        F: Future<Output = ()>,
    {
        let at = self.config.report_time.clone();
        scheduler.schedule_daily(DailyReportJob(Arc::clone(&self)), &at)?;
        tracing::info!(report_time = %at, "weatherbot running");

        tokio::pin!(shutdown);
        loop {
            scheduler.tick().await;

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("weatherbot stopped");
                    break;
                }
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
            }
        }

        Ok(())
    }
}

/// Scheduler job that runs one full report cycle.
struct DailyReportJob(Arc<WeatherBot>);

#[async_trait]
impl Job for DailyReportJob {
    async fn run(&self) -> anyhow::Result<()> {
        self.0.generate_and_send_report().await;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
}
