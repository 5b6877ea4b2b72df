use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};
use weatherbot_core::{ReportOutcome, WeatherBot};

use crate::{init, logging};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherbot", version, about = "Daily weather reports with threshold alerts")]
pub struct Cli {
    /// Config file (JSON, or TOML with a .toml extension).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// File that receives a copy of every log line.
    #[arg(long, global = true, default_value = "weatherbot.log")]
    pub log_file: PathBuf,

    /// Defaults to `run`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Send the daily report at the configured time until Ctrl-C.
    Run,

    /// Generate and send one report right now, then exit.
    Report,

    /// Interactively create a configuration file.
    Init {
        /// Where to write the file; defaults to --config or ./config.json.
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command.clone().unwrap_or(Command::Run) {
            Command::Init { path } => {
                let target = path.or(self.config).unwrap_or_else(init::default_path);
                init::run(&target)
            }
            Command::Run => {
                let bot = self.start()?;
                Arc::new(bot).run().await.context("Failed to schedule daily report")?;
                Ok(())
            }
            Command::Report => match self.start()?.generate_and_send_report().await {
                ReportOutcome::Sent => Ok(()),
                ReportOutcome::NoData => bail!("No weather data could be fetched for any location"),
                ReportOutcome::DeliveryFailed => bail!("Weather report could not be delivered"),
            },
        }
    }

    fn start(&self) -> anyhow::Result<WeatherBot> {
        logging::init(&self.log_file)?;
        tracing::info!("starting weatherbot");

        WeatherBot::from_env(self.config.as_deref()).context("Failed to start weatherbot")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["weatherbot"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_file, PathBuf::from("weatherbot.log"));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["weatherbot", "report", "--config", "bot.toml", "--log-file", "x.log"])
                .unwrap();
        assert!(matches!(cli.command, Some(Command::Report)));
        assert_eq!(cli.config, Some(PathBuf::from("bot.toml")));
        assert_eq!(cli.log_file, PathBuf::from("x.log"));
    }

    #[test]
    fn init_takes_optional_path() {
        let cli = Cli::try_parse_from(["weatherbot", "init", "--path", "new.json"]).unwrap();
        match cli.command {
            Some(Command::Init { path }) => assert_eq!(path, Some(PathBuf::from("new.json"))),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
