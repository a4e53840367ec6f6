use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use tracing::info;
use weather_core::{Config, ProviderId, Relays};

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-server", version, about = "Weather relay server")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP relay.
    Serve {
        /// Address to bind, e.g. "127.0.0.1".
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,

        /// Prebuilt frontend bundle to serve with index.html fallback.
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Store an API key for a provider in the config file.
    Configure {
        /// Provider short name, "weatherapi" or "openweather".
        provider: String,
    },

    /// Run one relay call and print what a client would receive.
    Show {
        city: String,

        /// Forecast length, forwarded as given.
        #[arg(long)]
        days: Option<String>,

        /// Ask for current conditions instead of a forecast.
        #[arg(long)]
        current: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };
        let mut config = Config::load_from(&config_path)?;

        match self.command {
            Command::Configure { provider } => {
                let id = ProviderId::try_from(provider.as_str())?;
                let api_key = Password::new(&format!("API key for {id}:"))
                    .with_display_mode(PasswordDisplayMode::Masked)
                    .without_confirmation()
                    .prompt()
                    .context("Failed to read API key")?;

                config.upsert_provider_api_key(id, api_key.trim().to_string());
                config.save_to(&config_path)?;
                println!("Saved {id} API key to {}", config_path.display());
            }
            Command::Serve { host, port, static_dir } => {
                config.apply_env()?;
                if let Some(host) = host {
                    config.server.host = host;
                }
                if let Some(port) = port {
                    config.server.port = port;
                }
                if static_dir.is_some() {
                    config.server.static_dir = static_dir;
                }

                server::serve(&config).await?;
            }
            Command::Show { city, days, current } => {
                config.apply_env()?;
                let relays = Relays::from_settings(&config.relay_settings()?)?;

                info!(%city, current, "running one-off relay call");
                let response = if current {
                    relays.get_weather(Some(&city)).await
                } else {
                    relays.get_forecast(Some(&city), days.as_deref()).await
                };

                println!("HTTP {}", response.status.as_u16());
                println!("{}", serde_json::to_string_pretty(&response.body)?);
            }
        }

        Ok(())
    }
}
