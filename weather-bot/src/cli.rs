use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use tokio::io::AsyncReadExt;
use weather_core::{
    Config, Dispatcher, OpenWeatherProvider, SpeechCredential, TelegramClient, Update,
    YandexSpeechKit, config::DEFAULT_LISTEN_ADDR,
};

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-bot", version, about = "Telegram bot answering weather questions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Enter bot, weather and speech credentials and save them.
    Configure,

    /// Run the webhook server.
    Serve {
        /// Address to listen on; overrides the configured one.
        #[arg(long)]
        listen: Option<String>,
    },

    /// Process a single update read from a file or stdin, then exit.
    Handle {
        /// Update JSON file; stdin when absent.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Speech service token for this invocation only.
        #[arg(long, env = "YC_IAM_TOKEN", hide_env_values = true)]
        speech_token: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Serve { listen } => {
                let config = Config::load()?;
                let dispatcher = build_dispatcher(&config)?;
                let listen = listen.unwrap_or_else(|| config.listen_addr().to_string());

                server::serve(&listen, dispatcher, config.speech_credential()).await
            }
            Command::Handle { file, speech_token } => {
                let config = Config::load()?;
                let dispatcher = build_dispatcher(&config)?;
                let credential = speech_token
                    .map(SpeechCredential::new)
                    .or_else(|| config.speech_credential());

                let raw = match file {
                    Some(path) => tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("Failed to read update file: {}", path.display()))?,
                    None => {
                        let mut buf = String::new();
                        tokio::io::stdin()
                            .read_to_string(&mut buf)
                            .await
                            .context("Failed to read update from stdin")?;
                        buf
                    }
                };

                let update: Update =
                    serde_json::from_str(&raw).context("Failed to parse Telegram update JSON")?;

                dispatcher.handle_update(update, credential.as_ref()).await;
                Ok(())
            }
        }
    }
}

/// Wire the real transports. A missing bot or weather token stops startup.
fn build_dispatcher(config: &Config) -> Result<Dispatcher> {
    let telegram = Arc::new(TelegramClient::new(config.require_bot_token()?.to_owned()));
    let weather = Arc::new(OpenWeatherProvider::new(config.require_weather_token()?.to_owned()));

    if config.speech_token.is_none() {
        tracing::warn!("no speech token configured; voice queries need one per invocation");
    }

    Ok(Dispatcher::new(
        weather,
        Arc::new(YandexSpeechKit::new()),
        telegram.clone(),
        telegram,
    ))
}

fn configure() -> Result<()> {
    let mut config = Config::load_file()?;

    if let Some(token) = prompt_secret("Telegram bot token:", config.telegram_bot_token.is_some())? {
        config.telegram_bot_token = Some(token);
    }
    if let Some(token) = prompt_secret("OpenWeather API key:", config.open_weather_token.is_some())? {
        config.open_weather_token = Some(token);
    }
    if let Some(token) = prompt_secret("Yandex Cloud IAM token (optional):", config.speech_token.is_some())? {
        config.speech_token = Some(token);
    }

    let listen = Text::new("Listen address:")
        .with_default(config.listen_addr.as_deref().unwrap_or(DEFAULT_LISTEN_ADDR))
        .prompt()
        .context("Failed to read listen address")?;
    config.listen_addr = Some(listen);

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}

/// Empty input keeps the stored value.
fn prompt_secret(message: &str, already_set: bool) -> Result<Option<String>> {
    let help = if already_set {
        "Leave empty to keep the current value"
    } else {
        "Leave empty to skip"
    };

    let value = Password::new(message)
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_help_message(help)
        .prompt()
        .with_context(|| format!("Failed to read input for '{message}'"))?;

    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}
