use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::model::SpeechCredential;

pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_WEATHER_TOKEN: &str = "OPEN_WEATHER_TOKEN";
pub const ENV_SPEECH_TOKEN: &str = "YC_IAM_TOKEN";
pub const ENV_LISTEN: &str = "WEATHER_BOT_LISTEN";

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// telegram_bot_token = "123456:ABC..."
/// open_weather_token = "..."
/// speech_token = "t1.9euelZ..."
/// listen_addr = "0.0.0.0:8080"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub telegram_bot_token: Option<String>,
    pub open_weather_token: Option<String>,
    /// IAM token for the speech service. May also be supplied per invocation.
    pub speech_token: Option<String>,
    pub listen_addr: Option<String>,
}

impl Config {
    /// Load config from disk (empty if absent), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_file()?;
        cfg.apply_overrides(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load_file() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-bot")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Non-empty values from `lookup` replace what the file said.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fields = [
            (ENV_BOT_TOKEN, &mut self.telegram_bot_token),
            (ENV_WEATHER_TOKEN, &mut self.open_weather_token),
            (ENV_SPEECH_TOKEN, &mut self.speech_token),
            (ENV_LISTEN, &mut self.listen_addr),
        ];

        for (key, field) in fields {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *field = Some(value);
            }
        }
    }

    /// The bot cannot answer anyone without this, so callers treat its
    /// absence as fatal at startup.
    pub fn require_bot_token(&self) -> Result<&str> {
        self.telegram_bot_token.as_deref().ok_or_else(|| {
            anyhow!(
                "No Telegram bot token configured.\n\
                 Hint: set {ENV_BOT_TOKEN} or run `weather-bot configure`."
            )
        })
    }

    pub fn require_weather_token(&self) -> Result<&str> {
        self.open_weather_token.as_deref().ok_or_else(|| {
            anyhow!(
                "No OpenWeather API key configured.\n\
                 Hint: set {ENV_WEATHER_TOKEN} or run `weather-bot configure`."
            )
        })
    }

    /// Configured speech token, if any. Voice queries without one fail at
    /// the speech service rather than at startup.
    pub fn speech_credential(&self) -> Option<SpeechCredential> {
        self.speech_token.as_deref().map(SpeechCredential::new)
    }

    pub fn listen_addr(&self) -> &str {
        self.listen_addr.as_deref().unwrap_or(DEFAULT_LISTEN_ADDR)
    }
}
