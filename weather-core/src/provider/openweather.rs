use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Request};
use serde_json::Value;

use crate::{model::WeatherQueryResult, util::truncate_body};

use super::{WeatherProvider, classify};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    fn current_request(&self, place: &str) -> reqwest::Result<Request> {
        self.http
            .get(format!("{}/weather", self.base_url))
            .query(&[
                ("q", place),
                ("appid", self.api_key.as_str()),
                ("lang", "ru"),
                ("units", "metric"),
            ])
            .build()
    }

    /// Errors never carry the request URL: it holds the API key.
    async fn fetch_current(&self, place: &str) -> Result<(u16, String)> {
        let request = self
            .current_request(place)
            .map_err(reqwest::Error::without_url)
            .context("Failed to build OpenWeather request")?;

        let res = self
            .http
            .execute(request)
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to send request to OpenWeather (current weather)")?;

        let http_status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to read OpenWeather current response body")?;

        Ok((response_code(http_status, &body), body))
    }
}

/// OpenWeather repeats the status in the body as `cod`, sometimes as a
/// number and sometimes as a string. Prefer it over the HTTP status.
fn response_code(http_status: u16, body: &str) -> u16 {
    let cod = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("cod").cloned());

    let parsed = match cod {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };

    parsed.unwrap_or(http_status)
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn get_weather(&self, place: &str) -> WeatherQueryResult {
        match self.fetch_current(place).await {
            Ok((status, body)) => {
                tracing::debug!(status, "OpenWeather answered");
                if status != 200 && status != 404 {
                    tracing::warn!(status, body = %truncate_body(&body), "OpenWeather request failed");
                }
                classify(status, place, &body)
            }
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "OpenWeather unreachable");
                WeatherQueryResult::ProviderError
            }
        }
    }
}
