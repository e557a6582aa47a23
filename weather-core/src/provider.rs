use crate::model::{WeatherObservation, WeatherQueryResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt::Debug;

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// Source of current conditions for a place name.
///
/// Implementations never fail outright: transport problems are reported as
/// [`WeatherQueryResult::ProviderError`].
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn get_weather(&self, place: &str) -> WeatherQueryResult;
}

/// Classify a provider answer by its status code.
///
/// Only 200 and 404 have meaning; every other code is a provider error.
pub fn classify(status: u16, place: &str, body: &str) -> WeatherQueryResult {
    match status {
        404 => WeatherQueryResult::NotFound(place.to_string()),
        200 => match serde_json::from_str::<OwCurrentResponse>(body) {
            Ok(parsed) => parsed.into_observation(),
            Err(err) => {
                tracing::warn!(error = %err, "weather response did not match the expected shape");
                WeatherQueryResult::ProviderError
            }
        },
        other => {
            tracing::warn!(status = other, "weather provider answered with an unexpected status");
            WeatherQueryResult::ProviderError
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    deg: u16,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

impl OwCurrentResponse {
    fn into_observation(self) -> WeatherQueryResult {
        let Some(weather) = self.weather.into_iter().next() else {
            tracing::warn!("weather response carried no description");
            return WeatherQueryResult::ProviderError;
        };

        WeatherQueryResult::Success(WeatherObservation {
            location: self.name,
            description: weather.description,
            temperature_c: self.main.temp,
            feels_like_c: self.main.feels_like,
            temp_min_c: self.main.temp_min,
            temp_max_c: self.main.temp_max,
            pressure_hpa: self.main.pressure,
            wind_speed_mps: self.wind.speed,
            wind_deg: self.wind.deg,
        })
    }
}

#[cfg(test)]
pub(crate) const MOSCOW_BODY: &str = r#"{
    "cod": 200,
    "name": "Москва",
    "weather": [{"id": 804, "main": "Clouds", "description": "пасмурно"}],
    "main": {"temp": 1.5, "feels_like": -2.0, "temp_min": 0.8, "temp_max": 2.3, "pressure": 1000, "humidity": 90},
    "wind": {"speed": 3.0, "deg": 45}
}"#;
