//! Rendering of a weather observation as a single Russian sentence.

use crate::model::WeatherObservation;

const HPA_TO_MMHG: f64 = 0.750064;

/// Compass labels, clockwise from north, one per 22.5° sector.
const WIND_DIRECTIONS: [&str; 16] = [
    "Северный",
    "Северо-северо-восточный",
    "Северо-восточный",
    "Востоко-северо-восточный",
    "Восточный",
    "Востоко-юго-восточный",
    "Юго-восточный",
    "Юго-юго-восточный",
    "Южный",
    "Юго-юго-западный",
    "Юго-западный",
    "Западо-юго-западный",
    "Западный",
    "Западо-северо-западный",
    "Северо-западный",
    "Северо-северо-западный",
];

const SECTOR_DEG: f64 = 360.0 / WIND_DIRECTIONS.len() as f64;

/// Label for a wind bearing. Sectors are centered on the compass points,
/// so north covers [348.75, 11.25).
pub fn wind_direction(degrees: f64) -> &'static str {
    let sector = ((degrees + SECTOR_DEG / 2.0) / SECTOR_DEG).floor();
    let index = sector.rem_euclid(WIND_DIRECTIONS.len() as f64) as usize;
    WIND_DIRECTIONS[index]
}

/// Truncates toward zero; the bot never rounds pressure up.
pub fn hpa_to_mmhg(hpa: f64) -> i64 {
    (hpa * HPA_TO_MMHG).trunc() as i64
}

pub fn format_observation(obs: &WeatherObservation) -> String {
    let direction = wind_direction(f64::from(obs.wind_deg)).to_lowercase();

    format!(
        "Погода в городе {location}: Сейчас {description}, температура {temp}°C, \
         но ощущается как {feels}°C. Максимальная температура {max}°C, \
         минимальная температура {min}°C. Давление составляет {pressure} мм.рт.ст. \
         Ветер {direction} ({deg}°) со скоростью {speed} м/с.",
        location = obs.location,
        description = obs.description,
        temp = obs.temperature_c,
        feels = obs.feels_like_c,
        max = obs.temp_max_c,
        min = obs.temp_min_c,
        pressure = hpa_to_mmhg(obs.pressure_hpa),
        deg = obs.wind_deg,
        speed = obs.wind_speed_mps,
    )
}

#[cfg(test)]
pub(crate) fn sample_observation(location: &str) -> WeatherObservation {
    WeatherObservation {
        location: location.to_string(),
        description: "пасмурно".to_string(),
        temperature_c: -3.5,
        feels_like_c: -8.2,
        temp_min_c: -4.0,
        temp_max_c: -2.1,
        pressure_hpa: 1013.0,
        wind_speed_mps: 4.5,
        wind_deg: 200,
    }
}
