//! Unit abbreviations expanded into words a speech synthesizer reads aloud.

/// Applied in order, each once.
const SPEAKABLE_UNITS: [(&str, &str); 3] = [
    ("°C", "градусов по Цельсию"),
    ("мм.рт.ст", "миллиметров ртутного столба"),
    ("м/с", "метров в секунду"),
];

pub fn to_speakable(text: &str) -> String {
    SPEAKABLE_UNITS
        .iter()
        .fold(text.to_string(), |acc, (abbr, words)| acc.replace(abbr, words))
}
