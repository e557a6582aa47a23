use std::fmt;

use crate::error::ReplyError;

/// One inbound chat message, reduced to what the dispatcher routes on.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub chat_id: i64,
    pub message_id: i64,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Voice(VoiceRef),
    /// Shared geolocation. Recognized but not answered.
    Location { latitude: f64, longitude: f64 },
    Other,
}

/// Reference to a recorded voice note held by the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceRef {
    pub file_id: String,
    pub duration_secs: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherObservation {
    pub location: String,
    pub description: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub pressure_hpa: f64,
    pub wind_speed_mps: f64,
    pub wind_deg: u16,
}

/// Outcome of a single weather lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherQueryResult {
    Success(WeatherObservation),
    NotFound(String),
    ProviderError,
}

impl WeatherQueryResult {
    pub fn into_result(self) -> Result<WeatherObservation, ReplyError> {
        match self {
            WeatherQueryResult::Success(observation) => Ok(observation),
            WeatherQueryResult::NotFound(place) => Err(ReplyError::LocationNotFound(place)),
            WeatherQueryResult::ProviderError => Err(ReplyError::Provider),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormattedReply {
    Text(String),
    Voice(Vec<u8>),
}

/// A reply bound to the chat it answers.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub chat_id: i64,
    pub body: FormattedReply,
}

/// Bearer token for the speech service. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SpeechCredential(String);

impl SpeechCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for SpeechCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SpeechCredential(***)")
    }
}
