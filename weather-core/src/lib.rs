//! Core library for the weather bot.
//!
//! This crate defines:
//! - The message dispatcher (commands, text queries, voice queries)
//! - Weather lookup and rendering of observations as text and speech
//! - Telegram and speech-service transports behind small traits
//! - Configuration & credentials handling
//!
//! It is used by `weather-bot`, but the dispatcher can be driven by any
//! transport that implements [`Responder`] and [`MediaSource`].

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod format;
pub mod model;
pub mod provider;
pub mod speakable;
pub mod speech;
pub mod telegram;

mod util;

pub use config::Config;
pub use dispatcher::Dispatcher;
pub use error::{MAX_VOICE_DURATION_SECS, ReplyError};
pub use model::{
    FormattedReply, InboundMessage, Payload, Reply, SpeechCredential, VoiceRef,
    WeatherObservation, WeatherQueryResult,
};
pub use provider::{OpenWeatherProvider, WeatherProvider};
pub use speech::{SpeechService, YandexSpeechKit};
pub use telegram::{MediaSource, Responder, TelegramClient, types::Update};
