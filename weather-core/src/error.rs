use thiserror::Error;

/// Longest voice note the bot will transcribe, in seconds (inclusive).
pub const MAX_VOICE_DURATION_SECS: u32 = 30;

/// Failures that end a request with a user-visible text reply.
///
/// `Display` is the exact message sent back to the chat.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplyError {
    #[error("Я не нашел населенный пункт {0}")]
    LocationNotFound(String),

    #[error("Произошла непредвиденная ошибка! Попробуйте позже")]
    Provider,

    #[error("Голосовое сообщение должно быть короче {limit_secs} секунд")]
    VoiceTooLong { limit_secs: u32 },

    #[error("Могу ответить только на текстовое или голосовое сообщение")]
    UnsupportedPayload,
}
