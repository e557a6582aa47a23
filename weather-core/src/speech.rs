use crate::model::SpeechCredential;
use async_trait::async_trait;
use std::fmt::Debug;

pub mod yandex;

pub use yandex::YandexSpeechKit;

/// One-shot speech recognition and synthesis. Neither call retries.
#[async_trait]
pub trait SpeechService: Send + Sync + Debug {
    /// Recognize a complete voice recording into a single transcript.
    async fn speech_to_text(
        &self,
        audio: &[u8],
        credential: &SpeechCredential,
    ) -> anyhow::Result<String>;

    /// Synthesize `text` into a complete audio file.
    async fn text_to_speech(
        &self,
        text: &str,
        credential: &SpeechCredential,
    ) -> anyhow::Result<Vec<u8>>;
}
