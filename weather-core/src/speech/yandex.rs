//! Yandex SpeechKit v1 REST API.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Request, header::AUTHORIZATION};
use serde::Deserialize;

use crate::{model::SpeechCredential, util::truncate_body};

use super::SpeechService;

const STT_URL: &str = "https://stt.api.cloud.yandex.net/speech/v1/stt:recognize";
const TTS_URL: &str = "https://tts.api.cloud.yandex.net/speech/v1/tts:synthesize";

const LANGUAGE: &str = "ru-RU";
const VOICE: &str = "ermil";
const EMOTION: &str = "good";

#[derive(Debug, Clone)]
pub struct YandexSpeechKit {
    http: Client,
    stt_url: String,
    tts_url: String,
}

impl Default for YandexSpeechKit {
    fn default() -> Self {
        Self::new()
    }
}

impl YandexSpeechKit {
    pub fn new() -> Self {
        Self::with_urls(STT_URL.to_string(), TTS_URL.to_string())
    }

    pub fn with_urls(stt_url: String, tts_url: String) -> Self {
        Self {
            http: Client::new(),
            stt_url,
            tts_url,
        }
    }

    /// Raw audio as the body, recognition language in the query.
    fn recognize_request(
        &self,
        audio: &[u8],
        credential: &SpeechCredential,
    ) -> reqwest::Result<Request> {
        self.http
            .post(&self.stt_url)
            .query(&[("lang", LANGUAGE)])
            .header(AUTHORIZATION, credential.bearer())
            .body(audio.to_vec())
            .build()
    }

    /// Form-encoded text with the fixed voice profile.
    fn synthesize_request(
        &self,
        text: &str,
        credential: &SpeechCredential,
    ) -> reqwest::Result<Request> {
        self.http
            .post(&self.tts_url)
            .header(AUTHORIZATION, credential.bearer())
            .form(&[
                ("text", text),
                ("lang", LANGUAGE),
                ("voice", VOICE),
                ("emotion", EMOTION),
            ])
            .build()
    }
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    result: String,
}

#[async_trait]
impl SpeechService for YandexSpeechKit {
    async fn speech_to_text(&self, audio: &[u8], credential: &SpeechCredential) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting SpeechKit recognition");

        let request = self
            .recognize_request(audio, credential)
            .context("Failed to build SpeechKit stt request")?;

        let res = self
            .http
            .execute(request)
            .await
            .context("Failed to send request to SpeechKit (stt)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read SpeechKit stt response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "SpeechKit stt request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: RecognizeResponse =
            serde_json::from_str(&body).context("Failed to parse SpeechKit stt JSON")?;

        tracing::debug!(transcript = %parsed.result, "recognition complete");
        Ok(parsed.result)
    }

    async fn text_to_speech(&self, text: &str, credential: &SpeechCredential) -> Result<Vec<u8>> {
        let request = self
            .synthesize_request(text, credential)
            .context("Failed to build SpeechKit tts request")?;

        let res = self
            .http
            .execute(request)
            .await
            .context("Failed to send request to SpeechKit (tts)")?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!(
                "SpeechKit tts request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let audio = res
            .bytes()
            .await
            .context("Failed to read SpeechKit tts audio")?;

        tracing::debug!(audio_bytes = audio.len(), "synthesis complete");
        Ok(audio.to_vec())
    }
}
