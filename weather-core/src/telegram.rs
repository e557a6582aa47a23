//! Telegram transport: outbound replies and voice file downloads.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{
    Client, Request, Response,
    multipart::{Form, Part},
};
use std::fmt::{self, Debug};

pub mod types;

use types::{ApiResponse, File, GetFileRequest, ReplyParameters, SendMessageRequest};

use crate::util::truncate_body;

pub const API_BASE: &str = "https://api.telegram.org";

/// Outbound side of a chat.
///
/// Sends are fire-and-forget: implementations log delivery failures and
/// never report them back to the caller.
#[async_trait]
pub trait Responder: Send + Sync + Debug {
    async fn send_text(&self, chat_id: i64, text: &str, reply_to: Option<i64>);

    async fn send_voice(&self, chat_id: i64, audio: Vec<u8>);
}

/// Fetches the bytes of a file attached to a message.
#[async_trait]
pub trait MediaSource: Send + Sync + Debug {
    async fn download(&self, file_id: &str) -> Result<Vec<u8>>;
}

#[derive(Clone)]
pub struct TelegramClient {
    token: String,
    api_base: String,
    http: Client,
}

impl Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    pub fn new(token: String) -> Self {
        Self::with_api_base(token, API_BASE.to_string())
    }

    pub fn with_api_base(token: String, api_base: String) -> Self {
        Self {
            token,
            api_base: api_base.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.token)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{file_path}", self.api_base, self.token)
    }

    fn message_request(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> reqwest::Result<Request> {
        let body = SendMessageRequest {
            chat_id,
            text,
            reply_parameters: reply_to.map(|message_id| ReplyParameters { message_id }),
        };

        self.http.post(self.method_url("sendMessage")).json(&body).build()
    }

    fn voice_request(&self, form: Form) -> reqwest::Result<Request> {
        self.http.post(self.method_url("sendVoice")).multipart(form).build()
    }

    // Every reqwest error is stripped of its URL: the path holds the token.
    async fn execute(&self, request: reqwest::Result<Request>, method: &str) -> Result<Response> {
        let request = request
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Failed to build Telegram {method} request"))?;

        self.http
            .execute(request)
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Failed to send request to Telegram ({method})"))
    }

    async fn post_message(&self, chat_id: i64, text: &str, reply_to: Option<i64>) -> Result<()> {
        let res = self
            .execute(self.message_request(chat_id, text, reply_to), "sendMessage")
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Telegram sendMessage failed with status {status}: {}",
                truncate_body(&body)
            ));
        }

        Ok(())
    }

    async fn post_voice(&self, chat_id: i64, audio: Vec<u8>) -> Result<()> {
        let form = voice_form(chat_id, audio)?;
        let res = self.execute(self.voice_request(form), "sendVoice").await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Telegram sendVoice failed with status {status}: {}",
                truncate_body(&body)
            ));
        }

        Ok(())
    }
}

/// `chat_id` field plus the audio as a binary `voice` file part.
fn voice_form(chat_id: i64, audio: Vec<u8>) -> Result<Form> {
    let voice = Part::bytes(audio)
        .file_name("voice.ogg")
        .mime_str("audio/ogg")
        .context("Invalid voice part MIME type")?;

    Ok(Form::new()
        .text("chat_id", chat_id.to_string())
        .part("voice", voice))
}

#[async_trait]
impl Responder for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str, reply_to: Option<i64>) {
        match self.post_message(chat_id, text, reply_to).await {
            Ok(()) => tracing::debug!(chat_id, "Telegram message sent"),
            Err(err) => tracing::warn!(chat_id, error = %format!("{err:#}"), "Telegram message dropped"),
        }
    }

    async fn send_voice(&self, chat_id: i64, audio: Vec<u8>) {
        let bytes = audio.len();
        match self.post_voice(chat_id, audio).await {
            Ok(()) => tracing::debug!(chat_id, bytes, "Telegram voice message sent"),
            Err(err) => tracing::warn!(chat_id, error = %format!("{err:#}"), "Telegram voice message dropped"),
        }
    }
}

#[async_trait]
impl MediaSource for TelegramClient {
    /// `getFile` resolves the storage path, then the file is fetched from
    /// the file endpoint.
    async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        let get_file = self
            .http
            .post(self.method_url("getFile"))
            .json(&GetFileRequest { file_id })
            .build();

        let parsed: ApiResponse<File> = self
            .execute(get_file, "getFile")
            .await?
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to parse Telegram getFile response")?;

        if !parsed.ok {
            return Err(anyhow!(
                "Telegram getFile error: {}",
                parsed.description.unwrap_or_default()
            ));
        }

        let file_path = parsed
            .result
            .and_then(|f| f.file_path)
            .ok_or_else(|| anyhow!("Telegram getFile returned no file_path"))?;

        let res = self
            .execute(self.http.get(self.file_url(&file_path)).build(), "file download")
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(anyhow!("Telegram file download failed with status {status}"));
        }

        let data = res
            .bytes()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to read Telegram file body")?;

        Ok(data.to_vec())
    }
}
