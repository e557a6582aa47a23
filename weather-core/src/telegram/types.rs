//! Telegram Bot API payloads (only the fields the bot reads or writes)

use serde::{Deserialize, Serialize};

use crate::model::{InboundMessage, Payload, VoiceRef};

/// Webhook update
#[derive(Debug, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
    pub voice: Option<Voice>,
    pub location: Option<Location>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Voice {
    pub file_id: String,
    /// Recorded length in seconds
    pub duration: u32,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Message> for InboundMessage {
    fn from(message: Message) -> Self {
        let payload = if let Some(text) = message.text {
            Payload::Text(text)
        } else if let Some(voice) = message.voice {
            Payload::Voice(VoiceRef {
                file_id: voice.file_id,
                duration_secs: voice.duration,
            })
        } else if let Some(location) = message.location {
            Payload::Location {
                latitude: location.latitude,
                longitude: location.longitude,
            }
        } else {
            Payload::Other
        };

        InboundMessage {
            chat_id: message.chat.id,
            message_id: message.message_id,
            payload,
        }
    }
}

/// sendMessage request
#[derive(Debug, Serialize)]
pub(crate) struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_parameters: Option<ReplyParameters>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReplyParameters {
    pub message_id: i64,
}

/// getFile request
#[derive(Debug, Serialize)]
pub(crate) struct GetFileRequest<'a> {
    pub file_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct File {
    pub file_path: Option<String>,
}

/// Bot API response envelope
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}
