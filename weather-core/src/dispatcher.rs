//! Routes one inbound message to exactly one response path.

use std::sync::Arc;

use crate::{
    error::{MAX_VOICE_DURATION_SECS, ReplyError},
    format::format_observation,
    model::{FormattedReply, InboundMessage, Payload, Reply, SpeechCredential, VoiceRef},
    provider::WeatherProvider,
    speakable::to_speakable,
    speech::SpeechService,
    telegram::{MediaSource, Responder, types::Update},
};

const HELP_TEXTS: [&str; 2] = [
    "Я расскажу о текущей погоде для населенного пункта.",
    "Я могу ответить на: - Текстовое сообщение с названием населенного пункта. \
     - Голосовое сообщение с названием населенного пункта.",
];

const UNKNOWN_COMMAND: &str = "Неизвестная команда!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Help,
}

const COMMANDS: [(&str, Command); 2] = [("/start", Command::Help), ("/help", Command::Help)];

/// Resolve a command, ignoring a trailing `@botname` mention. The rest of
/// the text must match a known command exactly.
fn parse_command(text: &str) -> Option<Command> {
    let name = text.split_once('@').map_or(text, |(name, _)| name);

    COMMANDS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, command)| *command)
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    weather: Arc<dyn WeatherProvider>,
    speech: Arc<dyn SpeechService>,
    responder: Arc<dyn Responder>,
    media: Arc<dyn MediaSource>,
}

impl Dispatcher {
    pub fn new(
        weather: Arc<dyn WeatherProvider>,
        speech: Arc<dyn SpeechService>,
        responder: Arc<dyn Responder>,
        media: Arc<dyn MediaSource>,
    ) -> Self {
        Self {
            weather,
            speech,
            responder,
            media,
        }
    }

    /// Updates that carry no message (edits, callbacks, ...) get no reply.
    pub async fn handle_update(&self, update: Update, credential: Option<&SpeechCredential>) {
        let Some(message) = update.message else {
            tracing::debug!(update_id = update.update_id, "update without message ignored");
            return;
        };

        self.handle_message(message.into(), credential).await;
    }

    /// Speech is only needed for voice queries; without a credential they
    /// end with a provider error reply.
    pub async fn handle_message(&self, message: InboundMessage, credential: Option<&SpeechCredential>) {
        let InboundMessage {
            chat_id,
            message_id,
            payload,
        } = message;

        let outcome = match payload {
            Payload::Text(text) if text.starts_with('/') => {
                self.handle_command(chat_id, &text).await;
                return;
            }
            Payload::Text(place) => {
                tracing::debug!(chat_id, "text query");
                self.text_query(chat_id, &place).await
            }
            Payload::Voice(voice) => {
                tracing::debug!(chat_id, duration = voice.duration_secs, "voice query");
                self.voice_query(chat_id, &voice, credential).await
            }
            Payload::Location { .. } | Payload::Other => {
                tracing::debug!(chat_id, "unsupported payload");
                Err(ReplyError::UnsupportedPayload)
            }
        };

        match outcome {
            Ok(reply) => self.send(reply).await,
            Err(err) => {
                self.responder
                    .send_text(chat_id, &err.to_string(), Some(message_id))
                    .await
            }
        }
    }

    async fn handle_command(&self, chat_id: i64, text: &str) {
        match parse_command(text) {
            Some(Command::Help) => {
                for help in HELP_TEXTS {
                    self.responder.send_text(chat_id, help, None).await;
                }
            }
            None => {
                tracing::debug!(chat_id, command = text, "unknown command");
                self.responder.send_text(chat_id, UNKNOWN_COMMAND, None).await;
            }
        }
    }

    async fn text_query(&self, chat_id: i64, place: &str) -> Result<Reply, ReplyError> {
        let observation = self.weather.get_weather(place).await.into_result()?;

        Ok(Reply {
            chat_id,
            body: FormattedReply::Text(format_observation(&observation)),
        })
    }

    /// download -> recognize -> look up -> format -> speak -> synthesize.
    async fn voice_query(
        &self,
        chat_id: i64,
        voice: &VoiceRef,
        credential: Option<&SpeechCredential>,
    ) -> Result<Reply, ReplyError> {
        if voice.duration_secs > MAX_VOICE_DURATION_SECS {
            return Err(ReplyError::VoiceTooLong {
                limit_secs: MAX_VOICE_DURATION_SECS,
            });
        }

        let Some(credential) = credential else {
            tracing::warn!("voice query without a speech credential");
            return Err(ReplyError::Provider);
        };

        let audio = self.media.download(&voice.file_id).await.map_err(|err| {
            tracing::warn!(error = %format!("{err:#}"), "voice download failed");
            ReplyError::Provider
        })?;

        let place = self
            .speech
            .speech_to_text(&audio, credential)
            .await
            .map_err(|err| {
                tracing::warn!(error = %format!("{err:#}"), "speech recognition failed");
                ReplyError::Provider
            })?;

        let observation = self.weather.get_weather(place.trim()).await.into_result()?;
        let spoken = to_speakable(&format_observation(&observation));

        let audio = self
            .speech
            .text_to_speech(&spoken, credential)
            .await
            .map_err(|err| {
                tracing::warn!(error = %format!("{err:#}"), "speech synthesis failed");
                ReplyError::Provider
            })?;

        Ok(Reply {
            chat_id,
            body: FormattedReply::Voice(audio),
        })
    }

    async fn send(&self, reply: Reply) {
        match reply.body {
            FormattedReply::Text(text) => self.responder.send_text(reply.chat_id, &text, None).await,
            FormattedReply::Voice(audio) => self.responder.send_voice(reply.chat_id, audio).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::WeatherQueryResult,
        provider::{MOSCOW_BODY, classify},
    };
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Sent {
        Text { chat_id: i64, text: String, reply_to: Option<i64> },
        Voice { chat_id: i64, audio: Vec<u8> },
    }

    #[derive(Debug, Default)]
    struct RecordingResponder {
        sent: Mutex<Vec<Sent>>,
    }

    impl RecordingResponder {
        fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Responder for RecordingResponder {
        async fn send_text(&self, chat_id: i64, text: &str, reply_to: Option<i64>) {
            self.sent.lock().unwrap().push(Sent::Text { chat_id, text: text.to_string(), reply_to });
        }

        async fn send_voice(&self, chat_id: i64, audio: Vec<u8>) {
            self.sent.lock().unwrap().push(Sent::Voice { chat_id, audio });
        }
    }

    /// Answers every lookup with a fixed provider status and body.
    #[derive(Debug)]
    struct ScriptedWeather {
        status: u16,
        body: String,
        places: Mutex<Vec<String>>,
    }

    impl ScriptedWeather {
        fn new(status: u16, body: &str) -> Self {
            Self { status, body: body.to_string(), places: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl WeatherProvider for ScriptedWeather {
        async fn get_weather(&self, place: &str) -> WeatherQueryResult {
            self.places.lock().unwrap().push(place.to_string());
            classify(self.status, place, &self.body)
        }
    }

    #[derive(Debug, Default)]
    struct FakeSpeech {
        transcript: String,
        fail_stt: bool,
        stt_calls: AtomicUsize,
        tts_calls: AtomicUsize,
        spoken: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SpeechService for FakeSpeech {
        async fn speech_to_text(&self, audio: &[u8], _: &SpeechCredential) -> anyhow::Result<String> {
            self.stt_calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(audio, b"OggS-audio");
            if self.fail_stt {
                return Err(anyhow!("stt unavailable"));
            }
            Ok(self.transcript.clone())
        }

        async fn text_to_speech(&self, text: &str, _: &SpeechCredential) -> anyhow::Result<Vec<u8>> {
            self.tts_calls.fetch_add(1, Ordering::SeqCst);
            self.spoken.lock().unwrap().push(text.to_string());
            Ok(b"synthesized".to_vec())
        }
    }

    #[derive(Debug, Default)]
    struct FakeMedia {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MediaSource for FakeMedia {
        async fn download(&self, file_id: &str) -> anyhow::Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(file_id, "voice-file");
            Ok(b"OggS-audio".to_vec())
        }
    }

    struct Harness {
        dispatcher: Dispatcher,
        weather: Arc<ScriptedWeather>,
        speech: Arc<FakeSpeech>,
        responder: Arc<RecordingResponder>,
        media: Arc<FakeMedia>,
    }

    fn harness(weather: ScriptedWeather, speech: FakeSpeech) -> Harness {
        let weather = Arc::new(weather);
        let speech = Arc::new(speech);
        let responder = Arc::new(RecordingResponder::default());
        let media = Arc::new(FakeMedia::default());

        let dispatcher =
            Dispatcher::new(weather.clone(), speech.clone(), responder.clone(), media.clone());

        Harness { dispatcher, weather, speech, responder, media }
    }

    fn moscow() -> ScriptedWeather {
        ScriptedWeather::new(200, MOSCOW_BODY)
    }

    fn credential() -> SpeechCredential {
        SpeechCredential::new("iam-token")
    }

    fn message(payload: Payload) -> InboundMessage {
        InboundMessage { chat_id: 42, message_id: 7, payload }
    }

    fn text(s: &str) -> InboundMessage {
        message(Payload::Text(s.to_string()))
    }

    fn voice(duration_secs: u32) -> InboundMessage {
        message(Payload::Voice(VoiceRef { file_id: "voice-file".into(), duration_secs }))
    }

    fn error_reply(text: &str) -> Sent {
        Sent::Text { chat_id: 42, text: text.to_string(), reply_to: Some(7) }
    }

    #[tokio::test]
    async fn text_query_replies_with_formatted_weather() {
        let h = harness(moscow(), FakeSpeech::default());

        h.dispatcher.handle_message(text("Москва"), Some(&credential())).await;

        let sent = h.responder.sent();
        assert_eq!(sent.len(), 1);
        let Sent::Text { chat_id, text, reply_to } = &sent[0] else {
            panic!("expected text reply, got {sent:?}");
        };
        assert_eq!(*chat_id, 42);
        assert_eq!(*reply_to, None);
        assert!(text.starts_with("Погода в городе Москва:"));
        assert!(text.contains("750 мм.рт.ст"));
        assert!(text.contains("северо-восточный (45°)"));
        assert_eq!(*h.weather.places.lock().unwrap(), vec!["Москва".to_string()]);
    }

    #[tokio::test]
    async fn unknown_place_names_it_back() {
        let h = harness(
            ScriptedWeather::new(404, r#"{"cod":"404","message":"city not found"}"#),
            FakeSpeech::default(),
        );

        h.dispatcher.handle_message(text("Фывапролд"), Some(&credential())).await;

        assert_eq!(h.responder.sent(), vec![error_reply("Я не нашел населенный пункт Фывапролд")]);
    }

    #[tokio::test]
    async fn provider_failure_asks_to_retry_later() {
        let h = harness(ScriptedWeather::new(500, "{}"), FakeSpeech::default());

        h.dispatcher.handle_message(text("Москва"), Some(&credential())).await;

        assert_eq!(
            h.responder.sent(),
            vec![error_reply("Произошла непредвиденная ошибка! Попробуйте позже")]
        );
    }

    #[tokio::test]
    async fn help_sends_both_texts_in_order() {
        for command in ["/help", "/start", "/help@weather_bot"] {
            let h = harness(moscow(), FakeSpeech::default());

            h.dispatcher.handle_message(text(command), Some(&credential())).await;

            let expected: Vec<Sent> = HELP_TEXTS
                .iter()
                .map(|t| Sent::Text { chat_id: 42, text: t.to_string(), reply_to: None })
                .collect();
            assert_eq!(h.responder.sent(), expected, "command {command}");
            assert!(h.weather.places.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn help_with_trailing_words_is_unknown() {
        let h = harness(moscow(), FakeSpeech::default());

        h.dispatcher.handle_message(text("/help me"), Some(&credential())).await;

        assert_eq!(
            h.responder.sent(),
            vec![Sent::Text { chat_id: 42, text: "Неизвестная команда!".into(), reply_to: None }]
        );
    }

    #[tokio::test]
    async fn unknown_command() {
        let h = harness(moscow(), FakeSpeech::default());

        h.dispatcher.handle_message(text("/xyz"), Some(&credential())).await;

        assert_eq!(
            h.responder.sent(),
            vec![Sent::Text { chat_id: 42, text: "Неизвестная команда!".into(), reply_to: None }]
        );
    }

    #[tokio::test]
    async fn long_voice_is_rejected_without_downstream_calls() {
        for duration in [31, 45] {
            let h = harness(moscow(), FakeSpeech::default());

            h.dispatcher.handle_message(voice(duration), Some(&credential())).await;

            assert_eq!(
                h.responder.sent(),
                vec![error_reply("Голосовое сообщение должно быть короче 30 секунд")]
            );
            assert_eq!(h.media.calls.load(Ordering::SeqCst), 0);
            assert_eq!(h.speech.stt_calls.load(Ordering::SeqCst), 0);
            assert_eq!(h.speech.tts_calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn voice_at_limit_round_trips_to_speech() {
        let speech = FakeSpeech { transcript: "Москва ".into(), ..Default::default() };
        let h = harness(moscow(), speech);

        h.dispatcher.handle_message(voice(30), Some(&credential())).await;

        assert_eq!(
            h.responder.sent(),
            vec![Sent::Voice { chat_id: 42, audio: b"synthesized".to_vec() }]
        );
        assert_eq!(h.media.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*h.weather.places.lock().unwrap(), vec!["Москва".to_string()]);

        let spoken = h.speech.spoken.lock().unwrap();
        assert_eq!(spoken.len(), 1);
        assert!(spoken[0].contains("градусов по Цельсию"));
        assert!(spoken[0].contains("миллиметров ртутного столба"));
        assert!(!spoken[0].contains("м/с"));
    }

    #[tokio::test]
    async fn voice_lookup_failure_replies_in_text() {
        let speech = FakeSpeech { transcript: "Фывапролд".into(), ..Default::default() };
        let h = harness(ScriptedWeather::new(404, "{}"), speech);

        h.dispatcher.handle_message(voice(5), Some(&credential())).await;

        assert_eq!(h.responder.sent(), vec![error_reply("Я не нашел населенный пункт Фывапролд")]);
        assert_eq!(h.speech.tts_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn recognition_failure_is_a_provider_error() {
        let speech = FakeSpeech { fail_stt: true, ..Default::default() };
        let h = harness(moscow(), speech);

        h.dispatcher.handle_message(voice(3), Some(&credential())).await;

        assert_eq!(
            h.responder.sent(),
            vec![error_reply("Произошла непредвиденная ошибка! Попробуйте позже")]
        );
        assert!(h.weather.places.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn location_share_is_unsupported() {
        let h = harness(moscow(), FakeSpeech::default());

        h.dispatcher
            .handle_message(
                message(Payload::Location { latitude: 55.7, longitude: 37.6 }),
                Some(&credential()),
            )
            .await;
        h.dispatcher.handle_message(message(Payload::Other), Some(&credential())).await;

        let unsupported = error_reply("Могу ответить только на текстовое или голосовое сообщение");
        assert_eq!(h.responder.sent(), vec![unsupported.clone(), unsupported]);
    }

    #[tokio::test]
    async fn voice_without_credential_never_downloads() {
        let h = harness(moscow(), FakeSpeech::default());

        h.dispatcher.handle_message(voice(10), None).await;

        assert_eq!(
            h.responder.sent(),
            vec![error_reply("Произошла непредвиденная ошибка! Попробуйте позже")]
        );
        assert_eq!(h.media.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn text_query_needs_no_credential() {
        let h = harness(moscow(), FakeSpeech::default());

        h.dispatcher.handle_message(text("Москва"), None).await;

        assert_eq!(h.responder.sent().len(), 1);
    }

    #[tokio::test]
    async fn update_without_message_sends_nothing() {
        let h = harness(moscow(), FakeSpeech::default());
        let update: Update = serde_json::from_str(r#"{"update_id":1}"#).unwrap();

        h.dispatcher.handle_update(update, Some(&credential())).await;

        assert!(h.responder.sent().is_empty());
    }

    #[tokio::test]
    async fn update_with_text_is_dispatched() {
        let h = harness(moscow(), FakeSpeech::default());
        let update: Update = serde_json::from_str(
            r#"{"update_id":1,"message":{"message_id":7,"chat":{"id":42},"text":"/xyz"}}"#,
        )
        .unwrap();

        h.dispatcher.handle_update(update, Some(&credential())).await;

        assert_eq!(h.responder.sent().len(), 1);
    }

    #[test]
    fn command_table_lookup() {
        assert_eq!(parse_command("/start"), Some(Command::Help));
        assert_eq!(parse_command("/help@weather_bot"), Some(Command::Help));
        assert_eq!(parse_command("/help extra words"), None);
        assert_eq!(parse_command("/start now"), None);
        assert_eq!(parse_command("/HELP"), None);
        assert_eq!(parse_command("/"), None);
    }
}
