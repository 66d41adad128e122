use std::path::Path;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::IngestError;

use super::{file_name, has_extension, DocumentExtractor};

/// Voice notes exported from phones: WAV, MP3, and the `.dat` containers
/// WhatsApp uses (its exports also carry "whatsapp audio" in the name).
pub fn is_audio_file(path: &Path) -> bool {
    if has_extension(path, &["wav", "mp3", "dat"]) {
        return true;
    }
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_ascii_lowercase().contains("whatsapp audio"))
        .unwrap_or(false)
}

#[derive(Debug, Clone)]
pub struct TranscriberConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl TranscriberConfig {
    /// Reads `DOC_CHAT_TRANSCRIBE_ENDPOINT`, `DOC_CHAT_TRANSCRIBE_API_KEY`
    /// and `DOC_CHAT_TRANSCRIBE_MODEL`. No endpoint means no transcription.
    pub fn from_env() -> Option<Self> {
        let endpoint = std::env::var("DOC_CHAT_TRANSCRIBE_ENDPOINT").ok()?;
        let endpoint = endpoint.trim().to_string();
        if endpoint.is_empty() {
            return None;
        }

        let api_key = std::env::var("DOC_CHAT_TRANSCRIBE_API_KEY")
            .ok()
            .and_then(|value| {
                let key = value.trim().to_string();
                if key.is_empty() {
                    None
                } else {
                    Some(key)
                }
            });

        let model = std::env::var("DOC_CHAT_TRANSCRIBE_MODEL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "whisper-1".to_string());

        Some(Self {
            endpoint,
            api_key,
            model,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct TranscriptionRequest {
    audio_base64: String,
    filename: String,
    model: String,
}

#[derive(Debug, Clone, Deserialize)]
struct TranscriptionResponse {
    text: Option<String>,
    #[serde(default)]
    segments: Vec<TranscriptionSegment>,
}

#[derive(Debug, Clone, Deserialize)]
struct TranscriptionSegment {
    #[serde(default)]
    text: Option<String>,
}

/// Client for a remote speech-to-text endpoint that accepts base64 audio and
/// answers with a transcript.
pub struct AudioTranscriber {
    client: Client,
    endpoint: Url,
    config: TranscriberConfig,
}

impl AudioTranscriber {
    pub fn new(config: TranscriberConfig) -> Result<Self, IngestError> {
        let endpoint = Url::parse(&config.endpoint)?;
        Ok(Self {
            client: Client::new(),
            endpoint,
            config,
        })
    }

    pub async fn transcribe(&self, path: &Path) -> Result<String, IngestError> {
        let filename = file_name(path)?;
        let bytes = tokio::fs::read(path).await?;
        let payload = TranscriptionRequest {
            audio_base64: STANDARD.encode(bytes),
            filename: filename.clone(),
            model: self.config.model.clone(),
        };

        let mut request = self.client.post(self.endpoint.clone()).json(&payload);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(IngestError::Transcription(format!(
                "transcription request to {} returned {}",
                self.endpoint,
                response.status()
            )));
        }

        let payload: TranscriptionResponse = response.json().await?;
        transcript_from_payload(&payload, &filename)
    }
}

pub struct AudioExtractor {
    transcriber: AudioTranscriber,
}

impl AudioExtractor {
    pub fn new(transcriber: AudioTranscriber) -> Self {
        Self { transcriber }
    }
}

#[async_trait]
impl DocumentExtractor for AudioExtractor {
    fn handles(&self, path: &Path) -> bool {
        is_audio_file(path)
    }

    async fn extract(&self, path: &Path) -> Result<String, IngestError> {
        self.transcriber.transcribe(path).await
    }
}

fn transcript_from_payload(
    payload: &TranscriptionResponse,
    filename: &str,
) -> Result<String, IngestError> {
    if let Some(text) = &payload.text {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }

    let joined = payload
        .segments
        .iter()
        .filter_map(|segment| segment.text.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if joined.is_empty() {
        return Err(IngestError::Transcription(format!(
            "transcription response has no readable text: {filename}"
        )));
    }

    Ok(joined)
}
