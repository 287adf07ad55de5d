//! GeminiClient - direct REST implementation of [`ApiClient`] for Gemini.
//!
//! Credentials and model name are read from the [`SettingsService`] on every
//! call, so edits in settings apply to the next prompt without a restart.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use image::codecs::jpeg::JpegEncoder;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use surfacing_core::{ApiClient, CapturedImage, RequestError, SettingsService};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const JPEG_QUALITY: u8 = 50;
const IMAGE_MIME_TYPE: &str = "image/jpeg";
const MAX_ERROR_BODY_CHARS: usize = 200;

/// [`ApiClient`] that talks to the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    settings: Arc<dyn SettingsService>,
    base_url: String,
}

impl GeminiClient {
    pub fn new(settings: Arc<dyn SettingsService>) -> Self {
        Self::with_timeout(settings, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(settings: Arc<dyn SettingsService>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Falling back to default HTTP client");
                Client::new()
            });
        Self {
            client,
            settings,
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Overrides the endpoint base, e.g. for a proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn send_request(
        &self,
        api_key: &str,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<String, RequestError> {
        let url = format!("{}/{model}:generateContent", self.base_url);

        let response = self
            .client
            .post(url)
            .query(&[("key", api_key)])
            .json(body)
            .send()
            .await
            .map_err(|err| RequestError::Network(describe_transport_error(err)))?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|err| RequestError::Network(describe_transport_error(err)))?;

        if !status.is_success() {
            tracing::warn!(%status, model, "Gemini API returned an error status");
            return Err(map_http_error(status, &body_text));
        }

        parse_generate_response(&body_text)
    }
}

#[async_trait]
impl ApiClient for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        image: Option<CapturedImage>,
    ) -> Result<String, RequestError> {
        let settings = self.settings.load().await.map_err(|err| {
            tracing::warn!(error = %err, "Failed to load settings for request");
            RequestError::SettingsUnavailable(err.to_string())
        })?;
        let api_key = settings.api_key().ok_or(RequestError::MissingCredential)?;
        let model = settings.model_name();

        let inline_image = image.and_then(|image| match encode_jpeg_base64(&image) {
            Ok(data) => Some(data),
            Err(err) => {
                tracing::warn!(error = %err, "Dropping image that could not be encoded");
                None
            }
        });

        let body = build_request(prompt, inline_image);
        tracing::debug!(model, parts = body.contents[0].parts.len(), "Sending Gemini request");
        self.send_request(api_key, model, &body).await
    }
}

/// JPEG-encodes the capture at a reduced quality to keep requests small.
fn encode_jpeg_base64(image: &CapturedImage) -> Result<String, image::ImageError> {
    let rgb = image.as_image().to_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY).encode_image(&rgb)?;
    Ok(BASE64_STANDARD.encode(jpeg))
}

/// Builds the request body. The image part, when present, precedes the text.
fn build_request(prompt: &str, inline_image: Option<String>) -> GenerateContentRequest {
    let mut parts = Vec::with_capacity(2);
    if let Some(data) = inline_image {
        parts.push(Part::InlineData {
            inline_data: InlineDataPayload {
                mime_type: IMAGE_MIME_TYPE.to_string(),
                data,
            },
        });
    }
    parts.push(Part::Text {
        text: prompt.to_string(),
    });

    GenerateContentRequest {
        contents: vec![Content { parts }],
    }
}

fn describe_transport_error(err: reqwest::Error) -> String {
    if err.is_timeout() {
        "The request timed out.".to_string()
    } else if err.is_connect() {
        "Could not connect to the Gemini API.".to_string()
    } else {
        // reqwest errors carry the URL, which carries the key.
        err.without_url().to_string()
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    InlineData { inline_data: InlineDataPayload },
    Text { text: String },
}

#[derive(Serialize)]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ContentResponse,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: String,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Extracts `candidates[0].content.parts[0].text`; anything else is malformed.
fn parse_generate_response(body: &str) -> Result<String, RequestError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|_| RequestError::MalformedResponse)?;

    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content.parts.into_iter().next())
        .map(|part| part.text)
        .ok_or(RequestError::MalformedResponse)
}

fn map_http_error(status: StatusCode, body: &str) -> RequestError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_default();
            match (status_text.is_empty(), msg.is_empty()) {
                (true, _) => msg,
                (false, true) => status_text,
                (false, false) => format!("{status_text}: {msg}"),
            }
        })
        .unwrap_or_else(|_| summarize_error_body(body));

    RequestError::server(status.as_u16(), message)
}

/// Short plain-text excerpt of a non-JSON error body. Markup (proxy or gateway
/// pages) is dropped so the status code alone is shown.
fn summarize_error_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.starts_with('<') {
        return String::new();
    }

    let first_line = trimmed.lines().next().unwrap_or_default();
    let mut summary: String = first_line.chars().take(MAX_ERROR_BODY_CHARS).collect();
    if summary.len() < trimmed.len() {
        summary.push_str("...");
    }
    summary
}
