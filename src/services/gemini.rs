// src/services/gemini.rs

use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use url::Url;

use super::error::{ApiError, read_json};
use super::{endpoint, http_client};

/// Sampling settings sent with every completion request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl GenerationConfig {
    const fn with_temperature(temperature: f64) -> Self {
        Self {
            temperature,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 1024,
        }
    }

    pub const fn injury_analysis() -> Self {
        Self::with_temperature(0.4)
    }

    pub const fn first_aid() -> Self {
        Self::with_temperature(0.3)
    }

    pub const fn chat() -> Self {
        Self::with_temperature(0.2)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

/// Body of a `generateContent` call
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    pub fn text(prompt: impl Into<String>, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part::Text {
                    text: prompt.into(),
                }],
            }],
            generation_config,
        }
    }

    /// Prompt followed by one base64 image
    pub fn text_with_image(
        prompt: impl Into<String>,
        mime_type: impl Into<String>,
        base64_data: impl Into<String>,
        generation_config: GenerationConfig,
    ) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: prompt.into(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: mime_type.into(),
                            data: base64_data.into(),
                        },
                    },
                ],
            }],
            generation_config,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// `candidates[0].content.parts[0].text`
    fn into_first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

/// A text (and optionally image) completion backend
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Returns the text of the first candidate
    async fn complete(&self, request: &GenerateContentRequest) -> Result<String, ApiError>;
}

/// Client for the Gemini `generateContent` endpoint
#[derive(Clone)]
pub struct GeminiClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        if api_key.is_empty() {
            warn!("GEMINI_API_KEY is empty; completion requests will be rejected upstream");
        }

        Ok(Self {
            http_client: http_client(timeout)?,
            endpoint: endpoint(base_url, &format!("v1beta/models/{}:generateContent", model)),
            api_key: api_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionService for GeminiClient {
    async fn complete(&self, request: &GenerateContentRequest) -> Result<String, ApiError> {
        let url = Url::parse_with_params(&self.endpoint, &[("key", self.api_key.as_str())])?;

        debug!(
            "Sending completion request to {} ({} parts)",
            self.endpoint,
            request.contents.iter().map(|c| c.parts.len()).sum::<usize>()
        );
        let start = Instant::now();

        let response = self.http_client.post(url).json(request).send().await?;
        let body: GenerateContentResponse = read_json(response).await?;

        debug!("Completion finished in {:.2?}", start.elapsed());

        body.into_first_text()
            .ok_or_else(|| ApiError::parse("response has no candidate text"))
    }
}
