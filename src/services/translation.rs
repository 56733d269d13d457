// src/services/translation.rs

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

use super::error::{ApiError, read_json};
use super::{endpoint, http_client};

pub const DEFAULT_LANGUAGE: &str = "en";

/// Language map used when the languages endpoint is unavailable
pub fn fallback_languages() -> BTreeMap<String, String> {
    BTreeMap::from([(DEFAULT_LANGUAGE.to_string(), "English".to_string())])
}

#[async_trait]
pub trait TranslationService: Send + Sync {
    async fn translate_text(&self, text: &str, target_language: &str) -> Result<String, ApiError>;
    async fn detect_language(&self, text: &str) -> Result<String, ApiError>;
    /// Language code to display name
    async fn supported_languages(&self) -> Result<BTreeMap<String, String>, ApiError>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct TranslationsData {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

#[derive(Debug, Deserialize)]
struct DetectionsData {
    #[serde(default)]
    detections: Vec<Vec<Detection>>,
}

#[derive(Debug, Deserialize)]
struct Detection {
    language: String,
}

#[derive(Debug, Deserialize)]
struct LanguagesData {
    #[serde(default)]
    languages: Vec<Language>,
}

#[derive(Debug, Deserialize)]
struct Language {
    language: String,
    name: Option<String>,
}

/// Client for the Cloud Translation v2 REST API
#[derive(Clone)]
pub struct TranslationClient {
    http_client: reqwest::Client,
    base_endpoint: String,
    api_key: String,
}

impl TranslationClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http_client: http_client(timeout)?,
            base_endpoint: endpoint(base_url, "language/translate/v2"),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, path: &str, extra: &[(&str, &str)]) -> Result<Url, ApiError> {
        let base = if path.is_empty() {
            self.base_endpoint.clone()
        } else {
            endpoint(&self.base_endpoint, path)
        };
        let mut params = vec![("key", self.api_key.as_str())];
        params.extend_from_slice(extra);
        Ok(Url::parse_with_params(&base, &params)?)
    }
}

#[async_trait]
impl TranslationService for TranslationClient {
    async fn translate_text(&self, text: &str, target_language: &str) -> Result<String, ApiError> {
        if text.is_empty() || target_language == DEFAULT_LANGUAGE {
            return Ok(text.to_string());
        }

        debug!(
            "Translating {} characters to '{}'",
            text.chars().count(),
            target_language
        );

        let form = [("q", text), ("target", target_language), ("format", "text")];
        let response = self
            .http_client
            .post(self.url("", &[])?)
            .form(&form)
            .send()
            .await?;
        let body: Envelope<TranslationsData> = read_json(response).await?;

        body.data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| ApiError::parse("response has no translations"))
    }

    async fn detect_language(&self, text: &str) -> Result<String, ApiError> {
        if text.is_empty() {
            return Ok(DEFAULT_LANGUAGE.to_string());
        }

        let response = self
            .http_client
            .post(self.url("detect", &[])?)
            .form(&[("q", text)])
            .send()
            .await?;
        let body: Envelope<DetectionsData> = read_json(response).await?;

        body.data
            .detections
            .into_iter()
            .next()
            .and_then(|candidates| candidates.into_iter().next())
            .map(|d| d.language)
            .ok_or_else(|| ApiError::parse("response has no detections"))
    }

    async fn supported_languages(&self) -> Result<BTreeMap<String, String>, ApiError> {
        let response = self
            .http_client
            .get(self.url("languages", &[("target", DEFAULT_LANGUAGE)])?)
            .send()
            .await?;
        let body: Envelope<LanguagesData> = read_json(response).await?;

        Ok(body
            .data
            .languages
            .into_iter()
            .map(|l| {
                let name = l.name.unwrap_or_else(|| l.language.clone());
                (l.language, name)
            })
            .collect())
    }
}
