// src/assistant.rs
//
// The user-facing operations. Every remote failure is logged and replaced
// with the fixed fallback value the user sees.

use log::{debug, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::image_processing::EncodedImage;
use crate::services::analysis::{InjuryAnalysis, parse_analysis};
use crate::services::gemini::{GenerateContentRequest, GenerationConfig};
use crate::services::prompts::{chat_prompt, first_aid_prompt, injury_analysis_prompt};
use crate::services::translation::{DEFAULT_LANGUAGE, fallback_languages};
use crate::services::{ApiError, CompletionService, TranslationService};

pub const FIRST_AID_STATUS_FALLBACK: &str =
    "Unable to generate first aid instructions. Please seek professional medical advice.";
pub const FIRST_AID_ERROR_FALLBACK: &str =
    "Error generating first aid instructions. Please seek professional medical advice.";
pub const CHAT_STATUS_FALLBACK: &str = "I'm sorry, I'm having trouble processing your request right now. For medical emergencies, please call emergency services immediately.";
pub const CHAT_ERROR_FALLBACK: &str = "I'm sorry, I encountered an error. For medical emergencies, please call emergency services immediately.";

/// A status failure gets the first text, anything else the second
fn fallback_text(err: &ApiError, on_status: &str, on_error: &str) -> String {
    match err {
        ApiError::Status { .. } => on_status.to_string(),
        _ => on_error.to_string(),
    }
}

#[derive(Clone)]
pub struct Assistant {
    completion: Arc<dyn CompletionService>,
    translation: Arc<dyn TranslationService>,
}

impl Assistant {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        translation: Arc<dyn TranslationService>,
    ) -> Self {
        Self {
            completion,
            translation,
        }
    }

    pub async fn analyze_injury(&self, image: &EncodedImage) -> InjuryAnalysis {
        let request = GenerateContentRequest::text_with_image(
            injury_analysis_prompt(),
            image.mime_type.as_str(),
            image.data.as_str(),
            GenerationConfig::injury_analysis(),
        );

        match self.completion.complete(&request).await {
            Ok(text) => {
                let analysis = parse_analysis(&text);
                debug!(
                    "Injury analysis: {} (severity {})",
                    analysis.condition, analysis.severity_score
                );
                analysis
            }
            Err(e) => {
                warn!("Injury analysis failed: {}", e);
                InjuryAnalysis::from_api_error(&e)
            }
        }
    }

    /// Markdown first aid steps for an assessed injury
    pub async fn generate_first_aid(&self, analysis: &InjuryAnalysis) -> String {
        let request =
            GenerateContentRequest::text(first_aid_prompt(analysis), GenerationConfig::first_aid());

        self.completion.complete(&request).await.unwrap_or_else(|e| {
            warn!("First aid generation failed: {}", e);
            fallback_text(&e, FIRST_AID_STATUS_FALLBACK, FIRST_AID_ERROR_FALLBACK)
        })
    }

    pub async fn chatbot_response(&self, user_query: &str, language: &str) -> String {
        let request = GenerateContentRequest::text(
            chat_prompt(user_query, language),
            GenerationConfig::chat(),
        );

        self.completion.complete(&request).await.unwrap_or_else(|e| {
            warn!("Chatbot response failed: {}", e);
            fallback_text(&e, CHAT_STATUS_FALLBACK, CHAT_ERROR_FALLBACK)
        })
    }

    /// The input text comes back unchanged when translation fails.
    pub async fn translate_text(&self, text: &str, target_language: &str) -> String {
        self.translation
            .translate_text(text, target_language)
            .await
            .unwrap_or_else(|e| {
                warn!("Translation to '{}' failed: {}", target_language, e);
                text.to_string()
            })
    }

    pub async fn detect_language(&self, text: &str) -> String {
        self.translation.detect_language(text).await.unwrap_or_else(|e| {
            warn!("Language detection failed: {}", e);
            DEFAULT_LANGUAGE.to_string()
        })
    }

    pub async fn supported_languages(&self) -> BTreeMap<String, String> {
        self.translation
            .supported_languages()
            .await
            .unwrap_or_else(|e| {
                warn!("Listing supported languages failed: {}", e);
                fallback_languages()
            })
    }
}
