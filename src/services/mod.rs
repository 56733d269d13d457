// src/services/mod.rs
pub mod analysis;
pub mod error;
pub mod gemini;
pub mod prompts;
pub mod translation;

use anyhow::{Context, Result};
use std::time::Duration;

// Re-export commonly used types
pub use analysis::InjuryAnalysis;
pub use error::ApiError;
pub use gemini::{CompletionService, GeminiClient};
pub use translation::{TranslationClient, TranslationService};

/// HTTP client shared by the remote service clients
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}

/// Base URLs are configured without a trailing slash; paths are appended to them.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
