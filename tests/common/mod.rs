// tests/common/mod.rs
#![allow(dead_code)]

use aidly_lib::api::{AppState, create_api_routes};
use aidly_lib::assistant::Assistant;
use aidly_lib::config::AppConfig;
use aidly_lib::location::{FacilityTable, Geocoder, HospitalDetails, PlaceDetailsService};
use aidly_lib::models::Coordinate;
use aidly_lib::services::gemini::{GenerateContentRequest, Part};
use aidly_lib::services::{ApiError, CompletionService, TranslationService};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::ServiceExt;

pub const ANALYSIS_REPLY: &str = r#"Assessment follows.
{"condition": "Minor burn", "severity_score": 3, "visible_symptoms": ["Redness"], "immediate_actions": ["Cool under running water"], "additional_notes": "Keep it clean"}"#;
pub const FIRST_AID_REPLY: &str = "## First Aid\n- Cool the burn for 20 minutes";
pub const CHAT_REPLY: &str = "- Keep the person still\n- Call 112";

/// Answers image requests with an analysis and text requests with canned markdown
pub struct StubCompletion;

#[async_trait]
impl CompletionService for StubCompletion {
    async fn complete(&self, request: &GenerateContentRequest) -> Result<String, ApiError> {
        let parts = &request.contents[0].parts;
        if parts
            .iter()
            .any(|part| matches!(part, Part::InlineData { .. }))
        {
            return Ok(ANALYSIS_REPLY.to_string());
        }
        let is_first_aid = parts.iter().any(|part| match part {
            Part::Text { text } => text.contains("Injury assessment"),
            _ => false,
        });
        Ok(if is_first_aid { FIRST_AID_REPLY } else { CHAT_REPLY }.to_string())
    }
}

/// Every call fails the way an exhausted quota does
pub struct UnavailableCompletion;

#[async_trait]
impl CompletionService for UnavailableCompletion {
    async fn complete(&self, _: &GenerateContentRequest) -> Result<String, ApiError> {
        Err(ApiError::Status {
            status: 429,
            body: "quota exceeded".to_string(),
        })
    }
}

/// Prefixes text with the target language
pub struct StubTranslation;

#[async_trait]
impl TranslationService for StubTranslation {
    async fn translate_text(&self, text: &str, target: &str) -> Result<String, ApiError> {
        if target == "en" {
            return Ok(text.to_string());
        }
        Ok(format!("[{}] {}", target, text))
    }

    async fn detect_language(&self, _: &str) -> Result<String, ApiError> {
        Ok("hi".to_string())
    }

    async fn supported_languages(&self) -> Result<BTreeMap<String, String>, ApiError> {
        Err(ApiError::parse("languages unavailable"))
    }
}

pub struct StubGeocoder;

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, ApiError> {
        match address {
            "" | "Atlantis" => Ok(None),
            "broken" => Err(ApiError::parse("latitude 'x'")),
            _ => Ok(Some(Coordinate::new(28.6219, 77.0878))),
        }
    }
}

pub struct StubPlaces;

#[async_trait]
impl PlaceDetailsService for StubPlaces {
    async fn hospital_details(&self, eloc: &str) -> Result<Option<HospitalDetails>, ApiError> {
        if eloc != "MMI000" {
            return Ok(None);
        }
        Ok(Some(HospitalDetails {
            name: "Mata Chanan Devi Hospital".to_string(),
            address: "C-1, Janakpuri, New Delhi, Delhi 110058".to_string(),
            phone: "011-2550 6242".to_string(),
            website: None,
            rating: Some(4.1),
            opening_hours: vec!["Monday: Open 24 hours".to_string()],
        }))
    }
}

pub fn state_with(
    facilities: FacilityTable,
    completion: Arc<dyn CompletionService>,
) -> Arc<AppState> {
    Arc::new(AppState::new(
        AppConfig::default(),
        facilities,
        Assistant::new(completion, Arc::new(StubTranslation)),
        Arc::new(StubGeocoder),
        Arc::new(StubPlaces),
    ))
}

/// Router over the embedded facility table and the stub services
pub fn test_app() -> Router {
    create_api_routes(state_with(
        FacilityTable::embedded().unwrap(),
        Arc::new(StubCompletion),
    ))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Send one request and decode the JSON envelope
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

/// Serve `app` on an ephemeral local port and return its base URL
pub async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
