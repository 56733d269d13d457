// src/api/handlers.rs

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    routing::{get, post},
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{ApiResult, api_success, bad_request, not_found};
use crate::assistant::Assistant;
use crate::config::AppConfig;
use crate::image_processing::{MAX_UPLOAD_BODY_BYTES, decode_upload};
use crate::location::{
    FacilityTable, Geocoder, GeocodingClient, HospitalDetails, PlaceDetailsClient,
    PlaceDetailsService, ReferenceSource, find_nearby, resolve_reference,
};
use crate::models::{Coordinate, RankedResult};
use crate::services::translation::DEFAULT_LANGUAGE;
use crate::services::{GeminiClient, InjuryAnalysis, TranslationClient};
use crate::session::{ChatMessage, ChatSession, SessionStore};

// Application state
pub struct AppState {
    pub config: AppConfig,
    pub facilities: FacilityTable,
    pub assistant: Assistant,
    pub geocoder: Arc<dyn Geocoder>,
    pub places: Arc<dyn PlaceDetailsService>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        facilities: FacilityTable,
        assistant: Assistant,
        geocoder: Arc<dyn Geocoder>,
        places: Arc<dyn PlaceDetailsService>,
    ) -> Self {
        Self {
            config,
            facilities,
            assistant,
            geocoder,
            places,
            sessions: SessionStore::new(),
        }
    }

    /// Wire up the real remote clients from configuration
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let timeout = config.request_timeout();

        let facilities = FacilityTable::load(config.facilities_path.as_deref())?;
        let completion = GeminiClient::new(
            &config.gemini_api_url,
            &config.gemini_model,
            &config.gemini_api_key,
            timeout,
        )
        .context("Failed to create completion client")?;
        let translation = TranslationClient::new(
            &config.translation_api_url,
            &config.translation_api_key,
            timeout,
        )
        .context("Failed to create translation client")?;
        let geocoder =
            GeocodingClient::new(&config.geocoder_url, &config.geocoder_user_agent, timeout)
                .context("Failed to create geocoding client")?;
        let places = PlaceDetailsClient::new(&config.mappls_api_url, &config.mappls_api_key, timeout)
            .context("Failed to create place details client")?;

        let assistant = Assistant::new(Arc::new(completion), Arc::new(translation));
        Ok(Self::new(
            config,
            facilities,
            assistant,
            Arc::new(geocoder),
            Arc::new(places),
        ))
    }
}

// Query parameters
#[derive(Debug, Deserialize)]
pub struct HospitalParams {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct HospitalsResponse {
    pub reference: Coordinate,
    pub reference_source: ReferenceSource,
    pub radius_km: f64,
    pub count: usize,
    pub hospitals: Vec<RankedResult>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeRequest {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub image_base64: String,
    /// First aid text is translated to this language when it is not English
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub analysis: InjuryAnalysis,
    pub first_aid: String,
}

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub target: String,
}

#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    pub text: String,
}

// Create API routes
pub fn create_api_routes(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/hospitals", get(nearby_hospitals))
        .route("/api/geocode", post(geocode_address))
        .route("/api/places/:eloc", get(hospital_details))
        .route(
            "/api/analysis",
            post(analyze_injury).layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES)),
        )
        .route("/api/chat/sessions", post(create_session))
        .route(
            "/api/chat/sessions/:id",
            get(get_session).delete(end_session),
        )
        .route(
            "/api/chat/sessions/:id/messages",
            post(send_message).delete(clear_chat),
        )
        .route("/api/translate", post(translate))
        .route("/api/detect-language", post(detect_language))
        .route("/api/languages", get(supported_languages))
        .with_state(app_state)
}

async fn health_check() -> &'static str {
    "OK"
}

/// Hospitals around the caller's location (or the default reference point)
async fn nearby_hospitals(
    State(state): State<Arc<AppState>>,
    params: Result<Query<HospitalParams>, QueryRejection>,
) -> ApiResult<HospitalsResponse> {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return rejection.into(),
    };
    let user_location = match (params.lat, params.lng) {
        (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
        (None, None) => None,
        _ => return bad_request("lat and lng must be given together"),
    };
    if let Some(location) = user_location {
        if !location.is_valid() {
            return bad_request(format!(
                "Invalid coordinate ({}, {})",
                location.lat, location.lng
            ));
        }
    }

    let radius_km = params.radius_km.unwrap_or(state.config.default_radius_km);
    if !(radius_km.is_finite() && radius_km > 0.0) {
        return bad_request(format!("radius_km must be positive, got {}", radius_km));
    }

    let (reference, reference_source) =
        resolve_reference(user_location, state.config.default_reference);
    match reference_source {
        ReferenceSource::UserLocation => info!(
            "Using user location: {:.4}, {:.4}",
            reference.lat, reference.lng
        ),
        ReferenceSource::Default => info!("Using default reference point"),
    }

    let hospitals = find_nearby(reference, radius_km, state.facilities.facilities());

    if state.facilities.is_empty() {
        warn!("No facilities configured; nothing to search");
    } else if hospitals.is_empty() {
        warn!("No hospitals found within {} km", radius_km);
    } else {
        info!("Found {} hospitals within {} km", hospitals.len(), radius_km);
    }

    api_success(HospitalsResponse {
        reference,
        reference_source,
        radius_km,
        count: hospitals.len(),
        hospitals,
    })
}

async fn geocode_address(
    State(state): State<Arc<AppState>>,
    request: Result<Json<GeocodeRequest>, JsonRejection>,
) -> ApiResult<Option<Coordinate>> {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return rejection.into(),
    };
    let coordinate = state
        .geocoder
        .geocode(&request.address)
        .await
        .unwrap_or_else(|e| {
            warn!("Error geocoding address '{}': {}", request.address, e);
            None
        });
    api_success(coordinate)
}

async fn hospital_details(
    State(state): State<Arc<AppState>>,
    eloc: Result<Path<String>, PathRejection>,
) -> ApiResult<Option<HospitalDetails>> {
    let Path(eloc) = match eloc {
        Ok(eloc) => eloc,
        Err(rejection) => return rejection.into(),
    };
    let details = state
        .places
        .hospital_details(&eloc)
        .await
        .unwrap_or_else(|e| {
            warn!("Place detail lookup for {} failed: {}", eloc, e);
            None
        });
    api_success(details)
}

/// Assess an injury photo and generate first aid steps for it
async fn analyze_injury(
    State(state): State<Arc<AppState>>,
    request: Result<Json<AnalysisRequest>, JsonRejection>,
) -> ApiResult<AnalysisResponse> {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return rejection.into(),
    };
    let image = match decode_upload(&request.image_base64) {
        Ok(image) => image,
        Err(e) => return e.into(),
    };

    let analysis = state.assistant.analyze_injury(&image).await;
    let mut first_aid = state.assistant.generate_first_aid(&analysis).await;

    if let Some(language) = request.language.as_deref() {
        if language != DEFAULT_LANGUAGE {
            first_aid = state.assistant.translate_text(&first_aid, language).await;
        }
    }

    api_success(AnalysisResponse {
        analysis,
        first_aid,
    })
}

async fn create_session(State(state): State<Arc<AppState>>) -> ApiResult<SessionCreated> {
    let session = state.sessions.create().await;
    api_success(SessionCreated { id: session.id })
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<ChatSession> {
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return rejection.into(),
    };
    match state.sessions.get(&id).await {
        Some(session) => api_success(session),
        None => not_found(format!("Unknown chat session {}", id)),
    }
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
    request: Result<Json<MessageRequest>, JsonRejection>,
) -> ApiResult<Vec<ChatMessage>> {
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return rejection.into(),
    };
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return rejection.into(),
    };
    match state
        .sessions
        .send_message(&id, &request.content, &state.assistant)
        .await
    {
        Some(session) => api_success(session.history),
        None => not_found(format!("Unknown chat session {}", id)),
    }
}

async fn clear_chat(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<String> {
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return rejection.into(),
    };
    if state.sessions.clear(&id).await {
        api_success("Chat cleared".to_string())
    } else {
        not_found(format!("Unknown chat session {}", id))
    }
}

async fn end_session(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<String> {
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return rejection.into(),
    };
    if state.sessions.remove(&id).await {
        api_success("Session ended".to_string())
    } else {
        not_found(format!("Unknown chat session {}", id))
    }
}

async fn translate(
    State(state): State<Arc<AppState>>,
    request: Result<Json<TranslateRequest>, JsonRejection>,
) -> ApiResult<String> {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return rejection.into(),
    };
    api_success(
        state
            .assistant
            .translate_text(&request.text, &request.target)
            .await,
    )
}

async fn detect_language(
    State(state): State<Arc<AppState>>,
    request: Result<Json<DetectRequest>, JsonRejection>,
) -> ApiResult<String> {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return rejection.into(),
    };
    api_success(state.assistant.detect_language(&request.text).await)
}

async fn supported_languages(
    State(state): State<Arc<AppState>>,
) -> ApiResult<BTreeMap<String, String>> {
    api_success(state.assistant.supported_languages().await)
}
