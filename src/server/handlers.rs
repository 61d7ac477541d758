use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{sse::Event as SseEvent, Html, Json, Response, Sse},
};
use rust_embed::RustEmbed;
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::{debug, info, warn};

use crate::constants::HEARTBEAT_SECS;
use crate::error::LegendMapError;
use crate::form::{Field, LegendDraft, LegendSubmissionForm};
use crate::geo::Coordinate;
use crate::legend::Legend;
use crate::markers::{Marker, MarkerId};
use crate::overlay::BoundaryOverlay;
use crate::session::SessionSnapshot;

use super::events::MapEvent;
use super::state::AppState;

#[derive(RustEmbed)]
#[folder = "frontend/"]
struct Asset;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct ViewportUpdate {
    pub lat: f64,
    pub lng: f64,
    pub zoom: f64,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(rename = "userId", default)]
    pub user_id: Option<i64>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(flatten)]
    pub draft: LegendDraft,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    #[serde(flatten)]
    pub draft: LegendDraft,
    #[serde(default)]
    pub touched: Vec<Field>,
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

// HTTP API Handlers
pub async fn get_state(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.lock().unwrap().snapshot())
}

pub async fn get_markers(State(state): State<AppState>) -> Json<Vec<Marker>> {
    Json(state.session.lock().unwrap().markers())
}

pub async fn get_overlay(State(state): State<AppState>) -> Json<Option<BoundaryOverlay>> {
    Json(BoundaryOverlay::from_settings(&state.settings.lock().unwrap()))
}

pub async fn get_legends(State(state): State<AppState>) -> Json<Vec<Legend>> {
    Json(state.session.lock().unwrap().legends().to_vec())
}

pub async fn search_legends(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<Legend>> {
    Json(state.session.lock().unwrap().search(&query.q))
}

pub async fn click_marker(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<MarkerId>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let events = state
        .session
        .lock()
        .unwrap()
        .click_marker(id)
        .ok_or(StatusCode::NOT_FOUND)?;

    let count = events.len();
    state.publish(events);
    Ok(Json(serde_json::json!({ "status": "ok", "events": count })))
}

pub async fn fly_to_legend(
    State(state): State<AppState>,
    AxumPath(legend_id): AxumPath<i64>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let event = state
        .session
        .lock()
        .unwrap()
        .fly_to_legend(legend_id)
        .ok_or(StatusCode::NOT_FOUND)?;

    state.publish([event]);
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

pub async fn update_viewport(
    State(state): State<AppState>,
    Json(update): Json<ViewportUpdate>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let center = Coordinate::new(update.lat, update.lng).map_err(|e| {
        debug!("Rejected viewport update: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    let mut session = state.session.lock().unwrap();
    let zoom_out_visible = session.on_viewport_changed(center, update.zoom);

    Ok(Json(serde_json::json!({
        "viewport": session.viewport().state(),
        "zoom_out_visible": zoom_out_visible,
        "footer": session.viewport().display(),
        "center_marker": session.registry().center(),
    })))
}

pub async fn move_end(State(state): State<AppState>) -> Json<serde_json::Value> {
    let events = state.session.lock().unwrap().on_move_end();
    let count = events.len();
    state.publish(events);
    Json(serde_json::json!({ "status": "ok", "events": count }))
}

pub async fn zoom_out(State(state): State<AppState>) -> Json<serde_json::Value> {
    let events = state.session.lock().unwrap().reset_to_home();
    state.publish(events);
    Json(serde_json::json!({ "status": "ok" }))
}

// API endpoint for the "add legend" form
pub async fn submit_legend(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SubmitRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let coordinate = match Coordinate::new(request.latitude, request.longitude) {
        Ok(coordinate) => coordinate,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "status": "error", "message": e.to_string() })),
            )
        }
    };

    let token = bearer_token(&headers).or_else(|| state.settings.lock().unwrap().auth_token.clone());
    let mut form = LegendSubmissionForm::new(request.user_id, coordinate).with_values(request.draft);

    match form.submit(&state.client, token.as_deref()).await {
        Ok(()) => {
            state.refresh().await;
            (
                StatusCode::OK,
                Json(serde_json::json!({ "status": "success", "message": "Legend saved" })),
            )
        }
        Err(LegendMapError::Validation(_)) => {
            let errors: Vec<_> = form
                .visible_errors()
                .iter()
                .map(|e| serde_json::json!({ "field": e.field(), "message": e.to_string() }))
                .collect();
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({
                    "status": "invalid",
                    "errors": errors,
                    "values": form.values(),
                })),
            )
        }
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({
                "status": "error",
                "message": e.to_string(),
                "values": form.values(),
            })),
        ),
    }
}

// Field check on blur; only touched fields report errors
pub async fn validate_legend(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> Json<serde_json::Value> {
    let home = state.session.lock().unwrap().viewport().home().center;
    let mut form = LegendSubmissionForm::new(None, home);
    form.set(Field::Name, request.draft.name);
    form.set(Field::Description, request.draft.description);
    for field in request.touched {
        form.touch(field);
    }

    let errors: Vec<_> = form
        .visible_errors()
        .iter()
        .map(|e| serde_json::json!({ "field": e.field(), "message": e.to_string() }))
        .collect();
    Json(serde_json::json!({ "valid": errors.is_empty(), "errors": errors }))
}

pub async fn reload(State(state): State<AppState>) -> Json<serde_json::Value> {
    info!("🔄 Reloading legends, images and radio stations");
    state.reload().await;
    let snapshot = state.session.lock().unwrap().snapshot();
    Json(serde_json::json!({
        "status": "success",
        "legends": snapshot.legends,
        "stations": snapshot.stations,
        "images": snapshot.images,
    }))
}

// SSE endpoint for map commands
pub async fn map_events_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let (tx, rx) = mpsc::channel(100);

    // Subscribe to the main event sender
    let mut event_receiver = state.event_sender.subscribe();

    // Forward events from main sender to SSE stream
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                event = event_receiver.recv() => match event {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("SSE client lagged, {} map events skipped", skipped);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = tokio::time::sleep(Duration::from_secs(HEARTBEAT_SECS)) => MapEvent::heartbeat(),
            };

            let sse_event = SseEvent::default()
                .json_data(&event)
                .unwrap_or_else(|_| SseEvent::default().data("Error serializing event"));

            if tx.send(Ok(sse_event)).await.is_err() {
                break; // Client disconnected
            }
        }
    });

    let stream = ReceiverStream::new(rx);

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive-message"),
    )
}

fn embedded(path: &str, content_type: &str) -> Result<Response, StatusCode> {
    let content = Asset::get(path).ok_or(StatusCode::NOT_FOUND)?.data;
    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .body(content.into_owned().into())
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

pub async fn index_html() -> Result<Html<Vec<u8>>, StatusCode> {
    let content = Asset::get("index.html").ok_or(StatusCode::NOT_FOUND)?;
    Ok(Html(content.data.into_owned()))
}

pub async fn style_css() -> Result<Response, StatusCode> {
    embedded("style.css", "text/css")
}

pub async fn script_js() -> Result<Response, StatusCode> {
    embedded("script.js", "application/javascript")
}
