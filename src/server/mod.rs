use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::info;

pub mod events;
pub mod handlers;
pub mod state;

use self::state::AppState;
use handlers::{
    click_marker, fly_to_legend, get_legends, get_markers, get_overlay, get_state, index_html,
    map_events_stream, move_end, reload, script_js, search_legends, style_css, submit_legend,
    update_viewport, validate_legend, zoom_out,
};

// Create the main application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_html))
        .route("/style.css", get(style_css))
        .route("/script.js", get(script_js))
        .route("/api/state", get(get_state))
        .route("/api/markers", get(get_markers))
        .route("/api/overlay", get(get_overlay))
        .route("/api/markers/:id/click", post(click_marker))
        .route("/api/legends", get(get_legends).post(submit_legend))
        .route("/api/legends/validate", post(validate_legend))
        .route("/api/legends/:id/fly", post(fly_to_legend))
        .route("/api/search", get(search_legends))
        .route("/api/viewport", post(update_viewport))
        .route("/api/viewport/move-end", post(move_end))
        .route("/api/zoom-out", post(zoom_out))
        .route("/api/reload", post(reload))
        .route("/api/events", get(map_events_stream))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}

pub async fn start_server(state: AppState, port: u16) -> Result<()> {
    let app = create_app(state);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr).await?;

    info!("🌐 Map available at http://127.0.0.1:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("🛑 Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{spawn_fake_backend, unreachable_backend};
    use crate::backend::BackendClient;
    use crate::server::events::MapEvent;
    use crate::session::{LoadKind, MapSession};
    use crate::settings::Settings;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Json,
    };
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use tokio::sync::broadcast;
    use tower::ServiceExt;

    fn app_state(settings: Settings) -> (AppState, broadcast::Receiver<MapEvent>) {
        let (event_sender, receiver) = broadcast::channel(64);
        let mut session = MapSession::from_settings(&settings).unwrap();

        let ticket = session.begin_load(LoadKind::Legends);
        let legends = serde_json::from_value(json!([
            {"id": 1, "name": "Lodz legend", "description": "d", "latitude": 51.75, "longitude": 19.46},
            {"id": 2, "name": "Krakow legend", "description": "d", "latitude": 50.06, "longitude": 19.94}
        ]))
        .unwrap();
        session.apply_legends(ticket, Ok(legends));
        let ticket = session.begin_load(LoadKind::Stations);
        let stations = serde_json::from_value(json!([
            {"name": "Radio Lodz", "url": "http://lodz", "geo_lat": 51.76, "geo_long": 19.47}
        ]))
        .unwrap();
        session.apply_stations(ticket, Ok(stations));

        let state = AppState {
            session: Arc::new(Mutex::new(session)),
            client: BackendClient::new(&settings).unwrap(),
            settings: Arc::new(Mutex::new(settings)),
            event_sender,
        };
        (state, receiver)
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn drain(receiver: &mut broadcast::Receiver<MapEvent>) -> Vec<MapEvent> {
        std::iter::from_fn(|| receiver.try_recv().ok()).collect()
    }

    #[tokio::test]
    async fn test_marker_click_publishes_selection() {
        let (state, mut events) = app_state(unreachable_backend().await);
        let marker_id = state.session.lock().unwrap().registry().legend_markers()[0].id;
        let app = create_app(state.clone());

        let (status, body) = call(app, "POST", &format!("/api/markers/{marker_id}/click"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["events"], 4);

        let published = drain(&mut events);
        assert!(matches!(published.last(), Some(MapEvent::OpenDrawer { legend_id: 1, .. })));
        assert_eq!(state.session.lock().unwrap().selection().unwrap().legend_id, 1);
    }

    #[tokio::test]
    async fn test_overlay_describes_boundary_layer() {
        let (state, _events) = app_state(unreachable_backend().await);
        let (status, body) = call(create_app(state.clone()), "GET", "/api/overlay", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["focus_country"], "POL");
        assert_eq!(body["fill_opacity"], 0.2);

        state.settings.lock().unwrap().boundaries_url.clear();
        let (_, body) = call(create_app(state), "GET", "/api/overlay", None).await;
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn test_unknown_marker_is_not_found() {
        let (state, _events) = app_state(unreachable_backend().await);
        let (status, _) = call(create_app(state), "POST", "/api/markers/9999/click", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_viewport_updates_zoom_out_visibility() {
        let (state, _events) = app_state(unreachable_backend().await);

        let (status, body) = call(
            create_app(state.clone()),
            "POST",
            "/api/viewport",
            Some(json!({"lat": 51.0, "lng": 19.0, "zoom": 9.5})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["zoom_out_visible"], true);
        assert_eq!(body["center_marker"]["coordinate"], json!({"lat": 51.0, "lng": 19.0}));

        let (status, _) = call(
            create_app(state),
            "POST",
            "/api/viewport",
            Some(json!({"lat": 91.0, "lng": 19.0, "zoom": 9.5})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_zoom_out_publishes_home_commands() {
        let (state, mut events) = app_state(unreachable_backend().await);
        let (status, _) = call(create_app(state), "POST", "/api/zoom-out", None).await;
        assert_eq!(status, StatusCode::OK);

        let published = drain(&mut events);
        assert_eq!(published.len(), 4);
        assert_eq!(published[1], MapEvent::CloseDrawer);
        assert_eq!(published[2], MapEvent::ZoomOutVisibility { visible: false });
    }

    #[tokio::test]
    async fn test_search_then_fly_selects_on_move_end() {
        let (state, _events) = app_state(unreachable_backend().await);

        let (_, found) = call(create_app(state.clone()), "GET", "/api/search?q=KRAKOW", None).await;
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["id"], 2);

        let (status, _) = call(create_app(state.clone()), "POST", "/api/legends/2/fly", None).await;
        assert_eq!(status, StatusCode::OK);
        call(
            create_app(state.clone()),
            "POST",
            "/api/viewport",
            Some(json!({"lat": 50.06, "lng": 19.94, "zoom": 12.0})),
        )
        .await;
        let (_, body) = call(create_app(state.clone()), "POST", "/api/viewport/move-end", None).await;
        assert_eq!(body["events"], 4);

        let (_, snapshot) = call(create_app(state), "GET", "/api/state", None).await;
        assert_eq!(snapshot["selection"]["legend_id"], 2);
    }

    #[tokio::test]
    async fn test_invalid_submission_returns_field_errors() {
        let (state, _events) = app_state(unreachable_backend().await);
        let (status, body) = call(
            create_app(state),
            "POST",
            "/api/legends",
            Some(json!({"userId": 1, "latitude": 51.0, "longitude": 19.0, "name": "ab", "description": ""})),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"][0]["field"], "name");
        assert_eq!(body["errors"][1]["message"], "description is required");
        assert_eq!(body["values"]["name"], "ab");
    }

    #[tokio::test]
    async fn test_validate_reports_only_touched_fields() {
        let (state, _events) = app_state(unreachable_backend().await);
        let (status, body) = call(
            create_app(state.clone()),
            "POST",
            "/api/legends/validate",
            Some(json!({"name": "ab", "description": "short", "touched": ["name"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], false);
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);
        assert_eq!(body["errors"][0]["message"], "name must have at least 3 characters");

        let (_, body) = call(
            create_app(state),
            "POST",
            "/api/legends/validate",
            Some(json!({"name": "abc", "description": "short", "touched": []})),
        )
        .await;
        assert_eq!(body["valid"], true);
    }

    #[tokio::test]
    async fn test_failed_submission_keeps_values_and_does_not_reload() {
        let (state, mut events) = app_state(unreachable_backend().await);
        let description = "x".repeat(50);
        let (status, body) = call(
            create_app(state),
            "POST",
            "/api/legends",
            Some(json!({"latitude": 51.0, "longitude": 19.0, "name": "Syrenka", "description": description})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["values"]["description"], description);
        assert!(drain(&mut events).is_empty());
    }

    #[tokio::test]
    async fn test_successful_submission_refreshes_view() {
        let router = Router::new()
            .route(
                "/api/add-legend",
                axum::routing::post(|headers: axum::http::HeaderMap| async move {
                    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                        Some("Bearer from-page") => StatusCode::OK,
                        _ => StatusCode::UNAUTHORIZED,
                    }
                }),
            )
            .route(
                "/places",
                get(|| async {
                    Json(json!([{"id": 5, "name": "Nowa", "description": "d", "latitude": 52.0, "longitude": 21.0}]))
                }),
            )
            .route("/images", get(|| async { Json(json!([])) }))
            .route("/json/stations/search", get(|| async { Json(json!([])) }));
        let (state, mut events) = app_state(spawn_fake_backend(router).await);
        {
            let mut session = state.session.lock().unwrap();
            let marker = session.registry().legend_markers()[0].id;
            session.click_marker(marker).unwrap();
            let radio = session.registry().radio_markers()[0].id;
            session.click_marker(radio).unwrap();
            assert!(session.player().current().is_some());
        }

        let request = Request::builder()
            .method("POST")
            .uri("/api/legends")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, "Bearer from-page")
            .body(Body::from(
                json!({"userId": 3, "latitude": 52.0, "longitude": 21.0,
                       "name": "Nowa", "description": "y".repeat(50)})
                .to_string(),
            ))
            .unwrap();
        let response = create_app(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(drain(&mut events), vec![MapEvent::Refresh]);
        let session = state.session.lock().unwrap();
        assert_eq!(session.legends().len(), 1);
        assert_eq!(session.legends()[0].id, 5);

        // the view starts over as on a freshly opened page
        assert!(session.selection().is_none());
        assert!(!session.registry().radios_shown());
        assert!(session.player().current().is_none());
        assert_eq!(session.viewport().state(), session.viewport().home());
    }
}
