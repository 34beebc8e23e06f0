//! FaceLens Web Server
//!
//! Axum-based HTTP front for the analysis gateway, plus the sample gallery.

pub mod error;
pub mod routes;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use facelens_core::{Gateway, Settings};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use routes::samples::SAMPLES_PREFIX;
use state::AppState;

/// Room for the JSON envelope around a base64 image.
const BODY_OVERHEAD: usize = 64 * 1024;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.gateway.max_image_bytes() / 3 * 4 + BODY_OVERHEAD;

    let api_routes = Router::new()
        .route("/analyze-face", post(routes::analyze::analyze_face))
        .route("/samples", get(routes::samples::list_samples))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state.clone());

    let mut app = Router::new()
        .route("/health", get(routes::health::health))
        .nest("/api", api_routes);

    if let Some(dir) = &state.samples_dir {
        app = app.nest_service(SAMPLES_PREFIX, ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the web server.
pub async fn run_server(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let gateway = Gateway::from_settings(settings)?;
    let state = AppState::new(gateway, settings.samples_dir.clone());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!(
        base_url = settings.public_base_url(),
        "Web server listening on http://{}:{}",
        host,
        port
    );

    axum::serve(listener, app).await?;
    Ok(())
}
