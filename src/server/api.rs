//! API route definitions

use std::sync::Arc;
use axum::{
    http::{header, HeaderValue, Method, Uri},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use super::{error::ServerError, handlers, state::AppState, ServerConfig};

async fn handle_404(method: Method, uri: Uri) -> ServerError {
    ServerError::NotFound(format!(
        "{} {}. Available routes: POST /predict, POST /predict/batch, GET /health",
        method,
        uri.path()
    ))
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origin = match config.cors_origin.as_deref() {
        None | Some("*") => AllowOrigin::from(Any),
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring unparsable CORS origin, allowing any");
                AllowOrigin::from(Any)
            }
        },
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Create the main application router
pub fn create_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/predict", post(handlers::predict))
        .route("/predict/batch", post(handlers::predict_batch))
        .route("/health", get(handlers::health_check))
        .fallback(handle_404)
        .with_state(state)
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}
