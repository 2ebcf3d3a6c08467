use std::time::Duration;

use axum::{
    http::{header, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::routes::{kv_routes, record_routes, system_routes};
use crate::state::AppState;

/// Upper bound for a single request, including the record query.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Build the complete Axum application:
/// - /in-memory (key/value operations)
/// - /records   (count record aggregation)
/// - /system    (alive + version)
pub fn build_app(state: AppState) -> Router {
    let routes = Router::new()
        .route("/", any(not_implemented))
        .merge(kv_routes::routes(state.store.clone()))
        .merge(record_routes::routes(state.records.clone()))
        .nest("/system", system_routes::routes())
        .fallback(not_found);

    with_layers(routes)
}

/// Timeout, JSON error bodies, CORS and request logging.
fn with_layers(router: Router) -> Router {
    router
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(middleware::map_response(json_error_body))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods([Method::OPTIONS, Method::GET, Method::DELETE, Method::POST]),
        )
        // Logging middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Give the bodiless 405 (method router) and 408 (timeout) a JSON message.
async fn json_error_body(response: Response) -> Response {
    let status = response.status();
    if !matches!(status, StatusCode::METHOD_NOT_ALLOWED | StatusCode::REQUEST_TIMEOUT) {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut replaced = (status, Json(status.canonical_reason().unwrap_or_default())).into_response();
    if let Some(allow) = allow {
        replaced.headers_mut().insert(header::ALLOW, allow);
    }
    replaced
}

async fn not_implemented() -> (StatusCode, Json<&'static str>) {
    (StatusCode::NOT_IMPLEMENTED, Json("Not Implemented"))
}

async fn not_found() -> (StatusCode, Json<&'static str>) {
    (StatusCode::NOT_FOUND, Json("Not Found"))
}
