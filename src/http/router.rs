use axum::http::{HeaderName, HeaderValue};
use axum::middleware::{self, Next};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use super::handlers;
use super::types::AppState;

async fn request_id_middleware(
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let span = tracing::info_span!("request", request_id = %request_id);
    async move {
        let mut response = next.run(req).await;
        if let Ok(val) = HeaderValue::from_str(&request_id) {
            response
                .headers_mut()
                .insert(HeaderName::from_static("x-request-id"), val);
        }
        response
    }
    .instrument(span)
    .await
}

/// Builds the Axum router with all routes and middleware layers.
///
/// CORS is permissive: the roster frontend is served from a different
/// origin and the API carries no credentials.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::core::health))
        .route(
            "/students",
            get(handlers::students::list).post(handlers::students::create),
        )
        .route(
            "/students/:roll_number",
            get(handlers::students::get_by_roll_number).put(handlers::students::update),
        )
        .route("/sundays", get(handlers::attendance::list_dates))
        .route("/sundays/:date", get(handlers::attendance::get_by_date))
        .route(
            "/attendance/:n/:roll_number",
            get(handlers::attendance::windowed_presence),
        )
        .route(
            "/attendance/add/:date/:roll_number",
            get(handlers::attendance::mark_present),
        )
        .route(
            "/attendance/remove/:date/:roll_number",
            delete(handlers::attendance::mark_absent),
        )
        .route("/store-numbers", post(handlers::attendance::store_numbers))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
