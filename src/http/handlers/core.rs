use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::http::error::ApiError;
use crate::http::types::AppState;

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = state.db.lock();
    let students: i64 = conn.query_row("SELECT COUNT(*) FROM students", [], |r| r.get(0))?;
    let sundays: i64 = conn.query_row("SELECT COUNT(*) FROM sundays", [], |r| r.get(0))?;
    Ok(Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "students": students,
        "sundays": sundays,
    })))
}
