use parking_lot::Mutex;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared application state passed to every handler via Axum's `State` extractor.
///
/// The connection is the store client: constructed once by `db::open_db`
/// before the router starts serving, never re-opened per request.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
}

/// Mutable student fields, shared by the create and update request bodies.
/// The roll number is never part of a request body; the store assigns it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPayload {
    pub name: String,
    pub age: i64,
    pub phone: String,
    pub learning_level: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub image_url: Option<String>,
}

/// Full student record as returned by the roster endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub roll_number: i64,
    pub name: String,
    pub age: i64,
    pub phone: String,
    pub learning_level: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub image_url: Option<String>,
}

/// Response body for the roster create and update endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterMutationResponse {
    pub message: String,
    pub roll_number: i64,
}

/// One attendance entry: a session date and the roll numbers present on it.
#[derive(Debug, Serialize)]
pub struct SundayEntry {
    pub date: String,
    pub numbers: Vec<i64>,
}
