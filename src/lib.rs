//! rosterd — student roster and Sunday-attendance service.
//!
//! A small HTTP/JSON backend over a SQLite document store: student records
//! keyed by sequentially assigned roll numbers, and per-date attendance
//! entries holding the set of roll numbers present on each recurring
//! session date.

/// Store layer: opens the roster database and creates its collections.
pub mod db;
/// REST API layer: Axum router, HTTP handlers, error mapping.
pub mod http;
