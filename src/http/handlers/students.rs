use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rusqlite::{Connection, OptionalExtension};
use std::collections::BTreeMap;

use crate::http::error::ApiError;
use crate::http::types::{AppState, RosterMutationResponse, StudentPayload, StudentRecord};

struct StudentRow {
    roll_number: i64,
    name: String,
    age: i64,
    phone: String,
    learning_level: Option<String>,
    metadata: String,
    image_url: Option<String>,
}

fn read_student_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StudentRow> {
    Ok(StudentRow {
        roll_number: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        phone: row.get(3)?,
        learning_level: row.get(4)?,
        metadata: row.get(5)?,
        image_url: row.get(6)?,
    })
}

impl StudentRow {
    fn into_record(self) -> Result<StudentRecord, ApiError> {
        let metadata: BTreeMap<String, String> = serde_json::from_str(&self.metadata)?;
        Ok(StudentRecord {
            roll_number: self.roll_number,
            name: self.name,
            age: self.age,
            phone: self.phone,
            learning_level: self.learning_level,
            metadata,
            image_url: self.image_url,
        })
    }
}

/// Next roll number: one past the highest on record, or 1 on an empty store.
/// Read-then-insert is not serialized against concurrent creates; the store
/// key constraint surfaces a duplicate assignment as an error instead of a
/// silent overwrite.
fn next_roll_number(conn: &Connection) -> Result<i64, ApiError> {
    let last: Option<i64> = conn
        .query_row(
            "SELECT roll_number FROM students ORDER BY roll_number DESC LIMIT 1",
            [],
            |r| r.get(0),
        )
        .optional()?;
    Ok(last.map_or(1, |n| n + 1))
}

fn create_student(conn: &Connection, payload: &StudentPayload) -> Result<i64, ApiError> {
    let roll_number = next_roll_number(conn)?;
    let metadata = serde_json::to_string(&payload.metadata)?;
    conn.execute(
        "INSERT INTO students(roll_number, name, age, phone, learning_level, metadata, image_url)
         VALUES(?, ?, ?, ?, ?, ?, ?)",
        (
            roll_number,
            &payload.name,
            payload.age,
            &payload.phone,
            &payload.learning_level,
            &metadata,
            &payload.image_url,
        ),
    )?;
    Ok(roll_number)
}

fn update_student(
    conn: &Connection,
    roll_number: i64,
    payload: &StudentPayload,
) -> Result<(), ApiError> {
    let metadata = serde_json::to_string(&payload.metadata)?;
    let changed = conn.execute(
        "UPDATE students
         SET name = ?, age = ?, phone = ?, learning_level = ?, metadata = ?, image_url = ?
         WHERE roll_number = ?",
        (
            &payload.name,
            payload.age,
            &payload.phone,
            &payload.learning_level,
            &metadata,
            &payload.image_url,
            roll_number,
        ),
    )?;
    if changed == 0 {
        return Err(ApiError::NotFound("Student not found.".to_string()));
    }
    Ok(())
}

fn get_student(conn: &Connection, roll_number: i64) -> Result<StudentRecord, ApiError> {
    let row = conn
        .query_row(
            "SELECT roll_number, name, age, phone, learning_level, metadata, image_url
             FROM students
             WHERE roll_number = ?",
            [roll_number],
            read_student_row,
        )
        .optional()?;
    match row {
        Some(row) => row.into_record(),
        None => Err(ApiError::NotFound("Student not found.".to_string())),
    }
}

fn list_students(conn: &Connection) -> Result<Vec<StudentRecord>, ApiError> {
    let mut stmt = conn.prepare(
        "SELECT roll_number, name, age, phone, learning_level, metadata, image_url
         FROM students
         ORDER BY roll_number",
    )?;
    let rows = stmt
        .query_map([], read_student_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(StudentRow::into_record).collect()
}

/// `POST /students`
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<StudentPayload>,
) -> Result<(StatusCode, Json<RosterMutationResponse>), ApiError> {
    let conn = state.db.lock();
    let roll_number = create_student(&conn, &payload)?;
    tracing::info!(roll_number, "student created");
    Ok((
        StatusCode::CREATED,
        Json(RosterMutationResponse {
            message: "Student created successfully.".to_string(),
            roll_number,
        }),
    ))
}

/// `PUT /students/:roll_number`
pub async fn update(
    State(state): State<AppState>,
    Path(roll_number): Path<i64>,
    Json(payload): Json<StudentPayload>,
) -> Result<Json<RosterMutationResponse>, ApiError> {
    let conn = state.db.lock();
    update_student(&conn, roll_number, &payload)?;
    tracing::info!(roll_number, "student updated");
    Ok(Json(RosterMutationResponse {
        message: "Student updated successfully.".to_string(),
        roll_number,
    }))
}

/// `GET /students/:roll_number`
pub async fn get_by_roll_number(
    State(state): State<AppState>,
    Path(roll_number): Path<i64>,
) -> Result<Json<StudentRecord>, ApiError> {
    let conn = state.db.lock();
    Ok(Json(get_student(&conn, roll_number)?))
}

/// `GET /students`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<StudentRecord>>, ApiError> {
    let conn = state.db.lock();
    Ok(Json(list_students(&conn)?))
}
