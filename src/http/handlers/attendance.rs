use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};

use crate::http::error::ApiError;
use crate::http::types::{AppState, SundayEntry};

/// Parses a `dd-mm-yy` session date. Two-digit years map into the 2000s.
/// Lexical order on these keys does not match calendar order, so every
/// chronological operation goes through this parse.
fn parse_session_date(raw: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.split('-').collect();
    if parts.len() != 3
        || parts
            .iter()
            .any(|p| p.len() != 2 || !p.chars().all(|c| c.is_ascii_digit()))
    {
        return None;
    }
    let day: u32 = parts[0].parse().ok()?;
    let month: u32 = parts[1].parse().ok()?;
    let year: i32 = parts[2].parse().ok()?;
    NaiveDate::from_ymd_opt(2000 + year, month, day)
}

/// Rejects malformed dates on the paths that create entry keys, so every
/// stored key stays sortable.
fn require_session_date(raw: &str) -> Result<(), ApiError> {
    parse_session_date(raw)
        .map(|_| ())
        .ok_or_else(|| ApiError::BadRequest(format!("invalid date '{raw}', expected dd-mm-yy")))
}

fn read_numbers(conn: &Connection, date: &str) -> Result<Option<Vec<i64>>, ApiError> {
    let raw: Option<String> = conn
        .query_row("SELECT numbers FROM sundays WHERE date = ?", [date], |r| {
            r.get(0)
        })
        .optional()?;
    match raw {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

fn write_numbers(conn: &Connection, date: &str, numbers: &[i64]) -> Result<(), ApiError> {
    let encoded = serde_json::to_string(numbers)?;
    conn.execute(
        "INSERT INTO sundays(date, numbers) VALUES(?, ?)
         ON CONFLICT(date) DO UPDATE SET numbers = excluded.numbers",
        (date, &encoded),
    )?;
    Ok(())
}

/// Set-union into a date's entry, creating it lazily. Adding a number that
/// is already present changes nothing.
fn union_numbers(conn: &Connection, date: &str, incoming: &[i64]) -> Result<(), ApiError> {
    let mut numbers = read_numbers(conn, date)?.unwrap_or_default();
    for n in incoming {
        if !numbers.contains(n) {
            numbers.push(*n);
        }
    }
    write_numbers(conn, date, &numbers)
}

/// Removes one number from a date's set. Removing an absent number is a
/// no-op; an entry whose set becomes empty stays on record.
fn remove_number(conn: &Connection, date: &str, roll_number: i64) -> Result<(), ApiError> {
    let Some(mut numbers) = read_numbers(conn, date)? else {
        return Err(ApiError::NotFound("Attendance record not found".to_string()));
    };
    numbers.retain(|n| *n != roll_number);
    write_numbers(conn, date, &numbers)
}

/// Every entry, newest session first.
fn list_entries(conn: &Connection) -> Result<Vec<SundayEntry>, ApiError> {
    let mut stmt = conn.prepare("SELECT date, numbers FROM sundays")?;
    let rows = stmt
        .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    let mut entries = Vec::with_capacity(rows.len());
    for (date, raw) in rows {
        let numbers: Vec<i64> = serde_json::from_str(&raw)?;
        entries.push(SundayEntry { date, numbers });
    }
    entries.sort_by(|a, b| {
        let ka = parse_session_date(&a.date).unwrap_or(NaiveDate::MIN);
        let kb = parse_session_date(&b.date).unwrap_or(NaiveDate::MIN);
        kb.cmp(&ka)
    });
    Ok(entries)
}

fn presence_window(
    conn: &Connection,
    window: usize,
    roll_number: i64,
) -> Result<Vec<bool>, ApiError> {
    let entries = list_entries(conn)?;
    Ok(entries
        .iter()
        .take(window)
        .map(|e| e.numbers.contains(&roll_number))
        .collect())
}

/// `GET /sundays`
pub async fn list_dates(State(state): State<AppState>) -> Result<Json<Vec<SundayEntry>>, ApiError> {
    let conn = state.db.lock();
    Ok(Json(list_entries(&conn)?))
}

/// `GET /sundays/:date`
pub async fn get_by_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<SundayEntry>, ApiError> {
    let conn = state.db.lock();
    match read_numbers(&conn, &date)? {
        Some(numbers) => Ok(Json(SundayEntry { date, numbers })),
        None => Err(ApiError::NotFound("Date not found.".to_string())),
    }
}

/// `GET /attendance/:n/:roll_number`
pub async fn windowed_presence(
    State(state): State<AppState>,
    Path((n, roll_number)): Path<(usize, i64)>,
) -> Result<Json<Vec<bool>>, ApiError> {
    let conn = state.db.lock();
    Ok(Json(presence_window(&conn, n, roll_number)?))
}

/// `GET /attendance/add/:date/:roll_number`
pub async fn mark_present(
    State(state): State<AppState>,
    Path((date, roll_number)): Path<(String, i64)>,
) -> Result<String, ApiError> {
    require_session_date(&date)?;
    let conn = state.db.lock();
    union_numbers(&conn, &date, &[roll_number])?;
    tracing::info!(%date, roll_number, "marked present");
    Ok("Roll number added successfully".to_string())
}

/// `DELETE /attendance/remove/:date/:roll_number`
pub async fn mark_absent(
    State(state): State<AppState>,
    Path((date, roll_number)): Path<(String, i64)>,
) -> Result<String, ApiError> {
    let conn = state.db.lock();
    remove_number(&conn, &date, roll_number)?;
    tracing::info!(%date, roll_number, "marked absent");
    Ok(format!(
        "Attendance record for roll number {roll_number} on {date} removed successfully"
    ))
}

/// `POST /store-numbers`
///
/// Administrative import: unions a whole batch of roll numbers into one
/// date's set. Numbers arrive as JSON integers or numeric strings and are
/// normalized to integers before they reach the store.
pub async fn store_numbers(
    State(state): State<AppState>,
    Json(params): Json<serde_json::Value>,
) -> Result<String, ApiError> {
    let Some(date) = params.get("date").and_then(|v| v.as_str()) else {
        return Err(ApiError::BadRequest("Invalid input".to_string()));
    };
    let Some(raw_numbers) = params.get("numbers").and_then(|v| v.as_array()) else {
        return Err(ApiError::BadRequest("Invalid input".to_string()));
    };
    require_session_date(date)?;

    let mut numbers = Vec::with_capacity(raw_numbers.len());
    for v in raw_numbers {
        let parsed = match v {
            serde_json::Value::Number(num) => num.as_i64(),
            serde_json::Value::String(s) => s.parse::<i64>().ok(),
            _ => None,
        };
        let Some(n) = parsed else {
            return Err(ApiError::BadRequest("Invalid input".to_string()));
        };
        numbers.push(n);
    }

    let conn = state.db.lock();
    let tx = conn.unchecked_transaction()?;
    union_numbers(&tx, date, &numbers)?;
    tx.commit()?;
    tracing::info!(%date, count = numbers.len(), "numbers stored");
    Ok("Numbers stored successfully".to_string())
}
