use rusqlite::Connection;
use std::path::Path;

/// Opens (and on first use creates) the roster database inside `data_dir`.
///
/// The two tables are document collections: one row per document, keyed by
/// roll number and by session date respectively. `metadata` and `numbers`
/// hold JSON-encoded values so records keep their free-form shape.
pub fn open_db(data_dir: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(data_dir)?;
    let db_path = data_dir.join("roster.sqlite3");
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            roll_number INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            age INTEGER NOT NULL,
            phone TEXT NOT NULL,
            learning_level TEXT,
            metadata TEXT NOT NULL DEFAULT '{}',
            image_url TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sundays(
            date TEXT PRIMARY KEY,
            numbers TEXT NOT NULL DEFAULT '[]'
        )",
        [],
    )?;

    Ok(conn)
}
