use std::sync::Arc;

use rosterd::db;
use rosterd::http::{create_router, AppState};
use serde_json::json;
use tempfile::TempDir;

async fn spawn_app() -> (String, TempDir) {
    let tmp = TempDir::new().expect("create temp dir");
    let conn = db::open_db(tmp.path()).expect("open roster db");
    let state = AppState {
        db: Arc::new(parking_lot::Mutex::new(conn)),
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let app = create_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (format!("http://{addr}"), tmp)
}

async fn create_student(base_url: &str, body: serde_json::Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{base_url}/students"))
        .json(&body)
        .send()
        .await
        .expect("create student")
}

#[tokio::test]
async fn create_assigns_sequential_roll_numbers_from_one() {
    let (base_url, _tmp) = spawn_app().await;

    let resp = create_student(&base_url, json!({ "name": "A", "age": 10, "phone": "111" })).await;
    assert_eq!(resp.status().as_u16(), 201);
    let body: serde_json::Value = resp.json().await.expect("create response json");
    assert_eq!(body.get("rollNumber").and_then(|v| v.as_i64()), Some(1));
    assert_eq!(
        body.get("message").and_then(|v| v.as_str()),
        Some("Student created successfully.")
    );

    let resp = create_student(&base_url, json!({ "name": "B", "age": 11, "phone": "222" })).await;
    let body: serde_json::Value = resp.json().await.expect("create response json");
    assert_eq!(body.get("rollNumber").and_then(|v| v.as_i64()), Some(2));

    let resp = create_student(&base_url, json!({ "name": "C", "age": 12, "phone": "333" })).await;
    let body: serde_json::Value = resp.json().await.expect("create response json");
    assert_eq!(body.get("rollNumber").and_then(|v| v.as_i64()), Some(3));

    // The first record is untouched by later creates.
    let first: serde_json::Value = reqwest::get(format!("{base_url}/students/1"))
        .await
        .expect("get student 1")
        .json()
        .await
        .expect("student json");
    assert_eq!(first.get("name").and_then(|v| v.as_str()), Some("A"));
    assert_eq!(first.get("age").and_then(|v| v.as_i64()), Some(10));
    assert_eq!(first.get("rollNumber").and_then(|v| v.as_i64()), Some(1));
}

#[tokio::test]
async fn health_reports_version_and_collection_counts() {
    let (base_url, _tmp) = spawn_app().await;

    create_student(&base_url, json!({ "name": "A", "age": 10, "phone": "111" })).await;

    let health: serde_json::Value = reqwest::get(format!("{base_url}/health"))
        .await
        .expect("health")
        .json()
        .await
        .expect("health json");
    assert!(health.get("version").and_then(|v| v.as_str()).is_some());
    assert_eq!(health.get("students").and_then(|v| v.as_i64()), Some(1));
    assert_eq!(health.get("sundays").and_then(|v| v.as_i64()), Some(0));
}

#[tokio::test]
async fn get_missing_student_returns_not_found() {
    let (base_url, _tmp) = spawn_app().await;

    let resp = reqwest::get(format!("{base_url}/students/42"))
        .await
        .expect("get student");
    assert_eq!(resp.status().as_u16(), 404);
    let body: serde_json::Value = resp.json().await.expect("error json");
    assert_eq!(
        body.get("message").and_then(|v| v.as_str()),
        Some("Student not found.")
    );
}

#[tokio::test]
async fn update_missing_student_is_not_found_and_writes_nothing() {
    let (base_url, _tmp) = spawn_app().await;

    create_student(&base_url, json!({ "name": "A", "age": 10, "phone": "111" })).await;

    let resp = reqwest::Client::new()
        .put(format!("{base_url}/students/99"))
        .json(&json!({ "name": "ghost", "age": 1, "phone": "0" }))
        .send()
        .await
        .expect("update student");
    assert_eq!(resp.status().as_u16(), 404);

    let students: serde_json::Value = reqwest::get(format!("{base_url}/students"))
        .await
        .expect("list students")
        .json()
        .await
        .expect("list json");
    let students = students.as_array().expect("student array");
    assert_eq!(students.len(), 1);
    assert_eq!(
        students[0].get("name").and_then(|v| v.as_str()),
        Some("A")
    );
}

#[tokio::test]
async fn update_overwrites_all_mutable_fields_and_keeps_roll_number() {
    let (base_url, _tmp) = spawn_app().await;

    create_student(
        &base_url,
        json!({
            "name": "A",
            "age": 10,
            "phone": "111",
            "learningLevel": "beginner",
            "metadata": { "house": "red" }
        }),
    )
    .await;

    let resp = reqwest::Client::new()
        .put(format!("{base_url}/students/1"))
        .json(&json!({
            "name": "A2",
            "age": 11,
            "phone": "999",
            "learningLevel": "advanced",
            "metadata": { "house": "blue", "team": "chess" },
            "imageUrl": "https://img.example/a2.png"
        }))
        .send()
        .await
        .expect("update student");
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().await.expect("update json");
    assert_eq!(body.get("rollNumber").and_then(|v| v.as_i64()), Some(1));

    let record: serde_json::Value = reqwest::get(format!("{base_url}/students/1"))
        .await
        .expect("get student")
        .json()
        .await
        .expect("student json");
    assert_eq!(record.get("rollNumber").and_then(|v| v.as_i64()), Some(1));
    assert_eq!(record.get("name").and_then(|v| v.as_str()), Some("A2"));
    assert_eq!(record.get("age").and_then(|v| v.as_i64()), Some(11));
    assert_eq!(record.get("phone").and_then(|v| v.as_str()), Some("999"));
    assert_eq!(
        record.get("learningLevel").and_then(|v| v.as_str()),
        Some("advanced")
    );
    assert_eq!(
        record.get("imageUrl").and_then(|v| v.as_str()),
        Some("https://img.example/a2.png")
    );
    assert_eq!(
        record.get("metadata"),
        Some(&json!({ "house": "blue", "team": "chess" }))
    );
}

#[tokio::test]
async fn list_returns_all_records_sorted_ascending_by_roll_number() {
    let (base_url, _tmp) = spawn_app().await;

    for (name, age) in [("A", 10), ("B", 11), ("C", 12), ("D", 13)] {
        create_student(&base_url, json!({ "name": name, "age": age, "phone": "1" })).await;
    }

    let students: serde_json::Value = reqwest::get(format!("{base_url}/students"))
        .await
        .expect("list students")
        .json()
        .await
        .expect("list json");
    let rolls: Vec<i64> = students
        .as_array()
        .expect("student array")
        .iter()
        .map(|s| s.get("rollNumber").and_then(|v| v.as_i64()).expect("roll"))
        .collect();
    assert_eq!(rolls, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn metadata_round_trips_user_defined_fields() {
    let (base_url, _tmp) = spawn_app().await;

    create_student(
        &base_url,
        json!({
            "name": "A",
            "age": 10,
            "phone": "111",
            "metadata": { "guardian": "R. Doe", "village": "north" }
        }),
    )
    .await;

    let record: serde_json::Value = reqwest::get(format!("{base_url}/students/1"))
        .await
        .expect("get student")
        .json()
        .await
        .expect("student json");
    assert_eq!(
        record.get("metadata"),
        Some(&json!({ "guardian": "R. Doe", "village": "north" }))
    );
    // Omitted optional fields come back as explicit nulls, not absent keys.
    assert!(record.get("learningLevel").is_some());
    assert_eq!(record.get("learningLevel"), Some(&serde_json::Value::Null));
}
