use axum::{http::StatusCode, routing::post, Json, Router};
use reclaim_server::{config::Config, db, routes, AppState};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::{Arc, Mutex};

/// Create an in-memory SQLite pool with schema applied.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .unwrap();

    db::apply_schema(&pool).await.unwrap();

    pool
}

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".into(),
        port: 0,
        database_path: ":memory:".into(),
        // Unreachable on purpose: tests that care about the matcher point
        // this at a stub server instead.
        matcher_url: "http://127.0.0.1:9/".into(),
        email_api_url: "http://127.0.0.1:9/".into(),
        email_api_key: String::new(),
        email_from: "Reclaim <test@reclaim.example>".into(),
        site_url: "http://localhost:3000".into(),
        upstream_timeout_secs: 2,
    }
}

/// Build a test Axum app with the given pool.
pub fn create_test_app(pool: SqlitePool) -> Router {
    create_test_app_with_config(pool, test_config())
}

pub fn create_test_app_with_config(pool: SqlitePool, config: Config) -> Router {
    routes::build_router(Arc::new(AppState::new(pool, config)))
}

/// Create a test user with a live session. Returns (user_id, session_token).
pub async fn create_test_user(pool: &SqlitePool, email: &str, name: &str) -> (String, String) {
    let user_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO users (id, name, email, image, created_at, updated_at)
         VALUES (?, ?, ?, NULL, ?, ?)",
    )
    .bind(&user_id)
    .bind(name)
    .bind(email)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap();

    let token = uuid::Uuid::new_v4().to_string();
    let expires = (chrono::Utc::now() + chrono::Duration::days(30)).to_rfc3339();
    sqlx::query(
        "INSERT INTO sessions (id, user_id, token, expires_at, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&user_id)
    .bind(&token)
    .bind(&expires)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap();

    (user_id, token)
}

/// Insert an item directly. Returns the item id.
pub async fn create_test_item(
    pool: &SqlitePool,
    user_id: &str,
    item_type: &str,
    title: &str,
    status: &str,
) -> String {
    let item_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO items (id, title, description, category, type, location, date, image_url, status, user_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, NULL, NULL, NULL, ?, ?, ?, ?)",
    )
    .bind(&item_id)
    .bind(title)
    .bind(format!("Description of {} for testing", title))
    .bind("Accessories")
    .bind(item_type)
    .bind(status)
    .bind(user_id)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap();

    item_id
}

/// Insert a thread directly, participants stored sorted. Returns the thread id.
pub async fn create_test_thread(
    pool: &SqlitePool,
    item_id: &str,
    user_a: &str,
    user_b: &str,
) -> String {
    let thread_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let (id1, id2) = if user_a < user_b {
        (user_a, user_b)
    } else {
        (user_b, user_a)
    };

    sqlx::query(
        "INSERT INTO message_threads (id, item_id, participant1_id, participant2_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&thread_id)
    .bind(item_id)
    .bind(id1)
    .bind(id2)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap();

    thread_id
}

pub async fn insert_test_message(
    pool: &SqlitePool,
    thread_id: &str,
    sender_id: &str,
    receiver_id: &str,
    content: &str,
) -> String {
    let message_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO messages (id, thread_id, sender_id, receiver_id, content, is_read, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, 0, ?, ?)",
    )
    .bind(&message_id)
    .bind(thread_id)
    .bind(sender_id)
    .bind(receiver_id)
    .bind(content)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap();

    message_id
}

/// Stub HTTP endpoint that records every JSON POST body and replies with a
/// fixed status and body. Returns (base_url, recorded_requests).
pub async fn spawn_stub_server(
    status: StatusCode,
    body: serde_json::Value,
) -> (String, Arc<Mutex<Vec<serde_json::Value>>>) {
    let requests: Arc<Mutex<Vec<serde_json::Value>>> = Arc::new(Mutex::new(Vec::new()));
    let recorded = requests.clone();

    let app = Router::new().route(
        "/",
        post(move |Json(payload): Json<serde_json::Value>| {
            let recorded = recorded.clone();
            let body = body.clone();
            async move {
                recorded.lock().unwrap().push(payload);
                (status, Json(body))
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/", addr), requests)
}
