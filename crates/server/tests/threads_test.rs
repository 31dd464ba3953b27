mod common;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::json;

fn auth_header(token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        format!("Bearer {}", token).parse().unwrap(),
    )
}

async fn setup() -> (TestServer, sqlx::SqlitePool) {
    let pool = common::setup_test_db().await;
    let app = common::create_test_app(pool.clone());
    let server = TestServer::new(app).unwrap();
    (server, pool)
}

#[tokio::test]
async fn create_thread_is_idempotent_across_call_order() {
    let (server, pool) = setup().await;
    let (alice_id, alice_token) = common::create_test_user(&pool, "alice@test.com", "alice").await;
    let (bob_id, bob_token) = common::create_test_user(&pool, "bob@test.com", "bob").await;
    let item_id = common::create_test_item(&pool, &bob_id, "found", "Wallet", "active").await;

    let (h, v) = auth_header(&alice_token);
    let res = server
        .post("/api/messages/threads")
        .add_header(h, v)
        .json(&json!({ "itemId": item_id, "receiverId": bob_id }))
        .await;
    res.assert_status(StatusCode::CREATED);
    let first: serde_json::Value = res.json();

    // Same pair again
    let (h, v) = auth_header(&alice_token);
    let res = server
        .post("/api/messages/threads")
        .add_header(h, v)
        .json(&json!({ "itemId": item_id, "receiverId": bob_id }))
        .await;
    res.assert_status_ok();
    let second: serde_json::Value = res.json();
    assert_eq!(first["id"], second["id"]);

    // Reversed direction resolves to the same thread
    let (h, v) = auth_header(&bob_token);
    let res = server
        .post("/api/messages/threads")
        .add_header(h, v)
        .json(&json!({ "itemId": item_id, "receiverId": alice_id }))
        .await;
    res.assert_status_ok();
    let third: serde_json::Value = res.json();
    assert_eq!(first["id"], third["id"]);
}

#[tokio::test]
async fn concurrent_creates_converge_on_one_thread() {
    let (server, pool) = setup().await;
    let (alice_id, alice_token) = common::create_test_user(&pool, "alice@test.com", "alice").await;
    let (bob_id, bob_token) = common::create_test_user(&pool, "bob@test.com", "bob").await;
    let item_id = common::create_test_item(&pool, &bob_id, "found", "Wallet", "active").await;

    let (h1, v1) = auth_header(&alice_token);
    let (h2, v2) = auth_header(&bob_token);
    let req_a = server
        .post("/api/messages/threads")
        .add_header(h1, v1)
        .json(&json!({ "itemId": item_id, "receiverId": bob_id }));
    let req_b = server
        .post("/api/messages/threads")
        .add_header(h2, v2)
        .json(&json!({ "itemId": item_id, "receiverId": alice_id }));

    let (res_a, res_b) = tokio::join!(req_a, req_b);
    assert!(res_a.status_code().is_success());
    assert!(res_b.status_code().is_success());

    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM message_threads WHERE item_id = ?")
            .bind(&item_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn initial_message_is_appended_on_create_and_on_find() {
    let (server, pool) = setup().await;
    let (_alice_id, alice_token) = common::create_test_user(&pool, "alice@test.com", "alice").await;
    let (bob_id, _) = common::create_test_user(&pool, "bob@test.com", "bob").await;
    let item_id = common::create_test_item(&pool, &bob_id, "found", "Wallet", "active").await;

    let (h, v) = auth_header(&alice_token);
    let res = server
        .post("/api/messages/threads")
        .add_header(h, v)
        .json(&json!({
            "itemId": item_id,
            "receiverId": bob_id,
            "initialMessage": "Hi, I think that's my wallet"
        }))
        .await;
    res.assert_status(StatusCode::CREATED);
    let thread: serde_json::Value = res.json();
    let thread_id = thread["id"].as_str().unwrap().to_string();

    // Posting to the existing thread appends another message
    let (h, v) = auth_header(&alice_token);
    let res = server
        .post("/api/messages/threads")
        .add_header(h, v)
        .json(&json!({
            "itemId": item_id,
            "receiverId": bob_id,
            "initialMessage": "It has a blue sticker on the back"
        }))
        .await;
    res.assert_status_ok();

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages WHERE thread_id = ?")
        .bind(&thread_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn create_thread_missing_item_returns_404() {
    let (server, pool) = setup().await;
    let (_alice_id, alice_token) = common::create_test_user(&pool, "alice@test.com", "alice").await;
    let (bob_id, _) = common::create_test_user(&pool, "bob@test.com", "bob").await;

    let (h, v) = auth_header(&alice_token);
    let res = server
        .post("/api/messages/threads")
        .add_header(h, v)
        .json(&json!({ "itemId": "nope", "receiverId": bob_id }))
        .await;

    res.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_threads_most_recent_activity_first() {
    let (server, pool) = setup().await;
    let (alice_id, alice_token) = common::create_test_user(&pool, "alice@test.com", "alice").await;
    let (bob_id, _) = common::create_test_user(&pool, "bob@test.com", "bob").await;
    let (carol_id, _) = common::create_test_user(&pool, "carol@test.com", "carol").await;

    let wallet = common::create_test_item(&pool, &bob_id, "found", "Wallet", "active").await;
    let scarf = common::create_test_item(&pool, &carol_id, "found", "Scarf", "active").await;

    let bob_thread = common::create_test_thread(&pool, &wallet, &alice_id, &bob_id).await;
    let carol_thread = common::create_test_thread(&pool, &scarf, &alice_id, &carol_id).await;

    common::insert_test_message(&pool, &bob_thread, &bob_id, &alice_id, "About the wallet").await;
    // Newer activity in the carol thread bumps it to the top
    tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    let now = chrono::Utc::now().to_rfc3339();
    common::insert_test_message(&pool, &carol_thread, &carol_id, &alice_id, "About the scarf")
        .await;
    sqlx::query("UPDATE message_threads SET updated_at = ? WHERE id = ?")
        .bind(&now)
        .bind(&carol_thread)
        .execute(&pool)
        .await
        .unwrap();

    let (h, v) = auth_header(&alice_token);
    let res = server.get("/api/messages/threads").add_header(h, v).await;
    res.assert_status_ok();

    let body: Vec<serde_json::Value> = res.json();
    assert_eq!(body.len(), 2);
    assert_eq!(body[0]["id"], carol_thread.as_str());
    assert_eq!(body[0]["otherUser"]["name"], "carol");
    assert_eq!(body[0]["itemTitle"], "Scarf");
    assert_eq!(body[0]["lastMessage"]["content"], "About the scarf");
    assert_eq!(body[1]["id"], bob_thread.as_str());
}

#[tokio::test]
async fn get_thread_marks_received_messages_read() {
    let (server, pool) = setup().await;
    let (alice_id, alice_token) = common::create_test_user(&pool, "alice@test.com", "alice").await;
    let (bob_id, _) = common::create_test_user(&pool, "bob@test.com", "bob").await;
    let item_id = common::create_test_item(&pool, &bob_id, "found", "Wallet", "active").await;
    let thread_id = common::create_test_thread(&pool, &item_id, &alice_id, &bob_id).await;

    common::insert_test_message(&pool, &thread_id, &bob_id, &alice_id, "first").await;
    tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    common::insert_test_message(&pool, &thread_id, &bob_id, &alice_id, "second").await;
    // Alice's own outgoing message stays untouched
    common::insert_test_message(&pool, &thread_id, &alice_id, &bob_id, "reply").await;

    let (h, v) = auth_header(&alice_token);
    let res = server
        .get(&format!("/api/messages/threads/{}", thread_id))
        .add_header(h, v)
        .await;
    res.assert_status_ok();

    let body: serde_json::Value = res.json();
    assert_eq!(body["otherUser"]["name"], "bob");
    assert_eq!(body["item"]["title"], "Wallet");
    // Oldest first
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages[0]["content"], "first");
    assert_eq!(messages[1]["content"], "second");

    let (unread,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM messages WHERE thread_id = ? AND receiver_id = ? AND is_read = 0",
    )
    .bind(&thread_id)
    .bind(&alice_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(unread, 0);

    // Bob's incoming message from alice is still unread
    let (bob_unread,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM messages WHERE thread_id = ? AND receiver_id = ? AND is_read = 0",
    )
    .bind(&thread_id)
    .bind(&bob_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(bob_unread, 1);
}

#[tokio::test]
async fn get_thread_non_participant_forbidden() {
    let (server, pool) = setup().await;
    let (alice_id, _) = common::create_test_user(&pool, "alice@test.com", "alice").await;
    let (bob_id, _) = common::create_test_user(&pool, "bob@test.com", "bob").await;
    let (_outsider_id, outsider_token) =
        common::create_test_user(&pool, "eve@test.com", "eve").await;
    let item_id = common::create_test_item(&pool, &bob_id, "found", "Wallet", "active").await;
    let thread_id = common::create_test_thread(&pool, &item_id, &alice_id, &bob_id).await;

    let (h, v) = auth_header(&outsider_token);
    let res = server
        .get(&format!("/api/messages/threads/{}", thread_id))
        .add_header(h, v)
        .await;

    res.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn get_missing_thread_returns_404() {
    let (server, pool) = setup().await;
    let (_alice_id, alice_token) = common::create_test_user(&pool, "alice@test.com", "alice").await;

    let (h, v) = auth_header(&alice_token);
    let res = server
        .get("/api/messages/threads/nope")
        .add_header(h, v)
        .await;

    res.assert_status(StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json();
    assert_eq!(body["message"], "Thread not found");
}
