use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use reclaim_shared::validation;

use crate::models::{
    AuthUser, CreateMessageRequest, CreateThreadRequest, ItemSummary, Message, MessageThread,
    PublicUser, ThreadDetail, ThreadSummary,
};
use crate::AppState;

/// GET /api/messages/threads
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> impl IntoResponse {
    let threads = sqlx::query_as::<_, MessageThread>(
        "SELECT * FROM message_threads
         WHERE participant1_id = ? OR participant2_id = ?
         ORDER BY updated_at DESC",
    )
    .bind(&user.id)
    .bind(&user.id)
    .fetch_all(&state.db)
    .await
    .unwrap_or_default();

    let mut result = Vec::new();
    for thread in threads {
        let other_id = thread.other_participant(&user.id).to_string();

        let other = sqlx::query_as::<_, PublicUser>(
            "SELECT id, name, image FROM users WHERE id = ?",
        )
        .bind(&other_id)
        .fetch_optional(&state.db)
        .await
        .ok()
        .flatten();

        let item = sqlx::query_as::<_, ItemSummary>("SELECT id, title FROM items WHERE id = ?")
            .bind(&thread.item_id)
            .fetch_optional(&state.db)
            .await
            .ok()
            .flatten();

        let last_message = sqlx::query_as::<_, Message>(
            "SELECT * FROM messages WHERE thread_id = ? ORDER BY created_at DESC LIMIT 1",
        )
        .bind(&thread.id)
        .fetch_optional(&state.db)
        .await
        .ok()
        .flatten();

        if let (Some(other_user), Some(item)) = (other, item) {
            result.push(ThreadSummary {
                id: thread.id,
                other_user,
                item_id: item.id,
                item_title: item.title,
                last_message,
                updated_at: thread.updated_at,
            });
        }
    }

    Json(result).into_response()
}

/// POST /api/messages/threads
///
/// Find-or-create: at most one thread per (item, unordered participant pair).
/// The unique constraint on message_threads backs this up under concurrency.
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(body): Json<CreateThreadRequest>,
) -> impl IntoResponse {
    if body.receiver_id == user.id {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"message": "Cannot start a thread with yourself"})),
        )
            .into_response();
    }

    let item_exists = sqlx::query_as::<_, (String,)>("SELECT id FROM items WHERE id = ?")
        .bind(&body.item_id)
        .fetch_optional(&state.db)
        .await
        .ok()
        .flatten();
    if item_exists.is_none() {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": "Item not found"})),
        )
            .into_response();
    }

    let receiver_exists = sqlx::query_as::<_, (String,)>("SELECT id FROM users WHERE id = ?")
        .bind(&body.receiver_id)
        .fetch_optional(&state.db)
        .await
        .ok()
        .flatten();
    if receiver_exists.is_none() {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": "User not found"})),
        )
            .into_response();
    }

    if let Some(content) = &body.initial_message {
        if let Err(e) = validation::validate_message_content(content) {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "message": "Invalid input data",
                    "errors": {"initialMessage": e}
                })),
            )
                .into_response();
        }
    }

    // Sort IDs for consistent storage
    let (id1, id2) = if user.id < body.receiver_id {
        (&user.id, &body.receiver_id)
    } else {
        (&body.receiver_id, &user.id)
    };

    let existing = sqlx::query_as::<_, MessageThread>(
        "SELECT * FROM message_threads
         WHERE item_id = ? AND participant1_id = ? AND participant2_id = ?",
    )
    .bind(&body.item_id)
    .bind(id1)
    .bind(id2)
    .fetch_optional(&state.db)
    .await
    .ok()
    .flatten();

    if let Some(thread) = existing {
        if let Some(content) = &body.initial_message {
            if let Err(err) =
                append_message(&state.db, &thread.id, &user.id, &body.receiver_id, content).await
            {
                tracing::error!("Error creating message: {}", err);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"message": "Error creating message thread"})),
                )
                    .into_response();
            }
        }
        return Json(thread).into_response();
    }

    let thread_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    // ON CONFLICT DO NOTHING plus the re-select below closes the race with a
    // concurrent create: whichever insert wins, both callers see one row.
    let inserted = sqlx::query(
        "INSERT INTO message_threads (id, item_id, participant1_id, participant2_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT (item_id, participant1_id, participant2_id) DO NOTHING",
    )
    .bind(&thread_id)
    .bind(&body.item_id)
    .bind(id1)
    .bind(id2)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await;

    if let Err(err) = inserted {
        tracing::error!("Error creating message thread: {}", err);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"message": "Error creating message thread"})),
        )
            .into_response();
    }

    let thread = sqlx::query_as::<_, MessageThread>(
        "SELECT * FROM message_threads
         WHERE item_id = ? AND participant1_id = ? AND participant2_id = ?",
    )
    .bind(&body.item_id)
    .bind(id1)
    .bind(id2)
    .fetch_optional(&state.db)
    .await
    .ok()
    .flatten();

    let thread = match thread {
        Some(t) => t,
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"message": "Error creating message thread"})),
            )
                .into_response()
        }
    };

    if let Some(content) = &body.initial_message {
        if let Err(err) =
            append_message(&state.db, &thread.id, &user.id, &body.receiver_id, content).await
        {
            tracing::error!("Error creating message: {}", err);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"message": "Error creating message thread"})),
            )
                .into_response();
        }
    }

    (StatusCode::CREATED, Json(thread)).into_response()
}

/// GET /api/messages/threads/{threadId}
///
/// Opening a thread marks every message addressed to the caller as read.
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(thread_id): Path<String>,
) -> impl IntoResponse {
    let thread = sqlx::query_as::<_, MessageThread>(
        "SELECT * FROM message_threads WHERE id = ?",
    )
    .bind(&thread_id)
    .fetch_optional(&state.db)
    .await
    .ok()
    .flatten();

    let thread = match thread {
        Some(t) => t,
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"message": "Thread not found"})),
            )
                .into_response()
        }
    };

    if !thread.is_participant(&user.id) {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"message": "You don't have permission to view this thread"})),
        )
            .into_response();
    }

    if let Err(err) = sqlx::query(
        "UPDATE messages SET is_read = 1 WHERE thread_id = ? AND receiver_id = ? AND is_read = 0",
    )
    .bind(&thread_id)
    .bind(&user.id)
    .execute(&state.db)
    .await
    {
        tracing::error!("Error marking messages read: {}", err);
    }

    let messages = sqlx::query_as::<_, Message>(
        "SELECT * FROM messages WHERE thread_id = ? ORDER BY created_at ASC",
    )
    .bind(&thread_id)
    .fetch_all(&state.db)
    .await
    .unwrap_or_default();

    let other = sqlx::query_as::<_, PublicUser>("SELECT id, name, image FROM users WHERE id = ?")
        .bind(thread.other_participant(&user.id))
        .fetch_optional(&state.db)
        .await
        .ok()
        .flatten();

    let item = sqlx::query_as::<_, ItemSummary>("SELECT id, title FROM items WHERE id = ?")
        .bind(&thread.item_id)
        .fetch_optional(&state.db)
        .await
        .ok()
        .flatten();

    match (other, item) {
        (Some(other_user), Some(item)) => Json(ThreadDetail {
            id: thread.id,
            other_user,
            item,
            messages,
        })
        .into_response(),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"message": "Error fetching message thread"})),
        )
            .into_response(),
    }
}

/// POST /api/messages
pub async fn create_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(body): Json<CreateMessageRequest>,
) -> impl IntoResponse {
    if let Err(e) = validation::validate_message_content(&body.content) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "message": "Invalid input data",
                "errors": {"content": e}
            })),
        )
            .into_response();
    }

    let thread = sqlx::query_as::<_, MessageThread>(
        "SELECT * FROM message_threads WHERE id = ?",
    )
    .bind(&body.thread_id)
    .fetch_optional(&state.db)
    .await
    .ok()
    .flatten();

    let thread = match thread {
        Some(t) => t,
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"message": "Thread not found"})),
            )
                .into_response()
        }
    };

    // Only the two participants may post, and the receiver must be the other
    // one.
    if !thread.is_participant(&user.id) {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"message": "You don't have permission to post in this thread"})),
        )
            .into_response();
    }
    if body.receiver_id != thread.other_participant(&user.id) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "message": "Invalid input data",
                "errors": {"receiverId": "Receiver must be the other thread participant"}
            })),
        )
            .into_response();
    }

    match append_message(&state.db, &body.thread_id, &user.id, &body.receiver_id, &body.content)
        .await
    {
        Ok(message) => (StatusCode::CREATED, Json(message)).into_response(),
        Err(err) => {
            tracing::error!("Error creating message: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"message": "Error creating message"})),
            )
                .into_response()
        }
    }
}

/// Inserts a message and touches the thread's updated_at, which orders the
/// thread list by last activity.
async fn append_message(
    db: &sqlx::SqlitePool,
    thread_id: &str,
    sender_id: &str,
    receiver_id: &str,
    content: &str,
) -> Result<Message, sqlx::Error> {
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
    .execute(db)
    .await?;

    sqlx::query("UPDATE message_threads SET updated_at = ? WHERE id = ?")
        .bind(&now)
        .bind(thread_id)
        .execute(db)
        .await?;

    Ok(Message {
        id: message_id,
        thread_id: thread_id.to_string(),
        sender_id: sender_id.to_string(),
        receiver_id: receiver_id.to_string(),
        content: content.to_string(),
        is_read: false,
        created_at: now.clone(),
        updated_at: now,
    })
}
