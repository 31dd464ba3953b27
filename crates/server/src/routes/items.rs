use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use reclaim_shared::constants::{ITEM_STATUS_RESOLVED, ITEM_TYPE_FOUND, ITEM_TYPE_LOST};
use reclaim_shared::validation;

use crate::matcher::MatchCandidate;
use crate::models::{
    AuthUser, CreateItemRequest, ItemListQuery, ItemResponse, ItemWithUserRow, UpdateItemRequest,
};
use crate::notifier::{match_email_body, MatchEmailItem};
use crate::AppState;

const ITEM_WITH_USER: &str = "SELECT i.id, i.title, i.description, i.category, i.type, \
     i.location, i.date, i.image_url, i.status, i.user_id, i.created_at, i.updated_at, \
     u.name AS user_name, u.image AS user_image \
     FROM items i JOIN users u ON u.id = i.user_id";

/// GET /api/items
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ItemListQuery>,
) -> impl IntoResponse {
    let mut sql = String::from(ITEM_WITH_USER);
    let mut clauses = Vec::new();
    if query.item_type.is_some() {
        clauses.push("i.type = ?");
    }
    if query.category.is_some() {
        clauses.push("i.category = ?");
    }
    if query.status.is_some() {
        clauses.push("i.status = ?");
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY i.created_at DESC");

    let mut q = sqlx::query_as::<_, ItemWithUserRow>(&sql);
    if let Some(t) = &query.item_type {
        q = q.bind(t);
    }
    if let Some(c) = &query.category {
        q = q.bind(c);
    }
    if let Some(s) = &query.status {
        q = q.bind(s);
    }

    match q.fetch_all(&state.db).await {
        Ok(rows) => Json(
            rows.into_iter()
                .map(ItemResponse::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(err) => {
            tracing::error!("Error fetching items: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"message": "Error fetching items"})),
            )
                .into_response()
        }
    }
}

/// GET /api/items/user
pub async fn list_user_items(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> impl IntoResponse {
    let sql = format!("{} WHERE i.user_id = ? ORDER BY i.created_at DESC", ITEM_WITH_USER);
    match sqlx::query_as::<_, ItemWithUserRow>(&sql)
        .bind(&user.id)
        .fetch_all(&state.db)
        .await
    {
        Ok(rows) => Json(
            rows.into_iter()
                .map(ItemResponse::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(err) => {
            tracing::error!("Error fetching user items: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"message": "Error fetching user items"})),
            )
                .into_response()
        }
    }
}

/// GET /api/items/{itemId}
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
) -> impl IntoResponse {
    match fetch_item_with_user(&state.db, &item_id).await {
        Ok(Some(item)) => Json(item).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": "Item not found"})),
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Error fetching item: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"message": "Error fetching item"})),
            )
                .into_response()
        }
    }
}

/// POST /api/items
///
/// Creates the report, then runs the best-effort match-and-notify flow.
/// Matching or email failures never fail the creation: the report is already
/// durable by the time either runs.
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(body): Json<CreateItemRequest>,
) -> impl IntoResponse {
    let mut errors = serde_json::Map::new();
    if let Err(e) = validation::validate_title(&body.title) {
        errors.insert("title".into(), e.into());
    }
    if let Err(e) = validation::validate_description(&body.description) {
        errors.insert("description".into(), e.into());
    }
    if let Err(e) = validation::validate_category(&body.category) {
        errors.insert("category".into(), e.into());
    }
    if let Err(e) = validation::validate_item_type(&body.item_type) {
        errors.insert("type".into(), e.into());
    }
    if let Some(location) = &body.location {
        if let Err(e) = validation::validate_location(location) {
            errors.insert("location".into(), e.into());
        }
    }
    if !errors.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"message": "Invalid input data", "errors": errors})),
        )
            .into_response();
    }

    let item_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    // Status starts active and the owner comes from the session, never from
    // the payload.
    let inserted = sqlx::query(
        "INSERT INTO items (id, title, description, category, type, location, date, image_url, status, user_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'active', ?, ?, ?)",
    )
    .bind(&item_id)
    .bind(&body.title)
    .bind(&body.description)
    .bind(&body.category)
    .bind(&body.item_type)
    .bind(&body.location)
    .bind(&body.date)
    .bind(&body.image_url)
    .bind(&user.id)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await;

    if let Err(err) = inserted {
        tracing::error!("Error creating item: {}", err);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"message": "Error creating item"})),
        )
            .into_response();
    }

    let item = match fetch_item_with_user(&state.db, &item_id).await {
        Ok(Some(item)) => item,
        _ => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"message": "Error creating item"})),
            )
                .into_response()
        }
    };

    run_match_flow(&state, &item, &user.email).await;

    (StatusCode::CREATED, Json(item)).into_response()
}

/// PATCH /api/items/{itemId}
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(item_id): Path<String>,
    Json(body): Json<UpdateItemRequest>,
) -> impl IntoResponse {
    // Existence before ownership, so the error messages stay distinct
    let owner = sqlx::query_as::<_, (String,)>("SELECT user_id FROM items WHERE id = ?")
        .bind(&item_id)
        .fetch_optional(&state.db)
        .await
        .ok()
        .flatten();

    let (owner_id,) = match owner {
        Some(o) => o,
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"message": "Item not found"})),
            )
                .into_response()
        }
    };

    if owner_id != user.id {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"message": "You don't have permission to update this item"})),
        )
            .into_response();
    }

    let mut errors = serde_json::Map::new();
    if let Some(title) = &body.title {
        if let Err(e) = validation::validate_title(title) {
            errors.insert("title".into(), e.into());
        }
    }
    if let Some(description) = &body.description {
        if let Err(e) = validation::validate_description(description) {
            errors.insert("description".into(), e.into());
        }
    }
    if let Some(category) = &body.category {
        if let Err(e) = validation::validate_category(category) {
            errors.insert("category".into(), e.into());
        }
    }
    if let Some(item_type) = &body.item_type {
        if let Err(e) = validation::validate_item_type(item_type) {
            errors.insert("type".into(), e.into());
        }
    }
    if let Some(location) = &body.location {
        if let Err(e) = validation::validate_location(location) {
            errors.insert("location".into(), e.into());
        }
    }
    // The only legal status transition is active -> resolved
    if let Some(status) = &body.status {
        if status != ITEM_STATUS_RESOLVED {
            errors.insert(
                "status".into(),
                "Status can only change from active to resolved".into(),
            );
        }
    }
    if !errors.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"message": "Invalid input data", "errors": errors})),
        )
            .into_response();
    }

    let now = chrono::Utc::now().to_rfc3339();
    let mut sets = Vec::new();
    if body.title.is_some() {
        sets.push("title = ?");
    }
    if body.description.is_some() {
        sets.push("description = ?");
    }
    if body.category.is_some() {
        sets.push("category = ?");
    }
    if body.item_type.is_some() {
        sets.push("type = ?");
    }
    if body.location.is_some() {
        sets.push("location = ?");
    }
    if body.date.is_some() {
        sets.push("date = ?");
    }
    if body.image_url.is_some() {
        sets.push("image_url = ?");
    }
    if body.status.is_some() {
        sets.push("status = ?");
    }
    sets.push("updated_at = ?");

    let sql = format!("UPDATE items SET {} WHERE id = ?", sets.join(", "));
    let mut q = sqlx::query(&sql);
    if let Some(v) = &body.title {
        q = q.bind(v);
    }
    if let Some(v) = &body.description {
        q = q.bind(v);
    }
    if let Some(v) = &body.category {
        q = q.bind(v);
    }
    if let Some(v) = &body.item_type {
        q = q.bind(v);
    }
    if let Some(v) = &body.location {
        q = q.bind(v);
    }
    if let Some(v) = &body.date {
        q = q.bind(v);
    }
    if let Some(v) = &body.image_url {
        q = q.bind(v);
    }
    if let Some(v) = &body.status {
        q = q.bind(v);
    }
    q = q.bind(&now).bind(&item_id);

    if let Err(err) = q.execute(&state.db).await {
        tracing::error!("Error updating item: {}", err);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"message": "Error updating item"})),
        )
            .into_response();
    }

    match fetch_item_with_user(&state.db, &item_id).await {
        Ok(Some(item)) => Json(item).into_response(),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"message": "Error updating item"})),
        )
            .into_response(),
    }
}

/// DELETE /api/items/{itemId}
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(item_id): Path<String>,
) -> impl IntoResponse {
    let owner = sqlx::query_as::<_, (String,)>("SELECT user_id FROM items WHERE id = ?")
        .bind(&item_id)
        .fetch_optional(&state.db)
        .await
        .ok()
        .flatten();

    let (owner_id,) = match owner {
        Some(o) => o,
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"message": "Item not found"})),
            )
                .into_response()
        }
    };

    if owner_id != user.id {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"message": "You don't have permission to delete this item"})),
        )
            .into_response();
    }

    if let Err(err) = sqlx::query("DELETE FROM items WHERE id = ?")
        .bind(&item_id)
        .execute(&state.db)
        .await
    {
        tracing::error!("Error deleting item: {}", err);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"message": "Error deleting item"})),
        )
            .into_response();
    }

    Json(serde_json::json!({"message": "Item deleted successfully"})).into_response()
}

async fn fetch_item_with_user(
    db: &sqlx::SqlitePool,
    item_id: &str,
) -> Result<Option<ItemResponse>, sqlx::Error> {
    let sql = format!("{} WHERE i.id = ?", ITEM_WITH_USER);
    let row = sqlx::query_as::<_, ItemWithUserRow>(&sql)
        .bind(item_id)
        .fetch_optional(db)
        .await?;
    Ok(row.map(ItemResponse::from))
}

/// Best-effort matching: one matcher call, then one email to each reporter.
/// Every failure is logged and swallowed so the creation response is never
/// affected.
async fn run_match_flow(state: &AppState, item: &ItemResponse, reporter_email: &str) {
    let opposite_type = if item.item_type == ITEM_TYPE_LOST {
        ITEM_TYPE_FOUND
    } else {
        ITEM_TYPE_LOST
    };

    let candidates = match sqlx::query_as::<_, MatchCandidate>(
        "SELECT i.id, i.title, i.description, u.email
         FROM items i JOIN users u ON u.id = i.user_id
         WHERE i.type = ? AND i.status = 'active'",
    )
    .bind(opposite_type)
    .fetch_all(&state.db)
    .await
    {
        Ok(c) => c,
        Err(err) => {
            tracing::warn!("Skipping match for item {}: {}", item.id, err);
            return;
        }
    };

    let new_item = MatchCandidate {
        id: item.id.clone(),
        title: item.title.clone(),
        description: item.description.clone(),
        email: reporter_email.to_string(),
    };

    let outcome = match state.matcher.find_match(&new_item, &candidates).await {
        Ok(o) => o,
        Err(err) => {
            tracing::warn!("Matcher request failed for item {}: {}", item.id, err);
            return;
        }
    };

    if !outcome.match_found {
        return;
    }
    let matched = match outcome.matched_item {
        Some(m) => m,
        None => {
            tracing::warn!("Matcher reported a match without an item for {}", item.id);
            return;
        }
    };

    tracing::info!("Match found for item {}: {}", item.id, matched.id);

    // Two independent sends. One failing must not stop the other.
    let to_reporter = match_email_body(
        &state.config.site_url,
        &format!(
            "Someone reported a {} item that looks like a match for \"{}\".",
            opposite_type, item.title
        ),
        &MatchEmailItem {
            id: &matched.id,
            title: &matched.title,
            description: &matched.description,
            location: matched.location.as_deref(),
            image_url: matched.image_url.as_deref(),
        },
    );
    if let Err(err) = state
        .notifier
        .send_match_notification(
            reporter_email,
            &format!("Possible match for \"{}\"", item.title),
            &to_reporter,
        )
        .await
    {
        tracing::warn!("Match email to {} failed: {}", reporter_email, err);
    }

    let to_matched = match_email_body(
        &state.config.site_url,
        &format!(
            "A newly reported {} item looks like a match for \"{}\".",
            item.item_type, matched.title
        ),
        &MatchEmailItem {
            id: &item.id,
            title: &item.title,
            description: &item.description,
            location: item.location.as_deref(),
            image_url: item.image_url.as_deref(),
        },
    );
    if let Err(err) = state
        .notifier
        .send_match_notification(
            &matched.email,
            &format!("Possible match for \"{}\"", matched.title),
            &to_matched,
        )
        .await
    {
        tracing::warn!("Match email to {} failed: {}", matched.email, err);
    }
}
