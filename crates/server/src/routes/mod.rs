pub mod items;
pub mod messages;

use crate::AppState;
use axum::{routing::{get, post, patch, delete}, Router};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Items
        .route("/items", get(items::list_items))
        .route("/items", post(items::create_item))
        .route("/items/user", get(items::list_user_items))
        .route("/items/{itemId}", get(items::get_item))
        .route("/items/{itemId}", patch(items::update_item))
        .route("/items/{itemId}", delete(items::delete_item))
        // Messages
        .route("/messages", post(messages::create_message))
        .route("/messages/threads", get(messages::list_threads))
        .route("/messages/threads", post(messages::create_thread))
        .route("/messages/threads/{threadId}", get(messages::get_thread));

    Router::new().nest("/api", api_routes).with_state(state)
}
