use serde::{Deserialize, Serialize};

use super::PublicUser;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MessageThread {
    pub id: String,
    pub item_id: String,
    pub participant1_id: String,
    pub participant2_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl MessageThread {
    pub fn is_participant(&self, user_id: &str) -> bool {
        self.participant1_id == user_id || self.participant2_id == user_id
    }

    /// The participant who isn't `user_id`.
    pub fn other_participant(&self, user_id: &str) -> &str {
        if self.participant1_id == user_id {
            &self.participant2_id
        } else {
            &self.participant1_id
        }
    }
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub id: String,
    pub title: String,
}

/// Thread list entry: the other participant plus the latest message only.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummary {
    pub id: String,
    pub other_user: PublicUser,
    pub item_id: String,
    pub item_title: String,
    pub last_message: Option<Message>,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadDetail {
    pub id: String,
    pub other_user: PublicUser,
    pub item: ItemSummary,
    pub messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateThreadRequest {
    pub item_id: String,
    pub receiver_id: String,
    pub initial_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest {
    pub thread_id: String,
    pub content: String,
    pub receiver_id: String,
}
