use serde::{Deserialize, Serialize};

use super::PublicUser;

/// Item row joined with its owner's public fields.
#[derive(Debug, sqlx::FromRow)]
pub struct ItemWithUserRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    #[sqlx(rename = "type")]
    pub item_type: String,
    pub location: Option<String>,
    pub date: Option<String>,
    pub image_url: Option<String>,
    pub status: String,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
    pub user_name: String,
    pub user_image: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub location: Option<String>,
    pub date: Option<String>,
    pub image_url: Option<String>,
    pub status: String,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
    pub user: PublicUser,
}

impl From<ItemWithUserRow> for ItemResponse {
    fn from(row: ItemWithUserRow) -> Self {
        Self {
            user: PublicUser {
                id: row.user_id.clone(),
                name: row.user_name,
                image: row.user_image,
            },
            id: row.id,
            title: row.title,
            description: row.description,
            category: row.category,
            item_type: row.item_type,
            location: row.location,
            date: row.date,
            image_url: row.image_url,
            status: row.status,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Creation payload. Status and owner are never taken from the client.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub location: Option<String>,
    pub date: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    pub image_url: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ItemListQuery {
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}
