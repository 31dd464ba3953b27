use serde::Serialize;

/// Public projection of a user. Never carries the email address.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
}
