mod item;
mod message;
mod user;

pub use item::*;
pub use message::*;
pub use user::*;

/// Verified identity supplied by the session extractor.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub email: String,
}
