use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::models::AuthUser;
use crate::AppState;

/// Session issuance lives in the auth service. This extractor only resolves
/// an existing session token to a verified user.
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token_from_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.to_string());

        let token_from_cookie = parts
            .headers
            .get("cookie")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .split(';')
            .filter_map(|c| {
                let c = c.trim();
                if c.starts_with("session_token=") {
                    Some(c.trim_start_matches("session_token=").to_string())
                } else {
                    None
                }
            })
            .next();

        let token = match token_from_header.or(token_from_cookie) {
            Some(t) if !t.is_empty() => t,
            _ => {
                return Err((
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({"message": "Unauthorized"})),
                )
                    .into_response())
            }
        };

        let row = sqlx::query_as::<_, (String, String, String, String)>(
            "SELECT u.id, u.name, u.email, s.expires_at
             FROM sessions s
             JOIN users u ON u.id = s.user_id
             WHERE s.token = ?",
        )
        .bind(&token)
        .fetch_optional(&state.db)
        .await
        .map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"message": "Error verifying session"})),
            )
                .into_response()
        })?;

        let (user_id, name, email, expires_at) = match row {
            Some(r) => r,
            None => {
                return Err((
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({"message": "Unauthorized"})),
                )
                    .into_response())
            }
        };

        let now = chrono::Utc::now().to_rfc3339();
        if expires_at < now {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"message": "Unauthorized"})),
            )
                .into_response());
        }

        Ok(AuthUser {
            id: user_id,
            name,
            email,
        })
    }
}
