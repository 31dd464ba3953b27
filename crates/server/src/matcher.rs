use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the matching service sees of an item: public text fields plus the
/// reporter's email so a match can be routed back to both parties.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MatchCandidate {
    pub id: String,
    pub title: String,
    pub description: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
struct MatchRequest<'a> {
    new_item: &'a MatchCandidate,
    existing_items: &'a [MatchCandidate],
}

#[derive(Debug, Deserialize)]
pub struct MatchOutcome {
    pub match_found: bool,
    pub matched_item: Option<MatchedItem>,
}

#[derive(Debug, Deserialize)]
pub struct MatchedItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub email: String,
    pub location: Option<String>,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
}

#[derive(Clone)]
pub struct MatcherClient {
    http: reqwest::Client,
    url: String,
}

impl MatcherClient {
    pub fn new(url: String, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { http, url }
    }

    /// One attempt per item creation, no retry. Callers downgrade any failure
    /// to "no match" since matching is best-effort.
    pub async fn find_match(
        &self,
        new_item: &MatchCandidate,
        existing_items: &[MatchCandidate],
    ) -> Result<MatchOutcome, reqwest::Error> {
        let response = self
            .http
            .post(&self.url)
            .json(&MatchRequest {
                new_item,
                existing_items,
            })
            .send()
            .await?
            .error_for_status()?;

        response.json::<MatchOutcome>().await
    }
}
