use serde::Serialize;
use std::time::Duration;

/// Fields of the counterpart item that go into a match email.
#[derive(Debug)]
pub struct MatchEmailItem<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub location: Option<&'a str>,
    pub image_url: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct EmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// Transactional email over an HTTP email API (Resend-compatible payload).
#[derive(Clone)]
pub struct Notifier {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl Notifier {
    pub fn new(api_url: String, api_key: String, from: String, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_url,
            api_key,
            from,
        }
    }

    /// Sends one email. Each send stands alone: the caller logs failures and
    /// carries on. An unset API key disables sending entirely.
    pub async fn send_match_notification(
        &self,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<(), reqwest::Error> {
        if self.api_key.is_empty() {
            tracing::debug!("EMAIL_API_KEY not configured, skipping send to {}", to);
            return Ok(());
        }

        self.http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&EmailRequest {
                from: &self.from,
                to: [to],
                subject,
                html,
            })
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

/// HTML body for a probable-match email, with a deep link back to the
/// counterpart item's detail page.
pub fn match_email_body(site_url: &str, intro: &str, item: &MatchEmailItem<'_>) -> String {
    let link = item_link(site_url, item.id);

    let mut html = String::new();
    html.push_str("<h2>We may have found a match!</h2>");
    html.push_str(&format!("<p>{}</p>", intro));
    html.push_str(&format!("<h3>{}</h3>", item.title));
    html.push_str(&format!("<p>{}</p>", item.description));
    if let Some(location) = item.location {
        html.push_str(&format!("<p><strong>Location:</strong> {}</p>", location));
    }
    if let Some(image_url) = item.image_url {
        html.push_str(&format!(
            "<p><img src=\"{}\" alt=\"{}\" style=\"max-width:400px\"></p>",
            image_url, item.title
        ));
    }
    html.push_str(&format!(
        "<p><a href=\"{}\">View the item and contact the reporter</a></p>",
        link
    ));
    html
}

fn item_link(site_url: &str, item_id: &str) -> String {
    url::Url::parse(site_url)
        .and_then(|base| base.join(&format!("/items/{}", item_id)))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("{}/items/{}", site_url.trim_end_matches('/'), item_id))
}
