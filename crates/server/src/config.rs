use std::env;

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub matcher_url: String,
    pub email_api_url: String,
    pub email_api_key: String,
    pub email_from: String,
    pub site_url: String,
    pub upstream_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3001),
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "./reclaim.db".into()),
            matcher_url: env::var("MATCHER_URL")
                .unwrap_or_else(|_| "http://localhost:8000/match".into()),
            email_api_url: env::var("EMAIL_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com/emails".into()),
            // Empty key disables outbound email
            email_api_key: env::var("EMAIL_API_KEY").unwrap_or_default(),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "Reclaim <noreply@reclaim.example>".into()),
            site_url: env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:3000".into()),
            upstream_timeout_secs: env::var("UPSTREAM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
        }
    }
}
