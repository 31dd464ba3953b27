pub mod config;
pub mod db;
pub mod matcher;
pub mod middleware;
pub mod models;
pub mod notifier;
pub mod routes;

use config::Config;
use matcher::MatcherClient;
use notifier::Notifier;

pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub config: Config,
    pub matcher: MatcherClient,
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(db: sqlx::SqlitePool, config: Config) -> Self {
        let timeout = std::time::Duration::from_secs(config.upstream_timeout_secs);
        let matcher = MatcherClient::new(config.matcher_url.clone(), timeout);
        let notifier = Notifier::new(
            config.email_api_url.clone(),
            config.email_api_key.clone(),
            config.email_from.clone(),
            timeout,
        );
        Self {
            db,
            config,
            matcher,
            notifier,
        }
    }
}
