//! Bot configuration
//!
//! Assembled from the environment once at startup and injected into the
//! runtime, so tests can construct configs directly without touching
//! process state.

use crate::error::BotError;
use folio_store::{StoreConfig, DEFAULT_RETENTION};
use std::env;
use std::time::Duration;

/// How often the analytics monitor polls for new visits
pub const ANALYTICS_CHECK_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// How often stale conversations are swept
pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Default long-poll timeout for `getUpdates`, in seconds
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 50;

/// Connection details for the Matomo analytics backend
#[derive(Debug, Clone)]
pub struct MatomoConfig {
    /// Base URL of the Matomo instance, without a trailing slash
    pub base_url: String,
    /// API auth token
    pub token: String,
    /// Site id within the Matomo instance
    pub site_id: String,
}

/// Everything the bot runtime needs
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot API token
    pub telegram_token: String,
    /// Chat id of the administrator; all other chats are ignored
    pub admin_chat_id: i64,
    /// Content and backup paths
    pub store: StoreConfig,
    /// Analytics backend, when configured
    pub matomo: Option<MatomoConfig>,
    /// Long-poll timeout for `getUpdates`, in seconds
    pub poll_timeout_secs: u64,
}

impl BotConfig {
    /// Read the configuration from the environment
    ///
    /// `TELEGRAM_BOT_TOKEN` and `ADMIN_CHAT_ID` are required. Analytics
    /// is enabled only when both `MATOMO_URL` and `MATOMO_TOKEN` are
    /// present.
    ///
    /// # Errors
    /// [`BotError::MissingEnv`] or [`BotError::InvalidEnv`] naming the
    /// offending variable.
    pub fn from_env() -> Result<Self, BotError> {
        let telegram_token = required("TELEGRAM_BOT_TOKEN")?;
        let admin_chat_id = required("ADMIN_CHAT_ID")?
            .parse()
            .map_err(|_| BotError::InvalidEnv("ADMIN_CHAT_ID"))?;

        let content_path =
            env::var("FOLIO_CONTENT_PATH").unwrap_or_else(|_| "content.json".to_string());
        let backup_dir =
            env::var("FOLIO_BACKUP_DIR").unwrap_or_else(|_| "content-backups".to_string());
        let retention = match env::var("FOLIO_BACKUP_RETENTION") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| BotError::InvalidEnv("FOLIO_BACKUP_RETENTION"))?,
            Err(_) => DEFAULT_RETENTION,
        };

        let matomo = match (env::var("MATOMO_URL"), env::var("MATOMO_TOKEN")) {
            (Ok(url), Ok(token)) => Some(MatomoConfig {
                base_url: url.trim_end_matches('/').to_string(),
                token,
                site_id: env::var("MATOMO_SITE_ID").unwrap_or_else(|_| "1".to_string()),
            }),
            _ => None,
        };

        let poll_timeout_secs = match env::var("FOLIO_POLL_TIMEOUT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| BotError::InvalidEnv("FOLIO_POLL_TIMEOUT"))?,
            Err(_) => DEFAULT_POLL_TIMEOUT_SECS,
        };

        Ok(Self {
            telegram_token,
            admin_chat_id,
            store: StoreConfig::new(content_path, backup_dir).with_retention(retention),
            matomo,
            poll_timeout_secs,
        })
    }
}

fn required(name: &'static str) -> Result<String, BotError> {
    env::var(name).map_err(|_| BotError::MissingEnv(name))
}
