//! Telegram management bot for the portfolio content store
//!
//! Everything the administrator does goes through one chat: inspecting
//! and downloading content, creating and editing case studies through
//! guided conversations, browsing and restoring backups, and receiving
//! visit notifications from the analytics backend.
//!
//! - [`TelegramClient`]: the thin Bot API surface the bot actually uses
//! - [`commands`]: command parsing and dispatch against the store
//! - [`AnalyticsMonitor`]: the start/stop Matomo poll loop
//! - [`BotConfig`]: environment-derived runtime configuration

pub mod analytics;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod telegram;

pub use analytics::AnalyticsMonitor;
pub use commands::{handle_update, BotContext, Command};
pub use config::{BotConfig, MatomoConfig, ANALYTICS_CHECK_INTERVAL, SESSION_SWEEP_INTERVAL};
pub use error::BotError;
pub use telegram::TelegramClient;
