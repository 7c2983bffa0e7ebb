//! `folio-bot` binary: long-polls Telegram and dispatches admin commands.

use folio_bot::{
    handle_update, AnalyticsMonitor, BotConfig, BotContext, TelegramClient,
    ANALYTICS_CHECK_INTERVAL, SESSION_SWEEP_INTERVAL,
};
use folio_flow::{InMemorySessions, SessionStore, INACTIVITY_WINDOW};
use folio_store::ContentStore;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = BotConfig::from_env()?;
    let client = TelegramClient::new(&config.telegram_token)?;
    let store = Arc::new(ContentStore::new(config.store.clone()));
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessions::new());

    let monitor = config.matomo.clone().map(|matomo| {
        AnalyticsMonitor::new(
            client.clone(),
            Arc::clone(&store),
            matomo,
            config.admin_chat_id,
        )
    });
    if let Some(monitor) = &monitor {
        monitor.start(ANALYTICS_CHECK_INTERVAL);
    } else {
        info!("analytics not configured; visit monitoring disabled");
    }

    let sweeper_sessions = Arc::clone(&sessions);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let swept = sweeper_sessions.sweep(INACTIVITY_WINDOW);
            if swept > 0 {
                info!(swept, "stale conversations dropped");
            }
        }
    });

    let ctx = BotContext {
        client: client.clone(),
        store,
        sessions,
        monitor,
        admin_chat_id: config.admin_chat_id,
    };

    info!(
        admin_chat = config.admin_chat_id,
        content = %ctx.store.content_path().display(),
        "folio-bot polling for updates"
    );

    let mut offset = None;
    loop {
        let updates = tokio::select! {
            result = client.get_updates(offset, config.poll_timeout_secs) => result,
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        };
        match updates {
            Ok(updates) => {
                for update in updates {
                    offset = Some(update.update_id + 1);
                    if let Err(err) = handle_update(&ctx, update).await {
                        warn!(error = %err, "update handling failed");
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "poll failed; backing off");
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            }
        }
    }

    if let Some(monitor) = &ctx.monitor {
        monitor.stop();
    }
    Ok(())
}
