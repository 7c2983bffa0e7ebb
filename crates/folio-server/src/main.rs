//! `folio-server` binary: serves the content and session APIs.

use anyhow::Context;
use clap::{value_parser, Arg, Command};
use folio_server::{router, AppState, ServerConfig};
use folio_store::{StoreConfig, DEFAULT_RETENTION};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Command::new("folio-server")
        .version("0.1.0")
        .about("Portfolio content and session API")
        .arg(
            Arg::new("bind")
                .long("bind")
                .env("FOLIO_BIND")
                .default_value("127.0.0.1:3001")
                .value_parser(value_parser!(SocketAddr))
                .help("Address to listen on"),
        )
        .arg(
            Arg::new("content")
                .long("content")
                .env("FOLIO_CONTENT_PATH")
                .default_value("content.json")
                .value_parser(value_parser!(PathBuf))
                .help("Path of the content JSON file"),
        )
        .arg(
            Arg::new("backups")
                .long("backups")
                .env("FOLIO_BACKUP_DIR")
                .default_value("content-backups")
                .value_parser(value_parser!(PathBuf))
                .help("Directory for rotating snapshots"),
        )
        .arg(
            Arg::new("retention")
                .long("retention")
                .env("FOLIO_BACKUP_RETENTION")
                .default_value("10")
                .value_parser(value_parser!(usize))
                .help("Snapshots kept after each backup"),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .env("FOLIO_ADMIN_TOKEN")
                .required(true)
                .help("Bearer token guarding the /content routes"),
        )
        .get_matches();

    let bind = *cli.get_one::<SocketAddr>("bind").expect("has default");
    let content_path = cli.get_one::<PathBuf>("content").expect("has default");
    let backup_dir = cli.get_one::<PathBuf>("backups").expect("has default");
    let retention = *cli
        .get_one::<usize>("retention")
        .unwrap_or(&DEFAULT_RETENTION);
    let admin_token = cli.get_one::<String>("token").expect("required").clone();

    let config = ServerConfig {
        bind,
        admin_token,
        store: StoreConfig::new(content_path, backup_dir).with_retention(retention),
    };

    let app = router(AppState::new(&config));
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!(bind = %config.bind, content = %config.store.content_path.display(), "folio-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
        .context("server error")?;
    Ok(())
}
