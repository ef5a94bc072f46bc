// ABOUTME: Entry point for the bookshelf binary.
// ABOUTME: Loads configuration, opens the story store once, serves HTTP, and closes the store on shutdown.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use bookshelf_server::{AppState, BookshelfConfig, create_router};
use bookshelf_store::{LocalImageStore, SqliteStoryStore, StoryStore};
use clap::Parser;

/// Story service for the bookshelf library site.
#[derive(Debug, Parser)]
#[command(name = "bookshelf", version, about)]
struct Cli {
    /// Socket address to bind (overrides BOOKSHELF_BIND).
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Data directory (overrides BOOKSHELF_HOME).
    #[arg(long)]
    home: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "bookshelf=info,bookshelf_server=info,bookshelf_store=info,tower_http=info".into()
            }),
        )
        .init();

    let cli = Cli::parse();
    let mut config = BookshelfConfig::from_env().context("invalid configuration")?;
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if let Some(home) = cli.home {
        config.home = home;
    }

    let db_path = config.database_path();
    let stories = Arc::new(
        SqliteStoryStore::open(&db_path)
            .with_context(|| format!("failed to open story database {}", db_path.display()))?,
    );
    let images = Arc::new(
        LocalImageStore::new(config.uploads_dir(), config.max_upload_bytes)
            .context("failed to prepare uploads directory")?,
    );

    let mut state = AppState::new(stories.clone(), images.clone())
        .with_max_upload_bytes(images.max_bytes());
    if let Some(url) = &config.public_base_url {
        state = state.with_public_base_url(url.as_str());
    }

    let app = create_router(Arc::new(state), Some(images.root().to_path_buf()));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(
        bind = %config.bind,
        database = %db_path.display(),
        "bookshelf listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    stories.close().await.context("failed to close story store")?;
    tracing::info!("bookshelf stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
