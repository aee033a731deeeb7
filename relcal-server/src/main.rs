//! relcal-server - Release calendar and LTTD compliance service
//!
//! HTTP service for the internal release dashboard: release bookings
//! with conflict detection and readiness checklists, calendar/dashboard
//! render models, and the LTTD metrics pipeline with email notification.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use relcal_common::config::{resolve_root_folder, UpstreamConfig};
use relcal_server::{build_router, db, snapshot, AppState};

const DEFAULT_PORT: u16 = 8200;

#[derive(Debug, Parser)]
#[command(name = "relcal-server", about = "Release calendar service")]
struct Args {
    /// Root folder for the database and snapshot cache
    #[arg(long)]
    root_folder: Option<String>,

    /// Listen port
    #[arg(long, env = "RELCAL_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Build identification immediately after tracing init, before any
    // filesystem or database delays.
    info!(
        "Starting relcal-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), "RELCAL_ROOT_FOLDER")?;
    std::fs::create_dir_all(&root_folder)?;
    info!("Root folder: {}", root_folder.display());

    let db_path = root_folder.join("relcal.db");
    let pool = db::connect(&db_path).await?;
    info!("✓ Connected to database at {}", db_path.display());

    // Reconcile the JSON snapshot cache against the database before
    // serving anything.
    let snapshot_path = snapshot::snapshot_path(&root_folder);
    snapshot::reconcile(&pool, &snapshot_path).await?;

    let upstream = UpstreamConfig::from_env();
    let state = AppState::new(pool, snapshot_path, upstream);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", args.port)).await?;
    info!("relcal-server listening on http://127.0.0.1:{}", args.port);
    info!("Health check: http://127.0.0.1:{}/health", args.port);

    axum::serve(listener, app).await?;

    Ok(())
}
