//! Casefile Engine - Main entry point.
//!
//! Opens a session for `<case_id> <player_id>` (defaults: `gallery_heist`
//! `detective`) and keeps its game clock running until Ctrl-C.

use casefile_domain::{CaseId, PlayerId};
use casefile_engine::stores::SessionKey;
use casefile_engine::{App, EngineConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root.
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "casefile_engine=debug,casefile_domain=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Casefile Engine");

    let config = EngineConfig::from_env();
    tracing::info!(
        cases_dir = %config.cases_dir.display(),
        data_dir = %config.data_dir.display(),
        tick_ms = config.tick_interval.as_millis() as u64,
        time_speed = config.time_speed,
        "Configuration loaded"
    );

    let mut args = std::env::args().skip(1);
    let case_id = CaseId::from(args.next().unwrap_or_else(|| "gallery_heist".into()));
    let player_id = PlayerId::from(args.next().unwrap_or_else(|| "detective".into()));
    let key = SessionKey {
        case_id: case_id.clone(),
        player_id: player_id.clone(),
    };

    let app = App::from_config(config);
    app.game.open_session(case_id, player_id).await?;

    let case = app.game.case(&key).await?;
    tracing::info!(
        case = %case.id(),
        title = case.title(),
        difficulty = case.metadata().difficulty.value(),
        estimated_minutes = case.metadata().estimated_time_minutes,
        evidence = case.evidence().len(),
        suspects = case.suspects().len(),
        "Case loaded"
    );

    let stats = app.game.stats(&key).await?;
    let files = app.game.accessible_files(&key).await?;
    tracing::info!(
        session = %key,
        evidence = %format!("{}/{}", stats.evidence_found, stats.total_evidence),
        score = stats.current_score,
        solved = stats.is_completed,
        files = files.len(),
        "Investigation ready"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    app.shutdown().await;

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
