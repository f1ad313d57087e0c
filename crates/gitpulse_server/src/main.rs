//! gitpulse service binary.
//!
//! Wires the core library together: configuration, database, GitHub client,
//! ingestion pipeline, poll scheduler, and the HTTP query surface, with
//! graceful shutdown on ctrl-c.

mod config;
mod server;

use std::error::Error;
use std::time::Duration;

use gitpulse::github::GitHubClient;
use gitpulse::scheduler::PollScheduler;
use gitpulse::sync::SyncContext;
use gitpulse::{pipeline, shutdown};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::server::AppState;

/// How long shutdown waits for in-flight work to drain.
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::load();
    init_tracing(&config.log_level);

    let db = gitpulse::connect_and_migrate(&config.database_url()).await?;
    tracing::info!("database connected and migrated");

    let github = GitHubClient::new(&config.github_base_url, &config.github_token)?;
    let (shutdown_handle, shutdown) = shutdown::channel();

    let ctx = SyncContext { db, github };
    let scheduler = PollScheduler::new(ctx.clone(), shutdown.clone(), config.poll_config());
    let (pipeline, workers) = pipeline::spawn(
        ctx.clone(),
        scheduler.clone(),
        shutdown.clone(),
        config.initial_window()?,
    );

    // Bootstrap enrolment of the configured default repository.
    if let Some((owner, repo)) = config.bootstrap_repo() {
        tracing::info!(%owner, %repo, "bootstrapping default repository");
        pipeline.request_monitor(owner, repo).await?;
    }

    // First ctrl-c requests shutdown; everything selects on the signal.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            tracing::error!("failed to install ctrl-c handler");
            return;
        }
        tracing::info!("shutdown requested, draining");
        shutdown_handle.shutdown();
    });

    let app = server::router(AppState { ctx, pipeline });
    let listener = tokio::net::TcpListener::bind(&config.server_address).await?;
    tracing::info!(address = %config.server_address, "server listening");

    let graceful = {
        let shutdown = shutdown.clone();
        async move { shutdown.cancelled().await }
    };
    axum::serve(listener, app)
        .with_graceful_shutdown(graceful)
        .await?;

    // Stages drain in order behind their closed queues; bound the wait.
    let drain = async {
        for worker in workers {
            let _ = worker.await;
        }
    };
    if tokio::time::timeout(SHUTDOWN_DEADLINE, drain).await.is_err() {
        tracing::warn!("pipeline workers did not drain before the deadline");
    }
    scheduler.abort_all();

    tracing::info!("server exited");
    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
