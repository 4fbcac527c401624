use std::io;
use std::sync::Arc;

use apt_transport_git_lfs::app::{FetchOrchestrator, RepositoryCache};
use apt_transport_git_lfs::config::MethodConfig;
use apt_transport_git_lfs::infra::command::{CommandExecutor, RealCommandRunner};
use apt_transport_git_lfs::runtime::MethodEngine;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> io::Result<()> {
    let config = MethodConfig::from_env();
    // Stdout carries the protocol, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .init();

    let executor = CommandExecutor::new(Arc::new(RealCommandRunner));
    let orchestrator = FetchOrchestrator::new(executor, RepositoryCache::new(config.cache_root));
    let mut engine = MethodEngine::start(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        orchestrator,
    )
    .await?;

    tokio::select! {
        result = engine.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, exiting");

            Ok(())
        }
    }
}
