use bpc_desk::{Registry, config, db, net::http};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Parser)]
#[command(version, about = "Corporation blueprint inventory and requisition backend")]
struct Args {
    /// TOML config file. Without it the config is read from the environment (and `.env`).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let cfg = match &args.config {
        Some(path) => config::Config::load(path)?,
        None => config::Config::from_env()?,
    };
    let cfg = Arc::new(cfg);
    init_tracing(cfg.environment.is_production());

    let db = Arc::new(db::Db::new(&cfg.database_url)?);
    db.init().await?;

    let shutdown = CancellationToken::new();
    let registry = Arc::new(Registry::new(db.clone(), cfg.clone(), shutdown.clone())?);
    registry.services.app_config.load_stored_identity().await?;

    let scheduler_jh = registry.take_scheduler().map(|scheduler| tokio::spawn(scheduler.run()));

    let addr: SocketAddr = cfg.http_addr.parse()?;
    let http_registry = registry.clone();
    let http_shutdown = shutdown.clone();
    let http_jh = tokio::spawn(async move {
        if let Err(e) = http::serve(addr, http_registry, http_shutdown.clone()).await {
            tracing::error!(error = %e, "http server error");
            http_shutdown.cancel();
        }
    });

    tokio::select! {
        _ = shutdown_signal() => tracing::info!("shutdown requested"),
        _ = shutdown.cancelled() => {}
    }
    shutdown.cancel();

    if let Err(e) = http_jh.await {
        tracing::error!(error = %e, "http task failed");
    }
    if let Some(jh) = scheduler_jh {
        if let Err(e) = jh.await {
            tracing::error!(error = %e, "scheduler task failed");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

fn init_tracing(production: bool) {
    use tracing_subscriber::{EnvFilter, prelude::*};

    color_eyre::install().unwrap();

    let default_level = if production { "info" } else { "debug" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::uptime()),
        )
        .with(tracing_error::ErrorLayer::default())
        .init();
}
