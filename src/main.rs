use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use channel_job_watcher::config::Config;
use channel_job_watcher::notify::notifier_from_config;
use channel_job_watcher::pipeline::run_once;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    info!("Starting channel-job-watcher");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        channel = %config.channel_url,
        max_videos = config.max_videos,
        data_file = %config.data_file.display(),
        "Configuration loaded"
    );

    let notifier = notifier_from_config(&config).context("Failed to set up notifier")?;
    if config.telegram_bot_token.is_none() {
        info!("Telegram not configured - job alerts will only be logged");
    }

    let Some(interval) = config.poll_interval else {
        run_once(&config, notifier)
            .await
            .context("Channel scan failed")?;
        return Ok(());
    };

    info!(interval_secs = interval.as_secs(), "Watch mode enabled");

    loop {
        run_once(&config, notifier.clone())
            .await
            .context("Channel scan failed")?;

        tokio::select! {
            () = tokio::time::sleep(interval) => {},
            () = shutdown_signal() => {
                info!("Shutdown requested");
                return Ok(());
            }
        }
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,channel_job_watcher=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
