use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use geofact::bot::LocationBot;
use geofact::config::GeofactConfig;
use geofact::facts::OpenAiFactClient;
use geofact::http::{AppState, HttpServer};
use geofact::ratelimit::{spawn_sweeper, ActivityTracker, RateLimiter};
use geofact::telegram::TelegramClient;

#[derive(Parser, Debug)]
#[command(name = "geofact")]
#[command(about = "Telegram bot that replies to shared locations with a nearby fact")]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the HTTP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Print the effective configuration (secrets redacted) and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    dotenvy::dotenv().ok();

    let mut config = GeofactConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.override_port(port)?;
    }

    if args.print_config {
        print!("{}", config.to_redacted_yaml()?);
        return Ok(());
    }

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.app.log_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true);
    if config.app.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("Starting Geofact location bot");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &args.config {
        info!(path = %path.display(), "Loaded configuration file");
    }
    info!(
        environment = %config.app.environment,
        port = config.server.port,
        "Configuration loaded"
    );

    if !config.has_telegram_token() {
        error!("TELEGRAM_BOT_TOKEN is not set");
    }
    if !config.has_openai_key() {
        error!("OPENAI_API_KEY is not set");
    }

    let rate = &config.rate_limiting;
    let limiter = Arc::new(RateLimiter::new(rate.requests, rate.period())?);
    let activity = Arc::new(ActivityTracker::new());
    info!(
        max_rate = limiter.max_rate(),
        window_secs = limiter.window().as_secs(),
        "Rate limiter initialized"
    );

    let (stop_sweeper, sweeper_stopped) = oneshot::channel::<()>();
    let sweeper = spawn_sweeper(
        Arc::clone(&limiter),
        Arc::clone(&activity),
        rate.cleanup_interval(),
        rate.active_user_ttl(),
        async move {
            let _ = sweeper_stopped.await;
        },
    );

    let telegram = Arc::new(TelegramClient::new(&config.telegram));
    let facts = Arc::new(OpenAiFactClient::new(config.openai.clone())?);
    let bot = Arc::new(LocationBot::new(limiter, activity, facts, telegram.clone()));

    match config.webhook_endpoint() {
        Some(endpoint) if config.has_telegram_token() => {
            if let Err(e) = telegram.set_webhook(&endpoint).await {
                error!(error = %e, "Failed to register webhook");
            }
        }
        Some(_) => warn!("Webhook URL set but bot token missing, skipping registration"),
        None => warn!("No webhook URL provided, bot will not receive updates"),
    }

    let config = Arc::new(config);
    let state = AppState {
        bot,
        telegram,
        config: Arc::clone(&config),
    };
    let server = HttpServer::bind(&config.server.host, config.server.port, state).await?;

    server.serve_with_shutdown(shutdown_signal()).await?;

    let _ = stop_sweeper.send(());
    if let Err(e) = sweeper.await {
        error!(error = %e, "Rate limit sweeper failed");
    }
    info!("Geofact location bot stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
