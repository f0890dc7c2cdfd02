mod commands;
mod config;
mod constants;
mod dispatch;
mod export;
mod models;
mod schedule;
mod store;
mod transport;
mod utils;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::{
    commands::handle_message,
    config::BotConfig,
    constants::LOG_DIRECTIVE,
    export::NoopExporter,
    models::{Data, Error},
    schedule::JobRegistry,
    store::JsonStore,
    transport::{TelegramTransport, Transport},
};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    initialize_logging();

    // Load process configuration from environment
    let env = match load_configuration() {
        Ok(env) => env,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Using data directory: {}", env.data_dir.display());

    // Create config.json and database.json on first run
    let store = Arc::new(JsonStore::new(&env.data_dir));
    if let Err(e) = store.bootstrap(&env.default_config).await {
        error!("Failed to initialize data files: {}", e);
        std::process::exit(1);
    }

    // Telegram client, used both as the polling source and as the
    // delivery transport behind the Transport seam
    let telegram = match TelegramTransport::new(&env.token) {
        Ok(telegram) => Arc::new(telegram),
        Err(e) => {
            error!("Failed to build Telegram client: {}", e);
            std::process::exit(1);
        }
    };
    let transport: Arc<dyn Transport> = telegram.clone();

    // Start the scheduling engine from the stored configuration
    let registry = JobRegistry::new(store.clone(), transport.clone());
    match store.load_config().await {
        Ok(config) => {
            if let Err(e) = registry.resync(&config).await {
                error!("Failed to start scheduler: {}", e);
            }
        }
        Err(e) => error!("Failed to load configuration for scheduler: {}", e),
    }

    let data = Arc::new(Data::new(
        store,
        transport,
        registry,
        Arc::new(NoopExporter),
        env.data_dir,
    ));

    info!("Bot started");
    run_polling_loop(telegram, data).await;
}

/// Process configuration loaded from environment variables
struct EnvConfig {
    token: String,
    data_dir: PathBuf,
    default_config: BotConfig,
}

/// Initialize the logging system
fn initialize_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(LOG_DIRECTIVE.parse().expect("valid log directive")),
        )
        .init();
}

/// Load process configuration from environment variables
///
/// The default BotConfig built here is only written on first run; after
/// that, config.json is authoritative and edited via admin commands.
fn load_configuration() -> Result<EnvConfig, Error> {
    let token = std::env::var("TELEGRAM_BOT_TOKEN").map_err(|_| {
        "TELEGRAM_BOT_TOKEN environment variable not set. Set it with: export TELEGRAM_BOT_TOKEN=your_bot_token"
    })?;

    let data_dir = std::env::var("DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."));

    let admin_ids: Vec<i64> = std::env::var("ADMIN_IDS")
        .map(|raw| {
            raw.split(',')
                .filter_map(|id| id.trim().parse::<i64>().ok())
                .collect()
        })
        .unwrap_or_default();
    if admin_ids.is_empty() {
        warn!("No ADMIN_IDS configured; admin commands stay unavailable until config.json is edited");
    }

    let mut default_config = BotConfig::default();
    default_config.admin_ids = admin_ids;
    if let Ok(day) = std::env::var("WEBINAR_DAY") {
        default_config.webinar.day = day;
    }
    if let Ok(time) = std::env::var("WEBINAR_TIME") {
        default_config.webinar.time = time;
    }
    if let Ok(timezone) = std::env::var("WEBINAR_TIMEZONE") {
        default_config.webinar.timezone = timezone;
    }

    Ok(EnvConfig {
        token,
        data_dir,
        default_config,
    })
}

/// Long-poll Telegram for updates and route messages to command handlers
async fn run_polling_loop(api: Arc<TelegramTransport>, data: Arc<Data>) {
    let mut offset: Option<i64> = None;
    let mut backoff = Duration::from_secs(1);
    let max_backoff = Duration::from_secs(30);

    info!("Telegram polling loop started");

    loop {
        match api.get_updates(offset).await {
            Ok(updates) => {
                backoff = Duration::from_secs(1);
                for update in updates {
                    offset = Some(update.update_id + 1);
                    if let Some(msg) = update.message {
                        handle_message(&data, &msg).await;
                    }
                }
            }
            Err(e) => {
                warn!("getUpdates failed: {}; retrying in {:?}", e, backoff);
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(max_backoff);
            }
        }
    }
}
