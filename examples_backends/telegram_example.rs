use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_telegram_sink::{
    env::config_from_env,
    init::{init_tracing_with_config, LayerConfig},
    telegram::TelegramHandler,
};

/// Example of posting application errors into a Telegram chat.
///
/// Expects `TELEGRAM_LOG_TOKEN` and `TELEGRAM_LOG_CHANNEL` in the
/// environment (see `tracing_telegram_sink::env` for the optional keys).
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config_from_env()?;
    let handler = TelegramHandler::from_config(config)?;
    handler.set_date_format("Y-m-d H:i:s T");

    init_tracing_with_config(
        Arc::new(handler),
        LayerConfig {
            min_level: tracing::Level::WARN,
            enable_stdout: true,
        },
    )?;

    info!("telegram example started");
    warn!(queue = "emails", depth = 1200, "queue is backing up");
    error!(severity = "critical", db = "orders", "primary database unreachable");

    // Deliveries run on spawned tasks; give them a moment before exiting.
    tokio::time::sleep(std::time::Duration::from_secs(3)).await;
    Ok(())
}
