//! Big-Deal Bot - Headless Server
//!
//! Polls the exchange big-deal feed and forwards large trades to Telegram
//! subscribers.

mod config;

use bigdeal_alerts::{SubscriptionManager, TelegramBot, TelegramNotifier};
use bigdeal_core::{group_digits, DealFormatter};
use bigdeal_feeds::{BigDealFetcher, PollCycle};
use clap::Parser;
use config::{bot_token_from_env, AppConfig};
use std::sync::Arc;
use teloxide::Bot;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Big-Deal Bot CLI
#[derive(Parser, Debug)]
#[command(name = "bigdeal-bot")]
#[command(about = "Telegram alerts for large exchange trades", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Default minimum deal value to notify
    #[arg(short = 'm', long)]
    min_value: Option<i64>,

    /// Poll interval in milliseconds
    #[arg(short, long)]
    interval_ms: Option<u64>,

    /// Symbol to watch (e.g. BTCUSDT)
    #[arg(short, long)]
    symbol: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long)]
    log_level: Option<String>,
}

/// Command-line flags take precedence over the config file.
fn apply_args(config: &mut AppConfig, args: &Args) {
    if let Some(min_value) = args.min_value {
        config.poll.default_threshold = min_value;
    }
    if let Some(interval_ms) = args.interval_ms {
        config.poll.interval_ms = interval_ms;
    }
    if let Some(symbol) = &args.symbol {
        config.feed.symbol = symbol.to_uppercase();
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let mut config = match AppConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {}", args.config, e);
            std::process::exit(1);
        }
    };
    apply_args(&mut config, &args);

    init_logging(&config.log_level);

    if let Err(e) = config.validate() {
        error!("{}", e);
        return;
    }

    let token = match bot_token_from_env() {
        Ok(token) => token,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };

    info!("🚀 Big-Deal Bot starting...");
    info!("  Feed: {}", config.feed.url());
    info!("  Poll Interval: {} ms", config.poll.interval_ms);
    info!("  Default Min Value: $ {}", group_digits(config.poll.default_threshold));

    let fetcher = match BigDealFetcher::new(config.feed.clone()) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!("Failed to create feed client: {}", e);
            return;
        }
    };

    let bot = Bot::new(token);
    let cycle = PollCycle::new(Arc::new(fetcher), DealFormatter::local());
    let notifier = Arc::new(TelegramNotifier::new(bot.clone()));
    let manager = Arc::new(SubscriptionManager::new(cycle, notifier, config.poll.clone()));
    let telegram = Arc::new(TelegramBot::new(bot, Arc::clone(&manager)));

    info!("Press Ctrl+C to stop...");
    telegram.run().await;

    warn!("Shutdown signal received");
    let stopped = manager.shutdown().await;
    info!("  Stopped {} subscriptions", stopped);

    info!("👋 Big-Deal Bot stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_apply_args_overrides_config() {
        let args = Args::parse_from([
            "bigdeal-bot",
            "--min-value",
            "1000000",
            "--interval-ms",
            "250",
            "--symbol",
            "ethusdt",
            "--log-level",
            "debug",
        ]);
        let mut config = AppConfig::default();
        apply_args(&mut config, &args);

        assert_eq!(config.poll.default_threshold, 1_000_000);
        assert_eq!(config.poll.interval_ms, 250);
        assert_eq!(config.feed.symbol, "ETHUSDT");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_apply_args_keeps_file_values() {
        let args = Args::parse_from(["bigdeal-bot"]);
        let mut config = AppConfig::default();
        config.poll.interval_ms = 3000;
        apply_args(&mut config, &args);

        assert_eq!(args.config, "config.json");
        assert_eq!(config.poll.interval_ms, 3000);
        assert_eq!(config.poll.default_threshold, 500_000);
    }
}
