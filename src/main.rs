//! Super-Scanner Live Backend
//!
//! Polls the Indodax summary feed, detects heuristic signal conditions, and
//! serves the most recent alerts over HTTP.

use clap::{Parser, Subcommand};
use std::cmp::Ordering;
use std::sync::Arc;
use super_scanner::{
    client::{IndodaxClient, MarketFeed},
    config::Config,
    engine::Scanner,
    news::DisabledNews,
    notify::Notifier,
    server,
    store::SignalStore,
    types::Snapshot,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "super-scanner")]
#[command(about = "Heuristic signal scanner for Indodax IDR markets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scanner and the signals API
    Run {
        /// Detect and store signals without delivering alerts
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the top admitted pairs by quote volume
    Pairs {
        /// Number of pairs to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Test Telegram notification
    TestNotify,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Run { dry_run } => run_scanner(config, dry_run).await,
        Commands::Pairs { limit } => show_pairs(config, limit).await,
        Commands::TestNotify => test_notify(config).await,
    }
}

async fn run_scanner(config: Config, dry_run: bool) -> anyhow::Result<()> {
    tracing::info!("starting Super-Scanner backend");

    if dry_run {
        tracing::warn!("running in DRY RUN mode - alerts will not be delivered");
    }

    let notifier = match &config.telegram {
        Some(telegram) if telegram.notify_signals => {
            Notifier::new(telegram.bot_token.clone(), telegram.chat_id.clone())
        }
        _ => {
            tracing::warn!("Telegram not configured, alert delivery disabled");
            Notifier::disabled()
        }
    };

    let notify_startup = config
        .telegram
        .as_ref()
        .map(|t| t.notify_startup)
        .unwrap_or(false);
    if notify_startup {
        if let Err(e) = notifier.startup(dry_run).await {
            tracing::warn!("failed to send startup notification: {e}");
        }
    }

    let store = Arc::new(SignalStore::new(config.scanner.max_signals));
    let client = Arc::new(IndodaxClient::new(&config.indodax)?);

    // The signals API runs beside the scanner; queries read a store
    // snapshot and never block the scan loop.
    let api_store = store.clone();
    let bind = config.server.bind.clone();
    tokio::spawn(async move {
        if let Err(e) = server::serve(api_store, &bind).await {
            tracing::error!("signals API server error: {e}");
        }
    });

    let scanner = Scanner::new(
        client,
        Arc::new(DisabledNews),
        notifier,
        store,
        config.scanner.clone(),
        dry_run,
    );
    scanner.run().await;

    Ok(())
}

async fn show_pairs(config: Config, limit: usize) -> anyhow::Result<()> {
    let client = IndodaxClient::new(&config.indodax)?;
    let tickers = client.fetch_summaries().await?;
    let now = chrono::Utc::now();

    let mut rows: Vec<(String, Snapshot)> = tickers
        .iter()
        .filter(|(pair, _)| pair.ends_with(&config.scanner.quote_suffix))
        .filter_map(|(pair, raw)| Snapshot::from_raw(raw, now).map(|s| (pair.clone(), s)))
        .filter(|(_, s)| s.quote_volume >= config.scanner.min_quote_volume)
        .collect();

    rows.sort_by(|a, b| {
        b.1.quote_volume
            .partial_cmp(&a.1.quote_volume)
            .unwrap_or(Ordering::Equal)
    });
    rows.truncate(limit);

    println!("\n📊 Top {} admitted pairs:\n", rows.len());
    println!("{:<16} {:>16} {:>20}", "Pair", "Last", "Quote Volume");
    println!("{}", "-".repeat(54));

    for (pair, snapshot) in rows {
        println!(
            "{:<16} {:>16.2} {:>20.0}",
            pair, snapshot.last_price, snapshot.quote_volume
        );
    }

    Ok(())
}

async fn test_notify(config: Config) -> anyhow::Result<()> {
    let telegram = config
        .telegram
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Telegram not configured in config.toml"))?;

    let notifier = Notifier::new(telegram.bot_token.clone(), telegram.chat_id.clone());
    notifier
        .send("🧪 <b>Test Notification</b>\n\nIf you see this, Telegram integration is working!")
        .await?;

    println!("✅ Test notification sent!");
    Ok(())
}
