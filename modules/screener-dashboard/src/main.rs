use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use screener_client::{
    HistoryQuery, KlineType, NotificationLog, ScreenerClient, SignalStatus, DEFAULT_KLINE_DAYS,
};
use screener_dashboard::{
    connect, Config, DashboardStore, Document, LoadOutcome, Page, PageScope, Router,
};

#[derive(Parser)]
#[command(name = "screener-dash", about = "Terminal front end for the A-share screener dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Navigate to a dashboard path (e.g. /signals, /stock/600519) and print the page data
    Open { path: String },
    /// Ask the backend to run a scan now
    Trigger {
        #[arg(value_enum)]
        scan: ScanKind,
    },
    /// Weekend scan history
    History {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        size: u32,
    },
    /// Show one signal
    Signal { id: i64 },
    /// Set a signal's status (PENDING, CONFIRMED, INVALID, ...)
    SetStatus {
        id: i64,
        status: String,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Backend health snapshot
    Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScanKind {
    Weekend,
    Daily,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("screener=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let notifications = Arc::new(NotificationLog::new());
    let client = Arc::new(
        connect(&config, notifications.clone()).context("Failed to build the API client")?,
    );
    let store = DashboardStore::new(client.clone());

    let result = run(cli.command, &client, &store).await;

    for n in notifications.drain() {
        eprintln!("[{}] {}", n.raised_at.to_rfc3339(), n.message);
    }
    result
}

async fn run(command: Command, client: &ScreenerClient, store: &DashboardStore) -> Result<()> {
    match command {
        Command::Open { path } => open(&path, client, store).await,
        Command::Trigger { scan: ScanKind::Weekend } => {
            print_json(&client.trigger_weekend_scan().await?)
        }
        Command::Trigger { scan: ScanKind::Daily } => print_json(&client.trigger_daily_scan().await?),
        Command::History { page, size } => {
            print_json(&client.weekend_scan_history(HistoryQuery { page, size }).await?)
        }
        Command::Signal { id } => print_json(&client.signal(id).await?),
        Command::SetStatus { id, status, note } => {
            let status = SignalStatus::from(status);

            store.fetch_pending_signals(&PageScope::new()).await;
            if !store.update_signal_status(id, status.clone()) {
                info!(signal_id = id, "Signal not in the pending list; sending the update anyway");
            }

            let ack = client.update_signal_status(id, status, &note).await?;
            print_json(&ack)
        }
        Command::Status => {
            store.fetch_system_status(&PageScope::new()).await;
            print_json(&store.snapshot().system_status)
        }
    }
}

async fn open(path: &str, client: &ScreenerClient, store: &DashboardStore) -> Result<()> {
    let document = Arc::new(Document::new());
    let router = Router::new(document.clone());
    let nav = router.navigate(path)?;
    println!("{}", document.title());

    let scope = &nav.scope;
    match nav.route.page {
        Page::WeekendScan => {
            report(path, store.fetch_weekend_scan(scope).await);
            print_json(&store.snapshot().weekend_scan_results)
        }
        Page::DailyPool => {
            report(path, store.fetch_daily_pool(scope).await);
            print_json(&store.snapshot().daily_pool_results)
        }
        Page::Signals => {
            report(path, store.fetch_pending_signals(scope).await);
            print_json(&store.snapshot().trade_signals)
        }
        Page::StockDetail { code } => {
            let (detail, klines) = tokio::join!(
                client.stock_detail(&code),
                client.stock_klines(&code, KlineType::Daily, DEFAULT_KLINE_DAYS),
            );
            print_json(&serde_json::json!({ "detail": detail?, "klines": klines? }))
        }
    }
}

fn report(path: &str, outcome: LoadOutcome) {
    if outcome != LoadOutcome::Applied {
        warn!(path, outcome = ?outcome, "Page data not refreshed; showing the previous state");
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
