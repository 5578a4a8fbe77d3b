//! Mara Tracker - Entry Point
//!
//! Loads the initial herd from the store, connects the live stream (or an
//! in-process demo publisher when no stream address is configured) and offers
//! a small command prompt over the dashboard.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

use mara_tracker::core::config::TrackerConfig;
use mara_tracker::core::error::{Result, TrackerError};
use mara_tracker::dashboard::{Command, Dashboard, DashboardView};
use mara_tracker::telemetry::demo::DemoFeed;
use mara_tracker::telemetry::{BulkLoader, LocalPublisher, TcpTransport, Transport};

/// How long the prompt waits for a command to be applied before redrawing
const COMMAND_SETTLE: Duration = Duration::from_secs(1);

/// Live wildlife telemetry dashboard
#[derive(Parser, Debug)]
#[command(name = "mara-tracker")]
#[command(about = "Track live animal positions, statistics and paths")]
struct Args {
    /// TOML config file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Base URL of the store (overrides config)
    #[arg(long)]
    api: Option<String>,

    /// Publisher address host:port (overrides config)
    #[arg(long)]
    connect: Option<String>,

    /// Skip the startup bulk load
    #[arg(long)]
    no_bulk: bool,

    /// Herd size for the demo publisher
    #[arg(long, default_value_t = 12)]
    demo_size: usize,

    /// Seconds between demo publisher rounds
    #[arg(long, default_value_t = 2)]
    demo_period: u64,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mara_tracker=info")),
        )
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;
    tracing::info!("Mara Tracker starting...");

    // Without a publisher address, run against a synthetic herd
    let mut _demo = None;
    let transport: Arc<dyn Transport> = match &config.stream_addr {
        Some(addr) => Arc::new(TcpTransport::new(addr.clone(), config.frame_buffer)),
        None => {
            tracing::warn!("No stream address configured - using the demo publisher");
            let publisher = LocalPublisher::new(config.frame_buffer);
            let seed = config.seed.unwrap_or_else(rand::random);
            let feed = DemoFeed::new(publisher.clone(), config.topic.clone(), args.demo_size, seed);
            _demo = Some(feed.spawn(Duration::from_secs(args.demo_period.max(1))));
            Arc::new(publisher.transport(config.frame_buffer))
        }
    };

    let (mut dashboard, inbound) = Dashboard::new(&config, transport);

    if !args.no_bulk {
        match BulkLoader::new(config.api_url.clone()).fetch().await {
            Ok(batch) => {
                dashboard.load_bulk(batch);
            }
            Err(e) => tracing::warn!("Bulk load failed, continuing with live data only: {}", e),
        }
    }

    let mut views = dashboard.subscribe_view();
    let (commands_tx, commands_rx) = mpsc::channel(32);
    let dashboard_task = tokio::spawn(dashboard.run(inbound, commands_rx));

    println!("\n=== MARA TRACKER ===");
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut sent: u64 = 0;
    loop {
        display_status(&views);
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        match input {
            "" => continue,
            "status" | "s" => {
                display_detailed_status(&views);
                continue;
            }
            "help" | "h" => {
                print_help();
                continue;
            }
            _ => {}
        }

        let options = views.borrow().options;
        match Command::parse(input, options) {
            Ok(Command::Shutdown) => break,
            Ok(command) => {
                if commands_tx.send(command).await.is_err() {
                    tracing::error!("Dashboard stopped unexpectedly");
                    break;
                }
                sent += 1;
                let applied = views.wait_for(|view| view.commands_applied >= sent);
                if tokio::time::timeout(COMMAND_SETTLE, applied).await.is_err() {
                    tracing::debug!("Command still pending when redrawing status");
                }
            }
            Err(message) => println!("{}", message),
        }
    }

    let _ = commands_tx.send(Command::Shutdown).await;
    dashboard_task
        .await
        .map_err(|e| TrackerError::Channel(format!("dashboard task failed: {}", e)))?;

    let view = views.borrow();
    println!(
        "\nGoodbye! Final state: {} animals, {:.2} km travelled.",
        view.statistics.total_animals, view.statistics.total_distance
    );
    Ok(())
}

fn build_config(args: &Args) -> Result<TrackerConfig> {
    let mut config = match &args.config {
        Some(path) => TrackerConfig::load(path)?,
        None => TrackerConfig::default(),
    };
    if let Some(api) = &args.api {
        config.api_url = api.clone();
    }
    if let Some(addr) = &args.connect {
        config.stream_addr = Some(addr.clone());
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate().map_err(TrackerError::Config)?;
    Ok(config)
}

fn print_help() {
    println!("Commands:");
    println!("  filter <text> / f   - Filter and select by species (empty clears)");
    println!("  clear               - Clear the species filter");
    println!("  toggle <id>         - Select or deselect one animal");
    println!("  blink [on|off]      - Simulated motion for all animals");
    println!("  lines               - Toggle lines between selected animals");
    println!("  pause / resume / p  - Control the live stream");
    println!("  status / s          - Show detailed status");
    println!("  quit / q            - Exit");
    println!();
}

/// One-line summary
fn display_status(views: &watch::Receiver<DashboardView>) {
    let view = views.borrow();
    println!();
    println!(
        "--- {:?} | {:?} | Animals: {} | Distance: {:.2} km | Avg speed: {:.2} km/h | Selected: {} ---",
        view.playback,
        view.connection,
        view.statistics.total_animals,
        view.statistics.total_distance,
        view.statistics.average_speed,
        view.selected.len()
    );
}

fn display_detailed_status(views: &watch::Receiver<DashboardView>) {
    let view = views.borrow();
    println!();
    if let Some(filter) = &view.filter {
        println!("Filter: {}", filter);
    }

    for entity in view.entities.iter() {
        let marker = if view.path_of(&entity.id).is_some() { '*' } else { ' ' };
        println!(
            "{} {} {} - {} | age {} | {:.2} km/h | {:.2} km",
            marker,
            entity.id,
            entity.species,
            entity.position,
            entity.age,
            entity.speed,
            entity.distance_traveled
        );
    }

    for tracked in &view.selected {
        println!(
            "  path {}: {} points, {:.3} km",
            tracked.id,
            tracked.path.len(),
            tracked.length_km
        );
    }

    if view.rejected_records > 0 {
        println!("Rejected records: {}", view.rejected_records);
    }
    println!();
}
