//! dashsync - command-line consumer of the dashsync data layer.
//!
//! Fetches dashboard resources through the gateway and inspects or maintains
//! the local store (export, import, prune, reconcile).

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dashsync_core::models::{Collection, Fetched};
use dashsync_core::{Config, DashSync};

/// Set to a directory to also write logs to a daily-rolling file there
const LOG_DIR_ENV: &str = "DASHSYNC_LOG_DIR";

const USAGE: &str = "\
Usage: dashsync <command> [args]

Commands:
  dashboard         Fetch every dashboard widget and save a snapshot
  weather [city]    Current weather (defaults to the preferred location)
  crypto            Cryptocurrency prices
  quote             Motivational quote
  news              News headlines
  location          Location guessed from the network
  prefs             Show saved preferences
  list <collection> Saved records (projects or team)
  export [file]     Export local data as JSON (stdout if no file)
  import <file>     Import a previous export
  prune             Remove snapshots and analytics older than 7 days
  reconcile         Rebuild local data from the durable tier
  stats             Local storage usage
  cache             Gateway cache entries for this run";

/// Initialize the tracing subscriber for logging.
///
/// The returned guard must live until exit so the file writer flushes.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(LOG_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, "dashsync.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        println!("{}", USAGE);
        return Ok(());
    };
    if matches!(command, "-h" | "--help" | "help") {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = Config::load()?;
    let app = DashSync::open(&config).await?;
    info!(command = command, "Running command");

    match command {
        "dashboard" => {
            if let Some(snapshot) = app.cached_dashboard().await {
                eprintln!("Last snapshot: {}", snapshot.age_display());
            }
            print_fetched(app.refresh_dashboard().await)?;
        }
        "weather" => {
            let city = match args.get(1) {
                Some(city) => city.clone(),
                None => app.store.get_preferences().location,
            };
            print_fetched(app.gateway.get_weather(&city).await)?;
        }
        "crypto" => print_fetched(app.gateway.get_crypto_prices().await)?,
        "quote" => print_fetched(app.gateway.get_motivational_quote().await)?,
        "news" => print_fetched(app.gateway.get_news_headlines().await)?,
        "location" => print_fetched(app.gateway.get_user_location().await)?,
        "prefs" => print_json(&app.store.get_preferences())?,
        "list" => {
            let collection: Collection = args
                .get(1)
                .context("list needs a collection (projects or team)")?
                .parse()?;
            print_json(&app.store.list_records(collection))?;
        }
        "export" => {
            let document = app.store.export_all();
            match args.get(1) {
                Some(path) => {
                    std::fs::write(path, document)
                        .with_context(|| format!("Failed to write export to {}", path))?;
                    eprintln!("Exported to {}", path);
                }
                None => println!("{}", document),
            }
            app.track("export", "cli");
        }
        "import" => {
            let path = args
                .get(1)
                .map(PathBuf::from)
                .context("import needs a file path")?;
            let document = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let report = app.store.import_document(&document).await?;
            eprintln!(
                "Imported: preferences={}, projects={}, team={}, analytics events={}",
                report.preferences, report.projects, report.team, report.analytics_events
            );
            if !report.skipped.is_empty() {
                eprintln!("Skipped malformed sections: {}", report.skipped.join(", "));
            }
            app.track("import", "cli");
        }
        "prune" => {
            let report = app.store.prune_old_data().await;
            eprintln!(
                "Snapshot removed: {}, analytics events removed: {}",
                report.snapshot_removed, report.events_removed
            );
        }
        "reconcile" => {
            if !app.store.reconcile_all().await {
                bail!("Reconcile failed (is the durable tier available?)");
            }
            eprintln!(
                "Projects: {}, team: {}",
                app.store.projects_list().len(),
                app.store.team_list().len()
            );
        }
        "stats" => {
            let stats = app.store.storage_stats();
            println!(
                "Fast tier: {} / {} bytes",
                stats.fast_used_bytes, stats.fast_budget_bytes
            );
            println!(
                "Durable tier: {}",
                if stats.durable_available { "available" } else { "unavailable" }
            );
            println!("Preferences saved: {}", stats.has_preferences);
            println!("Dashboard snapshot: {}", stats.has_dashboard);
            println!("Projects: {}, team: {}", stats.projects, stats.team);
            println!("Analytics events: {}", stats.analytics_events);
        }
        "cache" => {
            // The cache only lives as long as the process, so warm it first
            let _ = app.refresh_dashboard().await;
            let stats = app.gateway.cache_stats();
            println!("{} cached responses", stats.size);
            for key in stats.keys {
                println!(
                    "  {:<24} {:<12} {}",
                    key.key,
                    key.age,
                    if key.fresh { "fresh" } else { "stale" }
                );
            }
        }
        other => {
            eprintln!("Unknown command: {}\n", other);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }

    Ok(())
}

/// Print the data as JSON, noting on stderr when it is fallback data.
fn print_fetched<T: Serialize>(fetched: Fetched<T>) -> Result<()> {
    if let Some(reason) = fetched.reason() {
        eprintln!("Showing fallback data ({})", reason);
    }
    print_json(fetched.data())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
