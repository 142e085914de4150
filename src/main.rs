// dw-import: move the legacy d-w.pl calendar out of a phpMyAdmin MySQL dump
// and into Supabase. Events go first so photos can be pointed at the ids the
// new store hands out.

mod config;
mod importer;
mod loader;
mod logger;
mod parser;
mod progress;
mod store;

use clap::{CommandFactory, Parser};
use config::{ImportConfig, StoreConfig};
use std::io;
use std::path::PathBuf;
use std::time::Instant;
use store::PostgrestStore;
use tracing::{debug, info};

// Command-line flags and positional arguments.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Enable debug logging (disables progress bars).
    #[arg(long)]
    debug: bool,

    /// Parse the dump and report counts without writing anything.
    #[arg(long)]
    dry_run: bool,

    /// Do not empty the destination tables before loading.
    #[arg(long)]
    keep_existing: bool,

    /// Rows per bulk insert request.
    #[arg(long, default_value_t = 500)]
    batch_size: usize,

    /// Supabase project URL (falls back to NEXT_PUBLIC_SUPABASE_URL).
    #[arg(long, env = "SUPABASE_URL")]
    supabase_url: Option<String>,

    /// Supabase service role key.
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    service_key: Option<String>,

    /// HTTP timeout per request, in seconds.
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Prefix for photo paths that are not already absolute URLs.
    #[arg(long, default_value = "https://d-w.pl/")]
    photo_base_url: String,

    /// Events table name in the dump.
    #[arg(long, default_value = "events")]
    events_table: String,

    /// Photos table name in the dump.
    #[arg(long, default_value = "photos")]
    photos_table: String,

    /// Destination collection for events.
    #[arg(long, default_value = "dw_events")]
    events_collection: String,

    /// Destination collection for photos.
    #[arg(long, default_value = "dw_photos")]
    photos_collection: String,

    /// SQL dump file path.
    dump: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let wall_start = Instant::now();
    if std::env::args().len() == 1 {
        Args::command().print_help()?;
        eprintln!();
        std::process::exit(1);
    }

    // Env files must be loaded before clap reads `env = ...` defaults.
    let env_files = config::load_env_files();
    let args = Args::parse();
    logger::init(args.debug);
    for path in &env_files {
        debug!("main: loaded environment from {}", path.display());
    }

    let cfg = ImportConfig {
        batch_size: config::validate_batch_size(args.batch_size)?,
        events_table: args.events_table,
        photos_table: args.photos_table,
        events_collection: args.events_collection,
        photos_collection: args.photos_collection,
        photo_base_url: args.photo_base_url,
        clear_existing: !args.keep_existing,
    };
    // Resolve credentials up front so a bad setup fails before the long parse.
    let store_cfg = if args.dry_run {
        None
    } else {
        Some(StoreConfig::resolve(
            args.supabase_url,
            args.service_key,
            args.timeout_secs,
        )?)
    };

    // Progress bars are disabled in debug mode to avoid mangled output.
    let progress = progress::ProgressManager::new(!args.debug);

    println!("=== d-w.pl SQL dump -> Supabase import ===\n");
    println!("Reading SQL dump: {}", args.dump.display());
    let bar = progress.new_file_bar(&args.dump, &format!("Reading {}", basename(&args.dump)));
    let dump = parser::read_dump(&args.dump, bar.as_ref())?;
    println!("  File size: {:.2} MB", dump.len() as f64 / 1024.0 / 1024.0);

    let parse_start = Instant::now();
    let parsed = importer::parse_dump(&dump, &cfg);
    debug!("Timing: parsing took {:?}", parse_start.elapsed());
    drop(dump);

    println!("\nFound {} events", parsed.events.len());
    println!(
        "Found {} photos, {} valid (with event + src)",
        parsed.photos_total,
        parsed.photos.len()
    );
    if parsed.malformed_events + parsed.malformed_photos > 0 {
        println!(
            "Malformed rows: {} events, {} photos",
            parsed.malformed_events, parsed.malformed_photos
        );
    }

    let Some(store_cfg) = store_cfg else {
        println!("\nDry run: nothing written.");
        return Ok(());
    };

    info!("main: target {}", store_cfg.url);
    let mut store = PostgrestStore::new(&store_cfg.url, &store_cfg.service_key, store_cfg.timeout)?;

    if cfg.clear_existing {
        println!("\nClearing existing data...");
        importer::clear_destination(&mut store, &cfg);
    }

    let load_start = Instant::now();
    let summary = importer::run(&mut store, &parsed, &cfg, &progress);
    debug!("Timing: loading took {:?}", load_start.elapsed());

    importer::print_summary(&summary, &mut io::stdout())?;
    debug!("Timing: total wall time {:?}", wall_start.elapsed());
    Ok(())
}

fn basename(path: &std::path::Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}
