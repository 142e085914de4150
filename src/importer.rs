// Import pipeline: extract both legacy tables from the in-memory dump, then
// clear the destination and load events before photos.

use crate::config::ImportConfig;
use crate::loader::records::{decode_rows, LegacyEvent, LegacyPhoto, EVENT_COLUMNS, PHOTO_COLUMNS};
use crate::loader::{batch_count, load_events, load_photos, IdMap, LoadStats};
use crate::parser::insert::extract_rows;
use crate::parser::schema::SchemaReader;
use crate::progress::ProgressManager;
use crate::store::DataStore;
use std::io::{self, Write};
use tracing::{debug, error, info, warn};

#[derive(Debug, Default)]
pub struct ParsedDump {
    pub events: Vec<LegacyEvent>,
    // Photos that passed the importable filter.
    pub photos: Vec<LegacyPhoto>,
    pub photos_total: usize,
    pub malformed_events: usize,
    pub malformed_photos: usize,
}

#[derive(Debug, Default)]
pub struct Summary {
    pub events_total: usize,
    pub events: LoadStats,
    pub photos_total: usize,
    pub photos_valid: usize,
    pub photos: LoadStats,
    pub id_map_entries: usize,
    pub malformed_events: usize,
    pub malformed_photos: usize,
}

// Both tables are extracted in parallel; the dump is only read here.
pub fn parse_dump(dump: &str, cfg: &ImportConfig) -> ParsedDump {
    let ((events, malformed_events), (all_photos, malformed_photos)) = rayon::join(
        || {
            check_schema(dump, &cfg.events_table, &EVENT_COLUMNS);
            let rows = extract_rows(dump, &cfg.events_table);
            decode_rows(&rows, &cfg.events_table, LegacyEvent::from_row)
        },
        || {
            check_schema(dump, &cfg.photos_table, &PHOTO_COLUMNS);
            let rows = extract_rows(dump, &cfg.photos_table);
            decode_rows(&rows, &cfg.photos_table, LegacyPhoto::from_row)
        },
    );

    let photos_total = all_photos.len();
    let photos: Vec<LegacyPhoto> = all_photos.into_iter().filter(LegacyPhoto::is_importable).collect();
    debug!(
        "parse_dump: {} events, {} of {} photos importable",
        events.len(),
        photos.len(),
        photos_total
    );

    ParsedDump {
        events,
        photos,
        photos_total,
        malformed_events,
        malformed_photos,
    }
}

// Warn when the dump's CREATE TABLE disagrees with the layout rows are decoded with.
fn check_schema(dump: &str, table: &str, expected: &[&str]) {
    match SchemaReader::new().table_columns(dump, table) {
        Some(cols) if cols.iter().map(String::as_str).ne(expected.iter().copied()) => {
            warn!(
                "table {} has columns ({}), expected ({}); rows are decoded by position",
                table,
                cols.join(", "),
                expected.join(", ")
            );
        }
        Some(_) => debug!("table {}: schema matches", table),
        None => debug!("table {}: no CREATE TABLE in dump", table),
    }
}

// Children first so the events delete is not blocked by references.
pub fn clear_destination<S: DataStore + ?Sized>(store: &mut S, cfg: &ImportConfig) {
    for collection in [&cfg.photos_collection, &cfg.events_collection] {
        match store.delete_all(collection) {
            Ok(()) => info!("cleared {}", collection),
            Err(e) => error!("clearing {} failed: {}", collection, e),
        }
    }
}

pub fn run<S: DataStore + ?Sized>(
    store: &mut S,
    parsed: &ParsedDump,
    cfg: &ImportConfig,
    progress: &ProgressManager,
) -> Summary {
    let mut id_map = IdMap::new();

    println!(
        "\nInserting {} events (batch size: {})...",
        parsed.events.len(),
        cfg.batch_size
    );
    let bar = progress.new_batch_bar(
        batch_count(parsed.events.len(), cfg.batch_size) as u64,
        "Events",
    );
    let events = load_events(
        store,
        &cfg.events_collection,
        &parsed.events,
        cfg.batch_size,
        &mut id_map,
        bar.as_ref(),
    );
    println!("  Events inserted: {}, failed: {}", events.inserted, events.failed);
    if id_map.is_empty() && !parsed.photos.is_empty() {
        warn!("no events were imported; every photo will be skipped");
    }

    // Every event batch has been answered before any photo is prepared.
    println!(
        "\nInserting {} photos (batch size: {})...",
        parsed.photos.len(),
        cfg.batch_size
    );
    let bar = progress.new_batch_bar(
        batch_count(parsed.photos.len(), cfg.batch_size) as u64,
        "Photos",
    );
    let photos = load_photos(
        store,
        &cfg.photos_collection,
        &parsed.photos,
        cfg.batch_size,
        &id_map,
        &cfg.photo_base_url,
        bar.as_ref(),
    );
    println!(
        "  Photos inserted: {}, skipped: {}, failed: {}",
        photos.inserted, photos.skipped, photos.failed
    );

    Summary {
        events_total: parsed.events.len(),
        events,
        photos_total: parsed.photos_total,
        photos_valid: parsed.photos.len(),
        photos,
        id_map_entries: id_map.len(),
        malformed_events: parsed.malformed_events,
        malformed_photos: parsed.malformed_photos,
    }
}

pub fn print_summary<W: Write>(summary: &Summary, out: &mut W) -> io::Result<()> {
    let sep = "=".repeat(60);
    writeln!(out, "\n{}\nSUMMARY\n{}", sep, sep)?;
    writeln!(
        out,
        "Events:   {}/{} inserted, {} failed",
        summary.events.inserted, summary.events_total, summary.events.failed
    )?;
    writeln!(
        out,
        "Photos:   {}/{} inserted, {} skipped, {} failed ({} in dump)",
        summary.photos.inserted,
        summary.photos_valid,
        summary.photos.skipped,
        summary.photos.failed,
        summary.photos_total
    )?;
    if summary.malformed_events + summary.malformed_photos > 0 {
        writeln!(
            out,
            "Malformed rows: {} events, {} photos",
            summary.malformed_events, summary.malformed_photos
        )?;
    }
    writeln!(
        out,
        "Requests: {} event batches, {} photo batches",
        summary.events.batches, summary.photos.batches
    )?;
    writeln!(out, "ID map:   {} entries", summary.id_map_entries)?;
    writeln!(out, "{}", sep)?;
    Ok(())
}
