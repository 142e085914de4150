// Batch loader: pushes decoded rows to the destination store in fixed-size
// bulk inserts, one batch at a time, remapping legacy ids along the way.
// A failed batch is logged and counted; the run carries on with the next one.

pub mod records;

use crate::store::DataStore;
use indicatif::ProgressBar;
use records::{LegacyEvent, LegacyPhoto};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, error, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    pub inserted: usize,
    pub failed: usize,
    pub skipped: usize,
    // Bulk insert requests actually sent.
    pub batches: usize,
}

// Legacy id -> id issued by the destination. Only rows that were inserted
// get an entry, and an entry is never overwritten.
#[derive(Debug, Default)]
pub struct IdMap {
    map: HashMap<i64, i64>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    // Returns false (and keeps the first mapping) if `legacy` was already mapped.
    pub fn record(&mut self, legacy: i64, new: i64) -> bool {
        match self.map.entry(legacy) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(new);
                true
            }
        }
    }

    pub fn get(&self, legacy: i64) -> Option<i64> {
        self.map.get(&legacy).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

pub enum Prepared<R> {
    Insert { legacy_id: i64, record: R },
    Skip,
}

pub fn batch_count(rows: usize, batch_size: usize) -> usize {
    rows.div_ceil(batch_size.max(1))
}

// Core loop shared by every table. `prepare` turns a source row into a
// record (or a skip); when `id_map` is given, the ids the store returns are
// recorded against each row's legacy id in request order.
pub fn load_batches<T, R, S, F>(
    store: &mut S,
    collection: &str,
    rows: &[T],
    batch_size: usize,
    mut prepare: F,
    mut id_map: Option<&mut IdMap>,
    bar: Option<&ProgressBar>,
) -> LoadStats
where
    S: DataStore + ?Sized,
    R: Serialize,
    F: FnMut(&T) -> Prepared<R>,
{
    let batch_size = batch_size.max(1);
    let total_batches = batch_count(rows.len(), batch_size);
    let mut stats = LoadStats::default();

    for (idx, chunk) in rows.chunks(batch_size).enumerate() {
        let batch_num = idx + 1;
        let mut legacy_ids = Vec::with_capacity(chunk.len());
        let mut payload = Vec::with_capacity(chunk.len());

        for row in chunk {
            match prepare(row) {
                Prepared::Insert { legacy_id, record } => match serde_json::to_value(&record) {
                    Ok(v) => {
                        legacy_ids.push(legacy_id);
                        payload.push(v);
                    }
                    Err(e) => {
                        error!("{}: cannot encode row {}: {}", collection, legacy_id, e);
                        stats.failed += 1;
                    }
                },
                Prepared::Skip => stats.skipped += 1,
            }
        }

        if payload.is_empty() {
            debug!("{}: batch {}/{} has nothing to insert", collection, batch_num, total_batches);
            if let Some(b) = bar {
                b.inc(1);
            }
            continue;
        }

        stats.batches += 1;
        let want_ids = id_map.is_some();
        match store.insert_batch(collection, &payload, want_ids) {
            Ok(ids) => {
                stats.inserted += payload.len();
                if want_ids && ids.len() != payload.len() {
                    warn!(
                        "{}: batch {}/{} returned {} ids for {} rows",
                        collection,
                        batch_num,
                        total_batches,
                        ids.len(),
                        payload.len()
                    );
                }
                if let Some(map) = id_map.as_deref_mut() {
                    for (legacy, new) in legacy_ids.iter().zip(ids) {
                        if !map.record(*legacy, new) {
                            warn!("{}: legacy id {} appears twice; keeping first", collection, legacy);
                        }
                    }
                }
                report_batch(bar, collection, batch_num, total_batches, stats.inserted);
            }
            Err(e) => {
                stats.failed += payload.len();
                let msg = format!(
                    "{}: batch {}/{} FAILED: {}",
                    collection, batch_num, total_batches, e
                );
                match bar {
                    Some(b) => {
                        b.suspend(|| error!("{}", msg));
                        b.inc(1);
                    }
                    None => error!("{}", msg),
                }
            }
        }
    }

    if let Some(b) = bar {
        b.finish();
    }
    stats
}

fn report_batch(
    bar: Option<&ProgressBar>,
    collection: &str,
    batch_num: usize,
    total_batches: usize,
    inserted: usize,
) {
    match bar {
        Some(b) => {
            b.set_message(format!("{} inserted", inserted));
            b.inc(1);
        }
        None => println!(
            "  {}: batch {}/{}: {} rows inserted",
            collection, batch_num, total_batches, inserted
        ),
    }
}

// Events are the parent table: every successful insert lands in `id_map`.
pub fn load_events<S: DataStore + ?Sized>(
    store: &mut S,
    collection: &str,
    events: &[LegacyEvent],
    batch_size: usize,
    id_map: &mut IdMap,
    bar: Option<&ProgressBar>,
) -> LoadStats {
    load_batches(
        store,
        collection,
        events,
        batch_size,
        |e: &LegacyEvent| Prepared::Insert {
            legacy_id: e.id,
            record: e.to_record(),
        },
        Some(id_map),
        bar,
    )
}

// Photos hang off events; a photo whose event never made it in is skipped.
pub fn load_photos<S: DataStore + ?Sized>(
    store: &mut S,
    collection: &str,
    photos: &[LegacyPhoto],
    batch_size: usize,
    id_map: &IdMap,
    photo_base_url: &str,
    bar: Option<&ProgressBar>,
) -> LoadStats {
    load_batches(
        store,
        collection,
        photos,
        batch_size,
        |p: &LegacyPhoto| match id_map.get(p.event_id) {
            Some(event_id) => Prepared::Insert {
                legacy_id: p.id,
                record: p.to_record(event_id, photo_base_url),
            },
            None => {
                debug!("photo {}: event {} was not imported, skipping", p.id, p.event_id);
                Prepared::Skip
            }
        },
        None,
        bar,
    )
}
