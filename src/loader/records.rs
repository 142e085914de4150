// Legacy row layouts and the records sent to the new store.
// Legacy rows are positional; column order follows the old site's schema.

use crate::parser::SqlValue;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

pub const EVENT_COLUMNS: [&str; 3] = ["id", "desc", "date"];
pub const PHOTO_COLUMNS: [&str; 6] = ["id", "src", "title", "author", "source", "id_event"];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected {expected} columns, got {got}")]
    ShortRow { expected: usize, got: usize },

    #[error("column `{column}` is not an integer: {value:?}")]
    NotInteger { column: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyEvent {
    pub id: i64,
    pub description: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyPhoto {
    pub id: i64,
    pub src: String,
    pub title: String,
    pub author: String,
    pub source: String,
    pub event_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewEvent {
    pub description: String,
    pub event_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPhoto {
    pub event_id: i64,
    pub url: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub source: Option<String>,
}

impl LegacyEvent {
    pub fn from_row(row: &[SqlValue]) -> Result<Self, DecodeError> {
        check_len(row, EVENT_COLUMNS.len())?;
        Ok(Self {
            id: int_column(&row[0], "id")?,
            description: row[1].as_str().to_string(),
            date: row[2].as_str().to_string(),
        })
    }

    pub fn to_record(&self) -> NewEvent {
        NewEvent {
            description: self.description.clone(),
            event_date: self.date.clone(),
        }
    }
}

impl LegacyPhoto {
    pub fn from_row(row: &[SqlValue]) -> Result<Self, DecodeError> {
        check_len(row, PHOTO_COLUMNS.len())?;
        Ok(Self {
            // Only used in log lines; a missing id must not cost the photo.
            id: row[0].as_i64().unwrap_or(0),
            src: row[1].as_str().to_string(),
            title: row[2].as_str().to_string(),
            author: row[3].as_str().to_string(),
            source: row[4].as_str().to_string(),
            // Orphaned and test photos carry 0 or garbage here; both are filtered later.
            event_id: row[5].as_i64().unwrap_or(0),
        })
    }

    // Test uploads on the old site have no event or no file.
    pub fn is_importable(&self) -> bool {
        self.event_id > 0 && !self.src.is_empty()
    }

    pub fn to_record(&self, event_id: i64, base_url: &str) -> NewPhoto {
        NewPhoto {
            event_id,
            url: resolve_photo_url(&self.src, base_url),
            title: optional(&self.title),
            author: optional(&self.author),
            source: optional(&self.source),
        }
    }
}

// Relative paths like `img/x.jpg` point at the legacy host.
pub fn resolve_photo_url(src: &str, base_url: &str) -> String {
    if src.starts_with("http") {
        return src.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        src.trim_start_matches('/')
    )
}

// Decode every row, logging and counting the ones that do not fit the layout.
pub fn decode_rows<T, F>(rows: &[Vec<SqlValue>], table: &str, decode: F) -> (Vec<T>, usize)
where
    F: Fn(&[SqlValue]) -> Result<T, DecodeError>,
{
    let mut out = Vec::with_capacity(rows.len());
    let mut malformed = 0usize;
    for (i, row) in rows.iter().enumerate() {
        match decode(row.as_slice()) {
            Ok(v) => out.push(v),
            Err(e) => {
                warn!("{} row {}: {}", table, i + 1, e);
                malformed += 1;
            }
        }
    }
    (out, malformed)
}

fn check_len(row: &[SqlValue], expected: usize) -> Result<(), DecodeError> {
    if row.len() < expected {
        return Err(DecodeError::ShortRow {
            expected,
            got: row.len(),
        });
    }
    Ok(())
}

fn int_column(value: &SqlValue, column: &'static str) -> Result<i64, DecodeError> {
    value.as_i64().ok_or_else(|| DecodeError::NotInteger {
        column,
        value: value.as_str().to_string(),
    })
}

fn optional(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}
