// Parser module: reads a legacy MySQL dump and turns INSERT groups into rows.

pub mod cursor;
pub mod insert;
pub mod literal;
pub mod schema;
pub mod tuple;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::debug;

// One literal from a VALUES group. Numbers keep their source text; callers
// parse them when they need an integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Null,
    Number(String),
    Text(String),
}

impl SqlValue {
    // Text view of the value; NULL reads as the empty string.
    pub fn as_str(&self) -> &str {
        match self {
            SqlValue::Null => "",
            SqlValue::Number(s) | SqlValue::Text(s) => s,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_str().trim().parse().ok()
    }
}

// Read the whole dump into memory, advancing the byte bar as lines come in.
pub fn read_dump(path: &Path, bar: Option<&indicatif::ProgressBar>) -> io::Result<String> {
    debug!("read_dump: opening {}", path.display());
    let file = File::open(path)?;
    let capacity = file.metadata().map(|m| m.len() as usize).unwrap_or(0);
    let mut reader = BufReader::new(file);

    let mut dump = String::with_capacity(capacity);
    let mut line = String::new();
    while reader.read_line(&mut line)? > 0 {
        if let Some(b) = bar {
            b.inc(line.len() as u64);
        }
        dump.push_str(&line);
        line.clear();
    }

    if let Some(b) = bar {
        b.finish();
    }
    debug!("read_dump: {} bytes read from {}", dump.len(), path.display());
    Ok(dump)
}

#[cfg(test)]
mod tests {
    use super::{read_dump, SqlValue};
    use std::io::Write;

    #[test]
    fn test_value_views() {
        assert_eq!(SqlValue::Null.as_str(), "");
        assert_eq!(SqlValue::Number("42".into()).as_i64(), Some(42));
        assert_eq!(SqlValue::Text(" 7 ".into()).as_i64(), Some(7));
        assert_eq!(SqlValue::Text("abc".into()).as_i64(), None);
        assert_eq!(SqlValue::Null.as_i64(), None);
    }

    #[test]
    fn test_read_dump_keeps_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let body = "-- phpMyAdmin SQL Dump\nINSERT INTO `events` VALUES (1, 'Wąchock', '01-01');\n";
        file.write_all(body.as_bytes()).unwrap();
        let dump = read_dump(file.path(), None).unwrap();
        assert_eq!(dump, body);
    }

    #[test]
    fn test_read_dump_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_dump(&dir.path().join("nope.sql"), None).is_err());
    }
}
