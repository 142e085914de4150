// Schema reader: pulls the column list of one table out of its CREATE TABLE block.
// Line-oriented and regex-based; good enough for phpMyAdmin/mysqldump output.

use regex::Regex;
use tracing::debug;

pub struct SchemaReader {
    create_table_re: Regex,
    column_line_re: Regex,
}

impl SchemaReader {
    // Build regexes once for reuse.
    pub fn new() -> Self {
        let create_table_re = Regex::new(
            r"(?i)CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:`?[^`\s(]+`?\.)?`?([^`\s(]+)`?",
        )
        .expect("valid create table regex");
        let column_line_re = Regex::new(r"^`(\w+)`\s+(\w+)").expect("valid column regex");
        Self {
            create_table_re,
            column_line_re,
        }
    }

    // Column names of `table` in declaration order, or None when the dump
    // has no CREATE TABLE for it.
    pub fn table_columns(&self, dump: &str, table: &str) -> Option<Vec<String>> {
        let mut in_create = false;
        let mut columns = Vec::new();

        for line in dump.lines() {
            let trimmed = line.trim();
            if !in_create {
                let found = self
                    .create_table_re
                    .captures(line)
                    .and_then(|cap| cap.get(1))
                    .is_some_and(|name| name.as_str().eq_ignore_ascii_case(table));
                if found {
                    debug!("table_columns: found CREATE TABLE for {}", table);
                    in_create = true;
                }
                continue;
            }

            if let Some(cap) = self.column_line_re.captures(trimmed) {
                if let Some(col) = cap.get(1) {
                    columns.push(col.as_str().to_string());
                }
            }
            if trimmed.ends_with(';') {
                return Some(columns);
            }
        }

        // Block ran to EOF without a terminator; keep what we saw.
        in_create.then_some(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::SchemaReader;

    const DUMP: &str = "\
CREATE TABLE `events` (
  `id` int(11) NOT NULL,
  `desc` text NOT NULL,
  `date` varchar(10) NOT NULL,
  PRIMARY KEY (`id`)
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;

CREATE TABLE IF NOT EXISTS `photos` (
  `id` int(11) NOT NULL AUTO_INCREMENT,
  `src` varchar(255) NOT NULL,
  `title` varchar(255) DEFAULT NULL,
  `author` varchar(255) DEFAULT NULL,
  `source` varchar(255) DEFAULT NULL,
  `id_event` int(11) NOT NULL,
  KEY `id_event` (`id_event`)
) ENGINE=InnoDB;
";

    #[test]
    fn test_events_columns() {
        let reader = SchemaReader::new();
        assert_eq!(
            reader.table_columns(DUMP, "events"),
            Some(vec!["id".to_string(), "desc".to_string(), "date".to_string()])
        );
    }

    #[test]
    fn test_photos_columns_skip_keys() {
        let reader = SchemaReader::new();
        let cols = reader.table_columns(DUMP, "photos").unwrap();
        assert_eq!(cols, vec!["id", "src", "title", "author", "source", "id_event"]);
    }

    #[test]
    fn test_missing_table() {
        let reader = SchemaReader::new();
        assert_eq!(reader.table_columns(DUMP, "users"), None);
    }
}
