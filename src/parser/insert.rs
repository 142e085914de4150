// INSERT extractor: finds every `INSERT INTO `table` ... VALUES` for one table
// and cuts each parenthesised group out of the dump, quote-aware.
// Groups are handed to the tuple tokenizer; rows come back in file order.

use crate::parser::cursor::Cursor;
use crate::parser::tuple::parse_tuple;
use crate::parser::SqlValue;
use regex::Regex;
use tracing::{debug, warn};

pub struct InsertExtractor {
    table: String,
    header_re: Regex,
}

impl InsertExtractor {
    // The backticked name anchors the match so `events` never hits `events_archive`.
    pub fn new(table: &str) -> Self {
        let pattern = format!(r"(?i)INSERT INTO `{}`.*?VALUES\s*", regex::escape(table));
        let header_re = Regex::new(&pattern).expect("valid insert header regex");
        Self {
            table: table.to_string(),
            header_re,
        }
    }

    pub fn extract(&self, dump: &str) -> Vec<Vec<SqlValue>> {
        let mut rows = Vec::new();
        let mut statements = 0usize;
        let mut pos = 0usize;

        while let Some(m) = self.header_re.find_at(dump, pos) {
            statements += 1;
            let mut cur = Cursor::at(dump, m.end());

            loop {
                cur.skip_while(char::is_whitespace);
                if !cur.expect('(') {
                    break;
                }
                let group = read_group(&mut cur);
                let values = parse_tuple(group);
                if !values.is_empty() {
                    rows.push(values);
                }
                if skip_separators(&mut cur) {
                    break;
                }
            }

            pos = cur.pos();
        }

        debug!(
            "extract: table {} had {} INSERT statements, {} rows",
            self.table,
            statements,
            rows.len()
        );
        rows
    }
}

pub fn extract_rows(dump: &str, table: &str) -> Vec<Vec<SqlValue>> {
    InsertExtractor::new(table).extract(dump)
}

// Returns the text between the already-consumed `(` and its matching `)`,
// leaving the cursor after the `)`. Parens and commas inside string
// literals do not count toward depth.
fn read_group<'a>(cur: &mut Cursor<'a>) -> &'a str {
    let start = cur.pos();
    let mut depth = 1i32;
    loop {
        let before = cur.pos();
        let Some(c) = cur.advance() else {
            warn!("extract: VALUES group starting at byte {} is never closed", start);
            return cur.slice(start, cur.pos());
        };
        match c {
            '\\' => {
                cur.advance();
            }
            '\'' => skip_quoted(cur),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return cur.slice(start, before);
                }
            }
            _ => {}
        }
    }
}

// Skips to just past the closing quote of a literal whose opening quote is consumed.
fn skip_quoted(cur: &mut Cursor<'_>) {
    while let Some(c) = cur.advance() {
        match c {
            '\\' => {
                cur.advance();
            }
            '\'' => {
                if !cur.expect('\'') {
                    return;
                }
            }
            _ => {}
        }
    }
}

// Skips `,` `;` and whitespace after a group. True when `;` ended the statement.
fn skip_separators(cur: &mut Cursor<'_>) -> bool {
    while let Some(c) = cur.peek() {
        if c == ';' {
            cur.advance();
            return true;
        }
        if c == ',' || c.is_whitespace() {
            cur.advance();
        } else {
            break;
        }
    }
    false
}
