// Tuple tokenizer: splits the inside of one VALUES group into literals.
// Malformed input never errors; unknown characters are stepped over.

use crate::parser::cursor::Cursor;
use crate::parser::literal::unescape;
use crate::parser::SqlValue;

pub fn parse_tuple(text: &str) -> Vec<SqlValue> {
    let mut cur = Cursor::new(text);
    let mut values = Vec::new();

    loop {
        cur.skip_while(|c| c == ' ' || c == ',' || c == '\t');
        let Some(c) = cur.peek() else {
            break;
        };

        if c == '\'' {
            cur.advance();
            values.push(SqlValue::Text(unescape(&read_quoted(&mut cur))));
        } else if c == '-' || c.is_ascii_digit() {
            let start = cur.pos();
            cur.skip_while(|c| c != ',' && c != ')' && c != ' ');
            let num = cur.slice(start, cur.pos()).trim();
            values.push(SqlValue::Number(num.to_string()));
        } else if cur.peek_str("NULL") {
            values.push(SqlValue::Null);
            cur.advance_by(4);
        } else {
            tracing::trace!("parse_tuple: skipping unexpected {:?} at {}", c, cur.pos());
            cur.advance();
        }
    }

    values
}

// Reads a single-quoted literal body; the opening quote is already consumed.
// Escape pairs are kept raw for `unescape`, and `''` is rewritten to `\'`.
fn read_quoted(cur: &mut Cursor<'_>) -> String {
    let mut raw = String::new();
    while let Some(c) = cur.advance() {
        match c {
            '\\' => {
                raw.push('\\');
                if let Some(next) = cur.advance() {
                    raw.push(next);
                }
            }
            '\'' => {
                if cur.expect('\'') {
                    raw.push_str("\\'");
                } else {
                    break;
                }
            }
            _ => raw.push(c),
        }
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::parse_tuple;
    use crate::parser::SqlValue;

    fn text(s: &str) -> SqlValue {
        SqlValue::Text(s.to_string())
    }

    fn num(s: &str) -> SqlValue {
        SqlValue::Number(s.to_string())
    }

    #[test]
    fn test_fields_in_order() {
        let values = parse_tuple("1, 'Chrzest Polski', '04-14'");
        assert_eq!(values, vec![num("1"), text("Chrzest Polski"), text("04-14")]);
    }

    #[test]
    fn test_paren_inside_string() {
        let values = parse_tuple("1, 'closed (paren) here', '2024-01-01'");
        assert_eq!(values.len(), 3);
        assert_eq!(values[1], text("closed (paren) here"));
    }

    #[test]
    fn test_escaped_quote() {
        let values = parse_tuple(r"2, 'it\'s a test', '2024-01-02'");
        assert_eq!(values[1], text("it's a test"));
    }

    #[test]
    fn test_doubled_quote() {
        let values = parse_tuple("3, 'say ''hi''', '2024-01-03'");
        assert_eq!(values.len(), 3);
        assert_eq!(values[1], text("say 'hi'"));
    }

    #[test]
    fn test_null_literal() {
        let values = parse_tuple("4, NULL, '2024-01-04'");
        assert_eq!(values[1], SqlValue::Null);
        assert_eq!(values[1].as_str(), "");
    }

    #[test]
    fn test_lowercase_null_is_not_recognised() {
        // Only the exact uppercase keyword counts; the letters are skipped.
        let values = parse_tuple("5, null");
        assert_eq!(values, vec![num("5")]);
    }

    #[test]
    fn test_negative_and_escapes() {
        let values = parse_tuple(r"-7,'a\nb','tab\there',0");
        assert_eq!(
            values,
            vec![num("-7"), text("a\nb"), text("tab\there"), num("0")]
        );
    }

    #[test]
    fn test_empty_string_and_unicode() {
        let values = parse_tuple("9, '', 'Zażółć gęślą jaźń'");
        assert_eq!(values, vec![num("9"), text(""), text("Zażółć gęślą jaźń")]);
    }

    #[test]
    fn test_unterminated_string() {
        let values = parse_tuple("1, 'never closed");
        assert_eq!(values, vec![num("1"), text("never closed")]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_tuple("").is_empty());
        assert!(parse_tuple(" , \t").is_empty());
    }
}
