// MySQL string literal unescaping.
// Only the sequences mysqldump/phpMyAdmin emit are recognised; anything else
// after a backslash is left untouched, backslash included.

pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::unescape;

    // Encoding used by the dump writer for the sequences we support.
    fn escape(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '\'' => out.push_str("\\'"),
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                _ => out.push(c),
            }
        }
        out
    }

    #[test]
    fn test_basic_sequences() {
        assert_eq!(unescape(r"it\'s"), "it's");
        assert_eq!(unescape(r#"say \"hi\""#), "say \"hi\"");
        assert_eq!(unescape(r"a\nb\tc\rd"), "a\nb\tc\rd");
    }

    #[test]
    fn test_single_pass() {
        // An escaped backslash followed by `n` is a backslash and an `n`, not a newline.
        assert_eq!(unescape(r"C:\\new"), r"C:\new");
        assert_eq!(unescape(r"\\\\"), r"\\");
    }

    #[test]
    fn test_unknown_sequence_kept() {
        assert_eq!(unescape(r"50\% off"), r"50\% off");
        assert_eq!(unescape(r"\0"), r"\0");
        assert_eq!(unescape("trailing\\"), "trailing\\");
    }

    #[test]
    fn test_round_trip() {
        let samples = [
            "",
            "plain",
            "Bitwa pod Grunwaldem",
            "it's \"quoted\"",
            "line one\nline two\r\n\tindented",
            r"back\slash \\ double",
            "mixed \\n literal and \n real",
        ];
        for s in samples {
            assert_eq!(unescape(&escape(s)), s, "round trip failed for {:?}", s);
        }
    }
}
