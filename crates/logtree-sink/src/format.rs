//! crates/logtree-sink/src/format.rs
//! Single-line `key="value"` rendering of records.
//!
//! Keys are emitted in sorted order and separated by single spaces. Values are
//! always quoted; keys are quoted only when they are empty or contain `=`, a
//! space, a quote, a backslash or a character that is not printable.
//!
//! Quoting escapes `"` and `\` with a backslash, common control characters
//! with their C escapes, and any other unprintable character with a `\x`, `\u`
//! or `\U` hex escape, so a formatted record never spans more than one line.

use std::fmt::Write as _;

use logtree::Record;

use crate::line_mode::LineMode;

/// Formats `record` as one line terminated by `\n`.
///
/// ```
/// use logtree::{Level, Record};
///
/// let record = Record::new()
///     .with("$level", Level::INFO)
///     .with("$time", "now")
///     .with("hello", "world");
/// assert_eq!(
///     logtree_sink::format_record(&record),
///     "$level=\"INFO\" $time=\"now\" hello=\"world\"\n"
/// );
/// ```
#[must_use]
pub fn format_record(record: &Record) -> String {
    format_record_with_mode(record, LineMode::WithNewline)
}

/// Formats `record` as one line, terminated according to `line_mode`.
#[must_use]
pub fn format_record_with_mode(record: &Record, line_mode: LineMode) -> String {
    let mut line = String::new();
    for (index, (key, value)) in record.iter().enumerate() {
        if index > 0 {
            line.push(' ');
        }
        if key.is_empty() || key.chars().any(needs_quote) {
            quote_into(&mut line, key);
        } else {
            line.push_str(key);
        }
        line.push('=');
        quote_into(&mut line, &value.to_string());
    }
    if line_mode.append_newline() {
        line.push('\n');
    }
    line
}

/// Letters, marks, numbers, punctuation, symbols and the ASCII space.
fn is_printable(ch: char) -> bool {
    !ch.is_control() && (ch == ' ' || !ch.is_whitespace()) && !is_format_or_private(ch)
}

/// Invisible format characters (general category Cf) and private-use code
/// points (Co).
const fn is_format_or_private(ch: char) -> bool {
    matches!(
        ch,
        '\u{00AD}'
            | '\u{0600}'..='\u{0605}'
            | '\u{061C}'
            | '\u{06DD}'
            | '\u{070F}'
            | '\u{0890}'..='\u{0891}'
            | '\u{08E2}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
            | '\u{110BD}'
            | '\u{110CD}'
            | '\u{13430}'..='\u{1343F}'
            | '\u{1BCA0}'..='\u{1BCA3}'
            | '\u{1D173}'..='\u{1D17A}'
            | '\u{E0001}'
            | '\u{E0020}'..='\u{E007F}'
            | '\u{E000}'..='\u{F8FF}'
            | '\u{F0000}'..='\u{FFFFD}'
            | '\u{100000}'..='\u{10FFFD}'
    )
}

fn needs_quote(ch: char) -> bool {
    matches!(ch, ' ' | '"' | '\\' | '=') || !is_printable(ch)
}

/// Appends `text` to `out` as a double-quoted, escaped string literal.
pub(crate) fn quote_into(out: &mut String, text: &str) {
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0b}' => out.push_str("\\v"),
            '\u{0c}' => out.push_str("\\f"),
            ch if is_printable(ch) => out.push(ch),
            ch => {
                let code = u32::from(ch);
                // Writing into a String cannot fail.
                let _ = if code < 0x80 {
                    write!(out, "\\x{code:02x}")
                } else if code <= 0xffff {
                    write!(out, "\\u{code:04x}")
                } else {
                    write!(out, "\\U{code:08x}")
                };
            }
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use logtree::Level;

    fn quoted(text: &str) -> String {
        let mut out = String::new();
        quote_into(&mut out, text);
        out
    }

    #[test]
    fn keys_are_sorted() {
        let record = Record::new().with("b", 2).with("a", 1).with("$level", Level::WARN);
        assert_eq!(format_record(&record), "$level=\"WARN\" a=\"1\" b=\"2\"\n");
    }

    #[test]
    fn awkward_keys_are_quoted() {
        let record = Record::new().with("two words", "x").with("plain", "y");
        assert_eq!(format_record(&record), "plain=\"y\" \"two words\"=\"x\"\n");

        let record = Record::new().with("", "hi").with("=", "eq");
        assert_eq!(format_record(&record), "\"\"=\"hi\" \"=\"=\"eq\"\n");
    }

    #[test]
    fn escapes_match_c_style() {
        assert_eq!(quoted("a\"b\\c"), r#""a\"b\\c""#);
        assert_eq!(quoted("line\nnext\ttab"), r#""line\nnext\ttab""#);
        assert_eq!(quoted("\u{1}"), r#""\x01""#);
        assert_eq!(quoted("\u{85}"), r#""\u0085""#);
        assert_eq!(quoted("héllo ✓"), "\"héllo ✓\"");
    }

    #[test]
    fn invisible_characters_are_escaped() {
        assert_eq!(quoted("a\u{200B}b"), r#""a\u200bb""#);
        assert_eq!(quoted("\u{FEFF}"), r#""\ufeff""#);
        assert_eq!(quoted("\u{00A0}"), r#""\u00a0""#);
        assert_eq!(quoted("\u{E000}"), r#""\ue000""#);
        assert_eq!(quoted("\u{E0041}"), r#""\U000e0041""#);

        let record = Record::new().with("zero\u{200B}width", "v");
        assert_eq!(format_record(&record), "\"zero\\u200bwidth\"=\"v\"\n");
    }

    #[test]
    fn line_mode_controls_terminator() {
        let record = Record::new().with("k", "v");
        assert_eq!(format_record_with_mode(&record, LineMode::WithoutNewline), "k=\"v\"");
        assert_eq!(format_record_with_mode(&Record::new(), LineMode::WithNewline), "\n");
    }

    #[test]
    fn unknown_levels_render_numerically() {
        let record = Record::new().with("$level", Level::from_raw(25));
        assert_eq!(format_record(&record), "$level=\"Level(25)\"\n");
    }
}
