//! Parsing for the plain-text resources the mod ships with: description files made of pages, and
//! the small flat JSON objects used for names and phrase overrides.
//!
//! None of this goes through a real JSON parser. People edit these files by hand, and a file with a
//! typo near the end should still give us everything before the typo.

use std::{collections::HashMap, iter::Peekable, str::Chars};

/// A line containing only this token ends one page and starts the next.
pub const PAGE_SEPARATOR: &str = "---";

/// Keys starting with this prefix are comments.
pub const COMMENT_PREFIX: char = '_';

/// Splits the contents of a description file into pages. Pages are trimmed, and empty pages are
/// dropped, so blank input gives no pages at all.
pub fn split_pages(text: &str) -> Vec<String> {
    let mut pages = vec![];
    let mut current = String::new();

    // `lines` strips "\r\n" as well as "\n".
    for line in text.lines() {
        if line.trim() == PAGE_SEPARATOR {
            push_page(&mut pages, &current);
            current.clear();
            continue;
        }

        current.push_str(line);
        current.push('\n');
    }

    push_page(&mut pages, &current);
    pages
}

fn push_page(pages: &mut Vec<String>, page: &str) {
    let page = page.trim();

    if !page.is_empty() {
        pages.push(page.to_string());
    }
}

/// Reads a flat `{"key": "value", ...}` object into a map. Comment keys are skipped. Malformed input
/// gives whatever pairs were read before the problem.
pub fn parse_string_map(json: &str) -> HashMap<String, String> {
    ObjectReader::new(json)
        .filter(|(key, _)| !key.starts_with(COMMENT_PREFIX))
        .collect()
}

/// Like `parse_string_map`, but for objects keyed by integers (`{"5": "Mia Fey"}`). Keys that aren't
/// integers are skipped.
pub fn parse_int_map(json: &str) -> HashMap<i32, String> {
    ObjectReader::new(json)
        .filter(|(key, _)| !key.starts_with(COMMENT_PREFIX))
        .filter_map(|(key, value)| Some((key.trim().parse().ok()?, value)))
        .collect()
}

/// Iterator over the key/value pairs of a single-level JSON object with string values. Stops at
/// the end of the object or at the first thing it doesn't understand.
struct ObjectReader<'src> {
    chars: Peekable<Chars<'src>>,

    /// Set once we've hit the end of the object or something malformed.
    done: bool,
}

impl<'src> ObjectReader<'src> {
    fn new(json: &'src str) -> ObjectReader<'src> {
        let mut reader = ObjectReader {
            chars: json.chars().peekable(),
            done: false,
        };

        reader.skip_whitespace();

        // Strip a UTF-8 BOM if an editor added one.
        if reader.chars.peek() == Some(&'\u{feff}') {
            reader.chars.next();
            reader.skip_whitespace();
        }

        if reader.chars.next() != Some('{') {
            reader.done = true;
        }

        reader
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    /// Reads a quoted string. The opening quote must be the next character. Returns `None` if the
    /// string is unterminated.
    fn read_string(&mut self) -> Option<String> {
        if self.chars.next() != Some('"') {
            return None;
        }

        let mut string = String::new();

        loop {
            match self.chars.next()? {
                '"' => return Some(string),
                '\\' => string.push(self.read_escape()?),
                c => string.push(c),
            }
        }
    }

    /// Decodes the escape sequence following a backslash.
    fn read_escape(&mut self) -> Option<char> {
        let c = match self.chars.next()? {
            'b' => '\u{8}',
            'f' => '\u{c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'u' => return self.read_unicode_escape(),

            // Covers `\"`, `\\` and `\/`. Unknown escapes keep the character as written.
            other => other,
        };

        Some(c)
    }

    fn read_hex4(&mut self) -> Option<u32> {
        let mut value = 0;

        for _ in 0..4 {
            value = value * 16 + self.chars.next()?.to_digit(16)?;
        }

        Some(value)
    }

    fn read_unicode_escape(&mut self) -> Option<char> {
        let high = self.read_hex4()?;

        if !(0xd800..0xdc00).contains(&high) {
            return Some(char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER));
        }

        // High surrogate, so a `\uXXXX` low surrogate should follow. Anything else is left for
        // the caller to read.
        let mut ahead = self.chars.clone();

        if ahead.next() != Some('\\') || ahead.next() != Some('u') {
            return Some(char::REPLACEMENT_CHARACTER);
        }

        self.chars = ahead;

        let low = self.read_hex4()?;

        if !(0xdc00..0xe000).contains(&low) {
            return Some(char::REPLACEMENT_CHARACTER);
        }

        let combined = 0x10000 + ((high - 0xd800) << 10) + (low - 0xdc00);
        Some(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn read_pair(&mut self) -> Option<(String, String)> {
        loop {
            self.skip_whitespace();

            match self.chars.peek()? {
                ',' => {
                    self.chars.next();
                }

                '"' => break,

                // '}' or anything we don't support.
                _ => return None,
            }
        }

        let key = self.read_string()?;

        self.skip_whitespace();
        self.chars.next_if_eq(&':')?;
        self.skip_whitespace();

        // Only string values are supported. A number, array or object ends the read.
        let value = self.read_string()?;

        Some((key, value))
    }
}

impl Iterator for ObjectReader<'_> {
    type Item = (String, String);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let pair = self.read_pair();

        if pair.is_none() {
            self.done = true;
        }

        pair
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_page_without_separator() {
        assert_eq!(split_pages("  The attorney's badge.\n"), vec!["The attorney's badge."]);
    }

    #[test]
    fn blank_input_has_no_pages() {
        assert!(split_pages("").is_empty());
        assert!(split_pages(" \n\t\n").is_empty());
    }

    #[test]
    fn separator_splits_and_trims() {
        let text = "First page.\n---\n  Second page,\nstill second.  \r\n---\r\nThird.";
        let pages = split_pages(text);

        assert_eq!(
            pages,
            vec!["First page.", "Second page,\nstill second.", "Third."]
        );
    }

    #[test]
    fn empty_pages_are_dropped() {
        let text = "---\nOnly page\n---\n\n---\n---\n";
        let pages = split_pages(text);

        // Four separators, so at most five pages, but only one has text.
        assert_eq!(pages, vec!["Only page"]);
    }

    #[test]
    fn separator_inside_a_line_is_text() {
        let pages = split_pages("A --- B\nC");
        assert_eq!(pages, vec!["A --- B\nC"]);
    }

    #[test]
    fn int_map_skips_comments() {
        let map = parse_int_map(r#"{"5": "Mia Fey", "_comment": "note"}"#);

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&5).map(String::as_str), Some("Mia Fey"));
    }

    #[test]
    fn int_map_skips_non_integer_keys() {
        let map = parse_int_map(r#"{"1": "Phoenix", "judge": "Judge", " 2 ": "Maya"}"#);

        assert_eq!(map.len(), 2);
        assert_eq!(map[&1], "Phoenix");
        assert_eq!(map[&2], "Maya");
    }

    #[test]
    fn string_map_decodes_escapes() {
        let map = parse_string_map(
            r#"{ "quote": "She said \"objection\"", "path": "a\\b\/c", "lines": "one\ntwo", "e": "café" }"#,
        );

        assert_eq!(map["quote"], "She said \"objection\"");
        assert_eq!(map["path"], "a\\b/c");
        assert_eq!(map["lines"], "one\ntwo");
        assert_eq!(map["e"], "café");
    }

    #[test]
    fn surrogate_pairs_are_combined() {
        let map = parse_string_map(r#"{"gavel": "\ud83d\udd28"}"#);
        assert_eq!(map["gavel"], "\u{1f528}");
    }

    #[test]
    fn lone_high_surrogate_keeps_the_next_escape() {
        let map = parse_string_map(r#"{"a": "\ud83d\nx", "b": "\ud83dy"}"#);

        assert_eq!(map["a"], "\u{fffd}\nx");
        assert_eq!(map["b"], "\u{fffd}y");
    }

    #[test]
    fn missing_brace_gives_empty_map() {
        assert!(parse_string_map(r#""a": "b""#).is_empty());
        assert!(parse_string_map("").is_empty());
    }

    #[test]
    fn unterminated_string_keeps_earlier_pairs() {
        let map = parse_string_map(r#"{"a": "1", "b": "2", "c": "unterminated"#);

        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], "1");
        assert_eq!(map["b"], "2");
    }

    #[test]
    fn non_string_value_stops_reading() {
        let map = parse_string_map(r#"{"a": "1", "b": 2, "c": "3"}"#);

        assert_eq!(map.len(), 1);
        assert_eq!(map["a"], "1");
    }

    #[test]
    fn missing_closing_brace_is_tolerated() {
        let map = parse_string_map("\u{feff}{\n  \"a\": \"1\",\n  \"b\": \"2\",\n");
        assert_eq!(map.len(), 2);
    }
}
