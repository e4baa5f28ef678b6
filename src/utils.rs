use std::fs;
use std::path::Path;

use crate::error::Result;

/// Reads a text file into trimmed lines.
///
/// Vendor headers are frequently Latin-1 rather than UTF-8 (channel labels
/// like `µV` show up as single high bytes), so the bytes are widened to
/// chars instead of going through UTF-8 validation.
pub(crate) fn read_text_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(path)?;
    let content: String = bytes.iter().map(|&b| b as char).collect();
    Ok(content.lines().map(|l| l.trim_end().to_string()).collect())
}

/// First run of ASCII digits in `s`, parsed as an integer.
pub(crate) fn first_integer(s: &str) -> Option<u64> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let digits: String = s[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Trailing run of ASCII digits in `s`.
pub(crate) fn trailing_digits(s: &str) -> &str {
    let trimmed = s.trim_end();
    let start = trimmed
        .rfind(|c: char| !c.is_ascii_digit())
        .map_or(0, |i| i + char_len_at(trimmed, i));
    &trimmed[start..]
}

fn char_len_at(s: &str, idx: usize) -> usize {
    s[idx..].chars().next().map_or(1, char::len_utf8)
}

/// True when the token is an optionally-signed run of digits.
///
/// Used to filter stage values out of text hypnograms whose lines mix labels
/// and numbers.
pub(crate) fn is_integer_token(s: &str) -> bool {
    let body = s.strip_prefix('-').unwrap_or(s);
    !body.is_empty() && body.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_integer_skips_text() {
        assert_eq!(first_integer("BrainVision Header File Version 1.0"), Some(1));
        assert_eq!(first_integer("NumberOfChannels=32"), Some(32));
        assert_eq!(first_integer("no digits"), None);
    }

    #[test]
    fn trailing_digits_extracts_timestamp() {
        let line = "Mk1=New Segment,,1,1,0,20100816121455000000";
        assert_eq!(trailing_digits(line), "20100816121455000000");
        assert_eq!(trailing_digits("abc"), "");
    }

    #[test]
    fn integer_token_filter() {
        assert!(is_integer_token("3"));
        assert!(is_integer_token("-1"));
        assert!(!is_integer_token("N2"));
        assert!(!is_integer_token("-"));
        assert!(!is_integer_token(""));
        assert!(!is_integer_token("1.5"));
    }
}
