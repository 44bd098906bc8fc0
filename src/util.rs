//! Text helpers for outgoing messages.
//!
//! PRIVMSG and NOTICE bodies longer than the line budget are word-wrapped
//! into several messages rather than being cut off by the server.

/// Default maximum length, in characters, of one PRIVMSG/NOTICE body.
pub const DEFAULT_LINE_BUDGET: usize = 420;

/// Truncates a string to at most `max_chars` characters.
///
/// # Examples
///
/// ```
/// use slirc_client::util::truncate_chars;
///
/// assert_eq!(truncate_chars("hello", 3), "hel");
/// assert_eq!(truncate_chars("héllo", 3), "hél");
/// assert_eq!(truncate_chars("👋🌍🚀", 2), "👋🌍");
/// ```
#[inline]
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Word-wrap `text` into lines of at most `width` characters.
///
/// Embedded newlines start a new line (a CR before them is dropped) and
/// blank lines produce nothing. A line that fits is returned unchanged.
/// Longer lines are broken at the last whitespace that fits; the
/// whitespace at a break is dropped and spacing inside a segment is kept.
/// A word is only split when it alone is longer than `width`.
///
/// # Examples
///
/// ```
/// use slirc_client::util::wrap_text;
///
/// assert_eq!(wrap_text("the quick brown fox", 10), vec!["the quick", "brown fox"]);
/// assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
/// assert_eq!(wrap_text("  two  spaces", 420), vec!["  two  spaces"]);
/// ```
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for line in text.split('\n') {
        wrap_line(line.trim_end_matches('\r'), width, &mut lines);
    }
    lines
}

fn wrap_line(line: &str, width: usize, out: &mut Vec<String>) {
    if line.trim().is_empty() {
        return;
    }

    let mut rest = line;
    while rest.chars().count() > width {
        let head = truncate_chars(rest, width);
        let breaks_after_head = rest[head.len()..].starts_with(char::is_whitespace);

        let cut = match head.rfind(char::is_whitespace) {
            _ if breaks_after_head => head.len(),
            Some(idx) if !head[..idx].trim().is_empty() => idx,
            _ => head.len(),
        };

        let segment = rest[..cut].trim_end();
        if !segment.is_empty() {
            out.push(segment.to_owned());
        }
        rest = rest[cut..].trim_start();
    }

    if !rest.is_empty() {
        out.push(rest.to_owned());
    }
}
