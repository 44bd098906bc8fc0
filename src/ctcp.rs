//! CTCP (Client-to-Client Protocol) message handling.
//!
//! CTCP frames are embedded in PRIVMSG and NOTICE text between two `\x01`
//! delimiters. Inside a frame, the delimiter and the backslash are quoted
//! with a backslash so a frame body can carry arbitrary text.
//!
//! # Reference
//! - <http://www.irchelp.org/irchelp/rfc/ctcpspec.html>
//!
//! # Example
//!
//! ```
//! use slirc_client::ctcp::{build_ctcp_string, extract_ctcp, CtcpFrame};
//!
//! let wire = build_ctcp_string(&[CtcpFrame::new("action", Some("waves hello"))]);
//! assert_eq!(wire, "\x01ACTION waves hello\x01");
//!
//! let (normal, frames) = extract_ctcp(&wire);
//! assert!(normal.is_empty());
//! assert_eq!(frames[0].tag, "ACTION");
//! assert_eq!(frames[0].data.as_deref(), Some("waves hello"));
//! ```

use std::fmt;

/// The CTCP delimiter character (`\x01`).
pub const X_DELIM: char = '\x01';

/// The CTCP quote character (`\`).
pub const X_QUOTE: char = '\\';

/// A single CTCP frame.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CtcpFrame {
    /// Upper-cased CTCP tag, e.g. `ACTION` or `VERSION`.
    pub tag: String,
    /// Everything after the first space, if there was one.
    pub data: Option<String>,
}

impl CtcpFrame {
    /// Create a frame; the tag is upper-cased.
    pub fn new(tag: &str, data: Option<&str>) -> Self {
        CtcpFrame {
            tag: tag.to_uppercase(),
            data: data.map(str::to_owned),
        }
    }

    fn parse(body: &str) -> Self {
        match body.split_once(' ') {
            Some((tag, data)) => CtcpFrame::new(tag, Some(data)),
            None => CtcpFrame::new(body, None),
        }
    }
}

impl fmt::Display for CtcpFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            Some(data) => write!(f, "{} {}", self.tag, data),
            None => f.write_str(&self.tag),
        }
    }
}

/// CTCP-quote a frame body.
pub fn ctcp_quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            X_QUOTE => quoted.push_str("\\\\"),
            X_DELIM => quoted.push_str("\\a"),
            c => quoted.push(c),
        }
    }
    quoted
}

/// Reverse [`ctcp_quote`].
///
/// Unknown sequences yield their second character and a trailing lone
/// backslash is kept, mirroring [`crate::quote::low_dequote`].
pub fn ctcp_dequote(s: &str) -> String {
    let mut unquoted = String::with_capacity(s.len());
    let mut iter = s.chars();
    while let Some(c) = iter.next() {
        let r = if c == X_QUOTE {
            match iter.next() {
                Some(X_QUOTE) => X_QUOTE,
                Some('a') => X_DELIM,
                Some(c) => c,
                None => X_QUOTE,
            }
        } else {
            c
        };
        unquoted.push(r);
    }
    unquoted
}

/// Split message text into its plain segments and its CTCP frames.
///
/// Segments between delimiters alternate between plain text and frame
/// bodies, starting with plain text. Empty segments of either kind are
/// dropped.
pub fn extract_ctcp(text: &str) -> (Vec<String>, Vec<CtcpFrame>) {
    let mut normal = Vec::new();
    let mut frames = Vec::new();

    for (i, segment) in text.split(X_DELIM).enumerate() {
        if segment.is_empty() {
            continue;
        }
        if i % 2 == 0 {
            normal.push(segment.to_owned());
        } else {
            frames.push(CtcpFrame::parse(&ctcp_dequote(segment)));
        }
    }

    (normal, frames)
}

/// Serialize frames for embedding in PRIVMSG or NOTICE text.
///
/// Frames are concatenated with no separator.
pub fn build_ctcp_string(frames: &[CtcpFrame]) -> String {
    let mut out = String::new();
    for frame in frames {
        let body = CtcpFrame::new(&frame.tag, frame.data.as_deref()).to_string();
        out.push(X_DELIM);
        out.push_str(&ctcp_quote(&body));
        out.push(X_DELIM);
    }
    out
}
