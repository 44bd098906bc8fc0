//! Low-level message quoting.
//!
//! NUL, LF and CR cannot travel inside an IRC line, so every outgoing line is
//! low-quoted and every incoming line is low-dequoted. The quote character
//! `\x10` introduces a two-character sequence:
//!
//! | Byte   | Quoted        |
//! |--------|---------------|
//! | `\x10` | `\x10\x10`    |
//! | `\0`   | `\x10` `0`    |
//! | `\n`   | `\x10` `n`    |
//! | `\r`   | `\x10` `r`    |
//!
//! # Reference
//! - <http://www.irchelp.org/irchelp/rfc/ctcpspec.html>

/// The low-level quote character (`\x10`).
pub const M_QUOTE: char = '\x10';

/// Low-quote a string for transport.
///
/// # Example
///
/// ```
/// use slirc_client::quote::low_quote;
///
/// assert_eq!(low_quote("a\r\nb"), "a\x10r\x10nb");
/// ```
pub fn low_quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            M_QUOTE => {
                quoted.push(M_QUOTE);
                quoted.push(M_QUOTE);
            }
            '\0' => {
                quoted.push(M_QUOTE);
                quoted.push('0');
            }
            '\n' => {
                quoted.push(M_QUOTE);
                quoted.push('n');
            }
            '\r' => {
                quoted.push(M_QUOTE);
                quoted.push('r');
            }
            c => quoted.push(c),
        }
    }
    quoted
}

/// Reverse [`low_quote`].
///
/// Unknown sequences yield their second character, and a quote character at
/// the very end of the input is kept as is. This never fails.
pub fn low_dequote(s: &str) -> String {
    let mut unquoted = String::with_capacity(s.len());
    let mut iter = s.chars();
    while let Some(c) = iter.next() {
        let r = if c == M_QUOTE {
            match iter.next() {
                Some(M_QUOTE) => M_QUOTE,
                Some('0') => '\0',
                Some('n') => '\n',
                Some('r') => '\r',
                Some(c) => c,
                None => M_QUOTE,
            }
        } else {
            c
        };
        unquoted.push(r);
    }
    unquoted
}
