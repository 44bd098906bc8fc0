//! Property-based tests for the codecs.
//!
//! Uses proptest to check that:
//! 1. Low-level and CTCP quoting round-trip for arbitrary text
//! 2. Building then extracting a CTCP frame gives the frame back
//! 3. Parsing never panics and well-formed lines re-parse to the same message
//! 4. Wrapped message text stays within the line budget, and text that
//!    already fits is left alone
//!
//! Run with: `cargo test --test proptest_quoting`

use proptest::prelude::*;
use slirc_client::ctcp::{build_ctcp_string, ctcp_dequote, ctcp_quote, extract_ctcp, CtcpFrame};
use slirc_client::util::wrap_text;
use slirc_client::{low_dequote, low_quote, parse_line, Message, Prefix};

// =============================================================================
// STRATEGIES
// =============================================================================

/// Text rich in the characters the quoting layers care about.
fn control_heavy_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just('\0'),
            Just('\n'),
            Just('\r'),
            Just('\x10'),
            Just('\x01'),
            Just('\\'),
            Just('a'),
            Just(' '),
            any::<char>(),
        ],
        0..64,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// Valid IRC nickname, max 9 chars per RFC 2812.
fn nickname_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z\\[\\]\\\\^_`{|}][a-zA-Z0-9\\-\\[\\]\\\\^_`{|}]{0,8}")
        .expect("valid regex")
}

fn username_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9]{0,9}").expect("valid regex")
}

fn hostname_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z0-9]+(\\.[a-z0-9]+)*").expect("valid regex")
}

/// A middle parameter: no spaces, does not start with ':'.
fn middle_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[#&a-zA-Z0-9][a-zA-Z0-9#&+\\-_.]{0,15}").expect("valid regex")
}

/// Trailing text: anything but CR, LF and NUL.
fn trailing_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[^\r\n\0]{0,200}").expect("valid regex")
}

fn ctcp_tag_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z]{1,12}").expect("valid regex")
}

/// CTCP data: no delimiter, no leading space-free constraint beyond that.
fn ctcp_data_strategy() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop::string::string_regex("[^\x01]{0,60}").expect("valid regex"))
}

fn message_strategy() -> impl Strategy<Value = Message> {
    (
        nickname_strategy(),
        username_strategy(),
        hostname_strategy(),
        prop::string::string_regex("[A-Z]{3,8}|[0-9]{3}").expect("valid regex"),
        prop::collection::vec(middle_strategy(), 0..4),
        prop::string::string_regex("[a-zA-Z0-9 :,.!?#@'\\-]{0,200}").expect("valid regex"),
    )
        .prop_map(|(nick, user, host, command, mut args, trailing)| {
            args.push(trailing);
            Message::new(Prefix::new(&nick, &user, &host), &command, args)
        })
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    #[test]
    fn low_quote_round_trip(s in control_heavy_text()) {
        let quoted = low_quote(&s);
        prop_assert!(!quoted.contains('\n'));
        prop_assert!(!quoted.contains('\r'));
        prop_assert!(!quoted.contains('\0'));
        prop_assert_eq!(low_dequote(&quoted), s);
    }

    #[test]
    fn ctcp_quote_round_trip(s in control_heavy_text()) {
        let quoted = ctcp_quote(&s);
        prop_assert!(!quoted.contains('\x01'));
        prop_assert_eq!(ctcp_dequote(&quoted), s);
    }

    #[test]
    fn ctcp_frame_round_trip(tag in ctcp_tag_strategy(), data in ctcp_data_strategy()) {
        let frame = CtcpFrame::new(&tag, data.as_deref());
        let (normal, frames) = extract_ctcp(&build_ctcp_string(&[frame]));
        prop_assert!(normal.is_empty());
        prop_assert_eq!(frames, vec![CtcpFrame::new(&tag.to_uppercase(), data.as_deref())]);
    }

    /// Parsing arbitrary input must never panic.
    #[test]
    fn parse_never_panics(s in any::<String>()) {
        let msg = parse_line(&s);
        prop_assert!(!msg.command.contains(' '));
        let _ = msg.to_string();
    }

    #[test]
    fn message_reparse(msg in message_strategy()) {
        let serialized = msg.to_string();
        let reparsed = parse_line(&serialized);
        prop_assert_eq!(&msg, &reparsed, "reparse failed for: {}", serialized);
    }

    #[test]
    fn wrapped_lines_fit_budget(text in trailing_strategy(), width in 1usize..64) {
        for line in wrap_text(&text, width) {
            prop_assert!(!line.is_empty());
            prop_assert!(line.chars().count() <= width);
        }
    }

    #[test]
    fn text_within_budget_is_kept_verbatim(text in trailing_strategy()) {
        let lines = wrap_text(&text, 200);
        if text.trim().is_empty() {
            prop_assert!(lines.is_empty());
        } else {
            prop_assert_eq!(lines, vec![text]);
        }
    }
}
