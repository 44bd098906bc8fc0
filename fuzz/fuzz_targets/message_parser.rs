//! Fuzz target for IRC line parsing
//!
//! Feeds arbitrary bytes through the line decoder, low dequoting and the
//! parser, none of which may panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use slirc_client::{low_dequote, parse_line, LineCodec};

fuzz_target!(|data: &[u8]| {
    if data.len() > 4096 {
        return;
    }

    let line = LineCodec::decode_text(data);
    let msg = parse_line(&low_dequote(&line));

    // Serializing a parsed message must not panic either
    let _ = msg.to_string();
});
