//! Fuzz target for CTCP extraction and dequoting

#![no_main]

use libfuzzer_sys::fuzz_target;
use slirc_client::ctcp::{ctcp_dequote, extract_ctcp};
use std::str;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = str::from_utf8(data) {
        let (normal, frames) = extract_ctcp(input);
        for segment in &normal {
            assert!(!segment.is_empty());
        }
        for frame in &frames {
            assert_eq!(frame.tag, frame.tag.to_uppercase());
        }
        let _ = ctcp_dequote(input);
    }
});
