//! Fuzz target for RPL_ISUPPORT token decoding

#![no_main]

use libfuzzer_sys::fuzz_target;
use slirc_client::Isupport;
use std::str;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = str::from_utf8(data) {
        let isupport = Isupport::parse_tokens(input.split(' '));
        let _ = isupport.channel_prefixes();
        let _ = isupport.prefix();
        let _ = isupport.nicklen();
    }
});
