//! Fuzz target: `SlipDecoder::push`
//!
//! Streams arbitrary bytes through the SLIP decoder and checks that every
//! frame it yields is non-empty and fits a packet buffer.
//!
//! cargo fuzz run fuzz_slip_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use motionlink::osc::codec::MAX_PACKET_LEN;
use motionlink::osc::slip::{END, SlipDecoder};

fuzz_target!(|data: &[u8]| {
    let mut decoder = SlipDecoder::new();

    for &b in data {
        if let Some(frame) = decoder.push(b) {
            assert!(!frame.is_empty(), "decoder must not yield empty frame");
            assert!(frame.len() <= MAX_PACKET_LEN, "frame exceeds MAX_PACKET_LEN");
        }
    }

    // A lone END after a reset never completes a frame.
    decoder.reset();
    assert!(decoder.push(END).is_none());
});
