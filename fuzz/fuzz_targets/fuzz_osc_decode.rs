//! Fuzz target: `codec::decode`
//!
//! Feeds arbitrary packets to the OSC decoder.  Anything it accepts must
//! re-encode and decode to the same message.
//!
//! cargo fuzz run fuzz_osc_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use motionlink::osc::Arg;
use motionlink::osc::codec::{self, MAX_PACKET_LEN};

fuzz_target!(|data: &[u8]| {
    let Ok(msg) = codec::decode(data) else {
        return;
    };
    assert!(msg.address().starts_with('/'));

    let mut buf = [0u8; MAX_PACKET_LEN];
    // Decoded messages may exceed one packet once padded; only check
    // those that fit.
    if let Ok(n) = codec::encode(&msg, &mut buf) {
        let again = codec::decode(&buf[..n]).expect("re-encoded packet must decode");
        // NaN floats never compare equal.
        if msg.args().iter().all(|a| !matches!(a, Arg::Float(f) if f.is_nan())) {
            assert_eq!(again, msg);
        }
    }
});
