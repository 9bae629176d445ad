//! SLIP framing (RFC 1055) for packets on the serial link.
//!
//! Wire format:
//! ```text
//! ┌─────┬──────────────────────────────┬─────┐
//! │ END │ payload (END/ESC escaped)    │ END │
//! └─────┴──────────────────────────────┴─────┘
//! ```
//!
//! The decoder accumulates incoming bytes and yields complete frames.
//! A single read may return half a frame, several frames, or line noise
//! between frames; all of those are handled.

use super::codec::MAX_PACKET_LEN;

pub const END: u8 = 0xC0;
pub const ESC: u8 = 0xDB;
pub const ESC_END: u8 = 0xDC;
pub const ESC_ESC: u8 = 0xDD;

/// Worst case: every byte escaped, plus both delimiters.
pub const MAX_ENCODED_LEN: usize = MAX_PACKET_LEN * 2 + 2;

/// Streaming frame decoder.
pub struct SlipDecoder {
    buf: [u8; MAX_PACKET_LEN],
    len: usize,
    escaped: bool,
    /// Set when the current frame overflowed; bytes are discarded until
    /// the next END.
    discarding: bool,
}

impl SlipDecoder {
    pub fn new() -> Self {
        Self {
            buf: [0; MAX_PACKET_LEN],
            len: 0,
            escaped: false,
            discarding: false,
        }
    }

    /// Feed one byte.  Returns the frame payload when `byte` completes a
    /// non-empty frame.  The slice is valid until the next call.
    pub fn push(&mut self, byte: u8) -> Option<&[u8]> {
        if byte == END {
            let len = self.len;
            let complete = len > 0 && !self.discarding;
            self.reset();
            return complete.then(|| &self.buf[..len]);
        }

        if self.discarding {
            return None;
        }

        let decoded = if self.escaped {
            self.escaped = false;
            match byte {
                ESC_END => END,
                ESC_ESC => ESC,
                // Protocol violation; keep the raw byte like most stacks do.
                other => other,
            }
        } else if byte == ESC {
            self.escaped = true;
            return None;
        } else {
            byte
        };

        if self.len == self.buf.len() {
            self.discarding = true;
            return None;
        }
        self.buf[self.len] = decoded;
        self.len += 1;
        None
    }

    /// Drop any partial frame (e.g. after the link re-opens).
    pub fn reset(&mut self) {
        self.len = 0;
        self.escaped = false;
        self.discarding = false;
    }
}

impl Default for SlipDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode `payload` as a SLIP frame into `out`.
///
/// Returns the total number of bytes written, or `None` if `out` is too
/// small.
pub fn encode(payload: &[u8], out: &mut [u8]) -> Option<usize> {
    let mut pos = 0;
    let mut put = |b: u8, pos: &mut usize| -> Option<()> {
        *out.get_mut(*pos)? = b;
        *pos += 1;
        Some(())
    };

    put(END, &mut pos)?;
    for &b in payload {
        match b {
            END => {
                put(ESC, &mut pos)?;
                put(ESC_END, &mut pos)?;
            }
            ESC => {
                put(ESC, &mut pos)?;
                put(ESC_ESC, &mut pos)?;
            }
            other => put(other, &mut pos)?,
        }
    }
    put(END, &mut pos)?;
    Some(pos)
}
