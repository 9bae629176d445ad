//! OSC 1.0 packet codec.
//!
//! Wire format of a single message:
//! ```text
//! ┌──────────────────┬──────────────────────┬──────────────────────┐
//! │ address\0 (pad4) │ ,tags\0 (pad4)       │ arguments            │
//! └──────────────────┴──────────────────────┴──────────────────────┘
//! ```
//! Integers and floats are big-endian 32-bit.  Strings are NUL-terminated
//! and padded to a multiple of four bytes.  Only the `i`, `f` and `s`
//! tags are understood; bundles are rejected.

use core::fmt;

use super::message::{Arg, MAX_ADDRESS_LEN, MAX_ARGS, MAX_STRING_ARG_LEN, Message, StringArg};

/// Largest encoded packet the firmware produces or accepts.
pub const MAX_PACKET_LEN: usize = 512;

const BUNDLE_TAG: &[u8] = b"#bundle\0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Packet ended before a field was complete.
    Truncated,
    /// Address does not start with `/` or is too long.
    BadAddress,
    /// Missing `,` or unsupported type tag.
    BadTypeTag(u8),
    /// More arguments than [`MAX_ARGS`].
    TooManyArgs,
    /// String argument too long or not UTF-8.
    BadString,
    /// `#bundle` packets are not supported.
    Bundle,
    /// Output buffer too small.
    BufferFull,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated => write!(f, "packet truncated"),
            Self::BadAddress => write!(f, "invalid address"),
            Self::BadTypeTag(t) => write!(f, "unsupported type tag 0x{t:02x}"),
            Self::TooManyArgs => write!(f, "too many arguments"),
            Self::BadString => write!(f, "invalid string argument"),
            Self::Bundle => write!(f, "bundles are not supported"),
            Self::BufferFull => write!(f, "output buffer full"),
        }
    }
}

const fn padded(len: usize) -> usize {
    (len + 4) & !3
}

// ── Encoding ──────────────────────────────────────────────────

struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl Writer<'_> {
    fn bytes(&mut self, data: &[u8]) -> Result<(), CodecError> {
        let end = self.pos + data.len();
        if end > self.buf.len() {
            return Err(CodecError::BufferFull);
        }
        self.buf[self.pos..end].copy_from_slice(data);
        self.pos = end;
        Ok(())
    }

    /// NUL-terminate and pad a string field.
    fn padded_str(&mut self, data: &[u8]) -> Result<(), CodecError> {
        let end = self.pos + padded(data.len());
        if end > self.buf.len() {
            return Err(CodecError::BufferFull);
        }
        self.bytes(data)?;
        self.buf[self.pos..end].fill(0);
        self.pos = end;
        Ok(())
    }
}

/// Encode `msg` into `out`.  Returns the number of bytes written.
pub fn encode(msg: &Message, out: &mut [u8]) -> Result<usize, CodecError> {
    let mut w = Writer { buf: out, pos: 0 };
    w.padded_str(msg.address().as_bytes())?;

    let mut tags = [0u8; MAX_ARGS + 1];
    tags[0] = b',';
    for (slot, arg) in tags[1..].iter_mut().zip(msg.args()) {
        *slot = arg.type_tag();
    }
    w.padded_str(&tags[..=msg.len()])?;

    for arg in msg.args() {
        match arg {
            Arg::Int(i) => w.bytes(&i.to_be_bytes())?,
            Arg::Float(f) => w.bytes(&f.to_be_bytes())?,
            Arg::Str(s) => w.padded_str(s.as_bytes())?,
        }
    }
    Ok(w.pos)
}

// ── Decoding ──────────────────────────────────────────────────

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Read a NUL-terminated, padded field (without the NUL).
    fn padded_str(&mut self) -> Result<&'a [u8], CodecError> {
        let rest = &self.data[self.pos..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(CodecError::Truncated)?;
        let field_len = padded(nul);
        if field_len > rest.len() {
            return Err(CodecError::Truncated);
        }
        self.pos += field_len;
        Ok(&rest[..nul])
    }

    fn word(&mut self) -> Result<[u8; 4], CodecError> {
        let end = self.pos + 4;
        let bytes = self
            .data
            .get(self.pos..end)
            .ok_or(CodecError::Truncated)?;
        self.pos = end;
        let mut word = [0u8; 4];
        word.copy_from_slice(bytes);
        Ok(word)
    }
}

/// Decode a single OSC message packet.
pub fn decode(packet: &[u8]) -> Result<Message, CodecError> {
    if packet.starts_with(BUNDLE_TAG) {
        return Err(CodecError::Bundle);
    }

    let mut r = Reader { data: packet, pos: 0 };

    let address = r.padded_str()?;
    if address.first() != Some(&b'/') || address.len() > MAX_ADDRESS_LEN {
        return Err(CodecError::BadAddress);
    }
    let address = core::str::from_utf8(address).map_err(|_| CodecError::BadAddress)?;
    let mut msg = Message::new(address);

    // A message with no type-tag string at all carries no arguments.
    if r.pos == packet.len() {
        return Ok(msg);
    }

    let tags = r.padded_str()?;
    match tags.first() {
        Some(b',') => {}
        Some(&t) => return Err(CodecError::BadTypeTag(t)),
        None => return Err(CodecError::BadTypeTag(0)),
    }
    let tags = &tags[1..];
    if tags.len() > MAX_ARGS {
        return Err(CodecError::TooManyArgs);
    }

    for &tag in tags {
        let arg = match tag {
            b'i' => Arg::Int(i32::from_be_bytes(r.word()?)),
            b'f' => Arg::Float(f32::from_be_bytes(r.word()?)),
            b's' => {
                let raw = r.padded_str()?;
                if raw.len() > MAX_STRING_ARG_LEN {
                    return Err(CodecError::BadString);
                }
                let s = core::str::from_utf8(raw).map_err(|_| CodecError::BadString)?;
                let mut bounded = StringArg::new();
                bounded.push_str(s).map_err(|_| CodecError::BadString)?;
                Arg::Str(bounded)
            }
            other => return Err(CodecError::BadTypeTag(other)),
        };
        // Capacity was checked against the tag count above.
        let _ = msg.push(arg);
    }

    Ok(msg)
}
