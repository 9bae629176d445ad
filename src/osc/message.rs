//! Address-tagged, typed-argument message.
//!
//! Messages are built, sent and dropped within a single dispatch; nothing
//! in the firmware keeps them around.  All storage is fixed-capacity so a
//! message never touches the heap.

use core::fmt::Write;

/// Maximum address length in bytes (without the terminating NUL).
pub const MAX_ADDRESS_LEN: usize = 64;

/// Maximum number of arguments carried by one message.
pub const MAX_ARGS: usize = 16;

/// Maximum length of a string argument in bytes.
pub const MAX_STRING_ARG_LEN: usize = 64;

pub type Address = heapless::String<MAX_ADDRESS_LEN>;
pub type StringArg = heapless::String<MAX_STRING_ARG_LEN>;

/// One typed argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Int(i32),
    Float(f32),
    Str(StringArg),
}

impl Arg {
    /// Integer view of the argument.
    ///
    /// Floats are accepted and truncated toward zero since most host
    /// tools send every number as a float.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.is_finite() => Some(*f as i32),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// OSC type tag character.
    pub fn type_tag(&self) -> u8 {
        match self {
            Self::Int(_) => b'i',
            Self::Float(_) => b'f',
            Self::Str(_) => b's',
        }
    }
}

impl From<i32> for Arg {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for Arg {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Self::Str(truncated(v))
    }
}

/// A single message: address plus ordered arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    address: Address,
    args: heapless::Vec<Arg, MAX_ARGS>,
}

impl Message {
    /// Create an empty message.  Addresses longer than
    /// [`MAX_ADDRESS_LEN`] are truncated.
    pub fn new(address: &str) -> Self {
        Self {
            address: truncated(address),
            args: heapless::Vec::new(),
        }
    }

    /// Append an argument.  Returns `false` if the message is full.
    pub fn push(&mut self, arg: impl Into<Arg>) -> bool {
        self.args.push(arg.into()).is_ok()
    }

    /// Builder-style [`push`](Self::push); extra arguments past
    /// [`MAX_ARGS`] are dropped.
    #[must_use]
    pub fn with(mut self, arg: impl Into<Arg>) -> Self {
        let _ = self.push(arg);
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn arg(&self, index: usize) -> Option<&Arg> {
        self.args.get(index)
    }

    pub fn int(&self, index: usize) -> Option<i32> {
        self.arg(index).and_then(Arg::as_int)
    }

    pub fn string(&self, index: usize) -> Option<&str> {
        self.arg(index).and_then(Arg::as_str)
    }
}

/// Copy `s` into a bounded string, cutting at the last char boundary that
/// fits.
pub fn truncated<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Format into a bounded string; output past capacity is dropped.
pub fn formatted<const N: usize>(args: core::fmt::Arguments<'_>) -> heapless::String<N> {
    let mut out = heapless::String::new();
    let _ = out.write_fmt(args);
    out
}
