//! Unified error type.
//!
//! Every subsystem error converts into [`Error`], so code that crosses
//! subsystem boundaries can use `?` and log one type.  All variants are
//! plain data; nothing here allocates.

use core::fmt;

use crate::app::config_page::PageError;
use crate::app::ports::ConfigError;
use crate::osc::codec::CodecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A packet could not be encoded or decoded.
    Codec(CodecError),
    /// The config record could not be loaded or stored.
    Config(ConfigError),
    /// A configuration page frame was malformed.
    ConfigPage(PageError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(e) => write!(f, "codec: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::ConfigPage(e) => write!(f, "config page: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<PageError> for Error {
    fn from(e: PageError) -> Self {
        Self::ConfigPage(e)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
