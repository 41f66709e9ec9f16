//! Error types
//!
//! One error enum for the whole crate. Every variant maps to a short
//! machine-readable reason via [`Error::reason`], which is what callers
//! match on when they need to report failures across a boundary.

use std::io;
use thiserror::Error;

/// Crate result alias
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures raised by the builder, the codec, the dumps and the loader
#[derive(Debug, Error)]
pub enum Error {
    /// Text or a nested tag was added through a cursor whose tag is closed
    #[error("cursor used after its tag was closed")]
    UseAfterClose,

    /// `close_tag` was called with no open tag left on the sink
    #[error("close_tag called with no open tag")]
    UnbalancedClose,

    /// Binary stream ended before the named field was fully read
    #[error("binary stream truncated while reading {0}")]
    Truncated(&'static str),

    /// Binary stream is complete but describes an impossible document
    #[error("corrupt binary stream: {0}")]
    Corrupt(&'static str),

    /// A text dump met a byte outside its escape table
    #[error("byte {0:#04x} has no escape sequence")]
    Unescapable(u8),

    /// Source text could not be mapped onto the builder interface
    #[error("malformed source at line {line}: {message}")]
    MalformedSource {
        /// 1-based line number
        line: usize,
        /// What was wrong
        message: String,
    },

    /// Conversion requested for a codepage without a built-in decoder
    #[error("unsupported codepage {0}")]
    UnsupportedCodepage(u32),

    /// Block content is not valid in its declared encoding
    #[error("text is not valid {0}")]
    InvalidText(&'static str),

    /// Cumulative document length no longer fits the u32 offsets
    #[error("document length exceeds u32 offsets")]
    LengthOverflow,

    /// Underlying sink or source failed
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Short machine-readable reason
    pub fn reason(&self) -> &'static str {
        match self {
            Error::UseAfterClose => "use_after_close",
            Error::UnbalancedClose => "unbalanced_close",
            Error::Truncated(_) => "truncated",
            Error::Corrupt(_) => "corrupt",
            Error::Unescapable(_) => "unescapable_byte",
            Error::MalformedSource { .. } => "malformed_source",
            Error::UnsupportedCodepage(_) => "unsupported_codepage",
            Error::InvalidText(_) => "invalid_text",
            Error::LengthOverflow => "length_overflow",
            Error::Io(_) => "io",
        }
    }

    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        Error::MalformedSource {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasons_are_stable() {
        assert_eq!(Error::UseAfterClose.reason(), "use_after_close");
        assert_eq!(Error::Truncated("block count").reason(), "truncated");
        assert_eq!(Error::Unescapable(0x01).reason(), "unescapable_byte");
        assert_eq!(Error::malformed(3, "bad").reason(), "malformed_source");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Error::Truncated("tag name").to_string(),
            "binary stream truncated while reading tag name"
        );
        assert_eq!(Error::Unescapable(0x01).to_string(), "byte 0x01 has no escape sequence");
        assert_eq!(
            Error::malformed(2, "unexpected </p>").to_string(),
            "malformed source at line 2: unexpected </p>"
        );
    }

    #[test]
    fn test_io_conversion() {
        let err: Error = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert_eq!(err.reason(), "io");
    }
}
