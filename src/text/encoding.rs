//! Codepage Identifiers and Conversion
//!
//! Narrow text blocks carry a numeric codepage id. Only the codepages that
//! need no lookup tables are decoded here:
//! - UTF-8 (validated)
//! - ISO-8859-1 (each byte is the code point)
//! - US-ASCII (7-bit only)
//!
//! Any other id is kept and serialized as-is but cannot be converted.

use std::borrow::Cow;

use crate::error::{Error, Result};

/// Codepage left for the consumer to decide
pub const DEFAULT: u32 = 0;
/// UTF-8
pub const UTF_8: u32 = 65001;
/// ISO-8859-1 (Latin-1)
pub const ISO_8859_1: u32 = 28591;
/// US-ASCII
pub const US_ASCII: u32 = 20127;

/// Codepages with a built-in decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Utf8,
    Latin1,
    Ascii,
}

impl Charset {
    /// Map a codepage id, resolving [`DEFAULT`] to `default`
    pub fn resolve(codepage: u32, default: u32) -> Result<Self> {
        let codepage = if codepage == DEFAULT { default } else { codepage };
        match codepage {
            // a DEFAULT default still means UTF-8
            DEFAULT | UTF_8 => Ok(Charset::Utf8),
            ISO_8859_1 => Ok(Charset::Latin1),
            US_ASCII => Ok(Charset::Ascii),
            other => Err(Error::UnsupportedCodepage(other)),
        }
    }

    /// Codepage id for this charset
    pub fn codepage(self) -> u32 {
        match self {
            Charset::Utf8 => UTF_8,
            Charset::Latin1 => ISO_8859_1,
            Charset::Ascii => US_ASCII,
        }
    }

    /// Decode bytes to UTF-8, borrowing when no conversion is needed
    pub fn to_utf8(self, bytes: &[u8]) -> Result<Cow<'_, str>> {
        match self {
            Charset::Utf8 => std::str::from_utf8(bytes)
                .map(Cow::Borrowed)
                .map_err(|_| Error::InvalidText("UTF-8")),
            Charset::Ascii => {
                if !bytes.is_ascii() {
                    return Err(Error::InvalidText("US-ASCII"));
                }
                // ASCII is a UTF-8 subset
                std::str::from_utf8(bytes)
                    .map(Cow::Borrowed)
                    .map_err(|_| Error::InvalidText("US-ASCII"))
            }
            Charset::Latin1 => {
                if bytes.is_ascii() {
                    return std::str::from_utf8(bytes)
                        .map(Cow::Borrowed)
                        .map_err(|_| Error::InvalidText("ISO-8859-1"));
                }
                Ok(Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()))
            }
        }
    }

    /// Decode bytes to UTF-16 code units
    pub fn to_utf16(self, bytes: &[u8]) -> Result<Vec<u16>> {
        match self {
            Charset::Latin1 => Ok(bytes.iter().map(|&b| u16::from(b)).collect()),
            Charset::Utf8 | Charset::Ascii => Ok(self.to_utf8(bytes)?.encode_utf16().collect()),
        }
    }
}

/// Decode narrow bytes in `codepage` to UTF-8
pub fn narrow_to_utf8(codepage: u32, default: u32, bytes: &[u8]) -> Result<Cow<'_, str>> {
    Charset::resolve(codepage, default)?.to_utf8(bytes)
}

/// Decode narrow bytes in `codepage` to UTF-16 code units
pub fn narrow_to_utf16(codepage: u32, default: u32, bytes: &[u8]) -> Result<Vec<u16>> {
    Charset::resolve(codepage, default)?.to_utf16(bytes)
}

/// Convert UTF-16 code units to UTF-8
///
/// Unpaired surrogates are rejected rather than replaced.
pub fn utf16_to_utf8(units: &[u16]) -> Result<String> {
    String::from_utf16(units).map_err(|_| Error::InvalidText("UTF-16"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_default() {
        assert_eq!(Charset::resolve(DEFAULT, DEFAULT).unwrap(), Charset::Utf8);
        assert_eq!(Charset::resolve(DEFAULT, ISO_8859_1).unwrap(), Charset::Latin1);
        assert_eq!(Charset::resolve(US_ASCII, ISO_8859_1).unwrap(), Charset::Ascii);
    }

    #[test]
    fn test_resolve_unknown() {
        match Charset::resolve(1251, UTF_8) {
            Err(Error::UnsupportedCodepage(1251)) => {}
            other => panic!("expected UnsupportedCodepage, got {:?}", other),
        }
    }

    #[test]
    fn test_utf8_borrowed() {
        let out = narrow_to_utf8(UTF_8, DEFAULT, "héllo".as_bytes()).unwrap();
        assert!(matches!(out, Cow::Borrowed("héllo")));
    }

    #[test]
    fn test_invalid_utf8() {
        let err = narrow_to_utf8(UTF_8, DEFAULT, &[0x66, 0xFF]).unwrap_err();
        assert_eq!(err.reason(), "invalid_text");
    }

    #[test]
    fn test_latin1() {
        let out = narrow_to_utf8(ISO_8859_1, DEFAULT, &[b'c', 0xE9]).unwrap();
        assert_eq!(out, "cé");
        assert_eq!(
            narrow_to_utf16(ISO_8859_1, DEFAULT, &[b'c', 0xE9]).unwrap(),
            vec![0x63u16, 0xE9]
        );
    }

    #[test]
    fn test_ascii_rejects_high_bytes() {
        assert!(narrow_to_utf8(US_ASCII, DEFAULT, b"plain").is_ok());
        assert!(narrow_to_utf8(US_ASCII, DEFAULT, &[0x80]).is_err());
    }

    #[test]
    fn test_utf16_round() {
        let units = narrow_to_utf16(UTF_8, DEFAULT, "Строка 😀".as_bytes()).unwrap();
        assert_eq!(utf16_to_utf8(&units).unwrap(), "Строка 😀");
    }

    #[test]
    fn test_unpaired_surrogate() {
        assert!(utf16_to_utf8(&[0xD800]).is_err());
    }
}
