//! TextBlock - immutable, shared run of text
//!
//! A block holds either narrow bytes tagged with a codepage id or UTF-16
//! code units. Content sits behind an `Arc`, so cloning a block is O(1) and
//! the same storage can be held by several documents on different threads.

use std::borrow::Cow;
use std::fmt;
use std::io::{self, Read, Write};
use std::sync::Arc;

use super::encoding;
use crate::codec::varint::{read_bytes, read_len, read_varint, varint_len, write_varint};
use crate::error::{Error, Result};

/// Size in bytes of one wide unit on the wire
pub const WIDE_UNIT_SIZE: usize = 2;

/// Discriminant of a [`TextBlock`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockEncoding {
    /// Narrow bytes in the given codepage
    Narrow(u32),
    /// UTF-16 code units
    Wide,
}

impl BlockEncoding {
    /// Encoding id on the wire: 0 for wide, codepage + 1 otherwise
    #[inline]
    pub fn wire_id(self) -> u64 {
        match self {
            BlockEncoding::Wide => 0,
            BlockEncoding::Narrow(codepage) => u64::from(codepage) + 1,
        }
    }

    /// Inverse of [`wire_id`](Self::wire_id)
    pub fn from_wire_id(id: u64) -> Result<Self> {
        match id {
            0 => Ok(BlockEncoding::Wide),
            n => u32::try_from(n - 1)
                .map(BlockEncoding::Narrow)
                .map_err(|_| Error::Corrupt("block encoding out of range")),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
enum Repr {
    Narrow { codepage: u32, bytes: Arc<[u8]> },
    Wide(Arc<[u16]>),
}

/// One contiguous run of text in a single encoding
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TextBlock {
    repr: Repr,
}

impl TextBlock {
    /// Create a narrow block from bytes in `codepage`
    pub fn narrow(codepage: u32, bytes: &[u8]) -> Self {
        TextBlock {
            repr: Repr::Narrow {
                codepage,
                bytes: Arc::from(bytes),
            },
        }
    }

    /// Create a UTF-8 narrow block
    pub fn utf8(text: &str) -> Self {
        Self::narrow(encoding::UTF_8, text.as_bytes())
    }

    /// Create a wide block from UTF-16 code units
    pub fn wide(units: &[u16]) -> Self {
        TextBlock {
            repr: Repr::Wide(Arc::from(units)),
        }
    }

    /// Create a wide block from a string
    pub fn wide_str(text: &str) -> Self {
        let units: Vec<u16> = text.encode_utf16().collect();
        TextBlock {
            repr: Repr::Wide(Arc::from(units)),
        }
    }

    /// Encoding discriminant
    #[inline]
    pub fn encoding(&self) -> BlockEncoding {
        match &self.repr {
            Repr::Narrow { codepage, .. } => BlockEncoding::Narrow(*codepage),
            Repr::Wide(_) => BlockEncoding::Wide,
        }
    }

    /// True for UTF-16 blocks
    #[inline]
    pub fn is_wide(&self) -> bool {
        matches!(self.repr, Repr::Wide(_))
    }

    /// Length in characters (wide units or narrow bytes)
    #[inline]
    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Narrow { bytes, .. } => bytes.len(),
            Repr::Wide(units) => units.len(),
        }
    }

    /// True if the block holds no text
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the payload in bytes
    #[inline]
    pub fn byte_len(&self) -> usize {
        match &self.repr {
            Repr::Narrow { bytes, .. } => bytes.len(),
            Repr::Wide(units) => units.len() * WIDE_UNIT_SIZE,
        }
    }

    /// Narrow content; empty for wide blocks
    #[inline]
    pub fn as_narrow(&self) -> &[u8] {
        match &self.repr {
            Repr::Narrow { bytes, .. } => bytes,
            Repr::Wide(_) => &[],
        }
    }

    /// Wide content; empty for narrow blocks
    #[inline]
    pub fn as_wide(&self) -> &[u16] {
        match &self.repr {
            Repr::Wide(units) => units,
            Repr::Narrow { .. } => &[],
        }
    }

    /// True if both blocks point at the same backing storage
    pub fn shares_storage(&self, other: &TextBlock) -> bool {
        match (&self.repr, &other.repr) {
            (Repr::Narrow { bytes: a, .. }, Repr::Narrow { bytes: b, .. }) => Arc::ptr_eq(a, b),
            (Repr::Wide(a), Repr::Wide(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Content as UTF-8, resolving the DEFAULT codepage to `default`
    pub fn to_utf8(&self, default: u32) -> Result<Cow<'_, str>> {
        match &self.repr {
            Repr::Narrow { codepage, bytes } => encoding::narrow_to_utf8(*codepage, default, bytes),
            Repr::Wide(units) => encoding::utf16_to_utf8(units).map(Cow::Owned),
        }
    }

    /// Wide copy of this block; wide blocks are shared, not copied
    pub fn to_wide(&self, default: u32) -> Result<TextBlock> {
        match &self.repr {
            Repr::Wide(_) => Ok(self.clone()),
            Repr::Narrow { codepage, bytes } => {
                let units = encoding::narrow_to_utf16(*codepage, default, bytes)?;
                Ok(TextBlock {
                    repr: Repr::Wide(Arc::from(units)),
                })
            }
        }
    }

    /// Exact number of bytes [`write_to`](Self::write_to) produces
    pub fn encoded_len(&self) -> usize {
        varint_len(self.encoding().wire_id()) + varint_len(self.len() as u64) + self.byte_len()
    }

    /// Serialize as encoding id, length, payload
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        write_varint(out, self.encoding().wire_id())?;
        write_varint(out, self.len() as u64)?;
        match &self.repr {
            Repr::Narrow { bytes, .. } => out.write_all(bytes),
            Repr::Wide(units) => {
                let mut payload = Vec::with_capacity(units.len() * WIDE_UNIT_SIZE);
                for unit in units.iter() {
                    payload.extend_from_slice(&unit.to_le_bytes());
                }
                out.write_all(&payload)
            }
        }
    }

    /// Deserialize a block written by [`write_to`](Self::write_to)
    pub fn read_from<R: Read + ?Sized>(input: &mut R) -> Result<Self> {
        let encoding = BlockEncoding::from_wire_id(read_varint(input, "block encoding")?)?;
        let len = read_len(input, "block length")?;
        match encoding {
            BlockEncoding::Narrow(codepage) => {
                let bytes = read_bytes(input, len, "block payload")?;
                Ok(TextBlock {
                    repr: Repr::Narrow {
                        codepage,
                        bytes: Arc::from(bytes),
                    },
                })
            }
            BlockEncoding::Wide => {
                let size = len
                    .checked_mul(WIDE_UNIT_SIZE)
                    .ok_or(Error::Corrupt("wide block too long"))?;
                let bytes = read_bytes(input, size, "block payload")?;
                let units: Vec<u16> = bytes
                    .chunks_exact(WIDE_UNIT_SIZE)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                Ok(TextBlock {
                    repr: Repr::Wide(Arc::from(units)),
                })
            }
        }
    }
}

impl fmt::Debug for TextBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Narrow { codepage, bytes } => f
                .debug_struct("TextBlock")
                .field("codepage", codepage)
                .field("text", &String::from_utf8_lossy(bytes))
                .finish(),
            Repr::Wide(units) => f
                .debug_struct("TextBlock")
                .field("wide", &String::from_utf16_lossy(units))
                .finish(),
        }
    }
}

impl From<&str> for TextBlock {
    fn from(text: &str) -> Self {
        TextBlock::utf8(text)
    }
}
