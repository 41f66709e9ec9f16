//! Wire Primitives
//!
//! Unsigned LEB128 integers and raw byte runs. Every integer in the binary
//! format goes through here so that `varint_len` always agrees with what
//! `write_varint` emits.

use std::io::{self, Read, Write};

use crate::error::{Error, Result};

/// Longest encoding of a u64 (ceil(64 / 7))
pub const MAX_VARINT_LEN: usize = 10;

/// Upper bound for speculative pre-allocation driven by untrusted counts
pub(crate) const PREALLOC_CAP: usize = 4096;

/// Number of bytes `write_varint` produces for `value`
#[inline]
pub fn varint_len(mut value: u64) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

/// Write `value` as unsigned LEB128
pub fn write_varint<W: Write + ?Sized>(out: &mut W, mut value: u64) -> io::Result<()> {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let mut n = 0;
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf[n] = byte;
            n += 1;
            break;
        }
        buf[n] = byte | 0x80;
        n += 1;
    }
    out.write_all(&buf[..n])
}

/// Read an unsigned LEB128 value; `what` names the field for errors
pub fn read_varint<R: Read + ?Sized>(input: &mut R, what: &'static str) -> Result<u64> {
    let mut value: u64 = 0;
    for i in 0..MAX_VARINT_LEN {
        let mut byte = [0u8; 1];
        read_exact(input, &mut byte, what)?;
        let low = u64::from(byte[0] & 0x7F);
        let shift = 7 * i as u32;
        // the tenth byte may only carry the top bit of a u64
        if i == MAX_VARINT_LEN - 1 && low > 1 {
            return Err(Error::Corrupt("varint overflows u64"));
        }
        value |= low << shift;
        if byte[0] & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(Error::Corrupt("varint longer than 10 bytes"))
}

/// Read a varint that must fit a u32
pub fn read_u32<R: Read + ?Sized>(input: &mut R, what: &'static str) -> Result<u32> {
    let value = read_varint(input, what)?;
    u32::try_from(value).map_err(|_| Error::Corrupt("value exceeds u32"))
}

/// Read a varint used as an in-memory count or length
pub fn read_len<R: Read + ?Sized>(input: &mut R, what: &'static str) -> Result<usize> {
    let value = read_varint(input, what)?;
    usize::try_from(value).map_err(|_| Error::Corrupt("length exceeds address space"))
}

/// Fill `buf` completely, mapping a short read to `Error::Truncated`
pub fn read_exact<R: Read + ?Sized>(input: &mut R, buf: &mut [u8], what: &'static str) -> Result<()> {
    input.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::Truncated(what),
        _ => Error::Io(e),
    })
}

/// Read exactly `len` bytes without trusting `len` for the allocation
pub fn read_bytes<R: Read + ?Sized>(input: &mut R, len: usize, what: &'static str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(len.min(PREALLOC_CAP));
    let read = (&mut *input).take(len as u64).read_to_end(&mut out)?;
    if read != len {
        return Err(Error::Truncated(what));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(value: u64) -> Vec<u8> {
        let mut out = Vec::new();
        write_varint(&mut out, value).unwrap();
        out
    }

    #[test]
    fn test_small_values_are_one_byte() {
        assert_eq!(encoded(0), vec![0x00]);
        assert_eq!(encoded(1), vec![0x01]);
        assert_eq!(encoded(127), vec![0x7F]);
    }

    #[test]
    fn test_multi_byte_little_endian_groups() {
        assert_eq!(encoded(128), vec![0x80, 0x01]);
        assert_eq!(encoded(300), vec![0xAC, 0x02]);
        assert_eq!(encoded(u64::MAX).len(), MAX_VARINT_LEN);
    }

    #[test]
    fn test_len_matches_writer() {
        for value in [0, 1, 127, 128, 16_383, 16_384, u32::MAX as u64, u64::MAX] {
            assert_eq!(varint_len(value), encoded(value).len(), "value {}", value);
        }
    }

    #[test]
    fn test_read_back() {
        for value in [0, 5, 300, u32::MAX as u64 + 1, u64::MAX] {
            let bytes = encoded(value);
            assert_eq!(read_varint(&mut bytes.as_slice(), "value").unwrap(), value);
        }
    }

    #[test]
    fn test_truncated() {
        let mut input: &[u8] = &[0x80, 0x80];
        match read_varint(&mut input, "block count") {
            Err(Error::Truncated("block count")) => {}
            other => panic!("expected Truncated, got {:?}", other),
        }
    }

    #[test]
    fn test_overlong() {
        let mut input: &[u8] = &[0xFF; 11];
        assert_eq!(read_varint(&mut input, "x").unwrap_err().reason(), "corrupt");
    }

    #[test]
    fn test_u32_range() {
        let bytes = encoded(u32::MAX as u64 + 1);
        assert!(read_u32(&mut bytes.as_slice(), "lower").is_err());
    }

    #[test]
    fn test_read_bytes_short() {
        let mut input: &[u8] = b"abc";
        assert!(matches!(
            read_bytes(&mut input, 5, "payload"),
            Err(Error::Truncated("payload"))
        ));
        let mut input: &[u8] = b"abcdef";
        assert_eq!(read_bytes(&mut input, 3, "payload").unwrap(), b"abc");
        assert_eq!(input, b"def");
    }
}
