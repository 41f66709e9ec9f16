//! Binary Codec - lossless serialization of the flat arrays
//!
//! Layout (all integers unsigned LEB128, see [`varint`]):
//!
//! ```text
//! block_count
//!   wire_id len payload          (per block, see TextBlock::write_to)
//! span_count
//!   name_len name lower upper    (per span)
//! ```
//!
//! There is no magic number, version or total length. Decoding recomputes
//! the length and rejects any stream that ends early or describes spans
//! outside the text.

pub mod varint;

use std::io::{self, Read, Write};

use log::debug;

use self::varint::{read_bytes, read_len, read_u32, varint_len, write_varint, PREALLOC_CAP};
use crate::dom::{Document, MarkupSpan, TextView};
use crate::error::{Error, Result};
use crate::text::TextBlock;

/// Exact number of bytes [`encode`] writes for `view`
pub fn encoded_len<V: TextView + ?Sized>(view: &V) -> usize {
    let blocks = view.blocks();
    let markup = view.markup();

    let mut len = varint_len(blocks.len() as u64);
    len += blocks.iter().map(TextBlock::encoded_len).sum::<usize>();
    len += varint_len(markup.len() as u64);
    for span in markup {
        len += varint_len(span.name.len() as u64) + span.name.len();
        len += varint_len(u64::from(span.lower)) + varint_len(u64::from(span.upper));
    }
    len
}

/// Serialize `view` into `out`
///
/// Only sink failures are reported; a failed write leaves `out` partially
/// written.
pub fn encode<V, W>(view: &V, out: &mut W) -> io::Result<()>
where
    V: TextView + ?Sized,
    W: Write + ?Sized,
{
    let blocks = view.blocks();
    write_varint(out, blocks.len() as u64)?;
    for block in blocks {
        block.write_to(out)?;
    }

    let markup = view.markup();
    write_varint(out, markup.len() as u64)?;
    for span in markup {
        write_varint(out, span.name.len() as u64)?;
        out.write_all(span.name.as_bytes())?;
        write_varint(out, u64::from(span.lower))?;
        write_varint(out, u64::from(span.upper))?;
    }
    Ok(())
}

/// Serialize `view` into a new buffer sized by [`encoded_len`]
pub fn to_bytes<V: TextView + ?Sized>(view: &V) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(view));
    // writing into a Vec cannot fail
    let _ = encode(view, &mut out);
    out
}

/// Deserialize a document written by [`encode`]
///
/// Reads exactly the encoded document and nothing past it.
pub fn decode<R: Read + ?Sized>(input: &mut R) -> Result<Document> {
    let block_count = read_len(input, "block count")?;
    let mut blocks = Vec::with_capacity(block_count.min(PREALLOC_CAP));
    let mut length: u32 = 0;
    for _ in 0..block_count {
        let block = TextBlock::read_from(input)?;
        length = u32::try_from(block.len())
            .ok()
            .and_then(|len| length.checked_add(len))
            .filter(|&total| total != MarkupSpan::OPEN)
            .ok_or(Error::Corrupt("document length exceeds u32"))?;
        blocks.push(block);
    }

    let span_count = read_len(input, "span count")?;
    let mut markup = Vec::with_capacity(span_count.min(PREALLOC_CAP));
    for _ in 0..span_count {
        let name_len = read_len(input, "tag name length")?;
        let name = String::from_utf8(read_bytes(input, name_len, "tag name")?)
            .map_err(|_| Error::Corrupt("tag name is not UTF-8"))?;
        let lower = read_u32(input, "span lower")?;
        let upper = read_u32(input, "span upper")?;
        check_span(lower, upper, length)?;
        markup.push(MarkupSpan::new(name, lower, upper));
    }

    debug!(
        "decoded {} blocks, {} spans, length {}",
        blocks.len(),
        markup.len(),
        length
    );
    Ok(Document::from_parts(blocks, markup, length))
}

fn check_span(lower: u32, upper: u32, length: u32) -> Result<()> {
    if lower > length {
        return Err(Error::Corrupt("span starts past the text"));
    }
    if upper != MarkupSpan::OPEN && (upper < lower || upper > length) {
        return Err(Error::Corrupt("span bounds out of order"));
    }
    Ok(())
}

/// Deserialize a complete buffer; trailing bytes are corrupt
pub fn from_bytes(bytes: &[u8]) -> Result<Document> {
    let mut input = bytes;
    let doc = decode(&mut input)?;
    if !input.is_empty() {
        return Err(Error::Corrupt("trailing bytes after document"));
    }
    Ok(doc)
}

impl Document {
    /// See [`encode`]
    pub fn encode<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        encode(self, out)
    }

    /// See [`to_bytes`]
    pub fn to_bytes(&self) -> Vec<u8> {
        to_bytes(self)
    }

    /// See [`decode`]
    pub fn decode<R: Read + ?Sized>(input: &mut R) -> Result<Document> {
        decode(input)
    }

    /// See [`from_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Document> {
        from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Fragment, Level};
    use crate::text::encoding::{DEFAULT, ISO_8859_1, UTF_8};
    use crate::text::BlockEncoding;

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.add_paragraph(Level::Root, TextBlock::narrow(UTF_8, "Строка".as_bytes()))
            .unwrap();
        let table = doc.add_markup_tag(Level::Root, "table").unwrap();
        let td = doc.add_markup_tag(table, "td").unwrap();
        doc.add_paragraph(td, TextBlock::wide_str("ячейка")).unwrap();
        doc.add_paragraph(td, TextBlock::narrow(ISO_8859_1, &[0xE9; 3])).unwrap();
        doc.close(table);
        doc.add_paragraph(Level::Root, TextBlock::narrow(DEFAULT, b"")).unwrap();
        doc
    }

    #[test]
    fn test_round_trip() {
        let doc = sample();
        let bytes = doc.to_bytes();
        let back = Document::from_bytes(&bytes).unwrap();

        assert_eq!(back, doc);
        assert_eq!(back.length(), doc.length());
        assert_eq!(back.blocks()[1].encoding(), BlockEncoding::Wide);
        assert_eq!(back.blocks()[3].encoding(), BlockEncoding::Narrow(DEFAULT));
    }

    #[test]
    fn test_encoded_len_exact() {
        let doc = sample();
        assert_eq!(encoded_len(&doc), doc.to_bytes().len());
        assert_eq!(encoded_len(&Document::new()), 2);
    }

    #[test]
    fn test_empty_document_layout() {
        assert_eq!(Document::new().to_bytes(), vec![0x00, 0x00]);
        assert_eq!(Document::from_bytes(&[0x00, 0x00]).unwrap(), Document::new());
    }

    #[test]
    fn test_known_layout() {
        let doc = Document::from_fragments(&[Fragment::tag("b", vec!["xy".into()])]).unwrap();
        let expected = vec![
            0x01, // one block
            0xEA, 0xFB, 0x03, // UTF-8 (65001) + 1
            0x02, b'x', b'y', // length, payload
            0x01, // one span
            0x01, b'b', // name
            0x00, 0x02, // lower, upper
        ];
        assert_eq!(doc.to_bytes(), expected);
    }

    #[test]
    fn test_every_prefix_is_truncated() {
        let bytes = sample().to_bytes();
        for cut in 0..bytes.len() {
            match Document::from_bytes(&bytes[..cut]) {
                Err(Error::Truncated(_)) => {}
                other => panic!("prefix {} of {}: expected Truncated, got {:?}", cut, bytes.len(), other),
            }
        }
    }

    #[test]
    fn test_open_span_survives() {
        let mut doc = Document::new();
        let body = doc.add_markup_tag(Level::Root, "body").unwrap();
        doc.add_text(body, "still open").unwrap();

        let back = Document::from_bytes(&doc.to_bytes()).unwrap();
        assert!(back.markup()[0].is_open());
        assert_eq!(back, doc);
    }

    #[test]
    fn test_reject_span_past_text() {
        let blocks = [TextBlock::utf8("ab")];
        let markup = [MarkupSpan::new("p", 1, 3)];
        let view = crate::dom::DocumentView::new(&blocks, &markup).unwrap();
        match from_bytes(&to_bytes(&view)) {
            Err(Error::Corrupt(_)) => {}
            other => panic!("expected Corrupt, got {:?}", other),
        }
    }

    #[test]
    fn test_reject_inverted_span() {
        let blocks = [TextBlock::utf8("abc")];
        let markup = [MarkupSpan::new("p", 2, 1)];
        let view = crate::dom::DocumentView::new(&blocks, &markup).unwrap();
        assert_eq!(from_bytes(&to_bytes(&view)).unwrap_err().reason(), "corrupt");
    }

    #[test]
    fn test_reject_bad_tag_name() {
        let bytes = [0x00, 0x01, 0x01, 0xFF, 0x00, 0x00];
        assert!(matches!(from_bytes(&bytes), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_reject_trailing_bytes() {
        let mut bytes = sample().to_bytes();
        bytes.push(0);
        assert!(matches!(from_bytes(&bytes), Err(Error::Corrupt(_))));
        // streaming decode stops at the document boundary
        let mut input = bytes.as_slice();
        assert_eq!(decode(&mut input).unwrap(), sample());
        assert_eq!(input, &[0u8]);
    }

    #[test]
    fn test_huge_count_does_not_preallocate() {
        // claims u32::MAX blocks, then ends
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF, 0x0F];
        assert!(matches!(from_bytes(&bytes), Err(Error::Truncated(_))));
    }

    #[test]
    fn test_encode_reports_sink_failure() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "disk full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        assert!(sample().encode(&mut Broken).is_err());
    }
}
