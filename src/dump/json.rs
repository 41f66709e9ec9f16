//! JSON writer
//!
//! A document is an array. Text blocks are strings; a tag is a single-key
//! object whose value is the array of its children:
//!
//! ```text
//! [
//!   "aaa",
//!   { "bbb": [
//!     "bbb"
//!   ] },
//!   "ccc"
//! ]
//! ```
//!
//! Empty arrays render as `[]`.

use std::io::Write;

use super::{ControlBytes, DumpOptions};
use crate::dom::{Attributes, MarkupSink};
use crate::error::{Error, Result};
use crate::text::TextBlock;

/// Write `text` as a quoted JSON string
///
/// `"` `\` `/` and the control bytes `\b \f \n \r \t` get short escapes.
/// Other bytes below 0x20 follow `control`.
pub fn write_json_string<W: Write + ?Sized>(
    out: &mut W,
    text: &str,
    control: ControlBytes,
) -> Result<()> {
    let bytes = text.as_bytes();
    out.write_all(b"\"")?;
    let mut start = 0;
    for (i, &byte) in bytes.iter().enumerate() {
        let short: &[u8] = match byte {
            b'"' => b"\\\"",
            b'\\' => b"\\\\",
            b'/' => b"\\/",
            0x08 => b"\\b",
            0x0C => b"\\f",
            b'\n' => b"\\n",
            b'\r' => b"\\r",
            b'\t' => b"\\t",
            0x00..=0x1F => b"",
            _ => continue,
        };
        out.write_all(&bytes[start..i])?;
        start = i + 1;
        if !short.is_empty() {
            out.write_all(short)?;
            continue;
        }
        match control {
            ControlBytes::Reject => return Err(Error::Unescapable(byte)),
            ControlBytes::Unicode => write!(out, "\\u{:04x}", byte)?,
        }
    }
    out.write_all(&bytes[start..])?;
    out.write_all(b"\"")?;
    Ok(())
}

/// Sink rendering JSON into `W`
pub struct JsonWriter<W: Write> {
    out: W,
    /// Items written so far in each open array, root first
    items: Vec<usize>,
    options: DumpOptions,
}

impl<W: Write> JsonWriter<W> {
    /// Writer with default options; writes the opening bracket
    pub fn new(out: W) -> Result<Self> {
        Self::with_options(out, &DumpOptions::default())
    }

    /// Writer with explicit options; writes the opening bracket
    pub fn with_options(mut out: W, options: &DumpOptions) -> Result<Self> {
        out.write_all(b"[")?;
        Ok(JsonWriter {
            out,
            items: vec![0],
            options: *options,
        })
    }

    /// Number of open tags
    #[inline]
    pub fn depth(&self) -> usize {
        self.items.len().saturating_sub(1)
    }

    fn indent(&mut self, level: usize) -> Result<()> {
        for _ in 0..level {
            self.out.write_all(b"  ")?;
        }
        Ok(())
    }

    /// Separator and indentation for the next item of the innermost array
    fn begin_item(&mut self) -> Result<()> {
        let level = self.items.len();
        if let Some(count) = self.items.last_mut() {
            let separator: &[u8] = if *count > 0 { b",\n" } else { b"\n" };
            *count += 1;
            self.out.write_all(separator)?;
        }
        self.indent(level)
    }

    /// Newline and indentation before a closing bracket, if the array has items
    fn end_array(&mut self, items: usize) -> Result<()> {
        if items > 0 {
            self.out.write_all(b"\n")?;
            self.indent(self.items.len())?;
        }
        self.out.write_all(b"]")?;
        Ok(())
    }

    /// Close remaining tags and the root array, flush, and return the output
    pub fn finish(mut self) -> Result<W> {
        while self.items.len() > 1 {
            self.close_tag()?;
        }
        let items = self.items.pop().unwrap_or(0);
        self.end_array(items)?;
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> MarkupSink for JsonWriter<W> {
    fn open_tag(&mut self, name: &str, _attributes: &Attributes) -> Result<bool> {
        self.begin_item()?;
        self.out.write_all(b"{ ")?;
        write_json_string(&mut self.out, name, self.options.control_bytes)?;
        self.out.write_all(b": [")?;
        self.items.push(0);
        Ok(true)
    }

    fn close_tag(&mut self) -> Result<()> {
        if self.items.len() < 2 {
            return Err(Error::UnbalancedClose);
        }
        let items = self.items.pop().unwrap_or(0);
        self.end_array(items)?;
        self.out.write_all(b" }")?;
        Ok(())
    }

    fn add_paragraph(&mut self, block: &TextBlock) -> Result<()> {
        let text = block.to_utf8(self.options.default_codepage)?;
        self.begin_item()?;
        write_json_string(&mut self.out, &text, self.options.control_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, Fragment, Level};
    use crate::dump::to_json_string;

    fn escaped(text: &str, control: ControlBytes) -> Result<String> {
        let mut out = Vec::new();
        write_json_string(&mut out, text, control)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_escape_table() {
        let out = escaped("q\" b\\ s/ \u{8}\u{c}\n\r\t", ControlBytes::Reject).unwrap();
        assert_eq!(out, r#""q\" b\\ s\/ \b\f\n\r\t""#);
        assert_eq!(escaped("Строка", ControlBytes::Reject).unwrap(), "\"Строка\"");
    }

    #[test]
    fn test_control_byte_rejected() {
        match escaped("bell\u{7}", ControlBytes::Reject) {
            Err(Error::Unescapable(0x07)) => {}
            other => panic!("expected Unescapable, got {:?}", other),
        }
    }

    #[test]
    fn test_control_byte_unicode() {
        assert_eq!(
            escaped("a\u{0}b\u{1f}", ControlBytes::Unicode).unwrap(),
            "\"a\\u0000b\\u001f\""
        );
    }

    #[test]
    fn test_text_around_tag() {
        let mut doc = Document::new();
        doc.add_text(Level::Root, "aaa").unwrap();
        let tag = doc.add_markup_tag(Level::Root, "bbb").unwrap();
        doc.add_text(tag, "bbb").unwrap();
        doc.close(tag);
        doc.add_text(Level::Root, "ccc").unwrap();

        assert_eq!(
            to_json_string(&doc, &DumpOptions::default()).unwrap(),
            "[\n  \"aaa\",\n  { \"bbb\": [\n    \"bbb\"\n  ] },\n  \"ccc\"\n]"
        );
    }

    #[test]
    fn test_nested_siblings() {
        let doc = Document::from_fragments(&[Fragment::tag(
            "tr",
            vec![
                Fragment::tag("td", vec!["a".into()]),
                Fragment::tag("td", vec![Fragment::Wide("b")]),
            ],
        )])
        .unwrap();

        assert_eq!(
            to_json_string(&doc, &DumpOptions::default()).unwrap(),
            concat!(
                "[\n",
                "  { \"tr\": [\n",
                "    { \"td\": [\n",
                "      \"a\"\n",
                "    ] },\n",
                "    { \"td\": [\n",
                "      \"b\"\n",
                "    ] }\n",
                "  ] }\n",
                "]"
            )
        );
    }

    #[test]
    fn test_empty_arrays() {
        assert_eq!(to_json_string(&Document::new(), &DumpOptions::default()).unwrap(), "[]");

        let mut writer = JsonWriter::new(Vec::new()).unwrap();
        writer.open_tag("br", &Attributes::new()).unwrap();
        assert_eq!(writer.depth(), 1);
        let out = writer.finish().unwrap();
        assert_eq!(out, b"[\n  { \"br\": [] }\n]");
    }

    #[test]
    fn test_unbalanced_close() {
        let mut writer = JsonWriter::new(Vec::new()).unwrap();
        assert!(matches!(writer.close_tag(), Err(Error::UnbalancedClose)));
    }
}
