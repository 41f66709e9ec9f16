//! Text Dumps - human-readable renderings of a document
//!
//! Both writers are [`MarkupSink`](crate::dom::MarkupSink)s, so they are
//! driven by [`replay`](crate::dom::replay) like any other consumer:
//! - [`TagsWriter`]: indented `<name>` / `</name>` lines with escaped text
//! - [`JsonWriter`]: nested arrays of strings and single-key objects
//!
//! Text is converted to UTF-8 on output. `DEFAULT` narrow blocks are read
//! in [`DumpOptions::default_codepage`].

pub mod json;
pub mod tags;

use std::io::Write;

pub use json::JsonWriter;
pub use tags::TagsWriter;

use crate::dom::{replay, Document, TextView};
use crate::error::{Error, Result};
use crate::text::encoding;

/// Handling of control bytes that JSON has no short escape for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlBytes {
    /// Fail with [`Error::Unescapable`]
    #[default]
    Reject,
    /// Write them as `\u00XX`
    Unicode,
}

/// Dump configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpOptions {
    /// Codepage assumed for `DEFAULT` narrow blocks
    pub default_codepage: u32,
    /// JSON control byte policy
    pub control_bytes: ControlBytes,
}

impl Default for DumpOptions {
    fn default() -> Self {
        DumpOptions {
            default_codepage: encoding::UTF_8,
            control_bytes: ControlBytes::Reject,
        }
    }
}

impl DumpOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `DEFAULT` blocks in `codepage`
    pub fn with_default_codepage(mut self, codepage: u32) -> Self {
        self.default_codepage = codepage;
        self
    }

    /// Set the JSON control byte policy
    pub fn with_control_bytes(mut self, control_bytes: ControlBytes) -> Self {
        self.control_bytes = control_bytes;
        self
    }
}

/// Replay `view` into a tag-format writer over `out`
pub fn write_tags<V, W>(view: &V, out: W, options: &DumpOptions) -> Result<W>
where
    V: TextView + ?Sized,
    W: Write,
{
    let mut writer = TagsWriter::with_options(out, options);
    replay(view, &mut writer)?;
    writer.finish()
}

/// Replay `view` into a JSON writer over `out`
pub fn write_json<V, W>(view: &V, out: W, options: &DumpOptions) -> Result<W>
where
    V: TextView + ?Sized,
    W: Write,
{
    let mut writer = JsonWriter::with_options(out, options)?;
    replay(view, &mut writer)?;
    writer.finish()
}

/// Render `view` in the tag format
pub fn to_tags_string<V: TextView + ?Sized>(view: &V) -> Result<String> {
    into_string(write_tags(view, Vec::new(), &DumpOptions::default())?)
}

/// Render `view` as JSON
pub fn to_json_string<V: TextView + ?Sized>(view: &V, options: &DumpOptions) -> Result<String> {
    into_string(write_json(view, Vec::new(), options)?)
}

fn into_string(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|_| Error::InvalidText("UTF-8"))
}

impl Document {
    /// See [`to_tags_string`]
    pub fn to_tags_string(&self) -> Result<String> {
        to_tags_string(self)
    }

    /// See [`to_json_string`]
    pub fn to_json_string(&self, options: &DumpOptions) -> Result<String> {
        to_json_string(self, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Level;
    use crate::text::encoding::{DEFAULT, ISO_8859_1};
    use crate::text::TextBlock;

    #[test]
    fn test_options_builder() {
        let options = DumpOptions::new()
            .with_default_codepage(ISO_8859_1)
            .with_control_bytes(ControlBytes::Unicode);
        assert_eq!(options.default_codepage, ISO_8859_1);
        assert_eq!(options.control_bytes, ControlBytes::Unicode);
        assert_eq!(DumpOptions::default().control_bytes, ControlBytes::Reject);
    }

    #[test]
    fn test_default_codepage_applies() {
        let mut doc = Document::new();
        doc.add_paragraph(Level::Root, TextBlock::narrow(DEFAULT, &[b'c', 0xE9]))
            .unwrap();

        assert!(doc.to_json_string(&DumpOptions::default()).is_err());
        let latin = DumpOptions::new().with_default_codepage(ISO_8859_1);
        assert_eq!(doc.to_json_string(&latin).unwrap(), "[\n  \"cé\"\n]");
        let tags = write_tags(&doc, Vec::new(), &latin).unwrap();
        assert_eq!(tags, "cé\n".as_bytes());
    }
}
