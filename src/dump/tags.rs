//! Tag-format writer
//!
//! ```text
//! aaa
//! <bbb>
//!   bbb
//! </bbb>
//! ```
//!
//! Each tag line is indented two spaces per enclosing tag; text lines one
//! level deeper than their tag. `<`, `>` and `&` are escaped in text and
//! in tag names.

use std::borrow::Cow;
use std::io::Write;

use memchr::memchr3;

use super::DumpOptions;
use crate::dom::{Attributes, MarkupSink};
use crate::error::{Error, Result};
use crate::text::TextBlock;

/// Escape `<`, `>` and `&`
///
/// Returns Borrowed if there is nothing to escape.
#[inline]
pub fn escape_markup(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    let Some(first) = memchr3(b'<', b'>', b'&', bytes) else {
        return Cow::Borrowed(text);
    };

    let mut out = String::with_capacity(text.len() + 8);
    out.push_str(&text[..first]);
    let mut pos = first;
    while let Some(offset) = memchr3(b'<', b'>', b'&', &bytes[pos..]) {
        out.push_str(&text[pos..pos + offset]);
        out.push_str(match bytes[pos + offset] {
            b'<' => "&lt;",
            b'>' => "&gt;",
            _ => "&amp;",
        });
        pos += offset + 1;
    }
    out.push_str(&text[pos..]);
    Cow::Owned(out)
}

/// Sink rendering the tag format into `W`
pub struct TagsWriter<W: Write> {
    out: W,
    /// Names of the tags currently open
    open: Vec<String>,
    default_codepage: u32,
}

impl<W: Write> TagsWriter<W> {
    /// Writer with default options
    pub fn new(out: W) -> Self {
        Self::with_options(out, &DumpOptions::default())
    }

    /// Writer with explicit options
    pub fn with_options(out: W, options: &DumpOptions) -> Self {
        TagsWriter {
            out,
            open: Vec::new(),
            default_codepage: options.default_codepage,
        }
    }

    /// Current nesting depth
    #[inline]
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    fn indent(&mut self) -> Result<()> {
        for _ in 0..self.open.len() {
            self.out.write_all(b"  ")?;
        }
        Ok(())
    }

    /// Close remaining tags, flush, and return the output
    pub fn finish(mut self) -> Result<W> {
        while !self.open.is_empty() {
            self.close_tag()?;
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> MarkupSink for TagsWriter<W> {
    fn open_tag(&mut self, name: &str, _attributes: &Attributes) -> Result<bool> {
        self.indent()?;
        writeln!(self.out, "<{}>", escape_markup(name))?;
        self.open.push(name.to_string());
        Ok(true)
    }

    fn close_tag(&mut self) -> Result<()> {
        let name = self.open.pop().ok_or(Error::UnbalancedClose)?;
        self.indent()?;
        writeln!(self.out, "</{}>", escape_markup(&name))?;
        Ok(())
    }

    fn add_paragraph(&mut self, block: &TextBlock) -> Result<()> {
        let text = block.to_utf8(self.default_codepage)?;
        self.indent()?;
        self.out.write_all(escape_markup(&text).as_bytes())?;
        self.out.write_all(b"\n")?;
        Ok(())
    }
}
