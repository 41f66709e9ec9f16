//! Tag-format loader
//!
//! Reads what [`TagsWriter`](crate::dump::TagsWriter) writes:
//! - `<name>` opens a tag, `</name>` closes it (names must match)
//! - any other line is one UTF-8 text block
//! - leading indentation and a trailing `\r` are ignored
//! - `&lt;` `&gt;` `&amp;` are decoded in text and tag names
//!
//! A missing final newline is accepted. Tags left open at the end of input
//! are an error.

use std::borrow::Cow;
use std::io::Read;

use log::warn;
use memchr::memchr;

use crate::dom::{Attributes, Document, Level, MarkupSink};
use crate::error::{Error, Result};
use crate::text::TextBlock;

/// Decode `&lt;` `&gt;` `&amp;`
///
/// Returns Borrowed if no entities are present, `None` on any other entity.
pub fn unescape_markup(text: &str) -> Option<Cow<'_, str>> {
    let bytes = text.as_bytes();
    if memchr(b'&', bytes).is_none() {
        return Some(Cow::Borrowed(text));
    }

    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    while let Some(amp) = memchr(b'&', &bytes[pos..]) {
        out.push_str(&text[pos..pos + amp]);
        let rest = &text[pos + amp..];
        let (decoded, used) = if rest.starts_with("&lt;") {
            ('<', 4)
        } else if rest.starts_with("&gt;") {
            ('>', 4)
        } else if rest.starts_with("&amp;") {
            ('&', 5)
        } else {
            return None;
        };
        out.push(decoded);
        pos += amp + used;
    }
    out.push_str(&text[pos..]);
    Some(Cow::Owned(out))
}

/// Open tag on the loader's stack
struct Open {
    name: String,
    forwarded: bool,
}

enum Line<'a> {
    Open(Cow<'a, str>),
    Close(Cow<'a, str>),
    Text(&'a str),
}

fn classify(line: &str) -> std::result::Result<Line<'_>, &'static str> {
    if !line.starts_with('<') {
        return Ok(Line::Text(line));
    }
    let inner = line
        .strip_suffix('>')
        .map(|l| &l[1..])
        .ok_or("unterminated tag")?;
    let (close, name) = match inner.strip_prefix('/') {
        Some(name) => (true, name),
        None => (false, inner),
    };
    if name.is_empty() {
        return Err("empty tag name");
    }
    let name = unescape_markup(name).ok_or("unknown entity in tag name")?;
    Ok(if close { Line::Close(name) } else { Line::Open(name) })
}

fn malformed(line: usize, message: impl Into<String>) -> Error {
    let error = Error::malformed(line, message);
    warn!("rejecting tag source: {}", error);
    error
}

/// Parse `input` and replay it against `sink`
///
/// Tags refused by the sink are skipped with everything inside them.
pub fn load_tags<S: MarkupSink + ?Sized>(input: &[u8], sink: &mut S) -> Result<()> {
    let attributes = Attributes::new();
    let mut stack: Vec<Open> = Vec::new();
    // stack depth at which a refused subtree began
    let mut refused_at: Option<usize> = None;
    let mut start = 0;
    let mut number = 0;

    while start <= input.len() {
        let end = memchr(b'\n', &input[start..]).map(|i| start + i);
        let raw = &input[start..end.unwrap_or(input.len())];
        number += 1;
        start = end.map_or(input.len() + 1, |e| e + 1);

        if end.is_none() && raw.is_empty() {
            break;
        }

        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = std::str::from_utf8(raw).map_err(|_| malformed(number, "line is not UTF-8"))?;
        let line = line.trim_start_matches([' ', '\t']);

        match classify(line).map_err(|message| malformed(number, message))? {
            Line::Open(name) => {
                let forwarded = refused_at.is_none() && sink.open_tag(&name, &attributes)?;
                if refused_at.is_none() && !forwarded {
                    refused_at = Some(stack.len());
                }
                stack.push(Open {
                    name: name.into_owned(),
                    forwarded,
                });
            }
            Line::Close(name) => {
                let open = stack
                    .pop()
                    .ok_or_else(|| malformed(number, format!("</{}> without open tag", name)))?;
                if open.name != name {
                    return Err(malformed(
                        number,
                        format!("</{}> closes <{}>", name, open.name),
                    ));
                }
                if open.forwarded {
                    sink.close_tag()?;
                }
                if refused_at == Some(stack.len()) {
                    refused_at = None;
                }
            }
            Line::Text(text) => {
                let text = unescape_markup(text)
                    .ok_or_else(|| malformed(number, "unknown entity in text"))?;
                if refused_at.is_none() {
                    sink.add_paragraph(&TextBlock::utf8(&text))?;
                }
            }
        }
    }

    match stack.last() {
        Some(open) => Err(malformed(number, format!("<{}> is never closed", open.name))),
        None => Ok(()),
    }
}

/// Read all of `reader`, then [`load_tags`]
pub fn read_tags<R: Read, S: MarkupSink + ?Sized>(mut reader: R, sink: &mut S) -> Result<()> {
    let mut input = Vec::new();
    reader.read_to_end(&mut input)?;
    load_tags(&input, sink)
}

impl Document {
    /// Build a document from tag-format text
    pub fn from_tags(input: &[u8]) -> Result<Document> {
        let mut doc = Document::new();
        load_tags(input, &mut doc)?;
        debug_assert_eq!(doc.current(), Level::Root);
        Ok(doc)
    }
}
