//! JSON loader
//!
//! Reads what [`JsonWriter`](crate::dump::JsonWriter) writes: an array of
//! strings (text blocks) and single-key objects `{ "name": [ ... ] }`
//! (tags). Trailing commas before `]` are accepted.
//!
//! String escapes: `\" \\ \/ \b \f \n \r \t` and `\uXXXX` (surrogate pairs
//! included). Nesting is tracked on an explicit stack.

use std::borrow::Cow;

use log::warn;
use memchr::{memchr2, memchr_iter};

use crate::dom::{Attributes, Document, MarkupSink};
use crate::error::{Error, Result};
use crate::text::TextBlock;

/// One open array
#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Array is the value of a tag object
    tag: bool,
    /// `close_tag` owed to the sink
    opened: bool,
    /// Content is consumed but not forwarded
    skipped: bool,
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: impl Into<String>) -> Error {
        let line = memchr_iter(b'\n', &self.input[..self.pos.min(self.input.len())]).count() + 1;
        let error = Error::malformed(line, message);
        warn!("rejecting JSON source: {}", error);
        error
    }

    fn skip_ws(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        self.skip_ws();
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", byte as char)))
        }
    }

    fn hex4(&mut self) -> Result<u16> {
        let digits = self
            .input
            .get(self.pos..self.pos + 4)
            .and_then(|d| std::str::from_utf8(d).ok())
            .and_then(|d| u16::from_str_radix(d, 16).ok())
            .ok_or_else(|| self.error("bad \\u escape"))?;
        self.pos += 4;
        Ok(digits)
    }

    /// Parse a string starting at the opening quote
    fn string(&mut self) -> Result<Cow<'a, str>> {
        self.expect(b'"')?;
        let input = self.input;
        let start = self.pos;

        // fast path: no escapes before the closing quote
        let first = memchr2(b'"', b'\\', &input[start..])
            .map(|i| start + i)
            .ok_or_else(|| self.error("unterminated string"))?;
        if input[first] == b'"' {
            self.pos = first + 1;
            return std::str::from_utf8(&input[start..first])
                .map(Cow::Borrowed)
                .map_err(|_| self.error("string is not UTF-8"));
        }

        let mut out: Vec<u8> = Vec::with_capacity(first - start + 16);
        out.extend_from_slice(&input[start..first]);
        self.pos = first;
        loop {
            let next = memchr2(b'"', b'\\', &input[self.pos..])
                .map(|i| self.pos + i)
                .ok_or_else(|| self.error("unterminated string"))?;
            out.extend_from_slice(&input[self.pos..next]);
            self.pos = next + 1;
            if input[next] == b'"' {
                break;
            }

            let escape = self.peek().ok_or_else(|| self.error("unterminated string"))?;
            self.pos += 1;
            let decoded = match escape {
                b'"' => '"',
                b'\\' => '\\',
                b'/' => '/',
                b'b' => '\u{8}',
                b'f' => '\u{c}',
                b'n' => '\n',
                b'r' => '\r',
                b't' => '\t',
                b'u' => self.unicode()?,
                other => return Err(self.error(format!("unknown escape \\{}", other as char))),
            };
            let mut buf = [0u8; 4];
            out.extend_from_slice(decoded.encode_utf8(&mut buf).as_bytes());
        }

        String::from_utf8(out)
            .map(Cow::Owned)
            .map_err(|_| self.error("string is not UTF-8"))
    }

    fn unicode(&mut self) -> Result<char> {
        let high = self.hex4()?;
        if !(0xD800..0xDC00).contains(&high) {
            return char::from_u32(u32::from(high)).ok_or_else(|| self.error("unpaired surrogate"));
        }
        if self.input.get(self.pos..self.pos + 2) != Some(b"\\u") {
            return Err(self.error("unpaired surrogate"));
        }
        self.pos += 2;
        let low = self.hex4()?;
        if !(0xDC00..0xE000).contains(&low) {
            return Err(self.error("unpaired surrogate"));
        }
        let code = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
        char::from_u32(code).ok_or_else(|| self.error("bad surrogate pair"))
    }

    /// After an item: a comma, or the closing bracket left for the caller
    fn after_item(&mut self) -> Result<()> {
        self.skip_ws();
        match self.peek() {
            Some(b',') => {
                self.pos += 1;
                Ok(())
            }
            Some(b']') => Ok(()),
            _ => Err(self.error("expected ',' or ']'")),
        }
    }
}

/// Parse `input` and replay it against `sink`
///
/// Tags refused by the sink are skipped with everything inside them.
pub fn load_json<S: MarkupSink + ?Sized>(input: &[u8], sink: &mut S) -> Result<()> {
    let attributes = Attributes::new();
    let mut parser = Parser { input, pos: 0 };
    parser.expect(b'[')?;
    let mut frames = vec![Frame {
        tag: false,
        opened: false,
        skipped: false,
    }];

    while let Some(frame) = frames.last().copied() {
        parser.skip_ws();
        match parser.peek() {
            Some(b']') => {
                parser.pos += 1;
                frames.pop();
                if frame.tag {
                    parser.expect(b'}')?;
                    if frame.opened {
                        sink.close_tag()?;
                    }
                }
                if !frames.is_empty() {
                    parser.after_item()?;
                }
            }
            Some(b'"') => {
                let text = parser.string()?;
                if !frame.skipped {
                    sink.add_paragraph(&TextBlock::utf8(&text))?;
                }
                parser.after_item()?;
            }
            Some(b'{') => {
                parser.pos += 1;
                parser.skip_ws();
                let name = parser.string()?;
                if name.is_empty() {
                    return Err(parser.error("empty tag name"));
                }
                parser.expect(b':')?;
                parser.expect(b'[')?;
                let opened = !frame.skipped && sink.open_tag(&name, &attributes)?;
                frames.push(Frame {
                    tag: true,
                    opened,
                    skipped: !opened,
                });
            }
            Some(_) => return Err(parser.error("expected string, object or ']'")),
            None => return Err(parser.error("unexpected end of input")),
        }
    }

    parser.skip_ws();
    if parser.pos != input.len() {
        return Err(parser.error("trailing data after document"));
    }
    Ok(())
}

impl Document {
    /// Build a document from JSON text
    pub fn from_json(input: &[u8]) -> Result<Document> {
        let mut doc = Document::new();
        load_json(input, &mut doc)?;
        Ok(doc)
    }
}
