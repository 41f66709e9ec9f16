//! Wide re-encoding sink

use crate::dom::{Attributes, MarkupSink};
use crate::error::Result;
use crate::text::TextBlock;

/// Forwards every call, converting narrow blocks to wide ones
///
/// Wide blocks pass through and keep sharing their storage.
#[derive(Debug)]
pub struct WideSink<S> {
    inner: S,
    default_codepage: u32,
}

impl<S: MarkupSink> WideSink<S> {
    /// Wrap `inner`; `DEFAULT` narrow blocks are decoded as `default_codepage`
    pub fn new(inner: S, default_codepage: u32) -> Self {
        WideSink {
            inner,
            default_codepage,
        }
    }

    /// Codepage used for `DEFAULT` blocks
    #[inline]
    pub fn default_codepage(&self) -> u32 {
        self.default_codepage
    }

    /// Unwrap the inner sink
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: MarkupSink> MarkupSink for WideSink<S> {
    #[inline]
    fn open_tag(&mut self, name: &str, attributes: &Attributes) -> Result<bool> {
        self.inner.open_tag(name, attributes)
    }

    #[inline]
    fn close_tag(&mut self) -> Result<()> {
        self.inner.close_tag()
    }

    fn add_paragraph(&mut self, block: &TextBlock) -> Result<()> {
        let wide = block.to_wide(self.default_codepage)?;
        self.inner.add_paragraph(&wide)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, Level};
    use crate::text::encoding::{DEFAULT, US_ASCII};
    use crate::text::BlockEncoding;

    #[test]
    fn test_wide_sink_converts() {
        let mut sink = WideSink::new(Document::new(), US_ASCII);
        sink.add_paragraph(&TextBlock::narrow(DEFAULT, b"abc")).unwrap();
        assert!(sink.open_tag("p", &Attributes::new()).unwrap());
        sink.add_paragraph(&TextBlock::utf8("d")).unwrap();
        sink.close_tag().unwrap();

        let doc = sink.into_inner();
        assert_eq!(doc.blocks().len(), 2);
        assert!(doc.blocks().iter().all(|b| b.encoding() == BlockEncoding::Wide));
        assert_eq!(doc.blocks()[0].as_wide(), &[0x61u16, 0x62, 0x63]);
        assert_eq!(doc.markup().len(), 1);
        assert_eq!(doc.current(), Level::Root);
    }

    #[test]
    fn test_wide_sink_rejects_bad_ascii() {
        let mut sink = WideSink::new(Document::new(), US_ASCII);
        let err = sink.add_paragraph(&TextBlock::narrow(DEFAULT, &[0xC0])).unwrap_err();
        assert_eq!(err.reason(), "invalid_text");
        assert!(sink.into_inner().is_empty());
    }
}
