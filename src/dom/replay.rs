//! Replay - rebuild nested tag calls from flat arrays
//!
//! Walks blocks and spans with two index cursors and an explicit frame
//! stack. Each frame remembers the upper bound of its span and whether the
//! sink accepted the tag, so a refused subtree is consumed without output.
//!
//! Preconditions, guaranteed by `Document` but not checked on decoded or
//! hand-built views (replay still terminates when they do not hold):
//! - spans never cross: two spans are disjoint or one contains the other
//! - spans are ordered by the offset at which a left-to-right scan reaches them

use log::trace;

use super::document::Document;
use super::{Attributes, MarkupSink, TextView};
use crate::error::Result;
use crate::sink::WideSink;
use crate::text::BlockEncoding;

#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Offset at which this level ends
    upper: u64,
    /// `close_tag` owed to the sink
    opened: bool,
    /// Content is consumed but not forwarded
    skipped: bool,
}

/// Replay the nested structure of `view` against `sink`
///
/// Blocks are forwarded while their start offset is below the next span's
/// `lower`; otherwise that span opens a level that lasts until the offset
/// reaches its `upper`. A span still open extends to the end of the text.
pub fn replay<V, S>(view: &V, sink: &mut S) -> Result<()>
where
    V: TextView + ?Sized,
    S: MarkupSink + ?Sized,
{
    let blocks = view.blocks();
    let markup = view.markup();
    let attributes = Attributes::new();

    let mut frames = vec![Frame {
        upper: u64::MAX,
        opened: false,
        skipped: false,
    }];
    let mut block = 0usize;
    let mut span = 0usize;
    let mut offset = 0u64;

    while let Some(frame) = frames.last().copied() {
        if block == blocks.len() || offset >= frame.upper {
            frames.pop();
            if frame.opened {
                sink.close_tag()?;
            }
            continue;
        }

        match markup.get(span) {
            Some(next) if offset >= u64::from(next.lower) => {
                span += 1;
                let opened = !frame.skipped && sink.open_tag(&next.name, &attributes)?;
                if !frame.skipped && !opened {
                    trace!("sink refused <{}> at {}, skipping subtree", next.name, next.lower);
                }
                let upper = if next.is_open() {
                    u64::MAX
                } else {
                    u64::from(next.upper)
                };
                frames.push(Frame {
                    upper,
                    opened,
                    skipped: !opened,
                });
            }
            _ => {
                let text = &blocks[block];
                if !frame.skipped {
                    sink.add_paragraph(text)?;
                }
                offset += text.len() as u64;
                block += 1;
            }
        }
    }

    Ok(())
}

/// True if every block of `view` has the given encoding
pub fn is_encoded<V: TextView + ?Sized>(view: &V, encoding: BlockEncoding) -> bool {
    view.blocks().iter().all(|block| block.encoding() == encoding)
}

/// Replay `view` into `sink`, converting every block to wide text
///
/// Narrow blocks tagged `DEFAULT` are decoded as `default_codepage`.
pub fn copy_wide<S, V>(sink: &mut S, view: &V, default_codepage: u32) -> Result<()>
where
    S: MarkupSink + ?Sized,
    V: TextView + ?Sized,
{
    replay(view, &mut WideSink::new(sink, default_codepage))
}

impl Document {
    /// Replay this document's structure against `sink`
    pub fn replay_into<S: MarkupSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        replay(self, sink)
    }

    /// Copy of this document with every block in wide representation
    pub fn to_wide(&self, default_codepage: u32) -> Result<Document> {
        let mut out = Document::with_capacity(self.blocks().len(), self.markup().len());
        copy_wide(&mut out, self, default_codepage)?;
        Ok(out)
    }
}
