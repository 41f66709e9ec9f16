//! DOM Module - flat text blocks plus markup spans
//!
//! The document never materializes a node tree. It stores:
//! - `blocks`: text blocks in reading order
//! - `markup`: spans in the order their tags were opened
//! - `length`: sum of all block lengths
//!
//! Nesting is implied by span containment and recovered on demand by
//! [`replay`], which drives any [`MarkupSink`].

pub mod document;
pub mod replay;
pub mod span;

use std::collections::BTreeMap;

use crate::error::Result;
use crate::text::TextBlock;

pub use document::{Cursor, Document, DocumentView, Fragment, Level};
pub use replay::{copy_wide, is_encoded, replay};
pub use span::MarkupSpan;

/// Tag attributes, passed through opaquely
pub type Attributes = BTreeMap<String, String>;

/// Builder interface shared by documents, dumps and adapters
///
/// Calls arrive in document order. Everything between an `open_tag` that
/// returned `true` and its matching `close_tag` belongs to that tag.
pub trait MarkupSink {
    /// Open a tag nested in the current one
    ///
    /// Returning `Ok(false)` refuses the tag: the caller must skip the
    /// whole subtree and must not call `close_tag` for it.
    fn open_tag(&mut self, name: &str, attributes: &Attributes) -> Result<bool>;

    /// Close the innermost open tag
    fn close_tag(&mut self) -> Result<()>;

    /// Append a text block to the innermost open tag
    fn add_paragraph(&mut self, block: &TextBlock) -> Result<()>;
}

impl<S: MarkupSink + ?Sized> MarkupSink for &mut S {
    #[inline]
    fn open_tag(&mut self, name: &str, attributes: &Attributes) -> Result<bool> {
        (**self).open_tag(name, attributes)
    }

    #[inline]
    fn close_tag(&mut self) -> Result<()> {
        (**self).close_tag()
    }

    #[inline]
    fn add_paragraph(&mut self, block: &TextBlock) -> Result<()> {
        (**self).add_paragraph(block)
    }
}

/// Read access to a finished document
pub trait TextView {
    /// Text blocks in reading order
    fn blocks(&self) -> &[TextBlock];

    /// Markup spans in open order
    fn markup(&self) -> &[MarkupSpan];

    /// Cumulative length of all blocks
    fn length(&self) -> u32;
}

impl<V: TextView + ?Sized> TextView for &V {
    #[inline]
    fn blocks(&self) -> &[TextBlock] {
        (**self).blocks()
    }

    #[inline]
    fn markup(&self) -> &[MarkupSpan] {
        (**self).markup()
    }

    #[inline]
    fn length(&self) -> u32 {
        (**self).length()
    }
}
