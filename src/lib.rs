//! flatdom - Flat marked-up text with nesting replay
//!
//! A document is two flat arrays plus a length counter:
//! - text blocks in reading order (narrow bytes or UTF-16, shared storage)
//! - markup spans `[lower, upper)` in the order their tags were opened
//!
//! Layers:
//! A: Builder (`Document`, `Cursor`) keeping the span invariants
//! B: Replay (`replay`) rebuilding nested tag calls for any `MarkupSink`
//! C: Binary codec (`codec`) for lossless storage
//! D: Text dumps (`dump`) and loaders for both formats (`load`)
//! E: Parallel rendering of finished documents (`parallel`, default feature)

pub mod codec;
pub mod dom;
pub mod dump;
pub mod error;
pub mod load;
pub mod sink;
pub mod text;

#[cfg(feature = "parallel")]
pub mod parallel;

// ============================================================================
// Public Surface
// ============================================================================

pub use dom::{
    copy_wide, is_encoded, replay, Attributes, Cursor, Document, DocumentView, Fragment, Level,
    MarkupSink, MarkupSpan, TextView,
};
pub use dump::{ControlBytes, DumpOptions, JsonWriter, TagsWriter};
pub use error::{Error, Result};
pub use load::{load_json, load_tags};
pub use sink::{Policy, TagFilter, WideSink};
pub use text::{encoding, BlockEncoding, TextBlock};

// ============================================================================
// Format Conversion
// ============================================================================

/// Binary encoding of `view`
pub fn to_bytes<V: TextView + ?Sized>(view: &V) -> Vec<u8> {
    codec::to_bytes(view)
}

/// Decode a complete binary buffer
pub fn from_bytes(bytes: &[u8]) -> Result<Document> {
    codec::from_bytes(bytes)
}

/// Convert tag-format text to JSON
pub fn tags_to_json(input: &[u8], options: &DumpOptions) -> Result<String> {
    let doc = Document::from_tags(input)?;
    dump::to_json_string(&doc, options)
}

/// Convert JSON text to tag format
pub fn json_to_tags(input: &[u8]) -> Result<String> {
    Document::from_json(input)?.to_tags_string()
}

/// Convert tag-format text to the binary encoding
pub fn tags_to_bytes(input: &[u8]) -> Result<Vec<u8>> {
    Ok(Document::from_tags(input)?.to_bytes())
}
