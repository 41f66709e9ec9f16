//! Sink Adapters - transform builder calls on their way to another sink
//!
//! Adapters wrap any [`MarkupSink`](crate::dom::MarkupSink) and are driven
//! by [`replay`](crate::dom::replay) or directly by a loader:
//! - [`WideSink`]: re-encodes every block to UTF-16
//! - [`TagFilter`]: drops, unwraps or renames tags by name

pub mod filter;
pub mod wide;

pub use filter::{Policy, TagFilter};
pub use wide::WideSink;
