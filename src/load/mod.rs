//! Loaders - feed text renderings back through the builder interface
//!
//! Loaders drive any [`MarkupSink`](crate::dom::MarkupSink), so a loaded
//! document can go straight into a [`Document`](crate::dom::Document), a
//! filter, or another dump.

pub mod json;
pub mod tags;

pub use json::load_json;
pub use tags::{load_tags, read_tags, unescape_markup};
