//! Text Module - storage for runs of text
//!
//! - `block`: immutable, reference-counted [`TextBlock`] in narrow or wide form
//! - `encoding`: codepage ids and the built-in narrow decoders

pub mod block;
pub mod encoding;

pub use block::{BlockEncoding, TextBlock, WIDE_UNIT_SIZE};
pub use encoding::Charset;
