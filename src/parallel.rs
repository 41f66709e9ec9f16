//! Parallel Rendering
//!
//! A finished document is plain shared data, so any number of renderings
//! can run over it at once. Uses Rayon for:
//! - several output formats of one view
//! - the binary encoding of many views

use rayon::prelude::*;

use crate::codec;
use crate::dom::TextView;
use crate::dump::{self, DumpOptions};
use crate::error::Result;

/// Output format for [`render_parallel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Binary,
    Tags,
    Json,
}

/// Render `view` once per requested format, concurrently
///
/// Results come back in the order of `formats`.
pub fn render_parallel<V>(view: &V, formats: &[Format], options: &DumpOptions) -> Vec<Result<Vec<u8>>>
where
    V: TextView + Sync + ?Sized,
{
    formats
        .par_iter()
        .map(|format| match format {
            Format::Binary => Ok(codec::to_bytes(view)),
            Format::Tags => dump::write_tags(view, Vec::new(), options),
            Format::Json => dump::write_json(view, Vec::new(), options),
        })
        .collect()
}

/// Encode many views concurrently
pub fn encode_parallel<V: TextView + Sync>(views: &[V]) -> Vec<Vec<u8>> {
    views.par_iter().map(|view| codec::to_bytes(view)).collect()
}
