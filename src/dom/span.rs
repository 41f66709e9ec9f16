//! MarkupSpan - named interval over cumulative text length
//!
//! Offsets are in the owning document's length units (narrow bytes or wide
//! units, summed over blocks). The interval is half-open: `[lower, upper)`.

use std::ops::Range;

/// A tag name and the text interval it covers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarkupSpan {
    /// Tag name, passed through opaquely
    pub name: String,
    /// First covered offset
    pub lower: u32,
    /// One past the last covered offset, or [`MarkupSpan::OPEN`]
    pub upper: u32,
}

impl MarkupSpan {
    /// Upper bound of a span whose tag has not been closed yet
    pub const OPEN: u32 = u32::MAX;

    /// Create a closed span
    #[inline]
    pub fn new(name: impl Into<String>, lower: u32, upper: u32) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
        }
    }

    /// Create a span opened at `lower`
    #[inline]
    pub fn open(name: impl Into<String>, lower: u32) -> Self {
        Self::new(name, lower, Self::OPEN)
    }

    /// True while the tag has not been closed
    #[inline]
    pub const fn is_open(&self) -> bool {
        self.upper == Self::OPEN
    }

    /// Number of covered length units (0 while open)
    #[inline]
    pub const fn len(&self) -> u32 {
        if self.is_open() {
            0
        } else {
            self.upper.saturating_sub(self.lower)
        }
    }

    /// True if the span covers nothing
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Covered interval as a range
    #[inline]
    pub fn range(&self) -> Range<u32> {
        self.lower..self.upper
    }

    /// True if `other` lies inside this span
    pub fn contains(&self, other: &MarkupSpan) -> bool {
        self.lower <= other.lower && other.upper <= self.upper
    }
}
