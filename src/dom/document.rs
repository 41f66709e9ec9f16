//! Document - builder over flat block and span arrays
//!
//! Open tags are tracked in an arena of cursor slots:
//! - each slot holds its span index (or `None` once closed)
//! - `parent` points at the enclosing slot (`None` = document level)
//! - `open_child` is the level's single "currently open child"
//!
//! Closed slots go on a free list and are reused by the next tag, so the
//! arena only grows to the deepest nesting reached. Each reuse bumps the
//! slot's generation, which turns older cursors for it into closed ones.
//!
//! Opening a tag or appending text at a level first closes that level's
//! open child, depth-first. A tag that received no text by the time it is
//! closed is removed from the span list instead of being finalized.

use log::{debug, trace};

use super::span::MarkupSpan;
use super::{Attributes, MarkupSink, TextView};
use crate::error::{Error, Result};
use crate::text::TextBlock;

/// Handle to one open tag of a [`Document`]
///
/// Handles are plain indices: copying one does not keep the tag open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    index: u32,
    generation: u32,
}

/// Where a builder call applies: the document itself or an open tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Level {
    /// Document level, outside every tag
    #[default]
    Root,
    /// Inside the tag behind the cursor
    Tag(Cursor),
}

impl From<Cursor> for Level {
    #[inline]
    fn from(cursor: Cursor) -> Self {
        Level::Tag(cursor)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    span: Option<usize>,
    parent: Option<u32>,
    open_child: Option<u32>,
    generation: u32,
}

/// Flat marked-up text: blocks, spans and their cumulative length
#[derive(Debug, Clone, Default)]
pub struct Document {
    blocks: Vec<TextBlock>,
    markup: Vec<MarkupSpan>,
    length: u32,
    /// Cursor arena
    slots: Vec<Slot>,
    /// Closed slots ready for reuse
    free: Vec<u32>,
    /// Document level open child
    open_child: Option<u32>,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with estimated capacity
    pub fn with_capacity(blocks: usize, spans: usize) -> Self {
        Document {
            blocks: Vec::with_capacity(blocks),
            markup: Vec::with_capacity(spans),
            ..Self::default()
        }
    }

    /// Assemble a finished document from already validated arrays
    pub(crate) fn from_parts(blocks: Vec<TextBlock>, markup: Vec<MarkupSpan>, length: u32) -> Self {
        Document {
            blocks,
            markup,
            length,
            ..Self::default()
        }
    }

    /// Build a document from a nested fragment list
    pub fn from_fragments(fragments: &[Fragment<'_>]) -> Result<Self> {
        let mut doc = Document::new();
        doc.fill(Level::Root, fragments)?;
        Ok(doc)
    }

    fn fill(&mut self, at: Level, fragments: &[Fragment<'_>]) -> Result<()> {
        for fragment in fragments {
            match fragment {
                Fragment::Text(text) => {
                    self.add_text(at, text)?;
                }
                Fragment::Wide(text) => {
                    self.add_paragraph(at, TextBlock::wide_str(text))?;
                }
                Fragment::Tag(name, children) => {
                    let cursor = self.add_markup_tag(at, name)?;
                    self.fill(cursor.into(), children)?;
                    self.close(cursor);
                }
            }
        }
        Ok(())
    }

    /// Text blocks in reading order
    #[inline]
    pub fn blocks(&self) -> &[TextBlock] {
        &self.blocks
    }

    /// Markup spans in open order
    #[inline]
    pub fn markup(&self) -> &[MarkupSpan] {
        &self.markup
    }

    /// Cumulative length of all blocks
    #[inline]
    pub fn length(&self) -> u32 {
        self.length
    }

    /// True if no block and no span was added
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.markup.is_empty()
    }

    /// Borrowed read view
    pub fn view(&self) -> DocumentView<'_> {
        DocumentView {
            blocks: &self.blocks,
            markup: &self.markup,
            length: self.length,
        }
    }

    /// True while the cursor's tag is open
    pub fn is_open(&self, cursor: Cursor) -> bool {
        self.live_slot(cursor).is_some()
    }

    /// Deepest currently open level
    pub fn current(&self) -> Level {
        let mut level = Level::Root;
        let mut next = self.open_child;
        while let Some(index) = next {
            level = Level::Tag(self.cursor(index));
            next = self.slots[index as usize].open_child;
        }
        level
    }

    /// Number of currently open tags
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut next = self.open_child;
        while let Some(index) = next {
            depth += 1;
            next = self.slots[index as usize].open_child;
        }
        depth
    }

    /// Open a tag at `at`, closing that level's previous open child first
    pub fn add_markup_tag(&mut self, at: impl Into<Level>, name: &str) -> Result<Cursor> {
        let parent = self.resolve(at.into())?;

        if let Some(child) = self.open_child_of(parent) {
            self.close_slot(child);
        }

        let span = self.markup.len();
        let index = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.span = Some(span);
                slot.parent = parent;
                slot.open_child = None;
                slot.generation = slot.generation.wrapping_add(1);
                index
            }
            None => {
                let index = u32::try_from(self.slots.len()).map_err(|_| Error::LengthOverflow)?;
                self.slots.push(Slot {
                    span: Some(span),
                    parent,
                    open_child: None,
                    generation: 0,
                });
                index
            }
        };
        self.markup.push(MarkupSpan::open(name, self.length));
        self.set_open_child(parent, Some(index));

        Ok(self.cursor(index))
    }

    /// Open a tag with attributes; the document does not store them
    pub fn add_markup_tag_with(
        &mut self,
        at: impl Into<Level>,
        name: &str,
        _attributes: &Attributes,
    ) -> Result<Cursor> {
        self.add_markup_tag(at, name)
    }

    /// Append a block at `at` and return the stored block
    ///
    /// Any tag still open under `at` is closed first.
    pub fn add_paragraph(&mut self, at: impl Into<Level>, block: TextBlock) -> Result<TextBlock> {
        let level = self.resolve(at.into())?;
        let length = u32::try_from(block.len())
            .ok()
            .and_then(|len| self.length.checked_add(len))
            .filter(|&total| total != MarkupSpan::OPEN)
            .ok_or(Error::LengthOverflow)?;

        if let Some(child) = self.open_child_of(level) {
            self.close_slot(child);
        }

        self.blocks.push(block.clone());
        self.length = length;
        Ok(block)
    }

    /// Append a UTF-8 block
    pub fn add_text(&mut self, at: impl Into<Level>, text: &str) -> Result<TextBlock> {
        self.add_paragraph(at, TextBlock::utf8(text))
    }

    /// Append a wide block
    pub fn add_wide(&mut self, at: impl Into<Level>, units: &[u16]) -> Result<TextBlock> {
        self.add_paragraph(at, TextBlock::wide(units))
    }

    /// Close the cursor's tag and everything open beneath it
    ///
    /// Closing a closed cursor does nothing.
    pub fn close(&mut self, cursor: Cursor) {
        if let Some(index) = self.live_slot(cursor) {
            self.close_slot(index);
        }
    }

    /// Close every open tag, then drop all blocks and spans
    pub fn clear(&mut self) {
        if let Some(child) = self.open_child {
            self.close_slot(child);
        }
        debug!(
            "clearing document: {} blocks, {} spans",
            self.blocks.len(),
            self.markup.len()
        );
        self.blocks.clear();
        self.markup.clear();
        self.length = 0;
        self.open_child = None;
    }

    fn cursor(&self, index: u32) -> Cursor {
        Cursor {
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    fn live_slot(&self, cursor: Cursor) -> Option<u32> {
        self.slots
            .get(cursor.index as usize)
            .filter(|slot| slot.span.is_some() && slot.generation == cursor.generation)
            .map(|_| cursor.index)
    }

    /// Slot index for a level, `None` meaning the document level
    fn resolve(&self, level: Level) -> Result<Option<u32>> {
        match level {
            Level::Root => Ok(None),
            Level::Tag(cursor) => self
                .live_slot(cursor)
                .map(Some)
                .ok_or(Error::UseAfterClose),
        }
    }

    fn open_child_of(&self, level: Option<u32>) -> Option<u32> {
        match level {
            None => self.open_child,
            Some(index) => self.slots[index as usize].open_child,
        }
    }

    fn set_open_child(&mut self, level: Option<u32>, child: Option<u32>) {
        match level {
            None => self.open_child = child,
            Some(index) => self.slots[index as usize].open_child = child,
        }
    }

    /// Close `index` and its open descendants, deepest first
    fn close_slot(&mut self, index: u32) {
        let mut chain = vec![index];
        let mut next = self.slots[index as usize].open_child;
        while let Some(child) = next {
            chain.push(child);
            next = self.slots[child as usize].open_child;
        }
        for &slot in chain.iter().rev() {
            self.finish_slot(slot);
        }
    }

    fn finish_slot(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        let Some(span) = slot.span.take() else {
            return;
        };
        slot.open_child = None;
        let parent = slot.parent;
        self.free.push(index);

        if self.open_child_of(parent) == Some(index) {
            self.set_open_child(parent, None);
        }

        if self.markup[span].lower == self.length {
            // nothing was appended since the tag opened: it must be the stack top
            assert_eq!(
                span + 1,
                self.markup.len(),
                "empty tag <{}> closed below the top of the span list",
                self.markup[span].name
            );
            if let Some(pruned) = self.markup.pop() {
                trace!("pruned empty tag <{}> at {}", pruned.name, pruned.lower);
            }
        } else {
            self.markup[span].upper = self.length;
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length && self.blocks == other.blocks && self.markup == other.markup
    }
}

impl TextView for Document {
    #[inline]
    fn blocks(&self) -> &[TextBlock] {
        &self.blocks
    }

    #[inline]
    fn markup(&self) -> &[MarkupSpan] {
        &self.markup
    }

    #[inline]
    fn length(&self) -> u32 {
        self.length
    }
}

/// Event-style building always targets the deepest open tag
impl MarkupSink for Document {
    fn open_tag(&mut self, name: &str, attributes: &Attributes) -> Result<bool> {
        let at = self.current();
        self.add_markup_tag_with(at, name, attributes)?;
        Ok(true)
    }

    fn close_tag(&mut self) -> Result<()> {
        match self.current() {
            Level::Root => Err(Error::UnbalancedClose),
            Level::Tag(cursor) => {
                self.close(cursor);
                Ok(())
            }
        }
    }

    fn add_paragraph(&mut self, block: &TextBlock) -> Result<()> {
        let at = self.current();
        Document::add_paragraph(self, at, block.clone()).map(|_| ())
    }
}

/// Borrowed view over block and span arrays
#[derive(Debug, Clone, Copy)]
pub struct DocumentView<'a> {
    blocks: &'a [TextBlock],
    markup: &'a [MarkupSpan],
    length: u32,
}

impl<'a> DocumentView<'a> {
    /// View arbitrary arrays, computing their cumulative length
    pub fn new(blocks: &'a [TextBlock], markup: &'a [MarkupSpan]) -> Result<Self> {
        let mut length: u32 = 0;
        for block in blocks {
            length = u32::try_from(block.len())
                .ok()
                .and_then(|len| length.checked_add(len))
                .filter(|&total| total != MarkupSpan::OPEN)
                .ok_or(Error::LengthOverflow)?;
        }
        Ok(DocumentView {
            blocks,
            markup,
            length,
        })
    }
}

impl TextView for DocumentView<'_> {
    #[inline]
    fn blocks(&self) -> &[TextBlock] {
        self.blocks
    }

    #[inline]
    fn markup(&self) -> &[MarkupSpan] {
        self.markup
    }

    #[inline]
    fn length(&self) -> u32 {
        self.length
    }
}

/// Nested initializer for [`Document::from_fragments`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment<'a> {
    /// UTF-8 text block
    Text(&'a str),
    /// Wide text block
    Wide(&'a str),
    /// Tag wrapping more fragments
    Tag(&'a str, Vec<Fragment<'a>>),
}

impl<'a> Fragment<'a> {
    /// Tag wrapping `children`
    pub fn tag(name: &'a str, children: Vec<Fragment<'a>>) -> Self {
        Fragment::Tag(name, children)
    }
}

impl<'a> From<&'a str> for Fragment<'a> {
    fn from(text: &'a str) -> Self {
        Fragment::Text(text)
    }
}


#[cfg(test)]
pub(crate) mod proptests {
    use super::*;
    use proptest::prelude::*;

    const NAMES: [&str; 4] = ["p", "b", "td", "w:r"];

    /// One step of a generated build script
    #[derive(Debug, Clone)]
    pub(crate) enum Op {
        Open(usize),
        Text(String),
        Wide(String),
        Close,
    }

    pub(crate) fn script() -> impl Strategy<Value = Vec<Op>> {
        let op = prop_oneof![
            (0..NAMES.len()).prop_map(Op::Open),
            "[a-z<>& ]{0,8}".prop_map(Op::Text),
            "\\PC{0,6}".prop_map(Op::Wide),
            Just(Op::Close),
        ];
        prop::collection::vec(op, 0..48)
    }

    /// Run a script through the event interface
    pub(crate) fn build(ops: &[Op]) -> Document {
        let attributes = Attributes::new();
        let mut doc = Document::new();
        for op in ops {
            match op {
                Op::Open(name) => {
                    doc.open_tag(NAMES[*name], &attributes).unwrap();
                }
                Op::Text(text) => {
                    MarkupSink::add_paragraph(&mut doc, &TextBlock::utf8(text)).unwrap();
                }
                Op::Wide(text) => {
                    MarkupSink::add_paragraph(&mut doc, &TextBlock::wide_str(text)).unwrap();
                }
                Op::Close => {
                    // closing at the root is rejected and leaves the document as is
                    let _ = doc.close_tag();
                }
            }
        }
        doc
    }

    proptest! {
        /// Length is the sum of block lengths and every span lies inside it.
        #[test]
        fn length_bounds_every_span(ops in script()) {
            let doc = build(&ops);
            let total: usize = doc.blocks().iter().map(TextBlock::len).sum();
            prop_assert_eq!(total, doc.length() as usize);

            let open = doc.markup().iter().filter(|span| span.is_open()).count();
            prop_assert_eq!(open, doc.depth());
            for span in doc.markup() {
                prop_assert!(span.lower <= doc.length());
                if !span.is_open() {
                    prop_assert!(span.lower < span.upper);
                    prop_assert!(span.upper <= doc.length());
                }
            }
        }

        /// Closing everything leaves no open span and no empty span.
        #[test]
        fn clear_path_closes_all(ops in script()) {
            let mut doc = build(&ops);
            while let Level::Tag(cursor) = doc.current() {
                doc.close(cursor);
            }
            prop_assert!(doc.markup().iter().all(|span| !span.is_open() && !span.is_empty()));
        }
    }
}
