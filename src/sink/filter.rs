//! Tag Filter - per-name tag policy
//!
//! Importers keep tables of tags to ignore or rename. This adapter applies
//! such a table to any stream of builder calls:
//! - `Drop`: refuse the tag, so its whole subtree is skipped
//! - `Unwrap`: keep the content but emit no tag for it
//! - `Rename`: forward the tag under another name
//!
//! Tags without a rule pass through unchanged.

use std::collections::HashMap;

use log::trace;

use crate::dom::{Attributes, MarkupSink};
use crate::error::{Error, Result};
use crate::text::TextBlock;

/// What a [`TagFilter`] does with a tag name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Policy {
    Drop,
    Unwrap,
    Rename(String),
}

/// Sink adapter applying a [`Policy`] table
#[derive(Debug)]
pub struct TagFilter<S> {
    inner: S,
    rules: HashMap<String, Policy>,
    /// One entry per accepted `open_tag`: was it forwarded to `inner`
    forwarded: Vec<bool>,
}

impl<S: MarkupSink> TagFilter<S> {
    /// Wrap `inner` with an empty rule table
    pub fn new(inner: S) -> Self {
        TagFilter {
            inner,
            rules: HashMap::new(),
            forwarded: Vec::new(),
        }
    }

    /// Set the policy for `name`, replacing any earlier rule
    pub fn with_rule(mut self, name: impl Into<String>, policy: Policy) -> Self {
        self.rules.insert(name.into(), policy);
        self
    }

    /// Skip `name` and everything inside it
    pub fn drop_tag(self, name: impl Into<String>) -> Self {
        self.with_rule(name, Policy::Drop)
    }

    /// Keep the content of `name` without the tag itself
    pub fn unwrap_tag(self, name: impl Into<String>) -> Self {
        self.with_rule(name, Policy::Unwrap)
    }

    /// Forward `name` as `to`
    pub fn rename_tag(self, name: impl Into<String>, to: impl Into<String>) -> Self {
        self.with_rule(name, Policy::Rename(to.into()))
    }

    /// Policy for `name`, if any
    pub fn rule(&self, name: &str) -> Option<&Policy> {
        self.rules.get(name)
    }

    /// Unwrap the inner sink
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: MarkupSink> MarkupSink for TagFilter<S> {
    fn open_tag(&mut self, name: &str, attributes: &Attributes) -> Result<bool> {
        let target = match self.rules.get(name) {
            Some(Policy::Drop) => {
                trace!("dropping <{}>", name);
                return Ok(false);
            }
            Some(Policy::Unwrap) => {
                self.forwarded.push(false);
                return Ok(true);
            }
            Some(Policy::Rename(to)) => to.as_str(),
            None => name,
        };

        let accepted = self.inner.open_tag(target, attributes)?;
        if accepted {
            self.forwarded.push(true);
        }
        Ok(accepted)
    }

    fn close_tag(&mut self) -> Result<()> {
        match self.forwarded.pop() {
            Some(true) => self.inner.close_tag(),
            Some(false) => Ok(()),
            None => Err(Error::UnbalancedClose),
        }
    }

    #[inline]
    fn add_paragraph(&mut self, block: &TextBlock) -> Result<()> {
        self.inner.add_paragraph(block)
    }
}
