//! Control-flow primitives every grammar rule is written with.
//!
//! Each combinator verifies the element's start tag, hands control to the
//! caller at well-defined points, and verifies the matching end tag. Values
//! are built locally and only returned on success, so a failure never
//! leaves half-populated records behind. Errors raised by callbacks are
//! recorded on the cursor like any other error.

use super::cursor::{EventKind, TokenCursor};
use crate::error::Result;

impl TokenCursor<'_> {
    /// Parses a composite element.
    ///
    /// `init` runs once on the start tag (typically reading attributes) and
    /// returns the value under construction. `per_child` runs once for each
    /// child start tag and must consume that child; a child it leaves
    /// unconsumed is skipped.
    pub fn parsing_element<T>(
        &mut self,
        name: &str,
        init: impl FnOnce(&mut Self) -> Result<T>,
        mut per_child: impl FnMut(&mut Self, &mut T) -> Result<()>,
    ) -> Result<T> {
        self.expect(EventKind::StartTag, name)?;
        let depth = self.depth();
        let mut value = init(self).map_err(|e| self.fail(e))?;

        loop {
            match self.advance()? {
                EventKind::EndTag => break,
                EventKind::StartTag => {
                    per_child(self, &mut value).map_err(|e| self.fail(e))?;
                    if self.depth() > depth {
                        self.close_to(depth, None)?;
                    }
                }
            }
        }

        self.expect(EventKind::EndTag, name)?;
        Ok(value)
    }

    /// Parses a scalar leaf element and returns its trimmed text.
    ///
    /// Callers read attributes before calling this; nothing is committed
    /// unless the whole element parses.
    pub fn with_text(&mut self, name: &str) -> Result<String> {
        self.expect(EventKind::StartTag, name)?;
        let text = self.text()?;
        self.expect(EventKind::EndTag, name)?;
        Ok(text)
    }

    /// Parses an element whose content is never meaningful.
    ///
    /// `capture` sees the start tag (attributes only), then the subtree is
    /// discarded.
    pub fn with_skip<T>(
        &mut self,
        name: &str,
        capture: impl FnOnce(&Self) -> Result<T>,
    ) -> Result<T> {
        self.expect(EventKind::StartTag, name)?;
        let value = capture(self).map_err(|e| self.fail(e))?;
        self.skip()?;
        self.expect(EventKind::EndTag, name)?;
        Ok(value)
    }

    /// Starts iterating over the children of the element named `name`.
    pub fn children(&mut self, name: &str) -> Result<Children> {
        self.expect(EventKind::StartTag, name)?;
        Ok(Children {
            name: name.to_string(),
            depth: self.depth(),
            done: false,
        })
    }
}

/// Pull-style iterator over child elements.
///
/// Each call to [`next`](Children::next) yields the lower-cased local name of
/// the next child, with the cursor positioned on its start tag. The caller
/// consumes the child before asking for the next one; an unconsumed child
/// is skipped. After the parent's end tag has been verified, `next` returns
/// `None` forever.
#[derive(Debug)]
pub struct Children {
    name: String,
    depth: usize,
    done: bool,
}

impl Children {
    pub fn next(&mut self, cursor: &mut TokenCursor<'_>) -> Result<Option<String>> {
        if self.done {
            return Ok(None);
        }

        let step = self.step(cursor);
        if !matches!(step, Ok(Some(_))) {
            self.done = true;
        }
        step
    }

    fn step(&self, cursor: &mut TokenCursor<'_>) -> Result<Option<String>> {
        if cursor.depth() > self.depth {
            cursor.close_to(self.depth, None)?;
        }

        match cursor.advance()? {
            EventKind::StartTag => Ok(Some(cursor.lower_name())),
            EventKind::EndTag => {
                cursor.expect(EventKind::EndTag, &self.name)?;
                Ok(None)
            }
        }
    }
}
