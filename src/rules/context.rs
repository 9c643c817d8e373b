// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Context filtering and matching
//!
//! Multi-glyph rules match against a *filtered* view of the glyph sequence:
//! glyphs excluded by the active lookup's flags are invisible to matching.
//! They are skipped over, not removed.

use super::GlyphMatch;
use crate::font::{GlyphClass, GlyphDefs, Lookup, LookupFlags, LookupIndex};
use crate::{InvalidFontData, ShapeError};
use std::collections::HashSet;

/// Glyph visibility for one lookup
#[derive(Clone, Debug)]
pub struct MatchContext<'a> {
    /// The lookup being applied
    pub lookup: LookupIndex,
    gdef: &'a GlyphDefs,
    flags: LookupFlags,
    filter_set: Option<&'a HashSet<String>>,
}

impl<'a> MatchContext<'a> {
    /// Construct for `lookup`
    ///
    /// Fails if the lookup's mark filtering set does not exist.
    pub fn new<R>(gdef: &'a GlyphDefs, lookup: &Lookup<R>) -> Result<Self, InvalidFontData> {
        let filter_set = match lookup.filter_set {
            Some(id) => Some(gdef.filter_set(id)?),
            None => None,
        };
        Ok(MatchContext {
            lookup: lookup.index,
            gdef,
            flags: lookup.flags,
            filter_set,
        })
    }

    /// Glyph classification
    #[inline]
    pub fn gdef(&self) -> &'a GlyphDefs {
        self.gdef
    }

    /// True if `glyph` is visible to context matching
    pub fn visible(&self, glyph: &str) -> bool {
        let ignored = match self.gdef.class(glyph) {
            GlyphClass::Base => LookupFlags::IGNORE_BASE_GLYPHS,
            GlyphClass::Ligature => LookupFlags::IGNORE_LIGATURES,
            GlyphClass::Mark => LookupFlags::IGNORE_MARKS,
            GlyphClass::Component => LookupFlags::empty(),
        };
        if self.flags.intersects(ignored) {
            return false;
        }

        let mark_class = self.flags.mark_attachment_class();
        if mark_class != 0 && self.gdef.mark_class(glyph) != Some(mark_class) {
            return false;
        }

        self.filter_set.map_or(true, |set| set.contains(glyph))
    }

    /// Visible glyphs after `pos`, with their positions
    pub fn following<'t>(
        &'t self,
        tokens: &'t [String],
        pos: usize,
    ) -> impl Iterator<Item = (usize, &'t str)> + 't {
        let start = (pos + 1).min(tokens.len());
        tokens[start..]
            .iter()
            .enumerate()
            .map(move |(i, t)| (start + i, t.as_str()))
            .filter(|(_, t)| self.visible(t))
    }

    /// Visible glyphs before `pos`, with their positions
    ///
    /// Iterate in reverse to walk backwards from `pos`.
    pub fn preceding<'t>(
        &'t self,
        tokens: &'t [String],
        pos: usize,
    ) -> impl DoubleEndedIterator<Item = (usize, &'t str)> + 't {
        tokens[..pos.min(tokens.len())]
            .iter()
            .enumerate()
            .map(|(i, t)| (i, t.as_str()))
            .filter(|(_, t)| self.visible(t))
    }

    /// True if the backtrack, remaining input and lookahead patterns match
    /// around `pos`
    ///
    /// The glyph at `pos` itself is not tested.
    pub fn matches_around<B, F>(
        &self,
        tokens: &[String],
        pos: usize,
        backtrack: &[B],
        after: F,
    ) -> bool
    where
        B: GlyphMatch,
        F: IntoIterator,
        F::Item: GlyphMatch,
    {
        is_suffix_of(backtrack, self.preceding(tokens, pos).map(|(_, t)| t))
            && is_prefix_of(after, self.following(tokens, pos).map(|(_, t)| t))
    }

    /// Positions of the first `n` input glyphs starting at `pos`
    ///
    /// The first is always `pos`; the rest are the next visible glyphs.
    pub fn input_positions(&self, tokens: &[String], pos: usize, n: usize) -> Vec<usize> {
        std::iter::once(pos)
            .chain(self.following(tokens, pos).map(|(i, _)| i))
            .take(n)
            .collect()
    }

    /// Construct the error for a rule kind this engine does not apply
    pub fn unsupported(&self, rule: &'static str) -> ShapeError {
        ShapeError::Unsupported {
            lookup: self.lookup,
            rule,
        }
    }
}

/// True if `pattern` matches the start of `tail`, left-aligned
///
/// An empty pattern matches anything.
pub fn is_prefix_of<'t, P, I>(pattern: P, tail: I) -> bool
where
    P: IntoIterator,
    P::Item: GlyphMatch,
    I: IntoIterator<Item = &'t str>,
{
    let mut tail = tail.into_iter();
    pattern
        .into_iter()
        .all(|p| tail.next().is_some_and(|t| p.matches(t)))
}

/// True if `pattern` matches the end of `head`, right-aligned
///
/// An empty pattern matches anything.
pub fn is_suffix_of<'t, P, I>(pattern: &[P], head: I) -> bool
where
    P: GlyphMatch,
    I: IntoIterator<Item = &'t str>,
    I::IntoIter: DoubleEndedIterator,
{
    let mut head = head.into_iter().rev();
    pattern
        .iter()
        .rev()
        .all(|p| head.next().is_some_and(|t| p.matches(t)))
}
