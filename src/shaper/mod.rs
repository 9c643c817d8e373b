// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Shaping engine
//!
//! This module provides the [`shape`] function, which runs a glyph sequence
//! through a [`Font`]'s substitution lookups then its positioning lookups.
//!
//! Lookups run in registration order. A lookup runs only if some feature
//! listing it is not suppressed by the [`ShapeOptions`]. Each rule firing is
//! recorded as an [`Application`]; chaining rules invoke other lookups at a
//! single position and merge the nested result into their own record.

use crate::conv::tag_str;
use crate::font::{Font, LookupIndex, RuleTable};
use crate::rules::{GlyphDelta, PosRule, SubstRule};
use crate::{InvalidFontData, ShapeError, ShapeOptions};
use smallvec::SmallVec;
use std::fmt;
use ttf_parser::Tag;

mod gpos;
mod gsub;

/// The lookup-index path of an application
///
/// The first element is the lookup which matched; each following element is
/// a lookup it invoked via chaining. Displays as e.g. `3/7`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LookupPath(SmallVec<[LookupIndex; 2]>);

impl LookupPath {
    /// Construct with a single lookup
    pub fn new(index: LookupIndex) -> Self {
        let mut path = LookupPath::default();
        path.0.push(index);
        path
    }

    /// Lookup indices, outermost first
    pub fn indices(&self) -> &[LookupIndex] {
        &self.0
    }

    /// Append the path of a nested application
    pub(crate) fn extend(&mut self, nested: &LookupPath) {
        self.0.extend_from_slice(&nested.0);
    }

    /// Prefix with an enclosing lookup
    pub(crate) fn prefixed(index: LookupIndex, nested: &LookupPath) -> Self {
        let mut path = LookupPath::new(index);
        path.extend(nested);
        path
    }
}

impl fmt::Display for LookupPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

/// The rule which fired
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AppliedRule<'f> {
    Subst(&'f SubstRule),
    Pos(&'f PosRule),
}

impl<'f> fmt::Display for AppliedRule<'f> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppliedRule::Subst(rule) => rule.fmt(f),
            AppliedRule::Pos(rule) => rule.fmt(f),
        }
    }
}

/// A record of one rule firing
#[derive(Clone, Debug, PartialEq)]
pub struct Application<'f> {
    /// The feature which activated the lookup
    pub feature: Tag,
    /// The lookup which matched, and any it chained to
    pub path: LookupPath,
    /// Positions the rule matched, in the sequence it was applied to
    pub positions: SmallVec<[u32; 4]>,
    /// The rule
    pub rule: AppliedRule<'f>,
    /// The glyph sequence after the rule applied
    pub tokens: Vec<String>,
    /// The position deltas after the rule applied
    ///
    /// This is `None` for substitutions.
    pub deltas: Option<Vec<GlyphDelta>>,
}

impl<'f> Application<'f> {
    /// The first affected position
    pub fn first_position(&self) -> usize {
        self.positions
            .first()
            .map(|p| crate::conv::to_usize(*p))
            .unwrap_or(0)
    }
}

/// Output of [`shape`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Shaped<'f> {
    /// The rewritten glyph sequence
    pub tokens: Vec<String>,
    /// One position delta per glyph of `tokens`
    pub deltas: Vec<GlyphDelta>,
    /// All rule firings, in order
    pub trace: Vec<Application<'f>>,
}

/// Shape a glyph sequence
///
/// The font is only read. Fails on reverse chaining substitution rules, on
/// references to missing font data, and on chaining deeper than
/// [`ShapeOptions::max_chain_depth`].
pub fn shape<'f, S: AsRef<str>>(
    font: &'f Font,
    tokens: &[S],
    options: &ShapeOptions,
) -> Result<Shaped<'f>, ShapeError> {
    let mut tokens: Vec<String> = tokens.iter().map(|t| t.as_ref().to_string()).collect();
    let mut trace = Vec::new();

    for lookup in font.gsub.lookups.iter() {
        let Some(feature) = active_feature(&font.gsub, lookup.index, options, "GSUB") else {
            continue;
        };
        let pass = gsub::SubstPass {
            font,
            options,
            feature,
        };
        let fired = trace.len();
        tokens = pass.run(lookup, tokens, &mut trace)?;
        log::debug!(
            "GSUB lookup {}: {} applications, {} glyphs",
            lookup.index,
            trace.len() - fired,
            tokens.len()
        );
    }

    let mut deltas = vec![GlyphDelta::default(); tokens.len()];

    for lookup in font.gpos.lookups.iter() {
        let Some(feature) = active_feature(&font.gpos, lookup.index, options, "GPOS") else {
            continue;
        };
        let pass = gpos::PosPass {
            font,
            options,
            feature,
        };
        let fired = trace.len();
        pass.run(lookup, &tokens, &mut deltas, &mut trace)?;
        log::debug!(
            "GPOS lookup {}: {} applications",
            lookup.index,
            trace.len() - fired
        );
    }

    Ok(Shaped {
        tokens,
        deltas,
        trace,
    })
}

fn active_feature<R>(
    table: &RuleTable<R>,
    index: LookupIndex,
    options: &ShapeOptions,
    name: &str,
) -> Option<Tag> {
    match table.features.owner(index, options) {
        Some(tag) => {
            log::trace!("{name} lookup {index}: feature '{}'", tag_str(tag));
            Some(tag)
        }
        None => {
            log::debug!("{name} lookup {index}: skipped, no active feature");
            None
        }
    }
}

/// Check the nesting bound before entering a chained lookup
fn check_depth(
    options: &ShapeOptions,
    lookup: LookupIndex,
    depth: u32,
) -> Result<(), ShapeError> {
    if depth > options.max_chain_depth {
        Err(ShapeError::ChainTooDeep { lookup, depth })
    } else {
        Ok(())
    }
}

fn missing(lookup: LookupIndex) -> ShapeError {
    InvalidFontData::MissingLookup(lookup).into()
}
