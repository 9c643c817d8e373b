// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Positioning rules

use super::{GlyphMatch, GlyphPattern, MatchContext, Patterns, Rule};
use crate::font::{GlyphClass, LookupIndex};
use crate::{InvalidFontData, ShapeError};
use smallvec::{smallvec, SmallVec};
use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An attachment point, in font units
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Anchor {
    pub x: i32,
    pub y: i32,
}

/// A placement adjustment for one glyph
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Adjustment {
    pub glyph: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub x_placement: Option<i32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub y_placement: Option<i32>,
}

/// An attaching mark: its attachment class and own anchor
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MarkRecord {
    pub glyph: String,
    pub class: u16,
    pub anchor: Anchor,
}

impl MarkRecord {
    /// Construct
    pub fn new(glyph: &str, class: u16, x: i32, y: i32) -> Self {
        MarkRecord {
            glyph: glyph.to_string(),
            class,
            anchor: Anchor { x, y },
        }
    }
}

/// An attachment target (base or mark) with one anchor per mark class
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BaseRecord {
    pub glyph: String,
    pub anchors: BTreeMap<u16, Anchor>,
}

impl BaseRecord {
    /// Construct from `(class, x, y)` anchors
    pub fn new(glyph: &str, anchors: impl IntoIterator<Item = (u16, i32, i32)>) -> Self {
        BaseRecord {
            glyph: glyph.to_string(),
            anchors: anchors
                .into_iter()
                .map(|(class, x, y)| (class, Anchor { x, y }))
                .collect(),
        }
    }

    fn anchor(&self, class: u16) -> Result<Anchor, InvalidFontData> {
        self.anchors
            .get(&class)
            .copied()
            .ok_or_else(|| InvalidFontData::MissingAnchor {
                glyph: self.glyph.clone(),
                class,
            })
    }
}

/// Accumulated positioning of one glyph
///
/// Fields are `None` until some rule sets them.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphDelta {
    pub x_placement: Option<i32>,
    pub y_placement: Option<i32>,
    /// Horizontal offset from the attachment target
    pub x_coordinate: Option<i32>,
    /// Vertical offset from the attachment target
    pub y_coordinate: Option<i32>,
}

impl GlyphDelta {
    /// True if no field is set
    pub fn is_empty(&self) -> bool {
        *self == GlyphDelta::default()
    }
}

impl fmt::Display for GlyphDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [
            ("XPlacement", self.x_placement),
            ("YPlacement", self.y_placement),
            ("XCoordinate", self.x_coordinate),
            ("YCoordinate", self.y_coordinate),
        ];
        let mut first = true;
        for (name, value) in fields {
            if let Some(v) = value {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{name}={v}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A positioning rule
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PosRule {
    /// Adjust placement of single glyphs
    Single { adjustments: Vec<Adjustment> },
    /// Attach a mark to the nearest preceding base glyph
    MarkToBase {
        marks: Vec<MarkRecord>,
        bases: Vec<BaseRecord>,
    },
    /// Attach a mark to the nearest preceding visible mark
    MarkToMark {
        marks: Vec<MarkRecord>,
        base_marks: Vec<BaseRecord>,
    },
    /// Invoke another lookup within a matched context
    ChainContext {
        backtrack: Vec<GlyphPattern>,
        input: GlyphPattern,
        lookahead: Vec<GlyphPattern>,
        lookup: LookupIndex,
    },
}

/// The outcome of applying a [`PosRule`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum PosAction {
    /// Deltas were written directly
    Adjusted,
    /// Invoke this lookup at the same position
    Chain(LookupIndex),
}

impl PosRule {
    /// True if this rule applies at `pos`
    pub fn applicable(
        &self,
        tokens: &[String],
        pos: usize,
        ctx: &MatchContext,
    ) -> Result<bool, ShapeError> {
        let Some(glyph) = tokens.get(pos) else {
            return Ok(false);
        };
        Ok(match self {
            PosRule::Single { adjustments } => adjustments.iter().any(|a| a.glyph == *glyph),
            PosRule::MarkToBase { .. } | PosRule::MarkToMark { .. } => {
                self.attachment(tokens, pos, ctx).is_some()
            }
            PosRule::ChainContext {
                backtrack,
                input,
                lookahead,
                ..
            } => input.matches(glyph) && ctx.matches_around(tokens, pos, backtrack, lookahead),
        })
    }

    /// Apply at `pos`, writing into `deltas`
    ///
    /// Requires that [`Self::applicable`] is true.
    pub(crate) fn apply(
        &self,
        tokens: &[String],
        deltas: &mut [GlyphDelta],
        pos: usize,
        ctx: &MatchContext,
    ) -> Result<PosAction, ShapeError> {
        match self {
            PosRule::Single { adjustments } => {
                // Only the first entry for a glyph is used
                if let Some(adj) = adjustments.iter().find(|a| a.glyph == tokens[pos]) {
                    let delta = &mut deltas[pos];
                    if adj.x_placement.is_some() {
                        delta.x_placement = adj.x_placement;
                    }
                    if adj.y_placement.is_some() {
                        delta.y_placement = adj.y_placement;
                    }
                }
            }
            PosRule::MarkToBase { .. } | PosRule::MarkToMark { .. } => {
                if let Some((mark, target)) = self.attachment(tokens, pos, ctx) {
                    let anchor = target.anchor(mark.class)?;
                    let delta = &mut deltas[pos];
                    delta.x_coordinate = Some(anchor.x.saturating_sub(mark.anchor.x));
                    delta.y_coordinate = Some(anchor.y.saturating_sub(mark.anchor.y));
                }
            }
            PosRule::ChainContext { lookup, .. } => return Ok(PosAction::Chain(*lookup)),
        }
        Ok(PosAction::Adjusted)
    }

    /// Find the attaching mark at `pos` and its attachment target
    fn attachment(
        &self,
        tokens: &[String],
        pos: usize,
        ctx: &MatchContext,
    ) -> Option<(&MarkRecord, &BaseRecord)> {
        let (marks, targets, target) = match self {
            PosRule::MarkToBase { marks, bases } => {
                let gdef = ctx.gdef();
                let target = tokens[..pos]
                    .iter()
                    .rposition(|t| gdef.class(t) == GlyphClass::Base)?;
                (marks, bases, target)
            }
            PosRule::MarkToMark { marks, base_marks } => {
                let (target, _) = ctx.preceding(tokens, pos).next_back()?;
                (marks, base_marks, target)
            }
            _ => return None,
        };

        let mark = marks.iter().find(|m| m.glyph == tokens[pos])?;
        let target = targets.iter().find(|b| b.glyph == tokens[target])?;
        Some((mark, target))
    }
}

impl Rule for PosRule {
    fn context_len(&self) -> usize {
        match self {
            PosRule::Single { .. } => 1,
            PosRule::MarkToBase { .. } | PosRule::MarkToMark { .. } => 2,
            PosRule::ChainContext {
                backtrack,
                lookahead,
                ..
            } => backtrack.len() + 1 + lookahead.len(),
        }
    }

    fn chained_lookups(&self) -> SmallVec<[LookupIndex; 2]> {
        match self {
            PosRule::ChainContext { lookup, .. } => smallvec![*lookup],
            _ => SmallVec::new(),
        }
    }
}

impl fmt::Display for PosRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn glyphs<'a>(f: &mut fmt::Formatter<'_>, iter: impl Iterator<Item = &'a str>) -> fmt::Result {
            for g in iter {
                write!(f, " {g}")?;
            }
            Ok(())
        }

        match self {
            PosRule::Single { adjustments } => {
                for (i, adj) in adjustments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    let delta = GlyphDelta {
                        x_placement: adj.x_placement,
                        y_placement: adj.y_placement,
                        ..Default::default()
                    };
                    write!(f, "{}({delta})", adj.glyph)?;
                }
                Ok(())
            }
            PosRule::MarkToBase { marks, bases } => {
                f.write_str("marks")?;
                glyphs(f, marks.iter().map(|m| m.glyph.as_str()))?;
                f.write_str(" -> bases")?;
                glyphs(f, bases.iter().map(|b| b.glyph.as_str()))
            }
            PosRule::MarkToMark { marks, base_marks } => {
                f.write_str("marks")?;
                glyphs(f, marks.iter().map(|m| m.glyph.as_str()))?;
                f.write_str(" -> marks")?;
                glyphs(f, base_marks.iter().map(|b| b.glyph.as_str()))
            }
            PosRule::ChainContext {
                backtrack,
                input,
                lookahead,
                lookup,
            } => write!(
                f,
                "{}|{input}|{} ---> {lookup}",
                Patterns(backtrack),
                Patterns(lookahead)
            ),
        }
    }
}
