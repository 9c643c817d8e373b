// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Glyph definitions: glyph classes, mark attachment classes and mark
//! filtering sets

use crate::InvalidFontData;
use std::collections::{HashMap, HashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Glyph class, as assigned by the `GlyphClassDef` table
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GlyphClass {
    /// Single character, spacing glyph
    Base,
    /// Multiple character, spacing glyph
    Ligature,
    /// Non-spacing combining glyph
    ///
    /// Glyphs without a class definition are treated as marks.
    #[default]
    Mark,
    /// Part of a single character, spacing glyph
    Component,
}

impl GlyphClass {
    /// Decode the numeric class value used by `GlyphClassDef`
    ///
    /// Returns `None` for 0 (unclassified) and out-of-range values.
    pub fn from_u16(value: u16) -> Option<Self> {
        Some(match value {
            1 => GlyphClass::Base,
            2 => GlyphClass::Ligature,
            3 => GlyphClass::Mark,
            4 => GlyphClass::Component,
            _ => return None,
        })
    }
}

/// Glyph classification data
///
/// Immutable once the font is loaded.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GlyphDefs {
    #[cfg_attr(feature = "serde", serde(default))]
    classes: HashMap<String, GlyphClass>,
    #[cfg_attr(feature = "serde", serde(default))]
    mark_classes: HashMap<String, u16>,
    #[cfg_attr(feature = "serde", serde(default))]
    filter_sets: HashMap<u16, HashSet<String>>,
}

impl GlyphDefs {
    /// Set the class of `glyph`
    pub fn set_class(&mut self, glyph: impl Into<String>, class: GlyphClass) {
        self.classes.insert(glyph.into(), class);
    }

    /// Set the mark attachment class of `glyph`
    pub fn set_mark_class(&mut self, glyph: impl Into<String>, class: u16) {
        self.mark_classes.insert(glyph.into(), class);
    }

    /// Define mark filtering set `id`
    ///
    /// Replaces any previous set with the same `id`.
    pub fn add_filter_set<I, S>(&mut self, id: u16, glyphs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set = glyphs.into_iter().map(Into::into).collect();
        self.filter_sets.insert(id, set);
    }

    /// Get the class of `glyph` (default: [`GlyphClass::Mark`])
    #[inline]
    pub fn class(&self, glyph: &str) -> GlyphClass {
        self.classes.get(glyph).copied().unwrap_or_default()
    }

    /// Get the mark attachment class of `glyph`, if any
    #[inline]
    pub fn mark_class(&self, glyph: &str) -> Option<u16> {
        self.mark_classes.get(glyph).copied()
    }

    /// Get mark filtering set `id`
    pub fn filter_set(&self, id: u16) -> Result<&HashSet<String>, InvalidFontData> {
        self.filter_sets
            .get(&id)
            .ok_or(InvalidFontData::MissingFilterSet(id))
    }
}
