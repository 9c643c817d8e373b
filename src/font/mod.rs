// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! The font model
//!
//! A [`Font`] holds everything shaping reads: the glyph inventory with
//! advance widths, a character map, glyph classification ([`GlyphDefs`]) and
//! two rule databases ([`RuleTable`]): `gsub` for substitution and `gpos` for
//! positioning.
//!
//! Fonts are built by an external loader (for example from a decoded TTX
//! dump) using the methods here, or deserialized when the `serde` feature is
//! enabled. Once built, a font is only ever read: shaping takes `&Font`, so
//! concurrent shaping against one font is safe.

use crate::conv::tag;
use crate::rules::{PosRule, Rule, SubstRule};
use crate::InvalidFontData;
use std::collections::HashMap;
use ttf_parser::Tag;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod feature;
mod gdef;
mod lookup;

pub use feature::{Feature, FeatureList, RuleTable};
pub use gdef::{GlyphClass, GlyphDefs};
pub use lookup::{Lookup, LookupFlags, LookupIndex, LookupList};

/// A font model
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Font {
    /// The single active script
    #[cfg_attr(feature = "serde", serde(with = "crate::conv::serde_tag", default = "latn"))]
    pub script: Tag,
    #[cfg_attr(feature = "serde", serde(default))]
    glyphs: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    advances: HashMap<String, i32>,
    #[cfg_attr(feature = "serde", serde(default))]
    cmap: HashMap<u32, String>,
    /// Glyph classification
    #[cfg_attr(feature = "serde", serde(default))]
    pub gdef: GlyphDefs,
    /// Substitution rules
    #[cfg_attr(feature = "serde", serde(default))]
    pub gsub: RuleTable<SubstRule>,
    /// Positioning rules
    #[cfg_attr(feature = "serde", serde(default))]
    pub gpos: RuleTable<PosRule>,
}

fn latn() -> Tag {
    tag("latn")
}

impl Default for Font {
    fn default() -> Self {
        Font {
            script: latn(),
            glyphs: vec![],
            advances: HashMap::new(),
            cmap: HashMap::new(),
            gdef: GlyphDefs::default(),
            gsub: RuleTable::default(),
            gpos: RuleTable::default(),
        }
    }
}

/// Construction
impl Font {
    /// Construct an empty font
    pub fn new() -> Self {
        Font::default()
    }

    /// Add a glyph with its advance width
    ///
    /// Re-adding a glyph updates its advance width.
    pub fn add_glyph(&mut self, name: impl Into<String>, advance: i32) {
        let name = name.into();
        if self.advances.insert(name.clone(), advance).is_none() {
            self.glyphs.push(name);
        }
    }

    /// Set the class of `glyph`
    pub fn set_glyph_class(&mut self, glyph: impl Into<String>, class: GlyphClass) {
        self.gdef.set_class(glyph, class);
    }

    /// Set the mark attachment class of `glyph`
    pub fn set_mark_class(&mut self, glyph: impl Into<String>, class: u16) {
        self.gdef.set_mark_class(glyph, class);
    }

    /// Define mark filtering set `id`
    pub fn add_filter_set<I, S>(&mut self, id: u16, glyphs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.gdef.add_filter_set(id, glyphs);
    }

    /// Map a character to a glyph
    pub fn map_char(&mut self, c: char, glyph: impl Into<String>) {
        self.cmap.insert(u32::from(c), glyph.into());
    }

    /// Register a substitution lookup
    pub fn add_gsub_lookup(&mut self, lookup: Lookup<SubstRule>) {
        self.gsub.lookups.push(lookup);
    }

    /// Register a substitution feature
    pub fn add_gsub_feature(&mut self, feature: Feature) {
        self.gsub.features.push(feature);
    }

    /// Register a positioning lookup
    pub fn add_gpos_lookup(&mut self, lookup: Lookup<PosRule>) {
        self.gpos.lookups.push(lookup);
    }

    /// Register a positioning feature
    pub fn add_gpos_feature(&mut self, feature: Feature) {
        self.gpos.features.push(feature);
    }
}

/// Queries
impl Font {
    /// Glyph names, in glyph order
    pub fn glyphs(&self) -> &[String] {
        &self.glyphs
    }

    /// Advance width of `glyph`, in font units
    pub fn advance(&self, glyph: &str) -> Result<i32, InvalidFontData> {
        self.advances
            .get(glyph)
            .copied()
            .ok_or_else(|| InvalidFontData::MissingAdvance(glyph.to_string()))
    }

    /// Map a string to glyph tokens via the character map
    pub fn string_to_tokens(&self, s: &str) -> Result<Vec<String>, InvalidFontData> {
        s.chars()
            .map(|c| {
                self.cmap
                    .get(&u32::from(c))
                    .cloned()
                    .ok_or(InvalidFontData::UnmappedChar(c))
            })
            .collect()
    }

    /// Check internal references
    ///
    /// This is intended for use by loaders. It reports the first dangling
    /// reference from a chaining rule or lookup filter, if any. Features
    /// listing absent lookups and cycles among chaining rules are tolerated
    /// (the former never run, the latter are bounded at shaping time) but
    /// logged as warnings.
    pub fn validate(&self) -> Result<(), InvalidFontData> {
        validate_table(&self.gdef, &self.gsub, "GSUB")?;
        validate_table(&self.gdef, &self.gpos, "GPOS")
    }
}

fn validate_table<R: Rule>(
    gdef: &GlyphDefs,
    table: &RuleTable<R>,
    name: &str,
) -> Result<(), InvalidFontData> {
    if let Some(index) = table.lookups.duplicate() {
        return Err(InvalidFontData::DuplicateLookup(index));
    }

    for lookup in table.lookups.iter() {
        if let Some(id) = lookup.filter_set {
            gdef.filter_set(id)?;
        }
        for rule in &lookup.rules {
            rule.validate()?;
        }
        for index in lookup.chained_lookups() {
            if table.lookups.get(index).is_none() {
                return Err(InvalidFontData::MissingLookup(index));
            }
        }
    }

    for feature in table.features.iter() {
        for index in &feature.lookups {
            if table.lookups.get(*index).is_none() {
                log::warn!(
                    "{name}: feature '{}' lists missing lookup {index}",
                    crate::conv::tag_str(feature.tag)
                );
            }
        }
    }

    if let Some(index) = table.lookups.find_cycle() {
        log::warn!("{name}: lookup {index} is part of a chaining cycle");
    }
    Ok(())
}
