// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Layout rules
//!
//! Each rule database has a closed set of rule kinds: [`SubstRule`] for
//! substitution and [`PosRule`] for positioning. A [`Lookup`] holds a list of
//! rules; at each position it tries them in an order derived from
//! [`Rule::context_len`] until one is applicable.
//!
//! [`Lookup`]: crate::font::Lookup

use crate::font::LookupIndex;
use crate::InvalidFontData;
use smallvec::SmallVec;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod context;
mod gpos;
mod gsub;

pub use context::{is_prefix_of, is_suffix_of, MatchContext};
pub use gpos::{Adjustment, Anchor, BaseRecord, GlyphDelta, MarkRecord, PosRule};
pub use gsub::{ChainRef, SubstRule};
pub(crate) use gpos::PosAction;
pub(crate) use gsub::{Rewrite, SubstAction};

/// Behaviour common to all rule kinds
pub trait Rule {
    /// Length of the context matched by this rule
    ///
    /// This orders rules within a lookup: more specific rules (longer
    /// contexts) take precedence for substitution.
    fn context_len(&self) -> usize;

    /// Lookups this rule may invoke
    fn chained_lookups(&self) -> SmallVec<[LookupIndex; 2]> {
        SmallVec::new()
    }

    /// Check the rule's internal consistency
    fn validate(&self) -> Result<(), InvalidFontData> {
        Ok(())
    }
}

/// Something which may match a single glyph
pub trait GlyphMatch {
    /// True if `glyph` matches
    fn matches(&self, glyph: &str) -> bool;
}

impl<T: GlyphMatch + ?Sized> GlyphMatch for &T {
    #[inline]
    fn matches(&self, glyph: &str) -> bool {
        (**self).matches(glyph)
    }
}

impl GlyphMatch for String {
    #[inline]
    fn matches(&self, glyph: &str) -> bool {
        self == glyph
    }
}

/// One element of a context pattern
///
/// This is either a single required glyph or a set of alternatives (a
/// coverage table).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(untagged))]
pub enum GlyphPattern {
    Glyph(String),
    AnyOf(Vec<String>),
}

impl GlyphMatch for GlyphPattern {
    fn matches(&self, glyph: &str) -> bool {
        match self {
            GlyphPattern::Glyph(g) => g == glyph,
            GlyphPattern::AnyOf(set) => set.iter().any(|g| g == glyph),
        }
    }
}

impl From<&str> for GlyphPattern {
    fn from(glyph: &str) -> Self {
        GlyphPattern::Glyph(glyph.to_string())
    }
}

impl From<String> for GlyphPattern {
    fn from(glyph: String) -> Self {
        GlyphPattern::Glyph(glyph)
    }
}

impl<const N: usize> From<[&str; N]> for GlyphPattern {
    fn from(set: [&str; N]) -> Self {
        GlyphPattern::AnyOf(set.iter().map(|g| g.to_string()).collect())
    }
}

impl From<Vec<String>> for GlyphPattern {
    fn from(set: Vec<String>) -> Self {
        GlyphPattern::AnyOf(set)
    }
}

impl fmt::Display for GlyphPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlyphPattern::Glyph(g) => f.write_str(g),
            GlyphPattern::AnyOf(set) => f.write_str(&set.join("/")),
        }
    }
}

/// Format a pattern as space-separated elements
pub(crate) struct Patterns<'a>(pub &'a [GlyphPattern]);

impl<'a> fmt::Display for Patterns<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{p}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_equivalence() {
        let one = GlyphPattern::from("a");
        let set = GlyphPattern::from(["a", "b"]);
        assert!(one.matches("a"));
        assert!(!one.matches("b"));
        assert!(set.matches("b"));
        assert!(!set.matches("c"));
        assert_eq!(set.to_string(), "a/b");
        assert_eq!(Patterns(&[one, set]).to_string(), "a a/b");
    }
}
