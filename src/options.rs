// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Shaping configuration

use crate::conv::tag;
use std::collections::HashSet;
use ttf_parser::Tag;

/// Options controlling a shaping run
///
/// `ShapeOptions` can be default-constructed (no suppressed features).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapeOptions {
    /// Suppressed features
    ///
    /// A lookup listed only by suppressed features never runs. Lookups listed
    /// by at least one other feature still run.
    pub suppressed: HashSet<Tag>,
    /// Maximum nesting depth of chained lookups
    ///
    /// Chaining rules invoke other lookups by index. Nothing prevents a font
    /// from forming a cycle this way; such a chain fails with
    /// [`ShapeError::ChainTooDeep`](crate::ShapeError::ChainTooDeep) once it
    /// exceeds this depth.
    pub max_chain_depth: u32,
}

impl Default for ShapeOptions {
    fn default() -> Self {
        ShapeOptions {
            suppressed: HashSet::new(),
            max_chain_depth: 64,
        }
    }
}

impl ShapeOptions {
    /// Alternative default constructor
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress a feature by its textual tag (e.g. `"ss01"`)
    #[must_use]
    pub fn suppress(self, feature: &str) -> Self {
        self.suppress_tag(tag(feature))
    }

    /// Suppress a feature
    #[must_use]
    pub fn suppress_tag(mut self, feature: Tag) -> Self {
        self.suppressed.insert(feature);
        self
    }

    /// True if `feature` is suppressed
    #[inline]
    pub fn is_suppressed(&self, feature: Tag) -> bool {
        self.suppressed.contains(&feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suppress() {
        let options = ShapeOptions::new().suppress("ss01").suppress("rtlm");
        assert!(options.is_suppressed(tag("ss01")));
        assert!(options.is_suppressed(Tag::from_bytes(b"rtlm")));
        assert!(!options.is_suppressed(tag("liga")));
        assert_eq!(options.max_chain_depth, 64);
    }
}
