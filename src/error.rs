// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Error types

use crate::font::LookupIndex;
use thiserror::Error;

/// Font data is inconsistent
///
/// The font model refers to something it does not contain. This is reported
/// instead of substituting a default since a silently-wrong result looks
/// plausible (e.g. bad table data would appear as bad spacing).
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum InvalidFontData {
    /// A chaining rule references a lookup absent from the lookup list
    #[error("reference to missing lookup {0}")]
    MissingLookup(LookupIndex),
    /// Two lookups of one table share an index
    #[error("duplicate lookup index {0}")]
    DuplicateLookup(LookupIndex),
    /// Lookup flags select a mark filtering set which does not exist
    #[error("reference to missing mark filtering set {0}")]
    MissingFilterSet(u16),
    /// An attachment target has no anchor for the attaching mark's class
    #[error("glyph '{glyph}' has no anchor for mark class {class}")]
    MissingAnchor { glyph: String, class: u16 },
    /// A chain lookup record targets an input slot past the input sequence
    #[error("sequence index {index} exceeds input length {len}")]
    SequenceIndex { index: u16, len: usize },
    /// Glyph has no advance width
    #[error("glyph '{0}' has no advance width")]
    MissingAdvance(String),
    /// Character is not mapped to any glyph
    #[error("no glyph mapped for char {0:?}")]
    UnmappedChar(char),
}

/// Shaping failed
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ShapeError {
    /// The lookup contains a rule type this engine cannot apply
    #[error("lookup {lookup}: unsupported rule type: {rule}")]
    Unsupported {
        lookup: LookupIndex,
        rule: &'static str,
    },
    /// Font data references something missing
    #[error("invalid font data")]
    InvalidFont(#[from] InvalidFontData),
    /// Chained lookups nest deeper than the configured bound
    ///
    /// This usually implies a cycle among chaining rules.
    #[error("lookup {lookup}: chain exceeds depth {depth}")]
    ChainTooDeep { lookup: LookupIndex, depth: u32 },
}
