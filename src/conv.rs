// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Type conversion utilities
//!
//! Glyph positions recorded in the trace are represented as `u32` instead of
//! `usize` in order to save space (glyph sequences are never expected to come
//! anywhere close to `u32::MAX` entries).

use easy_cast::Cast;
use ttf_parser::Tag;

/// Convert `usize` → `u32`
///
/// This is a "safer" wrapper around `as` ensuring (on debug builds) that the
/// input value may be represented correctly by `u32`.
#[inline]
pub fn to_u32(x: usize) -> u32 {
    x.cast()
}

/// Convert `u32` → `usize`
///
/// This is a "safer" wrapper around `as` ensuring that the operation is
/// zero-extension.
#[inline]
pub fn to_usize(x: u32) -> usize {
    x.cast()
}

/// Convert a textual feature or script tag (e.g. `"liga"`) to a [`Tag`]
///
/// Short input is padded with spaces; excess input is ignored.
#[inline]
pub fn tag(s: &str) -> Tag {
    Tag::from_bytes_lossy(s.as_bytes())
}

/// Render a [`Tag`] as text
pub fn tag_str(tag: Tag) -> String {
    String::from_utf8_lossy(&tag.to_bytes()).into_owned()
}

// Tags are stored as their four-character text form.
#[cfg(feature = "serde")]
pub(crate) mod serde_tag {
    use serde::{Deserialize, Deserializer, Serializer};
    use ttf_parser::Tag;

    pub fn serialize<S: Serializer>(tag: &Tag, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::tag_str(*tag))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Tag, D::Error> {
        let s = String::deserialize(d)?;
        Ok(super::tag(&s))
    }
}
