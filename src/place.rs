// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Placement of shaped glyphs

use crate::font::Font;
use crate::rules::GlyphDelta;
use crate::InvalidFontData;
use std::fmt;

/// A glyph placement, in font units
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point(pub i32, pub i32);

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

/// Compute placements from position deltas
///
/// The first glyph sits at the origin. Each following glyph is placed at the
/// running sum of attachment offsets (`x_coordinate`, `y_coordinate`), less
/// the advance width of the first glyph. This shows attachment chains
/// relative to the first glyph; it is not a left-to-right pen advance.
///
/// Only the first glyph's advance width is required.
pub fn place(
    font: &Font,
    tokens: &[String],
    deltas: &[GlyphDelta],
) -> Result<Vec<Point>, InvalidFontData> {
    let Some(first) = tokens.first() else {
        return Ok(vec![]);
    };
    let x_ref = font.advance(first)?;

    let mut places = Vec::with_capacity(tokens.len());
    places.push(Point::default());
    let (mut x, mut y) = (0i32, 0i32);
    for delta in deltas.iter().take(tokens.len()).skip(1) {
        x = x.saturating_add(delta.x_coordinate.unwrap_or(0));
        y = y.saturating_add(delta.y_coordinate.unwrap_or(0));
        places.push(Point(x.saturating_sub(x_ref), y));
    }
    Ok(places)
}
