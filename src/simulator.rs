// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! A shaping driver with textual output

use crate::conv::tag_str;
use crate::font::Font;
use crate::{place, shape, Application, Point, ShapeError, ShapeOptions, Shaped};
use std::fmt;

/// Shape input against a font and describe the result
///
/// Each call to [`Self::set_tokens`] or [`Self::set_string`] shapes and
/// places its input, replacing the previous result.
#[derive(Clone, Debug)]
pub struct Simulator<'f> {
    font: &'f Font,
    /// Options used for each run
    pub options: ShapeOptions,
    in_tokens: Vec<String>,
    shaped: Shaped<'f>,
    places: Vec<Point>,
}

impl<'f> Simulator<'f> {
    /// Construct with default options
    pub fn new(font: &'f Font) -> Self {
        Simulator::with_options(font, ShapeOptions::default())
    }

    /// Construct with the given options
    pub fn with_options(font: &'f Font, options: ShapeOptions) -> Self {
        Simulator {
            font,
            options,
            in_tokens: vec![],
            shaped: Shaped::default(),
            places: vec![],
        }
    }

    /// Shape and place a glyph sequence
    ///
    /// On error the previous result is kept.
    pub fn set_tokens<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<(), ShapeError> {
        let shaped = shape(self.font, tokens, &self.options)?;
        let places = place(self.font, &shaped.tokens, &shaped.deltas)?;
        self.in_tokens = tokens.iter().map(|t| t.as_ref().to_string()).collect();
        self.shaped = shaped;
        self.places = places;
        Ok(())
    }

    /// Map `text` to glyphs, then shape and place those
    pub fn set_string(&mut self, text: &str) -> Result<(), ShapeError> {
        let tokens = self.font.string_to_tokens(text)?;
        self.set_tokens(&tokens)
    }

    /// The input glyph sequence
    pub fn in_tokens(&self) -> &[String] {
        &self.in_tokens
    }

    /// The shaping result
    pub fn shaped(&self) -> &Shaped<'f> {
        &self.shaped
    }

    /// Glyph placements
    pub fn places(&self) -> &[Point] {
        &self.places
    }

    /// The input glyphs, space-separated
    pub fn in_tokens_str(&self) -> String {
        self.in_tokens.join(" ")
    }

    /// One block per rule application
    pub fn steps_str(&self) -> String {
        self.shaped
            .trace
            .iter()
            .map(|a| Step(a).to_string())
            .collect()
    }

    /// Output glyphs with their placements
    pub fn shaped_str(&self) -> String {
        let mut s = String::from("Shaped\n");
        let items: Vec<String> = self
            .shaped
            .tokens
            .iter()
            .zip(&self.places)
            .map(|(t, p)| format!("{t}{p}"))
            .collect();
        s.push_str(&items.join(" "));
        s
    }
}

/// Formats an [`Application`]
///
/// A substitution shows the rule and the resulting sequence, with `>` before
/// the first affected position. A positioning shows each glyph with any
/// delta it carries.
struct Step<'a, 'f>(&'a Application<'f>);

impl<'a, 'f> fmt::Display for Step<'a, 'f> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.0;
        let positions: Vec<String> = a.positions.iter().map(u32::to_string).collect();
        writeln!(
            f,
            "feature: {}, lookup: {}, pos: {}",
            tag_str(a.feature),
            a.path,
            positions.join(",")
        )?;

        let first = a.first_position();
        match &a.deltas {
            None => {
                writeln!(f, "{}", a.rule)?;
                for (i, t) in a.tokens.iter().enumerate() {
                    if i == first {
                        f.write_str("> ")?;
                    }
                    write!(f, "{t}")?;
                    if i + 1 < a.tokens.len() {
                        f.write_str(" ")?;
                    }
                }
                if first >= a.tokens.len() {
                    f.write_str(" >")?;
                }
                writeln!(f)?;
            }
            Some(deltas) => {
                for (i, (t, d)) in a.tokens.iter().zip(deltas).enumerate() {
                    if i == first {
                        f.write_str("> ")?;
                    }
                    if d.is_empty() {
                        write!(f, "{t} ")?;
                    } else {
                        writeln!(f, "{t}({d})")?;
                    }
                }
                writeln!(f)?;
            }
        }
        writeln!(f)
    }
}
