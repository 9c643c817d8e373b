// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! OpenType layout simulator
//!
//! This library applies the substitution (GSUB) and positioning (GPOS) rules
//! of an in-memory [`Font`] model to a sequence of glyph names, recording
//! each rule firing. It is intended for inspecting and testing layout tables
//! rather than for rendering.
//!
//! ```
//! use ttx_shaper::font::{Feature, Lookup, LookupFlags};
//! use ttx_shaper::rules::SubstRule;
//! use ttx_shaper::{shape, Font, ShapeOptions};
//!
//! let mut font = Font::new();
//! font.add_gsub_lookup(
//!     Lookup::new(0, LookupFlags::empty()).with_rule(SubstRule::ligature(["f", "i"], "fi")),
//! );
//! font.add_gsub_feature(Feature::new("liga", [0]));
//!
//! let shaped = shape(&font, &["f", "i"], &ShapeOptions::new()).unwrap();
//! assert_eq!(shaped.tokens, ["fi"]);
//! assert_eq!(shaped.trace[0].path.to_string(), "0");
//! ```

pub mod conv;

mod error;
pub use error::*;

mod options;
pub use options::ShapeOptions;

pub mod font;
pub use font::Font;

pub mod rules;
pub use rules::{GlyphDelta, PosRule, SubstRule};

mod shaper;
pub use shaper::{shape, Application, AppliedRule, LookupPath, Shaped};

mod place;
pub use place::{place, Point};

mod simulator;
pub use simulator::Simulator;

pub use ttf_parser::Tag;
