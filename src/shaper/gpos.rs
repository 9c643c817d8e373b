// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Positioning pass

use super::{check_depth, missing, Application, AppliedRule, LookupPath};
use crate::conv::to_u32;
use crate::font::{Font, Lookup};
use crate::rules::{GlyphDelta, MatchContext, PosAction, PosRule};
use crate::{ShapeError, ShapeOptions};
use smallvec::smallvec;
use ttf_parser::Tag;

pub(super) struct PosPass<'f, 'o> {
    pub font: &'f Font,
    pub options: &'o ShapeOptions,
    pub feature: Tag,
}

impl<'f, 'o> PosPass<'f, 'o> {
    /// Run `lookup` at every position
    pub fn run(
        &self,
        lookup: &'f Lookup<PosRule>,
        tokens: &[String],
        deltas: &mut [GlyphDelta],
        trace: &mut Vec<Application<'f>>,
    ) -> Result<(), ShapeError> {
        for pos in 0..tokens.len() {
            if let Some(application) = self.apply_at(lookup, tokens, deltas, pos, 0)? {
                trace.push(application);
            }
        }
        Ok(())
    }

    /// Try each rule of `lookup` at `pos`, applying the first which matches
    ///
    /// Rules are tried shortest-context first.
    fn apply_at(
        &self,
        lookup: &'f Lookup<PosRule>,
        tokens: &[String],
        deltas: &mut [GlyphDelta],
        pos: usize,
        depth: u32,
    ) -> Result<Option<Application<'f>>, ShapeError> {
        let ctx = MatchContext::new(&self.font.gdef, lookup)?;
        for rule in lookup.rules_shortest_first() {
            if !rule.applicable(tokens, pos, &ctx)? {
                continue;
            }
            log::trace!("GPOS lookup {} at {pos}: {rule}", lookup.index);

            if let PosAction::Chain(index) = rule.apply(tokens, deltas, pos, &ctx)? {
                check_depth(self.options, index, depth + 1)?;
                let nested = self.font.gpos.lookups.get(index).ok_or_else(|| missing(index))?;
                if let Some(mut application) = self.apply_at(nested, tokens, deltas, pos, depth + 1)? {
                    application.path = LookupPath::prefixed(lookup.index, &application.path);
                    return Ok(Some(application));
                }
            }

            return Ok(Some(Application {
                feature: self.feature,
                path: LookupPath::new(lookup.index),
                positions: smallvec![to_u32(pos)],
                rule: AppliedRule::Pos(rule),
                tokens: tokens.to_vec(),
                deltas: Some(deltas.to_vec()),
            }));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conv::tag;
    use crate::font::{GlyphClass, LookupFlags, LookupIndex};
    use crate::rules::{Adjustment, BaseRecord, MarkRecord};

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    fn font() -> Font {
        let mut font = Font::new();
        font.add_glyph("B", 600);
        font.add_glyph("M", 0);
        font.set_glyph_class("B", GlyphClass::Base);
        font.set_glyph_class("M", GlyphClass::Mark);
        font.add_gpos_lookup(Lookup::new(0, LookupFlags::empty()).with_rule(
            PosRule::MarkToBase {
                marks: vec![MarkRecord::new("M", 0, 10, 10)],
                bases: vec![BaseRecord::new("B", [(0, 100, 200)])],
            },
        ));
        font.add_gpos_lookup(Lookup::new(1, LookupFlags::empty()).with_rule(
            PosRule::ChainContext {
                backtrack: vec!["B".into()],
                input: "M".into(),
                lookahead: vec![],
                lookup: LookupIndex(0),
            },
        ));
        font
    }

    #[test]
    fn chain_prefixes_path() {
        let font = font();
        let options = ShapeOptions::new();
        let pass = PosPass {
            font: &font,
            options: &options,
            feature: tag("mark"),
        };
        let t = tokens("B M");
        let mut deltas = vec![GlyphDelta::default(); 2];
        let mut trace = vec![];
        let lookup = font.gpos.lookups.get(LookupIndex(1)).unwrap();
        pass.run(lookup, &t, &mut deltas, &mut trace).unwrap();

        assert_eq!(trace.len(), 1);
        assert_eq!(trace[0].path.to_string(), "1/0");
        assert_eq!(trace[0].positions.as_slice(), [1]);
        assert_eq!(deltas[1].x_coordinate, Some(90));
        assert_eq!(trace[0].deltas.as_deref(), Some(deltas.as_slice()));
    }

    #[test]
    fn chain_without_nested_match() {
        let mut font = font();
        font.add_gpos_lookup(Lookup::new(2, LookupFlags::empty()).with_rule(
            PosRule::ChainContext {
                backtrack: vec![],
                input: "B".into(),
                lookahead: vec![],
                lookup: LookupIndex(0),
            },
        ));
        let options = ShapeOptions::new();
        let pass = PosPass {
            font: &font,
            options: &options,
            feature: tag("mark"),
        };
        let t = tokens("B");
        let mut deltas = vec![GlyphDelta::default()];
        let mut trace = vec![];
        let lookup = font.gpos.lookups.get(LookupIndex(2)).unwrap();
        pass.run(lookup, &t, &mut deltas, &mut trace).unwrap();

        assert_eq!(trace.len(), 1);
        assert_eq!(trace[0].path.to_string(), "2");
        assert!(deltas[0].is_empty());
    }

    #[test]
    fn shortest_rule_first() {
        let mut font = font();
        font.add_gpos_lookup(
            Lookup::new(2, LookupFlags::empty())
                .with_rule(PosRule::ChainContext {
                    backtrack: vec!["B".into()],
                    input: "M".into(),
                    lookahead: vec![],
                    lookup: LookupIndex(0),
                })
                .with_rule(PosRule::Single {
                    adjustments: vec![Adjustment {
                        glyph: "M".into(),
                        x_placement: None,
                        y_placement: Some(-5),
                    }],
                }),
        );
        let options = ShapeOptions::new();
        let pass = PosPass {
            font: &font,
            options: &options,
            feature: tag("mark"),
        };
        let t = tokens("B M");
        let mut deltas = vec![GlyphDelta::default(); 2];
        let mut trace = vec![];
        let lookup = font.gpos.lookups.get(LookupIndex(2)).unwrap();
        pass.run(lookup, &t, &mut deltas, &mut trace).unwrap();

        assert_eq!(trace.len(), 1);
        assert_eq!(deltas[1].y_placement, Some(-5));
        assert_eq!(deltas[1].x_coordinate, None);
    }
}
