// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Substitution pass

use super::{check_depth, missing, Application, AppliedRule, LookupPath};
use crate::font::{Font, Lookup};
use crate::rules::{MatchContext, Rewrite, SubstAction, SubstRule};
use crate::{ShapeError, ShapeOptions};
use easy_cast::Cast;
use ttf_parser::Tag;

/// A matched rule and the cursor advance which follows it
struct Fired<'f> {
    application: Application<'f>,
    /// May be zero or negative after a chain shortens the sequence
    jump: isize,
}

pub(super) struct SubstPass<'f, 'o> {
    pub font: &'f Font,
    pub options: &'o ShapeOptions,
    pub feature: Tag,
}

impl<'f, 'o> SubstPass<'f, 'o> {
    /// Run `lookup` over the whole sequence, left to right
    pub fn run(
        &self,
        lookup: &'f Lookup<SubstRule>,
        mut tokens: Vec<String>,
        trace: &mut Vec<Application<'f>>,
    ) -> Result<Vec<String>, ShapeError> {
        let mut pos = 0;
        while pos < tokens.len() {
            match self.apply_at(lookup, &tokens, pos, 0)? {
                Some(fired) => {
                    tokens.clone_from(&fired.application.tokens);
                    trace.push(fired.application);
                    pos = pos.saturating_add_signed(fired.jump);
                }
                None => pos += 1,
            }
        }
        Ok(tokens)
    }

    /// Try each rule of `lookup` at `pos`, applying the first which matches
    ///
    /// Rules are tried longest-context first.
    fn apply_at(
        &self,
        lookup: &'f Lookup<SubstRule>,
        tokens: &[String],
        pos: usize,
        depth: u32,
    ) -> Result<Option<Fired<'f>>, ShapeError> {
        let ctx = MatchContext::new(&self.font.gdef, lookup)?;
        for rule in lookup.rules_longest_first() {
            if !rule.applicable(tokens, pos, &ctx)? {
                continue;
            }
            log::trace!("GSUB lookup {} at {pos}: {rule}", lookup.index);

            let fired = match rule.apply(tokens, pos, &ctx)? {
                SubstAction::Rewrite(Rewrite {
                    tokens,
                    jump,
                    positions,
                }) => Fired {
                    application: self.record(LookupPath::new(lookup.index), positions, rule, tokens),
                    jump: jump.cast(),
                },
                SubstAction::Chain { positions, calls } => {
                    let mut path = LookupPath::new(lookup.index);
                    let mut current = tokens.to_vec();
                    for (at, index) in calls {
                        check_depth(self.options, index, depth + 1)?;
                        let nested = self.font.gsub.lookups.get(index).ok_or_else(|| missing(index))?;
                        if let Some(fired) = self.apply_at(nested, &current, at, depth + 1)? {
                            path.extend(&fired.application.path);
                            current = fired.application.tokens;
                        }
                    }
                    let pre: isize = tokens.len().cast();
                    let post: isize = current.len().cast();
                    Fired {
                        application: self.record(path, positions, rule, current),
                        jump: post - pre + 1,
                    }
                }
            };
            return Ok(Some(fired));
        }
        Ok(None)
    }

    fn record(
        &self,
        path: LookupPath,
        positions: smallvec::SmallVec<[u32; 4]>,
        rule: &'f SubstRule,
        tokens: Vec<String>,
    ) -> Application<'f> {
        Application {
            feature: self.feature,
            path,
            positions,
            rule: AppliedRule::Subst(rule),
            tokens,
            deltas: None,
        }
    }
}
