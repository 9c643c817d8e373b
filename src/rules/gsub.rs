// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Substitution rules

use super::{is_prefix_of, GlyphMatch, GlyphPattern, MatchContext, Patterns, Rule};
use crate::conv::to_u32;
use crate::font::LookupIndex;
use crate::{InvalidFontData, ShapeError};
use smallvec::{smallvec, SmallVec};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A chain lookup record: invoke `lookup` at input slot `sequence_index`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChainRef {
    pub sequence_index: u16,
    pub lookup: LookupIndex,
}

impl ChainRef {
    /// Construct
    pub fn new(sequence_index: u16, lookup: u16) -> Self {
        ChainRef {
            sequence_index,
            lookup: LookupIndex(lookup),
        }
    }
}

/// A substitution rule
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SubstRule {
    /// Replace one glyph with another
    Single { input: String, output: String },
    /// Replace one glyph with a sequence
    Multiple { input: String, outputs: Vec<String> },
    /// Replace a (filtered) sequence with one glyph
    Ligature { inputs: Vec<String>, output: String },
    /// Invoke other lookups within a matched context
    ///
    /// The first `input` element must match at the current position;
    /// `backtrack`, the remaining `input` and `lookahead` are matched against
    /// filtered context.
    ChainContext {
        backtrack: Vec<GlyphPattern>,
        input: Vec<GlyphPattern>,
        lookahead: Vec<GlyphPattern>,
        refs: Vec<ChainRef>,
    },
    /// Reverse chaining single substitution
    ///
    /// This kind is not supported: attempting to match it is an error.
    ReverseChainSingle {
        backtrack: Vec<GlyphPattern>,
        coverage: GlyphPattern,
        lookahead: Vec<GlyphPattern>,
        substitutes: Vec<String>,
    },
}

/// A direct rewrite of the glyph sequence
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Rewrite {
    pub tokens: Vec<String>,
    /// Cursor advance after the rewrite
    pub jump: usize,
    pub positions: SmallVec<[u32; 4]>,
}

/// The outcome of applying a [`SubstRule`]
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum SubstAction {
    Rewrite(Rewrite),
    /// Invoke lookups at resolved positions, in order
    Chain {
        positions: SmallVec<[u32; 4]>,
        calls: SmallVec<[(usize, LookupIndex); 2]>,
    },
}

impl SubstRule {
    /// Construct a single substitution
    pub fn single(input: &str, output: &str) -> Self {
        SubstRule::Single {
            input: input.to_string(),
            output: output.to_string(),
        }
    }

    /// Construct a multiple substitution
    pub fn multiple<const N: usize>(input: &str, outputs: [&str; N]) -> Self {
        SubstRule::Multiple {
            input: input.to_string(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Construct a ligature substitution
    pub fn ligature<const N: usize>(inputs: [&str; N], output: &str) -> Self {
        SubstRule::Ligature {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            output: output.to_string(),
        }
    }

    /// True if this rule applies at `pos`
    pub fn applicable(
        &self,
        tokens: &[String],
        pos: usize,
        ctx: &MatchContext,
    ) -> Result<bool, ShapeError> {
        if let SubstRule::ReverseChainSingle { .. } = self {
            return Err(ctx.unsupported("reverse chaining single substitution"));
        }
        let Some(glyph) = tokens.get(pos) else {
            return Ok(false);
        };

        Ok(match self {
            SubstRule::Single { input, .. } | SubstRule::Multiple { input, .. } => input == glyph,
            SubstRule::Ligature { inputs, .. } => {
                inputs.first().is_some_and(|first| first == glyph)
                    && is_prefix_of(&inputs[1..], ctx.following(tokens, pos).map(|(_, t)| t))
            }
            SubstRule::ChainContext {
                backtrack,
                input,
                lookahead,
                ..
            } => {
                input.first().is_some_and(|first| first.matches(glyph))
                    && ctx.matches_around(tokens, pos, backtrack, input[1..].iter().chain(lookahead))
            }
            SubstRule::ReverseChainSingle { .. } => false,
        })
    }

    /// Apply at `pos`
    ///
    /// Requires that [`Self::applicable`] is true.
    pub(crate) fn apply(
        &self,
        tokens: &[String],
        pos: usize,
        ctx: &MatchContext,
    ) -> Result<SubstAction, ShapeError> {
        Ok(match self {
            SubstRule::Single { output, .. } => {
                let mut tokens = tokens.to_vec();
                tokens[pos] = output.clone();
                SubstAction::Rewrite(Rewrite {
                    tokens,
                    jump: 1,
                    positions: smallvec![to_u32(pos)],
                })
            }
            SubstRule::Multiple { outputs, .. } => {
                let mut tokens = tokens.to_vec();
                tokens.splice(pos..=pos, outputs.iter().cloned());
                SubstAction::Rewrite(Rewrite {
                    tokens,
                    jump: outputs.len(),
                    positions: smallvec![to_u32(pos)],
                })
            }
            SubstRule::Ligature { inputs, output } => {
                let matched = ctx.input_positions(tokens, pos, inputs.len());
                let mut tokens = tokens.to_vec();
                for i in matched.iter().rev() {
                    tokens.remove(*i);
                }
                tokens.insert(pos, output.clone());
                SubstAction::Rewrite(Rewrite {
                    tokens,
                    jump: 1,
                    positions: matched.into_iter().map(to_u32).collect(),
                })
            }
            SubstRule::ChainContext { input, refs, .. } => {
                if refs.is_empty() {
                    return Ok(SubstAction::Chain {
                        positions: smallvec![to_u32(pos)],
                        calls: SmallVec::new(),
                    });
                }

                let slots = ctx.input_positions(tokens, pos, input.len());
                let calls = refs
                    .iter()
                    .map(|r| {
                        slots
                            .get(usize::from(r.sequence_index))
                            .map(|p| (*p, r.lookup))
                            .ok_or(InvalidFontData::SequenceIndex {
                                index: r.sequence_index,
                                len: input.len(),
                            })
                    })
                    .collect::<Result<_, _>>()?;
                SubstAction::Chain {
                    positions: slots.into_iter().map(to_u32).collect(),
                    calls,
                }
            }
            SubstRule::ReverseChainSingle { .. } => {
                return Err(ctx.unsupported("reverse chaining single substitution"));
            }
        })
    }
}

impl Rule for SubstRule {
    fn context_len(&self) -> usize {
        match self {
            SubstRule::Single { .. } | SubstRule::Multiple { .. } => 1,
            SubstRule::Ligature { inputs, .. } => inputs.len(),
            SubstRule::ChainContext {
                backtrack,
                input,
                lookahead,
                ..
            } => backtrack.len() + input.len() + lookahead.len(),
            SubstRule::ReverseChainSingle {
                backtrack,
                lookahead,
                ..
            } => backtrack.len() + 1 + lookahead.len(),
        }
    }

    fn chained_lookups(&self) -> SmallVec<[LookupIndex; 2]> {
        match self {
            SubstRule::ChainContext { refs, .. } => refs.iter().map(|r| r.lookup).collect(),
            _ => SmallVec::new(),
        }
    }

    fn validate(&self) -> Result<(), InvalidFontData> {
        if let SubstRule::ChainContext { input, refs, .. } = self {
            for r in refs {
                if usize::from(r.sequence_index) >= input.len() {
                    return Err(InvalidFontData::SequenceIndex {
                        index: r.sequence_index,
                        len: input.len(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for SubstRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubstRule::Single { input, output } => write!(f, "{input} -> {output}"),
            SubstRule::Multiple { input, outputs } => {
                write!(f, "{input} -> {}", outputs.join(" "))
            }
            SubstRule::Ligature { inputs, output } => {
                write!(f, "{} -> {output}", inputs.join(" "))
            }
            SubstRule::ChainContext {
                backtrack,
                input,
                lookahead,
                refs,
            } => {
                write!(
                    f,
                    "{}|{}|{} --->",
                    Patterns(backtrack),
                    Patterns(input),
                    Patterns(lookahead)
                )?;
                for r in refs {
                    write!(f, " {}->{}", r.sequence_index, r.lookup)?;
                }
                Ok(())
            }
            SubstRule::ReverseChainSingle {
                backtrack,
                coverage,
                lookahead,
                substitutes,
            } => write!(
                f,
                "{}|{coverage}|{} -> {}",
                Patterns(backtrack),
                Patterns(lookahead),
                substitutes.join(" ")
            ),
        }
    }
}
