// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

// End-to-end shaping behaviour

use ttx_shaper::conv::tag;
use ttx_shaper::font::{Feature, GlyphClass, Lookup, LookupFlags, LookupIndex};
use ttx_shaper::rules::{BaseRecord, ChainRef, GlyphPattern, MarkRecord};
use ttx_shaper::{
    place, shape, Font, GlyphDelta, InvalidFontData, Point, PosRule, ShapeError, ShapeOptions,
    SubstRule,
};

fn tokens(s: &str) -> Vec<String> {
    s.split_whitespace().map(String::from).collect()
}

fn base_font() -> Font {
    let mut font = Font::new();
    for g in ["a", "b", "c", "f", "i", "fi", "ffi", "x", "y", "B"] {
        font.add_glyph(g, 500);
        font.set_glyph_class(g, GlyphClass::Base);
    }
    font.set_glyph_class("fi", GlyphClass::Ligature);
    font.add_glyph("B", 600);
    for g in ["M", "dot"] {
        font.add_glyph(g, 0);
        font.set_glyph_class(g, GlyphClass::Mark);
    }
    font
}

#[test]
fn no_applicable_rule() {
    let mut font = base_font();
    font.add_gsub_lookup(
        Lookup::new(0, LookupFlags::empty()).with_rule(SubstRule::single("x", "y")),
    );
    font.add_gsub_feature(Feature::new("ccmp", [0]));

    let input = tokens("a b c");
    let shaped = shape(&font, &input, &ShapeOptions::new()).unwrap();
    assert_eq!(shaped.tokens, input);
    assert!(shaped.trace.is_empty());
    assert_eq!(shaped.deltas, vec![GlyphDelta::default(); 3]);
}

#[test]
fn single_substitution() {
    let mut font = base_font();
    font.add_gsub_lookup(
        Lookup::new(0, LookupFlags::empty()).with_rule(SubstRule::single("a", "b")),
    );
    font.add_gsub_feature(Feature::new("ccmp", [0]));

    let shaped = shape(&font, &["a"], &ShapeOptions::new()).unwrap();
    assert_eq!(shaped.tokens, ["b"]);
    assert_eq!(shaped.trace.len(), 1);
    let a = &shaped.trace[0];
    assert_eq!(a.feature, tag("ccmp"));
    assert_eq!(a.path.indices(), [LookupIndex(0)]);
    assert_eq!(a.positions.as_slice(), [0]);
    assert_eq!(a.rule.to_string(), "a -> b");
    assert!(a.deltas.is_none());
}

#[test]
fn ligature() {
    let mut font = base_font();
    font.add_gsub_lookup(
        Lookup::new(0, LookupFlags::empty()).with_rule(SubstRule::ligature(["f", "i"], "fi")),
    );
    font.add_gsub_feature(Feature::new("liga", [0]));

    let shaped = shape(&font, &["f", "i"], &ShapeOptions::new()).unwrap();
    assert_eq!(shaped.tokens, ["fi"]);
    assert_eq!(shaped.trace[0].positions.as_slice(), [0, 1]);
    assert_eq!(shaped.deltas.len(), 1);
}

#[test]
fn multiple_substitution() {
    let mut font = base_font();
    font.add_gsub_lookup(
        Lookup::new(0, LookupFlags::empty())
            .with_rule(SubstRule::multiple("ffi", ["f", "f", "i"])),
    );
    font.add_gsub_feature(Feature::new("ccmp", [0]));

    let shaped = shape(&font, &["ffi"], &ShapeOptions::new()).unwrap();
    assert_eq!(shaped.tokens, ["f", "f", "i"]);
    assert_eq!(shaped.deltas.len(), 3);
}

fn chain_font() -> Font {
    let mut font = base_font();
    font.add_gsub_lookup(Lookup::new(3, LookupFlags::empty()).with_rule(
        SubstRule::ChainContext {
            backtrack: vec!["a".into()],
            input: vec!["b".into()],
            lookahead: vec!["c".into()],
            refs: vec![ChainRef::new(0, 5)],
        },
    ));
    font.add_gsub_lookup(
        Lookup::new(5, LookupFlags::empty()).with_rule(SubstRule::single("b", "x")),
    );
    font.add_gsub_feature(Feature::new("calt", [3]));
    font
}

#[test]
fn chained_context() {
    let font = chain_font();
    let options = ShapeOptions::new();

    let shaped = shape(&font, &tokens("a b c"), &options).unwrap();
    assert_eq!(shaped.tokens, ["a", "x", "c"]);
    assert_eq!(shaped.trace.len(), 1);
    assert_eq!(shaped.trace[0].path.to_string(), "3/5");
    assert_eq!(shaped.trace[0].positions.as_slice(), [1]);
    assert_eq!(shaped.trace[0].rule.to_string(), "a|b|c ---> 0->5");

    // Lookup 5 is not listed by any feature: it runs only via the chain
    for input in ["b c", "a b", "c b a", "a b b"] {
        let shaped = shape(&font, &tokens(input), &options).unwrap();
        assert_eq!(shaped.tokens, tokens(input), "input: {input}");
        assert!(shaped.trace.is_empty());
    }
}

#[test]
fn filtered_backtrack() {
    let mut font = base_font();
    font.add_gsub_lookup(Lookup::new(0, LookupFlags::IGNORE_MARKS).with_rule(
        SubstRule::ChainContext {
            backtrack: vec!["B".into()],
            input: vec!["a".into()],
            lookahead: vec![],
            refs: vec![ChainRef::new(0, 1)],
        },
    ));
    font.add_gsub_lookup(
        Lookup::new(1, LookupFlags::empty()).with_rule(SubstRule::single("a", "y")),
    );
    font.add_gsub_feature(Feature::new("calt", [0]));

    let shaped = shape(&font, &tokens("B M a"), &ShapeOptions::new()).unwrap();
    assert_eq!(shaped.tokens, ["B", "M", "y"]);

    // Without the flag the mark blocks the backtrack
    font.gsub = Default::default();
    font.add_gsub_lookup(Lookup::new(0, LookupFlags::empty()).with_rule(
        SubstRule::ChainContext {
            backtrack: vec!["B".into()],
            input: vec!["a".into()],
            lookahead: vec![],
            refs: vec![ChainRef::new(0, 1)],
        },
    ));
    font.add_gsub_lookup(
        Lookup::new(1, LookupFlags::empty()).with_rule(SubstRule::single("a", "y")),
    );
    font.add_gsub_feature(Feature::new("calt", [0]));
    let shaped = shape(&font, &tokens("B M a"), &ShapeOptions::new()).unwrap();
    assert_eq!(shaped.tokens, ["B", "M", "a"]);
}

#[test]
fn mark_to_base() {
    let mut font = base_font();
    font.add_gpos_lookup(Lookup::new(0, LookupFlags::empty()).with_rule(
        PosRule::MarkToBase {
            marks: vec![MarkRecord::new("M", 0, 10, 10)],
            bases: vec![BaseRecord::new("B", [(0, 100, 200)])],
        },
    ));
    font.add_gpos_feature(Feature::new("mark", [0]));

    let shaped = shape(&font, &["B", "M"], &ShapeOptions::new()).unwrap();
    assert_eq!(shaped.deltas[0], GlyphDelta::default());
    assert_eq!(shaped.deltas[1].x_coordinate, Some(90));
    assert_eq!(shaped.deltas[1].y_coordinate, Some(190));
    assert_eq!(shaped.trace.len(), 1);
    assert_eq!(shaped.trace[0].feature, tag("mark"));

    let places = place(&font, &shaped.tokens, &shaped.deltas).unwrap();
    assert_eq!(places, [Point(0, 0), Point(90 - 600, 190)]);
}

#[test]
fn suppressed_features() {
    let mut font = base_font();
    font.add_gsub_lookup(
        Lookup::new(0, LookupFlags::empty()).with_rule(SubstRule::ligature(["f", "i"], "fi")),
    );
    font.add_gsub_lookup(
        Lookup::new(1, LookupFlags::empty()).with_rule(SubstRule::single("a", "b")),
    );
    font.add_gsub_lookup(
        Lookup::new(2, LookupFlags::empty()).with_rule(SubstRule::single("b", "c")),
    );
    font.add_gsub_feature(Feature::new("liga", [0]));
    font.add_gsub_feature(Feature::new("ss01", [1, 2]));

    let input = tokens("f i a");
    let all = shape(&font, &input, &ShapeOptions::new()).unwrap();
    assert_eq!(all.tokens, ["fi", "c"]);
    let paths: Vec<String> = all.trace.iter().map(|a| a.path.to_string()).collect();
    assert_eq!(paths, ["0", "1", "2"]);

    let options = ShapeOptions::new().suppress("liga");
    let shaped = shape(&font, &input, &options).unwrap();
    assert_eq!(shaped.tokens, ["f", "i", "c"]);
    assert!(shaped.trace.iter().all(|a| a.feature == tag("ss01")));
    assert_eq!(shaped.trace.len(), 2);

    let options = ShapeOptions::new().suppress("liga").suppress("ss01");
    let shaped = shape(&font, &input, &options).unwrap();
    assert_eq!(shaped.tokens, input);
    assert!(shaped.trace.is_empty());
}

#[test]
fn shared_lookup_owner() {
    let mut font = base_font();
    font.add_gsub_lookup(
        Lookup::new(0, LookupFlags::empty()).with_rule(SubstRule::single("a", "b")),
    );
    font.add_gsub_feature(Feature::new("ccmp", [0]));
    font.add_gsub_feature(Feature::new("locl", [0]));

    let shaped = shape(&font, &["a"], &ShapeOptions::new()).unwrap();
    assert_eq!(shaped.trace[0].feature, tag("locl"));

    let options = ShapeOptions::new().suppress("locl");
    let shaped = shape(&font, &["a"], &options).unwrap();
    assert_eq!(shaped.tokens, ["b"]);
    assert_eq!(shaped.trace[0].feature, tag("ccmp"));
}

#[test]
fn reverse_chain_is_an_error() {
    let mut font = base_font();
    font.add_gsub_lookup(Lookup::new(4, LookupFlags::empty()).with_rule(
        SubstRule::ReverseChainSingle {
            backtrack: vec![],
            coverage: GlyphPattern::from("a"),
            lookahead: vec![],
            substitutes: vec!["b".into()],
        },
    ));
    font.add_gsub_feature(Feature::new("rclt", [4]));

    let result = shape(&font, &["a"], &ShapeOptions::new());
    assert!(matches!(
        result,
        Err(ShapeError::Unsupported {
            lookup: LookupIndex(4),
            ..
        })
    ));

    // A suppressed lookup is never examined
    let options = ShapeOptions::new().suppress("rclt");
    assert!(shape(&font, &["a"], &options).is_ok());
}

#[test]
fn missing_anchor_is_an_error() {
    let mut font = base_font();
    font.add_gpos_lookup(Lookup::new(0, LookupFlags::empty()).with_rule(
        PosRule::MarkToBase {
            marks: vec![MarkRecord::new("M", 2, 0, 0)],
            bases: vec![BaseRecord::new("B", [(0, 100, 200)])],
        },
    ));
    font.add_gpos_feature(Feature::new("mark", [0]));

    assert_eq!(
        shape(&font, &["B", "M"], &ShapeOptions::new()),
        Err(ShapeError::InvalidFont(InvalidFontData::MissingAnchor {
            glyph: "B".into(),
            class: 2
        }))
    );
}

#[test]
fn chaining_cycle_is_bounded() {
    let mut font = base_font();
    font.add_gsub_lookup(Lookup::new(0, LookupFlags::empty()).with_rule(
        SubstRule::ChainContext {
            backtrack: vec![],
            input: vec!["a".into()],
            lookahead: vec![],
            refs: vec![ChainRef::new(0, 1)],
        },
    ));
    font.add_gsub_lookup(Lookup::new(1, LookupFlags::empty()).with_rule(
        SubstRule::ChainContext {
            backtrack: vec![],
            input: vec!["a".into()],
            lookahead: vec![],
            refs: vec![ChainRef::new(0, 0)],
        },
    ));
    font.add_gsub_feature(Feature::new("calt", [0]));
    assert_eq!(font.validate(), Ok(()));

    let result = shape(&font, &["a"], &ShapeOptions::new());
    assert!(matches!(
        result,
        Err(ShapeError::ChainTooDeep { depth: 65, .. })
    ));
}

#[test]
fn positioning_cycle_is_bounded() {
    let mut font = base_font();
    font.add_gpos_lookup(Lookup::new(0, LookupFlags::empty()).with_rule(
        PosRule::ChainContext {
            backtrack: vec![],
            input: "M".into(),
            lookahead: vec![],
            lookup: LookupIndex(0),
        },
    ));
    font.add_gpos_feature(Feature::new("mark", [0]));
    assert_eq!(font.validate(), Ok(()));

    assert_eq!(
        shape(&font, &["M"], &ShapeOptions::new()),
        Err(ShapeError::ChainTooDeep {
            lookup: LookupIndex(0),
            depth: 65
        })
    );
}

#[test]
fn positioning_chain_to_missing_lookup() {
    let mut font = base_font();
    font.add_gpos_lookup(Lookup::new(0, LookupFlags::empty()).with_rule(
        PosRule::ChainContext {
            backtrack: vec!["B".into()],
            input: "M".into(),
            lookahead: vec![],
            lookup: LookupIndex(9),
        },
    ));
    font.add_gpos_feature(Feature::new("mark", [0]));
    assert_eq!(
        font.validate(),
        Err(InvalidFontData::MissingLookup(LookupIndex(9)))
    );

    // Not reached without a matching context
    assert!(shape(&font, &["M", "B"], &ShapeOptions::new()).is_ok());
    assert_eq!(
        shape(&font, &["B", "M"], &ShapeOptions::new()),
        Err(ShapeError::InvalidFont(InvalidFontData::MissingLookup(
            LookupIndex(9)
        )))
    );
}

#[test]
fn chain_growth_skips_inserted_glyphs() {
    let mut font = base_font();
    font.add_gsub_lookup(Lookup::new(0, LookupFlags::empty()).with_rule(
        SubstRule::ChainContext {
            backtrack: vec![],
            input: vec!["a".into()],
            lookahead: vec![],
            refs: vec![ChainRef::new(0, 1)],
        },
    ));
    font.add_gsub_lookup(
        Lookup::new(1, LookupFlags::empty()).with_rule(SubstRule::multiple("a", ["a", "x", "a"])),
    );
    font.add_gsub_feature(Feature::new("calt", [0]));

    let shaped = shape(&font, &tokens("a b a"), &ShapeOptions::new()).unwrap();
    assert_eq!(shaped.tokens, tokens("a x a b a x a"));
    let steps: Vec<(String, Vec<u32>)> = shaped
        .trace
        .iter()
        .map(|a| (a.path.to_string(), a.positions.to_vec()))
        .collect();
    assert_eq!(
        steps,
        [("0/1".to_string(), vec![0]), ("0/1".to_string(), vec![4])]
    );
}
