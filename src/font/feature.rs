// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Features and rule tables

use super::{LookupIndex, LookupList};
use crate::conv::tag;
use crate::ShapeOptions;
use smallvec::SmallVec;
use std::collections::HashMap;
use ttf_parser::Tag;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A feature: a named activation unit for an ordered list of lookups
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Feature {
    /// Feature tag, e.g. `liga`
    #[cfg_attr(feature = "serde", serde(with = "crate::conv::serde_tag"))]
    pub tag: Tag,
    /// Activated lookups
    pub lookups: Vec<LookupIndex>,
}

impl Feature {
    /// Construct from a textual tag and lookup indices
    pub fn new(feature: &str, lookups: impl IntoIterator<Item = u16>) -> Self {
        Feature {
            tag: tag(feature),
            lookups: lookups.into_iter().map(LookupIndex).collect(),
        }
    }
}

/// The features of one rule table, with a reverse map from lookup index
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureList {
    features: Vec<Feature>,
    // lookup index → positions in `features`, in registration order
    by_lookup: HashMap<LookupIndex, SmallVec<[usize; 2]>>,
}

impl FeatureList {
    /// Register a feature
    pub fn push(&mut self, feature: Feature) {
        let n = self.features.len();
        for index in &feature.lookups {
            self.by_lookup.entry(*index).or_default().push(n);
        }
        self.features.push(feature);
    }

    /// Iterate over features in registration order
    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    /// Find the feature under which lookup `index` runs
    ///
    /// This is the last-registered feature listing `index` which is not
    /// suppressed by `options`. Returns `None` if the lookup is not listed by
    /// any active feature (thus should not run).
    pub fn owner(&self, index: LookupIndex, options: &ShapeOptions) -> Option<Tag> {
        self.by_lookup
            .get(&index)?
            .iter()
            .rev()
            .map(|i| self.features[*i].tag)
            .find(|tag| !options.is_suppressed(*tag))
    }
}

impl FromIterator<Feature> for FeatureList {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        let mut list = FeatureList::default();
        for feature in iter {
            list.push(feature);
        }
        list
    }
}

#[cfg(feature = "serde")]
impl Serialize for FeatureList {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.features.serialize(s)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for FeatureList {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let features = Vec::<Feature>::deserialize(d)?;
        Ok(features.into_iter().collect())
    }
}

/// A rule database: lookups plus the features activating them
///
/// A font has one of these for substitution and one for positioning.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(bound(serialize = "R: Serialize", deserialize = "R: Deserialize<'de>"))
)]
pub struct RuleTable<R> {
    #[cfg_attr(feature = "serde", serde(default))]
    pub features: FeatureList,
    #[cfg_attr(feature = "serde", serde(default))]
    pub lookups: LookupList<R>,
}

impl<R> Default for RuleTable<R> {
    fn default() -> Self {
        RuleTable {
            features: FeatureList::default(),
            lookups: LookupList::default(),
        }
    }
}
