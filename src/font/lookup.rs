// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Lookups and lookup lists

#![allow(clippy::len_without_is_empty)]

use crate::rules::Rule;
use bitflags::bitflags;
use smallvec::SmallVec;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lookup identifier
///
/// Identifies a lookup within its [`LookupList`]. Indices are assigned by the
/// font and are stable; they need not match registration order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct LookupIndex(pub u16);

impl LookupIndex {
    /// Get as `usize`
    pub fn get(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for LookupIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

bitflags! {
    /// Lookup flags
    ///
    /// These follow the layout of the OpenType `LookupFlag` word. The high
    /// byte holds the mark attachment class; see
    /// [`LookupFlags::mark_attachment_class`].
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct LookupFlags: u16 {
        /// Cursive attachment direction (unused by this engine)
        const RIGHT_TO_LEFT = 0x0001;
        /// Skip over base glyphs
        const IGNORE_BASE_GLYPHS = 0x0002;
        /// Skip over ligatures
        const IGNORE_LIGATURES = 0x0004;
        /// Skip over marks
        const IGNORE_MARKS = 0x0008;
        /// A mark filtering set is in use
        const USE_MARK_FILTERING_SET = 0x0010;
        /// Mask of the mark attachment class
        const MARK_ATTACHMENT_TYPE = 0xFF00;
    }
}

impl LookupFlags {
    /// Decode an OpenType `LookupFlag` word, retaining the mark class
    #[inline]
    pub fn from_word(word: u16) -> Self {
        LookupFlags::from_bits_retain(word)
    }

    /// Set the mark attachment class (0 = unrestricted)
    #[must_use]
    pub fn with_mark_attachment_class(self, class: u8) -> Self {
        let bits = (self.bits() & !Self::MARK_ATTACHMENT_TYPE.bits()) | (u16::from(class) << 8);
        LookupFlags::from_bits_retain(bits)
    }

    /// The mark attachment class
    ///
    /// If non-zero, only glyphs with this mark attachment class are visible
    /// to context matching.
    #[inline]
    pub fn mark_attachment_class(self) -> u16 {
        (self.bits() & Self::MARK_ATTACHMENT_TYPE.bits()) >> 8
    }
}

/// A lookup: an ordered list of rules sharing filtering flags
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Lookup<R> {
    /// Stable identifier
    pub index: LookupIndex,
    #[cfg_attr(feature = "serde", serde(default))]
    pub flags: LookupFlags,
    /// Mark filtering set
    ///
    /// If set, only glyphs in this set are visible to context matching.
    #[cfg_attr(feature = "serde", serde(default))]
    pub filter_set: Option<u16>,
    /// Rules, in textual order
    pub rules: Vec<R>,
}

impl<R: Rule> Lookup<R> {
    /// Construct an empty lookup
    pub fn new(index: u16, flags: LookupFlags) -> Self {
        Lookup {
            index: LookupIndex(index),
            flags,
            filter_set: None,
            rules: vec![],
        }
    }

    /// Set the mark filtering set
    #[must_use]
    pub fn with_filter_set(mut self, set: u16) -> Self {
        self.filter_set = Some(set);
        self
    }

    /// Append a rule
    #[must_use]
    pub fn with_rule(mut self, rule: R) -> Self {
        self.rules.push(rule);
        self
    }

    /// Append a rule
    pub fn push(&mut self, rule: R) {
        self.rules.push(rule);
    }

    /// Rules ordered by descending context length
    ///
    /// The sort is stable: rules of equal length keep their textual order.
    pub fn rules_longest_first(&self) -> SmallVec<[&R; 8]> {
        let mut rules: SmallVec<[&R; 8]> = self.rules.iter().collect();
        rules.sort_by_key(|rule| Reverse(rule.context_len()));
        rules
    }

    /// Rules ordered by ascending context length
    ///
    /// The sort is stable: rules of equal length keep their textual order.
    pub fn rules_shortest_first(&self) -> SmallVec<[&R; 8]> {
        let mut rules: SmallVec<[&R; 8]> = self.rules.iter().collect();
        rules.sort_by_key(|rule| rule.context_len());
        rules
    }

    /// Indices of all lookups chained from this one
    pub fn chained_lookups(&self) -> impl Iterator<Item = LookupIndex> + '_ {
        self.rules.iter().flat_map(|rule| rule.chained_lookups())
    }
}

/// An index-addressed list of lookups
///
/// Lookups are kept in registration order (the order in which shaping visits
/// them) and may be addressed by their [`LookupIndex`].
#[derive(Clone, Debug, PartialEq)]
pub struct LookupList<R> {
    lookups: Vec<Lookup<R>>,
    by_index: HashMap<LookupIndex, usize>,
}

impl<R> Default for LookupList<R> {
    fn default() -> Self {
        LookupList {
            lookups: vec![],
            by_index: HashMap::new(),
        }
    }
}

impl<R> LookupList<R> {
    /// Register a lookup
    ///
    /// A later lookup with the same index shadows an earlier one for
    /// addressing purposes, but both remain in registration order.
    pub fn push(&mut self, lookup: Lookup<R>) {
        self.by_index.insert(lookup.index, self.lookups.len());
        self.lookups.push(lookup);
    }

    /// Get a lookup by index
    #[inline]
    pub fn get(&self, index: LookupIndex) -> Option<&Lookup<R>> {
        self.by_index.get(&index).map(|i| &self.lookups[*i])
    }

    /// Iterate over lookups in registration order
    pub fn iter(&self) -> std::slice::Iter<'_, Lookup<R>> {
        self.lookups.iter()
    }

    /// Find an index shared by more than one lookup
    ///
    /// Only the last lookup registered with such an index is addressable.
    pub fn duplicate(&self) -> Option<LookupIndex> {
        self.lookups
            .iter()
            .enumerate()
            .find(|(i, lookup)| self.by_index.get(&lookup.index) != Some(i))
            .map(|(_, lookup)| lookup.index)
    }

    /// Number of registered lookups
    pub fn len(&self) -> usize {
        self.lookups.len()
    }
}

impl<R> FromIterator<Lookup<R>> for LookupList<R> {
    fn from_iter<I: IntoIterator<Item = Lookup<R>>>(iter: I) -> Self {
        let mut list = LookupList::default();
        for lookup in iter {
            list.push(lookup);
        }
        list
    }
}

impl<R: Rule> LookupList<R> {
    /// Find a lookup which (transitively) chains back to itself
    ///
    /// Returns the index of some lookup on a cycle, if any. References to
    /// absent lookups are ignored here.
    pub fn find_cycle(&self) -> Option<LookupIndex> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }

        fn visit<R: Rule>(
            list: &LookupList<R>,
            i: usize,
            marks: &mut [Mark],
        ) -> Option<LookupIndex> {
            marks[i] = Mark::Active;
            for next in list.lookups[i].chained_lookups() {
                let Some(&j) = list.by_index.get(&next) else {
                    continue;
                };
                match marks[j] {
                    Mark::Active => return Some(next),
                    Mark::New => {
                        if let Some(index) = visit(list, j, marks) {
                            return Some(index);
                        }
                    }
                    Mark::Done => (),
                }
            }
            marks[i] = Mark::Done;
            None
        }

        let mut marks = vec![Mark::New; self.lookups.len()];
        for i in 0..self.lookups.len() {
            if marks[i] == Mark::New {
                if let Some(index) = visit(self, i, &mut marks) {
                    return Some(index);
                }
            }
        }
        None
    }
}

#[cfg(feature = "serde")]
impl<R: Serialize> Serialize for LookupList<R> {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.lookups.serialize(s)
    }
}

#[cfg(feature = "serde")]
impl<'de, R: Deserialize<'de>> Deserialize<'de> for LookupList<R> {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let lookups = Vec::<Lookup<R>>::deserialize(d)?;
        Ok(lookups.into_iter().collect())
    }
}
