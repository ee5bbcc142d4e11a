//! Verse references and the seam to the external versification oracle.
//!
//! Converting between numbering schemes is delegated to a
//! [`VersificationMapping`]; this crate only ships an identity mapping and an
//! explicit in-memory table. Loading real versification data is the caller's
//! business.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A chapter/verse numbering scheme, identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Versification(String);

impl Versification {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn english() -> Self {
        Self::new("English")
    }

    pub fn original() -> Self {
        Self::new("Original")
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Versification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single verse within a book. Ordered by chapter, then verse.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct VerseRef {
    pub chapter: u32,
    pub verse: u32,
}

impl VerseRef {
    pub const fn new(chapter: u32, verse: u32) -> Self {
        Self { chapter, verse }
    }
}

impl fmt::Display for VerseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chapter, self.verse)
    }
}

/// External oracle converting verse references between numbering schemes.
///
/// A verse may map to zero (no counterpart), one, or many verses, possibly in
/// a different chapter.
pub trait VersificationMapping {
    fn resolve(
        &self,
        book_id: &str,
        verse: VerseRef,
        from: &Versification,
        to: &Versification,
    ) -> Vec<VerseRef>;
}

/// Every verse maps to itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMapping;

impl VersificationMapping for IdentityMapping {
    fn resolve(
        &self,
        _book_id: &str,
        verse: VerseRef,
        _from: &Versification,
        _to: &Versification,
    ) -> Vec<VerseRef> {
        vec![verse]
    }
}

type MappingKey = (String, Versification, Versification, VerseRef);

/// Explicit verse mappings with an identity fallback for verses not listed.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: HashMap<MappingKey, Vec<VerseRef>>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `verse` in `from` to `targets` in `to` (one direction only).
    pub fn add(
        &mut self,
        book_id: &str,
        from: &Versification,
        to: &Versification,
        verse: VerseRef,
        targets: impl IntoIterator<Item = VerseRef>,
    ) -> &mut Self {
        let key = (book_id.to_string(), from.clone(), to.clone(), verse);
        let slot = self.entries.entry(key).or_default();
        for target in targets {
            if !slot.contains(&target) {
                slot.push(target);
            }
        }
        slot.sort();
        self
    }

    /// Map in both directions: each target maps back onto `verse`.
    pub fn add_bidirectional(
        &mut self,
        book_id: &str,
        from: &Versification,
        to: &Versification,
        verse: VerseRef,
        targets: &[VerseRef],
    ) -> &mut Self {
        self.add(book_id, from, to, verse, targets.iter().copied());
        for target in targets {
            self.add(book_id, to, from, *target, [verse]);
        }
        self
    }

    /// Record that `verse` in `from` has no counterpart in `to`.
    pub fn add_unmapped(
        &mut self,
        book_id: &str,
        from: &Versification,
        to: &Versification,
        verse: VerseRef,
    ) -> &mut Self {
        self.entries
            .insert((book_id.to_string(), from.clone(), to.clone(), verse), Vec::new());
        self
    }
}

impl VersificationMapping for MappingTable {
    fn resolve(
        &self,
        book_id: &str,
        verse: VerseRef,
        from: &Versification,
        to: &Versification,
    ) -> Vec<VerseRef> {
        if from == to {
            return vec![verse];
        }
        let key = (book_id.to_string(), from.clone(), to.clone(), verse);
        match self.entries.get(&key) {
            Some(targets) => targets.clone(),
            None => vec![verse],
        }
    }
}
