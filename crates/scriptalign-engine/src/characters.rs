//! Character/verse control data seam.
//!
//! The control data itself lives outside this crate; the aligner only asks
//! which speakers may legitimately talk in a verse range.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::models::CharacterId;
use crate::versification::{VerseRef, Versification};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterDelivery {
    pub character: String,
    pub delivery: Option<String>,
}

pub trait CharacterVerseLookup {
    fn lookup(
        &self,
        book_id: &str,
        chapter: u32,
        verses: RangeInclusive<u32>,
        versification: &Versification,
    ) -> Vec<CharacterDelivery>;

    /// Whether `character` is expected to speak somewhere in the range.
    fn can_speak(
        &self,
        book_id: &str,
        chapter: u32,
        verses: RangeInclusive<u32>,
        versification: &Versification,
        character: &CharacterId,
    ) -> bool {
        let names = character.alternatives();
        self.lookup(book_id, chapter, verses, versification)
            .iter()
            .any(|cd| names.contains(&cd.character.as_str()))
    }
}

/// In-memory control data keyed by book and verse.
#[derive(Debug, Clone, Default)]
pub struct CharacterVerseTable {
    entries: BTreeMap<(String, VerseRef), Vec<CharacterDelivery>>,
}

impl CharacterVerseTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        book_id: &str,
        verse: VerseRef,
        character: &str,
        delivery: Option<&str>,
    ) -> &mut Self {
        self.entries
            .entry((book_id.to_string(), verse))
            .or_default()
            .push(CharacterDelivery {
                character: character.to_string(),
                delivery: delivery.map(str::to_string),
            });
        self
    }
}

impl CharacterVerseLookup for CharacterVerseTable {
    fn lookup(
        &self,
        book_id: &str,
        chapter: u32,
        verses: RangeInclusive<u32>,
        _versification: &Versification,
    ) -> Vec<CharacterDelivery> {
        let mut found: Vec<CharacterDelivery> = Vec::new();
        for verse in verses {
            let key = (book_id.to_string(), VerseRef::new(chapter, verse));
            for cd in self.entries.get(&key).into_iter().flatten() {
                if !found.contains(cd) {
                    found.push(cd.clone());
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_spans_range_without_duplicates() {
        let mut table = CharacterVerseTable::new();
        table
            .add("MRK", VerseRef::new(1, 2), "Jesus", None)
            .add("MRK", VerseRef::new(1, 3), "Jesus", None)
            .add("MRK", VerseRef::new(1, 3), "Peter", Some("shouting"));

        let found = table.lookup("MRK", 1, 1..=3, &Versification::english());

        assert_eq!(found.len(), 2);
        assert_eq!(found[1].delivery.as_deref(), Some("shouting"));
    }

    #[test]
    fn test_can_speak_checks_alternatives() {
        let mut table = CharacterVerseTable::new();
        table.add("ACT", VerseRef::new(4, 19), "John", None);
        let eng = Versification::english();

        assert!(table.can_speak("ACT", 4, 19..=19, &eng, &CharacterId::known("Peter/John")));
        assert!(!table.can_speak("ACT", 4, 19..=19, &eng, &CharacterId::known("Peter")));
        assert!(!table.can_speak("ACT", 4, 20..=20, &eng, &CharacterId::known("John")));
    }
}
