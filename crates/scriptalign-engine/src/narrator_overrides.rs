use crate::models::{BookScript, CharacterId};
use crate::versification::VerseRef;

/// Reassigns narration in a verse range to a named character (e.g. a
/// first-person author). Missing verses mean "from the chapter start" and
/// "to the chapter end".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarratorOverride {
    pub book_id: String,
    pub start_chapter: u32,
    pub start_verse: Option<u32>,
    pub end_chapter: u32,
    pub end_verse: Option<u32>,
    pub character: String,
}

impl NarratorOverride {
    pub fn covers(&self, book_id: &str, verse: VerseRef) -> bool {
        let start = VerseRef::new(self.start_chapter, self.start_verse.unwrap_or(0));
        let end = VerseRef::new(self.end_chapter, self.end_verse.unwrap_or(u32::MAX));
        self.book_id == book_id && start <= verse && verse <= end
    }
}

/// Ordered override rules; the first rule covering a verse wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NarratorOverrides {
    rules: Vec<NarratorOverride>,
}

impl NarratorOverrides {
    pub fn new(rules: Vec<NarratorOverride>) -> Self {
        Self { rules }
    }

    pub fn push(&mut self, rule: NarratorOverride) {
        self.rules.push(rule);
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn character_for(&self, book_id: &str, chapter: u32, verse: u32) -> Option<&str> {
        let verse = VerseRef::new(chapter, verse);
        self.rules
            .iter()
            .find(|rule| rule.covers(book_id, verse))
            .map(|rule| rule.character.as_str())
    }

    /// Override `character_id_in_script` on narrator blocks. Match results
    /// and `character_id` are left alone. Returns the number of blocks changed.
    pub fn apply_to(&self, book: &mut BookScript) -> usize {
        let book_id = book.book_id.clone();
        let mut changed = 0;
        for block in book.blocks_mut() {
            if !block.character_id.is_narrator() {
                continue;
            }
            let Some(name) =
                self.character_for(&book_id, block.chapter_number, block.initial_start_verse)
            else {
                continue;
            };
            let id = CharacterId::known(name);
            if block.character_id_in_script.as_ref() != Some(&id) {
                block.character_id_in_script = Some(id);
                changed += 1;
            }
        }
        log::debug!("{book_id}: {changed} narrator block(s) overridden");
        changed
    }
}
