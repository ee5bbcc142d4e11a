//! Builders shared by the integration tests.
#![allow(dead_code)]

use scriptalign_engine::{
    Block, BookScript, CharacterId, ReferenceText, ReferenceTextKind, Versification,
};

pub const BOOK: &str = "MRK";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn chapter(number: u32) -> Block {
    Block::chapter_announcement(BOOK, number)
}

pub fn heading(chapter: u32, text: &str) -> Block {
    Block::section_head(BOOK, chapter, 0, text)
}

/// Narrator block; a leading verse marker in `marked` sets its verse.
pub fn narrator(chapter: u32, verse: u32, marked: &str) -> Block {
    Block::scripture(chapter, verse, marked, CharacterId::narrator(BOOK)).unwrap()
}

pub fn speaker(name: &str, chapter: u32, verse: u32, marked: &str) -> Block {
    Block::scripture(chapter, verse, marked, CharacterId::known(name)).unwrap()
}

pub fn vernacular(blocks: Vec<Block>) -> BookScript {
    BookScript::new(BOOK, Versification::english(), blocks)
}

pub fn english(blocks: Vec<Block>) -> ReferenceText {
    ReferenceText::new(
        ReferenceTextKind::Standard("English".to_string()),
        Versification::english(),
        vec![BookScript::new(BOOK, Versification::english(), blocks)],
    )
}

/// Reference text of every scripture block, in book order.
pub fn reference_content(reference: &ReferenceText) -> String {
    reference
        .book(BOOK)
        .unwrap()
        .script_blocks()
        .map(Block::text_with_verse_numbers)
        .collect()
}

/// Reference fragments attached to the vernacular scripture, in block order.
pub fn attached_content(book: &BookScript) -> String {
    book.script_blocks()
        .map(Block::primary_reference_text)
        .collect()
}

pub fn matched(book: &BookScript) -> Vec<bool> {
    book.blocks().iter().map(|b| b.matches_reference_text).collect()
}
