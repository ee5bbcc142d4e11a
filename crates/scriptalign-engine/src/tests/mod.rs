//! Shared builders for unit tests.

use crate::models::{Block, BookScript, CharacterId, MultiBlockQuote};
use crate::versification::Versification;

pub const BOOK: &str = "MRK";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Narrator block whose text opens with a verse marker.
pub fn narrator_block(chapter: u32, marked: &str) -> Block {
    Block::scripture(chapter, 0, marked, CharacterId::narrator(BOOK)).unwrap()
}

pub fn narrator_in_verse(chapter: u32, verse: u32, marked: &str) -> Block {
    Block::scripture(chapter, verse, marked, CharacterId::narrator(BOOK)).unwrap()
}

pub fn quote_block(chapter: u32, verse: u32, character: &str, marked: &str) -> Block {
    Block::scripture(chapter, verse, marked, CharacterId::known(character)).unwrap()
}

pub fn with_quote(block: Block, status: MultiBlockQuote) -> Block {
    block.with_multi_block_quote(status)
}

pub fn book(blocks: Vec<Block>) -> BookScript {
    BookScript::new(BOOK, Versification::english(), blocks)
}

pub fn statuses(book: &BookScript) -> Vec<MultiBlockQuote> {
    book.blocks().iter().map(|b| b.multi_block_quote).collect()
}
