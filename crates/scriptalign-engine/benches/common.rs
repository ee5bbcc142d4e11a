// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use scriptalign_engine::{
    Block, BookScript, CharacterId, ReferenceText, ReferenceTextKind, Versification,
};

pub const BOOK: &str = "MRK";

#[allow(dead_code)]
pub const VERSES_PER_CHAPTER: u32 = 20;

fn narrator(chapter: u32, marked: &str) -> Block {
    Block::scripture(chapter, 0, marked, CharacterId::narrator(BOOK)).unwrap()
}

fn jesus(chapter: u32, verse: u32, marked: &str) -> Block {
    Block::scripture(chapter, verse, marked, CharacterId::known("Jesus")).unwrap()
}

/// Reference book: one block per verse, with speech every third verse.
#[allow(dead_code)]
pub fn generate_reference(chapters: u32) -> ReferenceText {
    let mut blocks = Vec::new();
    for chapter in 1..=chapters {
        blocks.push(Block::chapter_announcement(BOOK, chapter));
        for verse in 1..=VERSES_PER_CHAPTER {
            if verse % 3 == 0 {
                blocks.push(narrator(chapter, &format!("{{{verse}}}He said,")));
                blocks.push(jesus(chapter, verse, "“Follow me.”"));
            } else {
                blocks.push(narrator(chapter, &format!("{{{verse}}}Verse {verse} of {chapter}. ")));
            }
        }
    }
    ReferenceText::new(
        ReferenceTextKind::Standard("English".to_string()),
        Versification::english(),
        vec![BookScript::new(BOOK, Versification::english(), blocks)],
    )
}

/// Vernacular book whose narration runs several verses per block, so
/// alignment has to split.
#[allow(dead_code)]
pub fn generate_vernacular(chapters: u32, verses_per_block: u32) -> BookScript {
    let mut blocks = Vec::new();
    for chapter in 1..=chapters {
        blocks.push(Block::chapter_announcement(BOOK, chapter));
        let mut pending = String::new();
        for verse in 1..=VERSES_PER_CHAPTER {
            if verse % 3 == 0 {
                pending.push_str(&format!("{{{verse}}}Él dijo:"));
                blocks.push(narrator(chapter, &pending));
                blocks.push(jesus(chapter, verse, "«Sígueme.»"));
                pending.clear();
                continue;
            }
            pending.push_str(&format!("{{{verse}}}Versículo {verse} de {chapter}. "));
            if verse % verses_per_block == 0 {
                blocks.push(narrator(chapter, &pending));
                pending.clear();
            }
        }
        if !pending.is_empty() {
            blocks.push(narrator(chapter, &pending));
        }
    }
    BookScript::new(BOOK, Versification::english(), blocks)
}
