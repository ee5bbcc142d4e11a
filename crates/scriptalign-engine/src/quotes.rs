//! Multi-block quote chain validation and repair.
//!
//! A valid chain is a maximal run `Start, (Continuation | ChangeOfDelivery)+`
//! spoken by one non-narrator speaker. Every repair here changes only the
//! `multi_block_quote` status (and, for mixed-speaker chains, the speaker);
//! text and verse assignment are never touched. Running [`repair`] twice
//! changes nothing the second time.

use std::ops::Range;

use crate::models::{Block, BookScript, CharacterId, MultiBlockQuote, UNSPLIT};

/// Run every repair in order. Returns the number of blocks changed.
pub fn repair(book: &mut BookScript) -> usize {
    let changed = repair_split_boundaries(book)
        + migrate_invalid_quote_data(book)
        + break_narrator_chains(book)
        + clean_up_orphans(book);
    if changed > 0 {
        log::info!("{}: repaired quote status of {changed} block(s)", book.book_id);
    }
    changed
}

/// Ranges led by a `Start`, extended over the continuers that follow.
fn chains(blocks: &[Block]) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < blocks.len() {
        if blocks[i].multi_block_quote != MultiBlockQuote::Start {
            i += 1;
            continue;
        }
        let mut end = i + 1;
        while end < blocks.len() && blocks[end].multi_block_quote.is_continuer() {
            end += 1;
        }
        out.push(i..end);
        i = end;
    }
    out
}

fn set_status(block: &mut Block, status: MultiBlockQuote) -> usize {
    if block.multi_block_quote == status {
        0
    } else {
        block.multi_block_quote = status;
        1
    }
}

/// Status of a block rejoined with the next piece of its split. `continued`
/// tells whether the block after the rejoined pair continues a quote.
pub(crate) fn merged_status(
    head: MultiBlockQuote,
    tail: MultiBlockQuote,
    continued: bool,
) -> MultiBlockQuote {
    match head {
        MultiBlockQuote::Start if !continued => MultiBlockQuote::None,
        MultiBlockQuote::None if tail.is_continuer() && continued => MultiBlockQuote::Start,
        status => status,
    }
}

/// Downgrade a `Start` nobody continues, and continuers with no open chain.
pub fn clean_up_orphans(book: &mut BookScript) -> usize {
    let blocks = book.blocks_mut();
    let mut changed = 0;
    let mut open = false;
    for i in 0..blocks.len() {
        match blocks[i].multi_block_quote {
            MultiBlockQuote::Start => {
                let continued = blocks
                    .get(i + 1)
                    .is_some_and(|next| next.multi_block_quote.is_continuer());
                if !continued {
                    changed += set_status(&mut blocks[i], MultiBlockQuote::None);
                }
                open = continued;
            }
            MultiBlockQuote::Continuation | MultiBlockQuote::ChangeOfDelivery => {
                if !open {
                    changed += set_status(&mut blocks[i], MultiBlockQuote::None);
                }
            }
            MultiBlockQuote::None => open = false,
        }
    }
    changed
}

/// Multi-block quoting is for dramatized speech: a chain spoken entirely
/// by the narrator is broken up.
pub fn break_narrator_chains(book: &mut BookScript) -> usize {
    let ranges = chains(book.blocks());
    let blocks = book.blocks_mut();
    let mut changed = 0;
    for range in ranges {
        if blocks[range.clone()].iter().all(|b| b.character_id.is_narrator()) {
            for block in &mut blocks[range] {
                changed += set_status(block, MultiBlockQuote::None);
            }
        }
    }
    changed
}

/// Fix data a chain cannot legally hold: quote status on non-scripture
/// blocks, and chains whose members disagree about the speaker. Unclear
/// members of an otherwise single-speaker chain take that speaker; a chain
/// with several known speakers becomes ambiguous for review.
pub fn migrate_invalid_quote_data(book: &mut BookScript) -> usize {
    let mut changed = 0;
    for block in book.blocks_mut().iter_mut().filter(|b| !b.is_scripture()) {
        changed += set_status(block, MultiBlockQuote::None);
    }

    let ranges = chains(book.blocks());
    let blocks = book.blocks_mut();
    for range in ranges {
        let mut speakers: Vec<&CharacterId> = Vec::new();
        for block in &blocks[range.clone()] {
            if !block.character_id.is_unclear() && !speakers.contains(&&block.character_id) {
                speakers.push(&block.character_id);
            }
        }
        let replacement = match speakers.as_slice() {
            [] => continue,
            [only] => (*only).clone(),
            _ => CharacterId::Ambiguous,
        };
        for block in &mut blocks[range] {
            if block.character_id != replacement {
                block.character_id = replacement.clone();
                block.user_confirmed = false;
                changed += 1;
            }
        }
    }
    changed
}

/// A split can leave `None, Continuation` inside one split group: the quote
/// began in the first piece but lost its `Start`. The first piece of that
/// run becomes the `Start` and the rest continue it.
pub fn repair_split_boundaries(book: &mut BookScript) -> usize {
    let blocks = book.blocks_mut();
    let mut changed = 0;
    for i in 1..blocks.len() {
        let split_id = blocks[i].split_id;
        if split_id == UNSPLIT
            || !blocks[i].multi_block_quote.is_continuer()
            || blocks[i - 1].multi_block_quote != MultiBlockQuote::None
            || blocks[i - 1].split_id != split_id
        {
            continue;
        }
        let mut start = i - 1;
        while start > 0
            && blocks[start - 1].split_id == split_id
            && blocks[start - 1].multi_block_quote == MultiBlockQuote::None
        {
            start -= 1;
        }
        changed += set_status(&mut blocks[start], MultiBlockQuote::Start);
        for block in &mut blocks[start + 1..i] {
            changed += set_status(block, MultiBlockQuote::Continuation);
        }
    }
    changed
}

/// Indices of blocks that break chain validity; empty for a valid book.
pub fn invalid_chain_members(book: &BookScript) -> Vec<usize> {
    let blocks = book.blocks();
    let mut bad = Vec::new();
    let mut open = false;
    for (i, block) in blocks.iter().enumerate() {
        match block.multi_block_quote {
            MultiBlockQuote::Start => {
                open = blocks
                    .get(i + 1)
                    .is_some_and(|next| next.multi_block_quote.is_continuer());
                if !open {
                    bad.push(i);
                }
            }
            MultiBlockQuote::Continuation | MultiBlockQuote::ChangeOfDelivery if !open => {
                bad.push(i)
            }
            MultiBlockQuote::Continuation | MultiBlockQuote::ChangeOfDelivery => {}
            MultiBlockQuote::None => open = false,
        }
    }
    for range in chains(blocks) {
        if range.len() > 1 && blocks[range.clone()].iter().all(|b| b.character_id.is_narrator()) {
            bad.extend(range);
        }
    }
    bad.sort_unstable();
    bad.dedup();
    bad
}
