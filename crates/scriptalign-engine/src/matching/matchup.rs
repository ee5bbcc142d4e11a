use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use crate::characters::CharacterVerseLookup;
use crate::error::{AlignError, AlignmentIssue};
use crate::models::{Block, BlockElement, BookScript, CharacterId, ReferenceBlock, UNSPLIT};
use crate::quotes;
use crate::versification::Versification;

use super::chunk::{Chunk, Span, WorkingReference};
use super::passes::{MatchContext, attach_unsplit, match_group};
use super::reporting_clause::ReportingClauses;

/// A proposed alignment of one verse range, editable before it is applied.
///
/// `correlated_blocks` start out as clones of `original_blocks`, split where
/// the reference text has verse breaks they lack, with reference blocks
/// attached. Nothing reaches the book until [`BlockMatchup::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMatchup {
    book_id: String,
    versification: Versification,
    narrator: CharacterId,
    start: usize,
    original_blocks: Vec<Block>,
    correlated_blocks: Vec<Block>,
    anchor: usize,
    next_split_id: i32,
    new_split_ids: Vec<i32>,
    issues: Vec<AlignmentIssue>,
    /// The book block after the range continues a quote.
    continued_after: bool,
}

struct ReferencePool {
    blocks: Vec<Block>,
    spans: Vec<Option<Span>>,
}

impl BlockMatchup {
    pub(crate) fn build(
        book: &BookScript,
        chunk: &Chunk,
        anchor: usize,
        work: &WorkingReference<'_>,
        ctx: &MatchContext<'_>,
        allow_splitting: bool,
    ) -> Self {
        let original_blocks = book.blocks()[chunk.vernacular.clone()].to_vec();
        let mut matchup = Self {
            book_id: book.book_id.clone(),
            versification: book.versification.clone(),
            narrator: book.narrator(),
            start: chunk.vernacular.start,
            correlated_blocks: original_blocks.clone(),
            original_blocks,
            anchor: 0,
            next_split_id: book.next_split_id(),
            new_split_ids: Vec::new(),
            issues: Vec::new(),
            continued_after: continues_quote(book, chunk.vernacular.end),
        };
        let mut origins: Vec<usize> = (0..matchup.correlated_blocks.len()).collect();
        let mut pool = ReferencePool {
            blocks: chunk.reference.iter().map(|&i| work.blocks()[i].clone()).collect(),
            spans: chunk.reference.iter().map(|&i| work.span(i)).collect(),
        };

        if allow_splitting {
            matchup.split_at_reference_breaks(&pool, &mut origins);
            split_reference_at_vernacular_breaks(&mut pool, &matchup.correlated_blocks, work);
        }

        for (vernacular, reference) in partition(&matchup.correlated_blocks, &pool) {
            log::debug!(
                "{}: matching blocks {:?} against {} reference block(s)",
                matchup.book_id,
                vernacular,
                reference.len()
            );
            let straddles = straddles_verse_break(
                &matchup.correlated_blocks[vernacular.clone()],
                &pool.spans[reference.clone()],
            );
            let blocks = &mut matchup.correlated_blocks[vernacular];
            if straddles {
                attach_unsplit(blocks, &pool.blocks[reference]);
            } else {
                match_group(blocks, &pool.blocks[reference], ctx);
            }
        }

        let anchor_origin = anchor.saturating_sub(chunk.vernacular.start);
        matchup.anchor = origins.iter().position(|&o| o == anchor_origin).unwrap_or(0);
        matchup
    }

    /// A matchup over a single non-scripture block.
    pub(crate) fn single(book: &BookScript, index: usize, block: Block) -> Self {
        Self {
            book_id: book.book_id.clone(),
            versification: book.versification.clone(),
            narrator: book.narrator(),
            start: index,
            original_blocks: book.blocks()[index..=index].to_vec(),
            correlated_blocks: vec![block],
            anchor: 0,
            next_split_id: book.next_split_id(),
            new_split_ids: Vec::new(),
            issues: Vec::new(),
            continued_after: continues_quote(book, index + 1),
        }
    }

    pub(crate) fn with_issues(mut self, issues: Vec<AlignmentIssue>) -> Self {
        self.issues = issues;
        self
    }

    /// Split every vernacular block at interior verse markers where a
    /// reference block begins.
    fn split_at_reference_breaks(&mut self, pool: &ReferencePool, origins: &mut Vec<usize>) {
        let starts: Vec<_> = pool
            .blocks
            .iter()
            .zip(&pool.spans)
            .filter(|(block, _)| block.starts_at_verse_break())
            .filter_map(|(_, span)| span.map(|(lo, _)| lo))
            .collect();

        let mut k = 0;
        while k < self.correlated_blocks.len() {
            let block = &self.correlated_blocks[k];
            let mut candidates: Vec<u32> = starts
                .iter()
                .filter(|lo| {
                    lo.chapter == block.chapter_number
                        && lo.verse > block.initial_start_verse
                        && lo.verse <= block.last_verse_number()
                })
                .map(|lo| lo.verse)
                .collect();
            candidates.sort_unstable();
            candidates.dedup();

            let piece = candidates
                .into_iter()
                .find_map(|verse| self.correlated_blocks[k].split_at_verse(verse));
            if let Some(piece) = piece {
                self.insert_piece(k, piece);
                origins.insert(k + 1, origins[k]);
            }
            k += 1;
        }
    }

    fn insert_piece(&mut self, index: usize, mut piece: Block) {
        let head = &mut self.correlated_blocks[index];
        if head.split_id == UNSPLIT {
            head.split_id = self.next_split_id;
            self.new_split_ids.push(self.next_split_id);
            self.next_split_id += 1;
        }
        piece.split_id = head.split_id;
        self.correlated_blocks.insert(index + 1, piece);
    }

    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    /// Range of book indices this matchup replaces.
    pub fn original_range(&self) -> Range<usize> {
        self.start..self.start + self.original_blocks.len()
    }

    pub fn original_blocks(&self) -> &[Block] {
        &self.original_blocks
    }

    pub fn correlated_blocks(&self) -> &[Block] {
        &self.correlated_blocks
    }

    pub fn correlated_anchor_index(&self) -> usize {
        self.anchor
    }

    /// The correlated block holding the start of the requested block.
    pub fn correlated_anchor_block(&self) -> &Block {
        &self.correlated_blocks[self.anchor]
    }

    /// Anomalies found while gathering the reference text for this range.
    pub fn issues(&self) -> &[AlignmentIssue] {
        &self.issues
    }

    pub fn count_of_blocks_added_by_splitting(&self) -> usize {
        self.correlated_blocks
            .len()
            .saturating_sub(self.original_blocks.len())
    }

    pub fn has_outstanding_changes_to_apply(&self) -> bool {
        self.correlated_blocks != self.original_blocks
    }

    fn correlated_mut(&mut self, index: usize) -> Result<&mut Block, AlignError> {
        let len = self.correlated_blocks.len();
        self.correlated_blocks
            .get_mut(index)
            .ok_or(AlignError::CorrelatedIndexOutOfRange { index, len })
    }

    /// Replace the primary reference text of block `index`, creating the
    /// reference block if there is none. A secondary rendition is kept.
    pub fn set_reference_text(&mut self, index: usize, marked: &str) -> Result<(), AlignError> {
        let elements = BlockElement::parse_marked_text(marked)?;
        let block = self.correlated_mut(index)?;
        let mut reference = ReferenceBlock::combine(&block.reference_blocks, Some(&block.character_id))
            .unwrap_or_else(|| ReferenceBlock::empty_for(block, block.character_id.clone()));
        reference.elements = elements;
        block.reference_blocks = vec![reference];
        Ok(())
    }

    /// Accept every correlation as a match, folding multiple reference
    /// blocks into one.
    pub fn match_all_blocks(&mut self, characters: Option<&dyn CharacterVerseLookup>) {
        let none = ReportingClauses::default();
        let ctx = MatchContext {
            book_id: &self.book_id,
            versification: &self.versification,
            narrator: self.narrator.clone(),
            vernacular_clauses: &none,
            reference_clauses: &none,
            single_voice: false,
            characters,
        };
        for block in &mut self.correlated_blocks {
            let reference = ReferenceBlock::combine(&block.reference_blocks, Some(&block.character_id))
                .unwrap_or_else(|| ReferenceBlock::empty_for(block, block.character_id.clone()));
            ctx.adopt_reference_speaker(block, &reference);
            block.set_matched_reference_block(reference);
        }
    }

    /// Give narrator blocks whose reference is empty the text of a
    /// reporting clause, e.g. "he said." Returns the number filled.
    pub fn insert_reporting_clause_text(&mut self, clause: &str) -> usize {
        let mut filled = 0;
        for block in &mut self.correlated_blocks {
            let empty = match block.reference_blocks.as_slice() {
                [] => true,
                [only] => only.is_empty(),
                _ => false,
            };
            if !block.character_id.is_narrator() || !block.matches_reference_text || !empty {
                continue;
            }
            let mut reference = block
                .reference_blocks
                .pop()
                .unwrap_or_else(|| ReferenceBlock::empty_for(block, block.character_id.clone()));
            reference.character_id = block.character_id.clone();
            reference.elements = vec![BlockElement::text(clause)];
            block.set_matched_reference_block(reference);
            filled += 1;
        }
        filled
    }

    /// Split correlated block `index` `char_offset` characters into the text
    /// of `verse`. The reference stays with the first piece, unmatched.
    pub fn split_correlated_block(
        &mut self,
        index: usize,
        verse: u32,
        char_offset: usize,
    ) -> Result<usize, AlignError> {
        let piece = self
            .correlated_mut(index)?
            .split_at_offset(verse, char_offset)
            .map_err(|reason| AlignError::InvalidSplit {
                index,
                verse,
                offset: char_offset,
                reason,
            })?;
        self.insert_piece(index, piece);
        if self.anchor > index {
            self.anchor += 1;
        }
        Ok(index + 1)
    }

    pub fn merge_correlated_with_following(&mut self, index: usize) -> Result<(), AlignError> {
        let len = self.correlated_blocks.len();
        if index + 1 >= len {
            return Err(AlignError::CorrelatedIndexOutOfRange { index: index + 1, len });
        }
        let split_id = self.correlated_blocks[index].split_id;
        if split_id == UNSPLIT || self.correlated_blocks[index + 1].split_id != split_id {
            return Err(AlignError::InvalidMerge {
                index,
                reason: "blocks are not pieces of the same split",
            });
        }
        let next = self.correlated_blocks.remove(index + 1);
        let tail_status = next.multi_block_quote;
        self.correlated_blocks[index].merge_following(next);
        let continued = self
            .correlated_blocks
            .get(index + 1)
            .map_or(self.continued_after, |b| b.multi_block_quote.is_continuer());
        let merged = &mut self.correlated_blocks[index];
        merged.multi_block_quote = quotes::merged_status(merged.multi_block_quote, tail_status, continued);
        if self.correlated_blocks.iter().filter(|b| b.split_id == split_id).count() == 1
            && !self.original_blocks.iter().any(|b| b.split_id == split_id)
        {
            self.correlated_blocks[index].split_id = UNSPLIT;
        }
        if self.anchor > index {
            self.anchor -= 1;
        }
        Ok(())
    }

    /// Attribute block `index` by hand. The choice counts as confirmed.
    pub fn set_character(
        &mut self,
        index: usize,
        character_id: CharacterId,
        delivery: Option<String>,
    ) -> Result<(), AlignError> {
        let block = self.correlated_mut(index)?;
        block.character_id = character_id;
        block.delivery = delivery;
        block.user_confirmed = true;
        Ok(())
    }

    /// Commit the correlated blocks to `book` in place of the originals.
    pub fn apply(&mut self, book: &mut BookScript) -> Result<(), AlignError> {
        if book.book_id != self.book_id {
            return Err(AlignError::BookMismatch {
                expected: self.book_id.clone(),
                actual: book.book_id.clone(),
            });
        }
        let range = self.original_range();
        let unchanged = book
            .blocks()
            .get(range.clone())
            .is_some_and(|blocks| blocks == self.original_blocks.as_slice());
        if !unchanged {
            return Err(AlignError::StaleMatchup {
                start: range.start,
                end: range.end,
            });
        }
        self.renumber_new_splits(book, &range);
        self.commit(book);
        Ok(())
    }

    /// Split ids minted here may have been taken in the book meanwhile.
    fn renumber_new_splits(&mut self, book: &BookScript, range: &Range<usize>) {
        let taken = |id: i32| {
            book.blocks()
                .iter()
                .enumerate()
                .any(|(i, b)| !range.contains(&i) && b.split_id == id)
        };
        let mut next = book.next_split_id().max(self.next_split_id);
        let mut renumbered = BTreeMap::new();
        for &id in &self.new_split_ids {
            if taken(id) {
                renumbered.insert(id, next);
                next += 1;
            }
        }
        for block in &mut self.correlated_blocks {
            if let Some(&id) = renumbered.get(&block.split_id) {
                block.split_id = id;
            }
        }
    }

    pub(crate) fn commit(&mut self, book: &mut BookScript) {
        book.replace_range(self.original_range(), self.correlated_blocks.clone());
        self.original_blocks = self.correlated_blocks.clone();
        self.new_split_ids.clear();
    }
}

fn continues_quote(book: &BookScript, index: usize) -> bool {
    book.blocks()
        .get(index)
        .is_some_and(|b| b.multi_block_quote.is_continuer())
}

fn split_reference_at_vernacular_breaks(
    pool: &mut ReferencePool,
    vernacular: &[Block],
    work: &WorkingReference<'_>,
) {
    let breaks: Vec<_> = vernacular
        .iter()
        .filter(|b| b.starts_at_verse_break())
        .map(Block::initial_verse)
        .collect();

    let mut q = 0;
    while q < pool.blocks.len() {
        let Some((lo, hi)) = pool.spans[q] else {
            q += 1;
            continue;
        };
        let mut candidates: Vec<_> = breaks.iter().copied().filter(|v| lo < *v && *v <= hi).collect();
        candidates.sort_unstable();
        let piece = candidates
            .into_iter()
            .find_map(|verse| work.split_at_vernacular(&mut pool.blocks[q], verse));
        if let Some(piece) = piece {
            pool.spans[q] = work.span_for(&pool.blocks[q]);
            pool.spans.insert(q + 1, work.span_for(&piece));
            pool.blocks.insert(q + 1, piece);
        }
        q += 1;
    }
}

/// Whether a reference block covers both sides of a vernacular verse break.
fn straddles_verse_break(vernacular: &[Block], spans: &[Option<Span>]) -> bool {
    vernacular
        .iter()
        .skip(1)
        .filter(|b| b.starts_at_verse_break())
        .map(Block::initial_verse)
        .any(|verse| spans.iter().flatten().any(|(lo, hi)| *lo < verse && verse <= *hi))
}

/// Cut both sides at verse breaks they have in common.
fn partition(vernacular: &[Block], pool: &ReferencePool) -> Vec<(Range<usize>, Range<usize>)> {
    let spans = &pool.spans;
    let n = pool.blocks.len();
    let mut groups = Vec::new();
    let (mut v0, mut r0) = (0, 0);
    for k in 1..vernacular.len() {
        let block = &vernacular[k];
        if !block.starts_at_verse_break() {
            continue;
        }
        let verse = block.initial_verse();
        if vernacular[v0..k].iter().any(|b| b.last_verse() >= verse) {
            continue;
        }
        let q = (r0..n)
            .find(|&q| spans[q].is_some_and(|(lo, _)| lo >= verse))
            .unwrap_or(n);
        let clean = (r0..q).all(|p| spans[p].is_none_or(|(_, hi)| hi < verse))
            && (q..n).all(|p| spans[p].is_none_or(|(lo, _)| lo >= verse))
            && (q == n || pool.blocks[q].starts_at_verse_break());
        if clean {
            groups.push((v0..k, r0..q));
            v0 = k;
            r0 = q;
        }
    }
    groups.push((v0..vernacular.len(), r0..n));
    groups
}

fn reference_column(block: &Block) -> String {
    block
        .reference_blocks
        .iter()
        .map(ReferenceBlock::text_with_verse_numbers)
        .collect::<Vec<_>>()
        .join(" + ")
}

impl fmt::Display for BlockMatchup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.correlated_blocks {
            let status = if block.matches_reference_text { '=' } else { '~' };
            let line = format!(
                "{status} {}: {} => {}",
                block.character_id,
                block.text_with_verse_numbers().trim_end(),
                reference_column(block)
            );
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}
