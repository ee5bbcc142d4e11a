//! Verse-range grouping of vernacular and reference blocks.
//!
//! All ranges here are in vernacular numbering: every reference block is
//! given the span of vernacular verses its own verses map onto.

use std::ops::Range;

use crate::error::{AlignmentIssue, AlignmentReport};
use crate::models::{Block, BlockElement, BookScript};
use crate::versification::{VerseRef, Versification, VersificationMapping};

pub(crate) type Span = (VerseRef, VerseRef);

fn span_of(spans: impl Iterator<Item = Span>) -> Option<Span> {
    spans.fold(None, |acc, (lo, hi)| match acc {
        None => Some((lo, hi)),
        Some((a, b)) => Some((a.min(lo), b.max(hi))),
    })
}

/// A per-call working copy of one reference book.
///
/// Splits happen here and never reach the canonical reference text.
pub(crate) struct WorkingReference<'a> {
    blocks: Vec<Block>,
    spans: Vec<Option<Span>>,
    consumed: Vec<bool>,
    book_id: String,
    reference_versification: Versification,
    vernacular_versification: Versification,
    mapping: &'a dyn VersificationMapping,
}

impl<'a> WorkingReference<'a> {
    pub fn new(
        reference: &BookScript,
        vernacular_versification: &Versification,
        mapping: &'a dyn VersificationMapping,
    ) -> Self {
        let mut work = Self {
            blocks: reference.blocks().to_vec(),
            spans: Vec::new(),
            consumed: vec![false; reference.len()],
            book_id: reference.book_id.clone(),
            reference_versification: reference.versification.clone(),
            vernacular_versification: vernacular_versification.clone(),
            mapping,
        };
        work.spans = work.blocks.iter().map(|b| work.span_for(b)).collect();
        work
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn span(&self, index: usize) -> Option<Span> {
        self.spans.get(index).copied().flatten()
    }

    fn to_vernacular(&self, verse: VerseRef) -> Vec<VerseRef> {
        self.mapping.resolve(
            &self.book_id,
            verse,
            &self.reference_versification,
            &self.vernacular_versification,
        )
    }

    fn to_reference(&self, verse: VerseRef) -> Vec<VerseRef> {
        self.mapping.resolve(
            &self.book_id,
            verse,
            &self.vernacular_versification,
            &self.reference_versification,
        )
    }

    /// Vernacular verses covered by a reference block, or `None` for
    /// non-scripture and for blocks whose verses map to nothing.
    pub fn span_for(&self, block: &Block) -> Option<Span> {
        if !block.is_scripture() {
            return None;
        }
        span_of(
            block
                .verses()
                .flat_map(|v| self.to_vernacular(v))
                .map(|v| (v, v)),
        )
    }

    fn first_vernacular(&self, chapter: u32, verse: u32) -> Option<VerseRef> {
        self.to_vernacular(VerseRef::new(chapter, verse)).into_iter().min()
    }

    pub fn consume(&mut self, indices: &[usize]) {
        for &i in indices {
            if let Some(flag) = self.consumed.get_mut(i) {
                *flag = true;
            }
        }
    }

    /// Unconsumed scripture blocks overlapping `lo..=hi`, widened to a
    /// contiguous run that ends at a clean reference verse break.
    pub fn gather(&self, lo: VerseRef, hi: VerseRef) -> Vec<usize> {
        let hits: Vec<usize> = (0..self.blocks.len())
            .filter(|&i| !self.consumed[i] && self.span(i).is_some_and(|(a, b)| a <= hi && b >= lo))
            .collect();
        let (Some(&first), Some(&last)) = (hits.first(), hits.last()) else {
            return hits;
        };
        let mut out: Vec<usize> = (first..=last)
            .filter(|&i| {
                !self.consumed[i]
                    && self.blocks[i].is_scripture()
                    && (hits.contains(&i) || self.spans[i].is_none())
            })
            .collect();
        let chapter = self.blocks[last].chapter_number;
        let mut next = last + 1;
        while let Some(block) = self.blocks.get(next) {
            if self.consumed[next]
                || !block.is_scripture()
                || block.starts_at_verse_break()
                || block.chapter_number != chapter
            {
                break;
            }
            out.push(next);
            next += 1;
        }
        out
    }

    pub fn span_of_all(&self, indices: &[usize]) -> Option<Span> {
        span_of(indices.iter().filter_map(|&i| self.span(i)))
    }

    fn split(&mut self, index: usize, reference_verse: u32) -> bool {
        let Some(piece) = self.blocks[index].split_at_verse(reference_verse) else {
            return false;
        };
        let piece_span = self.span_for(&piece);
        self.blocks.insert(index + 1, piece);
        self.spans.insert(index + 1, piece_span);
        self.consumed.insert(index + 1, false);
        self.spans[index] = self.span_for(&self.blocks[index]);
        log::debug!(
            "{}: split reference block {index} at verse {reference_verse}",
            self.book_id
        );
        true
    }

    /// Interior verse markers of a block with the first vernacular verse
    /// each maps onto.
    fn interior_markers(&self, block: &Block) -> Vec<(u32, VerseRef)> {
        block
            .elements
            .iter()
            .skip(1)
            .filter_map(|e| match e {
                BlockElement::Verse { start, .. } => Some(*start),
                _ => None,
            })
            .filter(|start| *start != block.initial_start_verse)
            .filter_map(|start| {
                self.first_vernacular(block.chapter_number, start)
                    .map(|v| (start, v))
            })
            .collect()
    }

    /// Split the gathered block straddling the end of `hi` so that the part
    /// mapping past it falls outside.
    pub fn split_after(&mut self, indices: &[usize], hi: VerseRef) -> bool {
        for &i in indices {
            let Some((lo_i, hi_i)) = self.span(i) else { continue };
            if !(lo_i <= hi && hi < hi_i) {
                continue;
            }
            let marker = self
                .interior_markers(&self.blocks[i])
                .into_iter()
                .find(|(_, v)| *v > hi);
            if let Some((verse, _)) = marker {
                return self.split(i, verse);
            }
        }
        false
    }

    /// Split the gathered block straddling the start of `lo` so that the
    /// part mapping before it falls outside.
    pub fn split_before(&mut self, indices: &[usize], lo: VerseRef) -> bool {
        for &i in indices {
            let Some((lo_i, hi_i)) = self.span(i) else { continue };
            if !(lo_i < lo && lo <= hi_i) {
                continue;
            }
            let marker = self
                .interior_markers(&self.blocks[i])
                .into_iter()
                .find(|(_, v)| *v >= lo);
            if let Some((verse, _)) = marker {
                return self.split(i, verse);
            }
        }
        false
    }

    /// Split a clone of a reference block where vernacular `verse` begins.
    pub fn split_at_vernacular(&self, block: &mut Block, verse: VerseRef) -> Option<Block> {
        let (reference_verse, _) = self
            .interior_markers(block)
            .into_iter()
            .find(|(_, v)| *v == verse)?;
        block.split_at_verse(reference_verse)
    }

    pub fn chapter_announcement(&self, vernacular_chapter: u32) -> Option<usize> {
        let chapter = self
            .to_reference(VerseRef::new(vernacular_chapter, 1))
            .into_iter()
            .min()
            .map_or(vernacular_chapter, |v| v.chapter);
        (0..self.blocks.len())
            .find(|&i| {
                !self.consumed[i]
                    && self.blocks[i].is_chapter_announcement()
                    && self.blocks[i].chapter_number == chapter
            })
    }

    /// Position of a reference heading: the last vernacular verse of the
    /// scripture before it in its chapter, or verse 0 of the chapter.
    fn heading_position(&self, index: usize) -> VerseRef {
        let heading = &self.blocks[index];
        let previous = (0..index)
            .rev()
            .find(|&j| self.blocks[j].is_scripture())
            .filter(|&j| self.blocks[j].chapter_number == heading.chapter_number);
        match previous.and_then(|j| self.span(j)) {
            Some((_, hi)) => hi,
            None => {
                let chapter = self
                    .first_vernacular(heading.chapter_number, 1)
                    .map_or(heading.chapter_number, |v| v.chapter);
                VerseRef::new(chapter, 0)
            }
        }
    }

    pub fn heading_after(&self, after: VerseRef) -> Option<usize> {
        (0..self.blocks.len()).find(|&i| {
            let block = &self.blocks[i];
            !self.consumed[i]
                && !block.is_scripture()
                && !block.is_chapter_announcement()
                && self.heading_position(i) == after
        })
    }

    /// Runs of mappable scripture blocks nothing consumed.
    pub fn unused_issues(&self) -> Vec<AlignmentIssue> {
        let mut issues = Vec::new();
        let mut run: Option<(VerseRef, usize)> = None;
        for i in 0..self.blocks.len() {
            let unused = !self.consumed[i] && self.blocks[i].is_scripture();
            match (unused, self.span(i), run.as_mut()) {
                (true, Some(_), Some((_, count))) => *count += 1,
                (true, Some((lo, _)), None) => run = Some((lo, 1)),
                (true, None, _) => {}
                (false, _, _) => {
                    if let Some((first, count)) = run.take() {
                        issues.push(self.unused(first, count));
                    }
                }
            }
        }
        if let Some((first, count)) = run {
            issues.push(self.unused(first, count));
        }
        issues
    }

    fn unused(&self, first: VerseRef, count: usize) -> AlignmentIssue {
        AlignmentIssue::UnusedReferenceBlocks {
            book_id: self.book_id.clone(),
            first,
            count,
        }
    }
}

/// A vernacular block range and the reference blocks that cover it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Chunk {
    pub vernacular: Range<usize>,
    pub reference: Vec<usize>,
}

/// End (exclusive) of the run starting at `from` that continues its verse.
pub(crate) fn clean_end(blocks: &[Block], from: usize) -> usize {
    let chapter = blocks[from].chapter_number;
    let mut end = from + 1;
    while let Some(block) = blocks.get(end) {
        if !block.is_scripture() || block.starts_at_verse_break() || block.chapter_number != chapter {
            break;
        }
        end += 1;
    }
    end
}

/// Walk back from `index` to the block where its verse begins.
pub(crate) fn clean_start(blocks: &[Block], index: usize, floor: usize) -> usize {
    let mut start = index;
    while start > floor
        && !blocks[start].starts_at_verse_break()
        && blocks[start - 1].is_scripture()
        && blocks[start - 1].chapter_number == blocks[start].chapter_number
    {
        start -= 1;
    }
    start
}

fn verse_span(blocks: &[Block]) -> Span {
    let lo = blocks[0].initial_verse();
    let hi = blocks.iter().map(Block::last_verse).max().unwrap_or(lo);
    (lo, hi)
}

fn extend_end(blocks: &[Block], end: usize, target: VerseRef) -> usize {
    let mut end = end;
    while let Some(block) = blocks.get(end) {
        if !block.is_scripture() || block.initial_verse() > target {
            break;
        }
        end = clean_end(blocks, end);
    }
    end
}

fn extend_start(blocks: &[Block], start: usize, floor: usize, target: VerseRef) -> usize {
    let mut start = start;
    while start > floor {
        let previous = &blocks[start - 1];
        if !previous.is_scripture() || previous.last_verse() < target {
            break;
        }
        start -= 1;
    }
    clean_start(blocks, start, floor)
}

fn next_verse(verse: VerseRef) -> VerseRef {
    VerseRef::new(verse.chapter, verse.verse + 1)
}

/// Grow a vernacular range starting at `start` and the reference blocks
/// overlapping it until neither side reaches past the other. Never moves
/// the start before `floor`.
pub(crate) fn build_chunk(
    blocks: &[Block],
    start: usize,
    floor: usize,
    work: &mut WorkingReference<'_>,
    allow_splitting: bool,
    report: &mut AlignmentReport,
) -> Chunk {
    let mut start = start;
    let mut end = clean_end(blocks, start);
    // Every round either splits a reference block or grows the range.
    let mut rounds = blocks.len() + work.blocks().len() * 2 + 2;
    loop {
        let (lo, hi) = verse_span(&blocks[start..end]);
        let reference = work.gather(lo, hi);
        let Some((ref_lo, ref_hi)) = work.span_of_all(&reference) else {
            return Chunk {
                vernacular: start..end,
                reference,
            };
        };

        let mut changed = false;
        if ref_hi > hi {
            if allow_splitting && work.split_after(&reference, hi) {
                changed = true;
            } else {
                let grown = extend_end(blocks, end, ref_hi);
                if grown > end {
                    end = grown;
                    changed = true;
                } else {
                    report.push(AlignmentIssue::HoleSpansReferenceBlock {
                        book_id: work.book_id.clone(),
                        verse: hi,
                        missing: next_verse(hi),
                    });
                }
            }
        }
        if !changed && ref_lo < lo {
            let grown = extend_start(blocks, start, floor, ref_lo);
            if grown < start {
                start = grown;
                changed = true;
            } else if allow_splitting && work.split_before(&reference, lo) {
                changed = true;
            } else {
                report.push(AlignmentIssue::HoleSpansReferenceBlock {
                    book_id: work.book_id.clone(),
                    verse: lo,
                    missing: VerseRef::new(lo.chapter, lo.verse.saturating_sub(1)),
                });
            }
        }

        rounds = rounds.saturating_sub(1);
        if !changed || rounds == 0 {
            return Chunk {
                vernacular: start..end,
                reference,
            };
        }
    }
}
