use serde::{Deserialize, Serialize};

use crate::characters::CharacterVerseLookup;
use crate::error::{AlignError, AlignmentIssue, AlignmentReport};
use crate::models::{Block, BookScript, ReferenceBlock};
use crate::versification::{Versification, VersificationMapping};

use super::chunk::{WorkingReference, build_chunk, clean_start};
use super::matchup::BlockMatchup;
use super::passes::MatchContext;
use super::reporting_clause::ReportingClauses;

/// Caller-tunable switches for one alignment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentOptions {
    /// Known vernacular reporting clauses; empty means harvest them from
    /// the book being aligned.
    pub reporting_clauses: Vec<String>,
    pub allow_splitting: bool,
    pub apply_narrator_overrides: bool,
}

impl Default for AlignmentOptions {
    fn default() -> Self {
        Self {
            reporting_clauses: Vec::new(),
            allow_splitting: true,
            apply_narrator_overrides: false,
        }
    }
}

/// External collaborators consulted while aligning.
#[derive(Clone, Copy)]
pub struct AlignmentServices<'a> {
    pub mapping: &'a dyn VersificationMapping,
    pub characters: Option<&'a dyn CharacterVerseLookup>,
}

impl<'a> AlignmentServices<'a> {
    pub fn new(mapping: &'a dyn VersificationMapping) -> Self {
        Self {
            mapping,
            characters: None,
        }
    }

    pub fn with_characters(mut self, characters: &'a dyn CharacterVerseLookup) -> Self {
        self.characters = Some(characters);
        self
    }
}

/// Aligns vernacular books against one reference book.
pub(crate) struct Aligner<'a> {
    reference: &'a BookScript,
    services: AlignmentServices<'a>,
    reference_clauses: ReportingClauses,
    allow_splitting: bool,
}

fn vernacular_clauses(book: &BookScript, known: &[String]) -> ReportingClauses {
    if known.is_empty() {
        ReportingClauses::synthesize(book)
    } else {
        ReportingClauses::new(known)
    }
}

/// Copy of a non-scripture block correlated with its reference counterpart.
fn correlate_non_scripture(block: &Block, reference: Option<&Block>) -> Block {
    let mut block = block.clone();
    match reference {
        Some(reference) => block.set_matched_reference_block(ReferenceBlock::from_block(reference)),
        None => block.clear_reference_blocks(),
    }
    block
}

impl<'a> Aligner<'a> {
    pub fn new(reference: &'a BookScript, services: AlignmentServices<'a>, allow_splitting: bool) -> Self {
        Self {
            reference,
            services,
            reference_clauses: ReportingClauses::synthesize(reference),
            allow_splitting,
        }
    }

    fn context<'c>(
        &'c self,
        book_id: &'c str,
        versification: &'c Versification,
        book: &BookScript,
        clauses: &'c ReportingClauses,
    ) -> MatchContext<'c> {
        MatchContext {
            book_id,
            versification,
            narrator: book.narrator(),
            vernacular_clauses: clauses,
            reference_clauses: &self.reference_clauses,
            single_voice: book.single_voice,
            characters: self.services.characters,
        }
    }

    /// Chapter announcements pair by chapter; headings by the verse they follow.
    fn non_scripture_reference(
        &self,
        book: &BookScript,
        index: usize,
        work: &WorkingReference<'_>,
    ) -> Option<usize> {
        let block = &book.blocks()[index];
        if block.is_chapter_announcement() {
            work.chapter_announcement(block.chapter_number)
        } else {
            work.heading_after(book.verse_before(index))
        }
    }

    /// Align the whole book in one pass, committing as it goes.
    pub fn apply_to(&self, book: &mut BookScript, known_clauses: &[String]) -> AlignmentReport {
        let clauses = vernacular_clauses(book, known_clauses);
        let book_id = book.book_id.clone();
        let versification = book.versification.clone();
        let mut work = WorkingReference::new(self.reference, &versification, self.services.mapping);
        let mut report = AlignmentReport::default();

        let mut i = 0;
        while i < book.len() {
            if !book.blocks()[i].is_scripture() {
                let found = self.non_scripture_reference(book, i, &work);
                let block = &book.blocks()[i];
                if found.is_none() && !block.is_chapter_announcement() {
                    report.push(AlignmentIssue::UnmatchedHeading {
                        book_id: book_id.clone(),
                        after: book.verse_before(i),
                    });
                }
                let correlated = correlate_non_scripture(block, found.map(|j| &work.blocks()[j]));
                book.blocks_mut()[i] = correlated;
                if let Some(j) = found {
                    work.consume(&[j]);
                }
                i += 1;
                continue;
            }

            let chunk = build_chunk(book.blocks(), i, i, &mut work, self.allow_splitting, &mut report);
            let confirmed = book.blocks()[chunk.vernacular.clone()]
                .iter()
                .all(|b| b.user_confirmed && b.matches_reference_text);
            if confirmed {
                log::debug!("{book_id}: blocks {:?} confirmed, left as they are", chunk.vernacular);
                work.consume(&chunk.reference);
                i = chunk.vernacular.end;
                continue;
            }

            let ctx = self.context(&book_id, &versification, book, &clauses);
            let mut matchup = BlockMatchup::build(book, &chunk, i, &work, &ctx, self.allow_splitting);
            work.consume(&chunk.reference);
            report.blocks_added_by_splitting += matchup.count_of_blocks_added_by_splitting();
            let len = matchup.correlated_blocks().len();
            matchup.commit(book);
            i = chunk.vernacular.start + len;
        }

        for issue in work.unused_issues() {
            report.push(issue);
        }
        report.matched_blocks = book.blocks().iter().filter(|b| b.matches_reference_text).count();
        report.unmatched_blocks = book
            .script_blocks()
            .filter(|b| !b.matches_reference_text)
            .count();
        log::info!(
            "{book_id}: {} block(s) matched, {} unmatched, {} added by splitting",
            report.matched_blocks,
            report.unmatched_blocks,
            report.blocks_added_by_splitting
        );
        report
    }

    /// Matchup for the verse containing block `index`, not yet applied.
    pub fn matchup_for(
        &self,
        book: &BookScript,
        index: usize,
        known_clauses: &[String],
    ) -> Result<BlockMatchup, AlignError> {
        let block = book.block(index)?;
        let mut work = WorkingReference::new(self.reference, &book.versification, self.services.mapping);
        if !block.is_scripture() {
            let found = self.non_scripture_reference(book, index, &work);
            let correlated = correlate_non_scripture(block, found.map(|j| &work.blocks()[j]));
            return Ok(BlockMatchup::single(book, index, correlated));
        }

        let clauses = vernacular_clauses(book, known_clauses);
        let start = clean_start(book.blocks(), index, 0);
        let mut report = AlignmentReport::default();
        let chunk = build_chunk(book.blocks(), start, 0, &mut work, self.allow_splitting, &mut report);
        let ctx = self.context(&book.book_id, &book.versification, book, &clauses);
        let matchup = BlockMatchup::build(book, &chunk, index, &work, &ctx, self.allow_splitting);
        Ok(matchup.with_issues(report.issues))
    }
}
