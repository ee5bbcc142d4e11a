use std::fmt;

use crate::versification::VerseRef;

/// Programmer errors: fatal to the call that produced them, never retried.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AlignError {
    #[error("Block index {index} out of range (book has {len} blocks)")]
    BlockIndexOutOfRange { index: usize, len: usize },
    #[error("Correlated block index {index} out of range (matchup has {len} blocks)")]
    CorrelatedIndexOutOfRange { index: usize, len: usize },
    #[error("Unknown book: {0}")]
    UnknownBook(String),
    #[error("Matchup belongs to book {expected} but was applied to {actual}")]
    BookMismatch { expected: String, actual: String },
    #[error("Blocks {start}..{end} changed since the matchup was created")]
    StaleMatchup { start: usize, end: usize },
    #[error("Cannot split block {index} at verse {verse}, offset {offset}: {reason}")]
    InvalidSplit {
        index: usize,
        verse: u32,
        offset: usize,
        #[source]
        reason: SplitError,
    },
    #[error("Cannot merge block {index}: {reason}")]
    InvalidMerge { index: usize, reason: &'static str },
    #[error("Invalid verse number: {0}")]
    InvalidVerseNumber(String),
}

/// Why a block cannot be split at a given verse and offset.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
pub enum SplitError {
    #[error("verse not in block")]
    VerseNotInBlock,
    #[error("cannot split at the start of the block")]
    AtBlockStart,
    #[error("nothing left to split off")]
    NothingLeft,
    #[error("offset beyond end of verse")]
    BeyondVerse,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid character id: {0:?}")]
pub struct ParseCharacterIdError(pub String);

/// Survivable anomalies found while aligning a book. Processing continues
/// past every one of these with best-effort attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignmentIssue {
    /// A vernacular verse is missing and the gap falls inside one reference block.
    HoleSpansReferenceBlock {
        book_id: String,
        verse: VerseRef,
        missing: VerseRef,
    },
    /// Reference blocks with a vernacular counterpart verse were never attached.
    UnusedReferenceBlocks {
        book_id: String,
        first: VerseRef,
        count: usize,
    },
    /// A vernacular heading found no reference heading at the same position.
    UnmatchedHeading { book_id: String, after: VerseRef },
}

impl fmt::Display for AlignmentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignmentIssue::HoleSpansReferenceBlock {
                book_id,
                verse,
                missing,
            } => write!(
                f,
                "{book_id} {verse}: vernacular verse {missing} is missing inside a reference block"
            ),
            AlignmentIssue::UnusedReferenceBlocks {
                book_id,
                first,
                count,
            } => write!(
                f,
                "{book_id} {first}: {count} reference block(s) not attached to any vernacular block"
            ),
            AlignmentIssue::UnmatchedHeading { book_id, after } => {
                write!(f, "{book_id}: heading after {after} has no reference heading")
            }
        }
    }
}

/// Non-fatal results of a batch alignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignmentReport {
    pub issues: Vec<AlignmentIssue>,
    /// Vernacular blocks marked as matching the reference text.
    pub matched_blocks: usize,
    /// Vernacular scripture blocks left correlated but unmatched.
    pub unmatched_blocks: usize,
    /// Blocks added to the vernacular book by splitting.
    pub blocks_added_by_splitting: usize,
}

impl AlignmentReport {
    pub(crate) fn push(&mut self, issue: AlignmentIssue) {
        log::warn!("{issue}");
        self.issues.push(issue);
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}
