use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::AlignError;
use crate::models::block::{Block, UNSPLIT};
use crate::models::character::CharacterId;
use crate::quotes;
use crate::versification::{VerseRef, Versification};

/// The scripted content of one book: an ordered sequence of blocks.
///
/// Blocks are verse-monotonic except where a versification mapping has
/// legitimately moved content across a chapter boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookScript {
    pub book_id: String,
    pub versification: Versification,
    /// Whole book is performed by one voice; only content has to line up.
    pub single_voice: bool,
    blocks: Vec<Block>,
}

impl BookScript {
    pub fn new(book_id: impl Into<String>, versification: Versification, blocks: Vec<Block>) -> Self {
        Self {
            book_id: book_id.into(),
            versification,
            single_voice: false,
            blocks,
        }
    }

    pub fn with_single_voice(mut self, single_voice: bool) -> Self {
        self.single_voice = single_voice;
        self
    }

    pub fn narrator(&self) -> CharacterId {
        CharacterId::narrator(self.book_id.as_str())
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Mutable access for collaborators that edit attribution in place.
    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, index: usize) -> Result<&Block, AlignError> {
        self.blocks.get(index).ok_or(AlignError::BlockIndexOutOfRange {
            index,
            len: self.blocks.len(),
        })
    }

    pub fn script_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(|b| b.is_scripture())
    }

    /// Indices of every scripture block touching `chapter:verse`.
    pub fn blocks_for_verse(&self, chapter: u32, verse: u32) -> Vec<usize> {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_scripture() && b.chapter_number == chapter && b.covers_verse(verse))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn first_block_for_verse(&self, chapter: u32, verse: u32) -> Option<usize> {
        self.blocks_for_verse(chapter, verse).into_iter().next()
    }

    /// Last verse of the scripture preceding `index`, or verse 0 of the
    /// chapter when nothing precedes it in that chapter.
    pub fn verse_before(&self, index: usize) -> VerseRef {
        let chapter = self.blocks.get(index).map_or(0, |b| b.chapter_number);
        self.blocks[..index.min(self.blocks.len())]
            .iter()
            .rev()
            .find(|b| b.is_scripture())
            .filter(|b| b.chapter_number == chapter)
            .map(Block::last_verse)
            .unwrap_or(VerseRef::new(chapter, 0))
    }

    pub fn next_split_id(&self) -> i32 {
        self.blocks
            .iter()
            .map(|b| b.split_id)
            .max()
            .map_or(0, |max| (max + 1).max(0))
    }

    /// Split block `index` at `char_offset` characters into the text of
    /// `verse`, returning the index of the new block. Both pieces share a
    /// split id.
    pub fn split_block(&mut self, index: usize, verse: u32, char_offset: usize) -> Result<usize, AlignError> {
        let next_id = self.next_split_id();
        let len = self.blocks.len();
        let block = self
            .blocks
            .get_mut(index)
            .ok_or(AlignError::BlockIndexOutOfRange { index, len })?;
        let mut piece = block
            .split_at_offset(verse, char_offset)
            .map_err(|reason| AlignError::InvalidSplit {
                index,
                verse,
                offset: char_offset,
                reason,
            })?;
        if block.split_id == UNSPLIT {
            block.split_id = next_id;
        }
        piece.split_id = block.split_id;
        self.blocks.insert(index + 1, piece);
        Ok(index + 1)
    }

    /// Rejoin block `index` with the following piece of the same split.
    pub fn merge_with_following(&mut self, index: usize) -> Result<(), AlignError> {
        if index + 1 >= self.blocks.len() {
            return Err(AlignError::BlockIndexOutOfRange {
                index: index + 1,
                len: self.blocks.len(),
            });
        }
        let (first, second) = (&self.blocks[index], &self.blocks[index + 1]);
        if first.split_id == UNSPLIT || first.split_id != second.split_id {
            return Err(AlignError::InvalidMerge {
                index,
                reason: "blocks are not pieces of the same split",
            });
        }
        let next = self.blocks.remove(index + 1);
        let tail_status = next.multi_block_quote;
        self.blocks[index].merge_following(next);
        let continued = self
            .blocks
            .get(index + 1)
            .is_some_and(|b| b.multi_block_quote.is_continuer());
        let merged = &mut self.blocks[index];
        merged.multi_block_quote = quotes::merged_status(merged.multi_block_quote, tail_status, continued);
        let split_id = self.blocks[index].split_id;
        if self.blocks.iter().filter(|b| b.split_id == split_id).count() == 1 {
            self.blocks[index].split_id = UNSPLIT;
        }
        Ok(())
    }

    pub(crate) fn replace_range(&mut self, range: Range<usize>, blocks: Vec<Block>) {
        self.blocks.splice(range, blocks);
    }
}
