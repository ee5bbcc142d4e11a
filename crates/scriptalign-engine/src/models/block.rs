use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AlignError, SplitError};
use crate::models::character::{CharacterId, StandardRole};
use crate::versification::VerseRef;

/// `SplitId` of a block that was never split.
pub const UNSPLIT: i32 = -1;

/// Whether a block continues a quotation begun in an earlier block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MultiBlockQuote {
    #[default]
    None,
    Start,
    Continuation,
    ChangeOfDelivery,
}

impl MultiBlockQuote {
    pub fn is_continuer(self) -> bool {
        matches!(
            self,
            MultiBlockQuote::Continuation | MultiBlockQuote::ChangeOfDelivery
        )
    }
}

/// One piece of a block's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockElement {
    /// Verse number marker; `end == start` unless it marks a bridge.
    Verse { start: u32, end: u32 },
    Text(String),
    Sound { effect: String },
}

fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"\{(?:(\d+)(?:-(\d+))?|SFX:([^}]*))\}").expect("Invalid marker regex")
    })
}

impl BlockElement {
    pub fn verse(number: u32) -> Self {
        BlockElement::Verse {
            start: number,
            end: number,
        }
    }

    pub fn bridge(start: u32, end: u32) -> Self {
        BlockElement::Verse { start, end }
    }

    pub fn text(text: impl Into<String>) -> Self {
        BlockElement::Text(text.into())
    }

    /// Parse `{1}`, `{2-3}` and `{SFX:name}` markers; everything else is text.
    pub fn parse_marked_text(marked: &str) -> Result<Vec<BlockElement>, AlignError> {
        let mut elements = Vec::new();
        let mut last = 0;
        for caps in marker_regex().captures_iter(marked) {
            let Some(whole) = caps.get(0) else { continue };
            if whole.start() > last {
                elements.push(BlockElement::text(&marked[last..whole.start()]));
            }
            last = whole.end();

            if let Some(effect) = caps.get(3) {
                elements.push(BlockElement::Sound {
                    effect: effect.as_str().to_string(),
                });
                continue;
            }
            let start = parse_verse_number(caps.get(1).map(|m| m.as_str()), whole.as_str())?;
            let end = match caps.get(2) {
                Some(m) => parse_verse_number(Some(m.as_str()), whole.as_str())?,
                None => start,
            };
            if end < start {
                return Err(AlignError::InvalidVerseNumber(whole.as_str().to_string()));
            }
            elements.push(BlockElement::Verse { start, end });
        }
        if last < marked.len() {
            elements.push(BlockElement::text(&marked[last..]));
        }
        Ok(elements)
    }

    fn render(&self, out: &mut String) {
        match self {
            BlockElement::Verse { start, end } if start == end => {
                out.push_str(&format!("{{{start}}}"));
            }
            BlockElement::Verse { start, end } => out.push_str(&format!("{{{start}-{end}}}")),
            BlockElement::Text(text) => out.push_str(text),
            BlockElement::Sound { effect } => out.push_str(&format!("{{SFX:{effect}}}")),
        }
    }
}

fn parse_verse_number(digits: Option<&str>, marker: &str) -> Result<u32, AlignError> {
    digits
        .and_then(|d| d.parse().ok())
        .ok_or_else(|| AlignError::InvalidVerseNumber(marker.to_string()))
}

pub(crate) fn plain_text(elements: &[BlockElement]) -> String {
    elements
        .iter()
        .filter_map(|e| match e {
            BlockElement::Text(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

pub(crate) fn marked_text(elements: &[BlockElement]) -> String {
    let mut out = String::new();
    for element in elements {
        element.render(&mut out);
    }
    out
}

/// Append without separators, joining adjacent text runs.
pub(crate) fn append_elements(target: &mut Vec<BlockElement>, source: &[BlockElement]) {
    for element in source {
        match (target.last_mut(), element) {
            (Some(BlockElement::Text(existing)), BlockElement::Text(more)) => {
                existing.push_str(more)
            }
            _ => target.push(element.clone()),
        }
    }
}

fn is_opener(c: char) -> bool {
    matches!(c, '[' | '(' | '«' | '“' | '‘' | '‹' | '„' | '¿' | '¡')
}

fn is_opener_only(text: &str) -> bool {
    !text.trim().is_empty() && text.chars().all(|c| c.is_whitespace() || is_opener(c))
}

/// Byte index where a run of opening brackets ending `text` begins, if that
/// run stands alone (preceded by whitespace or nothing).
fn trailing_opener_start(text: &str) -> Option<usize> {
    let mut start = text.len();
    for (i, c) in text.char_indices().rev() {
        if is_opener(c) {
            start = i;
        } else {
            break;
        }
    }
    if start == text.len() {
        return None;
    }
    let before = text[..start].chars().next_back();
    match before {
        None => Some(start),
        Some(c) if c.is_whitespace() => Some(start),
        _ => None,
    }
}

/// Reference rendition only carried as the second link of a reference chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryReference {
    pub character_id: CharacterId,
    pub delivery: Option<String>,
    pub elements: Vec<BlockElement>,
}

impl SecondaryReference {
    pub fn text_with_verse_numbers(&self) -> String {
        marked_text(&self.elements)
    }
}

/// A clone of reference content attached to a vernacular block.
///
/// The chain is fixed at two levels: the primary reference and an optional
/// secondary rendition of the same content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceBlock {
    pub chapter_number: u32,
    pub initial_start_verse: u32,
    pub initial_end_verse: u32,
    pub style_tag: String,
    pub character_id: CharacterId,
    pub delivery: Option<String>,
    pub elements: Vec<BlockElement>,
    pub secondary: Option<SecondaryReference>,
}

impl ReferenceBlock {
    /// Clone a block of a reference book, carrying along whatever that block
    /// itself has attached as the secondary link.
    pub fn from_block(block: &Block) -> Self {
        let secondary = if block.reference_blocks.is_empty() {
            None
        } else {
            let mut elements = Vec::new();
            for rb in &block.reference_blocks {
                append_elements(&mut elements, &rb.elements);
            }
            Some(SecondaryReference {
                character_id: block.reference_blocks[0].character_id.clone(),
                delivery: block.reference_blocks[0].delivery.clone(),
                elements,
            })
        };
        Self {
            chapter_number: block.chapter_number,
            initial_start_verse: block.initial_start_verse,
            initial_end_verse: block.initial_end_verse,
            style_tag: block.style_tag.clone(),
            character_id: block.character_id.clone(),
            delivery: block.delivery.clone(),
            elements: block.elements.clone(),
            secondary,
        }
    }

    /// A reference block with no content positioned at `block`.
    pub fn empty_for(block: &Block, character_id: CharacterId) -> Self {
        Self {
            chapter_number: block.chapter_number,
            initial_start_verse: block.initial_start_verse,
            initial_end_verse: block.initial_end_verse,
            style_tag: block.style_tag.clone(),
            character_id,
            delivery: None,
            elements: Vec::new(),
            secondary: None,
        }
    }

    /// Concatenate several reference blocks into one, injecting nothing
    /// between them. Speaker is kept when unanimous, otherwise `preferred`
    /// wins if any piece has it, otherwise the first piece's speaker.
    pub fn combine(blocks: &[ReferenceBlock], preferred: Option<&CharacterId>) -> Option<Self> {
        let first = blocks.first()?;
        let mut combined = first.clone();
        combined.elements.clear();
        combined.secondary = None;

        let mut secondary: Option<SecondaryReference> = None;
        for rb in blocks {
            append_elements(&mut combined.elements, &rb.elements);
            if let Some(sec) = &rb.secondary {
                match &mut secondary {
                    Some(acc) => append_elements(&mut acc.elements, &sec.elements),
                    None => secondary = Some(sec.clone()),
                }
            }
        }
        combined.secondary = secondary;

        let unanimous = blocks.iter().all(|rb| rb.character_id == first.character_id);
        if !unanimous {
            combined.character_id = match preferred {
                Some(p) if blocks.iter().any(|rb| &rb.character_id == p) => p.clone(),
                _ => first.character_id.clone(),
            };
        }
        if !blocks.iter().all(|rb| rb.delivery == first.delivery) {
            combined.delivery = None;
        }
        Some(combined)
    }

    pub fn text(&self) -> String {
        plain_text(&self.elements)
    }

    pub fn text_with_verse_numbers(&self) -> String {
        marked_text(&self.elements)
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Smallest speaker-attributed unit of scripted text.
///
/// The concatenated text runs of `elements` are the block's whole content;
/// splitting and merging never add or drop a character of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub style_tag: String,
    pub chapter_number: u32,
    pub initial_start_verse: u32,
    /// End of the initial verse bridge; 0 when the block starts in a single verse.
    pub initial_end_verse: u32,
    pub elements: Vec<BlockElement>,
    pub character_id: CharacterId,
    /// Overrides `character_id` for rendering only.
    pub character_id_in_script: Option<CharacterId>,
    pub delivery: Option<String>,
    pub multi_block_quote: MultiBlockQuote,
    pub split_id: i32,
    pub user_confirmed: bool,
    pub matches_reference_text: bool,
    pub reference_blocks: Vec<ReferenceBlock>,
}

impl Block {
    pub fn new(style_tag: impl Into<String>, chapter_number: u32, initial_start_verse: u32) -> Self {
        Self {
            style_tag: style_tag.into(),
            chapter_number,
            initial_start_verse,
            initial_end_verse: 0,
            elements: Vec::new(),
            character_id: CharacterId::Unexpected,
            character_id_in_script: None,
            delivery: None,
            multi_block_quote: MultiBlockQuote::None,
            split_id: UNSPLIT,
            user_confirmed: false,
            matches_reference_text: false,
            reference_blocks: Vec::new(),
        }
    }

    /// A scripture paragraph block. When the marked text opens with a verse
    /// marker, that marker sets the initial verse instead of `verse`.
    pub fn scripture(
        chapter_number: u32,
        verse: u32,
        marked: &str,
        character_id: CharacterId,
    ) -> Result<Self, AlignError> {
        let block = Block::new("p", chapter_number, verse)
            .with_character(character_id)
            .with_marked_text(marked)?;
        Ok(block)
    }

    pub fn chapter_announcement(book_id: &str, chapter_number: u32) -> Self {
        Block::new("c", chapter_number, 0)
            .with_character(CharacterId::standard(StandardRole::BookOrChapter, book_id))
            .with_elements(vec![BlockElement::text(chapter_number.to_string())])
    }

    /// A section heading placed after `verse` of `chapter_number`.
    pub fn section_head(book_id: &str, chapter_number: u32, verse: u32, text: &str) -> Self {
        Block::new("s", chapter_number, verse)
            .with_character(CharacterId::standard(StandardRole::ExtraBiblical, book_id))
            .with_elements(vec![BlockElement::text(text)])
    }

    pub fn with_character(mut self, character_id: CharacterId) -> Self {
        self.character_id = character_id;
        self
    }

    pub fn with_delivery(mut self, delivery: impl Into<String>) -> Self {
        self.delivery = Some(delivery.into());
        self
    }

    pub fn with_multi_block_quote(mut self, status: MultiBlockQuote) -> Self {
        self.multi_block_quote = status;
        self
    }

    pub fn with_split_id(mut self, split_id: i32) -> Self {
        self.split_id = split_id;
        self
    }

    pub fn with_elements(mut self, elements: Vec<BlockElement>) -> Self {
        self.elements = elements;
        self.sync_initial_verse();
        self
    }

    pub fn with_marked_text(self, marked: &str) -> Result<Self, AlignError> {
        Ok(self.with_elements(BlockElement::parse_marked_text(marked)?))
    }

    fn sync_initial_verse(&mut self) {
        let lead = self.leading_opener_len();
        if let Some(BlockElement::Verse { start, end }) = self.elements.get(lead) {
            self.initial_start_verse = *start;
            self.initial_end_verse = if end > start { *end } else { 0 };
        }
    }

    pub fn initial_verse(&self) -> VerseRef {
        VerseRef::new(self.chapter_number, self.initial_start_verse)
    }

    fn initial_end(&self) -> u32 {
        self.initial_end_verse.max(self.initial_start_verse)
    }

    /// Last verse number this block touches, bridges included.
    pub fn last_verse_number(&self) -> u32 {
        self.elements
            .iter()
            .rev()
            .find_map(|e| match e {
                BlockElement::Verse { end, .. } => Some(*end),
                _ => None,
            })
            .unwrap_or_else(|| self.initial_end())
            .max(self.initial_end())
    }

    pub fn last_verse(&self) -> VerseRef {
        VerseRef::new(self.chapter_number, self.last_verse_number())
    }

    pub fn covers_verse(&self, verse: u32) -> bool {
        self.initial_start_verse <= verse && verse <= self.last_verse_number()
    }

    /// Every verse number touched, in order.
    pub fn verses(&self) -> impl Iterator<Item = VerseRef> + '_ {
        (self.initial_start_verse..=self.last_verse_number())
            .map(move |v| VerseRef::new(self.chapter_number, v))
    }

    /// Count of leading text elements made only of opening brackets/quotes.
    /// Such a run sits in front of a verse marker without ending the verse
    /// before it.
    fn leading_opener_len(&self) -> usize {
        match (self.elements.first(), self.elements.get(1)) {
            (Some(BlockElement::Text(t)), Some(BlockElement::Verse { .. })) if is_opener_only(t) => 1,
            _ => 0,
        }
    }

    /// Whether the block begins with a verse number (ignoring a leading
    /// bracket such as the one opening an alternate ending).
    pub fn starts_at_verse_break(&self) -> bool {
        matches!(
            self.elements.get(self.leading_opener_len()),
            Some(BlockElement::Verse { .. })
        )
    }

    pub fn is_scripture(&self) -> bool {
        !self.character_id.is_extra_biblical()
    }

    pub fn is_chapter_announcement(&self) -> bool {
        self.style_tag == "c" && self.character_id.role() == Some(StandardRole::BookOrChapter)
    }

    pub fn character_in_script(&self) -> &CharacterId {
        self.character_id_in_script
            .as_ref()
            .unwrap_or(&self.character_id)
    }

    pub fn text(&self) -> String {
        plain_text(&self.elements)
    }

    pub fn text_with_verse_numbers(&self) -> String {
        marked_text(&self.elements)
    }

    /// Number of characters of text content.
    pub fn content_len(&self) -> usize {
        self.elements
            .iter()
            .map(|e| match e {
                BlockElement::Text(t) => t.chars().count(),
                _ => 0,
            })
            .sum()
    }

    pub fn primary_reference_text(&self) -> String {
        self.reference_blocks
            .iter()
            .map(ReferenceBlock::text_with_verse_numbers)
            .collect()
    }

    pub fn secondary_reference_text(&self) -> Option<String> {
        let texts: Vec<String> = self
            .reference_blocks
            .iter()
            .filter_map(|rb| rb.secondary.as_ref())
            .map(SecondaryReference::text_with_verse_numbers)
            .collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }

    pub fn set_matched_reference_block(&mut self, reference: ReferenceBlock) {
        self.reference_blocks = vec![reference];
        self.matches_reference_text = true;
    }

    pub fn set_unmatched_reference_blocks(&mut self, references: Vec<ReferenceBlock>) {
        self.reference_blocks = references;
        self.matches_reference_text = false;
    }

    pub fn clear_reference_blocks(&mut self) {
        self.reference_blocks.clear();
        self.matches_reference_text = false;
    }

    /// Split off everything from the marker of `verse` onward. `None` when
    /// the block has no such interior marker.
    pub fn split_at_verse(&mut self, verse: u32) -> Option<Block> {
        let lead = self.leading_opener_len();
        let index = self.elements.iter().enumerate().position(|(i, e)| {
            i > lead && matches!(e, BlockElement::Verse { start, .. } if *start == verse)
        })?;
        Some(self.split_before(index, 0))
    }

    /// Split `char_offset` characters into the text of `verse`. An offset of
    /// zero splits at the verse marker itself.
    pub fn split_at_offset(&mut self, verse: u32, char_offset: usize) -> Result<Block, SplitError> {
        let lead = self.leading_opener_len();
        let marker = self.elements.iter().position(
            |e| matches!(e, BlockElement::Verse { start, .. } if *start == verse),
        );
        let segment_start = match marker {
            Some(k) => k + 1,
            None if verse == self.initial_start_verse => 0,
            None => return Err(SplitError::VerseNotInBlock),
        };
        let segment_end = self.elements[segment_start..]
            .iter()
            .position(|e| matches!(e, BlockElement::Verse { .. }))
            .map_or(self.elements.len(), |p| segment_start + p);

        if char_offset == 0 {
            return match marker {
                Some(k) if k > lead => Ok(self.split_before(k, 0)),
                _ => Err(SplitError::AtBlockStart),
            };
        }

        let mut remaining = char_offset;
        for i in segment_start..segment_end {
            let BlockElement::Text(text) = &self.elements[i] else {
                continue;
            };
            let len = text.chars().count();
            if remaining < len {
                return Ok(self.split_before(i, remaining));
            }
            if remaining == len {
                if i + 1 >= self.elements.len() {
                    return Err(SplitError::NothingLeft);
                }
                return Ok(self.split_before(i + 1, 0));
            }
            remaining -= len;
        }
        Err(SplitError::BeyondVerse)
    }

    /// Split before element `index`, or inside it when `char_offset > 0`.
    /// The new block gets a copy of the attribution and no reference blocks;
    /// the head keeps any it had but no longer counts as matched.
    fn split_before(&mut self, index: usize, char_offset: usize) -> Block {
        let (mut verse_start, mut verse_end) = (self.initial_start_verse, self.initial_end_verse);
        for e in &self.elements[..index] {
            if let BlockElement::Verse { start, end } = e {
                verse_start = *start;
                verse_end = if end > start { *end } else { 0 };
            }
        }

        let mut tail = Vec::new();
        if char_offset > 0 {
            if let Some(BlockElement::Text(text)) = self.elements.get_mut(index) {
                let byte = text
                    .char_indices()
                    .nth(char_offset)
                    .map_or(text.len(), |(b, _)| b);
                tail.push(BlockElement::Text(text.split_off(byte)));
            }
            tail.extend(self.elements.drain(index + 1..));
        } else {
            tail.extend(self.elements.drain(index..));
        }

        if let Some(BlockElement::Verse { start, end }) = tail.first() {
            verse_start = *start;
            verse_end = if end > start { *end } else { 0 };
            self.move_trailing_opener(&mut tail);
        }

        let mut piece = Block::new(self.style_tag.clone(), self.chapter_number, verse_start);
        piece.initial_end_verse = verse_end;
        piece.elements = tail;
        piece.character_id = self.character_id.clone();
        piece.character_id_in_script = self.character_id_in_script.clone();
        piece.delivery = self.delivery.clone();
        piece.multi_block_quote = match self.multi_block_quote {
            MultiBlockQuote::None => MultiBlockQuote::None,
            _ => MultiBlockQuote::Continuation,
        };
        piece.split_id = self.split_id;
        piece.user_confirmed = self.user_confirmed;
        self.matches_reference_text = false;
        piece
    }

    /// An opening bracket left dangling at the end of the head belongs to
    /// the verse that follows it.
    fn move_trailing_opener(&mut self, tail: &mut Vec<BlockElement>) {
        let head_len = self.elements.len();
        let Some(BlockElement::Text(text)) = self.elements.last_mut() else {
            return;
        };
        let Some(start) = trailing_opener_start(text) else {
            return;
        };
        if start == 0 && head_len == 1 {
            return;
        }
        let opener = text.split_off(start);
        if text.is_empty() {
            self.elements.pop();
        }
        tail.insert(0, BlockElement::Text(opener));
    }

    /// Append `next` to this block. Reference blocks are concatenated; the
    /// result only matches when both halves did.
    pub fn merge_following(&mut self, next: Block) {
        append_elements(&mut self.elements, &next.elements);
        let both_matched = self.matches_reference_text && next.matches_reference_text;
        let mut references = std::mem::take(&mut self.reference_blocks);
        references.extend(next.reference_blocks);
        if both_matched {
            let combined = ReferenceBlock::combine(&references, Some(&self.character_id));
            self.reference_blocks = combined.into_iter().collect();
        } else {
            self.reference_blocks = references;
        }
        self.matches_reference_text = both_matched;
    }
}
