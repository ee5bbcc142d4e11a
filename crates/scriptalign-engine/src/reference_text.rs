use serde::{Deserialize, Serialize};

use crate::error::{AlignError, AlignmentReport};
use crate::matching::{Aligner, AlignmentOptions, AlignmentServices, BlockMatchup};
use crate::models::BookScript;
use crate::narrator_overrides::NarratorOverrides;
use crate::versification::{Versification, VersificationMapping};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceTextKind {
    /// A rendition shipped with the application, e.g. "English".
    Standard(String),
    /// A project-specific rendition.
    Custom(String),
}

/// A reference rendition the vernacular is aligned against.
///
/// Alignment never mutates a `ReferenceText`: every call works on its own
/// copy of the reference book, so splits made for one vernacular book are
/// not seen by the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceText {
    kind: ReferenceTextKind,
    versification: Versification,
    books: Vec<BookScript>,
    secondary: Option<Box<ReferenceText>>,
    narrator_overrides: NarratorOverrides,
}

impl ReferenceText {
    pub fn new(kind: ReferenceTextKind, versification: Versification, books: Vec<BookScript>) -> Self {
        Self {
            kind,
            versification,
            books,
            secondary: None,
            narrator_overrides: NarratorOverrides::default(),
        }
    }

    pub fn with_narrator_overrides(mut self, overrides: NarratorOverrides) -> Self {
        self.narrator_overrides = overrides;
        self
    }

    /// Chain `secondary` behind this text. Each of our books is aligned to
    /// the secondary once, without splitting, so blocks attached later carry
    /// the secondary rendition along.
    pub fn with_secondary(mut self, secondary: ReferenceText, mapping: &dyn VersificationMapping) -> Self {
        let services = AlignmentServices::new(mapping);
        for book in &mut self.books {
            let Some(secondary_book) = secondary.book(&book.book_id) else {
                log::debug!("{}: no secondary reference book", book.book_id);
                continue;
            };
            Aligner::new(secondary_book, services, false).apply_to(book, &[]);
        }
        self.secondary = Some(Box::new(secondary));
        self
    }

    pub fn kind(&self) -> &ReferenceTextKind {
        &self.kind
    }

    pub fn versification(&self) -> &Versification {
        &self.versification
    }

    pub fn books(&self) -> &[BookScript] {
        &self.books
    }

    pub fn secondary(&self) -> Option<&ReferenceText> {
        self.secondary.as_deref()
    }

    pub fn narrator_overrides(&self) -> &NarratorOverrides {
        &self.narrator_overrides
    }

    pub fn has_book(&self, book_id: &str) -> bool {
        self.book(book_id).is_some()
    }

    pub fn book(&self, book_id: &str) -> Option<&BookScript> {
        self.books.iter().find(|b| b.book_id == book_id)
    }

    fn reference_book(&self, book_id: &str) -> Result<&BookScript, AlignError> {
        self.book(book_id)
            .ok_or_else(|| AlignError::UnknownBook(book_id.to_string()))
    }

    /// Align `book` to this reference text in place.
    pub fn apply_to(
        &self,
        book: &mut BookScript,
        services: AlignmentServices<'_>,
        options: &AlignmentOptions,
    ) -> Result<AlignmentReport, AlignError> {
        let reference = self.reference_book(&book.book_id)?;
        let report = Aligner::new(reference, services, options.allow_splitting)
            .apply_to(book, &options.reporting_clauses);
        if options.apply_narrator_overrides {
            self.narrator_overrides.apply_to(book);
        }
        Ok(report)
    }

    /// Matchup for the verse holding block `block_index`, for review and
    /// editing before it is applied.
    pub fn get_blocks_for_verse_matched_to_reference_text(
        &self,
        book: &BookScript,
        block_index: usize,
        services: AlignmentServices<'_>,
        known_reporting_clauses: Option<&[String]>,
        allow_splitting: bool,
    ) -> Result<BlockMatchup, AlignError> {
        let reference = self.reference_book(&book.book_id)?;
        Aligner::new(reference, services, allow_splitting).matchup_for(
            book,
            block_index,
            known_reporting_clauses.unwrap_or_default(),
        )
    }

    /// Aligned copies of every book this text covers, for export.
    pub fn get_books_with_blocks_connected_to_reference_text(
        &self,
        books: &[BookScript],
        services: AlignmentServices<'_>,
        apply_narrator_overrides: bool,
    ) -> Vec<BookScript> {
        let options = AlignmentOptions {
            apply_narrator_overrides,
            ..AlignmentOptions::default()
        };
        books
            .iter()
            .filter_map(|book| {
                let mut aligned = book.clone();
                self.apply_to(&mut aligned, services, &options).ok()?;
                Some(aligned)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Block, CharacterId};
    use crate::narrator_overrides::NarratorOverride;
    use crate::tests::{BOOK, book, init_logging, narrator_block, quote_block};
    use crate::versification::IdentityMapping;
    use pretty_assertions::assert_eq;

    fn english() -> ReferenceText {
        ReferenceText::new(
            ReferenceTextKind::Standard("English".to_string()),
            Versification::english(),
            vec![book(vec![
                Block::chapter_announcement(BOOK, 1),
                narrator_block(1, "{1}Verse one. "),
                narrator_block(1, "{2}Verse two."),
            ])],
        )
    }

    #[test]
    fn test_unknown_book_is_an_error() {
        let mut luke = BookScript::new("LUK", Versification::english(), Vec::new());
        let result = english().apply_to(
            &mut luke,
            AlignmentServices::new(&IdentityMapping),
            &AlignmentOptions::default(),
        );
        assert_eq!(result, Err(AlignError::UnknownBook("LUK".to_string())));
    }

    #[test]
    fn test_splitting_leaves_reference_untouched() {
        init_logging();
        let reference = ReferenceText::new(
            ReferenceTextKind::Standard("English".to_string()),
            Versification::english(),
            vec![book(vec![narrator_block(1, "{1}Verse one. {2}Verse two.")])],
        );
        let before = reference.clone();
        let mut vernacular = book(vec![narrator_block(1, "{1}Uno."), narrator_block(1, "{2}Dos.")]);

        let report = reference
            .apply_to(&mut vernacular, AlignmentServices::new(&IdentityMapping), &AlignmentOptions::default())
            .unwrap();

        assert_eq!(reference, before);
        assert_eq!(report.matched_blocks, 2);
        assert_eq!(vernacular.blocks()[1].primary_reference_text(), "{2}Verse two.");
    }

    #[test]
    fn test_secondary_rendition_travels_with_attachment() {
        let french = ReferenceText::new(
            ReferenceTextKind::Standard("French".to_string()),
            Versification::english(),
            vec![book(vec![narrator_block(1, "{1}Verset un. "), narrator_block(1, "{2}Verset deux.")])],
        );
        let reference = english().with_secondary(french, &IdentityMapping);
        let mut vernacular = book(vec![narrator_block(1, "{1}Uno. "), narrator_block(1, "{2}Dos.")]);

        reference
            .apply_to(&mut vernacular, AlignmentServices::new(&IdentityMapping), &AlignmentOptions::default())
            .unwrap();

        assert!(reference.secondary().is_some());
        assert_eq!(
            vernacular.blocks()[0].secondary_reference_text().as_deref(),
            Some("{1}Verset un. ")
        );
    }

    #[test]
    fn test_export_skips_books_without_reference() {
        let books = vec![
            book(vec![narrator_block(1, "{1}Uno. "), narrator_block(1, "{2}Dos.")]),
            BookScript::new("LUK", Versification::english(), vec![narrator_block(1, "{1}Lucas.")]),
        ];

        let aligned = english().get_books_with_blocks_connected_to_reference_text(
            &books,
            AlignmentServices::new(&IdentityMapping),
            false,
        );

        assert_eq!(aligned.len(), 1);
        assert_eq!(aligned[0].book_id, BOOK);
        assert!(aligned[0].blocks().iter().all(|b| b.matches_reference_text));
        assert!(!books[0].blocks()[0].matches_reference_text);
    }

    #[test]
    fn test_narrator_overrides_apply_after_matching() {
        let reference = english().with_narrator_overrides(NarratorOverrides::new(vec![NarratorOverride {
            book_id: BOOK.to_string(),
            start_chapter: 1,
            start_verse: Some(2),
            end_chapter: 1,
            end_verse: None,
            character: "Mark".to_string(),
        }]));
        let books = vec![book(vec![
            narrator_block(1, "{1}Uno. "),
            narrator_block(1, "{2}Dos."),
            quote_block(1, 2, "Jesus", "«Venid.»"),
        ])];

        let aligned = reference.get_books_with_blocks_connected_to_reference_text(
            &books,
            AlignmentServices::new(&IdentityMapping),
            true,
        );

        let blocks = aligned[0].blocks();
        assert_eq!(blocks[0].character_id_in_script, None);
        assert_eq!(blocks[1].character_in_script(), &CharacterId::known("Mark"));
        assert!(blocks[1].matches_reference_text);
        assert_eq!(blocks[2].character_id_in_script, None);
    }
}
