pub mod characters;
pub mod error;
pub mod matching;
pub mod models;
pub mod narrator_overrides;
pub mod quotes;
pub mod reference_text;
pub mod versification;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use characters::{CharacterDelivery, CharacterVerseLookup, CharacterVerseTable};
pub use error::{AlignError, AlignmentIssue, AlignmentReport, ParseCharacterIdError, SplitError};
pub use matching::{AlignmentOptions, AlignmentServices, BlockMatchup, ReportingClauses};
pub use models::*;
pub use narrator_overrides::{NarratorOverride, NarratorOverrides};
pub use reference_text::{ReferenceText, ReferenceTextKind};
pub use versification::{IdentityMapping, MappingTable, VerseRef, Versification, VersificationMapping};
