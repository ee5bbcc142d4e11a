//! Alignment of vernacular blocks to a reference text.
//!
//! [`chunk`] groups both sides by verse range, [`matchup`] splits them to
//! common verse breaks and [`passes`] decides which reference blocks go
//! with which vernacular block.

mod aligner;
mod chunk;
mod matchup;
mod passes;
mod reporting_clause;

pub(crate) use aligner::Aligner;
pub use aligner::{AlignmentOptions, AlignmentServices};
pub use matchup::BlockMatchup;
pub use reporting_clause::ReportingClauses;
