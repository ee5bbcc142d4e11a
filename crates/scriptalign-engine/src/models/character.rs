use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseCharacterIdError;

/// Roles every book has that are not characters in the story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardRole {
    Narrator,
    BookOrChapter,
    ExtraBiblical,
    Intro,
}

impl StandardRole {
    const ALL: [StandardRole; 4] = [
        StandardRole::Narrator,
        StandardRole::BookOrChapter,
        StandardRole::ExtraBiblical,
        StandardRole::Intro,
    ];

    fn prefix(self) -> &'static str {
        match self {
            StandardRole::Narrator => "narrator",
            StandardRole::BookOrChapter => "BC",
            StandardRole::ExtraBiblical => "extra",
            StandardRole::Intro => "intro",
        }
    }
}

/// Who speaks a block.
///
/// Persisted through its string form (see [`fmt::Display`] and [`FromStr`]),
/// so `narrator-MRK`, `Ambiguous`, `Unknown`, `Needs Review` and plain
/// character names all round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CharacterId {
    /// A resolved speaker. May list alternatives separated by `/`.
    Known(String),
    Ambiguous,
    Unexpected,
    NeedsReview,
    Standard { role: StandardRole, book_id: String },
}

const AMBIGUOUS: &str = "Ambiguous";
const UNEXPECTED: &str = "Unknown";
const NEEDS_REVIEW: &str = "Needs Review";

impl CharacterId {
    pub fn known(name: impl Into<String>) -> Self {
        CharacterId::Known(name.into())
    }

    pub fn standard(role: StandardRole, book_id: impl Into<String>) -> Self {
        CharacterId::Standard {
            role,
            book_id: book_id.into(),
        }
    }

    pub fn narrator(book_id: impl Into<String>) -> Self {
        Self::standard(StandardRole::Narrator, book_id)
    }

    pub fn role(&self) -> Option<StandardRole> {
        match self {
            CharacterId::Standard { role, .. } => Some(*role),
            _ => None,
        }
    }

    pub fn is_narrator(&self) -> bool {
        self.role() == Some(StandardRole::Narrator)
    }

    /// Speaker not yet resolved to anyone in particular.
    pub fn is_unclear(&self) -> bool {
        matches!(
            self,
            CharacterId::Ambiguous | CharacterId::Unexpected | CharacterId::NeedsReview
        )
    }

    /// Blocks attributed to these roles are not dramatized speech.
    pub fn is_extra_biblical(&self) -> bool {
        matches!(
            self.role(),
            Some(StandardRole::BookOrChapter | StandardRole::ExtraBiblical | StandardRole::Intro)
        )
    }

    /// Names a known id may stand for (`"Peter/John"` lists two).
    pub fn alternatives(&self) -> Vec<&str> {
        match self {
            CharacterId::Known(name) => name.split('/').map(str::trim).collect(),
            _ => Vec::new(),
        }
    }

    /// Whether two attributions could refer to the same speaker.
    ///
    /// Unclear ids are compatible with anything; known ids match when any of
    /// their `/`-separated alternatives coincide.
    pub fn is_compatible_with(&self, other: &CharacterId) -> bool {
        if self.is_unclear() || other.is_unclear() {
            return !(self.is_extra_biblical() || other.is_extra_biblical());
        }
        match (self, other) {
            (CharacterId::Standard { role: a, .. }, CharacterId::Standard { role: b, .. }) => a == b,
            (CharacterId::Known(_), CharacterId::Known(_)) => {
                let theirs = other.alternatives();
                self.alternatives().iter().any(|name| theirs.contains(name))
            }
            _ => false,
        }
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharacterId::Known(name) => f.write_str(name),
            CharacterId::Ambiguous => f.write_str(AMBIGUOUS),
            CharacterId::Unexpected => f.write_str(UNEXPECTED),
            CharacterId::NeedsReview => f.write_str(NEEDS_REVIEW),
            CharacterId::Standard { role, book_id } => write!(f, "{}-{}", role.prefix(), book_id),
        }
    }
}

impl FromStr for CharacterId {
    type Err = ParseCharacterIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed {
            "" => return Err(ParseCharacterIdError(s.to_string())),
            AMBIGUOUS => return Ok(CharacterId::Ambiguous),
            UNEXPECTED => return Ok(CharacterId::Unexpected),
            NEEDS_REVIEW => return Ok(CharacterId::NeedsReview),
            _ => {}
        }
        for role in StandardRole::ALL {
            if let Some(book_id) = trimmed
                .strip_prefix(role.prefix())
                .and_then(|rest| rest.strip_prefix('-'))
                && book_id.len() == 3
                && book_id.chars().all(|c| c.is_ascii_alphanumeric())
            {
                return Ok(CharacterId::standard(role, book_id));
            }
        }
        Ok(CharacterId::Known(trimmed.to_string()))
    }
}

impl From<CharacterId> for String {
    fn from(id: CharacterId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for CharacterId {
    type Error = ParseCharacterIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
