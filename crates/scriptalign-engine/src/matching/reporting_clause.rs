use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::models::{Block, BookScript};

/// Clauses recognized in English reference texts without any harvesting.
const ENGLISH_DEFAULTS: &[&str] = &[
    "he said",
    "she said",
    "they said",
    "he asked",
    "she asked",
    "they asked",
    "he answered",
    "he replied",
    "he said to them",
    "he told them",
    "jesus said",
    "said jesus",
    "jesus answered",
    "jesus replied",
];

/// Longest narrator fragment (in words) considered when harvesting.
const MAX_HARVEST_WORDS: usize = 5;

fn edge_regex() -> &'static Regex {
    static EDGES: OnceLock<Regex> = OnceLock::new();
    EDGES.get_or_init(|| Regex::new(r"^[\s\p{P}]+|[\s\p{P}]+$").expect("Invalid edge regex"))
}

fn whitespace_regex() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("Invalid whitespace regex"))
}

/// Strip surrounding punctuation and dashes, collapse spaces, lowercase.
pub fn normalize(text: &str) -> String {
    let trimmed = edge_regex().replace_all(text, "");
    whitespace_regex()
        .replace_all(&trimmed, " ")
        .to_lowercase()
}

/// Known short narrator fragments ("he said", "—dijo Fred—") that frame a
/// quotation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportingClauses {
    clauses: BTreeSet<String>,
}

impl ReportingClauses {
    pub fn new<I, S>(clauses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let clauses = clauses
            .into_iter()
            .map(|c| normalize(c.as_ref()))
            .filter(|c| !c.is_empty())
            .collect();
        Self { clauses }
    }

    pub fn english_defaults() -> Self {
        Self::new(ENGLISH_DEFAULTS.iter().copied())
    }

    /// English defaults plus every short narrator fragment that sits next
    /// to a quotation at least twice in `book`.
    pub fn synthesize(book: &BookScript) -> Self {
        let mut clauses = Self::english_defaults();
        clauses.extend(harvest(book.blocks()));
        clauses
    }

    pub fn extend<I: IntoIterator<Item = String>>(&mut self, more: I) {
        self.clauses
            .extend(more.into_iter().map(|c| normalize(&c)).filter(|c| !c.is_empty()));
    }

    pub fn is_reporting_clause(&self, text: &str) -> bool {
        let normalized = normalize(text);
        !normalized.is_empty() && self.clauses.contains(&normalized)
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

fn is_quote(block: &Block) -> bool {
    block.is_scripture() && !block.character_id.is_narrator()
}

fn harvest(blocks: &[Block]) -> Vec<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for (i, block) in blocks.iter().enumerate() {
        if !block.character_id.is_narrator() || block.starts_at_verse_break() {
            continue;
        }
        let beside_quote = (i > 0 && is_quote(&blocks[i - 1]))
            || blocks.get(i + 1).is_some_and(is_quote);
        if !beside_quote {
            continue;
        }
        let normalized = normalize(&block.text());
        let words = normalized.split(' ').count();
        if !normalized.is_empty() && words <= MAX_HARVEST_WORDS {
            *counts.entry(normalized).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count >= 2)
        .map(|(clause, _)| clause)
        .collect()
}
