//! Attach reference blocks to the vernacular blocks of one verse group.
//!
//! Passes run in order, each only where the previous one left ambiguity:
//!
//! 1. equal counts with compatible speakers pair up positionally;
//! 2. reporting clauses are folded into the quotes they frame, and the
//!    resulting units are paired from both ends while speakers agree;
//! 3. whatever is left in the middle goes, as an unmatched list, to the
//!    first vernacular block left unresolved;
//! 4. single-voice books concatenate adjacent mismatches and accept them.
//!
//! Every reference block given to [`match_group`] ends up attached to
//! exactly one vernacular block, and reading the attachments in vernacular
//! order reproduces the reference order.

use std::ops::Range;

use crate::characters::CharacterVerseLookup;
use crate::models::{Block, CharacterId, ReferenceBlock};
use crate::versification::Versification;

use super::reporting_clause::ReportingClauses;

pub(crate) struct MatchContext<'a> {
    pub book_id: &'a str,
    pub versification: &'a Versification,
    pub narrator: CharacterId,
    pub vernacular_clauses: &'a ReportingClauses,
    pub reference_clauses: &'a ReportingClauses,
    pub single_voice: bool,
    pub characters: Option<&'a dyn CharacterVerseLookup>,
}

impl MatchContext<'_> {
    /// A reference speaker the control data does not expect in the verse is
    /// treated as a data problem, not a match.
    fn is_legitimate_speaker(&self, vernacular: &Block, speaker: &CharacterId) -> bool {
        let (Some(lookup), CharacterId::Known(_)) = (self.characters, speaker) else {
            return true;
        };
        lookup.can_speak(
            self.book_id,
            vernacular.chapter_number,
            vernacular.initial_start_verse..=vernacular.last_verse_number(),
            self.versification,
            speaker,
        )
    }

    pub fn compatible(&self, vernacular: &Block, reference: &Block) -> bool {
        vernacular.is_scripture()
            && reference.is_scripture()
            && vernacular.character_id.is_compatible_with(&reference.character_id)
            && self.is_legitimate_speaker(vernacular, &reference.character_id)
    }

    /// An unclear vernacular speaker takes the reference speaker.
    pub fn adopt_reference_speaker(&self, block: &mut Block, reference: &ReferenceBlock) {
        if !block.character_id.is_unclear()
            || reference.character_id.is_unclear()
            || reference.character_id.is_extra_biblical()
            || !self.is_legitimate_speaker(block, &reference.character_id)
        {
            return;
        }
        block.character_id = reference.character_id.clone();
        block.delivery = reference.delivery.clone();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    /// Narrator fragment such as "he said".
    Clause,
    Narration,
    Quote,
}

fn classify(blocks: &[Block], clauses: &ReportingClauses) -> Vec<Kind> {
    blocks
        .iter()
        .map(|b| {
            if !b.character_id.is_narrator() {
                Kind::Quote
            } else if clauses.is_reporting_clause(&b.text()) {
                Kind::Clause
            } else {
                Kind::Narration
            }
        })
        .collect()
}

/// A clause that reads as finishing the sentence before it ("—dijo Fred—",
/// "he said.") rather than introducing the next one.
fn reads_as_trailing(block: &Block) -> bool {
    let text = block.text();
    let first = text.trim_start().chars().next();
    match first {
        Some(c) if c.is_alphabetic() => c.is_lowercase(),
        Some(_) => true,
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Unit {
    range: Range<usize>,
    primary: usize,
    has_clause: bool,
    has_narration: bool,
    has_quote: bool,
}

impl Unit {
    fn new(range: Range<usize>, kinds: &[Kind]) -> Self {
        let members = &kinds[range.clone()];
        let primary = members
            .iter()
            .position(|k| *k == Kind::Quote)
            .map_or(range.start, |p| range.start + p);
        Self {
            primary,
            has_clause: members.contains(&Kind::Clause),
            has_narration: members.contains(&Kind::Narration),
            has_quote: members.contains(&Kind::Quote),
            range,
        }
    }

    fn len(&self) -> usize {
        self.range.len()
    }
}

/// Fold reporting clauses into the quotes they lead, trail or interrupt.
fn group_units(blocks: &[Block], kinds: &[Kind]) -> Vec<Unit> {
    let n = kinds.len();
    let mut units = Vec::new();
    let mut i = 0;
    while i < n {
        let start = i;
        let opens_quote = match kinds[i] {
            Kind::Narration => {
                i += 1;
                false
            }
            Kind::Clause if i + 1 < n && kinds[i + 1] == Kind::Quote => {
                i += 2;
                true
            }
            Kind::Clause => {
                i += 1;
                false
            }
            Kind::Quote => {
                i += 1;
                true
            }
        };
        while opens_quote && i < n && kinds[i] == Kind::Clause {
            let speaker = &blocks[i - 1].character_id;
            let resumes = i + 1 < n && kinds[i + 1] == Kind::Quote;
            if resumes && blocks[i + 1].character_id == *speaker {
                i += 2;
            } else if reads_as_trailing(&blocks[i]) || !resumes {
                i += 1;
                break;
            } else {
                break;
            }
        }
        units.push(Unit::new(start..i, kinds));
    }
    units
}

/// What one vernacular block ends up holding. `front` and `back` receive
/// fragments from neighbouring units.
#[derive(Debug, Clone, Default)]
struct Slot {
    front: Vec<ReferenceBlock>,
    main: Vec<ReferenceBlock>,
    back: Vec<ReferenceBlock>,
    matched: bool,
    demoted: bool,
}

impl Slot {
    fn is_resolved(&self) -> bool {
        self.matched && !self.demoted
    }

    fn take_all(&mut self) -> Vec<ReferenceBlock> {
        let mut all = std::mem::take(&mut self.front);
        all.append(&mut self.main);
        all.append(&mut self.back);
        all
    }
}

fn clones(blocks: &[Block]) -> Vec<ReferenceBlock> {
    blocks.iter().map(ReferenceBlock::from_block).collect()
}

struct Pairing<'a, 'c> {
    vernacular: &'a [Block],
    reference: &'a [Block],
    vernacular_kinds: Vec<Kind>,
    reference_kinds: Vec<Kind>,
    ctx: &'a MatchContext<'c>,
    slots: Vec<Slot>,
}

impl Pairing<'_, '_> {
    fn units_compatible(&self, v: &Unit, r: &Unit) -> bool {
        if self
            .ctx
            .compatible(&self.vernacular[v.primary], &self.reference[r.primary])
        {
            return true;
        }
        // One side folded the clause and the speech into a single narration block.
        let vernacular_folded = v.len() == 1 && v.has_narration && r.has_clause && r.has_quote;
        let reference_folded = r.len() == 1 && r.has_narration && v.has_clause && v.has_quote;
        vernacular_folded || reference_folded
    }

    fn assign_unit(&mut self, v: &Unit, r: &Unit) {
        let positional = v.len() == r.len()
            && v.range
                .clone()
                .zip(r.range.clone())
                .all(|(a, b)| self.ctx.compatible(&self.vernacular[a], &self.reference[b]));
        if positional {
            for (a, b) in v.range.clone().zip(r.range.clone()) {
                self.slots[a]
                    .main
                    .push(ReferenceBlock::from_block(&self.reference[b]));
                self.slots[a].matched = true;
            }
            return;
        }
        if r.has_clause && r.has_quote && !v.has_clause && !v.has_narration {
            self.assign_without_clause(v, r);
            return;
        }
        self.slots[v.primary]
            .main
            .extend(clones(&self.reference[r.range.clone()]));
        for k in v.range.clone() {
            self.slots[k].matched = true;
        }
    }

    /// The vernacular unit has the speech but not the reporting clause: the
    /// clause goes to the narrator block beside it, flagged for review.
    fn assign_without_clause(&mut self, v: &Unit, r: &Unit) {
        let quotes: Vec<usize> = r
            .range
            .clone()
            .filter(|&k| self.reference_kinds[k] == Kind::Quote)
            .collect();
        let (Some(&first), Some(&last)) = (quotes.first(), quotes.last()) else {
            return;
        };
        let leading = clones(&self.reference[r.range.start..first]);
        let body = clones(&self.reference[first..=last]);
        let trailing = clones(&self.reference[last + 1..r.range.end]);

        for k in v.range.clone() {
            self.slots[k].matched = true;
        }
        let primary = v.primary;
        self.slots[primary].main.extend(body);

        if !leading.is_empty() {
            let before = v.range.start.checked_sub(1).filter(|&k| self.is_narrator(k));
            match before {
                Some(k) => {
                    self.slots[k].back.extend(leading);
                    self.slots[k].demoted = true;
                }
                None => {
                    self.slots[primary].main.splice(0..0, leading);
                    self.slots[primary].demoted = true;
                }
            }
        }
        if !trailing.is_empty() {
            let after = Some(v.range.end).filter(|&k| k < self.vernacular.len() && self.is_narrator(k));
            match after {
                Some(k) => {
                    self.slots[k].front.extend(trailing);
                    self.slots[k].demoted = true;
                }
                None => {
                    self.slots[primary].main.extend(trailing);
                    self.slots[primary].demoted = true;
                }
            }
        }
    }

    fn is_narrator(&self, index: usize) -> bool {
        self.vernacular_kinds[index] != Kind::Quote
    }

    /// Passes 2 and 3 over reporting-clause units.
    fn pair_units(&mut self) {
        let vu = group_units(self.vernacular, &self.vernacular_kinds);
        let ru = group_units(self.reference, &self.reference_kinds);
        let (nv, nr) = (vu.len(), ru.len());

        let mut top = 0;
        while top < nv && top < nr && self.units_compatible(&vu[top], &ru[top]) {
            top += 1;
        }
        let mut bottom = 0;
        while bottom < nv - top
            && bottom < nr - top
            && self.units_compatible(&vu[nv - 1 - bottom], &ru[nr - 1 - bottom])
        {
            bottom += 1;
        }

        for u in 0..top {
            self.assign_unit(&vu[u], &ru[u]);
        }

        let vernacular_middle = if top < nv - bottom {
            vu[top].range.start..vu[nv - 1 - bottom].range.end
        } else {
            0..0
        };
        let reference_middle = if top < nr - bottom {
            ru[top].range.start..ru[nr - 1 - bottom].range.end
        } else {
            0..0
        };
        let leftovers = clones(&self.reference[reference_middle.clone()]);
        if !leftovers.is_empty() {
            if !vernacular_middle.is_empty() {
                self.slots[vernacular_middle.start].main.extend(leftovers);
            } else {
                // No vernacular block left over: a neighbour takes the
                // fragments, and only keeps its match if they share its speaker.
                // A trailing clause already forwarded past the top units is
                // followed by the fragments on the same slot.
                let forwarded = (top > 0)
                    .then(|| vu[top - 1].range.end)
                    .filter(|&k| k < self.slots.len() && !self.slots[k].front.is_empty());
                let k = match forwarded {
                    Some(k) => k,
                    None if top > 0 => vu[top - 1].range.end - 1,
                    None => vu[nv - bottom].range.start,
                };
                let fits = self.reference[reference_middle]
                    .iter()
                    .all(|r| self.ctx.compatible(&self.vernacular[k], r));
                if top > 0 && forwarded.is_none() {
                    self.slots[k].back.extend(leftovers);
                } else {
                    self.slots[k].front.extend(leftovers);
                }
                self.slots[k].demoted |= !fits;
            }
        }

        for b in (0..bottom).rev() {
            self.assign_unit(&vu[nv - 1 - b], &ru[nr - 1 - b]);
        }
    }

    /// Pass 4: adjacent unresolved blocks pool their fragments on the first.
    fn combine_unresolved_runs(&mut self) {
        let mut k = 0;
        while k < self.slots.len() {
            if self.slots[k].is_resolved() {
                k += 1;
                continue;
            }
            let start = k;
            let mut pooled = Vec::new();
            while k < self.slots.len() && !self.slots[k].is_resolved() {
                pooled.extend(self.slots[k].take_all());
                self.slots[k].matched = true;
                self.slots[k].demoted = false;
                k += 1;
            }
            self.slots[start].main = pooled;
        }
    }
}

fn commit(vernacular: &mut [Block], slots: Vec<Slot>, ctx: &MatchContext<'_>) {
    for (block, mut slot) in vernacular.iter_mut().zip(slots) {
        let resolved = slot.is_resolved();
        let single = slot.front.is_empty() && slot.back.is_empty() && slot.main.len() == 1;
        let references = slot.take_all();
        if !resolved {
            block.set_unmatched_reference_blocks(references);
            continue;
        }
        let reference = ReferenceBlock::combine(&references, Some(&block.character_id))
            .unwrap_or_else(|| ReferenceBlock::empty_for(block, ctx.narrator.clone()));
        if single {
            ctx.adopt_reference_speaker(block, &reference);
        }
        block.set_matched_reference_block(reference);
    }
}

/// A reference block runs across a vernacular verse break it could not be
/// split at: the whole group goes, unmatched, to the first block.
///
/// Only the first block gets it. A copy on every overlapping block would
/// repeat the reference text when the attachments are read in order.
pub(crate) fn attach_unsplit(vernacular: &mut [Block], reference: &[Block]) {
    for (k, block) in vernacular.iter_mut().enumerate() {
        let references = if k == 0 { clones(reference) } else { Vec::new() };
        block.set_unmatched_reference_blocks(references);
    }
}

/// Attach `reference` to `vernacular`, both covering the same verses.
pub(crate) fn match_group(vernacular: &mut [Block], reference: &[Block], ctx: &MatchContext<'_>) {
    if vernacular.is_empty() {
        return;
    }
    let mut slots = vec![Slot::default(); vernacular.len()];
    if reference.is_empty() {
        commit(vernacular, slots, ctx);
        return;
    }

    let positional = vernacular.len() == reference.len()
        && vernacular
            .iter()
            .zip(reference)
            .all(|(v, r)| ctx.compatible(v, r));
    if positional {
        for (slot, r) in slots.iter_mut().zip(reference) {
            slot.main.push(ReferenceBlock::from_block(r));
            slot.matched = true;
        }
        commit(vernacular, slots, ctx);
        return;
    }

    let mut pairing = Pairing {
        vernacular: &*vernacular,
        reference,
        vernacular_kinds: classify(vernacular, ctx.vernacular_clauses),
        reference_kinds: classify(reference, ctx.reference_clauses),
        ctx,
        slots,
    };
    pairing.pair_units();
    if ctx.single_voice {
        pairing.combine_unresolved_runs();
    }
    let slots = pairing.slots;
    commit(vernacular, slots, ctx);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::characters::CharacterVerseTable;
    use crate::tests::{BOOK, narrator_block, narrator_in_verse, quote_block};
    use crate::versification::VerseRef;
    use pretty_assertions::assert_eq;

    fn run(vernacular: &mut [Block], reference: &[Block], clauses: &ReportingClauses) {
        run_with(vernacular, reference, clauses, false, None);
    }

    fn run_with(
        vernacular: &mut [Block],
        reference: &[Block],
        clauses: &ReportingClauses,
        single_voice: bool,
        characters: Option<&dyn CharacterVerseLookup>,
    ) {
        let english = ReportingClauses::english_defaults();
        let versification = Versification::english();
        let ctx = MatchContext {
            book_id: BOOK,
            versification: &versification,
            narrator: CharacterId::narrator(BOOK),
            vernacular_clauses: clauses,
            reference_clauses: &english,
            single_voice,
            characters,
        };
        match_group(vernacular, reference, &ctx);
    }

    fn attached(vernacular: &[Block]) -> String {
        vernacular.iter().map(Block::primary_reference_text).collect()
    }

    fn reference_text(reference: &[Block]) -> String {
        reference.iter().map(Block::text_with_verse_numbers).collect()
    }

    fn matched(vernacular: &[Block]) -> Vec<bool> {
        vernacular.iter().map(|b| b.matches_reference_text).collect()
    }

    #[test]
    fn test_positional_match_adopts_reference_speaker() {
        let mut unclear = quote_block(1, 1, "Jesus", "«Venid.»");
        unclear.character_id = CharacterId::Ambiguous;
        let mut vernacular = vec![narrator_block(1, "{1}Jesús dijo:"), unclear];
        let reference = vec![
            narrator_block(1, "{1}Jesus said,"),
            quote_block(1, 1, "Jesus", "“Come.”"),
        ];

        run(&mut vernacular, &reference, &ReportingClauses::default());

        assert_eq!(matched(&vernacular), vec![true, true]);
        assert_eq!(vernacular[1].character_id, CharacterId::known("Jesus"));
        assert_eq!(vernacular[1].primary_reference_text(), "“Come.”");
    }

    #[test]
    fn test_unexpected_reference_speaker_is_not_adopted() {
        let mut unclear = quote_block(1, 1, "Jesus", "«Venid.»");
        unclear.character_id = CharacterId::Unexpected;
        let mut vernacular = vec![narrator_block(1, "{1}Jesús les habló:"), unclear];
        let reference = vec![
            narrator_block(1, "{1}Jesus spoke to them:"),
            quote_block(1, 1, "Jesus", "“Come.”"),
        ];
        let mut table = CharacterVerseTable::new();
        table.add(BOOK, VerseRef::new(1, 1), "Peter", None);

        run_with(&mut vernacular, &reference, &ReportingClauses::default(), false, Some(&table));

        assert_eq!(matched(&vernacular), vec![true, false]);
        assert_eq!(vernacular[1].character_id, CharacterId::Unexpected);
        assert_eq!(attached(&vernacular), reference_text(&reference));
    }

    #[test]
    fn test_trailing_clause_folds_into_quote() {
        let mut vernacular = vec![
            quote_block(1, 1, "Fred", "{1}«Hola»"),
            narrator_in_verse(1, 1, "dijo Fred."),
        ];
        let reference = vec![quote_block(1, 1, "Fred", "{1}“Hello.”")];

        run(&mut vernacular, &reference, &ReportingClauses::new(["dijo Fred"]));

        assert_eq!(matched(&vernacular), vec![true, true]);
        assert_eq!(vernacular[0].primary_reference_text(), "{1}“Hello.”");
        assert_eq!(vernacular[1].primary_reference_text(), "");
    }

    #[test]
    fn test_interrupting_clause_joins_both_halves() {
        let mut vernacular = vec![
            quote_block(1, 1, "Fred", "{1}«Hola,"),
            narrator_in_verse(1, 1, "—dijo Fred—"),
            quote_block(1, 1, "Fred", "amigo.»"),
        ];
        let reference = vec![quote_block(1, 1, "Fred", "{1}“Hello, friend.”")];

        run(&mut vernacular, &reference, &ReportingClauses::new(["dijo Fred"]));

        assert_eq!(matched(&vernacular), vec![true, true, true]);
        assert_eq!(attached(&vernacular), "{1}“Hello, friend.”");
    }

    #[test]
    fn test_folded_narration_takes_clause_and_quote() {
        let mut vernacular = vec![narrator_block(1, "{1}Él dijo: «Venid.»")];
        let reference = vec![
            narrator_block(1, "{1}He said,"),
            quote_block(1, 1, "Jesus", "“Come.”"),
        ];

        run(&mut vernacular, &reference, &ReportingClauses::default());

        assert_eq!(matched(&vernacular), vec![true]);
        assert_eq!(vernacular[0].primary_reference_text(), "{1}He said,“Come.”");
        assert!(vernacular[0].character_id.is_narrator());
    }

    #[test]
    fn test_omitted_leading_clause_goes_to_preceding_narration() {
        let mut vernacular = vec![
            narrator_block(1, "{1}Jesús subió y"),
            quote_block(1, 1, "Jesus", "«Venid.»"),
        ];
        let reference = vec![
            narrator_block(1, "{1}Jesus went up."),
            narrator_in_verse(1, 1, "He said:"),
            quote_block(1, 1, "Jesus", "“Come.”"),
        ];

        run(&mut vernacular, &reference, &ReportingClauses::default());

        assert_eq!(matched(&vernacular), vec![false, true]);
        assert_eq!(vernacular[0].reference_blocks.len(), 2);
        assert_eq!(vernacular[0].reference_blocks[1].text(), "He said:");
        assert_eq!(attached(&vernacular), reference_text(&reference));
    }

    #[test]
    fn test_omitted_trailing_clause_without_narration_stays_on_quote() {
        let mut vernacular = vec![
            narrator_block(1, "{1}Jesús subió."),
            quote_block(1, 1, "Jesus", "«Venid.»"),
        ];
        let reference = vec![
            narrator_block(1, "{1}Jesus went up."),
            quote_block(1, 1, "Jesus", "“Come,”"),
            narrator_in_verse(1, 1, "he said."),
        ];

        run(&mut vernacular, &reference, &ReportingClauses::default());

        assert_eq!(matched(&vernacular), vec![true, false]);
        assert_eq!(vernacular[1].reference_blocks.len(), 2);
        assert_eq!(attached(&vernacular), reference_text(&reference));
    }

    #[test]
    fn test_divergent_speakers_leave_middle_unmatched() {
        let mut vernacular = vec![
            narrator_block(1, "{1}Entonces."),
            quote_block(1, 1, "Peter", "«Señor.»"),
            quote_block(1, 1, "John", "«Maestro.»"),
            narrator_in_verse(1, 1, "Y se fueron."),
        ];
        let reference = vec![
            narrator_block(1, "{1}Then."),
            quote_block(1, 1, "Jesus", "“Go.”"),
            narrator_in_verse(1, 1, "And they left."),
        ];

        run(&mut vernacular, &reference, &ReportingClauses::default());

        assert_eq!(matched(&vernacular), vec![true, false, false, true]);
        assert_eq!(vernacular[1].primary_reference_text(), "“Go.”");
        assert!(vernacular[2].reference_blocks.is_empty());
        assert_eq!(attached(&vernacular), reference_text(&reference));
    }

    #[test]
    fn test_forwarded_clause_keeps_reference_order() {
        let mut vernacular = vec![
            quote_block(1, 1, "Jesus", "{1}«Venid.»"),
            narrator_in_verse(1, 1, "Y se fueron."),
        ];
        let reference = vec![
            quote_block(1, 1, "Jesus", "{1}“Come.”"),
            narrator_in_verse(1, 1, "he said."),
            quote_block(1, 1, "Peter", "“Lord!”"),
            narrator_in_verse(1, 1, "And they left."),
        ];

        run(&mut vernacular, &reference, &ReportingClauses::default());

        assert_eq!(matched(&vernacular), vec![true, false]);
        assert_eq!(vernacular[0].primary_reference_text(), "{1}“Come.”");
        assert_eq!(attached(&vernacular), "{1}“Come.”he said.“Lord!”And they left.");
        assert_eq!(attached(&vernacular), reference_text(&reference));
    }

    #[test]
    fn test_extra_reference_block_attaches_to_neighbour() {
        let mut vernacular = vec![narrator_block(1, "{1}Todo el versículo.")];
        let reference = vec![
            narrator_block(1, "{1}The whole verse"),
            quote_block(1, 1, "Jesus", "“and a quote.”"),
            quote_block(1, 1, "Peter", "“And another.”"),
        ];

        run(&mut vernacular, &reference, &ReportingClauses::default());

        assert_eq!(matched(&vernacular), vec![false]);
        assert_eq!(vernacular[0].reference_blocks.len(), 3);
        assert_eq!(attached(&vernacular), reference_text(&reference));
    }

    #[test]
    fn test_bridge_concatenates_reference_verses() {
        let mut vernacular = vec![
            narrator_block(1, "{1-2}Uno y dos."),
            quote_block(1, 2, "Jesus", "«Venid.»"),
        ];
        let reference = vec![
            narrator_block(1, "{1}One. "),
            narrator_block(1, "{2}Two."),
            quote_block(1, 2, "Jesus", "“Come.”"),
        ];

        run(&mut vernacular, &reference, &ReportingClauses::default());

        assert_eq!(matched(&vernacular), vec![true, true]);
        assert_eq!(vernacular[0].primary_reference_text(), "{1}One. {2}Two.");
        assert_eq!(vernacular[0].reference_blocks.len(), 1);
    }

    #[test]
    fn test_unsplit_reference_goes_to_first_block_once() {
        let mut vernacular = vec![narrator_block(1, "{1}Uno."), narrator_block(1, "{2}Dos.")];
        let reference = vec![narrator_block(1, "{1-2}One and two.")];

        attach_unsplit(&mut vernacular, &reference);

        assert_eq!(matched(&vernacular), vec![false, false]);
        assert_eq!(attached(&vernacular), "{1-2}One and two.");
        assert!(vernacular[1].reference_blocks.is_empty());
    }

    #[test]
    fn test_single_voice_accepts_mismatches() {
        let mut vernacular = vec![
            narrator_block(1, "{1}Entonces."),
            quote_block(1, 1, "Peter", "«Señor.»"),
            quote_block(1, 1, "John", "«Maestro.»"),
        ];
        let reference = vec![narrator_block(1, "{1}Then."), quote_block(1, 1, "Jesus", "“Go.”")];

        run_with(&mut vernacular, &reference, &ReportingClauses::default(), true, None);

        assert_eq!(matched(&vernacular), vec![true, true, true]);
        assert_eq!(vernacular[1].primary_reference_text(), "“Go.”");
        assert_eq!(vernacular[2].primary_reference_text(), "");
    }

    #[test]
    fn test_no_reference_leaves_blocks_unmatched() {
        let mut vernacular = vec![narrator_block(1, "{1}Sin referencia.")];
        vernacular[0].matches_reference_text = true;

        run(&mut vernacular, &[], &ReportingClauses::default());

        assert_eq!(matched(&vernacular), vec![false]);
        assert!(vernacular[0].reference_blocks.is_empty());
    }
}
