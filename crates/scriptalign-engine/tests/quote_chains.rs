mod common;

use common::*;
use pretty_assertions::assert_eq;
use rstest::rstest;
use scriptalign_engine::MultiBlockQuote::{ChangeOfDelivery, Continuation, None, Start};
use scriptalign_engine::{
    AlignmentOptions, AlignmentServices, Block, IdentityMapping, MultiBlockQuote, quotes,
};

fn quoted(block: Block, status: MultiBlockQuote) -> Block {
    block.with_multi_block_quote(status)
}

#[rstest]
#[case::narrator_chain_beside_speech(vec![
    quoted(narrator(1, 0, "{1}Entonces."), Start),
    quoted(narrator(1, 1, "Y luego."), Continuation),
    quoted(speaker("Jesus", 1, 1, "«Venid,"), Start),
    quoted(speaker("Jesus", 1, 1, "y ved.»"), Continuation),
])]
#[case::orphaned_continuation(vec![
    quoted(speaker("Jesus", 1, 0, "{1}«Venid.»"), Continuation),
    narrator(1, 1, "Y fueron."),
])]
#[case::interrupted_chain(vec![
    quoted(speaker("Jesus", 1, 0, "{1}«Venid,"), Start),
    narrator(1, 1, "dijo,"),
    quoted(speaker("Jesus", 1, 1, "y ved.»"), Continuation),
])]
#[case::two_speakers(vec![
    quoted(speaker("Jesus", 1, 0, "{1}«Venid,"), Start),
    quoted(speaker("Peter", 1, 1, "y ved.»"), ChangeOfDelivery),
])]
fn test_repair_leaves_only_valid_chains(#[case] blocks: Vec<Block>) {
    let mut book = vernacular(blocks);
    let text_before: Vec<_> = book.blocks().iter().map(Block::text_with_verse_numbers).collect();

    quotes::repair(&mut book);

    assert_eq!(quotes::invalid_chain_members(&book), Vec::<usize>::new());
    assert_eq!(quotes::repair(&mut book), 0);
    let text_after: Vec<_> = book.blocks().iter().map(Block::text_with_verse_numbers).collect();
    assert_eq!(text_after, text_before);
}

#[test]
fn test_narrator_chain_cleared_and_speech_chain_kept() {
    let mut book = vernacular(vec![
        quoted(narrator(1, 0, "{1}Entonces."), Start),
        quoted(narrator(1, 1, "Y luego."), None),
        quoted(narrator(1, 0, "{2}Después."), Start),
        quoted(narrator(1, 2, "Y así."), Continuation),
        quoted(speaker("Jesus", 1, 2, "«Venid,"), Start),
        quoted(speaker("Jesus", 1, 2, "y ved.»"), Continuation),
    ]);

    quotes::repair(&mut book);

    let statuses: Vec<_> = book.blocks().iter().map(|b| b.multi_block_quote).collect();
    assert_eq!(statuses, vec![None, None, None, None, Start, Continuation]);
}

#[test]
fn test_alignment_splits_keep_chains_valid() {
    let reference = english(vec![
        speaker("Jesus", 1, 0, "{1}“Come. "),
        speaker("Jesus", 1, 0, "{2}See. "),
        speaker("Jesus", 1, 0, "{3}Go.”"),
    ]);
    let mut book = vernacular(vec![
        quoted(speaker("Jesus", 1, 0, "{1}«Venid. {2}Ved."), Start),
        quoted(speaker("Jesus", 1, 0, "{3}Id.»"), Continuation),
    ]);

    reference
        .apply_to(
            &mut book,
            AlignmentServices::new(&IdentityMapping),
            &AlignmentOptions::default(),
        )
        .unwrap();

    let statuses: Vec<_> = book.blocks().iter().map(|b| b.multi_block_quote).collect();
    assert_eq!(statuses, vec![Start, Continuation, Continuation]);
    assert!(quotes::invalid_chain_members(&book).is_empty());
    assert!(book.blocks().iter().all(|b| b.matches_reference_text));
}

#[test]
fn test_rejoining_split_quote_closes_its_chain() {
    let reference = english(vec![speaker("Jesus", 1, 0, "{1-2}“Come and see.”")]);
    let mut book = vernacular(vec![speaker("Jesus", 1, 0, "{1}«Venid. {2}Ved.»")]);
    book.split_block(0, 2, 0).unwrap();
    book.blocks_mut()[0].multi_block_quote = Start;
    book.blocks_mut()[1].multi_block_quote = Continuation;

    let mut rejoined = book.clone();
    rejoined.merge_with_following(0).unwrap();
    assert_eq!(rejoined.blocks()[0].multi_block_quote, None);
    assert!(quotes::invalid_chain_members(&rejoined).is_empty());

    let mut matchup = reference
        .get_blocks_for_verse_matched_to_reference_text(
            &book,
            0,
            AlignmentServices::new(&IdentityMapping),
            Option::None,
            true,
        )
        .unwrap();
    matchup.merge_correlated_with_following(0).unwrap();
    assert_eq!(matchup.correlated_blocks()[0].multi_block_quote, None);

    matchup.apply(&mut book).unwrap();
    assert_eq!(book.len(), 1);
    assert!(quotes::invalid_chain_members(&book).is_empty());
}

#[test]
fn test_rejoining_inside_a_longer_chain_keeps_its_start() {
    let mut book = vernacular(vec![
        quoted(speaker("Jesus", 1, 0, "{1}«Venid. {2}Ved."), Start),
        quoted(speaker("Jesus", 1, 0, "{3}Id.»"), Continuation),
    ]);
    book.split_block(0, 2, 0).unwrap();

    book.merge_with_following(0).unwrap();

    let statuses: Vec<_> = book.blocks().iter().map(|b| b.multi_block_quote).collect();
    assert_eq!(statuses, vec![Start, Continuation]);
    assert!(quotes::invalid_chain_members(&book).is_empty());
}
