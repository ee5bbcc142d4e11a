use criterion::{Criterion, black_box, criterion_group, criterion_main};
use scriptalign_engine::{AlignmentOptions, AlignmentServices, IdentityMapping};
mod common;

fn bench_apply_to(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_to");
    group.sample_size(20);

    let reference = common::generate_reference(16);
    for verses_per_block in [1, 4] {
        let book = common::generate_vernacular(16, verses_per_block);
        group.bench_function(format!("{verses_per_block}_verses_per_block"), |b| {
            b.iter(|| {
                let mut book = book.clone();
                let report = reference
                    .apply_to(
                        black_box(&mut book),
                        AlignmentServices::new(&IdentityMapping),
                        &AlignmentOptions::default(),
                    )
                    .unwrap();
                black_box(report);
            });
        });
    }

    group.finish();
}

fn bench_realign(c: &mut Criterion) {
    let mut group = c.benchmark_group("realign");
    group.sample_size(20);

    let reference = common::generate_reference(16);
    let mut aligned = common::generate_vernacular(16, 4);
    reference
        .apply_to(
            &mut aligned,
            AlignmentServices::new(&IdentityMapping),
            &AlignmentOptions::default(),
        )
        .unwrap();

    group.bench_function("already_aligned", |b| {
        b.iter(|| {
            let mut book = aligned.clone();
            let report = reference
                .apply_to(
                    black_box(&mut book),
                    AlignmentServices::new(&IdentityMapping),
                    &AlignmentOptions::default(),
                )
                .unwrap();
            black_box(report);
        });
    });

    group.finish();
}

fn bench_matchup(c: &mut Criterion) {
    let mut group = c.benchmark_group("matchup");
    group.sample_size(20);

    let reference = common::generate_reference(16);
    let book = common::generate_vernacular(16, 4);
    let middle = book.len() / 2;

    group.bench_function("verse_in_middle", |b| {
        b.iter(|| {
            let matchup = reference
                .get_blocks_for_verse_matched_to_reference_text(
                    &book,
                    black_box(middle),
                    AlignmentServices::new(&IdentityMapping),
                    None,
                    true,
                )
                .unwrap();
            black_box(matchup);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_apply_to, bench_realign, bench_matchup);
criterion_main!(benches);
