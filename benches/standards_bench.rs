/*!
 * Benchmarks for the subtitle standards engine, which runs once per segment
 * and once per translation on the hot path.
 */

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use dubflow::standards::{line_break, split_long_segment, SubtitleStandards, MAX_DURATION_MS};

fn bench_validate(c: &mut Criterion) {
    let standards = SubtitleStandards::new();
    let text = "The quick brown fox jumps over the lazy dog and keeps running.";

    c.bench_function("standards_validate", |b| {
        b.iter(|| standards.validate(black_box(text), black_box(0), black_box(4_000)))
    });
}

fn bench_line_break(c: &mut Criterion) {
    let text = "one two three four five six seven eight nine ten eleven twelve \
                thirteen fourteen fifteen sixteen seventeen eighteen nineteen twenty";

    c.bench_function("standards_line_break", |b| {
        b.iter(|| line_break(black_box(text)))
    });
}

fn bench_split_long_segment(c: &mut Criterion) {
    let text = "One sentence here. Another sentence there. A third one follows. \
                And a final remark wraps the whole thing up at the end.";

    c.bench_function("standards_split_long_segment", |b| {
        b.iter(|| {
            split_long_segment(
                black_box(text),
                black_box(0),
                black_box(20_000),
                black_box(MAX_DURATION_MS),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_validate,
    bench_line_break,
    bench_split_long_segment
);
criterion_main!(benches);
