//! Benchmark template parsing against the process-wide template cache.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlweave::Template;
use sqlweave::template::Tokenizer;

fn source(n: usize) -> String {
    let mut src = String::from("select * /* all columns */ from orders\n where ");
    for i in 0..n {
        if i > 0 {
            src.push_str("\n   and ");
        }
        src.push_str(&format!("col{i} = :p{i} -- filter {i}"));
    }
    src.push_str("\n order by 'created_at'::text");
    src
}

fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("template/tokenize");

    for n in [1, 10, 100] {
        let src = source(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &src, |b, src| {
            b.iter(|| black_box(Tokenizer::new(src).count()));
        });
    }

    group.finish();
}

fn bench_parse_uncached(c: &mut Criterion) {
    let mut group = c.benchmark_group("template/parse");

    for n in [1, 10, 100] {
        let src = source(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &src, |b, src| {
            b.iter(|| black_box(Template::parse(src).map(|t| t.pieces().len())));
        });
    }

    group.finish();
}

fn bench_preparse_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("template/preparse_hit");

    for n in [1, 10, 100] {
        let src = source(n);
        let _ = Template::preparse(&src);
        group.bench_with_input(BenchmarkId::from_parameter(n), &src, |b, src| {
            b.iter(|| black_box(Template::preparse(src).map(|t| t.has_params())));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_tokenize,
    bench_parse_uncached,
    bench_preparse_hit
);
criterion_main!(benches);
