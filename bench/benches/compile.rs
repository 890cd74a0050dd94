use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, Criterion};
use justsh::{lexer::SUGGESTED_TOKENS_CAPACITY, parser::parse_justfile, Options};
use std::hint::black_box;

static INPUT: &str = include_str!("../inputs/big.justfile");

fn criterion_benchmark(c: &mut Criterion) {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    c.bench_function("parser", |b| {
        b.iter(|| {
            tokens.clear();
            let justfile = parse_justfile(black_box(INPUT), &mut tokens).unwrap();
            black_box(justfile);
        })
    });

    let options = Options {
        script_name: "just.sh".to_owned(),
        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    };
    c.bench_function("compile", |b| {
        b.iter(|| {
            let script = justsh::compile(black_box(INPUT), &options).unwrap();
            black_box(script);
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
