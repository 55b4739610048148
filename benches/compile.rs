//! Benchmarks for pattern compilation and policy enforcement.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use regexgate::{compile, FeatureSet, RegexFeature};

const SIMPLE: &str = "^[a-z0-9._%+-]+@[a-z0-9.-]+\\.[a-z]{2,}$";
const CLASS_HEAVY: &str = "[\\p{IsHiragana}\\p{blk=Mongolian}\\p{gc=Lu}][a-z&&[^aeiou]]{2,8}";
const REDOS_SHAPE: &str = "^([a-zA-Z0-9])(([\\-.]|[_]+)?([a-zA-Z0-9]+))*(@){1}[a-z0-9]+$";

fn bench_compile_simple(c: &mut Criterion) {
    let java = FeatureSet::java_default();
    c.bench_function("compile_simple", |b| {
        b.iter(|| compile(black_box(SIMPLE), java).unwrap())
    });
}

fn bench_compile_class_heavy(c: &mut Criterion) {
    let java = FeatureSet::java_default();
    c.bench_function("compile_class_heavy", |b| {
        b.iter(|| compile(black_box(CLASS_HEAVY), java).unwrap())
    });
}

fn bench_reject_redos_shape(c: &mut Criterion) {
    let strict = FeatureSet::copy_of(FeatureSet::java_default());
    strict.set_enabled(RegexFeature::CompoundQuantifiers, false);
    c.bench_function("reject_redos_shape", |b| {
        b.iter(|| compile(black_box(REDOS_SHAPE), &strict).unwrap_err())
    });
}

fn bench_reject_restricted_profile(c: &mut Criterion) {
    let ecma = FeatureSet::ecma_script_regexp();
    c.bench_function("reject_restricted_profile", |b| {
        b.iter(|| compile(black_box("(?<name>a+)\\k<name>"), ecma).unwrap_err())
    });
}

fn bench_compile_long_literal(c: &mut Criterion) {
    let java = FeatureSet::java_default();
    let pattern = "abcdefgh".repeat(256);
    c.bench_function("compile_long_literal", |b| {
        b.iter(|| compile(black_box(&pattern), java).unwrap())
    });
}

criterion_group!(
    benches,
    bench_compile_simple,
    bench_compile_class_heavy,
    bench_reject_redos_shape,
    bench_reject_restricted_profile,
    bench_compile_long_literal
);
criterion_main!(benches);
