//! Parsing and Aggregation Benchmarks
//!
//! Benchmarks for profile parsing and domain aggregation.
//!
//! Run with: `cargo bench --bench parse_ops`

use covgate::coverage::{CoberturaParser, LcovParser, NativeParser};
use covgate::policy::{AnnotationMap, DomainDirectories};
use covgate::{CoverageMap, CoverageStat, DomainMatcher, DomainSpec, Policy, ProfileParser};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::path::PathBuf;

fn native_profile(files: usize, blocks: usize) -> String {
    let mut out = String::from("mode: atomic\n");
    for f in 0..files {
        for b in 0..blocks {
            out.push_str(&format!(
                "example.com/app/pkg{}/file{f}.go:{b}.1,{b}.40 3 {}\n",
                f % 8,
                b % 3
            ));
        }
    }
    out
}

fn lcov_profile(files: usize, lines: usize) -> String {
    let mut out = String::new();
    for f in 0..files {
        out.push_str(&format!("SF:src/pkg{}/file{f}.rs\n", f % 8));
        for l in 0..lines {
            out.push_str(&format!("DA:{l},{}\n", l % 4));
        }
        out.push_str("end_of_record\n");
    }
    out
}

fn cobertura_profile(classes: usize, lines: usize) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?><coverage><packages><package name=\"p\"><classes>");
    for c in 0..classes {
        out.push_str(&format!("<class name=\"C{c}\" filename=\"pkg/mod{c}.py\"><lines>"));
        for l in 0..lines {
            out.push_str(&format!("<line number=\"{l}\" hits=\"{}\"/>", l % 2));
        }
        out.push_str("</lines></class>");
    }
    out.push_str("</classes></package></packages></coverage>");
    out
}

fn bench_native_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("native_parse");

    for files in [10, 100, 1000] {
        let profile = native_profile(files, 20);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{files}_files")),
            &profile,
            |bench, profile| {
                bench.iter(|| black_box(NativeParser.parse_str(black_box(profile))));
            },
        );
    }

    group.finish();
}

fn bench_lcov_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("lcov_parse");

    for files in [10, 100, 1000] {
        let profile = lcov_profile(files, 50);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{files}_files")),
            &profile,
            |bench, profile| {
                bench.iter(|| black_box(LcovParser.parse_str(black_box(profile))));
            },
        );
    }

    group.finish();
}

fn bench_cobertura_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("cobertura_parse");

    for classes in [10, 100, 500] {
        let profile = cobertura_profile(classes, 50);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{classes}_classes")),
            &profile,
            |bench, profile| {
                bench.iter(|| black_box(CoberturaParser.parse_str(black_box(profile))));
            },
        );
    }

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let domains: Vec<DomainSpec> = (0..8)
        .map(|i| DomainSpec::new(format!("pkg{i}"), &[format!("./pkg{i}/...").as_str()]))
        .collect();
    let policy = Policy::new(80.0, domains).unwrap_or_else(|e| panic!("{e}"));

    let mut directories = DomainDirectories::new();
    for i in 0..8 {
        directories.insert(format!("pkg{i}"), vec![PathBuf::from(format!("/repo/pkg{i}"))]);
    }
    let matcher = DomainMatcher::new(&policy, &directories, "/repo", &["**/*_gen.go"])
        .unwrap_or_else(|e| panic!("{e}"));

    let mut files = CoverageMap::new();
    for f in 0..5000 {
        files.insert(format!("pkg{}/file{f}.go", f % 8), CoverageStat::new(7, 10));
    }
    let annotations = AnnotationMap::new();

    c.bench_function("aggregate_5000_files", |bench| {
        bench.iter(|| black_box(matcher.aggregate(black_box(&files), &annotations)));
    });
}

criterion_group!(
    benches,
    bench_native_parse,
    bench_lcov_parse,
    bench_cobertura_parse,
    bench_aggregate
);
criterion_main!(benches);
