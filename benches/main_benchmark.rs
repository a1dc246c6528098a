use criterion::{Criterion, criterion_group, criterion_main};
use doit::build::{BuildManifest, parse_make_rule};
use doit::config::ProjectConfig;
use std::hint::black_box;
use std::path::{Path, PathBuf};

const MOCK_CONFIG: &str = r#"
[app]
modules = ["mac", "net"]
type = "application_bundle"
name = "Viewer"
external_frameworks = ["Cocoa", "Metal"]
cflags = "-O2 -std=c++20 -DNAME='\"viewer\"'"
lflags = "-lz"

[tool]
extensions = ["c"]
"#;

fn mock_rule(headers: usize) -> String {
    let mut rule = String::from("main.o: src/main.cpp");
    for i in 0..headers {
        rule.push_str(&format!(" \\\n  include/module_{i}/header_{i}.h"));
    }
    rule.push('\n');
    rule
}

fn mock_sources(count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| PathBuf::from(format!("/project/src/module_{}/file_{i}.cpp", i % 16)))
        .collect()
}

fn bench_parse_make_rule(c: &mut Criterion) {
    let rule = mock_rule(200);
    c.bench_function("parse_make_rule_200_headers", |b| {
        b.iter(|| parse_make_rule(black_box(&rule)))
    });
}

fn bench_manifest(c: &mut Criterion) {
    let sources = mock_sources(1_000);
    c.bench_function("build_manifest_1000_sources", |b| {
        b.iter(|| {
            BuildManifest::new(
                black_box(Path::new("/project/src")),
                black_box(Path::new("/project/obj/app")),
                black_box(&sources),
            )
        })
    });
}

fn bench_config(c: &mut Criterion) {
    c.bench_function("parse_project_config", |b| {
        b.iter(|| {
            let project = ProjectConfig::parse(
                black_box(MOCK_CONFIG),
                Path::new("doit.toml"),
                Path::new("/project"),
            );
            project.and_then(|p| p.target("app"))
        })
    });
}

criterion_group!(benches, bench_parse_make_rule, bench_manifest, bench_config);
criterion_main!(benches);
