use criterion::{criterion_group, criterion_main, Criterion};
use docsearch_core::tokenizer::tokenize;
use docsearch_core::{build, search, Category, FragmentRecord};

const TEXT: &str = "Type instabilities generally occur when we try to use global variables inside functions, \
that is, without passing these variables as parameters to the functions. A global variable is anything \
defined in the global scope, that is outside any function or other structure that defines a scope.";

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("tokenize_paragraph", |b| b.iter(|| tokenize(TEXT)));
}

fn bench_build_and_search(c: &mut Criterion) {
    let records: Vec<FragmentRecord> = (0..500)
        .map(|i| FragmentRecord::new(&format!("page{i}/"), "Page", &format!("Section {i}"), TEXT, Category::Page))
        .collect();
    c.bench_function("build_500", |b| b.iter(|| build(records.clone())));
    let (index, _) = build(records);
    c.bench_function("search_two_terms", |b| b.iter(|| search(&index, "global scope", 10, 0)));
}

criterion_group!(benches, bench_tokenize, bench_build_and_search);
criterion_main!(benches);
