use docsearch_core::persist::{
    deserialize, load_index, load_meta, save_index, save_meta, serialize, IndexPaths, MetaFile, FORMAT_VERSION,
};
use docsearch_core::source::load_records;
use docsearch_core::{build, search, Category, Error, FragmentRecord, IndexBuilder, TokenizerConfig};
use std::fs;
use tempfile::tempdir;

fn corpus() -> Vec<FragmentRecord> {
    vec![
        FragmentRecord::new("instability/#Type-instability", "Type instability", "Type instability", "", Category::Section),
        FragmentRecord::new(
            "instability/",
            "Type instability",
            "Type instability",
            "A global variable is anything defined in the global scope.",
            Category::Page,
        ),
        FragmentRecord::new("mutability/", "Mutability", "Immutable variables", "mutable heap stack", Category::Page),
    ]
}

#[test]
fn round_trip_is_exact() {
    let (index, _) = build(corpus());
    let bytes = serialize(&index).unwrap();
    let back = deserialize(&bytes).unwrap();
    assert_eq!(back, index);
    assert_eq!(serialize(&back).unwrap(), bytes);
}

#[test]
fn builds_are_byte_identical() {
    let a = serialize(&build(corpus()).0).unwrap();
    let b = serialize(&build(corpus()).0).unwrap();
    assert_eq!(a, b);
}

fn with_skipped_records() -> Vec<FragmentRecord> {
    let mut orphan = FragmentRecord::new("", "Orphan", "No location", "text", Category::Page);
    orphan.location = None;
    let mut unknown = FragmentRecord::new("x/", "X", "Chapter", "text", Category::Page);
    unknown.category = Some("chapter".into());
    let mut records = corpus();
    records.insert(1, orphan);
    records.push(FragmentRecord::new("empty/", "Empty", "", "  ", Category::Text));
    records.push(unknown);
    records
}

fn non_ascii() -> Vec<FragmentRecord> {
    vec![
        FragmentRecord::new("unicode/#Größe", "Unicode", "Größe und Maß", "Zeichenketten sind UTF-8 kodiert", Category::Section),
        FragmentRecord::new("unicode/", "Unicode", "文字列", "julia> s = \"∀ x ∈ ℝ\" café ＡＢＣ", Category::Page),
        FragmentRecord::new("emoji/", "Emoji", "🦀 crab", "naïve résumé façade", Category::Text),
    ]
}

#[test]
fn round_trip_and_determinism_across_corpora() {
    let stemmed = TokenizerConfig { stem: true, ..Default::default() };
    let wide = TokenizerConfig { min_token_len: 1, stem: false };
    let cases: Vec<(&str, TokenizerConfig, Vec<FragmentRecord>, usize)> = vec![
        ("empty", TokenizerConfig::default(), Vec::new(), 0),
        ("sample", TokenizerConfig::default(), corpus(), 3),
        ("skipped records", TokenizerConfig::default(), with_skipped_records(), 3),
        ("stemmed", stemmed, corpus(), 3),
        ("short tokens", wide, corpus(), 3),
        ("non-ascii", TokenizerConfig::default(), non_ascii(), 3),
        ("non-ascii stemmed", stemmed, non_ascii(), 3),
    ];

    for (name, config, records, expected) in cases {
        let builder = IndexBuilder::new(config);
        let (index, _) = builder.build(records.clone());
        assert_eq!(index.fragment_count(), expected, "{name}");

        let bytes = serialize(&index).unwrap();
        let back = deserialize(&bytes).unwrap();
        assert_eq!(back, index, "{name}");
        assert_eq!(back.tokenizer_config(), config, "{name}");
        assert_eq!(serialize(&back).unwrap(), bytes, "{name}");

        let (again, _) = builder.build(records);
        assert_eq!(serialize(&again).unwrap(), bytes, "{name}");
    }
}

#[test]
fn skipped_records_keep_ids_dense_after_reload() {
    let (index, report) = build(with_skipped_records());
    assert_eq!(report.skipped.len(), 3);
    let back = deserialize(&serialize(&index).unwrap()).unwrap();
    let ids: Vec<u32> = back.fragments().iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(back.fragment(2).unwrap().title, "Immutable variables");
}

#[test]
fn non_ascii_survives_reload_and_is_searchable() {
    let (index, _) = build(non_ascii());
    let back = deserialize(&serialize(&index).unwrap()).unwrap();
    assert_eq!(back.fragment(0).unwrap().location, "unicode/#Größe");
    let res = search(&back, "GRÖSSE größe", 10, 0).unwrap();
    assert_eq!(res.hits[0].fragment.id, 0);
    let res = search(&back, "abc", 10, 0).unwrap();
    assert_eq!(res.hits[0].fragment.id, 1);
}

#[test]
fn save_and_load_from_disk() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    let (index, _) = build(corpus());
    save_index(&paths.index(), &index).unwrap();
    let meta = MetaFile { num_fragments: 3, num_terms: index.term_count() as u32, created_at: "2024-01-01T00:00:00Z".into(), version: FORMAT_VERSION };
    save_meta(&paths, &meta).unwrap();

    let loaded = load_index(&paths.index()).unwrap();
    assert_eq!(loaded, index);
    assert_eq!(load_meta(&paths).unwrap(), meta);
    assert!(!dir.path().join("index.bin.tmp").exists());

    let res = search(&loaded, "global", 10, 0).unwrap();
    assert_eq!(res.hits[0].fragment.location, "instability/");
}

#[test]
fn loading_a_foreign_file_fails_fast() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.bin");
    fs::write(&path, b"var documenterSearchIndex = {}").unwrap();
    let err = load_index(&path).unwrap_err();
    assert!(matches!(err, Error::NotAnIndex));
}

#[test]
fn loads_records_from_directory_in_order() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("b.jsonl"),
        "{\"location\":\"b/\",\"title\":\"Second\",\"category\":\"page\"}\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("a.js"),
        "var documenterSearchIndex = {\"docs\":[{\"location\":\"a/\",\"title\":\"First\",\"text\":\"\",\"category\":\"section\"}]}",
    )
    .unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let records = load_records(dir.path()).unwrap();
    let titles: Vec<_> = records.iter().map(|r| r.title.clone().unwrap()).collect();
    assert_eq!(titles, vec!["First", "Second"]);
}

#[cfg(unix)]
#[test]
fn unreadable_directory_entries_fail_the_load() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("a.json"),
        "[{\"location\":\"a/\",\"title\":\"First\",\"category\":\"page\"}]",
    )
    .unwrap();
    std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("broken.json")).unwrap();

    let err = load_records(dir.path()).unwrap_err();
    assert!(matches!(err, Error::Io(_)), "{err}");
}
