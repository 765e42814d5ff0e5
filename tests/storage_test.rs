//! Dataset file tests: encoding, column order and merging with earlier runs

use balita::models::{ArticleRecord, Category};
use balita::storage::{self, CsvDatasetWriter, Dataset};
use std::fs;
use tempfile::TempDir;

fn record(category: Category, url: &str, text: &str) -> ArticleRecord {
    ArticleRecord::new(
        category,
        text.to_string(),
        format!("Headline for {url}"),
        url.to_string(),
        "MindaNews",
    )
}

#[test]
fn test_non_ascii_text_survives() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dataset.csv");
    let text = "Sinabi ni Señora Ñino na “hindi totoo” ang balita – ayon sa DOH.";
    let dataset = Dataset::from_records(vec![record(Category::FactCheck, "https://mindanews.com/a/", text)]);

    CsvDatasetWriter::new(&path).write(&dataset).unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.starts_with('\u{feff}'));
    assert!(raw.contains(text));

    let loaded = storage::csv::read(&path).unwrap();
    assert_eq!(loaded.records()[0].text, text);
}

#[test]
fn test_column_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dataset.csv");
    let dataset = Dataset::from_records(vec![record(
        Category::General,
        "https://mindanews.com/b/",
        "Plain body",
    )]);

    CsvDatasetWriter::new(&path).write(&dataset).unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    let mut lines = raw.trim_start_matches('\u{feff}').lines();
    assert_eq!(lines.next(), Some("text,label,category,title,url,source"));
    assert_eq!(
        lines.next(),
        Some("Plain body,True,true,Headline for https://mindanews.com/b/,https://mindanews.com/b/,MindaNews")
    );
}

#[test]
fn test_merge_with_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dataset.csv");
    let earlier = Dataset::from_records(vec![
        record(Category::FactCheck, "https://mindanews.com/1/", "one"),
        record(Category::General, "https://mindanews.com/2/", "two"),
    ]);
    CsvDatasetWriter::new(&path).write(&earlier).unwrap();

    let mut existing = storage::csv::read(&path).unwrap();
    let added = existing.merge(vec![
        record(Category::General, "https://mindanews.com/1/", "one again"),
        record(Category::General, "https://mindanews.com/3/", "three"),
    ]);
    assert_eq!(added, 1);

    CsvDatasetWriter::new(&path).write(&existing).unwrap();
    let reloaded = storage::csv::read(&path).unwrap();
    assert_eq!(reloaded.len(), 3);
    assert_eq!(reloaded.records()[0].text, "one");

    let counts = reloaded.label_counts();
    assert_eq!(counts["Fake"], 1);
    assert_eq!(counts["True"], 2);
}

#[test]
fn test_overwrite_replaces_previous_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dataset.csv");
    let writer = CsvDatasetWriter::new(&path);

    writer
        .write(&Dataset::from_records(vec![
            record(Category::FactCheck, "https://mindanews.com/1/", "one"),
            record(Category::FactCheck, "https://mindanews.com/2/", "two"),
        ]))
        .unwrap();
    writer
        .write(&Dataset::from_records(vec![record(
            Category::General,
            "https://mindanews.com/3/",
            "three",
        )]))
        .unwrap();

    assert_eq!(storage::csv::read(&path).unwrap().len(), 1);
}

#[test]
fn test_merge_existing_reshuffles_all_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dataset.csv");
    let url = |n: usize| format!("https://mindanews.com/{n}/");

    let earlier = Dataset::from_records((0..10).map(|n| record(Category::FactCheck, &url(n), "earlier")));
    CsvDatasetWriter::new(&path).write(&earlier).unwrap();
    let fresh = Dataset::from_records((5..20).map(|n| record(Category::General, &url(n), "fresh")));

    let (merged, added) = storage::csv::merge_existing(&path, fresh.clone(), 42).unwrap();
    assert_eq!(added, 10);
    assert_eq!(merged.len(), 20);

    let mut appended = earlier.clone();
    appended.merge(fresh.into_records());
    assert_ne!(merged.records(), appended.records(), "fresh rows must not stay at the tail");

    let mut expected = appended;
    expected.shuffle(42);
    assert_eq!(merged.records(), expected.records());
}
