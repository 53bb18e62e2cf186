use std::fs;
use std::path::Path;

use tempfile::tempdir;

use super::*;
use crate::logic::features::layout::dataset_header;
use crate::logic::features::{extract, FeatureRecord};

fn record(url: &str, label: u8) -> FeatureRecord {
    extract(url, Some(label), None)
}

fn header_line() -> String {
    dataset_header().join(",")
}

fn write(path: &Path, content: &str) {
    fs::write(path, content).unwrap();
}

// ============================================================================
// STORE
// ============================================================================

#[test]
fn test_missing_file_reads_empty() {
    let dir = tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("training_data.csv"));
    assert!(!store.exists());
    assert!(store.read_all().unwrap().records.is_empty());
    assert!(store.read_url_set().unwrap().is_empty());
}

#[test]
fn test_merge_append_round_trip() {
    let dir = tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("training_data.csv"));

    let mut with_page = record("https://shop.example.com/a,b?q=1,2", 0);
    with_page.features.form_count = 3;
    with_page.features.has_login_form = 1;
    let batch = vec![
        with_page,
        record("http://user@phish-login.example.com/secure/verify?x=1", 1),
        record("https://quoted\"url.example.com/", 1),
    ];

    assert_eq!(store.merge_append(&batch).unwrap(), 3);
    let read = store.read_all().unwrap();
    assert_eq!(read.skipped_rows, 0);
    assert_eq!(read.records, batch);

    let urls = store.read_url_set().unwrap();
    assert!(urls.contains("https://shop.example.com/a,b?q=1,2"));
    assert_eq!(urls.len(), 3);
}

#[test]
fn test_header_is_pinned_layout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("training_data.csv");
    let store = DatasetStore::new(&path);
    store.merge_append(&[record("https://a.com", 0)]).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().next().unwrap(), header_line());
}

#[test]
fn test_merge_append_keeps_existing_rows() {
    let dir = tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("training_data.csv"));

    store.merge_append(&[record("https://a.com", 0), record("https://b.com", 0)]).unwrap();
    let total = store.merge_append(&[record("https://c.com", 1)]).unwrap();
    assert_eq!(total, 3);

    let urls: Vec<String> = store.read_all().unwrap().records.into_iter().map(|r| r.url).collect();
    assert_eq!(urls, vec!["https://a.com", "https://b.com", "https://c.com"]);
}

#[test]
fn test_truncated_and_malformed_rows_skipped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("training_data.csv");
    let good = "https://a.com,0,13,0,0,0,0,0,0,0,1,5,0,0,0,1,0,0,0,0";
    let float_form = "https://b.com,1.0,13.0,0,0,0,0,0,0,0,1,5,0,0,0,1,0,0,0,0";
    let bad_value = "https://c.com,1,abc,0,0,0,0,0,0,0,1,5,0,0,0,1,0,0,0,0";
    let bad_label = "https://d.com,7,13,0,0,0,0,0,0,0,1,5,0,0,0,1,0,0,0,0";
    let truncated = "https://e.com,1,13,0,0";
    write(
        &path,
        &format!("{}\n{}\n{}\n{}\n{}\n{}", header_line(), good, float_form, bad_value, bad_label, truncated),
    );

    let store = DatasetStore::new(&path);
    let read = store.read_all().unwrap();
    assert_eq!(read.records.len(), 2);
    assert_eq!(read.skipped_rows, 3);
    assert_eq!(read.records[1].label, Some(1));
    assert_eq!(read.records[1].features.url_length, 13);

    // a url whose row is dropped on read does not count as stored
    let urls = store.read_url_set().unwrap();
    assert_eq!(urls.len(), 2);
    assert!(urls.contains("https://a.com"));
    assert!(!urls.contains("https://e.com"));
}

#[test]
fn test_columns_read_by_name() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("training_data.csv");
    let mut header = dataset_header();
    header.swap(0, 2);
    let mut row = vec!["0"; header.len()];
    row[2] = "https://a.com";
    row[1] = "1";
    row[0] = "13";
    write(&path, &format!("{}\n{}\n", header.join(","), row.join(",")));

    let read = DatasetStore::new(&path).read_all().unwrap();
    assert_eq!(read.records[0].url, "https://a.com");
    assert_eq!(read.records[0].features.url_length, 13);
}

#[test]
fn test_missing_layout_column_is_schema_mismatch() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("training_data.csv");
    write(&path, "url,label,url_length\nhttps://a.com,0,13\n");

    let store = DatasetStore::new(&path);
    match store.read_all() {
        Err(DatasetError::SchemaMismatch { missing, .. }) => {
            assert!(missing.contains(&"has_at_symbol".to_string()));
            assert!(!missing.contains(&"url_length".to_string()));
        }
        other => panic!("expected schema mismatch, got {:?}", other.map(|r| r.records.len())),
    }
    // a mismatched file is never overwritten
    assert!(store.merge_append(&[record("https://b.com", 0)]).is_err());
    assert_eq!(fs::read_to_string(&path).unwrap(), "url,label,url_length\nhttps://a.com,0,13\n");
}

#[test]
fn test_unwritable_location_is_persistence_error() {
    let dir = tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("no/such/dir/training_data.csv"));
    let err = store.merge_append(&[record("https://a.com", 0)]).unwrap_err();
    assert!(err.is_persistence(), "{}", err);
}

#[test]
fn test_out_of_range_label_rejected_before_write() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("training_data.csv");
    let store = DatasetStore::new(&path);
    store.merge_append(&[record("https://a.com", 0)]).unwrap();
    let before = fs::read_to_string(&path).unwrap();

    let err = store
        .merge_append(&[record("https://b.com", 1), record("https://x.com", 2)])
        .unwrap_err();
    match err {
        DatasetError::InvalidLabel { url, label } => {
            assert_eq!(url, "https://x.com");
            assert_eq!(label, 2);
        }
        other => panic!("expected invalid label, got {}", other),
    }
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_no_temp_file_left_behind() {
    let dir = tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("training_data.csv"));
    store.merge_append(&[record("https://a.com", 0)]).unwrap();
    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["training_data.csv".to_string()]);
}

#[test]
fn test_stats() {
    let dir = tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("training_data.csv"));
    let mut scanned = record("https://b.com", 1);
    scanned.features.image_count = 4;
    store
        .merge_append(&[record("https://a.com", 0), scanned, record("https://a.com", 0)])
        .unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.total_rows, 3);
    assert_eq!(stats.legitimate, 2);
    assert_eq!(stats.suspicious, 1);
    assert_eq!(stats.unique_urls, 2);
    assert_eq!(stats.duplicate_rows, 1);
    assert_eq!(stats.page_fields_zero, 2);
    assert!(stats.last_modified.is_some());
    assert!(stats.to_string().contains("Total rows"));
}

// ============================================================================
// SOURCES
// ============================================================================

#[test]
fn test_resolve_column_priority() {
    let urls = source::URL_COLUMN_ALIASES;
    let labels = source::LABEL_COLUMN_ALIASES;
    let headers = ["id", "Website", "URL", "Status"];
    assert_eq!(
        resolve_column(&headers, None, urls, AliasOrder::Table),
        ColumnMatch::Found { index: 2, name: "URL".to_string() }
    );
    assert_eq!(resolve_column(&headers, Some("website"), urls, AliasOrder::Table).index(), Some(1));
    assert_eq!(resolve_column(&headers, Some("id"), urls, AliasOrder::Table).index(), Some(0));
    assert_eq!(resolve_column(&headers, None, labels, AliasOrder::Header).index(), Some(3));
    assert_eq!(resolve_column(&["a", "b"], None, labels, AliasOrder::Header), ColumnMatch::NotFound);
}

#[test]
fn test_label_column_first_in_file_order() {
    let labels = source::LABEL_COLUMN_ALIASES;
    let headers = ["type", "url", "label"];
    assert_eq!(
        resolve_column(&headers, None, labels, AliasOrder::Header),
        ColumnMatch::Found { index: 0, name: "type".to_string() }
    );
    assert_eq!(resolve_column(&headers, None, labels, AliasOrder::Table).index(), Some(2));
    // a requested column still wins over the scan
    assert_eq!(resolve_column(&headers, Some("label"), labels, AliasOrder::Header).index(), Some(2));

    let dir = tempdir().unwrap();
    let path = dir.path().join("mixed.csv");
    write(&path, "Class,url,Label
1,https://a.test/,0
");
    let load = load_work_items(&path, &SourceOptions::default()).unwrap();
    assert_eq!(load.label_column.as_deref(), Some("Class"));
    assert_eq!(load.items, vec![WorkItem::new("https://a.test/", 1)]);

    let options = SourceOptions { label_column: Some("label".to_string()), ..SourceOptions::default() };
    let load = load_work_items(&path, &options).unwrap();
    assert_eq!(load.label_column.as_deref(), Some("Label"));
    assert_eq!(load.items[0].label, 0);
}

#[test]
fn test_normalize_label() {
    for raw in ["0", "Legitimate", " benign ", "SAFE", "good", "False", "0.0", "0.4"] {
        assert_eq!(normalize_label(raw), Some(0), "{raw}");
    }
    for raw in ["1", "phishing", "Malicious", "suspicious", "TRUE", "bad", "2", "-1", "1.0"] {
        assert_eq!(normalize_label(raw), Some(1), "{raw}");
    }
    for raw in ["", "unknown", "nan", "inf"] {
        assert_eq!(normalize_label(raw), None, "{raw}");
    }
}

#[test]
fn test_load_work_items_with_labels() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("urls.csv");
    write(
        &path,
        "Domain,Type\n\
         https://good.com,benign\n\
         http://bad.com/login,phishing\n\
         ftp://skip.com,phishing\n\
         bad.com,phishing\n\
         https://weird.com,maybe\n\
         \"https://comma.com/a,b\",1\n",
    );

    let load = load_work_items(&path, &SourceOptions::default()).unwrap();
    assert_eq!(load.url_column, "Domain");
    assert_eq!(load.label_column.as_deref(), Some("Type"));
    assert_eq!(
        load.items,
        vec![
            WorkItem::new("https://good.com", 0),
            WorkItem::new("http://bad.com/login", 1),
            WorkItem::new("https://comma.com/a,b", 1),
        ]
    );
    assert_eq!(load.skipped_invalid_url, 2);
    assert_eq!(load.skipped_bad_label, 1);
}

#[test]
fn test_load_work_items_default_label() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("phishtank.csv");
    write(&path, "phish_id,url\n1,https://a.test/\n2,  https://b.test/  \n");

    let options = SourceOptions { default_label: 1, ..SourceOptions::default() };
    let load = load_work_items(&path, &options).unwrap();
    assert_eq!(load.label_column, None);
    assert_eq!(load.items.len(), 2);
    assert_eq!(load.items[1].url, "https://b.test/");
    assert!(load.items.iter().all(|i| i.label == 1));
}

#[test]
fn test_load_work_items_rejects_default_label_out_of_range() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("phishtank.csv");
    write(&path, "url
https://a.test/
");

    let options = SourceOptions { default_label: 2, ..SourceOptions::default() };
    assert!(matches!(
        load_work_items(&path, &options),
        Err(SourceError::InvalidDefaultLabel(2))
    ));
    assert!(is_valid_label(0) && is_valid_label(1) && !is_valid_label(2));
    assert!(!WorkItem::new("https://a.test/", 7).has_valid_label());
}

#[test]
fn test_load_work_items_missing_url_column() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    write(&path, "id,host\n1,a.com\n");
    match load_work_items(&path, &SourceOptions::default()) {
        Err(SourceError::MissingUrlColumn { available, .. }) => assert_eq!(available, vec!["id", "host"]),
        other => panic!("unexpected: {:?}", other.map(|l| l.items)),
    }
}

#[test]
fn test_seed_and_limit() {
    let seed = seed_work_items();
    assert_eq!(seed.iter().filter(|i| i.label == 0).count(), 10);
    assert_eq!(seed.iter().filter(|i| i.label == 1).count(), 3);

    let limited = limit_per_label(seed, 2);
    assert_eq!(limited.len(), 4);
    assert_eq!(limited[0].url, "https://www.google.com");
    assert_eq!(limited[2].url, "http://phishy-demo.test");
}
