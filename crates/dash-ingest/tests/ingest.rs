//! Integration tests for CSV ingestion and classification.

use std::fs;

use dash_ingest::{SourceFile, classify, parse_batch, parse_csv};
use proptest::prelude::*;

const GA_EXPORT: &str = "\
# ----------------------------------------
# Acquisition overview
Session source,Sessions,Bounce rate,Average session duration
google,1200,\"45,5%\",62.5
(direct),800,38%,71
newsletter,150,\"60,1%\",40

";

#[test]
fn skips_comment_block_and_trailing_blank_line() {
    let table = parse_csv(GA_EXPORT);
    assert_eq!(
        table.header,
        vec![
            "Session source",
            "Sessions",
            "Bounce rate",
            "Average session duration"
        ]
    );
    assert_eq!(table.records.len(), 3);
    assert_eq!(table.records[0].get("Bounce rate"), "45,5%");
    assert_eq!(table.records[1].get("Session source"), "(direct)");
}

#[test]
fn classifies_analytics_export() {
    let table = parse_csv(GA_EXPORT);
    let numeric = classify(&table.records);
    assert!(numeric.contains("Sessions"));
    assert!(numeric.contains("Bounce rate"));
    assert!(numeric.contains("Average session duration"));
    assert!(!numeric.contains("Session source"));
}

#[test]
fn reads_batch_from_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    let first = dir.path().join("week1.csv");
    let second = dir.path().join("week2.csv");
    fs::write(&first, GA_EXPORT).expect("write week1");
    fs::write(&second, "Source,Users\nbing,4\n").expect("write week2");

    let files = vec![
        SourceFile::from_path(&first).expect("read week1"),
        SourceFile::from_path(&second).expect("read week2"),
    ];
    let batch = parse_batch(&files);
    assert_eq!(batch.records.len(), 3);
    assert_eq!(batch.accepted, vec!["week1.csv"]);
    assert_eq!(batch.skipped.len(), 1);
    assert!(batch.skipped[0].reason.to_string().contains("week2.csv"));
}

proptest! {
    #[test]
    fn classification_is_deterministic(values in prop::collection::vec("[0-9a-z%,.]{0,6}", 0..40)) {
        let text = std::iter::once("Label,Value".to_string())
            .chain(values.iter().enumerate().map(|(idx, value)| format!("row{idx},\"{value}\"")))
            .collect::<Vec<_>>()
            .join("\n");
        let first = classify(&parse_csv(&text).records);
        let second = classify(&parse_csv(&text).records);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn kept_records_always_have_every_column(lines in prop::collection::vec("[a-z0-9,# ]{0,12}", 0..20)) {
        let text = format!("A,B,C\n{}", lines.join("\n"));
        let table = parse_csv(&text);
        for record in &table.records {
            prop_assert_eq!(record.len(), 3);
            prop_assert!(!record.get("A").starts_with('#'));
        }
    }
}
