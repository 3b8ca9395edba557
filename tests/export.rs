#[path = "common/mod.rs"]
mod common;

use budget_export::{
    format_timestamp, year_file_component, BucketPaths, YearFileNames, ProposalExporter, COLUMNS, METADATA_FILE_NAME, UNKNOWN_YEAR,
};
use common::*;
use serde_json::json;
use std::fs;

fn exporter(out: &std::path::Path) -> ProposalExporter {
    ProposalExporter::new().output_dir(out).progress(false)
}

/// count=3, batch=2, cap=10 over two years: one bucket per distinct year, each
/// with CSV, pruned JSON and metadata, plus the root summary.
#[test]
fn export_writes_per_year_files_and_root_summary() {
    let tmp = scratch_dir();
    let out = tmp.path().join("export");
    let mut first = full_proposal();
    first["id"] = json!("1");
    let source = MemorySource::new(vec![first, proposal("2", Some(2023)), proposal("3", Some(2024))]);

    let summary = exporter(&out)
        .batch_size(2)
        .max_records(10)
        .filter(json!({ "publishStatus": { "equals": "published" } }))
        .run_at(&source, SYNCED_AT)
        .unwrap();

    assert_eq!(summary.total_records, 3);
    assert_eq!(summary.total_years, 2);
    assert_eq!(summary.files.len(), 6);
    assert_eq!(
        file_names(&out),
        vec![
            "metadata_year_2023.json",
            "metadata_year_2024.json",
            METADATA_FILE_NAME,
            "proposals_year_2023.csv",
            "proposals_year_2023.json",
            "proposals_year_2024.csv",
            "proposals_year_2024.json",
        ]
    );

    let meta = read_json(&out.join("metadata_year_2024.json"));
    assert_eq!(meta, json!({ "year": "2024", "yearId": "7", "generatedAt": SYNCED_AT, "recordCount": 2 }));

    let doc = read_json(&out.join("proposals_year_2024.json"));
    assert_eq!(doc["generatedAt"], SYNCED_AT);
    assert_eq!(doc["recordCount"], 2);
    assert_eq!(doc["year"], "2024");
    let proposals = doc["proposals"].as_array().unwrap();
    assert_eq!(proposals[0]["proposal_id"], "1");
    assert_eq!(proposals[1]["proposal_id"], "3");
    for p in proposals {
        let obj = p.as_object().unwrap();
        assert!(!obj.contains_key("last_synced_at"));
        assert!(obj.values().all(|v| v.as_str().map_or(false, |s| !s.is_empty())));
    }

    let root = read_json(&out.join(METADATA_FILE_NAME));
    assert_eq!(
        root,
        json!({
            "generatedAt": SYNCED_AT,
            "totalYears": 2,
            "totalRecords": 3,
            "maxRecords": 10,
            "batchSize": 2,
            "where": { "publishStatus": { "equals": "published" } }
        })
    );
    assert_eq!(summary.root_metadata, Some(out.join(METADATA_FILE_NAME)));
}

/// CSV output: header in fixed column order, one line per row, every column
/// present even when empty, and values with commas quoted.
#[test]
fn csv_has_fixed_header_and_all_columns() {
    let tmp = scratch_dir();
    let out = tmp.path().to_path_buf();
    let mut p = proposal("9", Some(2022));
    p["reason"] = json!("too high, cut it");
    let source = MemorySource::new(vec![p, json!({ "id": "10", "year": { "year": 2022 } })]);

    exporter(&out).run_at(&source, SYNCED_AT).unwrap();

    let csv_text = fs::read_to_string(out.join("proposals_year_2022.csv")).unwrap();
    let mut rdr = csv::Reader::from_reader(csv_text.as_bytes());
    let headers: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, COLUMNS.iter().map(|c| c.to_string()).collect::<Vec<_>>());

    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.len() == COLUMNS.len()));
    assert_eq!(&rows[0][0], "9");
    assert_eq!(&rows[0][1], "減列");
    assert_eq!(&rows[0][2], "通過");
    assert_eq!(&rows[0][5], "too high, cut it");
    assert_eq!(&rows[1][1], "", "missing tags stay as empty columns");
    assert_eq!(&rows[1][25], SYNCED_AT);
    assert!(csv_text.contains("\"too high, cut it\""));
}

/// Records without a year go to the "unknown" bucket files.
#[test]
fn missing_year_goes_to_unknown_bucket() {
    let tmp = scratch_dir();
    let out = tmp.path().to_path_buf();
    let source = MemorySource::new(vec![proposal("1", None), proposal("2", None)]);
    let summary = exporter(&out).run_at(&source, SYNCED_AT).unwrap();

    assert_eq!(summary.total_years, 1);
    let meta = read_json(&out.join(format!("metadata_year_{UNKNOWN_YEAR}.json")));
    assert_eq!(meta["year"], UNKNOWN_YEAR);
    assert_eq!(meta["yearId"], "");
    assert!(out.join("proposals_year_unknown.csv").exists());
}

/// Zero matching records: zero summary and nothing on disk, not even the directory.
#[test]
fn empty_export_writes_nothing() {
    let tmp = scratch_dir();
    let out = tmp.path().join("never_created");
    let source = MemorySource::new(Vec::new());
    let summary = exporter(&out).run_at(&source, SYNCED_AT).unwrap();

    assert_eq!(summary.total_records, 0);
    assert_eq!(summary.total_years, 0);
    assert!(summary.files.is_empty());
    assert_eq!(summary.root_metadata, None);
    assert!(!out.exists());
}

/// A failure mid-pagination leaves no partial output behind.
#[test]
fn failed_fetch_writes_nothing() {
    let tmp = scratch_dir();
    let out = tmp.path().join("out");
    let source = MemorySource::new((1..=6).map(|i| proposal(&i.to_string(), Some(2024))).collect()).failing_on_page(2);
    assert!(exporter(&out).batch_size(2).run_at(&source, SYNCED_AT).is_err());
    assert!(file_names(&out).is_empty());
}

/// Re-running against the same data with the same cap yields the same rows.
#[test]
fn reruns_are_deterministic() {
    let data: Vec<_> = (1..=9).map(|i| proposal(&i.to_string(), Some(2020 + (i % 3) as i64))).collect();
    let collect = |stamp: &str| {
        let source = MemorySource::new(data.clone());
        let (buckets, _) = ProposalExporter::new().batch_size(4).max_records(7).progress(false).collect(&source, stamp).unwrap();
        buckets
            .iter()
            .map(|b| {
                let rows: Vec<_> = b.rows.iter().map(|r| (r.proposal_id.clone(), r.year.clone())).collect();
                (b.year.clone(), rows)
            })
            .collect::<Vec<_>>()
    };
    let a = collect("2024-01-01T00:00:00.000Z");
    let b = collect("2024-06-01T00:00:00.000Z");
    assert_eq!(a, b);
    assert_eq!(a.iter().map(|(_, rows)| rows.len()).sum::<usize>(), 7);
    assert_eq!(a[0].0, "2021", "bucket order follows first appearance");
}

/// Year strings are used verbatim when safe and sanitized before touching the filesystem.
#[test]
fn unsafe_year_strings_are_sanitized() {
    assert_eq!(year_file_component("2024"), "2024");
    assert_eq!(year_file_component(""), UNKNOWN_YEAR);
    assert_eq!(year_file_component("../../etc"), ".._.._etc");
    assert_eq!(year_file_component(".."), "__");
    assert_eq!(year_file_component("民國113"), "__113");

    let tmp = scratch_dir();
    let out = tmp.path().to_path_buf();
    let mut p = proposal("1", None);
    p["year"] = json!({ "id": "x", "year": "../escape" });
    exporter(&out).run_at(&MemorySource::new(vec![p]), SYNCED_AT).unwrap();

    let paths = BucketPaths::new(&out, "../escape");
    assert!(paths.csv.starts_with(&out));
    assert!(paths.csv.exists());
    assert_eq!(read_json(&paths.metadata)["year"], "../escape", "documents keep the verbatim year");
}

/// Timestamps are UTC with exactly three fractional digits.
#[test]
fn timestamps_have_millisecond_precision() {
    use time::macros::datetime;
    assert_eq!(format_timestamp(datetime!(2024-05-01 08:30:00.1239 UTC)).unwrap(), SYNCED_AT);
    assert_eq!(format_timestamp(datetime!(2024-05-01 16:30:00 +8)).unwrap(), "2024-05-01T08:30:00.000Z");
}

/// Distinct years that clean up to the same file name each keep their own files.
#[test]
fn colliding_year_names_do_not_overwrite() {
    let tmp = scratch_dir();
    let out = tmp.path().to_path_buf();
    let mut a = proposal("1", None);
    a["year"] = json!({ "id": "a", "year": "2024/1" });
    let mut b = proposal("2", None);
    b["year"] = json!({ "id": "b", "year": "2024:1" });

    let summary = exporter(&out).run_at(&MemorySource::new(vec![a, b]), SYNCED_AT).unwrap();
    assert_eq!(summary.total_years, 2);
    assert_eq!(summary.files.len(), 6);
    assert_eq!(file_names(&out).len(), 7);

    let first = read_json(&out.join("metadata_year_2024_1.json"));
    let second = read_json(&out.join("metadata_year_2024_1_2.json"));
    assert_eq!((first["year"].as_str(), first["yearId"].as_str()), (Some("2024/1"), Some("a")));
    assert_eq!((second["year"].as_str(), second["yearId"].as_str()), (Some("2024:1"), Some("b")));

    let mut rows = 0;
    for name in ["proposals_year_2024_1.csv", "proposals_year_2024_1_2.csv"] {
        let text = fs::read_to_string(out.join(name)).unwrap();
        rows += csv::Reader::from_reader(text.as_bytes()).records().count();
    }
    assert_eq!(rows, 2);

    let mut names = YearFileNames::new();
    assert_eq!(names.claim("2024/1"), "2024_1");
    assert_eq!(names.claim("2024:1"), "2024_1_2");
    assert_eq!(names.claim("2024_1_2"), "2024_1_2_2", "a real year never reuses a suffixed name");
    assert_eq!(names.claim("2025"), "2025");
}
