//! Per-year CSV / pruned JSON / metadata files and the root summary.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::bucketing::{YearBucket, YearBuckets};
use crate::paths::{root_metadata_path, BucketPaths, YearFileNames};
use crate::util::write_atomic;

/// `proposals_year_<year>.json`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketDocument<'a> {
    pub generated_at: &'a str,
    pub record_count: usize,
    pub year: &'a str,
    pub proposals: Vec<Map<String, Value>>,
}

/// `metadata_year_<year>.json`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketMetadata<'a> {
    pub year: &'a str,
    pub year_id: &'a str,
    pub generated_at: &'a str,
    pub record_count: usize,
}

/// `proposals_metadata.json`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RootMetadata {
    pub generated_at: String,
    pub total_years: usize,
    pub total_records: usize,
    pub max_records: usize,
    pub batch_size: usize,
    #[serde(rename = "where")]
    pub filter: Value,
}

fn write_json_pretty<T: Serialize>(dest: &Path, value: &T) -> Result<()> {
    write_atomic(dest, |w| {
        serde_json::to_writer_pretty(&mut *w, value)
            .with_context(|| format!("serialize {}", dest.display()))?;
        Ok(())
    })
}

/// Header plus every row, in the fixed column order.
pub fn write_bucket_csv(dest: &Path, bucket: &YearBucket) -> Result<()> {
    write_atomic(dest, |w| {
        let mut csv_w = csv::WriterBuilder::new()
            .has_headers(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(&mut *w);
        for row in &bucket.rows {
            csv_w.serialize(row).with_context(|| format!("csv row in {}", dest.display()))?;
        }
        csv_w.flush()?;
        Ok(())
    })
}

pub fn write_bucket_json(dest: &Path, bucket: &YearBucket, generated_at: &str) -> Result<()> {
    let doc = BucketDocument {
        generated_at,
        record_count: bucket.len(),
        year: &bucket.year,
        proposals: bucket.rows.iter().map(|r| r.pruned()).collect(),
    };
    write_json_pretty(dest, &doc)
}

pub fn write_bucket_metadata(dest: &Path, bucket: &YearBucket, generated_at: &str) -> Result<()> {
    let meta = BucketMetadata {
        year: &bucket.year,
        year_id: &bucket.year_id,
        generated_at,
        record_count: bucket.len(),
    };
    write_json_pretty(dest, &meta)
}

/// Write the three files of one bucket to `paths`.
pub fn write_bucket(paths: &BucketPaths, bucket: &YearBucket, generated_at: &str) -> Result<()> {
    write_bucket_csv(&paths.csv, bucket)?;
    write_bucket_json(&paths.json, bucket, generated_at)?;
    write_bucket_metadata(&paths.metadata, bucket, generated_at)?;
    tracing::debug!(year = %bucket.year, rows = bucket.len(), "bucket written");
    Ok(())
}

/// Write every bucket in bucket order. Returns the files written.
/// No two buckets share a file, even when their years clean up to the same name.
pub fn write_buckets(out_dir: &Path, buckets: &YearBuckets, generated_at: &str) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).with_context(|| format!("create {}", out_dir.display()))?;
    let mut names = YearFileNames::new();
    let mut written = Vec::with_capacity(buckets.len() * 3);
    for bucket in buckets {
        let paths = BucketPaths::for_component(out_dir, &names.claim(&bucket.year));
        write_bucket(&paths, bucket, generated_at)?;
        written.extend(paths.all().iter().map(|p| p.to_path_buf()));
    }
    Ok(written)
}

pub fn write_root_metadata(out_dir: &Path, meta: &RootMetadata) -> Result<PathBuf> {
    fs::create_dir_all(out_dir).with_context(|| format!("create {}", out_dir.display()))?;
    let dest = root_metadata_path(out_dir);
    write_json_pretty(&dest, meta)?;
    Ok(dest)
}
