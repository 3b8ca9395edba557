use anyhow::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::bucketing::YearBuckets;
use crate::client::{KeystoneSource, ProposalSource};
use crate::config::ExportOptions;
use crate::pagination::{paginate, PaginationStats};
use crate::progress::make_count_progress;
use crate::util::{init_tracing_once, rfc3339_now};
use crate::writer::{write_buckets, write_root_metadata, RootMetadata};

/// Outcome of one export run.
#[derive(Clone, Debug, Default)]
pub struct ExportSummary {
    pub generated_at: String,
    pub total_years: usize,
    pub total_records: usize,
    /// Per-bucket files, three per year in bucket order.
    pub files: Vec<PathBuf>,
    /// `None` when nothing matched and nothing was written.
    pub root_metadata: Option<PathBuf>,
}

#[derive(Clone, Default)]
pub struct ProposalExporter {
    pub(crate) opts: ExportOptions,
}

impl ProposalExporter {
    pub fn new() -> Self {
        Self { opts: ExportOptions::default() }
    }

    pub fn with_options(opts: ExportOptions) -> Self {
        Self { opts }
    }

    // -------- Builder methods --------
    pub fn endpoint(mut self, url: impl AsRef<str>) -> Self { self.opts = self.opts.with_endpoint(url); self }
    pub fn token(mut self, token: impl AsRef<str>) -> Self { self.opts = self.opts.with_token(token); self }
    pub fn batch_size(mut self, n: usize) -> Self { self.opts = self.opts.with_batch_size(n); self }
    pub fn max_records(mut self, n: usize) -> Self { self.opts = self.opts.with_max_records(n); self }
    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self { self.opts = self.opts.with_output_dir(dir); self }
    pub fn filter(mut self, filter: Value) -> Self { self.opts = self.opts.with_filter(filter); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }

    pub fn options(&self) -> &ExportOptions { &self.opts }

    /// Fetch and bucket every usable record. Nothing touches the filesystem.
    pub fn collect<S>(&self, source: &S, synced_at: &str) -> Result<(YearBuckets, PaginationStats)>
    where
        S: ProposalSource + ?Sized,
    {
        let pb = if self.opts.progress { Some(make_count_progress(0, "Fetching proposals")) } else { None };
        let mut buckets = YearBuckets::new();
        let stats = paginate(
            source,
            &self.opts.filter,
            self.opts.batch_size,
            self.opts.max_records,
            pb,
            |page| {
                for proposal in page {
                    buckets.ingest(proposal, synced_at);
                }
                Ok(())
            },
        )?;
        Ok((buckets, stats))
    }

    /// Write all buckets and the root metadata. An empty map writes nothing.
    pub fn write(&self, buckets: &YearBuckets, generated_at: &str) -> Result<ExportSummary> {
        if buckets.is_empty() {
            tracing::warn!("no proposals found; check whether the filter is too strict");
            return Ok(ExportSummary { generated_at: generated_at.to_string(), ..Default::default() });
        }

        let files = write_buckets(&self.opts.output_dir, buckets, generated_at)?;
        let meta = RootMetadata {
            generated_at: generated_at.to_string(),
            total_years: buckets.len(),
            total_records: buckets.total_records(),
            max_records: self.opts.max_records,
            batch_size: self.opts.batch_size,
            filter: self.opts.filter.clone(),
        };
        let root = write_root_metadata(&self.opts.output_dir, &meta)?;
        tracing::info!(
            years = meta.total_years,
            records = meta.total_records,
            dir = %self.opts.output_dir.display(),
            "export written"
        );

        Ok(ExportSummary {
            generated_at: meta.generated_at,
            total_years: meta.total_years,
            total_records: meta.total_records,
            files,
            root_metadata: Some(root),
        })
    }

    /// Collect then write, stamping everything with `generated_at`.
    pub fn run_at<S>(&self, source: &S, generated_at: &str) -> Result<ExportSummary>
    where
        S: ProposalSource + ?Sized,
    {
        let (buckets, _) = self.collect(source, generated_at)?;
        self.write(&buckets, generated_at)
    }

    pub fn run<S>(&self, source: &S) -> Result<ExportSummary>
    where
        S: ProposalSource + ?Sized,
    {
        let generated_at = rfc3339_now()?;
        self.run_at(source, &generated_at)
    }

    /// Run against the configured Keystone endpoint.
    pub fn run_remote(&self) -> Result<ExportSummary> {
        init_tracing_once();
        let source = KeystoneSource::from_options(&self.opts)?;
        self.run(&source)
    }
}
