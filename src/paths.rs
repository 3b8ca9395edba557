//! Output file naming.
//!
//! Year strings come from the remote API, so they are checked before being
//! spliced into a file name: anything outside `[A-Za-z0-9._-]` is replaced
//! with `_`, and `.`/`..` are never used as-is. Distinct years that clean up
//! to the same component are told apart by `YearFileNames`.

use ahash::AHashSet;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::bucketing::UNKNOWN_YEAR;
use crate::config::METADATA_FILE_NAME;

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]").expect("static regex"))
}

/// File-name component for a bucket's year.
pub fn year_file_component(year: &str) -> String {
    if year.is_empty() {
        return UNKNOWN_YEAR.to_string();
    }
    let cleaned = unsafe_chars().replace_all(year, "_");
    if cleaned.chars().all(|c| c == '.') {
        return cleaned.replace('.', "_");
    }
    cleaned.into_owned()
}

/// Distinct file-name components for the years of one run.
///
/// The first year to claim a component gets it verbatim; a later year that
/// cleans up to the same component gets `_2`, `_3`, ... appended.
#[derive(Debug, Default)]
pub struct YearFileNames {
    used: AHashSet<String>,
}

impl YearFileNames {
    pub fn new() -> Self { Self::default() }

    pub fn claim(&mut self, year: &str) -> String {
        let base = year_file_component(year);
        let mut candidate = base.clone();
        let mut n = 2usize;
        while !self.used.insert(candidate.clone()) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        if candidate != base {
            tracing::warn!(year, file_component = %candidate, "year file name already taken; suffixed");
        }
        candidate
    }
}

/// The three files written for one year bucket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BucketPaths {
    pub csv: PathBuf,
    pub json: PathBuf,
    pub metadata: PathBuf,
}

impl BucketPaths {
    pub fn new(out_dir: &Path, year: &str) -> Self {
        Self::for_component(out_dir, &year_file_component(year))
    }

    /// Paths for an already cleaned file-name component.
    pub fn for_component(out_dir: &Path, y: &str) -> Self {
        Self {
            csv: out_dir.join(format!("proposals_year_{y}.csv")),
            json: out_dir.join(format!("proposals_year_{y}.json")),
            metadata: out_dir.join(format!("metadata_year_{y}.json")),
        }
    }

    pub fn all(&self) -> [&Path; 3] {
        [self.csv.as_path(), self.json.as_path(), self.metadata.as_path()]
    }
}

pub fn root_metadata_path(out_dir: &Path) -> PathBuf {
    out_dir.join(METADATA_FILE_NAME)
}
