use crate::error::ExportError;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_MAX_RECORDS: usize = 10;
pub const METADATA_FILE_NAME: &str = "proposals_metadata.json";

// Recognized environment keys.
pub const ENV_ENDPOINT: &str = "KEYSTONE_URL";
pub const ENV_TOKEN: &str = "KEYSTONE_TOKEN";
pub const ENV_BATCH_SIZE: &str = "BATCH_SIZE";
pub const ENV_MAX_RECORDS: &str = "MAX_RECORDS";
pub const ENV_OUTPUT_DIR: &str = "OUTPUT_DIR";
pub const ENV_WHERE_JSON: &str = "PROPOSAL_WHERE_JSON";

/// Filter applied when `PROPOSAL_WHERE_JSON` is not set.
pub fn default_filter() -> Value {
    json!({ "publishStatus": { "equals": "published" } })
}

/// Run options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct ExportOptions {
    pub endpoint: String,           // base URL, no trailing slash
    pub token: Option<String>,      // bearer credential
    pub batch_size: usize,          // page size requested from the API
    pub max_records: usize,         // cap on records processed per run
    pub output_dir: PathBuf,
    pub filter: Value,              // opaque `where` object passed to both queries
    pub progress: bool,             // show progress bar
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            token: None,
            batch_size: DEFAULT_BATCH_SIZE,
            max_records: DEFAULT_MAX_RECORDS,
            output_dir: PathBuf::from(".."),
            filter: default_filter(),
            progress: true,
        }
    }
}

impl ExportOptions {
    /// Load options from the process environment.
    pub fn from_env() -> Result<Self, ExportError> {
        let cwd = std::env::current_dir()
            .map_err(|e| ExportError::configuration(format!("cannot resolve working directory: {e}")))?;
        Self::from_lookup(|key| std::env::var(key).ok(), &cwd)
    }

    /// Load options from an arbitrary key lookup. `cwd` anchors the default output directory.
    pub fn from_lookup<F>(lookup: F, cwd: &Path) -> Result<Self, ExportError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup(ENV_ENDPOINT)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ExportError::configuration(format!("missing required environment variable: {ENV_ENDPOINT}")))?;

        let filter = match lookup(ENV_WHERE_JSON).filter(|s| !s.is_empty()) {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                ExportError::configuration(format!("{ENV_WHERE_JSON} is not valid JSON: {e}"))
            })?,
            None => default_filter(),
        };

        let output_dir = match lookup(ENV_OUTPUT_DIR).filter(|s| !s.is_empty()) {
            Some(dir) => cwd.join(dir),
            None => cwd.parent().unwrap_or(cwd).to_path_buf(),
        };

        Ok(Self::default()
            .with_endpoint(endpoint)
            .with_token(lookup(ENV_TOKEN).unwrap_or_default())
            .with_batch_size(parse_positive(lookup(ENV_BATCH_SIZE).as_deref(), DEFAULT_BATCH_SIZE))
            .with_max_records(parse_positive(lookup(ENV_MAX_RECORDS).as_deref(), DEFAULT_MAX_RECORDS))
            .with_output_dir(output_dir)
            .with_filter(filter))
    }

    pub fn with_endpoint(mut self, endpoint: impl AsRef<str>) -> Self {
        let e = endpoint.as_ref().trim();
        self.endpoint = e.strip_suffix('/').unwrap_or(e).to_string();
        self
    }
    /// Blank tokens mean "no credential".
    pub fn with_token(mut self, token: impl AsRef<str>) -> Self {
        let t = token.as_ref().trim();
        self.token = if t.is_empty() { None } else { Some(t.to_string()) };
        self
    }
    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n.max(1);
        self
    }
    pub fn with_max_records(mut self, n: usize) -> Self {
        self.max_records = n;
        self
    }
    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }
    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = filter;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }

    pub fn graphql_url(&self) -> String {
        format!("{}/api/graphql", self.endpoint)
    }
}

/// Leading decimal digits of `raw` after optional whitespace and sign, so
/// `"12abc"` and `"1.5"` read as 12 and 1. Missing, junk, zero or negative
/// input yields `default`.
pub fn parse_positive(raw: Option<&str>, default: usize) -> usize {
    let Some(s) = raw.map(str::trim_start) else { return default };
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits = &rest[..rest.bytes().take_while(u8::is_ascii_digit).count()];
    if negative || digits.is_empty() {
        return default;
    }
    match digits.parse::<usize>() {
        Ok(0) => default,
        Ok(n) => n,
        Err(_) => usize::MAX,
    }
}
