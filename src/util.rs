use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

static INIT_ONCE: std::sync::Once = std::sync::Once::new();

/// Install the fmt subscriber once; `RUST_LOG` overrides the `info` default.
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
    });
}

/// Current UTC time as RFC 3339 with millisecond precision, e.g. `2024-05-01T08:30:00.123Z`.
pub fn rfc3339_now() -> Result<String> {
    format_timestamp(OffsetDateTime::now_utc())
}

/// UTC, always three fractional digits; sub-millisecond precision is truncated.
pub fn format_timestamp(ts: OffsetDateTime) -> Result<String> {
    let fmt = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");
    ts.to_offset(UtcOffset::UTC).format(fmt).context("format timestamp")
}

// -------- file writes with backoff --------

const TRIES: usize = 16;
const DELAY_MS: u64 = 50;

/// Transient errors worth retrying: sharing/lock violations and AV scanners on Windows.
fn is_retriable_io_error(e: &io::Error) -> bool {
    matches!(e.raw_os_error(), Some(5) | Some(32) | Some(33) | Some(225) | Some(1224))
}

fn retry_io<T>(mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut last_err: Option<io::Error> = None;
    for i in 0..TRIES {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if is_retriable_io_error(&e) => {
                last_err = Some(e);
                sleep(Duration::from_millis(DELAY_MS.saturating_mul((i + 1) as u64)));
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "retries exhausted")))
}

fn staging_path(dest: &Path) -> PathBuf {
    let name = dest.file_name().and_then(|n| n.to_str()).unwrap_or("out");
    dest.with_file_name(format!(".{name}.inprogress"))
}

/// Write `dest` through a staging sibling that is renamed into place once flushed.
/// The closure receives the buffered writer.
pub fn write_atomic<F>(dest: &Path, f: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let tmp = staging_path(dest);
    let file = retry_io(|| File::create(&tmp)).with_context(|| format!("create {}", tmp.display()))?;
    let mut w = BufWriter::new(file);
    let written = f(&mut w).and_then(|_| w.flush().with_context(|| format!("flush {}", tmp.display())));
    drop(w);
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    retry_io(|| fs::rename(&tmp, dest))
        .with_context(|| format!("rename {} -> {}", tmp.display(), dest.display()))
}
