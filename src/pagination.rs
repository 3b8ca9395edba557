//! Forward-only offset pagination with a record cap.

use anyhow::Result;
use indicatif::ProgressBar;
use serde_json::Value;

use crate::client::ProposalSource;
use crate::model::RawProposal;

/// What one pagination pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaginationStats {
    /// `count` reported by the source.
    pub total_available: u64,
    /// min(total_available, cap); reporting only.
    pub target: u64,
    pub pages: usize,
    /// Records returned by the source, including the unused tail of a capped page.
    pub fetched: usize,
    /// Records handed to the callback.
    pub processed: usize,
    /// Offset the next page would have been requested at.
    pub offset: usize,
}

/// Page through `source`, handing at most `max_records` records to `on_page`.
///
/// Stops on an empty page, a short page (`len < batch_size`), or when the cap
/// is used up. The offset advances by the full page length even when the cap
/// truncates the page; each run starts again at offset 0.
pub fn paginate<S, F>(
    source: &S,
    filter: &Value,
    batch_size: usize,
    max_records: usize,
    pb: Option<ProgressBar>,
    mut on_page: F,
) -> Result<PaginationStats>
where
    S: ProposalSource + ?Sized,
    F: FnMut(&[RawProposal]) -> Result<()>,
{
    let batch_size = batch_size.max(1);
    let total = source.count(filter)?;
    let target = total.min(max_records as u64);
    tracing::info!(
        "exporting {}/{} proposals (batch={}, limit={})",
        target, total, batch_size, max_records
    );
    if let Some(pb) = &pb { pb.set_length(target); }

    let mut stats = PaginationStats { total_available: total, target, ..Default::default() };
    let mut remaining = max_records;

    while remaining > 0 {
        let page = source.fetch_page(filter, batch_size, stats.offset)?;
        stats.pages += 1;
        if page.is_empty() {
            break;
        }

        let usable = page.len().min(remaining);
        on_page(&page[..usable])?;

        stats.fetched += page.len();
        stats.processed += usable;
        stats.offset += page.len();
        remaining -= usable;

        tracing::info!("processed {}/{}", stats.processed, target);
        if let Some(pb) = &pb { pb.inc(usable as u64); }

        if page.len() < batch_size {
            break;
        }
    }

    if let Some(pb) = pb { pb.finish_with_message("fetch done"); }
    Ok(stats)
}
