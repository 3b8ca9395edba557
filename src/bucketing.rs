use ahash::AHashMap;

use crate::flatten::{flatten_proposal, year_value, FlatRow};
use crate::model::{scalar_text, RawProposal};

/// Bucket key for records without a year.
pub const UNKNOWN_YEAR: &str = "unknown";

/// Rows sharing one year key, in arrival order.
#[derive(Clone, Debug, Default)]
pub struct YearBucket {
    pub year: String,
    /// Id of the year node seen when the bucket was created.
    pub year_id: String,
    pub rows: Vec<FlatRow>,
}

impl YearBucket {
    pub fn new(year: impl Into<String>, year_id: impl Into<String>) -> Self {
        Self { year: year.into(), year_id: year_id.into(), rows: Vec::new() }
    }

    pub fn len(&self) -> usize { self.rows.len() }
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }
}

/// Year buckets iterated in creation order (first appearance of each year).
#[derive(Clone, Debug, Default)]
pub struct YearBuckets {
    buckets: Vec<YearBucket>,
    index: AHashMap<String, usize>,
}

impl YearBuckets {
    pub fn new() -> Self { Self::default() }

    /// Look up the bucket for `year`, creating it with `year_id` on first sight.
    /// A later record with a different year id does not overwrite it.
    pub fn bucket_mut(&mut self, year: &str, year_id: &str) -> &mut YearBucket {
        let idx = match self.index.get(year) {
            Some(&i) => i,
            None => {
                self.buckets.push(YearBucket::new(year, year_id));
                let i = self.buckets.len() - 1;
                self.index.insert(year.to_string(), i);
                i
            }
        };
        &mut self.buckets[idx]
    }

    /// Flatten `proposal` and append it to its year's bucket.
    pub fn ingest(&mut self, proposal: &RawProposal, last_synced_at: &str) {
        let key = year_key(proposal);
        let year_id = proposal.year.as_ref().map(|y| scalar_text(y.id.as_ref())).unwrap_or_default();
        let row = flatten_proposal(proposal, last_synced_at);
        self.bucket_mut(&key, &year_id).rows.push(row);
    }

    pub fn get(&self, year: &str) -> Option<&YearBucket> {
        self.index.get(year).map(|&i| &self.buckets[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &YearBucket> {
        self.buckets.iter()
    }

    pub fn years(&self) -> Vec<&str> {
        self.buckets.iter().map(|b| b.year.as_str()).collect()
    }

    /// Number of buckets (distinct years).
    pub fn len(&self) -> usize { self.buckets.len() }
    pub fn is_empty(&self) -> bool { self.buckets.is_empty() }

    pub fn total_records(&self) -> usize {
        self.buckets.iter().map(YearBucket::len).sum()
    }
}

impl<'a> IntoIterator for &'a YearBuckets {
    type Item = &'a YearBucket;
    type IntoIter = std::slice::Iter<'a, YearBucket>;
    fn into_iter(self) -> Self::IntoIter { self.buckets.iter() }
}

/// Year string of the record, or `"unknown"`.
pub fn year_key(p: &RawProposal) -> String {
    year_value(p).unwrap_or_else(|| UNKNOWN_YEAR.to_string())
}
