#![allow(dead_code)]

use budget_export::{ExportError, ProposalSource, RawProposal};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;

pub const SYNCED_AT: &str = "2024-05-01T08:30:00.123Z";

/// In-memory `ProposalSource` that serves `records` in order and logs every call.
pub struct MemorySource {
    pub records: Vec<Value>,
    /// Overrides what `count` reports (defaults to `records.len()`).
    pub reported_count: Option<u64>,
    /// Page number (0-based) that fails with a transport error.
    pub fail_on_page: Option<usize>,
    pub count_calls: Cell<usize>,
    /// `(take, skip)` of every page request.
    pub page_requests: RefCell<Vec<(usize, usize)>>,
}

impl MemorySource {
    pub fn new(records: Vec<Value>) -> Self {
        Self {
            records,
            reported_count: None,
            fail_on_page: None,
            count_calls: Cell::new(0),
            page_requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_reported_count(mut self, n: u64) -> Self {
        self.reported_count = Some(n);
        self
    }

    pub fn failing_on_page(mut self, page: usize) -> Self {
        self.fail_on_page = Some(page);
        self
    }

    pub fn requests(&self) -> Vec<(usize, usize)> {
        self.page_requests.borrow().clone()
    }
}

impl ProposalSource for MemorySource {
    fn count(&self, _filter: &Value) -> Result<u64, ExportError> {
        self.count_calls.set(self.count_calls.get() + 1);
        Ok(self.reported_count.unwrap_or(self.records.len() as u64))
    }

    fn fetch_page(&self, _filter: &Value, take: usize, skip: usize) -> Result<Vec<RawProposal>, ExportError> {
        let page_no = self.page_requests.borrow().len();
        self.page_requests.borrow_mut().push((take, skip));
        if self.fail_on_page == Some(page_no) {
            return Err(ExportError::Transport { status: 502, body: "bad gateway".into() });
        }
        self.records
            .iter()
            .skip(skip)
            .take(take)
            .map(|v| serde_json::from_value(v.clone()).map_err(ExportError::from))
            .collect()
    }
}

/// Minimal proposal with an id and a year (`None` leaves the year object out).
pub fn proposal(id: &str, year: Option<i64>) -> Value {
    let mut v = json!({ "id": id, "proposalTypes": ["reduce"], "result": "passed" });
    if let Some(y) = year {
        v["year"] = json!({ "id": format!("y{y}"), "year": y });
    }
    v
}

/// A fully populated proposal exercising every nested relation.
pub fn full_proposal() -> Value {
    json!({
        "id": "101",
        "publishStatus": "published",
        "proposalTypes": ["freeze", "reduce"],
        "result": "reserved",
        "reductionAmount": 500000,
        "freezeAmount": 1250.5,
        "reason": "duplicate spending",
        "description": "cut travel budget",
        "budgetImageUrl": "https://example.org/b.png",
        "budgetMajorCategory": "fallback-major",
        "budgetProjectName": "fallback-project",
        "budgetAmount": 999,
        "year": { "id": "7", "year": 2024 },
        "government": { "id": "g1", "name": "Ministry of Culture", "category": "executive" },
        "meetings": [
            { "id": "m1", "displayName": "Budget committee 1" },
            { "id": "m2", "displayName": "  " },
            null,
            { "id": "m3", "displayName": "Budget committee 2" }
        ],
        "proposers": [ { "id": "p1", "name": "Lin", "type": "legislator" }, { "id": "p2", "name": null } ],
        "coSigners": [ { "id": "c1", "name": "Chen" }, { "id": "c2", "name": "Wang" } ],
        "budget": {
            "id": "b9",
            "projectName": "Museum upkeep",
            "projectDescription": "annual maintenance",
            "majorCategory": "",
            "mediumCategory": "culture",
            "minorCategory": null,
            "budgetAmount": 3000000
        },
        "historicalProposals": [ { "id": "90" }, { "id": "91" } ],
        "mergedProposals": [ { "id": "95" } ],
        "historicalParentProposals": [ { "id": "" }, { "id": "80" }, { "id": "81" } ],
        "mergedParentProposals": { "id": "85" }
    })
}

pub fn raw(v: Value) -> RawProposal {
    serde_json::from_value(v).unwrap()
}

/// Scratch directory removed when the returned guard drops.
pub fn scratch_dir() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// Sorted file names in `dir` (empty when the directory does not exist).
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match fs::read_dir(dir) {
        Ok(rd) => rd.filter_map(|e| e.ok()).map(|e| e.file_name().to_string_lossy().into_owned()).collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}
