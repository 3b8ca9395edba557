//! Flattening of a raw proposal into the fixed export row.

use crate::model::{scalar_text, IdNode, OneOrMany, RawProposal};
use serde::Serialize;
use serde_json::{Map, Value};

/// Column order shared by the CSV header and the JSON documents.
pub const COLUMNS: [&str; 26] = [
    "proposal_id",
    "proposal_types",
    "result",
    "reduction_amount",
    "freeze_amount",
    "reason",
    "description",
    "budget_image_url",
    "historical_proposals",
    "historical_parent_proposal",
    "merged_proposals",
    "merged_parent_proposal",
    "year",
    "government_name",
    "government_category",
    "meetings",
    "proposers",
    "co_signers",
    "budget_id",
    "budget_project_name",
    "budget_project_description",
    "budget_major_category",
    "budget_medium_category",
    "budget_minor_category",
    "budget_amount",
    "last_synced_at",
];

/// Field excluded from the pruned JSON documents.
pub const SYNC_COLUMN: &str = "last_synced_at";

const LIST_SEPARATOR: &str = "|";
const TYPE_SEPARATOR: &str = "、";

/// One exported row. Field declaration order is the column order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FlatRow {
    pub proposal_id: String,
    pub proposal_types: String,
    pub result: String,
    pub reduction_amount: String,
    pub freeze_amount: String,
    pub reason: String,
    pub description: String,
    pub budget_image_url: String,
    pub historical_proposals: String,
    pub historical_parent_proposal: String,
    pub merged_proposals: String,
    pub merged_parent_proposal: String,
    pub year: String,
    pub government_name: String,
    pub government_category: String,
    pub meetings: String,
    pub proposers: String,
    pub co_signers: String,
    pub budget_id: String,
    pub budget_project_name: String,
    pub budget_project_description: String,
    pub budget_major_category: String,
    pub budget_medium_category: String,
    pub budget_minor_category: String,
    pub budget_amount: String,
    pub last_synced_at: String,
}

impl FlatRow {
    /// `(column, value)` pairs in column order.
    pub fn fields(&self) -> [(&'static str, &str); 26] {
        [
            (COLUMNS[0], self.proposal_id.as_str()),
            (COLUMNS[1], self.proposal_types.as_str()),
            (COLUMNS[2], self.result.as_str()),
            (COLUMNS[3], self.reduction_amount.as_str()),
            (COLUMNS[4], self.freeze_amount.as_str()),
            (COLUMNS[5], self.reason.as_str()),
            (COLUMNS[6], self.description.as_str()),
            (COLUMNS[7], self.budget_image_url.as_str()),
            (COLUMNS[8], self.historical_proposals.as_str()),
            (COLUMNS[9], self.historical_parent_proposal.as_str()),
            (COLUMNS[10], self.merged_proposals.as_str()),
            (COLUMNS[11], self.merged_parent_proposal.as_str()),
            (COLUMNS[12], self.year.as_str()),
            (COLUMNS[13], self.government_name.as_str()),
            (COLUMNS[14], self.government_category.as_str()),
            (COLUMNS[15], self.meetings.as_str()),
            (COLUMNS[16], self.proposers.as_str()),
            (COLUMNS[17], self.co_signers.as_str()),
            (COLUMNS[18], self.budget_id.as_str()),
            (COLUMNS[19], self.budget_project_name.as_str()),
            (COLUMNS[20], self.budget_project_description.as_str()),
            (COLUMNS[21], self.budget_major_category.as_str()),
            (COLUMNS[22], self.budget_medium_category.as_str()),
            (COLUMNS[23], self.budget_minor_category.as_str()),
            (COLUMNS[24], self.budget_amount.as_str()),
            (COLUMNS[25], self.last_synced_at.as_str()),
        ]
    }

    /// JSON object without `last_synced_at` and without empty fields, keys in column order.
    pub fn pruned(&self) -> Map<String, Value> {
        let mut out = Map::new();
        for (key, value) in self.fields() {
            if key == SYNC_COLUMN || value.is_empty() {
                continue;
            }
            out.insert(key.to_string(), Value::String(value.to_string()));
        }
        out
    }
}

/// Year string of a record, `None` when the year object or its value is missing.
pub fn year_value(p: &RawProposal) -> Option<String> {
    let y = p.year.as_ref()?.year.as_ref()?;
    if y.is_null() {
        return None;
    }
    Some(scalar_text(Some(y)))
}

pub fn flatten_proposal(p: &RawProposal, last_synced_at: &str) -> FlatRow {
    let budget = p.budget.as_ref();
    let government = p.government.as_ref();

    FlatRow {
        proposal_id: scalar_text(p.id.as_ref()),
        proposal_types: format_proposal_types(p.proposal_types.as_deref()),
        result: format_result(p.result.as_deref()),
        reduction_amount: scalar_text(p.reduction_amount.as_ref()),
        freeze_amount: scalar_text(p.freeze_amount.as_ref()),
        reason: text(p.reason.as_deref()),
        description: text(p.description.as_deref()),
        budget_image_url: text(p.budget_image_url.as_deref()),
        historical_proposals: format_id_list(p.historical_proposals.as_deref()),
        historical_parent_proposal: format_single_relation(p.historical_parent_proposals.as_ref()),
        merged_proposals: format_id_list(p.merged_proposals.as_deref()),
        merged_parent_proposal: format_single_relation(p.merged_parent_proposals.as_ref()),
        year: year_value(p).unwrap_or_default(),
        government_name: text(government.and_then(|g| g.name.as_deref())),
        government_category: text(government.and_then(|g| g.category.as_deref())),
        meetings: join_labels(
            p.meetings.iter().flatten().map(|m| m.as_ref().and_then(|m| m.display_name.as_deref())),
        ),
        proposers: join_labels(
            p.proposers.iter().flatten().map(|n| n.as_ref().and_then(|n| n.name.as_deref())),
        ),
        co_signers: join_labels(
            p.co_signers.iter().flatten().map(|n| n.as_ref().and_then(|n| n.name.as_deref())),
        ),
        budget_id: scalar_text(budget.and_then(|b| b.id.as_ref())),
        budget_project_name: or_fallback(
            budget.and_then(|b| b.project_name.as_deref()),
            p.budget_project_name.as_deref(),
        ),
        budget_project_description: text(budget.and_then(|b| b.project_description.as_deref())),
        budget_major_category: or_fallback(
            budget.and_then(|b| b.major_category.as_deref()),
            p.budget_major_category.as_deref(),
        ),
        budget_medium_category: or_fallback(
            budget.and_then(|b| b.medium_category.as_deref()),
            p.budget_medium_category.as_deref(),
        ),
        budget_minor_category: or_fallback(
            budget.and_then(|b| b.minor_category.as_deref()),
            p.budget_minor_category.as_deref(),
        ),
        // Only a missing/null budget amount falls back; zero and "" do not.
        budget_amount: scalar_text(
            budget
                .and_then(|b| b.budget_amount.as_ref())
                .filter(|v| !v.is_null())
                .or(p.budget_amount.as_ref()),
        ),
        last_synced_at: last_synced_at.to_string(),
    }
}

pub fn proposal_type_label(tag: &str) -> &str {
    match tag {
        "freeze" => "凍結",
        "reduce" => "減列",
        "other" => "主決議",
        other => other,
    }
}

pub fn result_label(tag: &str) -> &str {
    match tag {
        "passed" => "通過",
        "reserved" => "保留",
        "withdrawn" => "撤案",
        other => other,
    }
}

pub fn format_proposal_types(types: Option<&[Option<String>]>) -> String {
    types
        .unwrap_or_default()
        .iter()
        .flatten()
        .map(|t| proposal_type_label(t))
        .filter(|label| !label.is_empty())
        .collect::<Vec<_>>()
        .join(TYPE_SEPARATOR)
}

pub fn format_result(result: Option<&str>) -> String {
    match result {
        Some(r) if !r.is_empty() => result_label(r).to_string(),
        _ => String::new(),
    }
}

/// Join non-blank labels with `|`.
pub fn join_labels<'a, I>(labels: I) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    labels
        .into_iter()
        .flatten()
        .filter(|l| !l.trim().is_empty())
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

/// Join every node's id with `|`; a node without an id leaves an empty segment.
pub fn format_id_list(nodes: Option<&[Option<IdNode>]>) -> String {
    nodes
        .unwrap_or_default()
        .iter()
        .map(|n| scalar_text(n.as_ref().and_then(|n| n.id.as_ref())))
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

/// First node with a non-empty id, or the single node's id.
pub fn format_single_relation(rel: Option<&OneOrMany<IdNode>>) -> String {
    match rel {
        None => String::new(),
        Some(OneOrMany::One(node)) => scalar_text(node.id.as_ref()),
        Some(OneOrMany::Many(nodes)) => nodes
            .iter()
            .flatten()
            .map(|n| scalar_text(n.id.as_ref()))
            .find(|id| !id.is_empty())
            .unwrap_or_default(),
    }
}

fn text(v: Option<&str>) -> String {
    v.unwrap_or_default().to_string()
}

/// Primary unless missing or empty, then fallback.
fn or_fallback(primary: Option<&str>, fallback: Option<&str>) -> String {
    match primary {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => text(fallback),
    }
}
