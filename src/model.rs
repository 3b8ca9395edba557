//! Wire shapes of the `proposals` batch query.
//!
//! Every field is optional and every list tolerates `null` elements: a record
//! with any nested object missing must still flatten. Ids and numeric fields
//! stay as raw `Value`s because Keystone may send them as numbers or strings.

use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawProposal {
    pub id: Option<Value>,
    pub publish_status: Option<String>,
    pub proposal_types: Option<Vec<Option<String>>>,
    pub result: Option<String>,
    pub reduction_amount: Option<Value>,
    pub freeze_amount: Option<Value>,
    pub reason: Option<String>,
    pub description: Option<String>,
    pub budget_image_url: Option<String>,

    // Proposal-level mirrors of the budget fields, used as fallbacks.
    pub budget_major_category: Option<String>,
    pub budget_medium_category: Option<String>,
    pub budget_minor_category: Option<String>,
    pub budget_project_name: Option<String>,
    pub budget_type: Option<String>,
    pub budget_year: Option<Value>,
    pub budget_amount: Option<Value>,

    pub year: Option<YearNode>,
    pub government: Option<GovernmentNode>,
    pub meetings: Option<Vec<Option<MeetingNode>>>,
    pub proposers: Option<Vec<Option<PersonNode>>>,
    pub co_signers: Option<Vec<Option<PersonNode>>>,
    pub budget: Option<BudgetNode>,

    pub historical_proposals: Option<Vec<Option<IdNode>>>,
    pub merged_proposals: Option<Vec<Option<IdNode>>>,
    pub historical_parent_proposals: Option<OneOrMany<IdNode>>,
    pub merged_parent_proposals: Option<OneOrMany<IdNode>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct YearNode {
    pub id: Option<Value>,
    pub year: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct GovernmentNode {
    pub id: Option<Value>,
    pub name: Option<String>,
    pub category: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeetingNode {
    pub id: Option<Value>,
    pub display_name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PersonNode {
    pub id: Option<Value>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BudgetNode {
    pub id: Option<Value>,
    pub project_name: Option<String>,
    pub project_description: Option<String>,
    pub major_category: Option<String>,
    pub medium_category: Option<String>,
    pub minor_category: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub budget_amount: Option<Value>,
    pub year: Option<Value>,
    pub budget_url: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct IdNode {
    pub id: Option<Value>,
}

/// A relation that is logically single-valued but may be sent as a list.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<Option<T>>),
    One(T),
}

/// Decimal/text form of a scalar; `null` and missing become empty.
pub fn scalar_text(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                n.as_f64().map(float_text).unwrap_or_else(|| n.to_string())
            }
        }
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Shortest round-trip text of a float, switching to exponent form outside
/// `[1e-7, 1e21)`: `1500.0` -> `"1500"`, `1e21` -> `"1e+21"`, `1.5e-7` -> `"1.5e-7"`.
fn float_text(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }
    let abs = f.abs();
    if abs < 1e21 && abs >= 1e-7 {
        return f.to_string();
    }
    let exp = format!("{f:e}");
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
        _ => exp,
    }
}
