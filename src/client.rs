//! GraphQL transport for the Keystone proposal API.
//!
//! `ProposalSource` is the seam the pagination driver works against;
//! `KeystoneSource` is the HTTP implementation used by the binary.

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::ExportOptions;
use crate::error::ExportError;
use crate::model::RawProposal;

pub const OPERATION_NAME: &str = "BudgetDataExporter";
pub const OPERATION_HEADER: &str = "x-apollo-operation-name";

pub const PROPOSAL_COUNT_QUERY: &str = r#"
  query ProposalCount($where: ProposalWhereInput) {
    proposalsCount(where: $where)
  }
"#;

pub const PROPOSAL_BATCH_QUERY: &str = r#"
  query ProposalBatch($take: Int!, $skip: Int!, $where: ProposalWhereInput) {
    proposals(orderBy: { id: asc }, take: $take, skip: $skip, where: $where) {
      id
      publishStatus
      proposalTypes
      result
      reductionAmount
      freezeAmount
      reason
      description
      budgetImageUrl
      budgetMajorCategory
      budgetMediumCategory
      budgetMinorCategory
      budgetProjectName
      budgetType
      budgetYear
      budgetAmount
      year { id year }
      government { id name category }
      meetings { id displayName }
      proposers { id name type }
      coSigners { id name type }
      budget {
        id
        projectName
        projectDescription
        majorCategory
        mediumCategory
        minorCategory
        type
        budgetAmount
        year
        budgetUrl
      }
      historicalProposals { id }
      mergedProposals { id }
      historicalParentProposals { id }
      mergedParentProposals { id }
    }
  }
"#;

/// Where proposals come from. Both calls take the opaque `where` filter.
pub trait ProposalSource {
    fn count(&self, filter: &Value) -> Result<u64, ExportError>;
    fn fetch_page(&self, filter: &Value, take: usize, skip: usize) -> Result<Vec<RawProposal>, ExportError>;
}

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Value,
}

/// Response envelope: `{ data, errors }`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GraphqlEnvelope {
    pub data: Option<Value>,
    pub errors: Option<Vec<Value>>,
}

impl GraphqlEnvelope {
    /// `data` payload, or `ApplicationError` when the server reported errors.
    pub fn into_data(self) -> Result<Value, ExportError> {
        if let Some(errors) = self.errors.filter(|e| !e.is_empty()) {
            let serialized = serde_json::to_string(&errors)?;
            return Err(ExportError::Application(serialized));
        }
        Ok(self.data.unwrap_or(Value::Null))
    }
}

/// Blocking GraphQL client bound to `<endpoint>/api/graphql`.
pub struct GraphqlClient {
    http: Client,
    url: String,
    token: Option<String>,
}

impl GraphqlClient {
    pub fn new(opts: &ExportOptions) -> Result<Self, ExportError> {
        let http = Client::builder().build()?;
        Ok(Self { http, url: opts.graphql_url(), token: opts.token.clone() })
    }

    pub fn url(&self) -> &str { &self.url }

    fn headers(&self) -> Result<HeaderMap, ExportError> {
        let mut headers = HeaderMap::new();
        headers.insert(OPERATION_HEADER, HeaderValue::from_static(OPERATION_NAME));
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ExportError::configuration(format!("invalid bearer token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// POST one query and return the `data` payload (`Null` if absent).
    pub fn request(&self, query: &str, variables: Value) -> Result<Value, ExportError> {
        let resp = self
            .http
            .post(&self.url)
            .headers(self.headers()?)
            .json(&GraphqlRequest { query, variables })
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ExportError::Transport { status: status.as_u16(), body: read_body_lossy(resp) });
        }

        let envelope: GraphqlEnvelope = serde_json::from_slice(&resp.bytes()?)?;
        envelope.into_data()
    }
}

/// Body text for error reporting; a failed read degrades to a placeholder.
fn read_body_lossy(resp: Response) -> String {
    match resp.text() {
        Ok(text) => text,
        Err(e) => format!("<unable to read response body: {e}>"),
    }
}

/// `ProposalSource` backed by the Keystone GraphQL API.
pub struct KeystoneSource {
    client: GraphqlClient,
}

impl KeystoneSource {
    pub fn new(client: GraphqlClient) -> Self { Self { client } }

    pub fn from_options(opts: &ExportOptions) -> Result<Self, ExportError> {
        Ok(Self::new(GraphqlClient::new(opts)?))
    }
}

impl ProposalSource for KeystoneSource {
    fn count(&self, filter: &Value) -> Result<u64, ExportError> {
        let data = self.client.request(PROPOSAL_COUNT_QUERY, json!({ "where": filter }))?;
        Ok(data.get("proposalsCount").and_then(Value::as_u64).unwrap_or(0))
    }

    fn fetch_page(&self, filter: &Value, take: usize, skip: usize) -> Result<Vec<RawProposal>, ExportError> {
        let data = self.client.request(
            PROPOSAL_BATCH_QUERY,
            json!({ "take": take, "skip": skip, "where": filter }),
        )?;
        match data.get("proposals") {
            Some(list @ Value::Array(_)) => Ok(serde_json::from_value(list.clone())?),
            _ => Ok(Vec::new()),
        }
    }
}
