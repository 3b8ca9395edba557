mod config;
mod error;
mod model;
mod client;
mod pagination;

mod flatten;
mod bucketing;
mod paths;
mod writer;

mod progress;
mod util;
mod pipeline;

pub use crate::config::{default_filter, parse_positive, ExportOptions, DEFAULT_BATCH_SIZE, DEFAULT_MAX_RECORDS, METADATA_FILE_NAME};
pub use crate::error::ExportError;
pub use crate::pipeline::{ExportSummary, ProposalExporter};

// Remote source seam and the HTTP implementation.
pub use crate::client::{
    GraphqlClient, GraphqlEnvelope, KeystoneSource, ProposalSource,
    OPERATION_HEADER, OPERATION_NAME, PROPOSAL_BATCH_QUERY, PROPOSAL_COUNT_QUERY,
};
pub use crate::model::{
    scalar_text, BudgetNode, GovernmentNode, IdNode, MeetingNode, OneOrMany, PersonNode, RawProposal, YearNode,
};
pub use crate::pagination::{paginate, PaginationStats};

// Flattening & bucketing
pub use crate::flatten::{
    flatten_proposal, format_id_list, format_proposal_types, format_result, format_single_relation,
    join_labels, proposal_type_label, result_label, year_value, FlatRow, COLUMNS, SYNC_COLUMN,
};
pub use crate::bucketing::{year_key, YearBucket, YearBuckets, UNKNOWN_YEAR};

// Output
pub use crate::paths::{root_metadata_path, year_file_component, BucketPaths, YearFileNames};
pub use crate::writer::{
    write_bucket, write_bucket_csv, write_bucket_json, write_bucket_metadata, write_buckets,
    write_root_metadata, BucketDocument, BucketMetadata, RootMetadata,
};

pub use crate::progress::make_count_progress;
pub use crate::util::{format_timestamp, init_tracing_once, rfc3339_now, write_atomic};
