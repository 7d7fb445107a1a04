//! Query outcomes

use serde::Serialize;
use uuid::Uuid;

use crate::multipart::ResultEnvelope;
use crate::results::ResultError;

/// What an execution did to the result state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum QueryOutcome {
    /// A buffered response was parsed and loaded in memory
    #[serde(rename_all = "camelCase")]
    Static {
        request_id: Uuid,
        envelope: ResultEnvelope,
    },
    /// A stream index was installed and its first page loaded
    #[serde(rename_all = "camelCase")]
    Streamed { request_id: Uuid, part_count: usize },
    /// The query was cancelled; the result state is unchanged
    #[serde(rename_all = "camelCase")]
    Cancelled { request_id: Uuid },
    /// The query failed; the error is also recorded in the result state
    #[serde(rename_all = "camelCase")]
    Failed { request_id: Uuid, error: ResultError },
    /// A newer query or a reset started first; the response was dropped
    #[serde(rename_all = "camelCase")]
    Superseded { request_id: Uuid },
}

impl QueryOutcome {
    pub fn request_id(&self) -> Uuid {
        match self {
            QueryOutcome::Static { request_id, .. }
            | QueryOutcome::Streamed { request_id, .. }
            | QueryOutcome::Cancelled { request_id }
            | QueryOutcome::Superseded { request_id }
            | QueryOutcome::Failed { request_id, .. } => *request_id,
        }
    }

    /// Outcome name for observability
    pub fn name(&self) -> &'static str {
        match self {
            QueryOutcome::Static { .. } => "static",
            QueryOutcome::Streamed { .. } => "streamed",
            QueryOutcome::Cancelled { .. } => "cancelled",
            QueryOutcome::Failed { .. } => "failed",
            QueryOutcome::Superseded { .. } => "superseded",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, QueryOutcome::Failed { .. })
    }
}
