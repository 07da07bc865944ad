/// Error types for calls against the remote judge API.
///
/// Only the solved-set aggregation propagates these. Per-problem lookups
/// degrade to `None` / `ProblemExistence::LookupFailed` instead.
use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid response JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("upstream returned error: status={status} body={body}")]
    Upstream { status: StatusCode, body: String },
}
