/// Admin add/remove of workbook problems.
///
/// Checks run in a fixed order and stop at the first failure: admin key,
/// problem number, workbook key, then (add only) the judge lookup. Every
/// rejection is an expected outcome reported back to the caller, not an error.
use std::sync::Arc;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use judge_common::solvedac::{JudgeApi, ProblemExistence};

use crate::store::{InsertOutcome, RemoveOutcome, StoreError, WorkbookStore};

/// Smallest problem number Baekjoon assigns.
pub const MIN_PROBLEM_ID: u32 = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct AdminRequest {
    #[serde(default)]
    pub admin_key: String,
    #[serde(default)]
    pub problem_id: String,
    #[serde(default)]
    pub workbook_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminRejection {
    InvalidAdminKey,
    InvalidProblemId,
    UnknownWorkbook,
    ProblemNotOnJudge,
    LookupFailed,
    NotInWorkbook,
    PersistFailed(String),
}

impl AdminRejection {
    pub fn code(&self) -> &'static str {
        match self {
            AdminRejection::InvalidAdminKey => "invalid_admin_key",
            AdminRejection::InvalidProblemId => "invalid_problem_id",
            AdminRejection::UnknownWorkbook => "unknown_workbook",
            AdminRejection::ProblemNotOnJudge => "problem_not_on_judge",
            AdminRejection::LookupFailed => "lookup_failed",
            AdminRejection::NotInWorkbook => "not_in_workbook",
            AdminRejection::PersistFailed(_) => "persist_failed",
        }
    }

    pub fn message(&self) -> String {
        match self {
            AdminRejection::InvalidAdminKey => "invalid admin key".to_string(),
            AdminRejection::InvalidProblemId => {
                format!("problem number must be an integer ≥ {MIN_PROBLEM_ID}")
            }
            AdminRejection::UnknownWorkbook => "workbook does not exist".to_string(),
            AdminRejection::ProblemNotOnJudge => "problem does not exist on the judge".to_string(),
            AdminRejection::LookupFailed => {
                "could not reach the judge to verify the problem; try again later".to_string()
            }
            AdminRejection::NotInWorkbook => "problem not present in workbook".to_string(),
            AdminRejection::PersistFailed(reason) => format!("failed to save workbooks: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminOutcome {
    Success(String),
    /// Nothing changed, but nothing was wrong either.
    Info(String),
    Rejected(AdminRejection),
}

/// A well-formed problem number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemNumber {
    Id(u32),
    /// Valid digits but too large for any judge problem ID.
    OutOfRange,
}

/// Parse a problem number typed by the admin: ASCII digits only (no sign,
/// no whitespace), at least [`MIN_PROBLEM_ID`]. `None` means malformed.
pub fn parse_problem_id(raw: &str) -> Option<ProblemNumber> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match raw.parse::<u32>() {
        Ok(id) if id >= MIN_PROBLEM_ID => Some(ProblemNumber::Id(id)),
        Ok(_) => None,
        // Only overflow is left once the digits check passed.
        Err(_) => Some(ProblemNumber::OutOfRange),
    }
}

pub struct AdminHandlers {
    store: Arc<WorkbookStore>,
    judge: Arc<dyn JudgeApi>,
    admin_key_digest: [u8; 32],
}

impl AdminHandlers {
    pub fn new(store: Arc<WorkbookStore>, judge: Arc<dyn JudgeApi>, admin_key: &str) -> Self {
        Self {
            store,
            judge,
            admin_key_digest: Sha256::digest(admin_key.as_bytes()).into(),
        }
    }

    /// Compare digests so the comparison time does not depend on how much of
    /// the key matched.
    fn key_matches(&self, candidate: &str) -> bool {
        let digest: [u8; 32] = Sha256::digest(candidate.as_bytes()).into();
        digest
            .iter()
            .zip(self.admin_key_digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }

    /// Shared checks 1-3. Returns the parsed problem number and the workbook name.
    async fn validate(
        &self,
        req: &AdminRequest,
    ) -> Result<(ProblemNumber, String), AdminRejection> {
        if !self.key_matches(&req.admin_key) {
            return Err(AdminRejection::InvalidAdminKey);
        }
        let number =
            parse_problem_id(&req.problem_id).ok_or(AdminRejection::InvalidProblemId)?;
        let workbook = self
            .store
            .get(&req.workbook_key)
            .await
            .ok_or(AdminRejection::UnknownWorkbook)?;
        Ok((number, workbook.name))
    }

    pub async fn add_problem(&self, req: &AdminRequest) -> AdminOutcome {
        self.try_add(req).await.unwrap_or_else(|rejection| {
            warn!(
                workbook = %req.workbook_key,
                problem_id = %req.problem_id,
                code = rejection.code(),
                "add rejected"
            );
            AdminOutcome::Rejected(rejection)
        })
    }

    pub async fn delete_problem(&self, req: &AdminRequest) -> AdminOutcome {
        self.try_delete(req).await.unwrap_or_else(|rejection| {
            warn!(
                workbook = %req.workbook_key,
                problem_id = %req.problem_id,
                code = rejection.code(),
                "delete rejected"
            );
            AdminOutcome::Rejected(rejection)
        })
    }

    async fn try_add(&self, req: &AdminRequest) -> Result<AdminOutcome, AdminRejection> {
        let (number, name) = self.validate(req).await?;
        let key = req.workbook_key.as_str();
        let ProblemNumber::Id(problem_id) = number else {
            return Err(AdminRejection::ProblemNotOnJudge);
        };

        match self.judge.check_problem(problem_id).await {
            ProblemExistence::Exists => {}
            ProblemExistence::NotFound => return Err(AdminRejection::ProblemNotOnJudge),
            ProblemExistence::LookupFailed(_) => return Err(AdminRejection::LookupFailed),
        }

        match self
            .store
            .insert_problem(key, problem_id)
            .await
            .map_err(store_rejection)?
        {
            InsertOutcome::Inserted => {
                info!(workbook = key, problem_id, "problem added");
                Ok(AdminOutcome::Success(format!(
                    "added problem {problem_id} to {name}"
                )))
            }
            InsertOutcome::AlreadyPresent => Ok(AdminOutcome::Info(format!(
                "problem {problem_id} is already present in {name}"
            ))),
        }
    }

    async fn try_delete(&self, req: &AdminRequest) -> Result<AdminOutcome, AdminRejection> {
        let (number, name) = self.validate(req).await?;
        let key = req.workbook_key.as_str();
        let ProblemNumber::Id(problem_id) = number else {
            return Err(AdminRejection::NotInWorkbook);
        };

        match self
            .store
            .remove_problem(key, problem_id)
            .await
            .map_err(store_rejection)?
        {
            RemoveOutcome::Removed => {
                info!(workbook = key, problem_id, "problem removed");
                Ok(AdminOutcome::Success(format!(
                    "removed problem {problem_id} from {name}"
                )))
            }
            RemoveOutcome::NotPresent => Err(AdminRejection::NotInWorkbook),
        }
    }
}

fn store_rejection(err: StoreError) -> AdminRejection {
    match err {
        StoreError::UnknownWorkbook(_) => AdminRejection::UnknownWorkbook,
        other => AdminRejection::PersistFailed(other.to_string()),
    }
}
