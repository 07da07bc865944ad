/// Progress of one handle through one workbook.
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use judge_common::solvedac::{JudgeApi, SolvedSet};
use judge_common::tier::format_tier;

use crate::model::{ProblemEntry, ProgressOutcome, ProgressResult, Workbook};
use crate::store::WorkbookStore;

/// Shown when the judge has no metadata for a problem.
pub const PLACEHOLDER_TITLE: &str = "(title unavailable)";

/// Partition `workbook` into solved and unsolved problems for `handle`.
///
/// Metadata is fetched per problem with at most `concurrency` requests in
/// flight; results keep workbook order. Failed lookups become placeholder
/// entries, so this never fails.
pub async fn compute_progress(
    judge: &dyn JudgeApi,
    workbook_key: &str,
    workbook: &Workbook,
    handle: &str,
    solved: &SolvedSet,
    concurrency: usize,
) -> ProgressResult {
    let entries: Vec<ProblemEntry> = stream::iter(workbook.problems.iter().copied())
        .map(|id| describe_problem(judge, id))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let (solved_list, unsolved_list): (Vec<_>, Vec<_>) =
        entries.into_iter().partition(|entry| solved.contains(&entry.id));

    let total = workbook.problems.len();
    let solved_cnt = solved_list.len();
    let rate = if total == 0 {
        0.0
    } else {
        solved_cnt as f64 / total as f64 * 100.0
    };

    ProgressResult {
        handle: handle.to_string(),
        workbook_key: workbook_key.to_string(),
        workbook_name: workbook.name.clone(),
        total,
        solved_cnt,
        rate,
        solved_list,
        unsolved_list,
    }
}

async fn describe_problem(judge: &dyn JudgeApi, id: u32) -> ProblemEntry {
    match judge.get_problem_info(id).await {
        Some(info) => ProblemEntry {
            id,
            name: info.title,
            tier: format_tier(info.level),
            level: info.level,
        },
        None => ProblemEntry {
            id,
            name: PLACEHOLDER_TITLE.to_string(),
            tier: format_tier(0),
            level: 0,
        },
    }
}

/// Serves progress lookups against the shared store and judge client.
pub struct ProgressTracker {
    store: Arc<WorkbookStore>,
    judge: Arc<dyn JudgeApi>,
    concurrency: usize,
}

impl ProgressTracker {
    pub fn new(store: Arc<WorkbookStore>, judge: Arc<dyn JudgeApi>, concurrency: usize) -> Self {
        Self {
            store,
            judge,
            concurrency,
        }
    }

    /// Both inputs are optional: until the page has supplied a handle and a
    /// workbook there is nothing to show. An empty string counts as not
    /// supplied; anything else is used verbatim.
    pub async fn lookup_progress(
        &self,
        handle: Option<&str>,
        workbook_key: Option<&str>,
    ) -> ProgressOutcome {
        let handle = handle.filter(|h| !h.is_empty());
        let workbook_key = workbook_key.filter(|k| !k.is_empty());
        let (Some(handle), Some(workbook_key)) = (handle, workbook_key) else {
            return ProgressOutcome::Idle;
        };

        let Some(workbook) = self.store.get(workbook_key).await else {
            return ProgressOutcome::Error {
                message: "invalid workbook key".to_string(),
            };
        };

        let solved = match self.judge.get_solved_set(handle).await {
            Ok(solved) => solved,
            Err(e) => {
                warn!(handle, workbook = workbook_key, error = %e, "solved set fetch failed");
                return ProgressOutcome::Error {
                    message: format!("an error occurred: {e}"),
                };
            }
        };

        let progress = compute_progress(
            self.judge.as_ref(),
            workbook_key,
            &workbook,
            handle,
            &solved,
            self.concurrency,
        )
        .await;
        info!(
            handle,
            workbook = workbook_key,
            solved = progress.solved_cnt,
            total = progress.total,
            "progress computed"
        );
        ProgressOutcome::Progress { progress }
    }
}
