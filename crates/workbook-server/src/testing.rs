//! Test doubles shared by the unit tests.
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::ThreadId;

use async_trait::async_trait;
use judge_common::error::JudgeError;
use judge_common::solvedac::{JudgeApi, ProblemExistence, ProblemInfo, SolvedSet};

use crate::model::{Workbook, WorkbookCollection};
use crate::store::{StoreError, WorkbookPersistence};

pub fn basics_collection() -> WorkbookCollection {
    let mut collection = WorkbookCollection::new();
    collection.insert(
        "basics".to_string(),
        Workbook {
            name: "Basics".to_string(),
            problems: vec![1000, 1001, 1003],
        },
    );
    collection.insert(
        "empty".to_string(),
        Workbook {
            name: "Empty".to_string(),
            problems: vec![],
        },
    );
    collection
}

/// Keeps every saved snapshot in memory instead of touching disk.
pub struct MemoryPersistence {
    initial: WorkbookCollection,
    saved: Arc<Mutex<Vec<WorkbookCollection>>>,
    save_threads: Arc<Mutex<Vec<ThreadId>>>,
    fail: AtomicBool,
}

impl MemoryPersistence {
    pub fn new(initial: WorkbookCollection) -> Self {
        Self {
            initial,
            saved: Arc::new(Mutex::new(Vec::new())),
            save_threads: Arc::new(Mutex::new(Vec::new())),
            fail: AtomicBool::new(false),
        }
    }

    pub fn saved(&self) -> Arc<Mutex<Vec<WorkbookCollection>>> {
        Arc::clone(&self.saved)
    }

    /// Thread each `save` ran on.
    pub fn save_threads(&self) -> Arc<Mutex<Vec<ThreadId>>> {
        Arc::clone(&self.save_threads)
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl WorkbookPersistence for MemoryPersistence {
    fn load(&self) -> Result<WorkbookCollection, StoreError> {
        Ok(self.initial.clone())
    }

    fn save(&self, snapshot: &WorkbookCollection) -> Result<(), StoreError> {
        if let Ok(mut threads) = self.save_threads.lock() {
            threads.push(std::thread::current().id());
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.saved
            .lock()
            .map_err(|_| StoreError::Io(std::io::Error::other("poisoned")))?
            .push(snapshot.clone());
        Ok(())
    }
}

/// In-memory judge with call counters.
#[derive(Default)]
pub struct FakeJudge {
    pub solved: HashMap<String, SolvedSet>,
    pub problems: HashMap<u32, ProblemInfo>,
    /// Handles whose solved-set fetch fails.
    pub failing_handles: Vec<String>,
    /// Problem IDs whose existence check cannot reach the judge.
    pub unreachable: Vec<u32>,
    pub existence_calls: AtomicUsize,
    pub info_calls: AtomicUsize,
    /// `get_problem_info` calls currently awaiting, and the most seen at once.
    pub info_in_flight: AtomicUsize,
    pub info_peak: AtomicUsize,
}

impl FakeJudge {
    pub fn with_problem(mut self, id: u32, title: &str, level: u32) -> Self {
        self.problems.insert(
            id,
            ProblemInfo {
                problem_id: id,
                title: title.to_string(),
                level,
            },
        );
        self
    }

    pub fn with_solved(mut self, handle: &str, ids: &[u32]) -> Self {
        self.solved
            .insert(handle.to_string(), ids.iter().copied().collect());
        self
    }
}

#[async_trait]
impl JudgeApi for FakeJudge {
    async fn get_solved_set(&self, handle: &str) -> Result<SolvedSet, JudgeError> {
        if self.failing_handles.iter().any(|h| h == handle) {
            let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
            return Err(JudgeError::InvalidJson(err));
        }
        Ok(self.solved.get(handle).cloned().unwrap_or_default())
    }

    async fn check_problem(&self, problem_id: u32) -> ProblemExistence {
        self.existence_calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.contains(&problem_id) {
            return ProblemExistence::LookupFailed("connection refused".to_string());
        }
        if self.problems.contains_key(&problem_id) {
            ProblemExistence::Exists
        } else {
            ProblemExistence::NotFound
        }
    }

    async fn get_problem_info(&self, problem_id: u32) -> Option<ProblemInfo> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.info_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.info_peak.fetch_max(now, Ordering::SeqCst);
        // Stay pending for a few polls so overlapping lookups are visible.
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        self.info_in_flight.fetch_sub(1, Ordering::SeqCst);
        self.problems.get(&problem_id).cloned()
    }
}
