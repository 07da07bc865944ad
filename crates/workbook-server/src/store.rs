/// Workbook storage.
///
/// `WorkbookStore` owns the working copy of every workbook behind a `RwLock`
/// and flushes a full snapshot through its [`WorkbookPersistence`] port after
/// each mutation. If the flush fails the in-memory change is undone, so the
/// working copy never drifts ahead of what is on disk.
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::model::{Workbook, WorkbookCollection, WorkbookSummary};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid workbook JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown workbook: {0}")]
    UnknownWorkbook(String),

    #[error("save task join error: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Where workbook snapshots are loaded from and saved to.
pub trait WorkbookPersistence: Send + Sync {
    fn load(&self) -> Result<WorkbookCollection, StoreError>;
    fn save(&self, snapshot: &WorkbookCollection) -> Result<(), StoreError>;
}

/// Persists the collection as one pretty-printed JSON document.
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "workbooks.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl WorkbookPersistence for JsonFilePersistence {
    fn load(&self) -> Result<WorkbookCollection, StoreError> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write to a sibling temp file, then rename over the target so readers
    /// only ever see a complete document.
    fn save(&self, snapshot: &WorkbookCollection) -> Result<(), StoreError> {
        let mut json = serde_json::to_string_pretty(snapshot)?;
        json.push('\n');
        let tmp = self.temp_path();
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyPresent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotPresent,
}

pub struct WorkbookStore {
    workbooks: RwLock<WorkbookCollection>,
    persistence: Arc<dyn WorkbookPersistence>,
}

impl WorkbookStore {
    /// Load the collection once through `persistence`.
    pub fn open(persistence: Box<dyn WorkbookPersistence>) -> Result<Self, StoreError> {
        let workbooks = persistence.load()?;
        info!(workbooks = workbooks.len(), "workbooks loaded");
        Ok(Self {
            workbooks: RwLock::new(workbooks),
            persistence: Arc::from(persistence),
        })
    }

    pub async fn get(&self, key: &str) -> Option<Workbook> {
        self.workbooks.read().await.get(key).cloned()
    }

    pub async fn summaries(&self) -> Vec<WorkbookSummary> {
        self.workbooks
            .read()
            .await
            .iter()
            .map(|(key, wb)| WorkbookSummary {
                key: key.clone(),
                name: wb.name.clone(),
                problem_count: wb.problems.len(),
            })
            .collect()
    }

    /// Add `problem_id` and keep the list ascending. A problem already in the
    /// workbook is left alone and nothing is written.
    pub async fn insert_problem(
        &self,
        key: &str,
        problem_id: u32,
    ) -> Result<InsertOutcome, StoreError> {
        let mut workbooks = self.workbooks.write().await;
        let workbook = workbooks
            .get_mut(key)
            .ok_or_else(|| StoreError::UnknownWorkbook(key.to_string()))?;
        if workbook.problems.contains(&problem_id) {
            return Ok(InsertOutcome::AlreadyPresent);
        }

        let previous = workbook.problems.clone();
        workbook.problems.push(problem_id);
        workbook.problems.sort_unstable();

        self.flush_or_restore(&mut workbooks, key, previous).await?;
        Ok(InsertOutcome::Inserted)
    }

    pub async fn remove_problem(
        &self,
        key: &str,
        problem_id: u32,
    ) -> Result<RemoveOutcome, StoreError> {
        let mut workbooks = self.workbooks.write().await;
        let workbook = workbooks
            .get_mut(key)
            .ok_or_else(|| StoreError::UnknownWorkbook(key.to_string()))?;
        let Some(pos) = workbook.problems.iter().position(|&p| p == problem_id) else {
            return Ok(RemoveOutcome::NotPresent);
        };

        let previous = workbook.problems.clone();
        workbook.problems.remove(pos);

        self.flush_or_restore(&mut workbooks, key, previous).await?;
        Ok(RemoveOutcome::Removed)
    }

    /// Save on the blocking pool. The caller keeps the write guard across the
    /// await, so saves are still serialized with other mutations.
    async fn flush_or_restore(
        &self,
        workbooks: &mut WorkbookCollection,
        key: &str,
        previous: Vec<u32>,
    ) -> Result<(), StoreError> {
        let persistence = Arc::clone(&self.persistence);
        let snapshot = workbooks.clone();
        let saved = tokio::task::spawn_blocking(move || persistence.save(&snapshot))
            .await
            .map_err(StoreError::from)
            .and_then(|result| result);
        if let Err(e) = saved {
            warn!(workbook = key, error = %e, "failed to persist workbooks, rolling back");
            if let Some(workbook) = workbooks.get_mut(key) {
                workbook.problems = previous;
            }
            return Err(e);
        }
        Ok(())
    }
}
