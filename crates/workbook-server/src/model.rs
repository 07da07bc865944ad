use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A curated problem set. The workbook key is the map key in
/// [`WorkbookCollection`], not a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workbook {
    /// Display name, e.g. "Basics"
    pub name: String,
    /// Baekjoon problem IDs in display order
    pub problems: Vec<u32>,
}

/// Every workbook keyed by its stable key. This is the exact shape of the
/// persisted JSON document.
pub type WorkbookCollection = BTreeMap<String, Workbook>;

/// One row of the workbook selector.
#[derive(Debug, Clone, Serialize)]
pub struct WorkbookSummary {
    pub key: String,
    pub name: String,
    pub problem_count: usize,
}

/// A workbook problem decorated with judge metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemEntry {
    pub id: u32,
    pub name: String,
    /// Human-readable tier label such as "Gold 3"
    pub tier: String,
    pub level: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressResult {
    pub handle: String,
    pub workbook_key: String,
    pub workbook_name: String,
    pub total: usize,
    pub solved_cnt: usize,
    /// Percentage in [0, 100]; 0 for an empty workbook
    pub rate: f64,
    pub solved_list: Vec<ProblemEntry>,
    pub unsolved_list: Vec<ProblemEntry>,
}

/// Result of a progress lookup as seen by the page.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProgressOutcome {
    /// Handle or workbook not supplied yet.
    Idle,
    Progress { progress: ProgressResult },
    Error { message: String },
}
