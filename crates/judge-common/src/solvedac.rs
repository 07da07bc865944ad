/// Client for the solved.ac v3 API, which tracks Baekjoon problems and the
/// handles that solved them.
///
/// Endpoints used:
/// - `GET /search/problem?query=solved_by:{handle}&page={n}` — paginated search
/// - `GET /problem/lookup?problemIds={id}` — metadata, always a list payload
use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::JudgeError;

pub const DEFAULT_BASE_URL: &str = "https://solved.ac/api/v3";

/// Problem IDs solved by one handle.
pub type SolvedSet = HashSet<u32>;

#[derive(Clone, Debug)]
pub struct SolvedAcConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub max_error_body_bytes: usize,
}

impl Default for SolvedAcConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            max_error_body_bytes: 8 * 1024,
        }
    }
}

impl SolvedAcConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Self::from_env`] but reads variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url =
            lookup("SOLVEDAC_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout = lookup("SOLVEDAC_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|&n| n > 0)
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(10));

        let max_error_body_bytes = lookup("SOLVEDAC_MAX_ERROR_BODY_BYTES")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(8 * 1024);

        Self::with_base_url(&base_url).timeout(timeout).max_error_body_bytes(max_error_body_bytes)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_error_body_bytes(mut self, max: usize) -> Self {
        self.max_error_body_bytes = max;
        self
    }
}

/// Problem metadata as returned by `/problem/lookup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemInfo {
    #[serde(rename = "problemId")]
    pub problem_id: u32,
    #[serde(rename = "titleKo", default)]
    pub title: String,
    /// Difficulty rank, 0 when unrated.
    #[serde(default)]
    pub level: u32,
}

/// Outcome of checking whether a problem exists on the judge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProblemExistence {
    Exists,
    NotFound,
    /// The judge could not be asked; existence is unknown.
    LookupFailed(String),
}

impl ProblemExistence {
    pub fn is_exists(&self) -> bool {
        matches!(self, ProblemExistence::Exists)
    }
}

/// Operations the service needs from the remote judge.
#[async_trait]
pub trait JudgeApi: Send + Sync {
    /// Walk every page of the "solved by handle" search and collect the IDs.
    /// Any failed page aborts the whole aggregation.
    async fn get_solved_set(&self, handle: &str) -> Result<SolvedSet, JudgeError>;

    async fn check_problem(&self, problem_id: u32) -> ProblemExistence;

    /// Collapsed form of [`JudgeApi::check_problem`]: lookup failures read as "does not exist".
    async fn problem_exists(&self, problem_id: u32) -> bool {
        self.check_problem(problem_id).await.is_exists()
    }

    async fn get_problem_info(&self, problem_id: u32) -> Option<ProblemInfo>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    count: u64,
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(rename = "problemId", default)]
    problem_id: Option<u32>,
}

#[derive(Clone)]
pub struct SolvedAcClient {
    config: SolvedAcConfig,
    http: reqwest::Client,
}

impl SolvedAcClient {
    pub fn new(config: SolvedAcConfig) -> Result<Self, JudgeError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("workbook-progress/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &SolvedAcConfig {
        &self.config
    }

    /// Single `/problem/lookup` call. `Ok(None)` means the judge answered with
    /// an empty list.
    async fn lookup(&self, problem_id: u32) -> Result<Option<ProblemInfo>, JudgeError> {
        let url = format!("{}/problem/lookup", self.config.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("problemIds", problem_id.to_string())])
            .timeout(self.config.timeout)
            .send()
            .await?;
        let infos: Vec<ProblemInfo> =
            Self::parse_json_response(resp, self.config.max_error_body_bytes).await?;
        Ok(infos.into_iter().next())
    }

    async fn parse_json_response<T: for<'de> Deserialize<'de>>(
        resp: reqwest::Response,
        max_error_body_bytes: usize,
    ) -> Result<T, JudgeError> {
        let status = resp.status();
        if status == StatusCode::OK {
            let body = resp.bytes().await?;
            return Ok(serde_json::from_slice(&body)?);
        }
        let body = read_limited_text(resp, max_error_body_bytes).await;
        Err(JudgeError::Upstream { status, body })
    }
}

#[async_trait]
impl JudgeApi for SolvedAcClient {
    async fn get_solved_set(&self, handle: &str) -> Result<SolvedSet, JudgeError> {
        let url = format!("{}/search/problem", self.config.base_url);
        let query = format!("solved_by:{handle}");
        let mut solved = SolvedSet::new();
        let mut page: u64 = 1;

        loop {
            let page_param = page.to_string();
            let resp = self
                .http
                .get(&url)
                .query(&[("query", query.as_str()), ("page", page_param.as_str())])
                .timeout(self.config.timeout)
                .send()
                .await?;
            let data: SearchResponse =
                Self::parse_json_response(resp, self.config.max_error_body_bytes).await?;

            let per_page = data.items.len() as u64;
            solved.extend(data.items.iter().filter_map(|item| item.problem_id));
            debug!(handle, page, per_page, total = data.count, "fetched solved page");

            if per_page == 0 || page.saturating_mul(per_page) >= data.count {
                break;
            }
            page += 1;
        }

        Ok(solved)
    }

    async fn check_problem(&self, problem_id: u32) -> ProblemExistence {
        match self.lookup(problem_id).await {
            Ok(Some(_)) => ProblemExistence::Exists,
            Ok(None) => ProblemExistence::NotFound,
            Err(JudgeError::Upstream { status, .. }) if status == StatusCode::NOT_FOUND => {
                ProblemExistence::NotFound
            }
            Err(e) => {
                warn!(problem_id, error = %e, "problem existence check failed");
                ProblemExistence::LookupFailed(e.to_string())
            }
        }
    }

    async fn get_problem_info(&self, problem_id: u32) -> Option<ProblemInfo> {
        self.lookup(problem_id)
            .await
            .inspect_err(|e| warn!(problem_id, error = %e, "problem lookup failed"))
            .ok()
            .flatten()
    }
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(mut b) => {
            if b.len() > max_bytes {
                b.truncate(max_bytes);
            }
            String::from_utf8_lossy(&b).to_string()
        }
        Err(e) => {
            warn!(error = %e, "failed to read upstream error body");
            "<failed to read error body>".to_string()
        }
    }
}
