use std::fmt;
use std::path::PathBuf;

use judge_common::solvedac::SolvedAcConfig;

use crate::error::AppError;

/// Application configuration loaded explicitly from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Shared secret admins must present to mutate workbooks.
    pub admin_key: String,
    /// JSON document holding every workbook.
    pub workbooks_path: PathBuf,
    /// Socket address the HTTP server binds to.
    pub bind_addr: String,
    /// Upper bound on concurrent metadata lookups per progress request.
    pub progress_concurrency: usize,
    pub solvedac: SolvedAcConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `ADMIN_KEY`: admin shared secret, must not be blank
    ///
    /// Optional:
    /// - `WORKBOOKS_PATH`: workbook JSON file (default `workbooks.json`)
    /// - `BIND_ADDR`: listen address (default `127.0.0.1:8000`)
    /// - `PROGRESS_CONCURRENCY`: metadata fan-out cap (default 4)
    /// - `SOLVEDAC_BASE_URL`, `SOLVEDAC_TIMEOUT_SECS`, `SOLVEDAC_MAX_ERROR_BODY_BYTES`
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Self::from_env`] but reads variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let admin_key = lookup("ADMIN_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config("ADMIN_KEY environment variable is required".to_string())
            })?;

        let workbooks_path = lookup("WORKBOOKS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("workbooks.json"));
        if !workbooks_path.is_file() {
            return Err(AppError::Config(format!(
                "workbook file not found at {}",
                workbooks_path.display()
            )));
        }

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8000".to_string());

        let progress_concurrency = match lookup("PROGRESS_CONCURRENCY") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| {
                    AppError::Config(format!(
                        "PROGRESS_CONCURRENCY must be a positive integer, got {raw:?}"
                    ))
                })?,
            None => 4,
        };

        Ok(Self {
            admin_key,
            workbooks_path,
            bind_addr,
            progress_concurrency,
            solvedac: SolvedAcConfig::from_lookup(&lookup),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("admin_key", &"<redacted>")
            .field("workbooks_path", &self.workbooks_path)
            .field("bind_addr", &self.bind_addr)
            .field("progress_concurrency", &self.progress_concurrency)
            .field("solvedac", &self.solvedac)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use judge_common::solvedac::DEFAULT_BASE_URL;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    fn workbook_file() -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workbooks.json");
        std::fs::write(&path, "{}").unwrap();
        let path = path.to_string_lossy().into_owned();
        (dir, path)
    }

    fn config_error(result: Result<Config, AppError>) -> String {
        match result {
            Err(AppError::Config(msg)) => msg,
            Err(other) => panic!("expected a config error, got {other}"),
            Ok(config) => panic!("expected a config error, got {config:?}"),
        }
    }

    #[test]
    fn test_defaults() {
        let (_dir, path) = workbook_file();
        let config = load(&[("ADMIN_KEY", "s3cret"), ("WORKBOOKS_PATH", path.as_str())]).unwrap();

        assert_eq!(config.admin_key, "s3cret");
        assert_eq!(config.workbooks_path, PathBuf::from(&path));
        assert_eq!(config.bind_addr, "127.0.0.1:8000");
        assert_eq!(config.progress_concurrency, 4);
        assert_eq!(config.solvedac.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.solvedac.timeout, Duration::from_secs(10));
        assert_eq!(config.solvedac.max_error_body_bytes, 8 * 1024);
    }

    #[test]
    fn test_overrides() {
        let (_dir, path) = workbook_file();
        let config = load(&[
            ("ADMIN_KEY", "s3cret"),
            ("WORKBOOKS_PATH", path.as_str()),
            ("BIND_ADDR", "0.0.0.0:9000"),
            ("PROGRESS_CONCURRENCY", "1"),
            ("SOLVEDAC_BASE_URL", "http://127.0.0.1:1234/api/"),
            ("SOLVEDAC_TIMEOUT_SECS", "3"),
            ("SOLVEDAC_MAX_ERROR_BODY_BYTES", "64"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.progress_concurrency, 1);
        assert_eq!(config.solvedac.base_url, "http://127.0.0.1:1234/api");
        assert_eq!(config.solvedac.timeout, Duration::from_secs(3));
        assert_eq!(config.solvedac.max_error_body_bytes, 64);
    }

    #[test]
    fn test_admin_key_required() {
        let (_dir, path) = workbook_file();

        let missing = config_error(load(&[("WORKBOOKS_PATH", path.as_str())]));
        assert!(missing.contains("ADMIN_KEY"), "{missing}");

        let blank = config_error(load(&[("ADMIN_KEY", "   "), ("WORKBOOKS_PATH", path.as_str())]));
        assert!(blank.contains("ADMIN_KEY"), "{blank}");
    }

    #[test]
    fn test_missing_workbook_file() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("absent.json");
        let absent = absent.to_string_lossy();

        let msg = config_error(load(&[("ADMIN_KEY", "s3cret"), ("WORKBOOKS_PATH", &*absent)]));
        assert!(msg.contains("absent.json"), "{msg}");

        // A directory is not a workbook file either.
        let dir_path = dir.path().to_string_lossy();
        config_error(load(&[("ADMIN_KEY", "s3cret"), ("WORKBOOKS_PATH", &*dir_path)]));
    }

    #[test]
    fn test_progress_concurrency_must_be_positive() {
        let (_dir, path) = workbook_file();

        for raw in ["0", "abc", "-2", ""] {
            let msg = config_error(load(&[
                ("ADMIN_KEY", "s3cret"),
                ("WORKBOOKS_PATH", path.as_str()),
                ("PROGRESS_CONCURRENCY", raw),
            ]));
            assert!(msg.contains("PROGRESS_CONCURRENCY"), "{msg}");
        }
    }

    #[test]
    fn test_debug_redacts_admin_key() {
        let (_dir, path) = workbook_file();
        let config = load(&[("ADMIN_KEY", "s3cret"), ("WORKBOOKS_PATH", path.as_str())]).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("<redacted>"));
    }
}
