use std::path::PathBuf;

use remedy_engine::{DataFiles, FailurePolicy};

use crate::error::AppError;

/// Application configuration loaded explicitly from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection URL (e.g. "redis://127.0.0.1:6379"). `None` disables caching.
    pub redis_url: Option<String>,
    /// Directory holding the repertory, remedy map and (optionally) remedy patterns.
    pub data_dir: PathBuf,
    pub repertory_file: String,
    pub remedy_map_file: String,
    pub patterns_file: String,
    pub failure_policy: FailurePolicy,
}

impl Config {
    /// Required:
    /// - `REMEDY_DATA_DIR`: directory with the reference JSON files
    ///
    /// Optional:
    /// - `REMEDY_REPERTORY_FILE` (default: "repertory_full.json")
    /// - `REMEDY_MAP_FILE` (default: "remedy_map.json")
    /// - `REMEDY_PATTERNS_FILE` (default: "remedy_patterns.json", skipped if absent)
    /// - `REMEDY_FAILURE_POLICY`: "open" (default) or "closed"
    /// - `REDIS_URL`
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let data_dir = var("REMEDY_DATA_DIR").ok_or_else(|| {
            AppError::Config("REMEDY_DATA_DIR environment variable is required".to_string())
        })?;

        let failure_policy = match var("REMEDY_FAILURE_POLICY") {
            Some(raw) => raw.parse::<FailurePolicy>().map_err(AppError::Config)?,
            None => FailurePolicy::default(),
        };

        let config = Self {
            redis_url: var("REDIS_URL"),
            data_dir: PathBuf::from(data_dir),
            repertory_file: var("REMEDY_REPERTORY_FILE")
                .unwrap_or_else(|| "repertory_full.json".to_string()),
            remedy_map_file: var("REMEDY_MAP_FILE")
                .unwrap_or_else(|| "remedy_map.json".to_string()),
            patterns_file: var("REMEDY_PATTERNS_FILE")
                .unwrap_or_else(|| "remedy_patterns.json".to_string()),
            failure_policy,
        };

        for required in [&config.repertory_file, &config.remedy_map_file] {
            let file = config.data_dir.join(required);
            if !file.exists() {
                return Err(AppError::Config(format!(
                    "required file not found: {}",
                    file.display()
                )));
            }
        }

        Ok(config)
    }

    pub fn data_files(&self) -> DataFiles {
        let patterns = self.data_dir.join(&self.patterns_file);
        DataFiles {
            repertory: self.data_dir.join(&self.repertory_file),
            remedy_map: self.data_dir.join(&self.remedy_map_file),
            patterns: patterns.exists().then_some(patterns),
        }
    }
}
