//! Engine configuration.
//!
//! Loaded from `$XDG_CONFIG_HOME/wacc-diag/config.toml` when present:
//!
//! ```toml
//! max_number_of_problems = 1000
//! related_information = false
//! block_errors = "all"
//!
//! [analyzer]
//! command = "java"
//! args = ["-jar", "wacc.jar"]
//! accepted_exit_codes = [0, 100, 200]
//! timeout_secs = 30
//! ```
//!
//! Without an `[analyzer]` table the engine validates locally only.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::paths;
use crate::validator::BlockReportMode;

/// Default cap on diagnostics per pass.
pub const DEFAULT_MAX_PROBLEMS: usize = 1000;

/// Success, syntax-error and semantic-error exit codes of the WACC compiler.
pub const DEFAULT_ACCEPTED_EXIT_CODES: &[i32] = &[0, 100, 200];

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for an [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Diagnostics beyond this many are dropped from a pass.
    pub max_number_of_problems: usize,
    /// Whether the client accepts related locations on diagnostics.
    pub related_information: bool,
    pub block_errors: BlockReportMode,
    /// The external analyzer, if any.
    pub analyzer: Option<AnalyzerConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_number_of_problems: DEFAULT_MAX_PROBLEMS,
            related_information: false,
            block_errors: BlockReportMode::All,
            analyzer: None,
        }
    }
}

impl EngineConfig {
    /// Read the user's config file, or defaults if there is none.
    pub fn load() -> Result<Self, ConfigError> {
        let path = paths::config_file();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Read an explicit config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse { path: None, source })
    }

    pub fn with_max_problems(mut self, max: usize) -> Self {
        self.max_number_of_problems = max;
        self
    }

    pub fn with_related_information(mut self, enabled: bool) -> Self {
        self.related_information = enabled;
        self
    }

    pub fn with_block_errors(mut self, mode: BlockReportMode) -> Self {
        self.block_errors = mode;
        self
    }

    pub fn with_analyzer(mut self, analyzer: Option<AnalyzerConfig>) -> Self {
        self.analyzer = analyzer;
        self
    }
}

/// How to run the external analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Directory holding one scratch file per document.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
    #[serde(default = "default_exit_codes")]
    pub accepted_exit_codes: Vec<i32>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_exit_codes() -> Vec<i32> {
    DEFAULT_ACCEPTED_EXIT_CODES.to_vec()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl AnalyzerConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            scratch_dir: None,
            accepted_exit_codes: default_exit_codes(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(paths::scratch_dir)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn accepts(&self, code: Option<i32>) -> bool {
        code.is_some_and(|c| self.accepted_exit_codes.contains(&c))
    }
}
