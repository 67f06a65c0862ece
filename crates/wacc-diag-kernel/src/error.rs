//! Error types for the kernel.
//!
//! None of these abort a validation pass: analyzer errors degrade the pass to
//! local diagnostics, and configuration errors surface before any pass runs.

use std::path::PathBuf;
use std::time::Duration;

/// Failure to obtain output from the external analyzer.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("failed to write analyzer input to {}: {source}", .path.display())]
    WriteInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run analyzer `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("analyzer exited with {}", describe_exit(.code))]
    ExitStatus { code: Option<i32>, stderr: String },

    #[error("analyzer did not finish within {0:?}")]
    Timeout(Duration),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Failure to load an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config{}: {source}", describe_path(.path))]
    Parse {
        path: Option<PathBuf>,
        #[source]
        source: toml::de::Error,
    },
}

fn describe_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" {}", p.display()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_status_messages() {
        let err = AnalyzerError::ExitStatus {
            code: Some(1),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "analyzer exited with status 1");
        let err = AnalyzerError::ExitStatus {
            code: None,
            stderr: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "analyzer exited with no status (terminated by signal)"
        );
    }

    #[test]
    fn timeout_message() {
        let err = AnalyzerError::Timeout(Duration::from_secs(3));
        assert_eq!(err.to_string(), "analyzer did not finish within 3s");
    }
}
