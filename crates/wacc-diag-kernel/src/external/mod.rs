//! The external analyzer: the real WACC compiler run as a subprocess.
//!
//! The engine hands each document's text to an [`Analyzer`] and gets back
//! the two output channels, which [`ExternalOutputParser`] turns into
//! diagnostics. Analyzer failures never fail a pass; the engine just reports
//! local diagnostics alone.

mod parser;

pub use parser::{
    additional_info, coordinate, identifier, offset, ExternalOutputParser, ERROR_KEYWORDS,
    UNUSED_VARIABLE,
};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, PoisonError};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;

/// What an analyzer run printed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzerOutput {
    /// Informational channel; carries warnings.
    pub stdout: String,
    /// Error channel.
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl AnalyzerOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code: Some(0),
        }
    }
}

/// Produces analyzer output for a document.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, uri: &str, text: &str) -> Result<AnalyzerOutput, AnalyzerError>;
}

/// An analyzer that never reports anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAnalyzer;

#[async_trait]
impl Analyzer for NoAnalyzer {
    async fn analyze(&self, _uri: &str, _text: &str) -> Result<AnalyzerOutput, AnalyzerError> {
        Ok(AnalyzerOutput::default())
    }
}

/// Runs a compiler over a scratch copy of the document.
///
/// Each document gets its own scratch file, so runs for different documents
/// overlap. Runs for the same document share that file and are serialized.
pub struct ProcessAnalyzer {
    config: AnalyzerConfig,
    scratch_dir: PathBuf,
    locks: std::sync::Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl ProcessAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let scratch_dir = config.scratch_dir();
        Self {
            config,
            scratch_dir,
            locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// The scratch file `uri`'s text is written to: a digest of the URI
    /// under the scratch directory.
    pub fn scratch_path(&self, uri: &str) -> PathBuf {
        let digest = Sha256::digest(uri.as_bytes());
        let name: String = digest[..8].iter().map(|b| format!("{b:02x}")).collect();
        self.scratch_dir.join(format!("{name}.wacc"))
    }

    fn file_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(path.to_path_buf()).or_default().clone()
    }

    /// Drop the lock entry once no other run holds or awaits it.
    fn release(&self, path: &Path, lock: &Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one held by the caller.
        if Arc::strong_count(lock) == 2 {
            locks.remove(path);
        }
    }

    async fn write_input(&self, path: &Path, text: &str) -> Result<(), AnalyzerError> {
        let write_err = |source| AnalyzerError::WriteInput {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        tokio::fs::write(path, text).await.map_err(write_err)
    }

    async fn run(
        &self,
        uri: &str,
        path: &Path,
        text: &str,
    ) -> Result<AnalyzerOutput, AnalyzerError> {
        self.write_input(path, text).await?;

        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::trace!(
            uri,
            command = %self.config.command,
            path = %path.display(),
            "running analyzer"
        );

        let timeout = self.config.timeout();
        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(AnalyzerError::Spawn {
                    command: self.config.command.clone(),
                    source,
                });
            }
            Err(_) => return Err(AnalyzerError::Timeout(timeout)),
        };

        let exit_code = output.status.code();
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !self.config.accepts(exit_code) {
            return Err(AnalyzerError::ExitStatus {
                code: exit_code,
                stderr,
            });
        }

        Ok(AnalyzerOutput {
            stdout,
            stderr,
            exit_code,
        })
    }
}

#[async_trait]
impl Analyzer for ProcessAnalyzer {
    async fn analyze(&self, uri: &str, text: &str) -> Result<AnalyzerOutput, AnalyzerError> {
        let path = self.scratch_path(uri);
        let lock = self.file_lock(&path);
        let result = {
            let _guard = lock.lock().await;
            self.run(uri, &path, text).await
        };
        self.release(&path, &lock);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_analyzer_is_silent() {
        let output = NoAnalyzer.analyze("file:///a.wacc", "begin skip end").await.unwrap();
        assert_eq!(output, AnalyzerOutput::default());
    }

    #[test]
    fn scratch_file_per_document() {
        let analyzer = ProcessAnalyzer::new(AnalyzerConfig::new("wacc").with_scratch_dir("/tmp/s"));
        let a = analyzer.scratch_path("file:///a.wacc");
        assert_eq!(a, analyzer.scratch_path("file:///a.wacc"));
        assert_ne!(a, analyzer.scratch_path("file:///b.wacc"));
        assert_eq!(a.parent(), Some(Path::new("/tmp/s")));
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some("wacc"));
    }

    #[tokio::test]
    async fn missing_command_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = ProcessAnalyzer::new(
            AnalyzerConfig::new("wacc-diag-no-such-compiler")
                .with_scratch_dir(dir.path()),
        );
        let err = analyzer.analyze("a.wacc", "begin skip end").await.unwrap_err();
        assert!(matches!(err, AnalyzerError::Spawn { .. }), "{err}");
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::time::Duration;

        fn sh(script: &str, dir: &tempfile::TempDir) -> AnalyzerConfig {
            // sh -c <script> <$0> <$1 = scratch path>
            AnalyzerConfig::new("sh")
                .with_args(["-c", script, "analyzer"])
                .with_scratch_dir(dir.path().join("nested"))
        }

        #[tokio::test]
        async fn writes_scratch_file_and_captures_channels() {
            let dir = tempfile::tempdir().unwrap();
            let analyzer = ProcessAnalyzer::new(sh(
                r#"cat "$1"; echo "Semantic errors:" >&2; exit 200"#,
                &dir,
            ));
            let output = analyzer.analyze("a.wacc", "begin skip end").await.unwrap();
            assert_eq!(output.stdout, "begin skip end");
            assert_eq!(output.stderr, "Semantic errors:\n");
            assert_eq!(output.exit_code, Some(200));

            let scratch = analyzer.scratch_path("a.wacc");
            assert!(scratch.starts_with(dir.path().join("nested")));
            let written = std::fs::read_to_string(scratch).unwrap();
            assert_eq!(written, "begin skip end");
        }

        #[tokio::test]
        async fn documents_run_side_by_side() {
            // The waiting document only finishes once the other one has run.
            let dir = tempfile::tempdir().unwrap();
            let marker = dir.path().join("second-ran");
            let script = format!(
                r#"if grep -q wait "$1"; then
  i=0
  while [ ! -f '{m}' ] && [ $i -lt 50 ]; do sleep 0.1; i=$((i + 1)); done
  [ -f '{m}' ] || exit 1
else
  touch '{m}'
fi"#,
                m = marker.display()
            );
            let analyzer = ProcessAnalyzer::new(sh(&script, &dir));
            let (first, second) = tokio::join!(
                analyzer.analyze("file:///a.wacc", "wait"),
                analyzer.analyze("file:///b.wacc", "go"),
            );
            assert_eq!(first.unwrap().exit_code, Some(0));
            assert_eq!(second.unwrap().exit_code, Some(0));
            assert!(analyzer.locks.lock().unwrap().is_empty());
        }

        #[tokio::test]
        async fn same_document_runs_take_turns() {
            let dir = tempfile::tempdir().unwrap();
            // Fails if another run rewrote the scratch file mid-run.
            let analyzer = ProcessAnalyzer::new(sh(
                r#"before=$(cat "$1"); sleep 0.3; [ "$(cat "$1")" = "$before" ] && cat "$1""#,
                &dir,
            ));
            let (first, second) = tokio::join!(
                analyzer.analyze("file:///a.wacc", "first"),
                analyzer.analyze("file:///a.wacc", "second"),
            );
            assert_eq!(first.unwrap().stdout, "first");
            assert_eq!(second.unwrap().stdout, "second");
        }

        #[tokio::test]
        async fn unexpected_exit_code_is_rejected() {
            let dir = tempfile::tempdir().unwrap();
            let analyzer = ProcessAnalyzer::new(sh("echo boom >&2; exit 3", &dir));
            match analyzer.analyze("a.wacc", "").await.unwrap_err() {
                AnalyzerError::ExitStatus { code, stderr } => {
                    assert_eq!(code, Some(3));
                    assert_eq!(stderr, "boom\n");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn slow_analyzer_times_out() {
            let dir = tempfile::tempdir().unwrap();
            let analyzer =
                ProcessAnalyzer::new(sh("sleep 5", &dir).with_timeout(Duration::from_secs(1)));
            let err = analyzer.analyze("a.wacc", "").await.unwrap_err();
            assert!(matches!(err, AnalyzerError::Timeout(d) if d == Duration::from_secs(1)));
        }
    }
}
