//! The diagnostics engine: one validation pass per document snapshot.
//!
//! A pass masks the text, runs the local checks, awaits the external
//! analyzer and merges everything into one capped list:
//!
//! 1. block-structure diagnostics
//! 2. identifier diagnostics
//! 3. analyzer errors
//! 4. analyzer warnings
//!
//! Passes for the same document may overlap while the analyzer is running.
//! Every pass is tagged with a sequence number when it starts and only
//! publishes if nothing newer has published in the meantime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, trace, warn};
use wacc_diag_types::DiagnosticRecord;

use crate::config::EngineConfig;
use crate::diagnostics::DiagnosticBuilder;
use crate::error::ConfigError;
use crate::external::{Analyzer, ExternalOutputParser, NoAnalyzer, ProcessAnalyzer};
use crate::source::SourceText;
use crate::validator::validate_local;

/// Whether the analyzer contributed to a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalStatus {
    Completed,
    /// The analyzer failed; the pass carries local diagnostics only.
    Failed(String),
}

/// The diagnostics of one completed pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub uri: String,
    pub sequence: u64,
    pub diagnostics: Vec<DiagnosticRecord>,
    pub external: ExternalStatus,
}

impl PassReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(DiagnosticRecord::is_error)
    }
}

/// What became of a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The pass is now the document's authoritative diagnostics.
    Published(PassReport),
    /// A newer pass published first; this one was discarded.
    Stale { sequence: u64, current: u64 },
    /// The document was closed while the pass was running.
    Closed { sequence: u64 },
}

impl ValidationOutcome {
    pub fn report(&self) -> Option<&PassReport> {
        match self {
            ValidationOutcome::Published(report) => Some(report),
            _ => None,
        }
    }

    pub fn into_report(self) -> Option<PassReport> {
        match self {
            ValidationOutcome::Published(report) => Some(report),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct DocumentState {
    /// Sequence of the first pass after the document was (re)opened.
    opened_at: u64,
    published: Option<PassReport>,
}

/// Validates WACC documents.
pub struct Engine {
    config: EngineConfig,
    analyzer: Arc<dyn Analyzer>,
    /// Monotonic across all documents, so a reopened document never reuses
    /// a sequence number of a pass still in flight.
    sequence: AtomicU64,
    documents: Mutex<HashMap<String, DocumentState>>,
}

impl Engine {
    pub fn new(config: EngineConfig, analyzer: Arc<dyn Analyzer>) -> Self {
        Self {
            config,
            analyzer,
            sequence: AtomicU64::new(0),
            documents: Mutex::new(HashMap::new()),
        }
    }

    /// Build an engine with the analyzer named in `config`, if any.
    pub fn from_config(config: EngineConfig) -> Self {
        let analyzer: Arc<dyn Analyzer> = match &config.analyzer {
            Some(analyzer) => Arc::new(ProcessAnalyzer::new(analyzer.clone())),
            None => Arc::new(NoAnalyzer),
        };
        Self::new(config, analyzer)
    }

    /// Build an engine from the user's config file.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self::from_config(EngineConfig::load()?))
    }

    /// An engine that never runs an analyzer.
    pub fn local_only(config: EngineConfig) -> Self {
        Self::new(config, Arc::new(NoAnalyzer))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one pass over a full-text snapshot of `uri`.
    pub async fn validate(&self, uri: &str, text: &str) -> ValidationOutcome {
        let sequence = self.begin(uri);
        let source = SourceText::new(text);
        let mut db = DiagnosticBuilder::new(uri, self.config.related_information);

        let mut diagnostics =
            validate_local(&source, &mut db, self.config.block_errors).into_records();
        let local_count = diagnostics.len();

        let external = match self.analyzer.analyze(uri, text).await {
            Ok(output) => {
                diagnostics.extend(ExternalOutputParser::new(&source).parse(&output, &mut db));
                ExternalStatus::Completed
            }
            Err(e) => {
                warn!(
                    uri,
                    sequence,
                    error = %e,
                    "analyzer failed, reporting local diagnostics only"
                );
                ExternalStatus::Failed(e.to_string())
            }
        };

        let total = diagnostics.len();
        diagnostics.truncate(self.config.max_number_of_problems);
        debug!(
            uri,
            sequence,
            local = local_count,
            external = total - local_count,
            reported = diagnostics.len(),
            "validation pass complete"
        );

        self.publish(PassReport {
            uri: uri.to_string(),
            sequence,
            diagnostics,
            external,
        })
    }

    /// The last published diagnostics for `uri`.
    pub fn diagnostics(&self, uri: &str) -> Vec<DiagnosticRecord> {
        self.latest(uri)
            .map(|report| report.diagnostics)
            .unwrap_or_default()
    }

    /// The last published report for `uri`.
    pub fn latest(&self, uri: &str) -> Option<PassReport> {
        self.lock()
            .get(uri)
            .and_then(|state| state.published.clone())
    }

    /// Forget a document. Passes still running for it are discarded.
    pub fn close(&self, uri: &str) {
        self.lock().remove(uri);
    }

    fn begin(&self, uri: &str) -> u64 {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let mut documents = self.lock();
        documents
            .entry(uri.to_string())
            .or_insert_with(|| DocumentState {
                opened_at: sequence,
                published: None,
            });
        sequence
    }

    fn publish(&self, report: PassReport) -> ValidationOutcome {
        let sequence = report.sequence;
        let mut documents = self.lock();
        let Some(state) = documents.get_mut(&report.uri) else {
            trace!(uri = %report.uri, sequence, "document closed, discarding pass");
            return ValidationOutcome::Closed { sequence };
        };
        // A pass started before the document was last closed.
        if sequence < state.opened_at {
            return ValidationOutcome::Closed { sequence };
        }
        if let Some(current) = state.published.as_ref().map(|p| p.sequence) {
            if current > sequence {
                trace!(uri = %report.uri, sequence, current, "stale pass discarded");
                return ValidationOutcome::Stale { sequence, current };
            }
        }
        state.published = Some(report.clone());
        ValidationOutcome::Published(report)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, DocumentState>> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
