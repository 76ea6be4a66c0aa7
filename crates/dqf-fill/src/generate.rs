//! Document generation: fill when the template is usable, otherwise the
//! degraded summary, behind a non-reentrant gate

use crate::error::DqfError;
use crate::fallback::generate_summary;
use crate::fill::{fill, FillOutput, FillReport};
use crate::registry::FieldRegistry;
use dqf_types::AnswerMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Which derivation path produced the document
#[derive(Debug, Clone)]
pub enum DocumentOutcome {
    /// Answers baked into the packet template
    Filled { bytes: Vec<u8>, report: FillReport },
    /// Template unavailable; summary listing of the answers
    Degraded { bytes: Vec<u8>, reason: String },
}

impl DocumentOutcome {
    pub fn bytes(&self) -> &[u8] {
        match self {
            DocumentOutcome::Filled { bytes, .. } | DocumentOutcome::Degraded { bytes, .. } => {
                bytes
            }
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            DocumentOutcome::Filled { bytes, .. } | DocumentOutcome::Degraded { bytes, .. } => {
                bytes
            }
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, DocumentOutcome::Degraded { .. })
    }
}

/// Produce the applicant's document from whatever the template source
/// returned.
///
/// A template that cannot be fetched, and any failure while filling it,
/// yields [`DocumentOutcome::Degraded`]. Other fetch errors are returned as is.
pub fn produce_document(
    template: Result<Vec<u8>, DqfError>,
    registry: &FieldRegistry,
    answers: &AnswerMap,
) -> Result<DocumentOutcome, DqfError> {
    let bytes = match template {
        Ok(bytes) => bytes,
        Err(e @ (DqfError::TemplateLoad(_) | DqfError::Io(_))) => {
            return degrade(registry, answers, e);
        }
        Err(e) => return Err(e),
    };
    outcome_of(fill(&bytes, registry, answers), registry, answers)
}

fn outcome_of(
    filled: Result<FillOutput, DqfError>,
    registry: &FieldRegistry,
    answers: &AnswerMap,
) -> Result<DocumentOutcome, DqfError> {
    match filled {
        Ok(FillOutput { bytes, report }) => Ok(DocumentOutcome::Filled { bytes, report }),
        Err(e) => degrade(registry, answers, e),
    }
}

fn degrade(
    registry: &FieldRegistry,
    answers: &AnswerMap,
    cause: DqfError,
) -> Result<DocumentOutcome, DqfError> {
    let reason = match cause {
        DqfError::TemplateLoad(reason) => reason,
        other => other.to_string(),
    };
    warn!(%reason, "Template fill failed, generating degraded summary");
    let bytes = generate_summary(registry, answers)?;
    Ok(DocumentOutcome::Degraded { bytes, reason })
}

/// Run [`produce_document`] on the blocking pool with a timeout.
///
/// `ticket` travels with the blocking task, so the gate stays closed until
/// the work itself ends, even after a timeout. A timeout produces no document.
#[cfg(feature = "server")]
pub async fn produce_document_async(
    template: Result<Vec<u8>, DqfError>,
    registry: Arc<FieldRegistry>,
    answers: AnswerMap,
    timeout_ms: u64,
    ticket: GenerationTicket,
) -> Result<DocumentOutcome, DqfError> {
    let result = tokio::time::timeout(
        std::time::Duration::from_millis(timeout_ms),
        tokio::task::spawn_blocking(move || {
            let _ticket = ticket;
            produce_document(template, &registry, &answers)
        }),
    )
    .await;

    match result {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_error)) => Err(DqfError::Generation(join_error.to_string())),
        Err(_timeout) => {
            warn!(timeout_ms, "Document generation timed out");
            Err(DqfError::Timeout(timeout_ms))
        }
    }
}

/// Single-flight guard for document generation.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct GenerationGate {
    busy: Arc<AtomicBool>,
}

impl GenerationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate, or `None` when a generation is already running
    pub fn try_begin(&self) -> Option<GenerationTicket> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GenerationTicket {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn begin(&self) -> Result<GenerationTicket, DqfError> {
        self.try_begin().ok_or(DqfError::GenerationInProgress)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the gate when dropped
#[derive(Debug)]
pub struct GenerationTicket {
    busy: Arc<AtomicBool>,
}

impl Drop for GenerationTicket {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
