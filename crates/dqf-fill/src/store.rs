//! Answer store and draft persistence
//!
//! The answer map lives in memory and is written out opportunistically as a
//! [`Draft`]. Persistence is best-effort: a draft that cannot be read on
//! resume is logged and the applicant starts from an empty form.

use crate::error::DqfError;
use chrono::{DateTime, Utc};
use dqf_types::{AnswerMap, AnswerValue};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Normalized owner identifier (the applicant's email, trimmed and lower-cased)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerKey(String);

impl OwnerKey {
    pub fn new(raw: &str) -> Result<Self, DqfError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(DqfError::Persistence("owner key is empty".to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// SHA-256 of the key, hex encoded. Used as a file name so addresses
    /// never reach the filesystem.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl std::fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted form of an in-progress packet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub answers: AnswerMap,
    pub current_page: u32,
    pub saved_at: DateTime<Utc>,
}

/// Owner-scoped draft persistence
pub trait DraftStore {
    fn load(&self, owner: &OwnerKey) -> Result<Option<Draft>, DqfError>;
    fn save(&self, owner: &OwnerKey, draft: &Draft) -> Result<(), DqfError>;
    fn clear(&self, owner: &OwnerKey) -> Result<(), DqfError>;
}

impl<T: DraftStore + ?Sized> DraftStore for &T {
    fn load(&self, owner: &OwnerKey) -> Result<Option<Draft>, DqfError> {
        (**self).load(owner)
    }

    fn save(&self, owner: &OwnerKey, draft: &Draft) -> Result<(), DqfError> {
        (**self).save(owner, draft)
    }

    fn clear(&self, owner: &OwnerKey) -> Result<(), DqfError> {
        (**self).clear(owner)
    }
}

/// In-process draft store. Drafts are kept serialized, as they would be on disk.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    drafts: Mutex<HashMap<OwnerKey, String>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.drafts.lock().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<OwnerKey, String>>, DqfError> {
        self.drafts
            .lock()
            .map_err(|_| DqfError::Persistence("draft store lock poisoned".to_string()))
    }
}

impl DraftStore for MemoryDraftStore {
    fn load(&self, owner: &OwnerKey) -> Result<Option<Draft>, DqfError> {
        match self.lock()?.get(owner) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, owner: &OwnerKey, draft: &Draft) -> Result<(), DqfError> {
        let json = serde_json::to_string(draft)?;
        self.lock()?.insert(owner.clone(), json);
        Ok(())
    }

    fn clear(&self, owner: &OwnerKey) -> Result<(), DqfError> {
        self.lock()?.remove(owner);
        Ok(())
    }
}

/// One JSON file per owner under a directory
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    dir: PathBuf,
}

impl FileDraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, owner: &OwnerKey) -> PathBuf {
        self.dir.join(format!("{}.json", owner.digest()))
    }
}

impl DraftStore for FileDraftStore {
    fn load(&self, owner: &OwnerKey) -> Result<Option<Draft>, DqfError> {
        let path = self.path_for(owner);
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DqfError::Persistence(format!("{}: {}", path.display(), e)));
            }
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn save(&self, owner: &OwnerKey, draft: &Draft) -> Result<(), DqfError> {
        let persistence = |e: std::io::Error| DqfError::Persistence(e.to_string());

        std::fs::create_dir_all(&self.dir).map_err(persistence)?;
        let path = self.path_for(owner);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(draft)?).map_err(persistence)?;
        std::fs::rename(&tmp, &path).map_err(persistence)?;
        Ok(())
    }

    fn clear(&self, owner: &OwnerKey) -> Result<(), DqfError> {
        match std::fs::remove_file(self.path_for(owner)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DqfError::Persistence(e.to_string())),
        }
    }
}

/// Current answers and the page the applicant is on
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerStore {
    answers: AnswerMap,
    current_page: u32,
}

impl Default for AnswerStore {
    fn default() -> Self {
        Self {
            answers: AnswerMap::new(),
            current_page: 1,
        }
    }
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a saved draft. A missing or unreadable draft gives an
    /// empty store on page 1.
    pub fn load_persisted<D: DraftStore + ?Sized>(drafts: &D, owner: &OwnerKey) -> Self {
        match drafts.load(owner) {
            Ok(Some(draft)) => {
                info!(
                    answers = draft.answers.len(),
                    page = draft.current_page,
                    saved_at = %draft.saved_at,
                    "Resumed draft"
                );
                Self {
                    answers: draft.answers,
                    current_page: draft.current_page.max(1),
                }
            }
            Ok(None) => {
                debug!("No saved draft");
                Self::default()
            }
            Err(e) => {
                warn!(error = %e, "Discarding unreadable draft");
                Self::default()
            }
        }
    }

    pub fn persist<D: DraftStore + ?Sized>(&self, drafts: &D, owner: &OwnerKey) -> Result<(), DqfError> {
        drafts.save(owner, &self.to_draft())
    }

    pub fn to_draft(&self) -> Draft {
        Draft {
            answers: self.answers.clone(),
            current_page: self.current_page,
            saved_at: Utc::now(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&AnswerValue> {
        self.answers.get(id)
    }

    /// Last write wins
    pub fn set(&mut self, id: impl Into<String>, value: impl Into<AnswerValue>) {
        self.answers.insert(id.into(), value.into());
    }

    pub fn remove(&mut self, id: &str) -> Option<AnswerValue> {
        self.answers.remove(id)
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    /// Owned copy for generation, detached from later edits
    pub fn snapshot(&self) -> AnswerMap {
        self.answers.clone()
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn set_current_page(&mut self, page: u32) {
        self.current_page = page.max(1);
    }
}
