//! Where template bytes come from

use crate::error::DqfError;
use std::path::{Path, PathBuf};

/// Source of the blank packet template.
///
/// Every failure to obtain bytes is reported as [`DqfError::TemplateLoad`],
/// which is what routes document generation to the degraded summary.
pub trait TemplateSource {
    fn fetch(&self) -> Result<Vec<u8>, DqfError>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}

/// Template read from disk on every fetch
#[derive(Debug, Clone)]
pub struct FileTemplate {
    path: PathBuf,
}

impl FileTemplate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TemplateSource for FileTemplate {
    fn fetch(&self) -> Result<Vec<u8>, DqfError> {
        std::fs::read(&self.path)
            .map_err(|e| DqfError::TemplateLoad(format!("{}: {}", self.path.display(), e)))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Template already held in memory
#[derive(Debug, Clone)]
pub struct BytesTemplate {
    bytes: Vec<u8>,
}

impl BytesTemplate {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl TemplateSource for BytesTemplate {
    fn fetch(&self) -> Result<Vec<u8>, DqfError> {
        if self.bytes.is_empty() {
            return Err(DqfError::TemplateLoad("template is empty".to_string()));
        }
        Ok(self.bytes.clone())
    }

    fn describe(&self) -> String {
        format!("<{} bytes in memory>", self.bytes.len())
    }
}
