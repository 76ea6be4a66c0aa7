use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DqfError {
    #[error("Failed to load template: {0}")]
    TemplateLoad(String),

    #[error("Field '{field}' targets page {page} but the template has {page_count} pages")]
    PageOutOfRange {
        field: String,
        page: u32,
        page_count: u32,
    },

    #[error("Failed to draw field '{field}': {reason}")]
    FieldDraw { field: String, reason: String },

    #[error("{0}")]
    Validation(ValidationError),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Invalid registry: {0}")]
    Registry(String),

    #[error("Draft persistence failed: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("A document is already being generated")]
    GenerationInProgress,

    #[error("Generation timeout after {0}ms")]
    Timeout(u64),

    #[error("Generation task failed: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for DqfError {
    fn from(e: serde_json::Error) -> Self {
        DqfError::Serialization(e.to_string())
    }
}

impl From<ValidationError> for DqfError {
    fn from(e: ValidationError) -> Self {
        DqfError::Validation(e)
    }
}

/// A required field left empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingField {
    pub id: String,
    pub page: u32,
    pub section: String,
}

/// Required fields that are empty at finalize time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub missing: Vec<MissingField>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} required field(s) missing:", self.missing.len())?;
        for field in &self.missing {
            write!(f, " {} (page {})", field.id, field.page)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
