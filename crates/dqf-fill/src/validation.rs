//! Required-field check run before a document is generated

use crate::error::{MissingField, ValidationError};
use crate::registry::FieldRegistry;
use dqf_types::{AnswerMap, FieldKind};

/// Every required field on an applicant page that has no usable answer.
/// Required checkboxes must be checked.
pub fn validate_required(registry: &FieldRegistry, answers: &AnswerMap) -> Result<(), ValidationError> {
    let missing: Vec<MissingField> = registry
        .fields()
        .iter()
        .filter(|f| f.required && !registry.is_internal_page(f.page))
        .filter(|f| match answers.get(&f.id) {
            None => true,
            Some(v) if f.kind == FieldKind::Checkbox => !v.is_truthy(),
            Some(v) => v.is_blank(),
        })
        .map(|f| MissingField {
            id: f.id.clone(),
            page: f.page,
            section: f.section.clone(),
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { missing })
    }
}
