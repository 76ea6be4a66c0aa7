//! Degraded summary document, produced when the packet template is unavailable
//!
//! The summary is a plain text listing on Letter pages, not a facsimile of
//! the packet. It leads with a visible notice so nobody mistakes it for the
//! official form.

use crate::error::DqfError;
use crate::fill::format_date;
use crate::metrics::{truncate_to_width, StandardFont};
use crate::pdf;
use crate::registry::FieldRegistry;
use dqf_types::{AnswerMap, AnswerValue, FieldKind, PageDimensions};
use lopdf::content::Operation;
use std::collections::HashSet;
use tracing::info;

pub const DEGRADED_NOTICE: &str = "DEGRADED COPY";

/// Upper bound on summary length
pub const MAX_SUMMARY_PAGES: usize = 4;

const MARGIN: f64 = 54.0;
const TITLE_SIZE: f64 = 16.0;
const HEADING_SIZE: f64 = 11.0;
const BODY_SIZE: f64 = 9.0;
const LINE_SPACING: f64 = 1.4;
const INDENT: f64 = 12.0;

/// Identifying fields listed first, with their printed labels
const KEY_FIELDS: [(&str, &str); 8] = [
    ("firstName", "First name"),
    ("middleName", "Middle name"),
    ("lastName", "Last name"),
    ("dob", "Date of birth"),
    ("ssn", "SSN"),
    ("cdlNumber", "CDL number"),
    ("signature", "Signature"),
    ("signatureDate", "Date signed"),
];

struct Layout {
    pages: Vec<Vec<Operation>>,
    y: f64,
    dims: PageDimensions,
}

impl Layout {
    fn new(dims: PageDimensions) -> Self {
        Self {
            pages: vec![Vec::new()],
            y: dims.height - MARGIN,
            dims,
        }
    }

    /// Whether one more body line still leaves room for the overflow note
    fn has_room(&self) -> bool {
        self.pages.len() < MAX_SUMMARY_PAGES
            || self.y - 2.0 * BODY_SIZE * LINE_SPACING >= MARGIN
    }

    fn line(&mut self, size: f64, indent: f64, text: &str) {
        let advance = size * LINE_SPACING;
        if self.y - advance < MARGIN && self.pages.len() < MAX_SUMMARY_PAGES {
            self.pages.push(Vec::new());
            self.y = self.dims.height - MARGIN;
        }
        self.y -= advance;

        let max_width = self.dims.width - 2.0 * MARGIN - indent;
        let fitted = truncate_to_width(StandardFont::Helvetica, text, size, max_width);
        let operations = pdf::text_operations(
            StandardFont::Helvetica,
            size,
            MARGIN + indent,
            self.y,
            &fitted.text,
        );
        if let Some(page) = self.pages.last_mut() {
            page.extend(operations);
        }
    }

    fn gap(&mut self) {
        self.y -= BODY_SIZE * 0.6;
    }
}

fn display(kind: Option<FieldKind>, value: &AnswerValue) -> Option<String> {
    let text = value.as_display_text()?;
    if text.trim().is_empty() {
        return None;
    }
    match kind {
        Some(FieldKind::Date) => Some(format_date(&text)),
        Some(FieldKind::Checkbox) => Some(if value.is_truthy() { "Yes" } else { "No" }.to_string()),
        _ => Some(text),
    }
}

/// Build the degraded summary for `answers`.
///
/// Key identifying fields come first (blank ones are marked), then every
/// other non-blank answer under its section heading, in registry order.
/// Answers with no registry entry are listed last. Output is capped at
/// [`MAX_SUMMARY_PAGES`]; anything past the cap is counted in a closing note.
pub fn generate_summary(registry: &FieldRegistry, answers: &AnswerMap) -> Result<Vec<u8>, DqfError> {
    let dims = PageDimensions::letter();
    let mut layout = Layout::new(dims);

    layout.line(TITLE_SIZE, 0.0, DEGRADED_NOTICE);
    layout.line(
        BODY_SIZE,
        0.0,
        "The packet template could not be loaded. This summary lists the applicant's answers",
    );
    layout.line(
        BODY_SIZE,
        0.0,
        "and is not a substitute for the completed driver qualification packet.",
    );
    layout.gap();

    layout.line(HEADING_SIZE, 0.0, "Applicant");
    let mut listed: HashSet<&str> = HashSet::new();
    for (id, label) in KEY_FIELDS {
        listed.insert(id);
        let kind = registry.get(id).map(|f| f.kind);
        let value = answers
            .get(id)
            .and_then(|v| display(kind, v))
            .unwrap_or_else(|| "(not provided)".to_string());
        layout.line(BODY_SIZE, INDENT, &format!("{}: {}", label, value));
    }

    let mut rest: Vec<(&str, &str, String)> = Vec::new();
    for field in registry.fields() {
        if listed.contains(field.id.as_str()) {
            continue;
        }
        if let Some(text) = answers.get(&field.id).and_then(|v| display(Some(field.kind), v)) {
            rest.push((field.section.as_str(), field.id.as_str(), text));
        }
    }
    for (id, value) in answers {
        if listed.contains(id.as_str()) || registry.contains(id) {
            continue;
        }
        if let Some(text) = display(None, value) {
            rest.push(("Other", id.as_str(), text));
        }
    }

    let mut current_section: Option<&str> = None;
    let total = rest.len();
    for (written, (section, id, value)) in rest.iter().enumerate() {
        if !layout.has_room() {
            layout.line(
                BODY_SIZE,
                0.0,
                &format!("... {} more answer(s) omitted", total - written),
            );
            break;
        }
        if current_section != Some(*section) {
            layout.gap();
            let heading = if section.is_empty() { "Other" } else { *section };
            layout.line(HEADING_SIZE, 0.0, heading);
            current_section = Some(*section);
            if !layout.has_room() {
                layout.line(
                    BODY_SIZE,
                    0.0,
                    &format!("... {} more answer(s) omitted", total - written),
                );
                break;
            }
        }
        layout.line(BODY_SIZE, INDENT, &format!("{}: {}", id, value));
    }

    let page_count = layout.pages.len();
    let bytes = pdf::build_document(layout.pages, dims, &[StandardFont::Helvetica])?;
    info!(page_count, answers = answers.len(), "Generated degraded summary");
    Ok(bytes)
}
