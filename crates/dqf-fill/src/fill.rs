//! Fill engine: bakes an answer map into a copy of the packet template

use crate::coords::{normalize, AbsoluteBox};
use crate::error::DqfError;
use crate::metrics::{truncate_to_width, wrap_lines, StandardFont, CHECK_GLYPH};
use crate::pdf::{self, FontCache};
use crate::registry::FieldRegistry;
use dqf_types::{AnswerMap, AnswerValue, FieldDefinition, FieldKind};
use lopdf::content::Operation;
use lopdf::{Document, ObjectId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Line height as a multiple of the font size for multi-line boxes
const LEADING: f64 = 1.2;

/// Cap height of the standard fonts, as a fraction of the font size
const CAP_HEIGHT: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawnField {
    pub id: String,
    pub page: u32,
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedField {
    pub id: String,
    pub page: u32,
    pub page_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFailure {
    pub id: String,
    pub page: u32,
    pub reason: String,
}

/// What happened to each answered field during a fill
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FillReport {
    pub page_count: u32,
    pub drawn: Vec<DrawnField>,
    pub skipped_out_of_range: Vec<SkippedField>,
    pub failed: Vec<FieldFailure>,
}

impl FillReport {
    /// Every answered field landed on the page
    pub fn is_clean(&self) -> bool {
        self.skipped_out_of_range.is_empty() && self.failed.is_empty()
    }

    pub fn truncated(&self) -> impl Iterator<Item = &DrawnField> {
        self.drawn.iter().filter(|f| f.truncated)
    }
}

#[derive(Debug, Clone)]
pub struct FillOutput {
    pub bytes: Vec<u8>,
    pub report: FillReport,
}

/// Baseline origin for a single line of text in `abs`, vertically centred
/// on the cap height
pub fn text_origin(abs: &AbsoluteBox, font_size: f64) -> (f64, f64) {
    let inset = ((abs.height - CAP_HEIGHT * font_size) / 2.0).max(0.0);
    (abs.x, abs.y + inset)
}

/// Render an ISO `YYYY-MM-DD` date as `MM/DD/YYYY`; anything else is drawn as typed
pub fn format_date(value: &str) -> String {
    chrono::NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map(|date| date.format("%m/%d/%Y").to_string())
        .unwrap_or_else(|_| value.to_string())
}

fn font_for(kind: FieldKind) -> StandardFont {
    match kind {
        FieldKind::Signature => StandardFont::TimesItalic,
        FieldKind::Checkbox => StandardFont::ZapfDingbats,
        FieldKind::Text | FieldKind::Date => StandardFont::Helvetica,
    }
}

struct Draw {
    operations: Vec<Operation>,
    font: StandardFont,
    truncated: bool,
}

#[derive(Default)]
struct PageDraws {
    operations: Vec<Operation>,
    fonts: BTreeSet<StandardFont>,
    fields: Vec<DrawnField>,
}

/// Drawing instructions for one field, or `None` when the value draws nothing
fn draw_field(
    field: &FieldDefinition,
    abs: &AbsoluteBox,
    value: &AnswerValue,
) -> Result<Option<Draw>, String> {
    let size = field.font_size;
    if !(size.is_finite() && size > 0.0) {
        return Err(format!("invalid font size {}", size));
    }
    if ![abs.x, abs.y, abs.width, abs.height]
        .iter()
        .all(|v| v.is_finite())
    {
        return Err("non-finite placement".to_string());
    }

    let font = font_for(field.kind);

    if field.kind == FieldKind::Checkbox {
        if !value.is_truthy() {
            return Ok(None);
        }
        return Ok(Some(Draw {
            operations: pdf::text_operations(
                font,
                size,
                abs.x,
                abs.y,
                &CHECK_GLYPH.to_string(),
            ),
            font,
            truncated: false,
        }));
    }

    let Some(text) = value.as_display_text() else {
        return Ok(None);
    };
    let text = if field.kind == FieldKind::Date {
        format_date(&text)
    } else {
        text
    };

    if field.lines > 1 {
        let lines = wrap_lines(font, &text, size, abs.width, usize::from(field.lines));
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let truncated = lines.join(" ") != normalized;

        let mut operations = Vec::new();
        let first_baseline = abs.top() - size;
        for (i, line) in lines.iter().enumerate() {
            let y = first_baseline - i as f64 * LEADING * size;
            operations.extend(pdf::text_operations(font, size, abs.x, y, line));
        }
        return Ok(Some(Draw {
            operations,
            font,
            truncated,
        }));
    }

    let fitted = truncate_to_width(font, &text, size, abs.width);
    let (x, y) = text_origin(abs, size);
    Ok(Some(Draw {
        operations: pdf::text_operations(font, size, x, y, &fitted.text),
        font,
        truncated: fitted.truncated,
    }))
}

fn write_page(
    doc: &mut Document,
    fonts: &mut FontCache,
    page_id: ObjectId,
    draws: PageDraws,
) -> Result<Vec<DrawnField>, (Vec<DrawnField>, DqfError)> {
    for font in &draws.fonts {
        if let Err(e) = pdf::install_font(doc, fonts, page_id, *font) {
            return Err((draws.fields, e));
        }
    }
    match pdf::append_content(doc, page_id, draws.operations) {
        Ok(()) => Ok(draws.fields),
        Err(e) => Err((draws.fields, e)),
    }
}

/// Fill the template with `answers`, placing each value per `registry`.
///
/// Only an unreadable template is an error. Fields on pages the template
/// does not have, and fields that fail to draw, are recorded in the report
/// and skipped. The input bytes are never modified.
pub fn fill(
    template: &[u8],
    registry: &FieldRegistry,
    answers: &AnswerMap,
) -> Result<FillOutput, DqfError> {
    let mut doc =
        Document::load_mem(template).map_err(|e| DqfError::TemplateLoad(e.to_string()))?;

    let pages = doc.get_pages();
    let page_count = pages.len() as u32;
    if page_count == 0 {
        return Err(DqfError::TemplateLoad("template has no pages".to_string()));
    }

    let mut report = FillReport {
        page_count,
        ..Default::default()
    };
    let mut by_page: BTreeMap<u32, PageDraws> = BTreeMap::new();

    for field in registry.fields() {
        let Some(value) = answers.get(&field.id) else {
            continue;
        };
        if value.is_blank() {
            continue;
        }

        let Some(&page_id) = pages.get(&field.page) else {
            let err = DqfError::PageOutOfRange {
                field: field.id.clone(),
                page: field.page,
                page_count,
            };
            debug!(%err, "Skipping field");
            report.skipped_out_of_range.push(SkippedField {
                id: field.id.clone(),
                page: field.page,
                page_count,
            });
            continue;
        };

        let dims = pdf::page_dimensions(&doc, page_id);
        let abs = normalize(field, registry.space(), dims);

        match draw_field(field, &abs, value) {
            Ok(Some(draw)) => {
                let entry = by_page.entry(field.page).or_default();
                entry.operations.extend(draw.operations);
                entry.fonts.insert(draw.font);
                entry.fields.push(DrawnField {
                    id: field.id.clone(),
                    page: field.page,
                    truncated: draw.truncated,
                });
            }
            Ok(None) => {}
            Err(reason) => {
                let err = DqfError::FieldDraw {
                    field: field.id.clone(),
                    reason: reason.clone(),
                };
                warn!(%err, page = field.page, "Skipping field");
                report.failed.push(FieldFailure {
                    id: field.id.clone(),
                    page: field.page,
                    reason,
                });
            }
        }
    }

    let mut fonts = FontCache::default();
    for (page, draws) in by_page {
        let Some(&page_id) = pages.get(&page) else {
            continue;
        };
        match write_page(&mut doc, &mut fonts, page_id, draws) {
            Ok(drawn) => report.drawn.extend(drawn),
            Err((fields, e)) => {
                warn!(page, error = %e, "Failed to write page overlay");
                report
                    .failed
                    .extend(fields.into_iter().map(|f| FieldFailure {
                        id: f.id,
                        page,
                        reason: e.to_string(),
                    }));
            }
        }
    }

    let bytes = pdf::save(&mut doc)?;

    info!(
        page_count,
        drawn = report.drawn.len(),
        skipped = report.skipped_out_of_range.len(),
        failed = report.failed.len(),
        "Filled template"
    );

    Ok(FillOutput { bytes, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ELLIPSIS;
    use dqf_types::{CoordinateSpace, PageDimensions};
    use pretty_assertions::assert_eq;

    fn template(pages: usize) -> Vec<u8> {
        pdf::build_document(vec![Vec::new(); pages], PageDimensions::letter(), &[]).unwrap()
    }

    fn registry(fields: Vec<FieldDefinition>) -> FieldRegistry {
        FieldRegistry::new(CoordinateSpace::PdfPoints, fields, []).unwrap()
    }

    /// (font resource, x, y, text) for every text show on a page
    fn shown_text(bytes: &[u8], page: u32) -> Vec<(String, f64, f64, String)> {
        let doc = Document::load_mem(bytes).unwrap();
        let page_id = doc.get_pages()[&page];
        pdf::page_text(&doc, page_id)
            .unwrap()
            .into_iter()
            .map(|run| (run.font, run.x, run.y, run.text))
            .collect()
    }

    #[test]
    fn test_text_drawn_at_normalized_origin() {
        let reg = registry(vec![FieldDefinition::text("firstName", 1, 72.0, 680.0, 130.0)]);
        let mut answers = AnswerMap::new();
        answers.insert("firstName".into(), "Jonathan".into());

        let output = fill(&template(2), &reg, &answers).unwrap();
        let shown = shown_text(&output.bytes, 1);
        assert_eq!(shown.len(), 1);
        let (font, x, y, text) = &shown[0];
        assert_eq!(font, "DqfHelv");
        assert_eq!(text, "Jonathan");

        let abs = normalize(&reg.fields()[0], CoordinateSpace::PdfPoints, PageDimensions::letter());
        let (ex, ey) = text_origin(&abs, 9.0);
        assert!((x - ex).abs() < 1e-3);
        assert!((y - ey).abs() < 1e-3);
        assert!(output.report.is_clean());
    }

    #[test]
    fn test_blank_and_missing_values_are_skipped() {
        let reg = registry(vec![
            FieldDefinition::text("a", 1, 72.0, 600.0, 100.0),
            FieldDefinition::text("b", 1, 72.0, 580.0, 100.0),
        ]);
        let mut answers = AnswerMap::new();
        answers.insert("a".into(), "   ".into());

        let output = fill(&template(1), &reg, &answers).unwrap();
        assert!(output.report.drawn.is_empty());
        assert!(shown_text(&output.bytes, 1).is_empty());
    }

    #[test]
    fn test_falsy_checkbox_draws_nothing() {
        let reg = registry(vec![
            FieldDefinition::checkbox("yes", 1, 400.0, 500.0),
            FieldDefinition::checkbox("no", 1, 440.0, 500.0),
            FieldDefinition::checkbox("off", 1, 480.0, 500.0),
        ]);
        let mut answers = AnswerMap::new();
        answers.insert("yes".into(), true.into());
        answers.insert("no".into(), false.into());
        answers.insert("off".into(), "off".into());

        let output = fill(&template(1), &reg, &answers).unwrap();
        let shown = shown_text(&output.bytes, 1);
        assert_eq!(shown, vec![("DqfZaDb".to_string(), 400.0, 500.0, "4".to_string())]);
    }

    #[test]
    fn test_overflowing_text_truncated_with_ellipsis() {
        let reg = registry(vec![FieldDefinition::text("street", 1, 72.0, 600.0, 60.0)]);
        let mut answers = AnswerMap::new();
        answers.insert("street".into(), "1234 Long Haul Boulevard, Suite 900".into());

        let output = fill(&template(1), &reg, &answers).unwrap();
        let shown = shown_text(&output.bytes, 1);
        assert!(shown[0].3.ends_with(ELLIPSIS));
        assert_eq!(output.report.truncated().count(), 1);
    }

    #[test]
    fn test_out_of_range_page_is_reported_not_fatal() {
        let reg = registry(vec![
            FieldDefinition::text("firstName", 1, 72.0, 680.0, 130.0),
            FieldDefinition::text("late", 30, 72.0, 680.0, 130.0),
        ]);
        let mut answers = AnswerMap::new();
        answers.insert("firstName".into(), "Ada".into());
        answers.insert("late".into(), "ignored".into());

        let output = fill(&template(25), &reg, &answers).unwrap();
        assert_eq!(output.report.page_count, 25);
        assert_eq!(
            output.report.skipped_out_of_range,
            vec![SkippedField {
                id: "late".into(),
                page: 30,
                page_count: 25
            }]
        );
        assert_eq!(output.report.drawn.len(), 1);
    }

    #[test]
    fn test_invalid_font_size_recorded_as_failure() {
        let reg = registry(vec![
            FieldDefinition::text("bad", 1, 72.0, 600.0, 100.0).font_size(0.0),
            FieldDefinition::text("good", 1, 72.0, 580.0, 100.0),
        ]);
        let mut answers = AnswerMap::new();
        answers.insert("bad".into(), "x".into());
        answers.insert("good".into(), "y".into());

        let output = fill(&template(1), &reg, &answers).unwrap();
        assert_eq!(output.report.failed.len(), 1);
        assert_eq!(output.report.failed[0].id, "bad");
        assert_eq!(output.report.drawn.len(), 1);
    }

    #[test]
    fn test_dates_and_signatures() {
        let reg = registry(vec![
            FieldDefinition::date("dob", 1, 72.0, 600.0),
            FieldDefinition::signature("signature", 1, 72.0, 500.0, 200.0),
        ]);
        let mut answers = AnswerMap::new();
        answers.insert("dob".into(), "1988-03-07".into());
        answers.insert("signature".into(), "Jonathan Reyes".into());

        let output = fill(&template(1), &reg, &answers).unwrap();
        let shown = shown_text(&output.bytes, 1);
        assert_eq!(shown[0].0, "DqfHelv");
        assert_eq!(shown[0].3, "03/07/1988");
        assert_eq!(shown[1].0, "DqfTiIt");
        assert_eq!(shown[1].3, "Jonathan Reyes");
    }

    #[test]
    fn test_format_date_passes_through_free_text() {
        assert_eq!(format_date("2024-12-31"), "12/31/2024");
        assert_eq!(format_date("12/31/2024"), "12/31/2024");
        assert_eq!(format_date("last spring"), "last spring");
    }

    #[test]
    fn test_multi_line_field_wraps() {
        let reg = registry(vec![
            FieldDefinition::text("explain", 1, 72.0, 400.0, 120.0).lines(3)
        ]);
        let mut answers = AnswerMap::new();
        answers.insert(
            "explain".into(),
            "Reckless driving citation in 2015, completed defensive driving course".into(),
        );

        let output = fill(&template(1), &reg, &answers).unwrap();
        let shown = shown_text(&output.bytes, 1);
        assert!(shown.len() > 1 && shown.len() <= 3);
        // Baselines descend from the top of the box
        for pair in shown.windows(2) {
            assert!(pair[1].2 < pair[0].2);
        }
    }

    #[test]
    fn test_unparseable_template() {
        let reg = registry(vec![]);
        let result = fill(b"not a pdf", &reg, &AnswerMap::new());
        assert!(matches!(result, Err(DqfError::TemplateLoad(_))));
    }

    #[test]
    fn test_fill_is_deterministic() {
        let reg = registry(vec![
            FieldDefinition::text("firstName", 1, 72.0, 680.0, 130.0),
            FieldDefinition::checkbox("felony_no", 2, 440.0, 460.0),
        ]);
        let mut answers = AnswerMap::new();
        answers.insert("firstName".into(), "Jonathan".into());
        answers.insert("felony_no".into(), true.into());

        let tpl = template(3);
        let first = fill(&tpl, &reg, &answers).unwrap();
        let second = fill(&tpl, &reg, &answers).unwrap();
        assert_eq!(first.bytes, second.bytes);
        assert_eq!(first.report, second.report);
    }
}
