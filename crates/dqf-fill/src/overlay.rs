//! Overlay model: positioned input widgets for the page being displayed
//!
//! Positions come from the same [`normalize`] call the fill engine uses, so
//! a widget sits exactly where its value will be drawn.

use crate::coords::{normalize, to_viewport, ViewportBox};
use crate::registry::FieldRegistry;
use dqf_types::{AnswerMap, FieldKind, PageDimensions};
use serde::Serialize;

/// Pre-filled widget content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum WidgetValue {
    Empty,
    Text(String),
    Checked(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Widget {
    pub id: String,
    pub kind: FieldKind,
    pub rect: ViewportBox,
    /// Font size in viewport pixels
    pub font_size: f64,
    pub lines: u8,
    pub required: bool,
    pub section: String,
    pub value: WidgetValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum OverlayView {
    /// Carrier-only page: no widgets, one way forward
    InternalNotice {
        page: u32,
        next_user_page: Option<u32>,
    },
    Widgets { page: u32, widgets: Vec<Widget> },
}

impl OverlayView {
    pub fn page(&self) -> u32 {
        match self {
            OverlayView::InternalNotice { page, .. } | OverlayView::Widgets { page, .. } => *page,
        }
    }

    pub fn widgets(&self) -> &[Widget] {
        match self {
            OverlayView::Widgets { widgets, .. } => widgets,
            OverlayView::InternalNotice { .. } => &[],
        }
    }
}

/// Describe the overlay for `page` of a `page_count`-page template, rendered
/// at `scale` viewport pixels per point
pub fn render_page(
    registry: &FieldRegistry,
    page: u32,
    page_count: u32,
    dims: PageDimensions,
    scale: f64,
    answers: &AnswerMap,
) -> OverlayView {
    if registry.is_internal_page(page) {
        return OverlayView::InternalNotice {
            page,
            next_user_page: registry.next_user_page(page, page_count),
        };
    }

    let widgets = registry
        .fields_on_page(page)
        .into_iter()
        .map(|field| {
            let abs = normalize(field, registry.space(), dims);
            let answer = answers.get(&field.id);
            let value = match (field.kind, answer) {
                (FieldKind::Checkbox, Some(v)) => WidgetValue::Checked(v.is_truthy()),
                (FieldKind::Checkbox, None) => WidgetValue::Checked(false),
                (_, Some(v)) => v
                    .as_display_text()
                    .map(WidgetValue::Text)
                    .unwrap_or(WidgetValue::Empty),
                (_, None) => WidgetValue::Empty,
            };
            Widget {
                id: field.id.clone(),
                kind: field.kind,
                rect: to_viewport(&abs, dims, scale),
                font_size: field.font_size * scale,
                lines: field.lines,
                required: field.required,
                section: field.section.clone(),
                value,
            }
        })
        .collect();

    OverlayView::Widgets { page, widgets }
}
