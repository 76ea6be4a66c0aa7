//! Coordinate transformation between placement tables, the PDF page and the
//! on-screen overlay
//!
//! Placements come in two conventions: percent of page with a top-left
//! origin, and absolute points with a bottom-left origin. Everything that
//! draws or positions a widget goes through [`normalize`] so the overlay and
//! the baked PDF use the same scale factor.

use dqf_types::{CoordinateSpace, FieldDefinition, PageDimensions};
use serde::{Deserialize, Serialize};

/// Box in PDF points, origin bottom-left
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbsoluteBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl AbsoluteBox {
    pub fn top(&self) -> f64 {
        self.y + self.height
    }
}

/// Box in viewport pixels, origin top-left
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Resolve a placement to absolute points on the given page. Percent
/// placements are relative to the visible page, so they pick up the
/// MediaBox origin.
pub fn normalize(
    field: &FieldDefinition,
    space: CoordinateSpace,
    page: PageDimensions,
) -> AbsoluteBox {
    match space {
        CoordinateSpace::PdfPoints => AbsoluteBox {
            x: field.x,
            y: field.y,
            width: field.width,
            height: field.height,
        },
        CoordinateSpace::PagePercent => {
            let width = field.width / 100.0 * page.width;
            let height = field.height / 100.0 * page.height;
            let (x, top) = dom_to_pdf(field.x, field.y, 100.0, 100.0, page);
            AbsoluteBox {
                x,
                y: top - height,
                width,
                height,
            }
        }
    }
}

/// Express an absolute box in the given placement space
pub fn denormalize(
    abs: &AbsoluteBox,
    space: CoordinateSpace,
    page: PageDimensions,
) -> (f64, f64, f64, f64) {
    match space {
        CoordinateSpace::PdfPoints => (abs.x, abs.y, abs.width, abs.height),
        CoordinateSpace::PagePercent => {
            let (x, y) = pdf_to_dom(abs.x, abs.top(), 100.0, 100.0, page);
            (
                x,
                y,
                abs.width / page.width * 100.0,
                abs.height / page.height * 100.0,
            )
        }
    }
}

/// Position an absolute box on a viewport rendering the page at `scale`
/// (pixels per point). The viewport's top-left is the MediaBox's top-left.
pub fn to_viewport(abs: &AbsoluteBox, page: PageDimensions, scale: f64) -> ViewportBox {
    ViewportBox {
        left: (abs.x - page.origin_x) * scale,
        top: (page.origin_y + page.height - abs.top()) * scale,
        width: abs.width * scale,
        height: abs.height * scale,
    }
}

/// Inverse of [`to_viewport`]
pub fn from_viewport(vp: &ViewportBox, page: PageDimensions, scale: f64) -> AbsoluteBox {
    let width = vp.width / scale;
    let height = vp.height / scale;
    AbsoluteBox {
        x: page.origin_x + vp.left / scale,
        y: page.origin_y + page.height - vp.top / scale - height,
        width,
        height,
    }
}

/// Map a point in a top-left container of `container_width` x
/// `container_height` onto the page, bottom-left origin in points
pub fn dom_to_pdf(
    dom_x: f64,
    dom_y: f64,
    container_width: f64,
    container_height: f64,
    page: PageDimensions,
) -> (f64, f64) {
    let x = page.origin_x + dom_x / container_width * page.width;
    let y = page.origin_y + page.height - dom_y / container_height * page.height;
    (x, y)
}

/// Inverse of [`dom_to_pdf`]
pub fn pdf_to_dom(
    pdf_x: f64,
    pdf_y: f64,
    container_width: f64,
    container_height: f64,
    page: PageDimensions,
) -> (f64, f64) {
    let x = (pdf_x - page.origin_x) / page.width * container_width;
    let y = (page.origin_y + page.height - pdf_y) / page.height * container_height;
    (x, y)
}
