use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Checkbox,
    Date,
    Signature,
}

impl FieldKind {
    /// Default box dimensions in points (width, height)
    pub fn default_dimensions(&self) -> (f64, f64) {
        match self {
            FieldKind::Text => (150.0, 14.0),
            FieldKind::Checkbox => (10.0, 10.0),
            FieldKind::Date => (80.0, 14.0),
            FieldKind::Signature => (200.0, 22.0),
        }
    }

    /// Default font size in points
    pub fn default_font_size(&self) -> f64 {
        match self {
            FieldKind::Text | FieldKind::Date => 9.0,
            FieldKind::Checkbox => 10.0,
            FieldKind::Signature => 14.0,
        }
    }

    /// Parse a field kind from its lowercase name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(FieldKind::Text),
            "checkbox" => Some(FieldKind::Checkbox),
            "date" => Some(FieldKind::Date),
            "signature" => Some(FieldKind::Signature),
            _ => None,
        }
    }

    pub fn is_textual(&self) -> bool {
        !matches!(self, FieldKind::Checkbox)
    }
}

/// Unit convention of a placement table.
///
/// A table commits to one space; converting between them is an explicit
/// step performed by the coordinate normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSpace {
    /// Absolute points, origin bottom-left. `(x, y)` is the box's bottom-left corner.
    #[default]
    PdfPoints,
    /// Percent of page width/height, origin top-left. `(x, y)` is the box's top-left corner.
    PagePercent,
}

/// One declared fillable location on the packet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: String,
    /// 1-indexed page number
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub kind: FieldKind,
    pub font_size: f64,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub section: String,
    /// Number of text lines the box holds
    #[serde(default = "default_lines")]
    pub lines: u8,
}

fn default_lines() -> u8 {
    1
}

impl FieldDefinition {
    /// Create a field with the kind's default box and font size
    pub fn new(id: impl Into<String>, kind: FieldKind, page: u32, x: f64, y: f64) -> Self {
        let (width, height) = kind.default_dimensions();
        Self {
            id: id.into(),
            page,
            x,
            y,
            width,
            height,
            kind,
            font_size: kind.default_font_size(),
            required: false,
            section: String::new(),
            lines: 1,
        }
    }

    pub fn text(id: impl Into<String>, page: u32, x: f64, y: f64, width: f64) -> Self {
        Self::new(id, FieldKind::Text, page, x, y).width(width)
    }

    pub fn checkbox(id: impl Into<String>, page: u32, x: f64, y: f64) -> Self {
        Self::new(id, FieldKind::Checkbox, page, x, y)
    }

    pub fn date(id: impl Into<String>, page: u32, x: f64, y: f64) -> Self {
        Self::new(id, FieldKind::Date, page, x, y)
    }

    pub fn signature(id: impl Into<String>, page: u32, x: f64, y: f64, width: f64) -> Self {
        Self::new(id, FieldKind::Signature, page, x, y).width(width)
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    /// Multi-line box; height grows to fit `lines` at the current font size
    pub fn lines(mut self, lines: u8) -> Self {
        self.lines = lines.max(1);
        let needed = self.font_size * 1.2 * f64::from(self.lines);
        if self.height < needed {
            self.height = needed;
        }
        self
    }
}
