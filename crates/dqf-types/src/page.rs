use serde::{Deserialize, Serialize};

/// Visible area of a page in points: the MediaBox's lower-left corner and
/// its size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageDimensions {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub origin_x: f64,
    #[serde(default)]
    pub origin_y: f64,
}

impl PageDimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            origin_x: 0.0,
            origin_y: 0.0,
        }
    }

    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    pub fn a4() -> Self {
        Self::new(595.0, 842.0)
    }

    /// Move the lower-left corner, keeping the size
    pub fn with_origin(mut self, x: f64, y: f64) -> Self {
        self.origin_x = x;
        self.origin_y = y;
        self
    }

    /// Build from a MediaBox `[x1, y1, x2, y2]`. Corners may come in any order.
    pub fn from_media_box(media_box: [f64; 4]) -> Self {
        let [x1, y1, x2, y2] = media_box;
        Self::new((x2 - x1).abs(), (y2 - y1).abs()).with_origin(x1.min(x2), y1.min(y2))
    }

    /// `[x1, y1, x2, y2]` for writing back as a MediaBox
    pub fn media_box(&self) -> [f64; 4] {
        [
            self.origin_x,
            self.origin_y,
            self.origin_x + self.width,
            self.origin_y + self.height,
        ]
    }
}

impl Default for PageDimensions {
    fn default() -> Self {
        Self::letter()
    }
}
