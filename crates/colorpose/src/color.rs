use serde::{Deserialize, Serialize};

/// The colors the detector looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectColor {
    /// Green objects.
    Green,
    /// Blue objects.
    Blue,
    /// Red objects.
    Red,
    /// Yellow objects.
    Yellow,
}

impl ObjectColor {
    /// Lower-case name used in labels.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Red => "red",
            Self::Yellow => "yellow",
        }
    }

    /// The RGB value used to annotate regions of this color.
    pub fn rgb(&self) -> [u8; 3] {
        match self {
            Self::Green => [0, 255, 0],
            Self::Blue => [0, 0, 255],
            Self::Red => [255, 0, 0],
            Self::Yellow => [255, 255, 0],
        }
    }
}

impl std::fmt::Display for ObjectColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An axis-aligned rectangle in image pixel coordinates found for one color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRegion {
    /// Color the region was detected for.
    pub color: ObjectColor,
    /// Column of the top-left pixel.
    pub x: i32,
    /// Row of the top-left pixel.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl PixelRegion {
    /// Create a region from `[x, y, width, height]`.
    pub fn new(color: ObjectColor, [x, y, width, height]: [i32; 4]) -> Self {
        Self {
            color,
            x,
            y,
            width,
            height,
        }
    }

    /// The center pixel, `(x + w/2, y + h/2)` truncated towards zero.
    pub fn center_pixel(&self) -> (i64, i64) {
        let cx = self.x as f64 + self.width as f64 / 2.0;
        let cy = self.y as f64 + self.height as f64 / 2.0;
        (cx.trunc() as i64, cy.trunc() as i64)
    }

    /// The top-left pixel.
    pub fn top_left(&self) -> (i64, i64) {
        (self.x as i64, self.y as i64)
    }
}
