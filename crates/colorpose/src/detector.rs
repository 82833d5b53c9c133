use std::collections::BTreeMap;

use colorpose_image::{draw::draw_rect, ColorImage};

use crate::color::{ObjectColor, PixelRegion};
use crate::error::DetectorError;

/// Output of a color region detector for one image.
#[derive(Debug, Clone)]
pub struct Detections {
    /// Rectangles per color, in the detector's order.
    pub regions: BTreeMap<ObjectColor, Vec<PixelRegion>>,
    /// The input image annotated with the detections.
    pub debug_image: ColorImage,
}

impl Detections {
    /// Total number of rectangles over all colors.
    pub fn num_regions(&self) -> usize {
        self.regions.values().map(Vec::len).sum()
    }
}

/// Finds colored objects in an image.
pub trait ColorRegionDetector {
    /// Detect the regions of every supported color in `image`.
    fn detect(&mut self, image: &ColorImage) -> Result<Detections, DetectorError>;
}

/// A detector returning the same regions for every image.
///
/// The debug image is the input with each region outlined in its color.
#[derive(Debug, Clone, Default)]
pub struct StaticDetector {
    regions: BTreeMap<ObjectColor, Vec<PixelRegion>>,
}

impl StaticDetector {
    /// Create a detector from a flat list of regions, grouped by their color.
    pub fn from_regions(regions: impl IntoIterator<Item = PixelRegion>) -> Self {
        let mut grouped: BTreeMap<ObjectColor, Vec<PixelRegion>> = BTreeMap::new();
        for region in regions {
            grouped.entry(region.color).or_default().push(region);
        }
        Self { regions: grouped }
    }
}

impl ColorRegionDetector for StaticDetector {
    fn detect(&mut self, image: &ColorImage) -> Result<Detections, DetectorError> {
        let mut debug_image = image.clone();
        for region in self.regions.values().flatten() {
            draw_rect(
                &mut debug_image,
                region.top_left(),
                (region.width as i64, region.height as i64),
                region.color.rgb(),
                2,
            );
        }
        Ok(Detections {
            regions: self.regions.clone(),
            debug_image,
        })
    }
}
