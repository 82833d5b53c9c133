use serde::{Deserialize, Serialize};

use crate::color::{ObjectColor, PixelRegion};

/// What a detected rectangle represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectRole {
    /// The graspable box.
    Box,
    /// A holder the box can be placed into.
    Holder,
}

impl std::fmt::Display for ObjectRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Box => f.write_str("box"),
            Self::Holder => f.write_str("holder"),
        }
    }
}

/// The semantic label of a detected rectangle, rendered as `<color>_<role>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectLabel {
    /// Color of the object.
    pub color: ObjectColor,
    /// Role of the object.
    pub role: ObjectRole,
}

impl std::fmt::Display for ObjectLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.color, self.role)
    }
}

/// Label the rectangles found for one color.
///
/// The first rectangle is the box, every later one a holder. The detector's order
/// is preserved and no geometric check is made.
///
/// Example:
///
/// ```
/// use colorpose::{classify, ObjectColor, PixelRegion};
///
/// let regions = [
///     PixelRegion::new(ObjectColor::Red, [100, 100, 40, 40]),
///     PixelRegion::new(ObjectColor::Red, [150, 100, 30, 30]),
/// ];
/// let labels = classify(ObjectColor::Red, &regions)
///     .into_iter()
///     .map(|(label, _)| label.to_string())
///     .collect::<Vec<_>>();
/// assert_eq!(labels, ["red_box", "red_holder"]);
/// ```
pub fn classify(color: ObjectColor, regions: &[PixelRegion]) -> Vec<(ObjectLabel, &PixelRegion)> {
    regions
        .iter()
        .enumerate()
        .map(|(i, region)| {
            let role = if i == 0 {
                ObjectRole::Box
            } else {
                ObjectRole::Holder
            };
            (ObjectLabel { color, role }, region)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_order() {
        let regions = (0..4)
            .map(|i| PixelRegion::new(ObjectColor::Blue, [i * 10, 0, 5, 5]))
            .collect::<Vec<_>>();
        let labeled = classify(ObjectColor::Blue, &regions);
        assert_eq!(labeled.len(), 4);
        assert_eq!(labeled[0].0.role, ObjectRole::Box);
        assert!(labeled[1..].iter().all(|(l, _)| l.role == ObjectRole::Holder));
        assert_eq!(labeled[2].1.x, 20);
        assert_eq!(labeled[3].0.to_string(), "blue_holder");
    }

    #[test]
    fn test_classify_empty() {
        assert!(classify(ObjectColor::Green, &[]).is_empty());
    }
}
