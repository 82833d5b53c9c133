use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

// fixed-point iterations used when a model has no closed form inverse
const MAX_ITERATIONS: usize = 20;
const CONVERGENCE_EPS: f64 = 1e-12;

/// A lens distortion model acting on normalized image coordinates.
///
/// Normalized coordinates are `((u - cx) / fx, (v - cy) / fy)` for a pixel `(u, v)`.
pub trait Distortion: std::fmt::Debug + Send + Sync {
    /// Short name of the model, as found in calibration messages.
    fn name(&self) -> &'static str;

    /// Map ideal (undistorted) normalized coordinates to distorted ones.
    fn distort(&self, x: f64, y: f64) -> (f64, f64);

    /// Map distorted normalized coordinates back to ideal ones.
    fn undistort(&self, x: f64, y: f64) -> (f64, f64);

    /// Whether the model leaves every point unchanged.
    fn is_identity(&self) -> bool;
}

/// Distortion tag carried by the camera calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistortionModel {
    /// No distortion.
    None,
    /// Brown-Conrady (`plumb_bob` in ROS) with coefficients k1, k2, p1, p2, k3.
    BrownConrady,
    /// Brown-Conrady with a rational radial term, coefficients k1, k2, p1, p2, k3, k4, k5, k6.
    RationalPolynomial,
    /// Brown-Conrady with coefficients describing the distorted to ideal mapping.
    InverseBrownConrady,
    /// Kannala-Brandt equidistant fisheye with coefficients k1..k4.
    KannalaBrandt,
}

impl FromStr for DistortionModel {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "plumb_bob" | "brown_conrady" => Ok(Self::BrownConrady),
            "rational_polynomial" => Ok(Self::RationalPolynomial),
            "inverse_brown_conrady" => Ok(Self::InverseBrownConrady),
            "equidistant" | "kannala_brandt" => Ok(Self::KannalaBrandt),
            other => Err(GeometryError::UnknownDistortionModel(other.to_string())),
        }
    }
}

impl DistortionModel {
    /// Build the distortion model from its coefficients.
    ///
    /// Missing coefficients are taken as zero, extra coefficients are ignored.
    pub fn build(&self, coeffs: &[f64]) -> Arc<dyn Distortion> {
        let c = |i: usize| coeffs.get(i).copied().unwrap_or(0.0);
        match self {
            Self::None => Arc::new(NoDistortion),
            Self::BrownConrady => Arc::new(BrownConrady {
                k1: c(0),
                k2: c(1),
                p1: c(2),
                p2: c(3),
                k3: c(4),
            }),
            Self::RationalPolynomial => Arc::new(RationalPolynomial {
                k1: c(0),
                k2: c(1),
                p1: c(2),
                p2: c(3),
                k3: c(4),
                k4: c(5),
                k5: c(6),
                k6: c(7),
            }),
            Self::InverseBrownConrady => Arc::new(InverseBrownConrady(BrownConrady {
                k1: c(0),
                k2: c(1),
                p1: c(2),
                p2: c(3),
                k3: c(4),
            })),
            Self::KannalaBrandt => Arc::new(KannalaBrandt {
                k1: c(0),
                k2: c(1),
                k3: c(2),
                k4: c(3),
            }),
        }
    }
}

/// The identity distortion.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDistortion;

impl Distortion for NoDistortion {
    fn name(&self) -> &'static str {
        "none"
    }

    fn distort(&self, x: f64, y: f64) -> (f64, f64) {
        (x, y)
    }

    fn undistort(&self, x: f64, y: f64) -> (f64, f64) {
        (x, y)
    }

    fn is_identity(&self) -> bool {
        true
    }
}

/// Radial and tangential Brown-Conrady distortion
///
/// # Fields
///
/// * `k1`, `k2`, `k3` - The radial distortion coefficients
/// * `p1`, `p2` - The tangential distortion coefficients
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BrownConrady {
    /// The first radial distortion coefficient
    pub k1: f64,
    /// The second radial distortion coefficient
    pub k2: f64,
    /// The first tangential distortion coefficient
    pub p1: f64,
    /// The second tangential distortion coefficient
    pub p2: f64,
    /// The third radial distortion coefficient
    pub k3: f64,
}

impl BrownConrady {
    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let r2 = x * x + y * y;
        let radial = 1.0 + r2 * (self.k1 + r2 * (self.k2 + r2 * self.k3));
        let dx = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let dy = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
        (x * radial + dx, y * radial + dy)
    }

    fn invert(&self, xd: f64, yd: f64) -> (f64, f64) {
        let (mut x, mut y) = (xd, yd);
        for _ in 0..MAX_ITERATIONS {
            let r2 = x * x + y * y;
            let radial = 1.0 + r2 * (self.k1 + r2 * (self.k2 + r2 * self.k3));
            let dx = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
            let dy = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
            let (nx, ny) = ((xd - dx) / radial, (yd - dy) / radial);
            let step = (nx - x).abs() + (ny - y).abs();
            (x, y) = (nx, ny);
            if step < CONVERGENCE_EPS {
                break;
            }
        }
        (x, y)
    }

    fn is_zero(&self) -> bool {
        [self.k1, self.k2, self.p1, self.p2, self.k3]
            .iter()
            .all(|c| *c == 0.0)
    }
}

impl Distortion for BrownConrady {
    fn name(&self) -> &'static str {
        "brown_conrady"
    }

    fn distort(&self, x: f64, y: f64) -> (f64, f64) {
        self.apply(x, y)
    }

    fn undistort(&self, x: f64, y: f64) -> (f64, f64) {
        self.invert(x, y)
    }

    fn is_identity(&self) -> bool {
        self.is_zero()
    }
}

/// Brown-Conrady distortion with a rational radial factor
///
/// The radial factor is `(1 + k1 r² + k2 r⁴ + k3 r⁶) / (1 + k4 r² + k5 r⁴ + k6 r⁶)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RationalPolynomial {
    /// First numerator coefficient
    pub k1: f64,
    /// Second numerator coefficient
    pub k2: f64,
    /// First tangential coefficient
    pub p1: f64,
    /// Second tangential coefficient
    pub p2: f64,
    /// Third numerator coefficient
    pub k3: f64,
    /// First denominator coefficient
    pub k4: f64,
    /// Second denominator coefficient
    pub k5: f64,
    /// Third denominator coefficient
    pub k6: f64,
}

impl RationalPolynomial {
    fn radial(&self, r2: f64) -> f64 {
        let num = 1.0 + r2 * (self.k1 + r2 * (self.k2 + r2 * self.k3));
        let den = 1.0 + r2 * (self.k4 + r2 * (self.k5 + r2 * self.k6));
        num / den
    }

    fn tangential(&self, x: f64, y: f64, r2: f64) -> (f64, f64) {
        (
            2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x),
            self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y,
        )
    }
}

impl Distortion for RationalPolynomial {
    fn name(&self) -> &'static str {
        "rational_polynomial"
    }

    fn distort(&self, x: f64, y: f64) -> (f64, f64) {
        let r2 = x * x + y * y;
        let radial = self.radial(r2);
        let (dx, dy) = self.tangential(x, y, r2);
        (x * radial + dx, y * radial + dy)
    }

    fn undistort(&self, xd: f64, yd: f64) -> (f64, f64) {
        let (mut x, mut y) = (xd, yd);
        for _ in 0..MAX_ITERATIONS {
            let r2 = x * x + y * y;
            let radial = self.radial(r2);
            if !radial.is_finite() || radial.abs() < f64::EPSILON {
                break;
            }
            let (dx, dy) = self.tangential(x, y, r2);
            let (nx, ny) = ((xd - dx) / radial, (yd - dy) / radial);
            let step = (nx - x).abs() + (ny - y).abs();
            (x, y) = (nx, ny);
            if step < CONVERGENCE_EPS {
                break;
            }
        }
        (x, y)
    }

    fn is_identity(&self) -> bool {
        [
            self.k1, self.k2, self.p1, self.p2, self.k3, self.k4, self.k5, self.k6,
        ]
        .iter()
        .all(|c| *c == 0.0)
    }
}

/// Brown-Conrady whose coefficients map distorted coordinates to ideal ones.
///
/// Undistortion is closed form, distortion is solved iteratively.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InverseBrownConrady(pub BrownConrady);

impl Distortion for InverseBrownConrady {
    fn name(&self) -> &'static str {
        "inverse_brown_conrady"
    }

    fn distort(&self, x: f64, y: f64) -> (f64, f64) {
        self.0.invert(x, y)
    }

    fn undistort(&self, x: f64, y: f64) -> (f64, f64) {
        self.0.apply(x, y)
    }

    fn is_identity(&self) -> bool {
        self.0.is_zero()
    }
}

/// Kannala-Brandt equidistant fisheye model.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KannalaBrandt {
    /// First polynomial coefficient
    pub k1: f64,
    /// Second polynomial coefficient
    pub k2: f64,
    /// Third polynomial coefficient
    pub k3: f64,
    /// Fourth polynomial coefficient
    pub k4: f64,
}

impl KannalaBrandt {
    fn theta_d(&self, theta: f64) -> f64 {
        let t2 = theta * theta;
        theta * (1.0 + t2 * (self.k1 + t2 * (self.k2 + t2 * (self.k3 + t2 * self.k4))))
    }

    fn theta_d_derivative(&self, theta: f64) -> f64 {
        let t2 = theta * theta;
        1.0 + t2 * (3.0 * self.k1 + t2 * (5.0 * self.k2 + t2 * (7.0 * self.k3 + t2 * 9.0 * self.k4)))
    }
}

impl Distortion for KannalaBrandt {
    fn name(&self) -> &'static str {
        "kannala_brandt"
    }

    fn distort(&self, x: f64, y: f64) -> (f64, f64) {
        let r = (x * x + y * y).sqrt();
        if r < f64::EPSILON {
            return (x, y);
        }
        let scale = self.theta_d(r.atan()) / r;
        (x * scale, y * scale)
    }

    fn undistort(&self, x: f64, y: f64) -> (f64, f64) {
        let theta_d = (x * x + y * y).sqrt();
        if theta_d < f64::EPSILON {
            return (x, y);
        }

        // newton iterations on theta_d(theta) = theta_d
        let mut theta = theta_d;
        for _ in 0..MAX_ITERATIONS {
            let derivative = self.theta_d_derivative(theta);
            if derivative.abs() < f64::EPSILON {
                break;
            }
            let step = (self.theta_d(theta) - theta_d) / derivative;
            theta -= step;
            if step.abs() < CONVERGENCE_EPS {
                break;
            }
        }

        let scale = theta.tan() / theta_d;
        (x * scale, y * scale)
    }

    fn is_identity(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn check_roundtrip(model: &dyn Distortion, points: &[(f64, f64)]) {
        for &(x, y) in points {
            let (xd, yd) = model.distort(x, y);
            let (xu, yu) = model.undistort(xd, yd);
            assert_relative_eq!(xu, x, epsilon = 1e-9);
            assert_relative_eq!(yu, y, epsilon = 1e-9);
        }
    }

    const POINTS: [(f64, f64); 5] = [(0.0, 0.0), (0.1, -0.2), (-0.3, 0.25), (0.4, 0.35), (-0.5, -0.4)];

    #[test]
    fn test_model_from_str() -> Result<(), GeometryError> {
        assert_eq!("plumb_bob".parse::<DistortionModel>()?, DistortionModel::BrownConrady);
        assert_eq!(
            "rational_polynomial".parse::<DistortionModel>()?,
            DistortionModel::RationalPolynomial
        );
        assert_eq!("".parse::<DistortionModel>()?, DistortionModel::None);
        assert_eq!(
            "Equidistant".parse::<DistortionModel>()?,
            DistortionModel::KannalaBrandt
        );
        assert_eq!(
            "fov".parse::<DistortionModel>(),
            Err(GeometryError::UnknownDistortionModel("fov".to_string()))
        );
        Ok(())
    }

    #[test]
    fn test_brown_conrady_roundtrip() {
        let model = DistortionModel::BrownConrady.build(&[0.1, -0.05, 0.001, -0.0008, 0.01]);
        assert!(!model.is_identity());
        check_roundtrip(model.as_ref(), &POINTS);
    }

    #[test]
    fn test_rational_polynomial_roundtrip() {
        let model = DistortionModel::RationalPolynomial
            .build(&[0.12, -0.04, 0.001, -0.0006, 0.008, 0.05, -0.01, 0.002]);
        assert_eq!(model.name(), "rational_polynomial");
        assert!(!model.is_identity());
        check_roundtrip(model.as_ref(), &POINTS);
    }

    #[test]
    fn test_rational_polynomial_uses_denominator() {
        let model = RationalPolynomial {
            k1: 0.1,
            k4: 0.1,
            ..Default::default()
        };
        // equal numerator and denominator cancel out
        let (x, y) = model.distort(0.5, 0.0);
        assert_relative_eq!(x, 0.5);
        assert_relative_eq!(y, 0.0);

        let model = RationalPolynomial {
            k4: 0.1,
            ..Default::default()
        };
        // r2 = 0.25, radial = 1 / 1.025
        let (x, _) = model.distort(0.5, 0.0);
        assert_relative_eq!(x, 0.5 / 1.025);

        // k4..k6 change the result compared to the five coefficient model
        let coeffs = [0.1, -0.05, 0.0, 0.0, 0.01, 0.2, 0.0, 0.0];
        let rational = DistortionModel::RationalPolynomial.build(&coeffs).distort(0.4, 0.3);
        let plumb_bob = DistortionModel::BrownConrady.build(&coeffs).distort(0.4, 0.3);
        assert!((rational.0 - plumb_bob.0).abs() > 1e-3);
    }

    #[test]
    fn test_inverse_brown_conrady_roundtrip() {
        let model = DistortionModel::InverseBrownConrady.build(&[-0.08, 0.02, 0.0005, 0.0002, 0.0]);
        check_roundtrip(model.as_ref(), &POINTS);
    }

    #[test]
    fn test_kannala_brandt_roundtrip() {
        let model = DistortionModel::KannalaBrandt.build(&[0.05, -0.01, 0.002, -0.0005]);
        check_roundtrip(model.as_ref(), &POINTS);
    }

    #[test]
    fn test_zero_coefficients_are_identity() {
        let model = DistortionModel::BrownConrady.build(&[0.0; 5]);
        assert!(model.is_identity());
        let (x, y) = model.undistort(0.3, -0.1);
        assert_eq!((x, y), (0.3, -0.1));
    }

    #[test]
    fn test_brown_conrady_known_value() {
        let model = BrownConrady {
            k1: 0.1,
            ..Default::default()
        };
        // r2 = 0.25, radial = 1.025
        let (x, y) = model.distort(0.5, 0.0);
        assert_relative_eq!(x, 0.5125);
        assert_relative_eq!(y, 0.0);
    }
}
