//! Recursive Gaussian filter coefficients.
//!
//! Fourth-order Deriche approximation split into a causal pair
//! (`a0`, `a1`) and an anti-causal pair (`a2`, `a3`) sharing the feedback
//! taps `b1`, `b2`. The two corner constants are the steady-state gains of
//! each direction; seeding a line with `edge * corner` behaves as if the
//! edge pixel were repeated forever outside the image.

/// Smallest radius the blur runs with; smaller positive radii are raised to it.
pub const MIN_RADIUS: f32 = 0.5;

const RADIUS_SCALE: f64 = 1.6939718862199047;

/// Coefficients of the recursive Gaussian, stored as `f32`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianCoefficients {
    pub a0: f32,
    pub a1: f32,
    pub a2: f32,
    pub a3: f32,
    pub b1: f32,
    pub b2: f32,
    pub left_corner: f32,
    pub right_corner: f32,
}

impl GaussianCoefficients {
    /// Build coefficients for `radius`.
    ///
    /// Intermediates are `f64` and only the results are narrowed; computing
    /// in `f32` makes small radii unstable.
    pub fn new(radius: f32) -> Self {
        let a = RADIUS_SCALE / radius as f64;
        let g1 = (-a).exp();
        let g2 = (-2.0 * a).exp();
        let k = (1.0 - g1) * (1.0 - g1) / (1.0 + 2.0 * a * g1 - g2);

        let a0 = k;
        let a1 = k * (a - 1.0) * g1;
        let a2 = k * (a + 1.0) * g1;
        let a3 = -k * g2;
        let b1 = 2.0 * g1;
        let b2 = -g2;
        let left_corner = (a0 + a1) / (1.0 - b1 - b2);
        let right_corner = (a2 + a3) / (1.0 - b1 - b2);

        Self {
            a0: a0 as f32,
            a1: a1 as f32,
            a2: a2 as f32,
            a3: a3 as f32,
            b1: b1 as f32,
            b2: b2 as f32,
            left_corner: left_corner as f32,
            right_corner: right_corner as f32,
        }
    }

    /// Coefficients for a blur of `radius`, or `None` when the blur is a no-op.
    ///
    /// Zero, negative and NaN radii mean "do not blur"; positive radii below
    /// [`MIN_RADIUS`] are raised to it.
    pub fn for_blur(radius: f32) -> Option<Self> {
        if !(radius > 0.0) {
            return None;
        }
        let radius = if radius < MIN_RADIUS {
            log::trace!("blur radius {radius} clamped to {MIN_RADIUS}");
            MIN_RADIUS
        } else {
            radius
        };
        Some(Self::new(radius))
    }

    /// Flat layout `[a0, a1, a2, a3, b1, b2, left_corner, right_corner]`.
    pub fn to_array(&self) -> [f32; 8] {
        [
            self.a0,
            self.a1,
            self.a2,
            self.a3,
            self.b1,
            self.b2,
            self.left_corner,
            self.right_corner,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn test_corners_match_closed_form() {
        // radius 2: a = 0.846985943..., checked against the closed form
        let c = GaussianCoefficients::new(2.0);
        let a = 1.6939718862199047_f64 / 2.0;
        let g1 = (-a).exp();
        let g2 = (-2.0 * a).exp();
        let k = (1.0 - g1) * (1.0 - g1) / (1.0 + 2.0 * a * g1 - g2);
        let denom = 1.0 - 2.0 * g1 + g2;
        let left = (k + k * (a - 1.0) * g1) / denom;
        let right = (k * (a + 1.0) * g1 - k * g2) / denom;
        assert!(close(c.left_corner as f64, left, 1e-6));
        assert!(close(c.right_corner as f64, right, 1e-6));
        assert!(close(c.b1 as f64, 2.0 * g1, 1e-6));
        assert!(close(c.b2 as f64, -g2, 1e-6));
    }

    #[test]
    fn test_unit_dc_gain() {
        for radius in [0.5_f32, 0.6, 1.0, 2.0, 5.0, 20.0] {
            let c = GaussianCoefficients::new(radius);
            let gain = c.left_corner as f64 + c.right_corner as f64;
            assert!(close(gain, 1.0, 1e-5), "radius {radius}: gain {gain}");
            let sum = c.a0 as f64 + c.a1 as f64 + c.a2 as f64 + c.a3 as f64;
            let feedback = 1.0 - c.b1 as f64 - c.b2 as f64;
            assert!(close(sum, feedback, 1e-5), "radius {radius}");
        }
    }

    #[test]
    fn test_wider_radius_keeps_more_history() {
        let narrow = GaussianCoefficients::new(1.0);
        let wide = GaussianCoefficients::new(10.0);
        assert!(wide.b1 > narrow.b1);
        assert!(wide.a0 < narrow.a0);
    }

    #[test]
    fn test_for_blur_policy() {
        assert!(GaussianCoefficients::for_blur(0.0).is_none());
        assert!(GaussianCoefficients::for_blur(-1.0).is_none());
        assert!(GaussianCoefficients::for_blur(f32::NAN).is_none());
        assert_eq!(
            GaussianCoefficients::for_blur(0.1),
            Some(GaussianCoefficients::new(0.5))
        );
        assert_eq!(
            GaussianCoefficients::for_blur(3.0),
            Some(GaussianCoefficients::new(3.0))
        );
    }

    #[test]
    fn test_to_array_order() {
        let c = GaussianCoefficients::new(1.5);
        let arr = c.to_array();
        assert_eq!(arr[0], c.a0);
        assert_eq!(arr[4], c.b1);
        assert_eq!(arr[7], c.right_corner);
    }
}
