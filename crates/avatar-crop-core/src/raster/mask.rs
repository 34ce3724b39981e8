//! Circular clip used to round the avatar.
//!
//! Coverage is computed analytically from the distance between the pixel
//! center and the circle center, giving a one-pixel antialiased edge.

/// A circle in output-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleClip {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
}

impl CircleClip {
    pub fn new(center_x: f64, center_y: f64, radius: f64) -> Self {
        Self {
            center_x,
            center_y,
            radius: radius.max(0.0),
        }
    }

    /// The largest circle inscribed in a `size` x `size` surface.
    pub fn inscribed(size: u32) -> Self {
        let half = size as f64 / 2.0;
        Self::new(half, half, half)
    }

    /// Fraction of pixel (px, py) covered by the circle, 0.0 to 1.0.
    ///
    /// Pixels whose center lies more than half a pixel inside the edge are
    /// fully covered; those more than half a pixel outside are excluded.
    #[inline]
    pub fn coverage(&self, px: u32, py: u32) -> f64 {
        let dx = px as f64 + 0.5 - self.center_x;
        let dy = py as f64 + 0.5 - self.center_y;
        let dist = (dx * dx + dy * dy).sqrt();
        (self.radius - dist + 0.5).clamp(0.0, 1.0)
    }

    /// Check if a pixel center is inside the circle boundary.
    pub fn contains(&self, px: u32, py: u32) -> bool {
        let dx = px as f64 + 0.5 - self.center_x;
        let dy = py as f64 + 0.5 - self.center_y;
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_fully_covered() {
        let clip = CircleClip::inscribed(256);
        assert_eq!(clip.coverage(128, 128), 1.0);
        assert_eq!(clip.coverage(127, 127), 1.0);
    }

    #[test]
    fn test_corners_excluded() {
        let clip = CircleClip::inscribed(256);
        assert_eq!(clip.coverage(0, 0), 0.0);
        assert_eq!(clip.coverage(255, 0), 0.0);
        assert_eq!(clip.coverage(0, 255), 0.0);
        assert_eq!(clip.coverage(255, 255), 0.0);
    }

    #[test]
    fn test_edge_is_partial() {
        let clip = CircleClip::new(10.0, 10.0, 5.3);
        // pixel center (15.5, 10.5) lies sqrt(30.5) from the center
        let expected = 5.3 - 30.5f64.sqrt() + 0.5;
        let c = clip.coverage(15, 10);
        assert!((c - expected).abs() < 1e-12, "edge coverage was {}", c);
        assert!((c - 0.2773).abs() < 1e-3);
    }

    #[test]
    fn test_coverage_monotonic_along_radius() {
        let clip = CircleClip::inscribed(64);
        let mut prev = 1.0;
        for x in 32..64 {
            let c = clip.coverage(x, 32);
            assert!(c <= prev, "coverage should not increase moving outward");
            prev = c;
        }
    }

    #[test]
    fn test_contains() {
        let clip = CircleClip::inscribed(10);
        assert!(clip.contains(5, 5));
        assert!(!clip.contains(0, 0));
    }

    #[test]
    fn test_negative_radius_clamped() {
        let clip = CircleClip::new(1.0, 1.0, -3.0);
        assert_eq!(clip.radius, 0.0);
        assert_eq!(clip.coverage(5, 5), 0.0);
    }
}
