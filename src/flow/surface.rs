use nalgebra::{Point2, Vector2};

/// Prescribed velocity on an immersed surface.
#[derive(Debug, Clone, Copy)]
pub enum SurfaceVelocity {
    /// Fixed wall, g = 0.
    Fixed,
    /// Rigid counterclockwise rotation about the circle center,
    /// g(x) = omega * (-(y - cy), x - cx).
    Rotation { omega: f64 },
}

/// An analytically described circular immersed surface with a
/// prescribed velocity. Pressure carries no datum on the surface.
#[derive(Debug, Clone)]
pub struct ImmersedCircle {
    pub center: Point2<f64>,
    pub radius: f64,
    pub velocity: SurfaceVelocity,
}

impl ImmersedCircle {
    pub fn fixed(center: Point2<f64>, radius: f64) -> Self {
        Self {
            center,
            radius,
            velocity: SurfaceVelocity::Fixed,
        }
    }

    pub fn rotating(center: Point2<f64>, radius: f64, omega: f64) -> Self {
        Self {
            center,
            radius,
            velocity: SurfaceVelocity::Rotation { omega },
        }
    }

    /// Whether a point lies inside the circle (boundary included), the
    /// cut-cell classification predicate.
    pub fn is_inside(&self, p: &Point2<f64>) -> bool {
        (p - self.center).norm() <= self.radius
    }

    /// Normal projection of `p` onto the surface, the distance to it,
    /// and the outward unit normal. A point at the center projects
    /// along a fixed arbitrary direction.
    pub fn project(&self, p: &Point2<f64>) -> (Point2<f64>, f64, Vector2<f64>) {
        let rel = p - self.center;
        let dist_to_center = rel.norm();
        let normal = if dist_to_center > 1e-14 {
            rel / dist_to_center
        } else {
            Vector2::x()
        };
        let projection = self.center + self.radius * normal;
        let distance = (p - projection).norm();
        (projection, distance, normal)
    }

    /// Prescribed velocity g at a point of the surface.
    pub fn boundary_velocity(&self, p: &Point2<f64>) -> Vector2<f64> {
        match self.velocity {
            SurfaceVelocity::Fixed => Vector2::zeros(),
            SurfaceVelocity::Rotation { omega } => {
                let rel = p - self.center;
                Vector2::new(-omega * rel.y, omega * rel.x)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_projection_geometry() {
        let circle = ImmersedCircle::fixed(Point2::new(1.0, 2.0), 0.5);
        let p = Point2::new(2.0, 2.0);
        let (proj, dist, normal) = circle.project(&p);
        assert_relative_eq!(proj.x, 1.5, epsilon = 1e-14);
        assert_relative_eq!(proj.y, 2.0, epsilon = 1e-14);
        assert_relative_eq!(dist, 0.5, epsilon = 1e-14);
        assert_relative_eq!(normal.x, 1.0, epsilon = 1e-14);
        assert_relative_eq!(normal.y, 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_projection_from_inside() {
        let circle = ImmersedCircle::fixed(Point2::origin(), 1.0);
        let (proj, dist, _) = circle.project(&Point2::new(0.6, 0.0));
        assert_relative_eq!(proj.x, 1.0, epsilon = 1e-14);
        assert_relative_eq!(dist, 0.4, epsilon = 1e-14);
    }

    #[test]
    fn test_rotation_velocity_is_tangential() {
        let circle = ImmersedCircle::rotating(Point2::origin(), 0.21, 1.0 / 0.21);
        let p = Point2::new(0.21, 0.0);
        let g = circle.boundary_velocity(&p);
        // surface speed omega * r = 1, pointing +y at theta = 0
        assert_relative_eq!(g.x, 0.0, epsilon = 1e-14);
        assert_relative_eq!(g.y, 1.0, epsilon = 1e-14);
        // tangential: orthogonal to the radial direction
        assert_relative_eq!(g.dot(&(p - circle.center)), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_inside_classification_includes_boundary() {
        let circle = ImmersedCircle::fixed(Point2::origin(), 0.5);
        assert!(circle.is_inside(&Point2::new(0.5, 0.0)));
        assert!(circle.is_inside(&Point2::new(0.1, -0.2)));
        assert!(!circle.is_inside(&Point2::new(0.501, 0.0)));
    }
}
