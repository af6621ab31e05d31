use glam::{DMat4, DVec3, DVec4};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Plane {
    pub normal: DVec3,
    pub d: f64,
}

impl Plane {
    pub fn new(normal: DVec3, d: f64) -> Self {
        Self { normal, d }
    }

    fn from_coefficients(v: DVec4) -> Self {
        Self::new(v.truncate(), v.w)
    }

    pub fn normalize(self) -> Self {
        let l2 = self.normal.length_squared();
        if l2 <= 0.0 {
            return self;
        }
        let inv = 1.0 / l2.sqrt();
        Self {
            normal: self.normal * inv,
            d: self.d * inv,
        }
    }

    /// Signed distance; positive on the side the normal points to.
    pub fn distance(&self, p: DVec3) -> f64 {
        self.normal.dot(p) + self.d
    }
}

/// View frustum as 6 planes.
///
/// Convention:
/// - A point `p` is inside iff `plane.distance(p) >= 0` for all planes.
/// - Planes live in whatever space the source matrix maps from (world
///   space for a view-projection matrix).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frustum {
    pub left: Plane,
    pub right: Plane,
    pub bottom: Plane,
    pub top: Plane,
    pub near: Plane,
    pub far: Plane,
}

impl Frustum {
    /// Build a frustum from a view-projection matrix.
    ///
    /// Expects the OpenGL clip-space convention where visible points satisfy
    /// `-w <= x, y, z <= w`.
    pub fn from_view_projection(m: &DMat4) -> Self {
        let r0 = m.row(0);
        let r1 = m.row(1);
        let r2 = m.row(2);
        let r3 = m.row(3);

        Self {
            left: Plane::from_coefficients(r3 + r0).normalize(),
            right: Plane::from_coefficients(r3 - r0).normalize(),
            bottom: Plane::from_coefficients(r3 + r1).normalize(),
            top: Plane::from_coefficients(r3 - r1).normalize(),
            near: Plane::from_coefficients(r3 + r2).normalize(),
            far: Plane::from_coefficients(r3 - r2).normalize(),
        }
    }

    pub fn planes(&self) -> [Plane; 6] {
        [self.left, self.right, self.bottom, self.top, self.near, self.far]
    }

    pub fn contains(&self, p: DVec3) -> bool {
        self.planes().iter().all(|plane| plane.distance(p) >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{Frustum, Plane};
    use glam::{DMat4, DVec3};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn plane_normalize_keeps_distances_proportional() {
        let p = Plane::new(DVec3::new(0.0, 0.0, 2.0), 4.0).normalize();
        assert_close(p.normal.length(), 1.0, 1e-12);
        assert_close(p.distance(DVec3::new(0.0, 0.0, -1.0)), 1.0, 1e-12);

        let degenerate = Plane::new(DVec3::ZERO, 1.0);
        assert_eq!(degenerate.normalize(), degenerate);
    }

    #[test]
    fn orthographic_box_contains_its_interior() {
        let m = DMat4::orthographic_rh_gl(-1.0, 1.0, -1.0, 1.0, 0.0, 10.0);
        let f = Frustum::from_view_projection(&m);

        assert!(f.contains(DVec3::new(0.0, 0.0, -5.0)));
        assert!(f.contains(DVec3::new(0.99, -0.99, -9.9)));
        assert!(!f.contains(DVec3::new(1.5, 0.0, -5.0)));
        assert!(!f.contains(DVec3::new(0.0, 0.0, 1.0)));
        assert!(!f.contains(DVec3::new(0.0, 0.0, -11.0)));

        assert_close(f.left.distance(DVec3::new(-0.5, 0.0, -5.0)), 0.5, 1e-12);
    }

    #[test]
    fn perspective_frustum_widens_with_depth() {
        let proj = DMat4::perspective_rh_gl(90f64.to_radians(), 1.0, 1.0, 100.0);
        let view = DMat4::look_at_rh(DVec3::new(0.0, 0.0, 10.0), DVec3::ZERO, DVec3::Y);
        let f = Frustum::from_view_projection(&(proj * view));

        // 90 degree fov: half-width equals distance from the eye.
        assert!(f.contains(DVec3::new(9.0, 0.0, 0.0)));
        assert!(!f.contains(DVec3::new(11.0, 0.0, 0.0)));
        assert!(f.contains(DVec3::new(0.0, 0.0, 8.5)));
        assert!(!f.contains(DVec3::new(0.0, 0.0, 9.5)));
        assert!(!f.contains(DVec3::new(0.0, 0.0, 11.0)));
    }
}
