use glam::{Mat4, Vec3};

use crate::math::plane::Plane;

/// Camera or light-face culling volume.
///
/// Planes are in the order: left, right, bottom, top, near, far. Plane
/// normals point into the volume, so a positive signed distance means
/// "inside that plane's half-space".
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frustum {
    pub planes: [Plane; 6],
    // Per plane, the box corner lying farthest along the plane normal,
    // packed as one sign bit per axis (bit 0 = x, bit 1 = y, bit 2 = z).
    farthest_corner: [u8; 6],
}

impl Frustum {
    /// Extracts the six clipping planes from a projection-view matrix in
    /// OpenGL clip conventions (-w <= z <= w).
    pub fn from_projection_view(projection_view: Mat4) -> Frustum {
        let row0 = projection_view.row(0);
        let row1 = projection_view.row(1);
        let row2 = projection_view.row(2);
        let row3 = projection_view.row(3);

        let planes = [
            // Left
            row3 + row0,
            // Right
            row3 - row0,
            // Bottom
            row3 + row1,
            // Top
            row3 - row1,
            // Near
            row3 + row2,
            // Far
            row3 - row2,
        ]
        .map(|row| Plane::new(row.truncate(), row.w).normalized());

        let farthest_corner = planes.map(|plane| corner_selector(plane.normal));

        Frustum {
            planes,
            farthest_corner,
        }
    }

    /// Single-corner box test: per plane, only the corner farthest along the
    /// plane normal is evaluated. Over-inclusive — a box outside the volume
    /// near a frustum edge or corner can still be accepted, but a box
    /// intersecting the volume is never rejected.
    pub fn intersects_aabb_fast(&self, min: Vec3, max: Vec3) -> bool {
        for (plane, &selector) in self.planes.iter().zip(&self.farthest_corner) {
            let corner = select_corner(min, max, selector);
            if plane.signed_distance_to_point(corner) <= 0.0 {
                return false;
            }
        }
        true
    }

    /// Eight-corner box test: a box is rejected only if all eight corners
    /// are strictly outside the same plane. Same conservative direction as
    /// the fast test; kept for callers outside the per-frame path.
    pub fn intersects_aabb(&self, min: Vec3, max: Vec3) -> bool {
        let corners = [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(max.x, max.y, max.z),
        ];

        for plane in &self.planes {
            let all_outside = corners
                .iter()
                .all(|&corner| plane.signed_distance_to_point(corner) < 0.0);
            if all_outside {
                return false;
            }
        }
        true
    }

    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        for plane in &self.planes {
            if plane.signed_distance_to_point(center) + radius < 0.0 {
                return false;
            }
        }
        true
    }
}

fn corner_selector(normal: Vec3) -> u8 {
    (normal.x > 0.0) as u8 | ((normal.y > 0.0) as u8) << 1 | ((normal.z > 0.0) as u8) << 2
}

fn select_corner(min: Vec3, max: Vec3, selector: u8) -> Vec3 {
    Vec3::new(
        if selector & 1 != 0 { max.x } else { min.x },
        if selector & 2 != 0 { max.y } else { min.y },
        if selector & 4 != 0 { max.z } else { min.z },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // Camera at the origin looking down -Z, 90 degree vertical FOV, square
    // aspect, near 0.1, far 10. The frustum cross-section at depth d is the
    // square [-d, d] x [-d, d].
    fn test_frustum() -> Frustum {
        let projection = Mat4::perspective_rh_gl(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 10.0);
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        Frustum::from_projection_view(projection * view)
    }

    #[test]
    fn box_in_front_of_camera_is_visible() {
        let frustum = test_frustum();
        let min = Vec3::new(-1.0, -1.0, -5.0);
        let max = Vec3::new(1.0, 1.0, -3.0);
        assert!(frustum.intersects_aabb_fast(min, max));
        assert!(frustum.intersects_aabb(min, max));
    }

    #[test]
    fn box_beyond_far_plane_is_culled() {
        let frustum = test_frustum();
        let min = Vec3::new(-1.0, -1.0, -30.0);
        let max = Vec3::new(1.0, 1.0, -20.0);
        assert!(!frustum.intersects_aabb_fast(min, max));
        assert!(!frustum.intersects_aabb(min, max));
    }

    #[test]
    fn box_behind_camera_is_culled() {
        let frustum = test_frustum();
        assert!(!frustum.intersects_aabb_fast(Vec3::new(-1.0, -1.0, 2.0), Vec3::new(1.0, 1.0, 4.0)));
    }

    #[test]
    fn box_straddling_near_plane_is_visible() {
        let frustum = test_frustum();
        assert!(frustum.intersects_aabb_fast(
            Vec3::new(-0.05, -0.05, -0.2),
            Vec3::new(0.05, 0.05, 0.0)
        ));
    }

    #[test]
    fn fast_test_over_includes_near_frustum_corner() {
        let frustum = test_frustum();

        // This box sits past the left/far corner of the frustum: every part
        // of it inside the far plane is outside the left plane, so the box
        // misses the volume entirely, yet no single plane excludes all of
        // it and the per-plane tests accept it. This is the documented
        // over-inclusion direction; the box costs a wasted draw but nothing
        // visible is ever culled.
        let min = Vec3::new(-12.0, -0.5, -11.0);
        let max = Vec3::new(-10.5, 0.5, -9.0);
        assert!(frustum.intersects_aabb_fast(min, max));
        assert!(frustum.intersects_aabb(min, max));
    }

    #[test]
    fn fast_test_never_under_includes() {
        let frustum = test_frustum();

        // Boxes sampled on a grid through and around the visible volume:
        // anything the eight-corner test accepts, the fast test must accept
        // too.
        for x in -3..=3 {
            for z in 1..=9 {
                let center = Vec3::new(x as f32 * 2.0, 0.0, -(z as f32));
                let min = center - Vec3::splat(0.4);
                let max = center + Vec3::splat(0.4);
                if frustum.intersects_aabb(min, max) {
                    assert!(
                        frustum.intersects_aabb_fast(min, max),
                        "fast test culled a visible box at {center:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn sphere_tests() {
        let frustum = test_frustum();
        assert!(frustum.intersects_sphere(Vec3::new(0.0, 0.0, -5.0), 0.5));
        // Outside the left plane but overlapping it.
        assert!(frustum.intersects_sphere(Vec3::new(-5.5, 0.0, -5.0), 1.0));
        // Entirely outside.
        assert!(!frustum.intersects_sphere(Vec3::new(-8.0, 0.0, -5.0), 1.0));
        assert!(!frustum.intersects_sphere(Vec3::new(0.0, 0.0, -12.0), 1.0));
    }
}
