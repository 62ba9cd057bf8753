//! Order-preserving visibility filtering. Each collector appends the
//! surviving candidates to `out` in their input order, which keeps the
//! upstream geometry-key sort intact for the batch compiler.

use crate::math::frustum::Frustum;
use crate::render_item::RenderItem;

/// Appends candidates whose AABB passes the fast frustum test. Returns the
/// number of items appended.
pub fn collect_visible(
    candidates: &[RenderItem],
    frustum: &Frustum,
    out: &mut Vec<RenderItem>,
) -> u32 {
    let mut count = 0;
    for item in candidates {
        if frustum.intersects_aabb_fast(item.aabb_min, item.aabb_max) {
            out.push(*item);
            count += 1;
        }
    }
    count
}

/// Sphere variant for point-like candidates (decals): the cull volume is a
/// fixed-radius sphere at the item's translation.
pub fn collect_visible_spheres(
    candidates: &[RenderItem],
    frustum: &Frustum,
    radius: f32,
    out: &mut Vec<RenderItem>,
) -> u32 {
    let mut count = 0;
    for item in candidates {
        if frustum.intersects_sphere(item.translation(), radius) {
            out.push(*item);
            count += 1;
        }
    }
    count
}

/// Shadow-pass variant: only shadow-casting candidates are considered.
pub fn collect_shadow_casters(
    candidates: &[RenderItem],
    frustum: &Frustum,
    out: &mut Vec<RenderItem>,
) -> u32 {
    let mut count = 0;
    for item in candidates {
        if item.cast_shadow != 0 && frustum.intersects_aabb_fast(item.aabb_min, item.aabb_max) {
            out.push(*item);
            count += 1;
        }
    }
    count
}
