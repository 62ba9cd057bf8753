use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::geometry::{GeometryKey, GeometryRegistry};

/// One drawable instance, laid out for direct upload as GPU instance data.
/// This should match the same structure defined in the shaders.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct RenderItem {
    pub model_matrix: Mat4,
    pub inverse_model_matrix: Mat4,

    pub geometry: GeometryKey,
    pub base_color_texture_index: u32,
    pub normal_texture_index: u32,
    pub rma_texture_index: u32,
    pub cast_shadow: u32,
    pub use_emissive_mask: u32,

    pub emissive_color: Vec3,
    // Both corners zero means "no AABB yet"; see fill_absent_aabbs.
    pub aabb_min: Vec3,
    pub aabb_max: Vec3,

    _padding: f32,
}

impl RenderItem {
    pub fn new(model_matrix: Mat4, geometry: GeometryKey) -> RenderItem {
        RenderItem {
            model_matrix,
            inverse_model_matrix: model_matrix.inverse(),
            geometry,
            base_color_texture_index: 0,
            normal_texture_index: 0,
            rma_texture_index: 0,
            cast_shadow: 1,
            use_emissive_mask: 0,
            emissive_color: Vec3::ZERO,
            aabb_min: Vec3::ZERO,
            aabb_max: Vec3::ZERO,
            _padding: 0.0,
        }
    }

    pub fn translation(&self) -> Vec3 {
        self.model_matrix.w_axis.truncate()
    }

    pub fn has_absent_aabb(&self) -> bool {
        self.aabb_min == Vec3::ZERO && self.aabb_max == Vec3::ZERO
    }
}

/// The one upstream sort that establishes geometry-key locality. Stable, so
/// items sharing a key keep their submission order.
pub fn sort_by_geometry(items: &mut [RenderItem]) {
    items.sort_by_key(|item| item.geometry);
}

/// Computes world AABBs for items submitted without one (both corners zero)
/// by transforming the mesh-local bounds with the item's model matrix.
/// Items with unresolvable keys are left untouched; the assembler drops
/// them later.
pub fn fill_absent_aabbs(items: &mut [RenderItem], registry: &GeometryRegistry) {
    for item in items.iter_mut() {
        if !item.has_absent_aabb() {
            continue;
        }
        if let Some(range) = registry.resolve(item.geometry) {
            let bounds = range.local_bounds.transformed(&item.model_matrix);
            item.aabb_min = bounds.min;
            item.aabb_max = bounds.max;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometryRange;
    use crate::math::aabb::AABB;

    fn unit_cube_registry() -> (GeometryRegistry, GeometryKey) {
        let mut registry = GeometryRegistry::new();
        let key = registry.insert(GeometryRange {
            index_count: 36,
            first_index: 0,
            base_vertex: 0,
            local_bounds: AABB::new(Vec3::splat(-0.5), Vec3::splat(0.5)),
        });
        (registry, key)
    }

    #[test]
    fn absent_aabb_is_computed_from_local_bounds() {
        let (registry, key) = unit_cube_registry();
        let mut items = [RenderItem::new(
            Mat4::from_translation(Vec3::new(4.0, 0.0, 0.0)),
            key,
        )];
        assert!(items[0].has_absent_aabb());

        fill_absent_aabbs(&mut items, &registry);

        assert!(!items[0].has_absent_aabb());
        assert_eq!(items[0].aabb_min, Vec3::new(3.5, -0.5, -0.5));
        assert_eq!(items[0].aabb_max, Vec3::new(4.5, 0.5, 0.5));
    }

    #[test]
    fn present_aabb_is_left_alone() {
        let (registry, key) = unit_cube_registry();
        let mut item = RenderItem::new(Mat4::IDENTITY, key);
        item.aabb_min = Vec3::splat(-2.0);
        item.aabb_max = Vec3::splat(2.0);

        let mut items = [item];
        fill_absent_aabbs(&mut items, &registry);

        assert_eq!(items[0].aabb_min, Vec3::splat(-2.0));
        assert_eq!(items[0].aabb_max, Vec3::splat(2.0));
    }

    #[test]
    fn sort_by_geometry_is_stable() {
        let mut a = RenderItem::new(Mat4::IDENTITY, GeometryKey(1));
        a.base_color_texture_index = 10;
        let mut b = RenderItem::new(Mat4::IDENTITY, GeometryKey(0));
        b.base_color_texture_index = 11;
        let mut c = RenderItem::new(Mat4::IDENTITY, GeometryKey(1));
        c.base_color_texture_index = 12;

        let mut items = [a, b, c];
        sort_by_geometry(&mut items);

        let order: Vec<u32> = items.iter().map(|i| i.base_color_texture_index).collect();
        assert_eq!(order, vec![11, 10, 12]);
    }
}
