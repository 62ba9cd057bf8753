use bytemuck::{Pod, Zeroable};

use crate::math::aabb::AABB;

/// Identifies one contiguous vertex/index range in the shared mesh buffers.
/// Render items sharing a key are instancing-compatible.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
pub struct GeometryKey(pub u32);

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeometryRange {
    pub index_count: u32,
    pub first_index: u32,
    pub base_vertex: i32,
    /// Mesh-local bounds, used to compute world AABBs for items that were
    /// submitted without one.
    pub local_bounds: AABB,
}

/// Key -> index-range mapping owned by the asset side. Read-only while draw
/// sets are being assembled.
#[derive(Debug, Default)]
pub struct GeometryRegistry {
    ranges: Vec<GeometryRange>,
}

impl GeometryRegistry {
    pub fn new() -> GeometryRegistry {
        GeometryRegistry { ranges: Vec::new() }
    }

    pub fn insert(&mut self, range: GeometryRange) -> GeometryKey {
        let key = GeometryKey(self.ranges.len() as u32);
        self.ranges.push(range);
        key
    }

    pub fn resolve(&self, key: GeometryKey) -> Option<&GeometryRange> {
        self.ranges.get(key.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
