use bytemuck::{Pod, Zeroable};
use glam::Vec3;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    pub fn new(normal: Vec3, distance: f32) -> Plane {
        Plane { normal, distance }
    }

    /// Scales the plane equation so the normal has unit length.
    pub fn normalized(self) -> Plane {
        let magnitude = self.normal.length();
        Plane {
            normal: self.normal / magnitude,
            distance: self.distance / magnitude,
        }
    }

    pub fn signed_distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}
