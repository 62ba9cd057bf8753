//! Visibility culling and draw batching for a multi-viewport renderer.
//!
//! Every frame, candidate render items supplied by the scene (pre-sorted by
//! geometry key) are filtered against each active viewport frustum and each
//! dirty shadow light's cube faces, and the survivors are collapsed into
//! the minimal set of instanced draw commands with per-viewport offsets
//! into one shared instance array. Output rotates through frame regions so
//! the frame being built never overwrites data an in-flight GPU frame is
//! still reading.

pub mod batching;
pub mod config;
pub mod draw_set;
pub mod frame_regions;
pub mod geometry;
pub mod math;
pub mod render_item;
pub mod shadow;
pub mod visibility;

pub use batching::DrawIndexedIndirectCommand;
pub use config::{RenderConfig, SplitscreenMode};
pub use draw_set::{
    BatchWarning, BatchedDrawSet, DrawSetAssembler, FrameDrawData, FrameInputs, LightFaceSlices,
    PassKind, ViewportSlice,
};
pub use frame_regions::{FrameRegionPool, RegionLease};
pub use geometry::{GeometryKey, GeometryRange, GeometryRegistry};
pub use math::frustum::Frustum;
pub use render_item::RenderItem;
pub use shadow::{ShadowDirtyFlags, ShadowLightFrusta};

/// Submission seam towards a rendering back end. Each back end implements
/// this one capability; the culling and batching side never branches on
/// which back end is active.
pub trait RenderBackend {
    fn submit(&mut self, draw_set: &BatchedDrawSet) -> anyhow::Result<()>;
}
