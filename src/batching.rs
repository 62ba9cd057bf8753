use bytemuck::{Pod, Zeroable};

use crate::geometry::{GeometryKey, GeometryRegistry};
use crate::render_item::RenderItem;

/// One instanced indirect draw, laid out to match the indexed indirect
/// argument block GPUs consume directly.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawIndexedIndirectCommand {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub base_vertex: i32,
    pub base_instance: u32,
}

/// Collapses a geometry-key-sorted run of items into the minimal command
/// sequence: one command per maximal run of identical keys, each command's
/// `base_instance` continuing from `first_instance`. Commands are appended
/// to `out`.
///
/// The input must already be sorted by key; unsorted input still yields a
/// structurally valid result, just with one command per key run and far
/// more runs than necessary.
pub fn compile_draw_commands(
    registry: &GeometryRegistry,
    items: &[RenderItem],
    first_instance: u32,
    out: &mut Vec<DrawIndexedIndirectCommand>,
) {
    let mut current_key: Option<GeometryKey> = None;
    let mut base_instance = first_instance;

    for item in items {
        if current_key == Some(item.geometry) {
            // Same geometry as the open command, fold into it.
            if let Some(command) = out.last_mut() {
                command.instance_count += 1;
            }
        } else {
            let Some(range) = registry.resolve(item.geometry) else {
                // Unresolvable keys are dropped before filtering; one
                // reaching this point would corrupt instance indexing.
                panic!(
                    "geometry key {:?} not present in registry during draw command compilation",
                    item.geometry
                );
            };

            out.push(DrawIndexedIndirectCommand {
                index_count: range.index_count,
                instance_count: 1,
                first_index: range.first_index,
                base_vertex: range.base_vertex,
                base_instance,
            });
            current_key = Some(item.geometry);
        }

        base_instance += 1;
    }
}
