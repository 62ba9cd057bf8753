use std::collections::HashSet;

use crate::batching::{compile_draw_commands, DrawIndexedIndirectCommand};
use crate::config::RenderConfig;
use crate::geometry::{GeometryKey, GeometryRegistry};
use crate::math::frustum::Frustum;
use crate::render_item::RenderItem;
use crate::shadow::{ShadowDirtyFlags, ShadowLightFrusta};
use crate::visibility;

/// Bounding sphere radius used to cull point-like decal instances.
pub const DECAL_CULL_RADIUS: f32 = 0.015;

/// Logical render pass a draw set belongs to. The kind selects the cull
/// shape (decals are culled as small spheres) and the shadow-caster gate.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    #[default]
    Geometry,
    Decals,
    Glass,
    Shadow,
}

impl PassKind {
    fn cull(self) -> CullShape {
        match self {
            PassKind::Geometry | PassKind::Glass => CullShape::Aabb,
            PassKind::Decals => CullShape::Sphere(DECAL_CULL_RADIUS),
            PassKind::Shadow => CullShape::ShadowCasters,
        }
    }
}

#[derive(Clone, Copy)]
enum CullShape {
    Aabb,
    Sphere(f32),
    ShadowCasters,
}

/// One viewport's (or light face's) contiguous region within a pass-wide
/// instance array, plus the command span that draws it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSlice {
    pub base_instance: u32,
    pub instance_count: u32,
    pub first_command: u32,
    pub command_count: u32,
}

/// Slices for the six cube faces of one reprocessed shadow light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightFaceSlices {
    pub light_index: u32,
    pub faces: [ViewportSlice; 6],
}

/// The compiled output of one pass for one frame: a single instance array
/// shared by all viewports (or light faces), the minimal command list over
/// it, and the per-viewport bookkeeping. Plain data; backends consume it
/// through [`crate::RenderBackend`] without this side ever knowing which
/// backend is active.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchedDrawSet {
    pub pass: PassKind,
    pub instances: Vec<RenderItem>,
    pub commands: Vec<DrawIndexedIndirectCommand>,
    pub viewport_slices: Vec<ViewportSlice>,
    pub light_slices: Vec<LightFaceSlices>,
}

impl BatchedDrawSet {
    fn reset(&mut self, pass: PassKind) {
        self.pass = pass;
        self.instances.clear();
        self.commands.clear();
        self.viewport_slices.clear();
        self.light_slices.clear();
    }

    pub fn total_instances(&self) -> usize {
        self.instances.len()
    }
}

/// Recoverable per-frame conditions. `MissingGeometry` is reported once per
/// key per session; `CapacityExceeded` once per overflowing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BatchWarning {
    #[error("geometry key {0:?} is not present in the registry; dropping its render items")]
    MissingGeometry(GeometryKey),
    #[error("pass over capacity: kept {kept} of {requested} visible instances")]
    CapacityExceeded { requested: u32, kept: u32 },
}

/// Everything the scene side hands over for one frame. Candidate lists are
/// expected pre-sorted by geometry key (see
/// [`crate::render_item::sort_by_geometry`]).
#[derive(Debug, Clone, Copy)]
pub struct FrameInputs<'a> {
    pub geometry_candidates: &'a [RenderItem],
    pub decal_candidates: &'a [RenderItem],
    pub glass_candidates: &'a [RenderItem],
    pub viewports: &'a [Frustum],
    pub shadow_lights: &'a [ShadowLightFrusta],
}

/// Per-frame draw data for every pass, sized for one frame region.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameDrawData {
    pub geometry: BatchedDrawSet,
    pub decals: BatchedDrawSet,
    pub glass: BatchedDrawSet,
    pub shadow: BatchedDrawSet,
}

/// Compiles candidate lists into [`BatchedDrawSet`]s: per viewport (and per
/// dirty shadow-light face), filter the candidates against the frustum,
/// append survivors to the pass instance array, and collapse each appended
/// run into draw commands seeded with the pass's running instance total.
pub struct DrawSetAssembler {
    config: RenderConfig,
    warned_missing: HashSet<GeometryKey>,
    cleaned: Vec<RenderItem>,
}

impl DrawSetAssembler {
    pub fn new(config: RenderConfig) -> DrawSetAssembler {
        DrawSetAssembler {
            config,
            warned_missing: HashSet::new(),
            cleaned: Vec::new(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Builds one camera pass across the active viewports, in viewport
    /// order. `out` is cleared first; its allocations are reused.
    pub fn assemble_view_pass(
        &mut self,
        registry: &GeometryRegistry,
        pass: PassKind,
        candidates: &[RenderItem],
        viewports: &[Frustum],
        out: &mut BatchedDrawSet,
    ) -> Vec<BatchWarning> {
        out.reset(pass);
        let mut warnings = Vec::new();
        let candidates = drop_unresolvable(
            registry,
            candidates,
            &mut self.cleaned,
            &mut self.warned_missing,
            &mut warnings,
        );

        let viewport_count = self
            .config
            .splitscreen_mode
            .viewport_count()
            .min(viewports.len());

        let mut tally = CapacityTally::default();
        for frustum in &viewports[..viewport_count] {
            let slice = compile_sub_pass(
                registry,
                pass.cull(),
                candidates,
                frustum,
                &self.config,
                out,
                &mut tally,
            );
            out.viewport_slices.push(slice);
        }

        tally.finish(out, &mut warnings);
        debug_assert_accounting(out);
        warnings
    }

    /// Builds the shadow pass for every light whose dirty flag is set: six
    /// face sub-passes per light, sharing the pass instance array. A clean
    /// light is skipped entirely and contributes no slice; its flag is
    /// cleared only after all six faces compiled.
    pub fn assemble_shadow_pass(
        &mut self,
        registry: &GeometryRegistry,
        candidates: &[RenderItem],
        lights: &[ShadowLightFrusta],
        dirty: &mut ShadowDirtyFlags,
        out: &mut BatchedDrawSet,
    ) -> Vec<BatchWarning> {
        out.reset(PassKind::Shadow);
        let mut warnings = Vec::new();
        let candidates = drop_unresolvable(
            registry,
            candidates,
            &mut self.cleaned,
            &mut self.warned_missing,
            &mut warnings,
        );

        let mut tally = CapacityTally::default();
        for light in lights {
            if !dirty.is_dirty(light.light_index) {
                continue;
            }

            let faces = light.faces.map(|frustum| {
                compile_sub_pass(
                    registry,
                    CullShape::ShadowCasters,
                    candidates,
                    &frustum,
                    &self.config,
                    out,
                    &mut tally,
                )
            });

            out.light_slices.push(LightFaceSlices {
                light_index: light.light_index,
                faces,
            });
            dirty.clear(light.light_index);
        }

        tally.finish(out, &mut warnings);
        debug_assert_accounting(out);
        warnings
    }

    /// Assembles every pass of one frame from one set of inputs. The shadow
    /// pass consumes the geometry candidates, gated on each item's
    /// shadow-cast flag.
    pub fn compile_frame(
        &mut self,
        registry: &GeometryRegistry,
        inputs: &FrameInputs,
        dirty: &mut ShadowDirtyFlags,
        out: &mut FrameDrawData,
    ) -> Vec<BatchWarning> {
        let mut warnings = self.assemble_view_pass(
            registry,
            PassKind::Geometry,
            inputs.geometry_candidates,
            inputs.viewports,
            &mut out.geometry,
        );
        warnings.extend(self.assemble_view_pass(
            registry,
            PassKind::Decals,
            inputs.decal_candidates,
            inputs.viewports,
            &mut out.decals,
        ));
        warnings.extend(self.assemble_view_pass(
            registry,
            PassKind::Glass,
            inputs.glass_candidates,
            inputs.viewports,
            &mut out.glass,
        ));
        warnings.extend(self.assemble_shadow_pass(
            registry,
            inputs.geometry_candidates,
            inputs.shadow_lights,
            dirty,
            &mut out.shadow,
        ));
        warnings
    }
}

/// Drops items whose geometry key does not resolve, so one bad item cannot
/// blank a frame. Warns once per key per session. Returns the surviving
/// candidates (the input slice itself when nothing was dropped).
fn drop_unresolvable<'a>(
    registry: &GeometryRegistry,
    candidates: &'a [RenderItem],
    cleaned: &'a mut Vec<RenderItem>,
    warned_missing: &mut HashSet<GeometryKey>,
    warnings: &mut Vec<BatchWarning>,
) -> &'a [RenderItem] {
    let any_missing = candidates
        .iter()
        .any(|item| registry.resolve(item.geometry).is_none());
    if !any_missing {
        return candidates;
    }

    cleaned.clear();
    for item in candidates {
        if registry.resolve(item.geometry).is_some() {
            cleaned.push(*item);
        } else if warned_missing.insert(item.geometry) {
            log::warn!(
                "geometry key {:?} is not present in the registry; dropping its render items",
                item.geometry
            );
            warnings.push(BatchWarning::MissingGeometry(item.geometry));
        }
    }
    cleaned
}

/// Running over/under-capacity bookkeeping for one pass.
#[derive(Default)]
struct CapacityTally {
    requested: u32,
    truncated: bool,
}

impl CapacityTally {
    fn finish(&self, out: &BatchedDrawSet, warnings: &mut Vec<BatchWarning>) {
        if self.truncated {
            let warning = BatchWarning::CapacityExceeded {
                requested: self.requested,
                kept: out.instances.len() as u32,
            };
            log::warn!("{warning}");
            warnings.push(warning);
        }
    }
}

/// Filter + compile for a single frustum, continuing the pass's running
/// instance and command totals. Enforces both pass capacities by keeping
/// the earliest items in filtered order.
fn compile_sub_pass(
    registry: &GeometryRegistry,
    cull: CullShape,
    candidates: &[RenderItem],
    frustum: &Frustum,
    config: &RenderConfig,
    out: &mut BatchedDrawSet,
    tally: &mut CapacityTally,
) -> ViewportSlice {
    let base_instance = out.instances.len() as u32;
    let first_command = out.commands.len() as u32;

    let appended = match cull {
        CullShape::Aabb => visibility::collect_visible(candidates, frustum, &mut out.instances),
        CullShape::Sphere(radius) => {
            visibility::collect_visible_spheres(candidates, frustum, radius, &mut out.instances)
        }
        CullShape::ShadowCasters => {
            visibility::collect_shadow_casters(candidates, frustum, &mut out.instances)
        }
    };
    tally.requested += appended;

    if out.instances.len() > config.max_instances_per_pass {
        out.instances.truncate(config.max_instances_per_pass);
        tally.truncated = true;
    }

    compile_draw_commands(
        registry,
        &out.instances[base_instance as usize..],
        base_instance,
        &mut out.commands,
    );

    if out.commands.len() > config.max_draw_commands_per_pass {
        // Drop whole trailing commands and the instances they covered so
        // the accounting invariants survive truncation.
        out.commands.truncate(config.max_draw_commands_per_pass);
        let covered = out
            .commands
            .last()
            .map(|c| c.base_instance + c.instance_count)
            .unwrap_or(0);
        out.instances.truncate(covered as usize);
        tally.truncated = true;
    }

    ViewportSlice {
        base_instance,
        instance_count: out.instances.len() as u32 - base_instance,
        first_command,
        command_count: out.commands.len() as u32 - first_command,
    }
}

fn debug_assert_accounting(out: &BatchedDrawSet) {
    debug_assert!(out
        .commands
        .iter()
        .all(|c| (c.base_instance + c.instance_count) as usize <= out.instances.len()));

    let sliced: u32 = out
        .viewport_slices
        .iter()
        .chain(out.light_slices.iter().flat_map(|l| l.faces.iter()))
        .map(|s| s.instance_count)
        .sum();
    debug_assert_eq!(sliced as usize, out.instances.len());
}
