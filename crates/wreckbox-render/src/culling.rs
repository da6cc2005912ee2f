//! Camera-distance visibility culling.
//!
//! Statics are culled incrementally: the grid is only re-queried once the
//! camera has moved far enough, and the result is applied as a two-sided
//! diff against the previously visible set rather than a full rebuild.
//! Dynamics are few and fast-moving, so they are re-evaluated every tick.

use glam::Vec3;
use rustc_hash::FxHashSet;
use wreckbox_ecs::{ComponentStore, Entity, Transform};
use wreckbox_spatial::SpatialIndex;

use crate::scene_graph::SceneGraph;

/// Distance beyond which entities are hidden, in meters.
pub const CULL_RADIUS: f32 = 150.0;
/// Camera displacement that forces a static re-query, in meters.
pub const RECULL_CAMERA_DELTA: f32 = 2.0;

/// Incremental state carried between culling passes.
#[derive(Debug, Default)]
pub struct CullingState {
    last_camera_pos: Option<Vec3>,
    visible_statics: FxHashSet<Entity>,
    known_statics: usize,
}

impl CullingState {
    /// Creates fresh state; the first pass always re-queries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Entities currently considered visible by the static pass.
    pub fn visible_statics(&self) -> &FxHashSet<Entity> {
        &self.visible_statics
    }

    /// Forgets everything, forcing a full re-query next pass.
    pub fn reset(&mut self) {
        self.last_camera_pos = None;
        self.visible_statics.clear();
        self.known_statics = 0;
    }
}

/// Runs one culling pass, toggling node visibility flags in `graph`.
pub fn run_culling(
    graph: &mut SceneGraph,
    spatial: &SpatialIndex,
    transforms: &ComponentStore<Transform>,
    state: &mut CullingState,
    camera_pos: Vec3,
    selected: Option<Entity>,
) {
    let moved_enough = state
        .last_camera_pos
        .is_none_or(|last| last.distance(camera_pos) > RECULL_CAMERA_DELTA);
    // Statics spawn with their node hidden; a population change forces a
    // re-query so newly placed geometry is revealed without waiting for
    // the camera to move.
    let statics_changed = spatial.grid().len() != state.known_statics;

    if moved_enough || statics_changed {
        let candidates: FxHashSet<Entity> = spatial
            .grid()
            .query_circle(camera_pos, CULL_RADIUS)
            .into_iter()
            .collect();

        // Newly in range become visible; previously visible but now out of
        // range are evicted. Entities in neither set are untouched.
        for &entity in candidates.difference(&state.visible_statics) {
            graph.set_visible(entity, true);
        }
        for &entity in state.visible_statics.difference(&candidates) {
            graph.set_visible(entity, false);
        }

        state.visible_statics = candidates;
        state.last_camera_pos = Some(camera_pos);
        state.known_statics = spatial.grid().len();
    }

    // Dynamics: small set, full re-evaluation every tick.
    for &entity in spatial.dynamics() {
        if let Some(transform) = transforms.get(entity) {
            let visible = transform.position.distance(camera_pos) <= CULL_RADIUS;
            graph.set_visible(entity, visible);
        }
    }

    // The selected entity is always shown, whatever its distance.
    if let Some(entity) = selected {
        graph.set_visible(entity, true);
    }
}
