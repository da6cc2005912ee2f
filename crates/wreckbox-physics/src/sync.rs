//! Two-directional transform synchronization.
//!
//! Physics is authoritative for every simulated entity except the one the
//! user is actively dragging: that entity flows visual → physics instead,
//! and every system agrees on the split via the world's `dragged` field —
//! no locks, just the one explicit check.

use rapier3d::prelude::RigidBodyHandle;
use wreckbox_ecs::World;
use wreckbox_render::SceneGraph;
use wreckbox_spatial::SpatialIndex;

use crate::PhysicsWorld;
use crate::convert::{to_quat, to_vec3, to_vector, to_rotation};

/// Copies poses of active bodies into the transform store, the scene graph
/// and the proximity hash, skipping the dragged entity.
///
/// Only bodies the physics engine flags active are touched; sleeping bodies
/// have not moved and their store entries are already correct.
pub fn sync_physics_to_visuals(
    physics: &PhysicsWorld,
    world: &mut World,
    graph: &mut SceneGraph,
    spatial: &mut SpatialIndex,
) {
    let dragged = world.dragged();
    let active: Vec<RigidBodyHandle> = physics.island_manager.active_bodies().collect();

    for handle in active {
        let Some(entity) = physics.registry.entity_of(handle) else {
            continue;
        };
        if dragged == Some(entity) {
            continue;
        }
        let Some(body) = physics.rigid_body_set.get(handle) else {
            continue;
        };
        let Some(transform) = world.transforms.get_mut(entity) else {
            continue;
        };
        transform.position = to_vec3(&body.translation());
        transform.rotation = to_quat(body.rotation());
        graph.set_transform(entity, transform.matrix());
        spatial.update_dynamic(entity, transform.position);
    }
}

/// Pushes the dragged entity's store transform into its body, overriding
/// the solver. Velocities are zeroed while held so releasing the gizmo does
/// not launch the entity with stale momentum.
pub fn sync_dragged_to_physics(physics: &mut PhysicsWorld, world: &World) {
    let Some(entity) = world.dragged() else {
        return;
    };
    let Some(handle) = physics.registry.body_of(entity) else {
        return;
    };
    let Some(transform) = world.transforms.get(entity) else {
        return;
    };
    if let Some(body) = physics.rigid_body_set.get_mut(handle) {
        body.set_translation(to_vector(transform.position), true);
        body.set_rotation(to_rotation(transform.rotation), true);
        body.set_linvel(to_vector(glam::Vec3::ZERO), true);
        body.set_angvel(to_vector(glam::Vec3::ZERO), true);
    }
}
