//! Kinematic locomotion: delivering movement intent through the physics
//! engine's collision-aware character controller.
//!
//! The stored target pose is written by behavior logic (wander steering,
//! scripted movers); this pass only converts it into a desired translation,
//! lets Rapier resolve collisions, and commits the corrected result. It
//! owns no collision response of its own.

use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::prelude::*;
use wreckbox_ecs::World;

use crate::PhysicsWorld;
use crate::convert::{to_rotation, to_vec3};

/// Builds the tuned character controller used for every kinematic mover.
fn character_controller() -> KinematicCharacterController {
    KinematicCharacterController {
        max_slope_climb_angle: std::f32::consts::FRAC_PI_4, // 45°
        min_slope_slide_angle: std::f32::consts::FRAC_PI_4,
        autostep: Some(CharacterAutostep {
            max_height: CharacterLength::Absolute(0.5),
            min_width: CharacterLength::Absolute(0.3),
            include_dynamic_bodies: false,
        }),
        snap_to_ground: Some(CharacterLength::Absolute(0.2)),
        offset: CharacterLength::Absolute(0.01),
        ..Default::default()
    }
}

/// Drives every entity with a [`KinematicController`](wreckbox_ecs::KinematicController):
/// pushes the desired translation through `move_shape`, commits the
/// collision-corrected displacement to the body, and records the grounded
/// flag. Target rotation is applied directly — orientation is not
/// collision-resolved.
pub fn drive_kinematics(world: &mut World, physics: &mut PhysicsWorld, dt: f32) {
    if dt <= 0.0 {
        return;
    }
    let controller = character_controller();

    for (entity, ctrl) in world.controllers.iter_mut() {
        let Some(handle) = physics.registry.body_of(entity) else {
            continue;
        };
        let Some(body) = physics.rigid_body_set.get(handle) else {
            continue;
        };
        let current = body.translation();
        let desired = Vector::new(
            ctrl.target_position.x - current.x,
            ctrl.target_position.y - current.y,
            ctrl.target_position.z - current.z,
        );

        let filter = QueryFilter::new().exclude_rigid_body(handle);
        let query_pipeline = physics.broad_phase.as_query_pipeline(
            physics.narrow_phase.query_dispatcher(),
            &physics.rigid_body_set,
            &physics.collider_set,
            filter,
        );

        let character_shape = Capsule::new_y(ctrl.half_height, ctrl.radius);
        let body_pos = physics.rigid_body_set[handle].position();

        let corrected = controller.move_shape(
            dt,
            &query_pipeline,
            &character_shape,
            body_pos,
            desired,
            |_| {},
        );

        let body = &mut physics.rigid_body_set[handle];
        let new_translation = body.translation() + corrected.translation;
        body.set_next_kinematic_translation(new_translation);
        body.set_next_kinematic_rotation(to_rotation(ctrl.target_rotation));
        ctrl.grounded = corrected.grounded;

        // Keep the store in step with where the body will be; the next sync
        // pass would do this too, but writing the intent now keeps behavior
        // logic reading fresh positions within the same frame.
        if let Some(transform) = world.transforms.get_mut(entity) {
            transform.position = to_vec3(&new_translation);
            transform.rotation = ctrl.target_rotation;
        }
    }
}
