//! The entity assembler.
//!
//! One call installs everything an entity is made of — components, physics
//! body, visual node, instance slot — and only then announces the entity on
//! the lifecycle bus. No observer ever sees a half-assembled entity.

use glam::{Quat, Vec3};
use thiserror::Error;
use wreckbox_ecs::{
    Buoyant, Entity, Integrity, KinematicController, MeshRef, PhysicsProps, Projectile,
    TemplateId, Transform, WanderAgent,
};
use wreckbox_physics::BodyKind;
use wreckbox_physics::convert::to_vector;

use crate::context::SimContext;
use crate::template::ProjectileSpec;

/// Assembly failures. Only unknown templates are errors; pool exhaustion
/// degrades to an uninstanced (but fully simulated) entity.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// The template id is not in the registry.
    #[error("unknown template '{0}'")]
    UnknownTemplate(String),
}

/// Spawns one entity from a template.
///
/// `scale`/`props` default to the template's values when `None`. The
/// transform scale also scales the collision shape.
pub fn spawn_from_template(
    ctx: &mut SimContext,
    template_id: &str,
    position: Vec3,
    rotation: Quat,
    scale: Option<Vec3>,
    props: Option<PhysicsProps>,
) -> Result<Entity, SpawnError> {
    let template = ctx
        .templates
        .get(template_id)
        .ok_or_else(|| SpawnError::UnknownTemplate(template_id.to_string()))?
        .clone();

    let transform = Transform {
        position,
        rotation,
        scale: scale.unwrap_or(template.scale),
    };
    let props = props.unwrap_or(template.props);

    let entity = ctx.world.spawn_entity();
    ctx.world.transforms.insert(entity, transform);
    ctx.world.props.insert(entity, props);
    ctx.world
        .templates
        .insert(entity, TemplateId::new(&template.id));

    let dynamic_slot = template.kind != BodyKind::Fixed;
    ctx.world.meshes.insert(
        entity,
        MeshRef {
            archetype: template.archetype.clone(),
            dynamic: dynamic_slot,
        },
    );

    if let Some(spec) = template.integrity {
        ctx.world
            .integrity
            .insert(entity, Integrity::new(spec.max_health, spec.impact_threshold));
    }
    if template.buoyant {
        ctx.world.buoyant.insert(entity, Buoyant);
    }
    if let Some(spec) = template.kinematic {
        ctx.world.controllers.insert(
            entity,
            KinematicController::new(position, spec.half_height, spec.radius),
        );
    }
    if let Some(spec) = template.wander {
        // Deterministic initial heading spread without consuming RNG state.
        let heading = (entity.id() as f32 * 0.618_034) % std::f32::consts::TAU;
        ctx.world
            .agents
            .insert(entity, WanderAgent::new(heading, spec.speed));
    }

    ctx.physics
        .spawn_body(entity, template.kind, &transform, &props, &template.shape);
    {
        let mut graph = ctx.graph.borrow_mut();
        graph.insert(entity, transform.matrix());
        if !dynamic_slot {
            // Statics spawn hidden; the culling pass reveals the in-range
            // ones on its next re-query.
            graph.set_visible(entity, false);
        }
    }
    // A full pool degrades to an uninstanced (still simulated) entity;
    // `register` already logged the warning.
    let _ = ctx
        .pools
        .borrow_mut()
        .register(entity, &template.archetype, dynamic_slot);

    ctx.world
        .notify_created(entity, template.kind.class(), position);
    Ok(entity)
}

/// Spawns a projectile entity travelling along `direction` at `speed`,
/// owned by `owner` (which it can never damage).
pub fn fire_projectile(
    ctx: &mut SimContext,
    owner: Entity,
    origin: Vec3,
    direction: Vec3,
    speed: f32,
) -> Result<Entity, SpawnError> {
    let entity = spawn_from_template(ctx, "slug", origin, Quat::IDENTITY, None, None)?;

    let spec = ctx
        .templates
        .get("slug")
        .and_then(|t| t.projectile)
        .unwrap_or(ProjectileSpec {
            damage: 35.0,
            impulse: 18.0,
            life_secs: 10.0,
        });
    ctx.world.projectiles.insert(
        entity,
        Projectile {
            damage: spec.damage,
            impulse: spec.impulse,
            life_secs: spec.life_secs,
            owner,
        },
    );

    let velocity = direction.normalize_or_zero() * speed;
    if let Some(handle) = ctx.physics.registry.body_of(entity)
        && let Some(body) = ctx.physics.rigid_body_set.get_mut(handle)
    {
        body.set_linvel(to_vector(velocity), true);
    }
    ctx.stats.projectiles_fired += 1;
    Ok(entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wreckbox_config::Config;

    fn ctx() -> SimContext {
        SimContext::new(&Config::default())
    }

    #[test]
    fn test_spawn_installs_all_components_atomically() {
        let mut ctx = ctx();
        let e = spawn_from_template(
            &mut ctx,
            "ice_block",
            Vec3::new(1.0, 4.0, 2.0),
            Quat::IDENTITY,
            None,
            None,
        )
        .unwrap();

        assert!(ctx.world.transforms.contains(e));
        assert!(ctx.world.props.contains(e));
        assert!(ctx.world.integrity.contains(e), "ice is destructible");
        assert!(ctx.world.buoyant.contains(e), "ice floats");
        assert!(ctx.world.templates.contains(e));
        assert!(ctx.world.meshes.contains(e));
        assert!(ctx.physics.registry.body_of(e).is_some());
    }

    #[test]
    fn test_unknown_template_is_an_error() {
        let mut ctx = ctx();
        let err = spawn_from_template(
            &mut ctx,
            "obelisk",
            Vec3::ZERO,
            Quat::IDENTITY,
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, SpawnError::UnknownTemplate(_)));
        assert_eq!(ctx.world.entity_count(), 0, "nothing half-spawned");
    }

    #[test]
    fn test_props_override_is_clamped_by_construction() {
        let mut ctx = ctx();
        let e = spawn_from_template(
            &mut ctx,
            "crate",
            Vec3::new(0.0, 5.0, 0.0),
            Quat::IDENTITY,
            None,
            Some(PhysicsProps::new(7.0, 0.5, 1.0)),
        )
        .unwrap();
        assert_eq!(ctx.world.props.get(e).unwrap().friction(), 5.0);
    }

    #[test]
    fn test_fired_projectile_carries_owner_and_velocity() {
        let mut ctx = ctx();
        let owner = spawn_from_template(
            &mut ctx,
            "crate",
            Vec3::new(0.0, 5.0, 0.0),
            Quat::IDENTITY,
            None,
            None,
        )
        .unwrap();
        let slug = fire_projectile(
            &mut ctx,
            owner,
            Vec3::new(0.0, 6.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            120.0,
        )
        .unwrap();

        let proj = ctx.world.projectiles.get(slug).unwrap();
        assert_eq!(proj.owner, owner);

        let handle = ctx.physics.registry.body_of(slug).unwrap();
        let v = ctx.physics.rigid_body_set[handle].linvel();
        assert!((v.x - 120.0).abs() < 1e-4);
    }

    #[test]
    fn test_walker_gets_controller_and_agent() {
        let mut ctx = ctx();
        let e = spawn_from_template(
            &mut ctx,
            "walker",
            Vec3::new(0.0, 1.0, 0.0),
            Quat::IDENTITY,
            None,
            None,
        )
        .unwrap();
        assert!(ctx.world.controllers.contains(e));
        assert!(ctx.world.agents.contains(e));
    }
}
