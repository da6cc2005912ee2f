//! The engine facade: one world, one scheduler, one tick entry point.

use glam::{Quat, Vec3};
use wreckbox_config::Config;
use wreckbox_ecs::{Entity, PhysicsProps, Scheduler, World};
use wreckbox_scene::{SceneFile, SceneRecord, parse_scene};

use crate::agents::WanderSystem;
use crate::combat::CombatSystem;
use crate::context::{FrameStats, ImpactEffect, SimContext};
use crate::destruction::DestructionSystem;
use crate::spawn::{SpawnError, fire_projectile, spawn_from_template};
use crate::systems::{
    BuoyancySystem, CullingSystem, InstancingSystem, LocomotionSystem, PhysicsSystem,
    RepairSystem, StatsSystem,
};

/// Outcome of a scene load. Per-entry problems are counted, not fatal;
/// `failed` is set only when the document itself is unreadable.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Entities created.
    pub spawned: usize,
    /// Records skipped (unknown template).
    pub skipped: usize,
    /// Whether the load failed catastrophically (engine reset to empty).
    pub failed: bool,
}

/// The assembled engine: context plus the scheduler with every system
/// registered at its fixed priority.
pub struct Engine {
    ctx: SimContext,
    scheduler: Scheduler<SimContext>,
    load_failed: bool,
}

impl Engine {
    /// Builds the engine from configuration. System registration order is
    /// irrelevant — priorities define execution order — but registering in
    /// frame order keeps the list readable.
    pub fn new(config: &Config) -> Self {
        let ctx = SimContext::new(config);
        let seed = config.sim.rng_seed;

        let mut scheduler: Scheduler<SimContext> = Scheduler::new();
        scheduler.register(Box::new(WanderSystem::new(seed.rotate_left(17))));
        scheduler.register(Box::new(LocomotionSystem));
        scheduler.register(Box::new(BuoyancySystem));
        scheduler.register(Box::new(CombatSystem::new()));
        scheduler.register(Box::new(PhysicsSystem));
        scheduler.register(Box::new(DestructionSystem::new(seed)));
        scheduler.register(Box::new(RepairSystem));
        scheduler.register(Box::new(CullingSystem));
        scheduler.register(Box::new(InstancingSystem));
        scheduler.register(Box::new(StatsSystem));

        Self {
            ctx,
            scheduler,
            load_failed: false,
        }
    }

    /// Runs one frame. `delta_ms` is clamped inside the scheduler.
    pub fn tick(&mut self, delta_ms: f32) {
        self.scheduler.tick(&mut self.ctx, delta_ms);
    }

    /// The component stores.
    pub fn world(&self) -> &World {
        &self.ctx.world
    }

    /// The component stores, mutably.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.ctx.world
    }

    /// The full tick context, for embedding hosts that need direct access.
    pub fn context(&self) -> &SimContext {
        &self.ctx
    }

    /// The full tick context, mutably.
    pub fn context_mut(&mut self) -> &mut SimContext {
        &mut self.ctx
    }

    /// Spawns a template at `position` with identity rotation.
    pub fn spawn(&mut self, template_id: &str, position: Vec3) -> Result<Entity, SpawnError> {
        spawn_from_template(&mut self.ctx, template_id, position, Quat::IDENTITY, None, None)
    }

    /// Fires a projectile owned by `owner`.
    pub fn fire(
        &mut self,
        owner: Entity,
        origin: Vec3,
        direction: Vec3,
        speed: f32,
    ) -> Result<Entity, SpawnError> {
        fire_projectile(&mut self.ctx, owner, origin, direction, speed)
    }

    /// Applies direct damage to an entity's integrity, if it has one.
    /// Destruction happens on the next tick's destruction pass.
    pub fn apply_damage(&mut self, entity: Entity, amount: f32) {
        if let Some(integrity) = self.ctx.world.integrity.get_mut(entity) {
            integrity.apply_damage(amount);
        }
    }

    /// Destroys an entity immediately (host delete button).
    pub fn destroy(&mut self, entity: Entity) -> bool {
        self.ctx.destroy_entity(entity)
    }

    /// Moves the culling camera.
    pub fn set_camera(&mut self, position: Vec3) {
        self.ctx.camera_position = position;
    }

    /// Marks the entity held by the drag gizmo (or releases with `None`).
    pub fn set_dragged(&mut self, entity: Option<Entity>) {
        self.ctx.world.set_dragged(entity);
    }

    /// Moves the dragged entity; its body follows on the next physics pass.
    pub fn move_dragged(&mut self, position: Vec3) {
        if let Some(entity) = self.ctx.world.dragged()
            && let Some(transform) = self.ctx.world.transforms.get_mut(entity)
        {
            transform.position = position;
        }
    }

    /// Selects an entity (kept visible regardless of camera distance).
    pub fn set_selected(&mut self, entity: Option<Entity>) {
        self.ctx.world.set_selected(entity);
    }

    /// Entities within `radius` of `center`, from the spatial index.
    pub fn entities_within(&self, center: Vec3, radius: f32) -> Vec<Entity> {
        self.ctx.spatial.borrow().query_radius(center, radius)
    }

    /// Per-tick counters, refreshed by the stats system.
    pub fn stats(&self) -> FrameStats {
        self.ctx.stats
    }

    /// Takes the impact effects emitted since the last drain.
    pub fn drain_effects(&mut self) -> Vec<ImpactEffect> {
        std::mem::take(&mut self.ctx.effects)
    }

    /// Whether the last scene load failed catastrophically.
    pub fn load_failed(&self) -> bool {
        self.load_failed
    }

    /// Clears the scene back to the empty default state.
    pub fn reset(&mut self) {
        self.ctx.reset();
    }

    /// Loads a persisted scene from JSON.
    ///
    /// The current scene is replaced. Unknown templates and malformed
    /// fields skip or sanitize individual records; only an unparseable
    /// document fails the load, leaving the engine reset and the
    /// load-error flag set.
    pub fn load_scene(&mut self, json: &str) -> LoadReport {
        match parse_scene(json) {
            Ok(scene) => self.apply_scene(&scene),
            Err(err) => {
                tracing::warn!(error = %err, "scene load failed; resetting to empty state");
                self.reset();
                self.load_failed = true;
                LoadReport {
                    failed: true,
                    ..LoadReport::default()
                }
            }
        }
    }

    /// Loads a scene document already parsed (or built) by the host.
    pub fn apply_scene(&mut self, scene: &SceneFile) -> LoadReport {
        self.reset();
        self.load_failed = false;
        self.ctx
            .physics
            .set_gravity(0.0, sanitize_gravity(scene.gravity_y), 0.0);
        self.ctx.textures_enabled = scene.textures_enabled;

        let mut report = LoadReport::default();
        for record in &scene.entities {
            let (position, rotation, scale) = record.sanitized_transform();
            let props = record
                .props
                .map(|p| PhysicsProps::new(p.friction, p.restitution, p.density));
            match spawn_from_template(
                &mut self.ctx,
                &record.template_id,
                position,
                rotation,
                Some(scale),
                props,
            ) {
                Ok(_) => report.spawned += 1,
                Err(SpawnError::UnknownTemplate(id)) => {
                    tracing::warn!(template = %id, "skipping scene entry with unknown template");
                    report.skipped += 1;
                }
            }
        }
        report
    }

    /// Captures the current scene as a persistable document.
    pub fn save_scene(&self) -> SceneFile {
        let world = &self.ctx.world;
        let mut entities: Vec<(Entity, SceneRecord)> = Vec::new();
        for (entity, template) in world.templates.iter() {
            // Projectiles and their ilk are transient; persist only
            // entities that still have a transform and are not in flight.
            if world.projectiles.contains(entity) {
                continue;
            }
            let Some(transform) = world.transforms.get(entity) else {
                continue;
            };
            let mut record = SceneRecord::at_origin(template.0.clone());
            record.position = wreckbox_scene::Vec3Record {
                x: transform.position.x,
                y: transform.position.y,
                z: transform.position.z,
            };
            record.rotation = wreckbox_scene::QuatRecord {
                x: transform.rotation.x,
                y: transform.rotation.y,
                z: transform.rotation.z,
                w: transform.rotation.w,
            };
            record.scale = wreckbox_scene::Vec3Record {
                x: transform.scale.x,
                y: transform.scale.y,
                z: transform.scale.z,
            };
            record.props = world.props.get(entity).map(|p| wreckbox_scene::PropsRecord {
                friction: p.friction(),
                restitution: p.restitution(),
                density: p.density(),
            });
            entities.push((entity, record));
        }
        // Store order is arbitrary; persist deterministically.
        entities.sort_by_key(|(entity, _)| *entity);

        SceneFile {
            gravity_y: self.ctx.physics.gravity.y,
            textures_enabled: self.ctx.textures_enabled,
            entities: entities.into_iter().map(|(_, r)| r).collect(),
        }
    }
}

/// Non-finite persisted gravity falls back to Earth gravity.
fn sanitize_gravity(gravity_y: f32) -> f32 {
    if gravity_y.is_finite() {
        gravity_y
    } else {
        -9.81
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
