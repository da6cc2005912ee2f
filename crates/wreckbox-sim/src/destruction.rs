//! Destruction and fracture.
//!
//! Two damage sources feed this system: direct damage (projectiles, host
//! calls) and the impact heuristic — a large frame-to-frame velocity delta
//! scaled by mass, over the entity's threshold, converts to damage
//! proportional to the excess. An entity whose health reaches zero is
//! destroyed and replaced by a burst of shard entities approximating
//! momentum transfer without a rigid-fracture solve.

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use rustc_hash::FxHashMap;
use wreckbox_ecs::{Entity, System, SystemError, Tick};
use wreckbox_physics::convert::{to_vec3, to_vector};

use crate::context::SimContext;
use crate::priority;
use crate::spawn::spawn_from_template;
use crate::template::shard_template_for;

/// Shards per cubic meter of destroyed volume.
pub const SHARDS_PER_VOLUME: f32 = 6.0;
/// Fewest shards any fracture produces.
pub const MIN_SHARDS: usize = 6;
/// Most shards any fracture produces.
pub const MAX_SHARDS: usize = 20;
/// Maximum random offset of a shard from the impact origin, in meters.
const SHARD_OFFSET_MAX: f32 = 0.8;
/// Burst speed range added along each shard's offset direction, m/s.
const BURST_SPEED: std::ops::Range<f32> = 4.0..12.0;
/// Fraction of the impact velocity inherited by every shard.
const IMPACT_VELOCITY_FRACTION: f32 = 0.25;
/// Damage per unit of impulse above the entity's impact threshold.
const IMPACT_DAMAGE_SCALE: f32 = 0.35;

/// Shards spawned for a destroyed volume: `clamp(floor(volume · 6), 6, 20)`.
pub fn shard_count(volume: f32) -> usize {
    ((volume * SHARDS_PER_VOLUME).floor() as i64).clamp(MIN_SHARDS as i64, MAX_SHARDS as i64)
        as usize
}

/// Converts sustained impact damage into entity removal and shard spawning.
pub struct DestructionSystem {
    rng: Xoshiro256StarStar,
    /// Last tick's linear velocity per tracked body. Keyed by entity and
    /// pruned against the live set every tick, so churn never grows it
    /// past the live entity count.
    prev_velocity: FxHashMap<Entity, Vec3>,
}

impl DestructionSystem {
    /// Creates the system with a seeded shard-spread generator; a fixed
    /// seed reproduces fracture outcomes exactly.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Xoshiro256StarStar::seed_from_u64(seed),
            prev_velocity: FxHashMap::default(),
        }
    }

    fn apply_impact_damage(&mut self, ctx: &mut SimContext) {
        for (entity, handle) in ctx.physics.registry.iter() {
            let Some(body) = ctx.physics.rigid_body_set.get(handle) else {
                continue;
            };
            if !body.is_dynamic() {
                continue;
            }
            let velocity = to_vec3(&body.linvel());
            let Some(previous) = self.prev_velocity.insert(entity, velocity) else {
                continue;
            };
            let Some(integrity) = ctx.world.integrity.get_mut(entity) else {
                continue;
            };

            let impulse = (velocity - previous).length() * body.mass();
            if impulse > integrity.impact_threshold {
                let damage = (impulse - integrity.impact_threshold) * IMPACT_DAMAGE_SCALE;
                integrity.apply_damage(damage);
                integrity.record_impact(to_vec3(&body.translation()), previous);
            }
        }
    }

    fn fracture(&mut self, ctx: &mut SimContext, entity: Entity) {
        // Capture everything before the entity disappears.
        let Some(transform) = ctx.world.transforms.get(entity).copied() else {
            ctx.destroy_entity(entity);
            return;
        };
        let material = ctx.world.props.get(entity).and_then(|p| p.material);
        let impact = ctx.world.integrity.get(entity).and_then(|i| i.last_impact);
        let (parent_linvel, parent_angvel) = ctx
            .physics
            .registry
            .body_of(entity)
            .and_then(|h| ctx.physics.rigid_body_set.get(h))
            .map(|b| (to_vec3(&b.linvel()), to_vec3(&b.angvel())))
            .unwrap_or((Vec3::ZERO, Vec3::ZERO));

        let shard_id = shard_template_for(material);
        let have_shards = ctx.templates.contains(shard_id);

        ctx.destroy_entity(entity);

        if !have_shards {
            tracing::warn!(
                entity = entity.id(),
                shard_id,
                "shard template missing, fracture aborted"
            );
            return;
        }

        let origin = impact.map(|i| i.point).unwrap_or(transform.position);
        let impact_velocity = impact.map(|i| i.velocity).unwrap_or(Vec3::ZERO);
        let count = shard_count(transform.volume());

        for _ in 0..count {
            let direction = self.random_unit_vector();
            let position = origin + direction * self.rng.gen_range(0.0..SHARD_OFFSET_MAX);
            let velocity = parent_linvel
                + direction * self.rng.gen_range(BURST_SPEED)
                + impact_velocity * IMPACT_VELOCITY_FRACTION;
            let spin = self.rng.gen_range(0.0..std::f32::consts::TAU);

            match spawn_from_template(ctx, shard_id, position, Quat::from_rotation_y(spin), None, None)
            {
                Ok(shard) => {
                    if let Some(handle) = ctx.physics.registry.body_of(shard)
                        && let Some(body) = ctx.physics.rigid_body_set.get_mut(handle)
                    {
                        body.set_linvel(to_vector(velocity), true);
                        body.set_angvel(to_vector(parent_angvel), true);
                    }
                    ctx.stats.shards_spawned += 1;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "shard spawn failed mid-fracture");
                    break;
                }
            }
        }
    }

    fn random_unit_vector(&mut self) -> Vec3 {
        let theta = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let y: f32 = self.rng.gen_range(-1.0..1.0);
        let radial = (1.0 - y * y).sqrt();
        Vec3::new(radial * theta.cos(), y, radial * theta.sin())
    }
}

impl System<SimContext> for DestructionSystem {
    fn name(&self) -> &'static str {
        "destruction"
    }

    fn priority(&self) -> i32 {
        priority::DESTRUCTION
    }

    fn update(&mut self, ctx: &mut SimContext, _tick: &Tick) -> Result<(), SystemError> {
        self.apply_impact_damage(ctx);

        // One-shot triggers: collect first, fracture after, so the store is
        // never mutated while being walked.
        let mut broken = Vec::new();
        for (entity, integrity) in ctx.world.integrity.iter_mut() {
            if integrity.take_destruction_trigger() {
                broken.push(entity);
            }
        }
        for entity in broken {
            self.fracture(ctx, entity);
        }

        // Destructions queued earlier this frame (projectile life/impacts)
        // are committed here, before repair's ghost sweep runs.
        ctx.flush_destroyed();

        self.prev_velocity.retain(|entity, _| ctx.world.is_alive(*entity));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use wreckbox_config::Config;
    use wreckbox_ecs::TemplateId;

    use crate::spawn::spawn_from_template;

    fn ctx() -> SimContext {
        SimContext::new(&Config::default())
    }

    fn tick() -> Tick {
        Tick {
            delta_ms: 16.0,
            delta_secs: 0.016,
            elapsed_secs: 0.016,
            frame: 1,
        }
    }

    #[test]
    fn test_shard_count_respects_bounds() {
        assert_eq!(shard_count(1.0), 6);
        assert_eq!(shard_count(8.0), 20);
        assert_eq!(shard_count(0.01), 6);
        assert_eq!(shard_count(2.0), 12);
        assert_eq!(shard_count(1000.0), 20);
    }

    #[test]
    fn test_broken_entity_fractures_into_material_shards() {
        let mut ctx = ctx();
        let mut system = DestructionSystem::new(7);

        let e = spawn_from_template(
            &mut ctx,
            "crate",
            Vec3::new(0.0, 5.0, 0.0),
            Quat::IDENTITY,
            None,
            None,
        )
        .unwrap();
        ctx.world.integrity.get_mut(e).unwrap().apply_damage(80.0);
        system.update(&mut ctx, &tick()).unwrap();
        assert!(ctx.world.is_alive(e), "80 damage is not enough");

        ctx.world.integrity.get_mut(e).unwrap().apply_damage(80.0);
        system.update(&mut ctx, &tick()).unwrap();

        assert!(!ctx.world.is_alive(e));
        // Unit-volume crate: exactly 6 shards, all wood.
        let shards: Vec<_> = ctx
            .world
            .templates
            .iter()
            .filter(|(_, t)| t.0 == "shard_wood")
            .map(|(e, _)| e)
            .collect();
        assert_eq!(shards.len(), 6);
        assert_eq!(ctx.world.entity_count(), 6);
    }

    #[test]
    fn test_large_volume_caps_at_max_shards() {
        let mut ctx = ctx();
        let mut system = DestructionSystem::new(7);

        let e = spawn_from_template(
            &mut ctx,
            "crate",
            Vec3::new(0.0, 5.0, 0.0),
            Quat::IDENTITY,
            Some(Vec3::splat(2.0)), // volume 8 → floor(48) clamped to 20
            None,
        )
        .unwrap();
        ctx.world.integrity.get_mut(e).unwrap().apply_damage(1000.0);
        system.update(&mut ctx, &tick()).unwrap();

        assert_eq!(ctx.world.entity_count(), MAX_SHARDS);
    }

    #[test]
    fn test_fracture_is_one_shot() {
        let mut ctx = ctx();
        let mut system = DestructionSystem::new(7);

        let e = spawn_from_template(
            &mut ctx,
            "glass_pane",
            Vec3::new(0.0, 5.0, 0.0),
            Quat::IDENTITY,
            None,
            None,
        )
        .unwrap();
        ctx.world.integrity.get_mut(e).unwrap().apply_damage(500.0);
        system.update(&mut ctx, &tick()).unwrap();
        let after_first = ctx.world.entity_count();

        // Nothing further to trigger: shards are inert and the original is
        // gone.
        system.update(&mut ctx, &tick()).unwrap();
        assert_eq!(ctx.world.entity_count(), after_first);
    }

    #[test]
    fn test_shards_inherit_parent_velocity() {
        let mut ctx = ctx();
        let mut system = DestructionSystem::new(7);

        let e = spawn_from_template(
            &mut ctx,
            "crate",
            Vec3::new(0.0, 5.0, 0.0),
            Quat::IDENTITY,
            None,
            None,
        )
        .unwrap();
        let handle = ctx.physics.registry.body_of(e).unwrap();
        ctx.physics.rigid_body_set[handle]
            .set_linvel(to_vector(Vec3::new(30.0, 0.0, 0.0)), true);
        ctx.world.integrity.get_mut(e).unwrap().apply_damage(500.0);
        system.update(&mut ctx, &tick()).unwrap();

        // Average shard velocity should be dominated by the parent's 30 m/s
        // along +X; the burst component (4–12 m/s) is isotropic.
        let mut mean_vx = 0.0;
        let mut count = 0;
        for (shard, _) in ctx.world.templates.iter() {
            let h = ctx.physics.registry.body_of(shard).unwrap();
            mean_vx += ctx.physics.rigid_body_set[h].linvel().x;
            count += 1;
        }
        mean_vx /= count as f32;
        assert!(count >= 6);
        assert!(mean_vx > 15.0, "shards should carry parent momentum: {mean_vx}");
    }

    #[test]
    fn test_impact_heuristic_converts_velocity_delta_to_damage() {
        let mut ctx = ctx();
        let mut system = DestructionSystem::new(7);

        let e = spawn_from_template(
            &mut ctx,
            "crate",
            Vec3::new(0.0, 5.0, 0.0),
            Quat::IDENTITY,
            None,
            None,
        )
        .unwrap();
        let handle = ctx.physics.registry.body_of(e).unwrap();

        // Record a baseline velocity, then simulate a hard stop (crash).
        ctx.physics.rigid_body_set[handle]
            .set_linvel(to_vector(Vec3::new(1000.0, 0.0, 0.0)), true);
        system.update(&mut ctx, &tick()).unwrap();
        ctx.physics.rigid_body_set[handle].set_linvel(to_vector(Vec3::ZERO), true);
        system.update(&mut ctx, &tick()).unwrap();

        // The mass-scaled Δv far exceeds the crate's threshold of 150, so
        // either health dropped or the crate already fractured.
        match ctx.world.integrity.get(e) {
            Some(integrity) => assert!(integrity.health() < integrity.max_health()),
            None => assert!(!ctx.world.is_alive(e), "crate fractured outright"),
        }
    }

    #[test]
    fn test_fixed_seed_reproduces_shard_positions() {
        let positions = |seed: u64| -> Vec<Vec3> {
            let mut ctx = ctx();
            let mut system = DestructionSystem::new(seed);
            let e = spawn_from_template(
                &mut ctx,
                "crate",
                Vec3::new(0.0, 5.0, 0.0),
                Quat::IDENTITY,
                None,
                None,
            )
            .unwrap();
            ctx.world.integrity.get_mut(e).unwrap().apply_damage(500.0);
            system.update(&mut ctx, &tick()).unwrap();
            let mut out: Vec<(u64, Vec3)> = ctx
                .world
                .transforms
                .iter()
                .map(|(e, t)| (e.id(), t.position))
                .collect();
            out.sort_by_key(|(id, _)| *id);
            out.into_iter().map(|(_, p)| p).collect()
        };

        assert_eq!(positions(42), positions(42));
        assert_ne!(positions(42), positions(43));
    }

    #[test]
    fn test_shard_template_tags_match_material() {
        let mut ctx = ctx();
        let mut system = DestructionSystem::new(7);

        let e = spawn_from_template(
            &mut ctx,
            "metal_plate",
            Vec3::new(0.0, 5.0, 0.0),
            Quat::IDENTITY,
            None,
            None,
        )
        .unwrap();
        ctx.world.integrity.get_mut(e).unwrap().apply_damage(10_000.0);
        system.update(&mut ctx, &tick()).unwrap();

        for (_, template) in ctx.world.templates.iter() {
            assert_eq!(template, &TemplateId::new("shard_metal"));
        }
    }
}
