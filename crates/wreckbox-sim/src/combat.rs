//! Combat: projectile life, drag, and impact resolution.
//!
//! Projectiles are short-lived ballistic entities. Every tick each one
//! loses life and speed (quadratic drag); a projectile that outlives its
//! timer or stalls below the threshold is queued for destruction — drag
//! must never produce an infinite asymptotic crawl. Collision starts
//! against non-owner, non-projectile targets resolve damage, impulse
//! transfer and an impact effect, and always consume the projectile.

use rustc_hash::FxHashSet;
use wreckbox_ecs::{Entity, System, SystemError, Tick};
use wreckbox_physics::ContactEvent;
use wreckbox_physics::convert::{to_vec3, to_vector};

use crate::context::{ImpactEffect, SimContext};
use crate::priority;

/// Quadratic drag constant `k` in `F = -k |v|² v̂`.
pub const DRAG_COEFFICIENT: f32 = 0.005;
/// Speed below which a projectile counts as stalled and is destroyed.
pub const STALL_SPEED: f32 = 2.0;

/// Simulates projectile entities and resolves their impacts.
///
/// Collision events are drained from the physics engine's channel, so the
/// contacts handled here are the ones produced by the previous frame's
/// step — one frame of latency, the same as the renderer sees.
pub struct CombatSystem;

impl CombatSystem {
    /// Creates the system.
    pub fn new() -> Self {
        Self
    }

    fn age_and_drag(&self, ctx: &mut SimContext, dt: f32) {
        let mut dead = Vec::new();

        for (entity, projectile) in ctx.world.projectiles.iter_mut() {
            projectile.life_secs -= dt;
            if projectile.life_secs <= 0.0 {
                dead.push(entity);
                continue;
            }

            let Some(handle) = ctx.physics.registry.body_of(entity) else {
                continue;
            };
            let Some(body) = ctx.physics.rigid_body_set.get_mut(handle) else {
                continue;
            };

            let velocity = body.linvel();
            let speed = velocity.length();
            if speed > 0.0 {
                // Integrate F = -k|v|²v̂ as an impulse over dt, capped so a
                // coarse step can stop the projectile but never reverse it.
                let magnitude =
                    (DRAG_COEFFICIENT * speed * speed * dt).min(body.mass() * speed);
                body.apply_impulse(-velocity * (magnitude / speed), true);
            }
            if body.linvel().length() < STALL_SPEED {
                dead.push(entity);
            }
        }

        for entity in dead {
            ctx.world.queue_destroy(entity);
        }
    }

    fn resolve_impacts(&self, ctx: &mut SimContext, contacts: &[ContactEvent]) {
        let mut spent: FxHashSet<Entity> = FxHashSet::default();

        for contact in contacts.iter().filter(|c| c.started) {
            let pair = [(contact.a, contact.b), (contact.b, contact.a)];
            for (projectile, target) in pair {
                if !ctx.world.projectiles.contains(projectile) {
                    continue;
                }
                if ctx.world.projectiles.contains(target) {
                    // Projectile-projectile grazes resolve against nothing.
                    continue;
                }
                self.resolve_hit(ctx, projectile, target, &mut spent);
            }
        }
    }

    fn resolve_hit(
        &self,
        ctx: &mut SimContext,
        projectile: Entity,
        target: Entity,
        spent: &mut FxHashSet<Entity>,
    ) {
        if spent.contains(&projectile) {
            return;
        }
        let Some(data) = ctx.world.projectiles.get(projectile).copied() else {
            return;
        };
        if target == data.owner {
            // Never self-damage; typically the muzzle contact right after
            // firing.
            return;
        }

        let (point, velocity) = ctx
            .physics
            .registry
            .body_of(projectile)
            .and_then(|h| ctx.physics.rigid_body_set.get(h))
            .map(|b| (to_vec3(&b.translation()), to_vec3(&b.linvel())))
            .unwrap_or_else(|| {
                let p = ctx
                    .world
                    .transforms
                    .get(projectile)
                    .map(|t| t.position)
                    .unwrap_or_default();
                (p, glam::Vec3::ZERO)
            });
        let direction = velocity.normalize_or_zero();

        ctx.effects.push(ImpactEffect { point, direction });

        if let Some(integrity) = ctx.world.integrity.get_mut(target) {
            integrity.apply_damage(data.damage);
            integrity.record_impact(point, velocity);
        }

        if let Some(handle) = ctx.physics.registry.body_of(target)
            && let Some(body) = ctx.physics.rigid_body_set.get_mut(handle)
            && body.is_dynamic()
        {
            body.apply_impulse(to_vector(direction * data.impulse), true);
        }

        // Single-use: the projectile dies whatever it hit.
        spent.insert(projectile);
        ctx.world.queue_destroy(projectile);
    }
}

impl Default for CombatSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System<SimContext> for CombatSystem {
    fn name(&self) -> &'static str {
        "combat"
    }

    fn priority(&self) -> i32 {
        priority::COMBAT
    }

    fn update(&mut self, ctx: &mut SimContext, tick: &Tick) -> Result<(), SystemError> {
        self.age_and_drag(ctx, tick.delta_secs);
        let contacts = ctx.physics.drain_contacts();
        self.resolve_impacts(ctx, &contacts);
        Ok(())
    }
}

#[cfg(test)]
#[path = "combat_tests.rs"]
mod tests;
