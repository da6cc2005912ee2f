//! Wander behavior: the upstream writer for kinematic controllers.
//!
//! Each agent keeps a persistent heading that drifts by bounded seeded
//! noise every tick — continuous steering with no per-frame re-planning.
//! The output is only a target pose on the entity's controller; the
//! locomotion pass owns actually moving through the physics engine.

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use wreckbox_ecs::{System, SystemError, Tick};
use wreckbox_physics::repair::WORLD_EXTENT;

use crate::context::SimContext;
use crate::priority;

/// Upper bound on heading change, in radians per second.
pub const MAX_TURN_RATE: f32 = 1.8;
/// Agents steer back when their target would cross this margin inside the
/// world boundary.
const BOUNDS_MARGIN: f32 = 20.0;

/// Drives every [`WanderAgent`](wreckbox_ecs::WanderAgent).
pub struct WanderSystem {
    rng: Xoshiro256StarStar,
}

impl WanderSystem {
    /// Creates the system with its own seeded noise stream.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Xoshiro256StarStar::seed_from_u64(seed),
        }
    }
}

impl System<SimContext> for WanderSystem {
    fn name(&self) -> &'static str {
        "wander"
    }

    fn priority(&self) -> i32 {
        priority::BEHAVIOR
    }

    fn update(&mut self, ctx: &mut SimContext, tick: &Tick) -> Result<(), SystemError> {
        let dt = tick.delta_secs;
        if dt <= 0.0 {
            return Ok(());
        }
        let limit = WORLD_EXTENT - BOUNDS_MARGIN;

        for (entity, agent) in ctx.world.agents.iter_mut() {
            let Some(controller) = ctx.world.controllers.get_mut(entity) else {
                continue;
            };
            let Some(transform) = ctx.world.transforms.get(entity) else {
                continue;
            };

            agent.heading += self.rng.gen_range(-1.0..1.0_f32) * MAX_TURN_RATE * dt;

            let direction = Vec3::new(agent.heading.cos(), 0.0, agent.heading.sin());
            let mut target = transform.position + direction * agent.speed * dt;

            // Approaching the edge of the world: turn around and stay put
            // this tick rather than walking into the kill bounds.
            if target.x.abs() > limit || target.z.abs() > limit {
                agent.heading += std::f32::consts::PI;
                target = transform.position;
            }

            controller.target_position = target;
            controller.target_rotation = Quat::from_rotation_y(-agent.heading);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wreckbox_config::Config;

    use crate::spawn::spawn_from_template;

    fn tick(frame: u64) -> Tick {
        let dt = 1.0 / 60.0;
        Tick {
            delta_ms: dt * 1000.0,
            delta_secs: dt,
            elapsed_secs: f64::from(dt) * frame as f64,
            frame,
        }
    }

    #[test]
    fn test_agent_writes_targets_within_turn_bound() {
        let mut ctx = SimContext::new(&Config::default());
        let mut system = WanderSystem::new(9);
        let e = spawn_from_template(
            &mut ctx,
            "walker",
            Vec3::new(0.0, 1.0, 0.0),
            Quat::IDENTITY,
            None,
            None,
        )
        .unwrap();

        let heading_before = ctx.world.agents.get(e).unwrap().heading;
        system.update(&mut ctx, &tick(0)).unwrap();
        let agent = ctx.world.agents.get(e).unwrap();

        let dt = 1.0 / 60.0;
        assert!(
            (agent.heading - heading_before).abs() <= MAX_TURN_RATE * dt + 1e-6,
            "heading drift exceeds the turn-rate bound"
        );

        let controller = ctx.world.controllers.get(e).unwrap();
        assert_ne!(controller.target_position, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_agent_turns_back_at_world_edge() {
        let mut ctx = SimContext::new(&Config::default());
        let mut system = WanderSystem::new(9);
        let e = spawn_from_template(
            &mut ctx,
            "walker",
            Vec3::new(WORLD_EXTENT - 1.0, 1.0, 0.0),
            Quat::IDENTITY,
            None,
            None,
        )
        .unwrap();

        // Force a heading straight at the boundary.
        ctx.world.agents.get_mut(e).unwrap().heading = 0.0;
        system.update(&mut ctx, &tick(0)).unwrap();

        let controller = ctx.world.controllers.get(e).unwrap();
        assert!(
            controller.target_position.x <= WORLD_EXTENT - 1.0,
            "target must not cross the boundary"
        );
    }

    #[test]
    fn test_same_seed_same_wander() {
        let run = |seed: u64| {
            let mut ctx = SimContext::new(&Config::default());
            let mut system = WanderSystem::new(seed);
            let e = spawn_from_template(
                &mut ctx,
                "walker",
                Vec3::new(0.0, 1.0, 0.0),
                Quat::IDENTITY,
                None,
                None,
            )
            .unwrap();
            for frame in 0..30 {
                system.update(&mut ctx, &tick(frame)).unwrap();
            }
            ctx.world.agents.get(e).unwrap().heading
        };
        assert_eq!(run(5), run(5));
        assert_ne!(run(5), run(6));
    }
}
