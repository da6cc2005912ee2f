//! Scheduler wrappers for the physics- and render-side passes.
//!
//! The pure passes live in their own crates; these adapters give each a
//! priority slot and the borrows it needs from the tick context.

use wreckbox_ecs::{System, SystemError, Tick};
use wreckbox_physics::buoyancy::apply_buoyancy;
use wreckbox_physics::locomotion::drive_kinematics;
use wreckbox_physics::repair::repair_pass;
use wreckbox_physics::sync::{sync_dragged_to_physics, sync_physics_to_visuals};
use wreckbox_render::run_culling;

use crate::context::SimContext;
use crate::priority;

/// Commits kinematic move targets through the character controller.
pub struct LocomotionSystem;

impl System<SimContext> for LocomotionSystem {
    fn name(&self) -> &'static str {
        "locomotion"
    }

    fn priority(&self) -> i32 {
        priority::LOCOMOTION
    }

    fn update(&mut self, ctx: &mut SimContext, tick: &Tick) -> Result<(), SystemError> {
        drive_kinematics(&mut ctx.world, &mut ctx.physics, tick.delta_secs);
        Ok(())
    }
}

/// Applies fluid forces to flagged entities.
pub struct BuoyancySystem;

impl System<SimContext> for BuoyancySystem {
    fn name(&self) -> &'static str {
        "buoyancy"
    }

    fn priority(&self) -> i32 {
        priority::BUOYANCY
    }

    fn update(&mut self, ctx: &mut SimContext, tick: &Tick) -> Result<(), SystemError> {
        if ctx.water_enabled {
            apply_buoyancy(
                &ctx.world,
                &mut ctx.physics,
                &ctx.water,
                tick.elapsed_secs,
                tick.delta_secs,
            );
        }
        Ok(())
    }
}

/// Drag override, the physics step, then physics → visual sync.
pub struct PhysicsSystem;

impl System<SimContext> for PhysicsSystem {
    fn name(&self) -> &'static str {
        "physics"
    }

    fn priority(&self) -> i32 {
        priority::PHYSICS
    }

    fn update(&mut self, ctx: &mut SimContext, tick: &Tick) -> Result<(), SystemError> {
        sync_dragged_to_physics(&mut ctx.physics, &ctx.world);
        ctx.physics.step(tick.delta_secs);

        let mut graph = ctx.graph.borrow_mut();
        let mut spatial = ctx.spatial.borrow_mut();
        sync_physics_to_visuals(&ctx.physics, &mut ctx.world, &mut graph, &mut spatial);
        Ok(())
    }
}

/// Post-sync consistency enforcement and the ghost-body sweep.
pub struct RepairSystem;

impl System<SimContext> for RepairSystem {
    fn name(&self) -> &'static str {
        "repair"
    }

    fn priority(&self) -> i32 {
        priority::REPAIR
    }

    fn update(&mut self, ctx: &mut SimContext, _tick: &Tick) -> Result<(), SystemError> {
        let report = {
            let mut graph = ctx.graph.borrow_mut();
            repair_pass(&mut ctx.physics, &mut ctx.world, &mut graph)
        };
        ctx.stats.absorb_repair(report);
        // Bounds violations queued by the pass are committed immediately;
        // the graph borrow above is already released.
        ctx.flush_destroyed();
        Ok(())
    }
}

/// Camera-distance culling over the spatial index. The incremental state
/// lives on the context so scene reloads can clear it alongside everything
/// else.
pub struct CullingSystem;

impl System<SimContext> for CullingSystem {
    fn name(&self) -> &'static str {
        "culling"
    }

    fn priority(&self) -> i32 {
        priority::CULLING
    }

    fn update(&mut self, ctx: &mut SimContext, _tick: &Tick) -> Result<(), SystemError> {
        let mut graph = ctx.graph.borrow_mut();
        let spatial = ctx.spatial.borrow();
        run_culling(
            &mut graph,
            &spatial,
            &ctx.world.transforms,
            &mut ctx.culling,
            ctx.camera_position,
            ctx.world.selected(),
        );
        Ok(())
    }
}

/// Writes instance matrices for slots whose visibility flipped and for
/// dynamic slots; everything else in the buffers is left untouched.
pub struct InstancingSystem;

impl System<SimContext> for InstancingSystem {
    fn name(&self) -> &'static str {
        "instancing"
    }

    fn priority(&self) -> i32 {
        priority::INSTANCING
    }

    fn update(&mut self, ctx: &mut SimContext, _tick: &Tick) -> Result<(), SystemError> {
        let mut graph = ctx.graph.borrow_mut();
        let mut pools = ctx.pools.borrow_mut();

        for entity in graph.drain_visibility_changes() {
            match graph.is_visible(entity) {
                Some(true) => {
                    if let Some(matrix) = graph.transform_of(entity) {
                        pools.write(entity, matrix);
                    }
                }
                Some(false) => pools.write_retired(entity),
                None => {}
            }
        }

        for entity in pools.dynamic_entities() {
            if graph.is_visible(entity) == Some(true)
                && let Some(matrix) = graph.transform_of(entity)
            {
                pools.write(entity, matrix);
            }
        }
        Ok(())
    }
}

/// Refreshes the per-tick counters and optionally logs them.
pub struct StatsSystem;

impl System<SimContext> for StatsSystem {
    fn name(&self) -> &'static str {
        "stats"
    }

    fn priority(&self) -> i32 {
        priority::STATS
    }

    fn update(&mut self, ctx: &mut SimContext, tick: &Tick) -> Result<(), SystemError> {
        ctx.stats.frame = tick.frame;
        ctx.stats.entities = ctx.world.entity_count();
        ctx.stats.bodies = ctx.physics.body_count();
        ctx.stats.visible_nodes = ctx.graph.borrow().visible_count();
        ctx.stats.live_instances = ctx.pools.borrow().live();

        if ctx.stats_interval > 0 && tick.frame % u64::from(ctx.stats_interval) == 0 {
            tracing::info!(
                frame = ctx.stats.frame,
                entities = ctx.stats.entities,
                bodies = ctx.stats.bodies,
                visible = ctx.stats.visible_nodes,
                instances = ctx.stats.live_instances,
                "frame stats"
            );
        }
        Ok(())
    }
}
