//! Headless sandbox demo: builds a scene, shoots at it, and lets the
//! engine run for a few simulated seconds.
//!
//! Useful as a smoke test of the whole system stack (spawn → behavior →
//! physics → destruction → repair → culling) and as a wiring example for
//! embedding hosts. Configuration is read from `wreckbox.ron` next to the
//! working directory if present.

use std::path::Path;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use wreckbox_config::Config;
use wreckbox_sim::Engine;

/// Simulated frames to run (at 60 Hz).
const FRAMES: u32 = 600;
/// Frame delta handed to the engine, in milliseconds.
const FRAME_MS: f32 = 1000.0 / 60.0;

fn main() {
    let config = Config::load_or_default(Path::new("wreckbox.ron"));
    wreckbox_log::init_logging(Some(&config));

    let mut engine = Engine::new(&config);
    let mut rng = Xoshiro256StarStar::seed_from_u64(config.sim.rng_seed);

    build_scene(&mut engine, &mut rng);
    tracing::info!(entities = engine.world().entity_count(), "scene built");

    let shooter = engine
        .spawn("crate", Vec3::new(0.0, 1.0, 25.0))
        .expect("shooter spawn");
    engine.set_camera(Vec3::new(0.0, 8.0, 30.0));

    for frame in 0..FRAMES {
        // Every half second, fire into the stacks.
        if frame % 30 == 0 {
            let target = Vec3::new(rng.gen_range(-6.0..6.0), rng.gen_range(0.5..3.0), 0.0);
            let origin = Vec3::new(0.0, 2.0, 24.0);
            let direction = (target - origin).normalize();
            if let Err(err) = engine.fire(shooter, origin, direction, 90.0) {
                tracing::warn!(error = %err, "projectile spawn failed");
            }
        }

        engine.tick(FRAME_MS);

        for effect in engine.drain_effects() {
            tracing::debug!(point = ?effect.point, "impact");
        }
    }

    let stats = engine.stats();
    tracing::info!(
        frames = stats.frame,
        entities = stats.entities,
        bodies = stats.bodies,
        visible = stats.visible_nodes,
        shards = stats.shards_spawned,
        projectiles = stats.projectiles_fired,
        ghosts_removed = stats.ghost_bodies_removed,
        "demo finished"
    );
}

/// A small town square: pillar ring, crate stacks, glass, floaters, and a
/// few wandering agents.
fn build_scene(engine: &mut Engine, rng: &mut Xoshiro256StarStar) {
    for i in 0..12 {
        let angle = i as f32 / 12.0 * std::f32::consts::TAU;
        let position = Vec3::new(angle.cos() * 18.0, 2.0, angle.sin() * 18.0);
        engine.spawn("pillar", position).expect("pillar spawn");
    }

    for x in -2..=2 {
        for level in 0..3 {
            let position = Vec3::new(x as f32 * 1.2, 0.5 + level as f32 * 1.05, 0.0);
            engine.spawn("crate", position).expect("crate spawn");
        }
    }

    for i in 0..4 {
        let position = Vec3::new(-4.0 + i as f32 * 2.5, 1.0, -4.0);
        engine.spawn("glass_pane", position).expect("glass spawn");
    }

    engine
        .spawn("stone_block", Vec3::new(4.0, 0.5, -4.0))
        .expect("stone spawn");
    engine
        .spawn("metal_plate", Vec3::new(6.0, 0.5, -4.0))
        .expect("metal spawn");

    // Open water starts past the ground slab's half-extent.
    for i in 0..3 {
        let position = Vec3::new(230.0 + i as f32 * 2.0, -1.0, 230.0);
        engine.spawn("buoy", position).expect("buoy spawn");
    }
    engine
        .spawn("raft", Vec3::new(240.0, 0.5, 228.0))
        .expect("raft spawn");

    for _ in 0..5 {
        let position = Vec3::new(rng.gen_range(-12.0..12.0), 0.95, rng.gen_range(-12.0..12.0));
        engine.spawn("walker", position).expect("walker spawn");
    }
}
