//! Buoyancy: per-substep fluid forces for flagged entities.
//!
//! The water surface is a deterministic sum of three directional waves, so
//! any system (and any test) can evaluate the exact same height field from
//! the simulation time alone. Entities without the `Buoyant` marker never
//! reach this code path.

use glam::{Vec2, Vec3};
use wreckbox_ecs::World;

use crate::PhysicsWorld;
use crate::convert::to_vector;

/// Gravitational acceleration used for buoyant force, m/s².
pub const GRAVITY_ACCEL: f32 = 9.81;
/// Sub-steps per tick for the submersion integral.
pub const SUBSTEPS: u32 = 3;
/// Linear term of the hydrodynamic drag coefficient.
const LINEAR_DRAG: f32 = 0.8;
/// Quadratic (speed-proportional) term of the drag coefficient.
const QUADRATIC_DRAG: f32 = 0.25;
/// Angular drag coefficient opposing spin while submerged.
const ANGULAR_DRAG: f32 = 0.6;

/// One directional wave component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveComponent {
    /// Horizontal travel direction (normalized).
    pub direction: Vec2,
    /// Spatial frequency in rad/m.
    pub frequency: f32,
    /// Phase speed in rad/s.
    pub speed: f32,
    /// Height amplitude in meters.
    pub amplitude: f32,
}

/// The water surface: base level plus three fixed wave components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterField {
    /// Resting water level (y).
    pub base_level: f32,
    /// The three directional components summed into the surface.
    pub waves: [WaveComponent; 3],
    /// Fluid density in the buoyant-force term.
    pub fluid_density: f32,
}

impl Default for WaterField {
    fn default() -> Self {
        Self {
            base_level: 0.0,
            waves: [
                WaveComponent {
                    direction: Vec2::new(1.0, 0.0),
                    frequency: 0.16,
                    speed: 0.9,
                    amplitude: 0.35,
                },
                WaveComponent {
                    direction: Vec2::new(0.6, 0.8),
                    frequency: 0.23,
                    speed: 1.3,
                    amplitude: 0.2,
                },
                WaveComponent {
                    direction: Vec2::new(-0.8, 0.6),
                    frequency: 0.31,
                    speed: 0.7,
                    amplitude: 0.12,
                },
            ],
            fluid_density: 1.0,
        }
    }
}

impl WaterField {
    /// A flat surface at `base_level` (zero amplitudes); used by tests and
    /// by scenes without waves.
    pub fn flat(base_level: f32) -> Self {
        let mut field = Self::default();
        field.base_level = base_level;
        for wave in &mut field.waves {
            wave.amplitude = 0.0;
        }
        field
    }

    /// Water surface height at `(x, z)` at simulation time `time`.
    pub fn height_at(&self, x: f32, z: f32, time: f64) -> f32 {
        let t = time as f32;
        let p = Vec2::new(x, z);
        let [w0, w1, w2] = self.waves;
        self.base_level
            + w0.amplitude * (w0.direction.dot(p) * w0.frequency + t * w0.speed).sin()
            + w1.amplitude * (w1.direction.dot(p) * w1.frequency + t * w1.speed).cos()
            + w2.amplitude * (w2.direction.dot(p) * w2.frequency + t * w2.speed).sin()
    }
}

/// Applies buoyant impulses and hydrodynamic drag to every flagged entity
/// with a dynamic body.
///
/// The submerged fraction is integrated over [`SUBSTEPS`] predicted
/// positions (linear extrapolation from current velocity) and averaged; the
/// result is applied as an impulse only when positive — water never pulls a
/// body down.
pub fn apply_buoyancy(world: &World, physics: &mut PhysicsWorld, water: &WaterField, time: f64, dt: f32) {
    if dt <= 0.0 {
        return;
    }
    for (entity, _) in world.buoyant.iter() {
        let Some(handle) = physics.registry.body_of(entity) else {
            continue;
        };
        let Some(body) = physics.rigid_body_set.get_mut(handle) else {
            continue;
        };
        if !body.is_dynamic() {
            continue;
        }

        let volume = world
            .transforms
            .get(entity)
            .map(|t| t.volume())
            .unwrap_or(1.0)
            .max(1e-3);
        let characteristic_len = volume.cbrt();

        let pos = body.translation();
        let vel = body.linvel();
        let level = water.height_at(pos.x, pos.z, time);

        let mut accumulated = 0.0;
        for i in 0..SUBSTEPS {
            let t_offset = dt * i as f32 / SUBSTEPS as f32;
            let predicted_y = pos.y + vel.y * t_offset;
            let depth = level - predicted_y;
            let submerged = (depth / characteristic_len).clamp(0.0, 1.0);
            accumulated += water.fluid_density * submerged * volume * GRAVITY_ACCEL;
        }
        let force = accumulated / SUBSTEPS as f32;

        if force > 0.0 {
            body.apply_impulse(to_vector(Vec3::new(0.0, force * dt, 0.0)), true);

            // Submerged this tick: oppose motion with combined
            // linear+quadratic drag over the cross-sectional area, and damp
            // spin.
            let speed = vel.length();
            let cross_section = volume.powf(2.0 / 3.0);
            let drag =
                (LINEAR_DRAG + QUADRATIC_DRAG * speed) * cross_section * water.fluid_density;
            body.apply_impulse(-vel * drag * dt, true);

            let angvel = body.angvel();
            body.apply_torque_impulse(-angvel * ANGULAR_DRAG * cross_section * dt, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wreckbox_ecs::{Buoyant, PhysicsProps, Transform};

    use crate::{BodyKind, BodyShape};

    fn spawn_buoy(world: &mut World, physics: &mut PhysicsWorld, at: Vec3) -> wreckbox_ecs::Entity {
        let e = world.spawn_entity();
        let transform = Transform::at(at);
        world.transforms.insert(e, transform);
        world.buoyant.insert(e, Buoyant);
        physics.spawn_body(
            e,
            BodyKind::Dynamic,
            &transform,
            &PhysicsProps::new(0.5, 0.0, 1.0),
            &BodyShape::Cuboid {
                half_extents: Vec3::splat(0.5),
            },
        );
        e
    }

    #[test]
    fn test_body_above_water_receives_no_impulse() {
        let mut world = World::new();
        let mut physics = PhysicsWorld::new();
        let water = WaterField::flat(0.0);

        let e = spawn_buoy(&mut world, &mut physics, Vec3::new(0.0, 5.0, 0.0));
        apply_buoyancy(&world, &mut physics, &water, 0.0, 1.0 / 60.0);

        let handle = physics.registry.body_of(e).unwrap();
        assert_eq!(
            physics.rigid_body_set[handle].linvel().length(),
            0.0,
            "no buoyant impulse above the surface"
        );
    }

    #[test]
    fn test_fully_submerged_body_receives_full_impulse() {
        let mut world = World::new();
        let mut physics = PhysicsWorld::new();
        let water = WaterField::flat(0.0);
        let dt = 1.0 / 60.0;

        // Unit cube (volume 1, characteristic length 1) resting at exactly
        // -characteristic_len: fully submerged at every substep.
        let e = spawn_buoy(&mut world, &mut physics, Vec3::new(0.0, -1.0, 0.0));
        apply_buoyancy(&world, &mut physics, &water, 0.0, dt);

        let handle = physics.registry.body_of(e).unwrap();
        let body = &physics.rigid_body_set[handle];
        // impulse = density * volume * g * dt; Δv = impulse / mass, and the
        // unit cube at density 1 has mass 1.
        let expected_dv = water.fluid_density * 1.0 * GRAVITY_ACCEL * dt;
        let dv = body.linvel().y;
        // Drag opposes velocity, but velocity was zero before the impulse,
        // so the only downward correction is the drag on the new velocity —
        // which is applied against the pre-impulse (zero) velocity, hence
        // none at all this tick.
        assert!(
            (dv - expected_dv).abs() < expected_dv * 0.05,
            "expected Δv≈{expected_dv}, got {dv}"
        );
    }

    #[test]
    fn test_non_buoyant_entity_is_skipped() {
        let mut world = World::new();
        let mut physics = PhysicsWorld::new();
        let water = WaterField::flat(0.0);

        // Same submerged pose, but no Buoyant marker.
        let e = world.spawn_entity();
        let transform = Transform::at(Vec3::new(0.0, -1.0, 0.0));
        world.transforms.insert(e, transform);
        physics.spawn_body(
            e,
            BodyKind::Dynamic,
            &transform,
            &PhysicsProps::default(),
            &BodyShape::Cuboid {
                half_extents: Vec3::splat(0.5),
            },
        );

        apply_buoyancy(&world, &mut physics, &water, 0.0, 1.0 / 60.0);
        let handle = physics.registry.body_of(e).unwrap();
        assert_eq!(physics.rigid_body_set[handle].linvel().length(), 0.0);
    }

    #[test]
    fn test_flat_field_ignores_time_and_position() {
        let water = WaterField::flat(2.0);
        assert_eq!(water.height_at(0.0, 0.0, 0.0), 2.0);
        assert_eq!(water.height_at(100.0, -40.0, 9.5), 2.0);
    }

    #[test]
    fn test_wavy_field_is_deterministic() {
        let water = WaterField::default();
        let a = water.height_at(3.0, -7.0, 1.25);
        let b = water.height_at(3.0, -7.0, 1.25);
        assert_eq!(a, b);
        // Amplitudes bound the surface excursion.
        let max_amp: f32 = water.waves.iter().map(|w| w.amplitude).sum();
        assert!((a - water.base_level).abs() <= max_amp);
    }

    #[test]
    fn test_submerged_moving_body_is_dragged() {
        let mut world = World::new();
        let mut physics = PhysicsWorld::new();
        let water = WaterField::flat(0.0);

        let e = spawn_buoy(&mut world, &mut physics, Vec3::new(0.0, -2.0, 0.0));
        let handle = physics.registry.body_of(e).unwrap();
        physics.rigid_body_set[handle].set_linvel(to_vector(Vec3::new(8.0, 0.0, 0.0)), true);

        apply_buoyancy(&world, &mut physics, &water, 0.0, 1.0 / 60.0);
        let vx = physics.rigid_body_set[handle].linvel().x;
        assert!(vx < 8.0, "horizontal drag must slow the body: vx={vx}");
        assert!(vx > 0.0, "drag must not reverse motion in one tick");
    }
}
