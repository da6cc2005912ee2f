//! Simulation layer: spawn templates, the entity assembler, destruction and
//! fracture, projectiles, wander behavior, and the [`Engine`] facade that
//! wires every system into the scheduler in the load-bearing frame order.

pub mod agents;
pub mod combat;
pub mod context;
pub mod destruction;
pub mod engine;
pub mod spawn;
pub mod systems;
pub mod template;

pub use context::{FrameStats, ImpactEffect, SimContext};
pub use engine::{Engine, LoadReport};
pub use spawn::{SpawnError, fire_projectile, spawn_from_template};
pub use template::{Template, TemplateRegistry, shard_template_for};

/// Fixed execution priorities for every engine system. The order is
/// load-bearing: destruction runs after the physics step so impact
/// velocities are current, and before repair so the ghost sweep sees the
/// post-destruction body set.
pub mod priority {
    /// Wander steering and other behavior writers.
    pub const BEHAVIOR: i32 = 200;
    /// Kinematic character movement.
    pub const LOCOMOTION: i32 = 300;
    /// Fluid forces.
    pub const BUOYANCY: i32 = 350;
    /// Projectile life, drag and impact resolution.
    pub const COMBAT: i32 = 400;
    /// Drag override, physics step, physics → visual sync.
    pub const PHYSICS: i32 = 500;
    /// Impact damage and fracture.
    pub const DESTRUCTION: i32 = 600;
    /// Corruption/bounds/velocity repair and the ghost-body sweep.
    pub const REPAIR: i32 = 700;
    /// Camera-distance culling.
    pub const CULLING: i32 = 800;
    /// Instance-buffer updates for changed or dynamic slots.
    pub const INSTANCING: i32 = 850;
    /// Frame statistics.
    pub const STATS: i32 = 900;
}
