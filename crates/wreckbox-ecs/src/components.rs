//! Component types shared across all engine subsystems.
//!
//! Every type here is plain data keyed by [`Entity`](crate::Entity) in a
//! [`ComponentStore`](crate::ComponentStore). Validation that the rest of the
//! engine relies on (friction/restitution ranges, positive density,
//! monotonically decreasing health) is enforced at the constructors and
//! mutators rather than re-checked by every consumer.

use glam::{Mat4, Quat, Vec3};

/// Friction ceiling accepted by [`PhysicsProps`].
pub const MAX_FRICTION: f32 = 5.0;
/// Restitution ceiling accepted by [`PhysicsProps`].
pub const MAX_RESTITUTION: f32 = 2.0;
/// Smallest density accepted by [`PhysicsProps`]; zero or negative density
/// is meaningless to the physics engine.
pub const MIN_DENSITY: f32 = 1e-3;

/// Position, orientation and scale of an entity.
///
/// Scale components must stay finite and positive; the repair pass enforces
/// this every tick for entities that picked up numerical corruption.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// World-space position in meters.
    pub position: Vec3,
    /// Orientation as a unit quaternion.
    pub rotation: Quat,
    /// Per-axis scale, each component > 0.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Creates a transform at `position` with identity rotation and unit scale.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Model matrix for the renderer boundary.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Whether position, rotation and scale are all finite.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }

    /// Volume of the unit shape under this scale (`x * y * z`).
    pub fn volume(&self) -> f32 {
        self.scale.x * self.scale.y * self.scale.z
    }
}

/// Whether an entity participates in physics as immovable geometry or as a
/// fully simulated body. Carried on the `Created` lifecycle event so the
/// spatial index can route the entity to the right structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyClass {
    /// Immovable; indexed in the static grid, culled incrementally.
    Static,
    /// Simulated or kinematic; re-evaluated every tick.
    Dynamic,
}

/// Material tag selecting destruction and impact behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Material {
    Glass,
    Ice,
    Wood,
    Metal,
    Titanium,
    Stone,
}

impl Material {
    /// Parses the tag used by spawn templates and persisted scenes.
    /// Unknown tags map to `None` (generic rubble behavior).
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "glass" => Some(Self::Glass),
            "ice" => Some(Self::Ice),
            "wood" => Some(Self::Wood),
            "metal" => Some(Self::Metal),
            "titanium" => Some(Self::Titanium),
            "stone" => Some(Self::Stone),
            _ => None,
        }
    }
}

/// Surface and mass properties handed to the physics engine at body creation.
///
/// Out-of-range inputs are clamped rather than rejected: a persisted scene or
/// a scripted spawner feeding friction 7 gets the ceiling of 5, not an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsProps {
    friction: f32,
    restitution: f32,
    density: f32,
    /// Material tag used to pick shard archetypes on fracture.
    pub material: Option<Material>,
}

impl PhysicsProps {
    /// Creates props, clamping friction to `[0, 5]`, restitution to `[0, 2]`
    /// and density to `> 0`.
    pub fn new(friction: f32, restitution: f32, density: f32) -> Self {
        Self {
            friction: friction.clamp(0.0, MAX_FRICTION),
            restitution: restitution.clamp(0.0, MAX_RESTITUTION),
            density: density.max(MIN_DENSITY),
            material: None,
        }
    }

    /// Attaches a material tag.
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    /// Friction coefficient, guaranteed within `[0, 5]`.
    pub fn friction(&self) -> f32 {
        self.friction
    }

    /// Restitution, guaranteed within `[0, 2]`.
    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    /// Density, guaranteed positive.
    pub fn density(&self) -> f32 {
        self.density
    }

    /// Replaces friction, clamped to the legal range.
    pub fn set_friction(&mut self, friction: f32) {
        self.friction = friction.clamp(0.0, MAX_FRICTION);
    }

    /// Replaces restitution, clamped to the legal range.
    pub fn set_restitution(&mut self, restitution: f32) {
        self.restitution = restitution.clamp(0.0, MAX_RESTITUTION);
    }
}

impl Default for PhysicsProps {
    fn default() -> Self {
        Self::new(0.7, 0.1, 1.0)
    }
}

/// Point and velocity of the most recent registered impact, kept so the
/// fracture pass can aim shard bursts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    /// World-space contact point.
    pub point: Vec3,
    /// Velocity of the impacting body at contact.
    pub velocity: Vec3,
}

/// Health and damage-threshold state governing destruction.
///
/// Health only ever decreases. Reaching zero arms a one-shot destruction
/// trigger; the trigger can be consumed exactly once no matter how much
/// further damage arrives while the entity waits in the destruction queue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integrity {
    health: f32,
    max_health: f32,
    /// Impulse magnitude (|Δv| · mass) an impact must exceed before it
    /// converts into damage.
    pub impact_threshold: f32,
    /// Most recent impact, if any.
    pub last_impact: Option<Impact>,
    triggered: bool,
}

impl Integrity {
    /// Creates integrity state at full health.
    pub fn new(max_health: f32, impact_threshold: f32) -> Self {
        Self {
            health: max_health,
            max_health,
            impact_threshold,
            last_impact: None,
            triggered: false,
        }
    }

    /// Current health.
    pub fn health(&self) -> f32 {
        self.health
    }

    /// Maximum health.
    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Applies damage. Negative amounts are ignored — health never rises.
    pub fn apply_damage(&mut self, amount: f32) {
        if amount > 0.0 {
            self.health -= amount;
        }
    }

    /// Whether health has reached zero.
    pub fn is_broken(&self) -> bool {
        self.health <= 0.0
    }

    /// Consumes the destruction trigger. Returns `true` exactly once, the
    /// first time it is called with health at or below zero.
    pub fn take_destruction_trigger(&mut self) -> bool {
        if self.is_broken() && !self.triggered {
            self.triggered = true;
            true
        } else {
            false
        }
    }

    /// Records the impact context used by fracture.
    pub fn record_impact(&mut self, point: Vec3, velocity: Vec3) {
        self.last_impact = Some(Impact { point, velocity });
    }
}

/// Short-lived ballistic entity state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    /// Damage applied to the target's [`Integrity`] on hit.
    pub damage: f32,
    /// Impulse magnitude transferred to dynamic targets on hit.
    pub impulse: f32,
    /// Remaining life in seconds; the combat system decrements this and
    /// queues destruction at zero.
    pub life_secs: f32,
    /// Entity that fired this projectile, excluded from self-damage.
    pub owner: crate::Entity,
}

/// Target pose for an entity driven by the physics engine's collision-aware
/// kinematic move primitive instead of by forces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicController {
    /// Where behavior logic wants the entity next frame.
    pub target_position: Vec3,
    /// Desired orientation, applied without collision resolution.
    pub target_rotation: Quat,
    /// Capsule half-height of the cylindrical segment (meters).
    pub half_height: f32,
    /// Capsule radius (meters).
    pub radius: f32,
    /// Whether the last resolved move ended on the ground.
    pub grounded: bool,
}

impl KinematicController {
    /// Creates a controller with the given capsule dimensions, targeting its
    /// current pose (no motion until behavior logic writes a target).
    pub fn new(position: Vec3, half_height: f32, radius: f32) -> Self {
        Self {
            target_position: position,
            target_rotation: Quat::IDENTITY,
            half_height,
            radius,
            grounded: false,
        }
    }
}

/// Autonomous wander state: a persistent heading perturbed each tick by
/// bounded noise, producing continuous steering without per-frame
/// re-planning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WanderAgent {
    /// Heading angle in radians around +Y; 0 faces +X.
    pub heading: f32,
    /// Walk speed in meters per second.
    pub speed: f32,
}

impl WanderAgent {
    /// Creates an agent facing `heading` radians, walking at `speed` m/s.
    pub fn new(heading: f32, speed: f32) -> Self {
        Self { heading, speed }
    }
}

/// Presence marker: entities lacking it are skipped entirely by the buoyancy
/// pass, so non-floating entities cost nothing per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Buoyant;

/// Tag linking an entity back to its spawn definition. Used by persistence
/// and by fracture to pick a shard archetype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateId(pub String);

impl TemplateId {
    /// Creates a template tag.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Reference to the entity's visual representation, owned by the render
/// collaborator and held here only by archetype name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshRef {
    /// Visual archetype; keys the instanced pool this entity draws from.
    pub archetype: String,
    /// Whether the instance slot must be rewritten every tick (moving
    /// entities) or only when its visibility flag flips.
    pub dynamic: bool,
}
