//! Spawn templates: everything the assembler needs to build one entity.

use glam::Vec3;
use rustc_hash::FxHashMap;
use wreckbox_ecs::{Material, PhysicsProps};
use wreckbox_physics::{BodyKind, BodyShape};

/// Instance-pool capacity per visual archetype.
pub const ARCHETYPE_CAPACITY: usize = 2048;

/// Health parameters installed for destructible templates.
#[derive(Debug, Clone, Copy)]
pub struct IntegritySpec {
    /// Starting and maximum health.
    pub max_health: f32,
    /// Impulse (|Δv| · mass) an impact must exceed to deal damage.
    pub impact_threshold: f32,
}

/// Capsule dimensions for kinematic movers.
#[derive(Debug, Clone, Copy)]
pub struct KinematicSpec {
    /// Capsule half-height of the cylindrical segment.
    pub half_height: f32,
    /// Capsule radius.
    pub radius: f32,
}

/// Wander behavior parameters.
#[derive(Debug, Clone, Copy)]
pub struct WanderSpec {
    /// Walk speed in m/s.
    pub speed: f32,
}

/// Ballistics parameters for projectile templates.
#[derive(Debug, Clone, Copy)]
pub struct ProjectileSpec {
    /// Damage applied to the target's integrity on hit.
    pub damage: f32,
    /// Impulse magnitude transferred to dynamic targets.
    pub impulse: f32,
    /// Lifetime in seconds.
    pub life_secs: f32,
}

/// One spawn definition.
#[derive(Debug, Clone)]
pub struct Template {
    /// Identifier referenced by scenes, fracture, and the host.
    pub id: String,
    /// Visual archetype; keys the instance pool.
    pub archetype: String,
    /// Physics body kind.
    pub kind: BodyKind,
    /// Unit collision shape, scaled by the spawn transform.
    pub shape: BodyShape,
    /// Default scale when the spawner provides none.
    pub scale: Vec3,
    /// Surface and mass properties.
    pub props: PhysicsProps,
    /// Destructibility, if any.
    pub integrity: Option<IntegritySpec>,
    /// Whether the entity receives fluid forces.
    pub buoyant: bool,
    /// Kinematic mover dimensions, if driven by the character controller.
    pub kinematic: Option<KinematicSpec>,
    /// Wander behavior, if autonomous.
    pub wander: Option<WanderSpec>,
    /// Ballistics, if this template is fired rather than placed.
    pub projectile: Option<ProjectileSpec>,
}

impl Template {
    fn new(id: &str, archetype: &str, kind: BodyKind, shape: BodyShape, props: PhysicsProps) -> Self {
        Self {
            id: id.to_string(),
            archetype: archetype.to_string(),
            kind,
            shape,
            scale: Vec3::ONE,
            props,
            integrity: None,
            buoyant: false,
            kinematic: None,
            wander: None,
            projectile: None,
        }
    }

    fn destructible(mut self, max_health: f32, impact_threshold: f32) -> Self {
        self.integrity = Some(IntegritySpec {
            max_health,
            impact_threshold,
        });
        self
    }

    fn floats(mut self) -> Self {
        self.buoyant = true;
        self
    }
}

/// The shard template spawned when an entity of the given material
/// fractures. Unknown/untagged materials fall back to generic rubble.
pub fn shard_template_for(material: Option<Material>) -> &'static str {
    match material {
        Some(Material::Glass) | Some(Material::Ice) => "shard_glass",
        Some(Material::Wood) => "shard_wood",
        Some(Material::Metal) | Some(Material::Titanium) => "shard_metal",
        Some(Material::Stone) | None => "rubble",
    }
}

/// All known spawn definitions.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    map: FxHashMap<String, Template>,
}

impl TemplateRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a template.
    pub fn register(&mut self, template: Template) {
        self.map.insert(template.id.clone(), template);
    }

    /// Looks up a template by id.
    pub fn get(&self, id: &str) -> Option<&Template> {
        self.map.get(id)
    }

    /// Whether `id` is a known template.
    pub fn contains(&self, id: &str) -> bool {
        self.map.contains_key(id)
    }

    /// Distinct visual archetypes across all templates, for pool setup.
    pub fn archetypes(&self) -> Vec<String> {
        let mut names: Vec<String> = self.map.values().map(|t| t.archetype.clone()).collect();
        names.sort();
        names.dedup();
        names
    }

    /// The registry used by the sandbox: placeable props, agents, the
    /// projectile, and the shard archetypes fracture spawns.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        let cuboid = |half: Vec3| BodyShape::Cuboid { half_extents: half };

        registry.register(
            Template::new(
                "crate",
                "crate",
                BodyKind::Dynamic,
                cuboid(Vec3::splat(0.5)),
                PhysicsProps::new(0.8, 0.15, 0.6).with_material(Material::Wood),
            )
            .destructible(100.0, 150.0),
        );
        registry.register(
            Template::new(
                "glass_pane",
                "glass_pane",
                BodyKind::Dynamic,
                cuboid(Vec3::new(0.6, 0.6, 0.05)),
                PhysicsProps::new(0.3, 0.05, 2.5).with_material(Material::Glass),
            )
            .destructible(25.0, 40.0),
        );
        registry.register(
            Template::new(
                "ice_block",
                "ice_block",
                BodyKind::Dynamic,
                cuboid(Vec3::splat(0.5)),
                PhysicsProps::new(0.05, 0.1, 0.9).with_material(Material::Ice),
            )
            .destructible(40.0, 60.0)
            .floats(),
        );
        registry.register(
            Template::new(
                "metal_plate",
                "metal_plate",
                BodyKind::Dynamic,
                cuboid(Vec3::new(0.6, 0.08, 0.6)),
                PhysicsProps::new(0.6, 0.2, 7.8).with_material(Material::Metal),
            )
            .destructible(220.0, 420.0),
        );
        registry.register(
            Template::new(
                "stone_block",
                "stone_block",
                BodyKind::Dynamic,
                cuboid(Vec3::splat(0.5)),
                PhysicsProps::new(0.9, 0.05, 2.4).with_material(Material::Stone),
            )
            .destructible(160.0, 300.0),
        );
        registry.register(Template::new(
            "pillar",
            "pillar",
            BodyKind::Fixed,
            cuboid(Vec3::new(0.4, 2.0, 0.4)),
            PhysicsProps::new(0.9, 0.0, 2.4).with_material(Material::Stone),
        ));
        registry.register(
            Template::new(
                "buoy",
                "buoy",
                BodyKind::Dynamic,
                BodyShape::Ball { radius: 0.4 },
                PhysicsProps::new(0.4, 0.3, 0.3),
            )
            .floats(),
        );
        registry.register(
            Template::new(
                "raft",
                "raft",
                BodyKind::Dynamic,
                cuboid(Vec3::new(1.0, 0.15, 0.7)),
                PhysicsProps::new(0.7, 0.1, 0.4).with_material(Material::Wood),
            )
            .destructible(120.0, 200.0)
            .floats(),
        );

        let mut walker = Template::new(
            "walker",
            "walker",
            BodyKind::KinematicPositionBased,
            BodyShape::Capsule {
                half_height: 0.6,
                radius: 0.3,
            },
            PhysicsProps::new(0.0, 0.0, 1.0),
        );
        walker.kinematic = Some(KinematicSpec {
            half_height: 0.6,
            radius: 0.3,
        });
        walker.wander = Some(WanderSpec { speed: 1.6 });
        registry.register(walker);

        let mut slug = Template::new(
            "slug",
            "slug",
            BodyKind::Dynamic,
            BodyShape::Ball { radius: 0.1 },
            PhysicsProps::new(0.4, 0.1, 11.9),
        );
        slug.projectile = Some(ProjectileSpec {
            damage: 35.0,
            impulse: 18.0,
            life_secs: 10.0,
        });
        registry.register(slug);

        // Shards are inert: no integrity, so fracture never cascades.
        for (id, material) in [
            ("shard_glass", Material::Glass),
            ("shard_wood", Material::Wood),
            ("shard_metal", Material::Metal),
            ("rubble", Material::Stone),
        ] {
            registry.register(Template::new(
                id,
                id,
                BodyKind::Dynamic,
                cuboid(Vec3::splat(0.12)),
                PhysicsProps::new(0.6, 0.2, 1.2).with_material(material),
            ));
        }

        registry
    }
}
