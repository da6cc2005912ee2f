//! The tick context: everything systems touch during a frame.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use wreckbox_config::Config;
use wreckbox_ecs::{Entity, World};
use wreckbox_physics::PhysicsWorld;
use wreckbox_physics::buoyancy::WaterField;
use wreckbox_physics::repair::RepairReport;
use wreckbox_render::{CullingState, InstancePools, SceneGraph};
use wreckbox_spatial::SpatialIndex;

use crate::template::{ARCHETYPE_CAPACITY, TemplateRegistry};

/// A visual/audio cue emitted at a projectile impact, drained by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactEffect {
    /// World-space contact point.
    pub point: Vec3,
    /// Direction of travel at impact (normalized, or zero).
    pub direction: Vec3,
}

/// Owned per-tick counters exposed to the host through plain getters —
/// no reactive recomputation, one update per tick by the stats system.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames ticked so far.
    pub frame: u64,
    /// Live entities.
    pub entities: usize,
    /// Bodies in the physics engine (anchored ground included).
    pub bodies: usize,
    /// Visible scene-graph nodes.
    pub visible_nodes: usize,
    /// Allocated instance slots across all pools.
    pub live_instances: usize,
    /// Shards spawned by fracture since startup.
    pub shards_spawned: u64,
    /// Projectiles fired since startup.
    pub projectiles_fired: u64,
    /// Transforms reset after numeric corruption.
    pub corrupt_repaired: u64,
    /// Entities destroyed for leaving world bounds.
    pub out_of_bounds_destroyed: u64,
    /// Velocities hard-stopped by the repair pass.
    pub velocity_caps: u64,
    /// Ghost bodies swept out of the physics engine.
    pub ghost_bodies_removed: u64,
}

impl FrameStats {
    /// Folds one repair report into the running totals.
    pub fn absorb_repair(&mut self, report: RepairReport) {
        self.corrupt_repaired += report.corrupt_reset as u64;
        self.out_of_bounds_destroyed += report.out_of_bounds as u64;
        self.velocity_caps += (report.linvel_zeroed + report.angvel_zeroed) as u64;
        self.ghost_bodies_removed += report.ghost_bodies_removed as u64;
    }
}

/// Everything the systems operate on during one tick.
///
/// Single-threaded by design: the shared handles (`graph`, `pools`,
/// `spatial`) are `Rc<RefCell<…>>` because they are also lifecycle-bus
/// listeners; systems take short borrows and never hold one across an
/// entity destruction.
pub struct SimContext {
    /// Component stores, lifecycle bus, drag/selection state.
    pub world: World,
    /// The external physics engine wrapper.
    pub physics: PhysicsWorld,
    /// Visual node table (bus listener: removes nodes on destroy).
    pub graph: Rc<RefCell<SceneGraph>>,
    /// Instance pools (bus listener: frees slots on destroy).
    pub pools: Rc<RefCell<InstancePools>>,
    /// Spatial index (bus listener: unindexes on destroy).
    pub spatial: Rc<RefCell<SpatialIndex>>,
    /// Spawn definitions.
    pub templates: TemplateRegistry,
    /// The water surface used by buoyancy.
    pub water: WaterField,
    /// Whether buoyancy runs at all.
    pub water_enabled: bool,
    /// Camera position driving the culling pass.
    pub camera_position: Vec3,
    /// Incremental state of the static culling pass.
    pub culling: CullingState,
    /// Host flag persisted with scenes; the engine core only carries it.
    pub textures_enabled: bool,
    /// Impact effects for the host to drain.
    pub effects: Vec<ImpactEffect>,
    /// Per-tick counters.
    pub stats: FrameStats,
    /// Log a stats line every N frames (0 = never).
    pub stats_interval: u32,
}

impl SimContext {
    /// Builds the context: physics world with the configured gravity and an
    /// anchored ground plane, instance pools per template archetype, and
    /// the lifecycle-bus subscriptions that keep graph/pools/spatial
    /// consistent with entity destruction.
    pub fn new(config: &Config) -> Self {
        let mut world = World::new();
        let mut physics = PhysicsWorld::new();
        physics.set_gravity(0.0, config.sim.gravity_y, 0.0);

        let ground = config.sim.ground_half_extent;
        physics.add_anchored_cuboid(Vec3::new(0.0, -0.5, 0.0), Vec3::new(ground, 0.5, ground));

        let templates = TemplateRegistry::builtin();
        let mut pool_set = InstancePools::new();
        for archetype in templates.archetypes() {
            pool_set.add_group(archetype, ARCHETYPE_CAPACITY);
        }

        let graph = Rc::new(RefCell::new(SceneGraph::new()));
        let pools = Rc::new(RefCell::new(pool_set));
        let spatial = Rc::new(RefCell::new(SpatialIndex::default()));

        {
            let graph = graph.clone();
            world.subscribe(move |event| {
                if let wreckbox_ecs::EntityEvent::Destroyed { entity } = event {
                    graph.borrow_mut().remove(*entity);
                }
            });
        }
        {
            let pools = pools.clone();
            world.subscribe(move |event| pools.borrow_mut().on_event(event));
        }
        {
            let spatial = spatial.clone();
            world.subscribe(move |event| spatial.borrow_mut().on_event(event));
        }

        let mut water = WaterField::default();
        water.base_level = config.water.base_level;

        Self {
            world,
            physics,
            graph,
            pools,
            spatial,
            templates,
            water,
            water_enabled: config.water.enabled,
            camera_position: Vec3::new(0.0, 10.0, 30.0),
            culling: CullingState::new(),
            textures_enabled: config.sim.textures_enabled,
            effects: Vec::new(),
            stats: FrameStats::default(),
            stats_interval: config.debug.stats_interval,
        }
    }

    /// Destroys one entity completely: physics body first, then every
    /// component store; graph, pools and spatial index follow through the
    /// lifecycle bus. Must not be called while a borrow of `graph`,
    /// `pools` or `spatial` is held.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        self.physics.remove_entity_body(entity);
        self.world.destroy(entity)
    }

    /// Flushes the world's destruction queue through
    /// [`destroy_entity`](SimContext::destroy_entity). Returns the number
    /// destroyed.
    pub fn flush_destroyed(&mut self) -> usize {
        let pending = self.world.take_destroy_queue();
        let mut count = 0;
        for entity in pending {
            if self.destroy_entity(entity) {
                count += 1;
            }
        }
        count
    }

    /// Clears every store, registry and pool back to the empty scene.
    /// Anchored ground bodies and bus subscriptions survive.
    pub fn reset(&mut self) {
        self.world.reset();
        self.physics.reset();
        self.graph.borrow_mut().clear();
        self.pools.borrow_mut().clear();
        self.spatial.borrow_mut().clear();
        self.culling.reset();
        self.effects.clear();
    }
}
