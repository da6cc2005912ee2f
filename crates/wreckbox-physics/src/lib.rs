//! Physics integration: the Rapier 3D wrapper, the entity↔body registry,
//! per-frame synchronization, the repair pass, buoyancy, and kinematic
//! locomotion.
//!
//! Rapier is the external physics engine of the sandbox; everything here
//! either feeds it (spawn, kinematic intent, fluid impulses) or keeps the
//! component store and visual layer consistent with it (sync, repair).

pub mod buoyancy;
pub mod convert;
pub mod locomotion;
pub mod registry;
pub mod repair;
pub mod sync;

use std::sync::mpsc::{Receiver, Sender, channel};

use glam::Vec3;
use rapier3d::pipeline::ChannelEventCollector;
use rapier3d::prelude::*;
use rustc_hash::FxHashSet;
use wreckbox_ecs::{BodyClass, Entity, PhysicsProps, Transform};

pub use registry::BodyRegistry;

use crate::convert::{to_rotation, to_vector};

/// How the physics engine should simulate a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Immovable (infinite mass).
    Fixed,
    /// Fully simulated, affected by forces and gravity.
    Dynamic,
    /// Position-driven via the kinematic move primitive.
    KinematicPositionBased,
}

impl BodyKind {
    /// The lifecycle classification this body kind maps to.
    pub fn class(&self) -> BodyClass {
        match self {
            BodyKind::Fixed => BodyClass::Static,
            BodyKind::Dynamic | BodyKind::KinematicPositionBased => BodyClass::Dynamic,
        }
    }
}

/// Unit collision shape; the entity's transform scale is applied at body
/// creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    /// Axis-aligned box with the given half-extents.
    Cuboid {
        /// Half-extents along each axis, pre-scale.
        half_extents: Vec3,
    },
    /// Sphere.
    Ball {
        /// Radius, pre-scale.
        radius: f32,
    },
    /// Capsule aligned along the Y axis.
    Capsule {
        /// Half the height of the cylindrical part, pre-scale.
        half_height: f32,
        /// Radius of the hemispheres, pre-scale.
        radius: f32,
    },
}

/// A collision event translated into entity space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    /// `true` on contact start, `false` on contact stop.
    pub started: bool,
    /// One body of the pair.
    pub a: Entity,
    /// The other body.
    pub b: Entity,
}

/// Central physics simulation state owning all Rapier sets, the entity↔body
/// registry, and the collision-event channel.
pub struct PhysicsWorld {
    /// World-space gravity vector.
    pub gravity: Vector,
    /// Timestep and solver configuration; `dt` is rewritten every step.
    pub integration_parameters: IntegrationParameters,
    /// The main simulation pipeline.
    pub physics_pipeline: PhysicsPipeline,
    /// Tracks sleeping/awake body islands.
    pub island_manager: IslandManager,
    /// Broad-phase collision detection (also provides query pipeline).
    pub broad_phase: BroadPhaseBvh,
    /// Narrow-phase collision detection (contact manifolds).
    pub narrow_phase: NarrowPhase,
    /// All rigid bodies in the simulation.
    pub rigid_body_set: RigidBodySet,
    /// All colliders in the simulation.
    pub collider_set: ColliderSet,
    /// Impulse-based joints.
    pub impulse_joint_set: ImpulseJointSet,
    /// Multibody joints.
    pub multibody_joint_set: MultibodyJointSet,
    /// Continuous collision detection solver.
    pub ccd_solver: CCDSolver,
    /// Entity ↔ body mapping; erased together with the body on removal.
    pub registry: BodyRegistry,

    /// Engine-owned bodies (ground plane, world walls) with no entity
    /// behind them; exempt from the ghost-body sweep.
    anchored: FxHashSet<RigidBodyHandle>,

    collision_send: Sender<CollisionEvent>,
    collision_recv: Receiver<CollisionEvent>,
    contact_force_send: Sender<ContactForceEvent>,
    contact_force_recv: Receiver<ContactForceEvent>,
}

impl PhysicsWorld {
    /// Creates a physics world with default gravity `(0, -9.81, 0)`.
    pub fn new() -> Self {
        let (collision_send, collision_recv) = channel();
        let (contact_force_send, contact_force_recv) = channel();
        Self {
            gravity: Vector::new(0.0, -9.81, 0.0),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            registry: BodyRegistry::new(),
            anchored: FxHashSet::default(),
            collision_send,
            collision_recv,
            contact_force_send,
            contact_force_recv,
        }
    }

    /// Advances the simulation by `dt` seconds. Collision events accumulate
    /// in the channel until [`drain_contacts`](PhysicsWorld::drain_contacts).
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt.max(0.0);
        let events =
            ChannelEventCollector::new(self.collision_send.clone(), self.contact_force_send.clone());
        self.physics_pipeline.step(
            self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            &(),
            &events,
        );
    }

    /// Sets the world gravity vector.
    pub fn set_gravity(&mut self, x: f32, y: f32, z: f32) {
        self.gravity = Vector::new(x, y, z);
    }

    /// Creates a rigid body and collider for `entity` and registers the
    /// pair. The collider shape is `shape` scaled by the transform's scale;
    /// surface properties come from `props` (already clamped at the store).
    pub fn spawn_body(
        &mut self,
        entity: Entity,
        kind: BodyKind,
        transform: &Transform,
        props: &PhysicsProps,
        shape: &BodyShape,
    ) -> RigidBodyHandle {
        let builder = match kind {
            BodyKind::Fixed => RigidBodyBuilder::fixed(),
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
            BodyKind::KinematicPositionBased => RigidBodyBuilder::kinematic_position_based(),
        };
        let body = builder
            .pose(Pose::from_parts(
                to_vector(transform.position),
                to_rotation(transform.rotation),
            ))
            .build();
        let handle = self.rigid_body_set.insert(body);

        let collider = ColliderBuilder::new(scaled_shape(shape, transform.scale))
            .friction(props.friction())
            .restitution(props.restitution())
            .density(props.density())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        self.registry.insert(entity, handle);
        handle
    }

    /// Removes `entity`'s body and colliders, erasing the registry mapping
    /// in both directions. Returns `false` if the entity had no body.
    pub fn remove_entity_body(&mut self, entity: Entity) -> bool {
        let Some(handle) = self.registry.remove_entity(entity) else {
            return false;
        };
        self.remove_body_internal(handle);
        true
    }

    fn remove_body_internal(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    /// Adds an engine-owned fixed cuboid (ground plane, wall). Anchored
    /// bodies have no entity and are exempt from the ghost sweep.
    pub fn add_anchored_cuboid(&mut self, center: Vec3, half_extents: Vec3) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed()
            .translation(to_vector(center))
            .build();
        let handle = self.rigid_body_set.insert(body);
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .friction(0.8)
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        self.anchored.insert(handle);
        handle
    }

    /// Whether `handle` is an engine-owned anchored body.
    pub fn is_anchored(&self, handle: RigidBodyHandle) -> bool {
        self.anchored.contains(&handle)
    }

    /// Removes every body whose handle maps to no live entity — a "ghost"
    /// left behind by a teardown path that forgot the physics half. Returns
    /// the number removed. Anchored bodies are skipped.
    pub fn sweep_ghost_bodies(&mut self) -> usize {
        let ghosts: Vec<RigidBodyHandle> = self
            .rigid_body_set
            .iter()
            .map(|(handle, _)| handle)
            .filter(|handle| {
                !self.anchored.contains(handle) && self.registry.entity_of(*handle).is_none()
            })
            .collect();
        for handle in &ghosts {
            tracing::warn!(?handle, "removing ghost body with no live entity");
            self.remove_body_internal(*handle);
        }
        ghosts.len()
    }

    /// Drains collision events gathered since the last call, translated to
    /// entity pairs. Contacts involving unregistered colliders (anchored
    /// ground, just-removed bodies) are dropped.
    pub fn drain_contacts(&mut self) -> Vec<ContactEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.collision_recv.try_recv() {
            let (c1, c2, started) = match event {
                CollisionEvent::Started(c1, c2, _) => (c1, c2, true),
                CollisionEvent::Stopped(c1, c2, _) => (c1, c2, false),
            };
            if let (Some(a), Some(b)) = (self.entity_of_collider(c1), self.entity_of_collider(c2)) {
                out.push(ContactEvent { started, a, b });
            }
        }
        // Contact-force events are not consumed by any system; keep the
        // channel from growing.
        while self.contact_force_recv.try_recv().is_ok() {}
        out
    }

    fn entity_of_collider(&self, collider: ColliderHandle) -> Option<Entity> {
        let body = self.collider_set.get(collider)?.parent()?;
        self.registry.entity_of(body)
    }

    /// Number of bodies in the simulation, anchored ones included.
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    /// Removes every entity-backed body and clears the registry. Anchored
    /// bodies survive — the ground does not vanish on scene reload.
    pub fn reset(&mut self) {
        let handles: Vec<RigidBodyHandle> = self.registry.iter().map(|(_, h)| h).collect();
        for handle in handles {
            self.remove_body_internal(handle);
        }
        self.registry.clear();
        while self.collision_recv.try_recv().is_ok() {}
        while self.contact_force_recv.try_recv().is_ok() {}
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

fn scaled_shape(shape: &BodyShape, scale: Vec3) -> SharedShape {
    match *shape {
        BodyShape::Cuboid { half_extents } => {
            let h = half_extents * scale;
            SharedShape::cuboid(h.x, h.y, h.z)
        }
        BodyShape::Ball { radius } => {
            // Non-uniform scale cannot be expressed on a ball; use the mean.
            let s = (scale.x + scale.y + scale.z) / 3.0;
            SharedShape::ball(radius * s)
        }
        BodyShape::Capsule {
            half_height,
            radius,
        } => {
            let r_scale = (scale.x + scale.z) / 2.0;
            SharedShape::capsule_y(half_height * scale.y, radius * r_scale)
        }
    }
}
