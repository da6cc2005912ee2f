//! Entity-component core of the Wreckbox engine: entity handles, sparse
//! component stores, the lifecycle bus, the world container, and the
//! fixed-priority system scheduler.
//!
//! Entities are opaque monotonically increasing integers and never carry
//! behavior. All per-entity data lives in per-kind [`ComponentStore`]s owned
//! by a single [`World`]; all per-tick logic lives in [`System`]s driven in a
//! fixed total order by the [`Scheduler`].

pub mod components;
pub mod entity;
pub mod events;
pub mod scheduler;
pub mod store;
pub mod world;

pub use components::{
    BodyClass, Buoyant, Impact, Integrity, KinematicController, Material, MeshRef, PhysicsProps,
    Projectile, TemplateId, Transform, WanderAgent,
};
pub use entity::Entity;
pub use events::{EntityEvent, LifecycleBus};
pub use scheduler::{MAX_DELTA_MS, Scheduler, System, SystemError, Tick};
pub use store::ComponentStore;
pub use world::World;
