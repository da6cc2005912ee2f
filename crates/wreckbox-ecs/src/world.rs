//! The world: one struct owning every component store, the lifecycle bus,
//! and the entity allocator.
//!
//! There is exactly one world per engine instance. Scene reloads go through
//! [`World::reset`], which clears every store in one step — never through
//! re-construction, so bus subscriptions survive reloads.

use glam::Vec3;
use rustc_hash::FxHashSet;

use crate::components::{
    BodyClass, Buoyant, Integrity, KinematicController, MeshRef, PhysicsProps, Projectile,
    TemplateId, Transform, WanderAgent,
};
use crate::entity::{Entity, EntityAllocator};
use crate::events::{EntityEvent, LifecycleBus};
use crate::store::ComponentStore;

/// Container for all entities and their components.
///
/// Stores are public: systems read and write them directly, each store
/// having a single writing system per tick by convention. Structural
/// operations (spawn, destroy, reset) go through the methods here so the
/// lifecycle bus always observes them.
#[derive(Debug)]
pub struct World {
    allocator: EntityAllocator,
    live: FxHashSet<Entity>,
    pending_destroy: Vec<Entity>,

    /// Position/rotation/scale per entity.
    pub transforms: ComponentStore<Transform>,
    /// Surface and mass properties per physical entity.
    pub props: ComponentStore<PhysicsProps>,
    /// Health and damage state per destructible entity.
    pub integrity: ComponentStore<Integrity>,
    /// Ballistic state per projectile entity.
    pub projectiles: ComponentStore<Projectile>,
    /// Kinematic move targets per non-physics-authoritative mover.
    pub controllers: ComponentStore<KinematicController>,
    /// Wander steering state per autonomous agent.
    pub agents: ComponentStore<WanderAgent>,
    /// Presence marker for fluid-force recipients.
    pub buoyant: ComponentStore<Buoyant>,
    /// Spawn-definition tag per entity.
    pub templates: ComponentStore<TemplateId>,
    /// Visual archetype reference per rendered entity.
    pub meshes: ComponentStore<MeshRef>,

    bus: LifecycleBus,
    dragged: Option<Entity>,
    selected: Option<Entity>,
}

impl World {
    /// Creates an empty world.
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            live: FxHashSet::default(),
            pending_destroy: Vec::new(),
            transforms: ComponentStore::new(),
            props: ComponentStore::new(),
            integrity: ComponentStore::new(),
            projectiles: ComponentStore::new(),
            controllers: ComponentStore::new(),
            agents: ComponentStore::new(),
            buoyant: ComponentStore::new(),
            templates: ComponentStore::new(),
            meshes: ComponentStore::new(),
            bus: LifecycleBus::new(),
            dragged: None,
            selected: None,
        }
    }

    /// Allocates a new live entity. The caller (the assembler) installs all
    /// components and then calls [`notify_created`](World::notify_created);
    /// no partially-assembled entity is ever announced.
    pub fn spawn_entity(&mut self) -> Entity {
        let e = self.allocator.allocate();
        self.live.insert(e);
        e
    }

    /// Publishes the `Created` event once assembly is complete.
    pub fn notify_created(&mut self, entity: Entity, class: BodyClass, position: Vec3) {
        self.bus.publish(&EntityEvent::Created {
            entity,
            class,
            position,
        });
    }

    /// Whether `entity` currently exists.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.live.contains(&entity)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.live.len()
    }

    /// Registers a lifecycle listener.
    pub fn subscribe(&mut self, listener: impl FnMut(&EntityEvent) + 'static) {
        self.bus.subscribe(listener);
    }

    /// Removes `entity` from every component store in one logical step and
    /// notifies `Destroyed` listeners synchronously. Returns `false` if the
    /// entity was already gone.
    ///
    /// Physics-body teardown is the caller's half of the contract (the
    /// registry is external to this crate); the repair pass sweeps any body
    /// a caller forgot.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.live.remove(&entity) {
            return false;
        }
        self.transforms.remove(entity);
        self.props.remove(entity);
        self.integrity.remove(entity);
        self.projectiles.remove(entity);
        self.controllers.remove(entity);
        self.agents.remove(entity);
        self.buoyant.remove(entity);
        self.templates.remove(entity);
        self.meshes.remove(entity);
        if self.dragged == Some(entity) {
            self.dragged = None;
        }
        if self.selected == Some(entity) {
            self.selected = None;
        }
        self.bus.publish(&EntityEvent::Destroyed { entity });
        true
    }

    /// Queues `entity` for destruction at the next flush point. Duplicate
    /// and already-dead entries are tolerated.
    pub fn queue_destroy(&mut self, entity: Entity) {
        self.pending_destroy.push(entity);
    }

    /// Drains the destruction queue. The caller destroys each entry (after
    /// its own teardown, e.g. removing the physics body).
    pub fn take_destroy_queue(&mut self) -> Vec<Entity> {
        let mut pending = std::mem::take(&mut self.pending_destroy);
        pending.sort_unstable();
        pending.dedup();
        pending.retain(|e| self.live.contains(e));
        pending
    }

    /// Number of entities waiting in the destruction queue.
    pub fn pending_destroy_len(&self) -> usize {
        self.pending_destroy.len()
    }

    /// The entity currently held by the user's drag gizmo, if any. While
    /// set, transform authority for that one entity flows visual → physics.
    pub fn dragged(&self) -> Option<Entity> {
        self.dragged
    }

    /// Sets or clears the dragged entity. Dead entities are refused.
    pub fn set_dragged(&mut self, entity: Option<Entity>) {
        self.dragged = entity.filter(|e| self.live.contains(e));
    }

    /// The currently selected entity, if any. Always kept visible by the
    /// culling pass regardless of camera distance.
    pub fn selected(&self) -> Option<Entity> {
        self.selected
    }

    /// Sets or clears the selected entity. Dead entities are refused.
    pub fn set_selected(&mut self, entity: Option<Entity>) {
        self.selected = entity.filter(|e| self.live.contains(e));
    }

    /// Clears every store and all transient state in one step. Entity ids
    /// keep increasing across resets; bus subscriptions are preserved.
    pub fn reset(&mut self) {
        self.live.clear();
        self.pending_destroy.clear();
        self.transforms.clear();
        self.props.clear();
        self.integrity.clear();
        self.projectiles.clear();
        self.controllers.clear();
        self.agents.clear();
        self.buoyant.clear();
        self.templates.clear();
        self.meshes.clear();
        self.dragged = None;
        self.selected = None;
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn spawn_full(world: &mut World) -> Entity {
        let e = world.spawn_entity();
        world.transforms.insert(e, Transform::default());
        world.props.insert(e, PhysicsProps::default());
        world.integrity.insert(e, Integrity::new(100.0, 150.0));
        world.buoyant.insert(e, Buoyant);
        world.templates.insert(e, TemplateId::new("crate"));
        world.meshes.insert(
            e,
            MeshRef {
                archetype: "crate".into(),
                dynamic: true,
            },
        );
        world.notify_created(e, BodyClass::Dynamic, Vec3::ZERO);
        e
    }

    #[test]
    fn test_destroy_purges_every_store() {
        let mut world = World::new();
        let e = spawn_full(&mut world);

        assert!(world.destroy(e));

        assert!(!world.is_alive(e));
        assert!(world.transforms.get(e).is_none());
        assert!(world.props.get(e).is_none());
        assert!(world.integrity.get(e).is_none());
        assert!(world.projectiles.get(e).is_none());
        assert!(world.controllers.get(e).is_none());
        assert!(world.agents.get(e).is_none());
        assert!(world.buoyant.get(e).is_none());
        assert!(world.templates.get(e).is_none());
        assert!(world.meshes.get(e).is_none());
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut world = World::new();
        let e = spawn_full(&mut world);
        assert!(world.destroy(e));
        assert!(!world.destroy(e));
    }

    #[test]
    fn test_destroyed_listener_sees_no_component_data() {
        let mut world = World::new();
        let observed = Rc::new(RefCell::new(false));
        // The listener cannot query stores mid-dispatch (the world is
        // mutably borrowed), which is exactly the contract: by the time
        // `Destroyed` is delivered the data is gone. We assert the event
        // fires after the store mutation by checking order via a flag.
        {
            let observed = observed.clone();
            world.subscribe(move |ev| {
                if matches!(ev, EntityEvent::Destroyed { .. }) {
                    *observed.borrow_mut() = true;
                }
            });
        }
        let e = spawn_full(&mut world);
        world.destroy(e);
        assert!(*observed.borrow());
    }

    #[test]
    fn test_destroy_clears_drag_and_selection() {
        let mut world = World::new();
        let e = spawn_full(&mut world);
        world.set_dragged(Some(e));
        world.set_selected(Some(e));

        world.destroy(e);
        assert_eq!(world.dragged(), None);
        assert_eq!(world.selected(), None);
    }

    #[test]
    fn test_destroy_queue_dedups_and_drops_dead() {
        let mut world = World::new();
        let a = spawn_full(&mut world);
        let b = spawn_full(&mut world);
        world.queue_destroy(a);
        world.queue_destroy(a);
        world.queue_destroy(b);
        world.destroy(b);

        let pending = world.take_destroy_queue();
        assert_eq!(pending, vec![a]);
        assert_eq!(world.pending_destroy_len(), 0);
    }

    #[test]
    fn test_reset_clears_everything_but_keeps_ids_monotonic() {
        let mut world = World::new();
        let a = spawn_full(&mut world);
        world.reset();

        assert_eq!(world.entity_count(), 0);
        assert!(world.transforms.is_empty());

        let b = world.spawn_entity();
        assert!(b.id() > a.id(), "ids must not restart after reset");
    }

    #[test]
    fn test_dead_entity_cannot_be_dragged() {
        let mut world = World::new();
        let e = spawn_full(&mut world);
        world.destroy(e);
        world.set_dragged(Some(e));
        assert_eq!(world.dragged(), None);
    }
}
