//! Entity lifecycle bus.
//!
//! Creation and destruction fan out to subscribers (spatial index, scene
//! graph, instance pools) without the world knowing who listens. Delivery is
//! synchronous, inside the same call that mutated the store: a `Destroyed`
//! listener runs after the component data is already gone and receives only
//! the entity id.

use glam::Vec3;

use crate::components::BodyClass;
use crate::entity::Entity;

/// Lifecycle notification payload.
///
/// `Created` carries everything index-style listeners need (classification
/// and spawn position) so they never have to query stores mid-dispatch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityEvent {
    /// All components for the entity have been installed.
    Created {
        /// The new entity.
        entity: Entity,
        /// Static geometry vs. simulated body, for spatial-index routing.
        class: BodyClass,
        /// Spawn position.
        position: Vec3,
    },
    /// Every component for the entity has been removed. No post-destroy
    /// queries are possible; listeners get the id only.
    Destroyed {
        /// The removed entity.
        entity: Entity,
    },
}

type Listener = Box<dyn FnMut(&EntityEvent)>;

/// Synchronous observer list for [`EntityEvent`]s.
#[derive(Default)]
pub struct LifecycleBus {
    listeners: Vec<Listener>,
}

impl LifecycleBus {
    /// Creates a bus with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener. Listeners are invoked in registration order.
    pub fn subscribe(&mut self, listener: impl FnMut(&EntityEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Delivers `event` to every listener, synchronously.
    pub fn publish(&mut self, event: &EntityEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for LifecycleBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::entity::EntityAllocator;

    #[test]
    fn test_publish_reaches_all_listeners_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = LifecycleBus::new();
        for tag in ["spatial", "graph", "pools"] {
            let log = log.clone();
            bus.subscribe(move |ev| {
                if let EntityEvent::Destroyed { entity } = ev {
                    log.borrow_mut().push((tag, entity.id()));
                }
            });
        }

        let mut alloc = EntityAllocator::new();
        let e = alloc.allocate();
        bus.publish(&EntityEvent::Destroyed { entity: e });

        assert_eq!(
            *log.borrow(),
            vec![("spatial", e.id()), ("graph", e.id()), ("pools", e.id())]
        );
    }

    #[test]
    fn test_created_event_carries_classification() {
        let seen = Rc::new(RefCell::new(None));
        let mut bus = LifecycleBus::new();
        {
            let seen = seen.clone();
            bus.subscribe(move |ev| {
                if let EntityEvent::Created { class, .. } = ev {
                    *seen.borrow_mut() = Some(*class);
                }
            });
        }

        let mut alloc = EntityAllocator::new();
        bus.publish(&EntityEvent::Created {
            entity: alloc.allocate(),
            class: BodyClass::Static,
            position: Vec3::ZERO,
        });
        assert_eq!(*seen.borrow(), Some(BodyClass::Static));
    }
}
