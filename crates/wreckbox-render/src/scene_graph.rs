//! Visual node table.
//!
//! One node per rendered entity: a world matrix and a visibility flag. The
//! flag is the only coupling between the culling pass and the instancing
//! layer, so flips are recorded and handed to instancing as a change list
//! instead of rewriting every slot every frame.

use glam::Mat4;
use rustc_hash::FxHashMap;
use wreckbox_ecs::Entity;

/// One visual node.
#[derive(Debug, Clone, Copy)]
pub struct Node {
    /// World transform consumed by the renderer.
    pub transform: Mat4,
    /// Whether the node should render this frame.
    pub visible: bool,
}

/// Table of visual nodes keyed by entity.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: FxHashMap<Entity, Node>,
    visibility_changes: Vec<Entity>,
}

impl SceneGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node for `entity`, initially visible.
    pub fn insert(&mut self, entity: Entity, transform: Mat4) {
        self.nodes.insert(
            entity,
            Node {
                transform,
                visible: true,
            },
        );
    }

    /// Removes the node for `entity`, if any.
    pub fn remove(&mut self, entity: Entity) {
        self.nodes.remove(&entity);
    }

    /// Whether `entity` has a node.
    pub fn contains(&self, entity: Entity) -> bool {
        self.nodes.contains_key(&entity)
    }

    /// Overwrites the node's world transform. Unknown entities are ignored.
    pub fn set_transform(&mut self, entity: Entity, transform: Mat4) {
        if let Some(node) = self.nodes.get_mut(&entity) {
            node.transform = transform;
        }
    }

    /// The node's world transform, if present.
    pub fn transform_of(&self, entity: Entity) -> Option<Mat4> {
        self.nodes.get(&entity).map(|n| n.transform)
    }

    /// Sets the visibility flag, recording the entity in the change list if
    /// the flag actually flipped. Returns whether it flipped.
    pub fn set_visible(&mut self, entity: Entity, visible: bool) -> bool {
        if let Some(node) = self.nodes.get_mut(&entity) {
            if node.visible != visible {
                node.visible = visible;
                self.visibility_changes.push(entity);
                return true;
            }
        }
        false
    }

    /// The visibility flag, if the entity has a node.
    pub fn is_visible(&self, entity: Entity) -> Option<bool> {
        self.nodes.get(&entity).map(|n| n.visible)
    }

    /// Takes the entities whose visibility flipped since the last drain.
    pub fn drain_visibility_changes(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.visibility_changes)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of currently visible nodes.
    pub fn visible_count(&self) -> usize {
        self.nodes.values().filter(|n| n.visible).count()
    }

    /// Drops every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.visibility_changes.clear();
    }
}
