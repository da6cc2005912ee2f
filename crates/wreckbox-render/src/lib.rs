//! The renderer boundary: scene-graph node table, per-archetype instance
//! pools, and camera-distance visibility culling.
//!
//! Rasterization is an external collaborator; this crate owns the CPU-side
//! state the renderer consumes — world matrices, visibility flags, and the
//! packed per-archetype instance buffers with their slot bookkeeping.

pub mod culling;
pub mod instancing;
pub mod scene_graph;

pub use culling::{CULL_RADIUS, CullingState, RECULL_CAMERA_DELTA, run_culling};
pub use instancing::{InstancePools, InstancedGroup};
pub use scene_graph::SceneGraph;
