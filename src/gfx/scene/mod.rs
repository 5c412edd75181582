//! # Scene Management Module
//!
//! Scene graph for the haunted house: an arena of named nodes under one root.
//! Each node carries a local [`Transform`] and optionally a mesh, a light or a
//! debug helper.
//!
//! ## Key Components
//!
//! - [`Scene`] - Node arena plus shared geometry, materials and fog
//! - [`Node`] / [`NodeKind`] - Per-node transform and payload
//! - [`Light`] - Ambient, directional and point lights
//! - [`Helper`] - Axes and light markers drawn as lines
//! - [`Vertex3D`] / [`LineVertex`] - GPU vertex formats
//!
//! ## Usage
//!
//! ```rust
//! use hauntstead::gfx::scene::{Light, Scene, Transform};
//!
//! let mut scene = Scene::new();
//! let root = scene.root();
//! let house = scene.add_group(root, "house");
//! let lamp = scene.add_light(house, "door light", Light::point([1.0, 0.49, 0.27], 2.0, 7.0));
//! scene.node_mut(lamp).unwrap().transform = Transform::from_position(0.0, 2.5, 2.2);
//! assert_eq!(scene.point_lights().len(), 1);
//! ```

pub mod helpers;
pub mod light;
pub mod node;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use helpers::{helper_lines, Helper};
pub use light::{Light, LightKind, LightShadow};
pub use node::{GeometryId, MeshNode, Node, NodeId, NodeKind, NodeProperty, Transform};
pub use scene::{Fog, LightInstance, MeshInstance, Scene, SceneError, SceneStatistics};
pub use vertex::{LineVertex, Vertex3D};
