//! # Graphics Module
//!
//! Everything needed to turn a [`Scene`] into pixels: the orbit camera,
//! procedural primitives, the forward renderer and its GPU resources.
//!
//! ## Architecture Overview
//!
//! - **Camera System** ([`camera`]) - Damped orbit camera bounded above the ground
//! - **Geometry** ([`geometry`]) - Box, plane, sphere and cone generators
//! - **Rendering Pipeline** ([`rendering`]) - Opaque, transparent and line passes with fog
//! - **Scene Management** ([`scene`]) - Node hierarchy with meshes, lights and helpers
//! - **Resource Management** ([`resources`]) - Materials, textures, and global uniforms
//!
//! ## Usage
//!
//! ```no_run
//! use hauntstead::gfx::{geometry::generate_box, scene::Scene};
//!
//! let mut scene = Scene::new();
//! let walls = scene.add_geometry(generate_box(4.0, 2.5, 4.0));
//! let root = scene.root();
//! scene.add_mesh(root, "walls", walls, "Default");
//! // The render engine is created by the app once a window exists:
//! // let engine = RenderEngine::new(window, 1200, 800, assets_root).await?;
//! ```
//!
//! [`Scene`]: scene::Scene

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
