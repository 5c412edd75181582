//! GPU resource management
//!
//! Handles textures, materials, and the global bind group for rendering.

pub mod global_bindings;
pub mod material;
pub mod texture_resource;

// Re-export main types
pub use global_bindings::{GlobalBindings, GlobalUBO, GlobalUBOContent, MAX_POINT_LIGHTS};
pub use material::{hex_rgb, Material, MaterialBindings, MaterialId, MaterialManager, TextureMaps};
pub use texture_resource::{AssetError, TextureLoader, TextureResource};
