//! # Procedural Geometry Generation
//!
//! Generates the primitive shapes the haunted house is assembled from, so the
//! scene needs no external model files.
//!
//! ## Supported Primitives
//!
//! - **Box**: axis-aligned box with per-face normals and UVs
//! - **Plane**: flat plane in the XY plane facing +Z
//! - **Sphere**: UV sphere with configurable resolution
//! - **Cone**: cone with a capped base and configurable radial segments
//!
//! ## Usage
//!
//! ```rust
//! use hauntstead::gfx::geometry::{generate_box, generate_cone};
//!
//! let walls = generate_box(4.0, 2.5, 4.0);
//! let bounds = walls.bounding_box();
//! assert_eq!(bounds.min[1], -1.25);
//!
//! let roof = generate_cone(3.5, 1.0, 4);
//! assert_eq!(roof.bounding_box().max[1], 0.5);
//! ```

pub mod primitives;

pub use primitives::*;

use crate::gfx::scene::vertex::Vertex3D;

/// Axis-aligned bounding box in geometry space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Aabb {
    /// A box containing nothing; growing it with any point yields that point.
    pub fn empty() -> Self {
        Self {
            min: [f32::INFINITY; 3],
            max: [f32::NEG_INFINITY; 3],
        }
    }

    pub fn grow(&mut self, point: [f32; 3]) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(point[axis]);
            self.max[axis] = self.max[axis].max(point[axis]);
        }
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| self.min[axis] > self.max[axis])
    }

    pub fn size(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Texture coordinates (u, v), origin at the top-left of the image
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    /// Create a new empty geometry data structure
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            tex_coords: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Get the number of vertices in this geometry
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles in this geometry
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Computes the bounding box over all vertex positions
    pub fn bounding_box(&self) -> Aabb {
        let mut bounds = Aabb::empty();
        for vertex in &self.vertices {
            bounds.grow(*vertex);
        }
        bounds
    }

    /// Shifts every vertex by the given offset
    ///
    /// Used to re-anchor a shape, e.g. so that its lowest point sits at y = 0.
    pub fn translate(&mut self, offset: [f32; 3]) {
        for vertex in &mut self.vertices {
            vertex[0] += offset[0];
            vertex[1] += offset[1];
            vertex[2] += offset[2];
        }
    }

    /// Interleaves positions, normals and UVs into the renderer's vertex format
    pub fn to_vertices(&self) -> Vec<Vertex3D> {
        (0..self.vertices.len())
            .map(|i| Vertex3D {
                position: self.vertices[i],
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                tex_coords: self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
            })
            .collect()
    }
}

impl Default for GeometryData {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_geometry_has_empty_bounds() {
        assert!(GeometryData::new().bounding_box().is_empty());
    }

    #[test]
    fn translate_moves_bounds() {
        let mut cube = generate_box(0.6, 0.8, 0.2);
        let lowest = cube.bounding_box().min[1];
        cube.translate([0.0, -lowest, 0.0]);

        let bounds = cube.bounding_box();
        assert!(bounds.min[1].abs() < 1e-6);
        assert!((bounds.max[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn vertices_carry_uvs() {
        let plane = generate_plane(2.0, 2.0, 1, 1);
        let vertices = plane.to_vertices();
        assert_eq!(vertices.len(), 4);
        assert!(vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
        assert!(vertices.iter().any(|v| v.tex_coords == [1.0, 0.0]));
    }
}
