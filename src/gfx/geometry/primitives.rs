//! # Primitive Shape Generation
//!
//! This module contains functions to generate common 3D primitive shapes.
//! All shapes are centered at the origin in a Y-up coordinate system and are
//! generated with outward normals, texture coordinates and counter-clockwise
//! front faces.

use super::GeometryData;
use std::f32::consts::PI;

/// Generate an axis-aligned box centered at the origin
///
/// # Arguments
/// * `width` - Extent along X
/// * `height` - Extent along Y
/// * `depth` - Extent along Z
pub fn generate_box(width: f32, height: f32, depth: f32) -> GeometryData {
    let mut data = GeometryData::new();
    let (hw, hh, hd) = (width * 0.5, height * 0.5, depth * 0.5);

    // (normal, four corners in counter-clockwise order seen from outside)
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        // +Z
        (
            [0.0, 0.0, 1.0],
            [[-hw, -hh, hd], [hw, -hh, hd], [hw, hh, hd], [-hw, hh, hd]],
        ),
        // -Z
        (
            [0.0, 0.0, -1.0],
            [[hw, -hh, -hd], [-hw, -hh, -hd], [-hw, hh, -hd], [hw, hh, -hd]],
        ),
        // -X
        (
            [-1.0, 0.0, 0.0],
            [[-hw, -hh, -hd], [-hw, -hh, hd], [-hw, hh, hd], [-hw, hh, -hd]],
        ),
        // +X
        (
            [1.0, 0.0, 0.0],
            [[hw, -hh, hd], [hw, -hh, -hd], [hw, hh, -hd], [hw, hh, hd]],
        ),
        // +Y
        (
            [0.0, 1.0, 0.0],
            [[-hw, hh, hd], [hw, hh, hd], [hw, hh, -hd], [-hw, hh, -hd]],
        ),
        // -Y
        (
            [0.0, -1.0, 0.0],
            [[-hw, -hh, -hd], [hw, -hh, -hd], [hw, -hh, hd], [-hw, -hh, hd]],
        ),
    ];
    let face_uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    for (normal, corners) in faces.iter() {
        let base = data.vertices.len() as u32;
        for (corner, uv) in corners.iter().zip(face_uvs.iter()) {
            data.vertices.push(*corner);
            data.normals.push(*normal);
            data.tex_coords.push(*uv);
        }
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    data
}

/// Generate a UV sphere with specified resolution
///
/// # Arguments
/// * `radius` - Sphere radius
/// * `longitude_segments` - Number of vertical segments (longitude lines)
/// * `latitude_segments` - Number of horizontal segments (latitude lines)
pub fn generate_sphere(radius: f32, longitude_segments: u32, latitude_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let long_segs = longitude_segments.max(3);
    let lat_segs = latitude_segments.max(2);

    for lat in 0..=lat_segs {
        let theta = lat as f32 * PI / lat_segs as f32; // 0 (top) to PI (bottom)
        let (sin_theta, cos_theta) = theta.sin_cos();

        for long in 0..=long_segs {
            let phi = long as f32 * 2.0 * PI / long_segs as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let normal = [sin_theta * cos_phi, cos_theta, sin_theta * sin_phi];
            data.vertices
                .push([normal[0] * radius, normal[1] * radius, normal[2] * radius]);
            data.normals.push(normal);
            data.tex_coords
                .push([long as f32 / long_segs as f32, lat as f32 / lat_segs as f32]);
        }
    }

    for lat in 0..lat_segs {
        for long in 0..long_segs {
            let first = lat * (long_segs + 1) + long;
            let second = first + long_segs + 1;

            data.indices.extend_from_slice(&[first, first + 1, second]);
            data.indices
                .extend_from_slice(&[second, first + 1, second + 1]);
        }
    }

    data
}

/// Generate a plane in the XY plane, facing +Z
///
/// # Arguments
/// * `width` - Width of the plane (X direction)
/// * `height` - Height of the plane (Y direction)
/// * `width_segments` - Number of subdivisions along width
/// * `height_segments` - Number of subdivisions along height
///
/// Lay it flat by rotating -90° about X.
pub fn generate_plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let w_segs = width_segments.max(1);
    let h_segs = height_segments.max(1);

    for y in 0..=h_segs {
        let v = y as f32 / h_segs as f32;
        let pos_y = (v - 0.5) * height;

        for x in 0..=w_segs {
            let u = x as f32 / w_segs as f32;
            let pos_x = (u - 0.5) * width;

            data.vertices.push([pos_x, pos_y, 0.0]);
            data.normals.push([0.0, 0.0, 1.0]);
            data.tex_coords.push([u, 1.0 - v]);
        }
    }

    for y in 0..h_segs {
        for x in 0..w_segs {
            let i = y * (w_segs + 1) + x;
            let next_row = i + w_segs + 1;

            data.indices.extend_from_slice(&[i, i + 1, next_row]);
            data.indices
                .extend_from_slice(&[i + 1, next_row + 1, next_row]);
        }
    }

    data
}

/// Generate a cone along the Y axis with its apex up
///
/// # Arguments
/// * `radius` - Radius of the base
/// * `height` - Height from base to apex
/// * `radial_segments` - Number of sides (4 gives a pyramid)
///
/// Spans y = -height/2 (base) to y = +height/2 (apex).
pub fn generate_cone(radius: f32, height: f32, radial_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let segs = radial_segments.max(3);
    let half_height = height * 0.5;
    let slope = if height > 0.0 { radius / height } else { 0.0 };

    // Side: one base vertex and one apex vertex per seam so normals stay per-side
    for i in 0..=segs {
        let theta = i as f32 * 2.0 * PI / segs as f32;
        let (sin_t, cos_t) = theta.sin_cos();
        let length = (1.0 + slope * slope).sqrt();
        let normal = [sin_t / length, slope / length, cos_t / length];
        let u = i as f32 / segs as f32;

        data.vertices
            .push([radius * sin_t, -half_height, radius * cos_t]);
        data.normals.push(normal);
        data.tex_coords.push([u, 1.0]);

        data.vertices.push([0.0, half_height, 0.0]);
        data.normals.push(normal);
        data.tex_coords.push([u, 0.0]);
    }

    for i in 0..segs {
        let base = i * 2;
        let apex = base + 1;
        let next_base = base + 2;
        data.indices.extend_from_slice(&[base, next_base, apex]);
    }

    // Base cap, facing down
    let center = data.vertices.len() as u32;
    data.vertices.push([0.0, -half_height, 0.0]);
    data.normals.push([0.0, -1.0, 0.0]);
    data.tex_coords.push([0.5, 0.5]);

    let ring_start = data.vertices.len() as u32;
    for i in 0..=segs {
        let theta = i as f32 * 2.0 * PI / segs as f32;
        let (sin_t, cos_t) = theta.sin_cos();
        data.vertices
            .push([radius * sin_t, -half_height, radius * cos_t]);
        data.normals.push([0.0, -1.0, 0.0]);
        data.tex_coords
            .push([0.5 + sin_t * 0.5, 0.5 + cos_t * 0.5]);
    }

    for i in 0..segs {
        let current = ring_start + i;
        data.indices.extend_from_slice(&[center, current + 1, current]);
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_normal(data: &GeometryData, triangle: usize) -> [f32; 3] {
        let a = data.vertices[data.indices[triangle * 3] as usize];
        let b = data.vertices[data.indices[triangle * 3 + 1] as usize];
        let c = data.vertices[data.indices[triangle * 3 + 2] as usize];
        let e1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let e2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        [
            e1[1] * e2[2] - e1[2] * e2[1],
            e1[2] * e2[0] - e1[0] * e2[2],
            e1[0] * e2[1] - e1[1] * e2[0],
        ]
    }

    fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    #[test]
    fn test_box_generation() {
        let walls = generate_box(4.0, 2.5, 4.0);
        assert_eq!(walls.vertex_count(), 24);
        assert_eq!(walls.triangle_count(), 12);

        let bounds = walls.bounding_box();
        assert_eq!(bounds.min, [-2.0, -1.25, -2.0]);
        assert_eq!(bounds.max, [2.0, 1.25, 2.0]);
    }

    #[test]
    fn box_faces_point_outward() {
        let cube = generate_box(1.0, 1.0, 1.0);
        for triangle in 0..cube.triangle_count() {
            let vertex = cube.indices[triangle * 3] as usize;
            assert!(dot(face_normal(&cube, triangle), cube.normals[vertex]) > 0.0);
        }
    }

    #[test]
    fn test_sphere_generation() {
        let sphere = generate_sphere(1.0, 16, 16);
        assert_eq!(sphere.vertex_count(), 17 * 17);
        assert_eq!(sphere.triangle_count(), 16 * 16 * 2);
        assert_eq!(sphere.vertices.len(), sphere.normals.len());
        assert_eq!(sphere.vertices.len(), sphere.tex_coords.len());

        let bounds = sphere.bounding_box();
        assert!((bounds.max[1] - 1.0).abs() < 1e-6);
        assert!((bounds.min[1] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_plane_generation() {
        let plane = generate_plane(2.0, 2.0, 2, 2);
        assert_eq!(plane.vertices.len(), 9);
        assert_eq!(plane.indices.len(), 24);
        for triangle in 0..plane.triangle_count() {
            assert!(face_normal(&plane, triangle)[2] > 0.0);
        }
    }

    #[test]
    fn cone_spans_its_height() {
        let roof = generate_cone(3.5, 1.0, 4);
        let bounds = roof.bounding_box();
        assert_eq!(bounds.min[1], -0.5);
        assert_eq!(bounds.max[1], 0.5);
        assert!((bounds.max[2] - 3.5).abs() < 1e-5);
        // four sides plus four cap triangles
        assert_eq!(roof.triangle_count(), 8);
    }

    #[test]
    fn cone_sides_face_outward() {
        let roof = generate_cone(1.0, 1.0, 8);
        for triangle in 0..roof.triangle_count() {
            let vertex = roof.indices[triangle * 3] as usize;
            assert!(dot(face_normal(&roof, triangle), roof.normals[vertex]) > 0.0);
        }
    }
}
