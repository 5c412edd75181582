//! Light payloads for scene nodes

use cgmath::{EuclideanSpace, Matrix4, Point3, Vector3};

use crate::gfx::camera::orbit_camera::OPENGL_TO_WGPU_MATRIX;

/// Light variants supported by the forward renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Uniform light from all directions
    Ambient,
    /// Parallel light shining from the node's position toward the origin
    Directional,
    /// Omnidirectional light fading to zero at `distance` (0 = no cutoff)
    Point { distance: f32 },
}

/// Shadow map settings for a light.
///
/// Only directional lights render a shadow map; the map covers an
/// orthographic box `extent` units to each side of the light's axis, from
/// `near` to `far` along it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightShadow {
    pub map_size: u32,
    pub near: f32,
    pub far: f32,
    pub extent: f32,
    /// Depth offset subtracted before the comparison, in light clip units
    pub bias: f32,
}

impl Default for LightShadow {
    fn default() -> Self {
        Self {
            map_size: 512,
            near: 0.5,
            far: 500.0,
            extent: 5.0,
            bias: 0.002,
        }
    }
}

impl LightShadow {
    pub fn with_map_size(mut self, map_size: u32) -> Self {
        self.map_size = map_size.max(1);
        self
    }

    pub fn with_far(mut self, far: f32) -> Self {
        self.far = far;
        self
    }

    /// Light-space view projection for a light at `position` travelling along
    /// `direction`, with wgpu's 0..1 depth range
    pub fn view_proj(&self, position: Vector3<f32>, direction: Vector3<f32>) -> Matrix4<f32> {
        let up = if direction.x.abs() < 1e-4 && direction.z.abs() < 1e-4 {
            Vector3::unit_z()
        } else {
            Vector3::unit_y()
        };
        let view = Matrix4::look_to_rh(Point3::from_vec(position), direction, up);
        let e = self.extent;
        OPENGL_TO_WGPU_MATRIX * cgmath::ortho(-e, e, -e, e, self.near, self.far) * view
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: [f32; 3],
    pub intensity: f32,
    pub shadow: Option<LightShadow>,
}

impl Light {
    pub fn ambient(color: [f32; 3], intensity: f32) -> Self {
        Self {
            kind: LightKind::Ambient,
            color,
            intensity,
            shadow: None,
        }
    }

    pub fn directional(color: [f32; 3], intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional,
            color,
            intensity,
            shadow: None,
        }
    }

    pub fn point(color: [f32; 3], intensity: f32, distance: f32) -> Self {
        Self {
            kind: LightKind::Point { distance },
            color,
            intensity,
            shadow: None,
        }
    }

    pub fn with_shadow(mut self, shadow: LightShadow) -> Self {
        self.shadow = Some(shadow);
        self
    }

    pub fn distance(&self) -> Option<f32> {
        match self.kind {
            LightKind::Point { distance } => Some(distance),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector4};

    fn project(matrix: &Matrix4<f32>, x: f32, y: f32, z: f32) -> Vector3<f32> {
        let clip = matrix * Vector4::new(x, y, z, 1.0);
        clip.truncate() / clip.w
    }

    #[test]
    fn shadow_box_centres_on_the_light_axis() {
        let shadow = LightShadow::default().with_far(14.0);
        let position = Vector3::new(4.0, 4.0, 4.0);
        let matrix = shadow.view_proj(position, -position.normalize());

        let origin = project(&matrix, 0.0, 0.0, 0.0);
        assert!(origin.x.abs() < 1e-5 && origin.y.abs() < 1e-5);
        let expected = (position.magnitude() - 0.5) / (14.0 - 0.5);
        assert!((origin.z - expected).abs() < 1e-4);

        // beyond `far` along the axis
        let far = project(&matrix, -5.0, -5.0, -5.0);
        assert!(far.z > 1.0);
    }

    #[test]
    fn straight_down_light_has_a_valid_basis() {
        let shadow = LightShadow::default().with_far(10.0);
        let matrix = shadow.view_proj(Vector3::new(0.0, 4.0, 0.0), Vector3::new(0.0, -1.0, 0.0));
        let ground = project(&matrix, 2.5, 0.0, 0.0);
        assert!(ground.x.is_finite() && ground.y.is_finite());
        assert!((ground.x.abs().max(ground.y.abs()) - 0.5).abs() < 1e-5);
        assert!((ground.z - (4.0 - 0.5) / 9.5).abs() < 1e-5);
    }
}
