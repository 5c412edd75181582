//! Global uniform bindings for camera, lighting and fog
//!
//! Manages the uniform buffer and bind group for per-frame state shared by
//! every draw in the scene. Bound to slot 0 in all render pipelines.

use crate::{
    gfx::{
        camera::CameraUniform,
        scene::{Fog, LightKind, Scene},
    },
    wgpu_utils::{binding_types, BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc, UniformBuffer},
};

/// Point lights beyond this count are ignored by the shader
pub const MAX_POINT_LIGHTS: usize = 8;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightUniform {
    pub position: [f32; 3],
    /// Cutoff distance; 0 means no cutoff
    pub distance: f32,
    /// Color premultiplied by intensity
    pub color: [f32; 3],
    _padding: f32,
}

/// Global uniform buffer content structure
///
/// MUST match the Globals struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    view_proj: [[f32; 4]; 4],
    view_position: [f32; 4],
    /// rgb = fog color, a = exp2 density (0 disables fog)
    fog: [f32; 4],
    ambient_color: [f32; 4],
    directional_color: [f32; 4],
    /// Direction the directional light travels, w unused
    directional_direction: [f32; 4],
    /// World to shadow map clip space for the shadowed directional light
    shadow_view_proj: [[f32; 4]; 4],
    /// x = 1 when a shadow map is bound, y = depth bias, z = texel size
    shadow_params: [f32; 4],
    point_lights: [PointLightUniform; MAX_POINT_LIGHTS],
    point_light_count: u32,
    _padding: [u32; 3],
}

impl Default for GlobalUBOContent {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

impl GlobalUBOContent {
    /// Collects camera, fog and every reachable visible light from the scene
    pub fn gather(camera: &CameraUniform, scene: &Scene) -> Self {
        let mut content = Self {
            view_proj: camera.view_proj,
            view_position: camera.view_position,
            fog: fog_vector(scene.fog),
            ..Default::default()
        };

        if let Some(caster) = scene.shadow_light() {
            if let Some(shadow) = caster.light.shadow {
                content.shadow_view_proj = shadow.view_proj(caster.position, caster.direction()).into();
                content.shadow_params = [1.0, shadow.bias, 1.0 / shadow.map_size as f32, 0.0];
            }
        }

        let mut dropped = 0;
        for instance in scene.light_instances() {
            let light = instance.light;
            let color = light.color.map(|c| c * light.intensity);
            match light.kind {
                LightKind::Ambient => {
                    for i in 0..3 {
                        content.ambient_color[i] += color[i];
                    }
                }
                LightKind::Directional => {
                    content.directional_color = [color[0], color[1], color[2], 0.0];
                    let direction = instance.direction();
                    content.directional_direction = [direction.x, direction.y, direction.z, 0.0];
                }
                LightKind::Point { distance } => {
                    let index = content.point_light_count as usize;
                    if index == MAX_POINT_LIGHTS {
                        dropped += 1;
                        continue;
                    }
                    content.point_lights[index] = PointLightUniform {
                        position: instance.position.into(),
                        distance,
                        color,
                        _padding: 0.0,
                    };
                    content.point_light_count += 1;
                }
            }
        }
        if dropped > 0 {
            log::warn!("{} point lights exceed the limit of {}", dropped, MAX_POINT_LIGHTS);
        }

        content
    }

    pub fn point_light_count(&self) -> u32 {
        self.point_light_count
    }

    pub fn has_shadow(&self) -> bool {
        self.shadow_params[0] > 0.0
    }
}

fn fog_vector(fog: Option<Fog>) -> [f32; 4] {
    match fog {
        Some(fog) => [fog.color[0], fog.color[1], fog.color[2], fog.density],
        None => [0.0; 4],
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// Manages the bind group layout and bind group for global uniforms
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Globals Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    pub fn create_bind_group(&mut self, device: &wgpu::Device, ubo: &GlobalUBO) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .create(device, "Global Bind Group"),
        );
    }

    pub fn bind_group_layouts(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    /// `None` until `create_bind_group()` has been called
    pub fn bind_groups(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::{Light, LightShadow, Transform};

    #[test]
    fn uniform_matches_shader_layout() {
        assert_eq!(std::mem::size_of::<PointLightUniform>(), 32);
        assert_eq!(std::mem::size_of::<GlobalUBOContent>(), 496);
    }

    #[test]
    fn gather_collects_lights_and_fog() {
        let mut scene = Scene::new();
        let root = scene.root();
        scene.fog = Some(Fog {
            color: [0.1, 0.2, 0.3],
            density: 0.05,
        });
        scene.add_light(root, "ambient", Light::ambient([1.0; 3], 0.12));
        let moon = scene.add_light(root, "moon", Light::directional([1.0; 3], 0.5));
        scene.node_mut(moon).unwrap().transform = Transform::from_position(0.0, 4.0, 0.0);
        scene.add_light(root, "lamp", Light::point([1.0, 0.5, 0.0], 2.0, 7.0));

        let content = GlobalUBOContent::gather(&CameraUniform::default(), &scene);
        assert_eq!(content.fog, [0.1, 0.2, 0.3, 0.05]);
        assert!((content.ambient_color[0] - 0.12).abs() < 1e-6);
        assert_eq!(content.directional_direction, [0.0, -1.0, 0.0, 0.0]);
        assert_eq!(content.point_light_count(), 1);
        assert_eq!(content.point_lights[0].color, [2.0, 1.0, 0.0]);
        assert_eq!(content.point_lights[0].distance, 7.0);
        assert!(!content.has_shadow());
    }

    #[test]
    fn shadowed_moon_fills_shadow_params() {
        let mut scene = Scene::new();
        let root = scene.root();
        let shadow = LightShadow::default().with_map_size(256).with_far(14.0);
        let moon = scene.add_light(root, "moon", Light::directional([1.0; 3], 0.12).with_shadow(shadow));
        scene.node_mut(moon).unwrap().transform = Transform::from_position(4.0, 4.0, 4.0);

        let content = GlobalUBOContent::gather(&CameraUniform::default(), &scene);
        assert!(content.has_shadow());
        assert_eq!(content.shadow_params[2], 1.0 / 256.0);
        let origin = cgmath::Matrix4::from(content.shadow_view_proj) * cgmath::Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!(origin.x.abs() < 1e-5 && origin.y.abs() < 1e-5);
        assert!(origin.z > 0.0 && origin.z < 1.0);
    }

    #[test]
    fn excess_point_lights_are_dropped() {
        let mut scene = Scene::new();
        let root = scene.root();
        for i in 0..MAX_POINT_LIGHTS + 3 {
            scene.add_light(root, &format!("light {i}"), Light::point([1.0; 3], 1.0, 0.0));
        }
        let content = GlobalUBOContent::gather(&CameraUniform::default(), &scene);
        assert_eq!(content.point_light_count() as usize, MAX_POINT_LIGHTS);
    }
}
