//! Material system for the forward renderer
//!
//! Materials are stored in [`MaterialManager`] and meshes reference them by
//! ID. Each material owns its GPU uniform and a bind group holding its image
//! maps; missing maps bind a neutral white texture.

use std::{collections::HashMap, path::PathBuf, sync::Arc};
use wgpu::Device;

use super::texture_resource::{TextureLoader, TextureResource};
use crate::wgpu_utils::{
    binding_types, BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc,
    UniformBuffer,
};

/// Material ID for referencing materials
pub type MaterialId = String;

/// Parses `#rrggbb` into linear-light RGB
///
/// Hex colors are written in sRGB; lighting happens in linear space.
pub fn hex_rgb(hex: &str) -> Option<[f32; 3]> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 {
        return None;
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .ok()
            .map(|v| srgb_to_linear(v as f32 / 255.0))
    };
    Some([channel(0)?, channel(2)?, channel(4)?])
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// GPU uniform data for materials
///
/// MUST match the Material struct in mesh.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    pub uv_repeat: [f32; 2],
    pub metallic: f32,
    pub roughness: f32,
    pub occlusion_strength: f32,
    _padding: [f32; 3],
}

type MaterialUBO = UniformBuffer<MaterialUniform>;

/// Image maps sampled by a material, relative to the asset root
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureMaps {
    pub color: Option<PathBuf>,
    pub alpha: Option<PathBuf>,
    pub ambient_occlusion: Option<PathBuf>,
    pub roughness: Option<PathBuf>,
    pub metalness: Option<PathBuf>,
}

impl TextureMaps {
    pub fn is_empty(&self) -> bool {
        self.color.is_none()
            && self.alpha.is_none()
            && self.ambient_occlusion.is_none()
            && self.roughness.is_none()
            && self.metalness.is_none()
    }

    /// Map slots in bind group order, with whether each is sRGB encoded
    fn slots(&self) -> [(&Option<PathBuf>, bool); 5] {
        [
            (&self.color, true),
            (&self.alpha, false),
            (&self.ambient_occlusion, false),
            (&self.roughness, false),
            (&self.metalness, false),
        ]
    }
}

/// Bind group layout shared by every material (group 2 in the mesh pipelines)
pub struct MaterialBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
}

impl MaterialBindings {
    pub fn new(device: &Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .next_binding_fragment(binding_types::texture_2d()) // color
            .next_binding_fragment(binding_types::texture_2d()) // alpha
            .next_binding_fragment(binding_types::texture_2d()) // ambient occlusion
            .next_binding_fragment(binding_types::texture_2d()) // roughness
            .next_binding_fragment(binding_types::texture_2d()) // metalness
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(device, "Material Bind Group Layout");

        Self { bind_group_layout }
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }
}

struct MaterialGpu {
    ubo: MaterialUBO,
    bind_group: wgpu::BindGroup,
    _textures: Vec<Arc<TextureResource>>,
}

/// Surface description for a mesh
///
/// Contains material properties and GPU resources. Materials are stored
/// centrally in MaterialManager and shared between meshes.
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub occlusion_strength: f32,
    pub uv_repeat: [f32; 2],
    /// Drawn after opaque meshes with alpha blending
    pub transparent: bool,
    pub maps: TextureMaps,

    gpu: Option<MaterialGpu>,
}

impl Default for Material {
    fn default() -> Self {
        Self::new("Default")
    }
}

impl Material {
    /// Creates a white, fully rough, non-metallic material
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            base_color: [1.0, 1.0, 1.0, 1.0],
            metallic: 0.0,
            roughness: 1.0,
            occlusion_strength: 1.0,
            uv_repeat: [1.0, 1.0],
            transparent: false,
            maps: TextureMaps::default(),
            gpu: None,
        }
    }

    /// Builder pattern: Set base color from RGB values
    pub fn with_color(mut self, rgb: [f32; 3]) -> Self {
        self.base_color = [rgb[0], rgb[1], rgb[2], self.base_color[3]];
        self
    }

    /// Builder pattern: Set base color from a `#rrggbb` string; invalid strings keep white
    pub fn with_hex_color(self, hex: &str) -> Self {
        match hex_rgb(hex) {
            Some(rgb) => self.with_color(rgb),
            None => {
                log::warn!("Invalid color '{}' for material '{}'", hex, self.name);
                self
            }
        }
    }

    pub fn with_maps(mut self, maps: TextureMaps) -> Self {
        self.maps = maps;
        self
    }

    /// Builder pattern: Repeat every map `count` times across the surface
    pub fn with_uv_repeat(mut self, count: f32) -> Self {
        self.uv_repeat = [count, count];
        self
    }

    pub fn with_transparency(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    /// Builder pattern: Set metallic factor
    pub fn with_metallic(mut self, metallic: f32) -> Self {
        self.metallic = metallic.clamp(0.0, 1.0);
        self
    }

    /// Builder pattern: Set roughness factor
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }

    fn uniform(&self) -> MaterialUniform {
        MaterialUniform {
            base_color: self.base_color,
            uv_repeat: self.uv_repeat,
            metallic: self.metallic,
            roughness: self.roughness,
            occlusion_strength: self.occlusion_strength,
            _padding: [0.0; 3],
        }
    }

    /// Updates GPU resources for this material
    ///
    /// Loads maps and builds the bind group on first call; later calls only
    /// refresh the uniform.
    pub fn update_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        bindings: &MaterialBindings,
        loader: &mut TextureLoader,
    ) {
        if self.gpu.is_none() {
            let ubo = MaterialUBO::new(device);
            let textures: Vec<Arc<TextureResource>> = self
                .maps
                .slots()
                .iter()
                .map(|(path, srgb)| match path {
                    Some(path) => loader.load(device, queue, path, *srgb),
                    None => loader.fallback(),
                })
                .collect();

            let mut builder =
                BindGroupBuilder::new(&bindings.bind_group_layout).resource(ubo.binding_resource());
            for texture in &textures {
                builder = builder.texture(&texture.view);
            }
            let bind_group = builder
                .sampler(&textures[0].sampler)
                .create(device, &format!("Material: {}", self.name));

            self.gpu = Some(MaterialGpu {
                ubo,
                bind_group,
                _textures: textures,
            });
        }

        let uniform = self.uniform();
        if let Some(gpu) = &mut self.gpu {
            gpu.ubo.update_content(queue, uniform);
        }
    }

    /// Gets the bind group for rendering
    pub fn get_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().map(|gpu| &gpu.bind_group)
    }
}

/// Manages all materials used by a scene
///
/// Meshes reference materials by ID rather than storing material data
/// directly, so GPU resources are shared between meshes.
pub struct MaterialManager {
    materials: HashMap<MaterialId, Material>,
    default_material_id: MaterialId,
}

impl MaterialManager {
    /// Creates a new material manager with a default material
    pub fn new() -> Self {
        let default_material = Material::default();
        let default_material_id = default_material.name.clone();
        let mut materials = HashMap::new();
        materials.insert(default_material_id.clone(), default_material);

        Self {
            materials,
            default_material_id,
        }
    }

    /// Adds a material, replacing any material with the same name
    pub fn add_material(&mut self, material: Material) {
        self.materials.insert(material.name.clone(), material);
    }

    pub fn get_material(&self, id: &str) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn get_material_mut(&mut self, id: &str) -> Option<&mut Material> {
        self.materials.get_mut(id)
    }

    /// Gets material for a mesh with fallback to default
    pub fn get_material_for_mesh(&self, id: &str) -> Option<&Material> {
        self.get_material(id)
            .or_else(|| self.materials.get(&self.default_material_id))
    }

    /// Lists all material IDs
    pub fn list_materials(&self) -> Vec<&MaterialId> {
        self.materials.keys().collect()
    }

    /// Updates GPU resources for all materials
    pub fn update_all_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        bindings: &MaterialBindings,
        loader: &mut TextureLoader,
    ) {
        for material in self.materials.values_mut() {
            material.update_gpu_resources(device, queue, bindings, loader);
        }
    }
}

impl Default for MaterialManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_parse_to_linear() {
        assert_eq!(hex_rgb("#ffffff"), Some([1.0, 1.0, 1.0]));
        assert_eq!(hex_rgb("#000000"), Some([0.0, 0.0, 0.0]));
        let fog = hex_rgb("#262837").unwrap();
        assert!(fog[2] > fog[0]);
        assert!(fog.iter().all(|c| (0.0..0.05).contains(c)));
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert_eq!(hex_rgb("#fff"), None);
        assert_eq!(hex_rgb("#gg0000"), None);
        let material = Material::new("roof").with_hex_color("oops");
        assert_eq!(material.base_color, [1.0; 4]);
    }

    #[test]
    fn unknown_material_falls_back_to_default() {
        let mut manager = MaterialManager::new();
        manager.add_material(Material::new("grave").with_hex_color("#b2b6b1"));
        assert_eq!(manager.get_material_for_mesh("grave").map(|m| m.name.as_str()), Some("grave"));
        assert_eq!(
            manager.get_material_for_mesh("missing").map(|m| m.name.as_str()),
            Some("Default")
        );
        assert_eq!(manager.list_materials().len(), 2);
    }

    #[test]
    fn uniform_matches_shader_layout() {
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 48);
    }
}
