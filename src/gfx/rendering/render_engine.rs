//! WGPU-based forward renderer for the haunted house scene
//!
//! Renders the moon's shadow map first when a shadowed directional light is
//! reachable, then draws the scene graph over one render target: opaque
//! meshes, transparent meshes sorted back to front, then helper lines. An
//! optional UI callback records its own pass on top.

use cgmath::{InnerSpace, Matrix, Matrix4, SquareMatrix, Vector3, Vector4};
use std::{collections::HashMap, path::PathBuf, sync::Arc};
use wgpu::util::DeviceExt;

use crate::{
    gfx::{
        camera::CameraUniform,
        resources::{
            GlobalBindings, GlobalUBO, GlobalUBOContent, MaterialBindings, TextureLoader,
            TextureResource,
        },
        scene::{helper_lines, LineVertex, MeshInstance, NodeId, Scene},
    },
    wgpu_utils::{binding_types, BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc, UniformBuffer},
};

use super::pipeline_manager::{PipelineConfig, PipelineManager, VertexLayout};

const MESH_PIPELINE: &str = "Mesh";
const TRANSPARENT_PIPELINE: &str = "MeshTransparent";
const LINE_PIPELINE: &str = "Lines";
const SHADOW_PIPELINE: &str = "Shadow";

/// Failures while setting up or driving the GPU
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to acquire GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("failed to acquire surface frame: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("shader '{0}' is not loaded")]
    ShaderNotFound(String),
}

/// Per-draw transform; MUST match the Transform struct in mesh.wgsl
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    /// x = 1 when the mesh receives shadows
    pub flags: [f32; 4],
}

impl TransformUniform {
    pub fn new(world: &Matrix4<f32>, receive_shadow: bool) -> Self {
        let normal = world
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or(*world);
        Self {
            model: (*world).into(),
            normal: normal.into(),
            flags: [if receive_shadow { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }
}

// GPU resources for one mesh node
struct ObjectGpuResources {
    transform_ubo: UniformBuffer<TransformUniform>,
    transform_bind_group: wgpu::BindGroup,
}

struct GeometryBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

// Depth map for the shadowed directional light and the bind group sampling it
struct ShadowMap {
    size: u32,
    depth: TextureResource,
    bind_group: wgpu::BindGroup,
}

impl ShadowMap {
    fn new(device: &wgpu::Device, layout: &BindGroupLayoutWithDesc, size: u32) -> Self {
        let depth = TextureResource::create_shadow_map(device, size);
        let bind_group = BindGroupBuilder::new(layout)
            .texture(&depth.view)
            .sampler(&depth.sampler)
            .create(device, "Shadow Bind Group");
        Self {
            size,
            depth,
            bind_group,
        }
    }
}

struct LineBuffer {
    buffer: wgpu::Buffer,
    capacity: usize,
}

/// Draw statistics for the last rendered frame
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub vertex_count: u32,
}

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: wgpu::TextureFormat,
    pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    transform_layout: BindGroupLayoutWithDesc,
    material_bindings: MaterialBindings,
    shadow_layout: BindGroupLayoutWithDesc,
    shadow_map: ShadowMap,
    texture_loader: TextureLoader,
    geometry_buffers: Vec<GeometryBuffers>,
    objects: HashMap<NodeId, ObjectGpuResources>,
    line_buffer: Option<LineBuffer>,
    last_stats: FrameStats,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    /// * `assets_root` - Directory texture paths are resolved against
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        assets_root: PathBuf,
    ) -> Result<RenderEngine, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or(RenderError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let global_ubo = GlobalUBO::new(&device);
        let mut global_bindings = GlobalBindings::new(&device);
        global_bindings.create_bind_group(&device, &global_ubo);

        let transform_layout = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform())
            .create(&device, "Transform Bind Group Layout");
        let material_bindings = MaterialBindings::new(&device);
        let shadow_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_depth_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Comparison))
            .create(&device, "Shadow Bind Group Layout");
        // Placeholder until a shadowed light asks for its own size
        let shadow_map = ShadowMap::new(&device, &shadow_layout, 1);
        let texture_loader = TextureLoader::new(&device, &queue, assets_root);

        let device_handle: Arc<wgpu::Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("mesh", include_str!("shaders/mesh.wgsl"));
        pipeline_manager.load_shader("lines", include_str!("shaders/lines.wgsl"));
        pipeline_manager.load_shader("shadow", include_str!("shaders/shadow.wgsl"));

        // Both faces are drawn so thin casters do not leak light
        pipeline_manager.register_pipeline(
            SHADOW_PIPELINE,
            PipelineConfig::default()
                .with_label("SHADOW")
                .with_shader("shadow")
                .with_depth_stencil(TextureResource::DEPTH_FORMAT)
                .with_depth_bias(2, 2.0)
                .with_cull_mode(None)
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layouts().clone(),
                    transform_layout.layout.clone(),
                ])
                .with_color_targets(vec![]),
        );

        let mesh_layouts = vec![
            global_bindings.bind_group_layouts().clone(),
            transform_layout.layout.clone(),
            material_bindings.layout().clone(),
            shadow_layout.layout.clone(),
        ];
        let opaque_target = wgpu::ColorTargetState {
            format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        };
        let blended_target = wgpu::ColorTargetState {
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            ..opaque_target.clone()
        };

        pipeline_manager.register_pipeline(
            MESH_PIPELINE,
            PipelineConfig::default()
                .with_label("MESH")
                .with_shader("mesh")
                .with_depth_stencil(TextureResource::DEPTH_FORMAT)
                .with_bind_group_layouts(mesh_layouts.clone())
                .with_color_targets(vec![Some(opaque_target.clone())]),
        );

        // Planes such as the door are single sided geometry seen from both sides
        pipeline_manager.register_pipeline(
            TRANSPARENT_PIPELINE,
            PipelineConfig::default()
                .with_label("MESH TRANSPARENT")
                .with_shader("mesh")
                .with_depth_stencil(TextureResource::DEPTH_FORMAT)
                .without_depth_write()
                .with_cull_mode(None)
                .with_bind_group_layouts(mesh_layouts)
                .with_color_targets(vec![Some(blended_target)]),
        );

        pipeline_manager.register_pipeline(
            LINE_PIPELINE,
            PipelineConfig::default()
                .with_label("LINES")
                .with_shader("lines")
                .with_vertex_layout(VertexLayout::Line)
                .with_primitive_topology(wgpu::PrimitiveTopology::LineList)
                .with_cull_mode(None)
                .with_depth_stencil(TextureResource::DEPTH_FORMAT)
                .with_bind_group_layouts(vec![global_bindings.bind_group_layouts().clone()])
                .with_color_targets(vec![Some(opaque_target)]),
        );

        pipeline_manager.create_all_pipelines()?;
        log::info!(
            "Render engine ready ({}x{}, {:?})",
            config.width,
            config.height,
            format
        );

        Ok(RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            depth_texture,
            format,
            pipeline_manager,
            global_ubo,
            global_bindings,
            transform_layout,
            material_bindings,
            shadow_layout,
            shadow_map,
            texture_loader,
            geometry_buffers: Vec::new(),
            objects: HashMap::new(),
            line_buffer: None,
            last_stats: FrameStats::default(),
        })
    }

    /// Uploads anything the scene gained since the last frame and refreshes
    /// per-frame uniforms; returns whether a shadow pass is needed
    fn prepare(&mut self, scene: &mut Scene, camera: &CameraUniform) -> bool {
        scene.material_manager.update_all_gpu_resources(
            &self.device,
            &self.queue,
            &self.material_bindings,
            &mut self.texture_loader,
        );

        for geometry in &scene.geometries()[self.geometry_buffers.len()..] {
            let vertices = geometry.to_vertices();
            let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: bytemuck::cast_slice(&geometry.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            self.geometry_buffers.push(GeometryBuffers {
                vertex_buffer,
                index_buffer,
                index_count: geometry.indices.len() as u32,
            });
        }

        for instance in scene.mesh_instances() {
            let device = &self.device;
            let layout = &self.transform_layout;
            let object = self.objects.entry(instance.node).or_insert_with(|| {
                let transform_ubo = UniformBuffer::new(device);
                let transform_bind_group = BindGroupBuilder::new(layout)
                    .resource(transform_ubo.binding_resource())
                    .create(device, "Transform Bind Group");
                ObjectGpuResources {
                    transform_ubo,
                    transform_bind_group,
                }
            });
            object
                .transform_ubo
                .update_content(&self.queue, TransformUniform::new(&instance.world, instance.receive_shadow));
        }

        let shadow_size = scene
            .shadow_light()
            .and_then(|caster| caster.light.shadow)
            .map(|shadow| shadow.map_size);
        if let Some(size) = shadow_size.filter(|size| *size != self.shadow_map.size) {
            log::debug!("Creating {size}x{size} shadow map");
            self.shadow_map = ShadowMap::new(&self.device, &self.shadow_layout, size);
        }

        let globals = GlobalUBOContent::gather(camera, scene);
        self.global_ubo.update_content(&self.queue, globals);
        globals.has_shadow()
    }

    // GPU resources for one mesh, if they are all uploaded
    fn draw_resources(&self, instance: &MeshInstance) -> Option<(&ObjectGpuResources, &GeometryBuffers)> {
        Some((
            self.objects.get(&instance.node)?,
            self.geometry_buffers.get(instance.geometry.index())?,
        ))
    }

    fn upload_lines(&mut self, lines: &[LineVertex]) {
        let needs_growth = self
            .line_buffer
            .as_ref()
            .map_or(true, |buffer| buffer.capacity < lines.len());
        if needs_growth {
            let capacity = lines.len().next_power_of_two();
            self.line_buffer = Some(LineBuffer {
                buffer: self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Helper Lines"),
                    size: (capacity * std::mem::size_of::<LineVertex>()) as u64,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }),
                capacity,
            });
        }
        if let Some(line_buffer) = &self.line_buffer {
            self.queue
                .write_buffer(&line_buffer.buffer, 0, bytemuck::cast_slice(lines));
        }
    }

    /// Renders one frame with an optional UI overlay
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn render_frame<F>(
        &mut self,
        scene: &mut Scene,
        camera: &CameraUniform,
        ui_callback: Option<F>,
    ) -> Result<(), RenderError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out acquiring surface frame, skipping");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let shadowed = self.prepare(scene, camera);
        let lines = helper_lines(scene);
        if !lines.is_empty() {
            self.upload_lines(&lines);
        }

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let mut stats = FrameStats::default();
        let instances = scene.mesh_instances();

        if shadowed {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Depth Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pipeline) = self.pipeline_manager.pipeline(SHADOW_PIPELINE) {
                shadow_pass.set_pipeline(pipeline);
                shadow_pass.set_bind_group(0, self.global_bindings.bind_groups(), &[]);

                for instance in instances.iter().filter(|instance| instance.cast_shadow) {
                    let Some((object, buffers)) = self.draw_resources(instance) else {
                        continue;
                    };
                    shadow_pass.set_bind_group(1, &object.transform_bind_group, &[]);
                    shadow_pass.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
                    shadow_pass
                        .set_index_buffer(buffers.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    shadow_pass.draw_indexed(0..buffers.index_count, 0, 0..1);
                    stats.draw_calls += 1;
                }
            }
        }

        let eye = Vector3::new(camera.view_position[0], camera.view_position[1], camera.view_position[2]);
        let (opaque, mut transparent): (Vec<MeshInstance>, Vec<MeshInstance>) =
            instances.into_iter().partition(|instance| {
                scene
                    .material_manager
                    .get_material_for_mesh(instance.material)
                    .map_or(true, |material| !material.transparent)
            });
        let depth_of = |instance: &MeshInstance| {
            let center = (instance.world * Vector4::new(0.0, 0.0, 0.0, 1.0)).truncate();
            (center - eye).magnitude2()
        };
        transparent.sort_by(|a, b| depth_of(b).total_cmp(&depth_of(a)));

        let [r, g, b] = scene.background;
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_groups(), &[]);
            render_pass.set_bind_group(3, &self.shadow_map.bind_group, &[]);

            for (pipeline_name, instances) in
                [(MESH_PIPELINE, &opaque), (TRANSPARENT_PIPELINE, &transparent)]
            {
                let Some(pipeline) = self.pipeline_manager.pipeline(pipeline_name) else {
                    continue;
                };
                render_pass.set_pipeline(pipeline);

                for instance in instances.iter() {
                    let Some(material) =
                        scene.material_manager.get_material_for_mesh(instance.material)
                    else {
                        continue;
                    };
                    let (Some(material_bind_group), Some((object, buffers))) =
                        (material.get_bind_group(), self.draw_resources(instance))
                    else {
                        log::debug!("Skipping mesh {:?}: GPU resources missing", instance.node);
                        continue;
                    };

                    render_pass.set_bind_group(1, &object.transform_bind_group, &[]);
                    render_pass.set_bind_group(2, material_bind_group, &[]);
                    render_pass.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
                    render_pass
                        .set_index_buffer(buffers.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..buffers.index_count, 0, 0..1);
                    stats.draw_calls += 1;
                    stats.vertex_count += buffers.index_count;
                }
            }

            if let (false, Some(line_buffer), Some(pipeline)) = (
                lines.is_empty(),
                self.line_buffer.as_ref(),
                self.pipeline_manager.pipeline(LINE_PIPELINE),
            ) {
                render_pass.set_pipeline(pipeline);
                render_pass.set_vertex_buffer(0, line_buffer.buffer.slice(..));
                render_pass.draw(0..lines.len() as u32, 0..1);
                stats.draw_calls += 1;
                stats.vertex_count += lines.len() as u32;
            }
        }

        if let Some(ui_callback) = ui_callback {
            ui_callback(&self.device, &self.queue, &mut encoder, &surface_texture_view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        self.last_stats = stats;
        Ok(())
    }

    /// Resizes the surface and recreates the depth buffer; zero sizes are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn normal_matrix_undoes_nonuniform_scale() {
        let world = Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0);
        let uniform = TransformUniform::new(&world, false);
        assert_eq!(uniform.normal[0][0], 0.5);
        assert_eq!(uniform.normal[1][1], 1.0);
        assert_eq!(uniform.flags[0], 0.0);
    }

    #[test]
    fn transform_matches_shader_layout_and_flags_receivers() {
        assert_eq!(std::mem::size_of::<TransformUniform>(), 144);
        let floor = TransformUniform::new(&Matrix4::identity(), true);
        assert_eq!(floor.flags, [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn singular_world_falls_back_to_model() {
        let world = Matrix4::from_nonuniform_scale(0.0, 1.0, 1.0);
        let uniform = TransformUniform::new(&world, false);
        assert_eq!(uniform.normal, uniform.model);
        let translated = TransformUniform::new(&Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0)), false);
        assert_eq!(translated.model[3], [1.0, 2.0, 3.0, 1.0]);
    }
}
