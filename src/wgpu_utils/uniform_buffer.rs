use std::marker::PhantomData;

/// GPU buffer holding exactly one `Content` value for a uniform binding.
///
/// The last uploaded bytes are kept on the CPU so unchanged values are not
/// written again every frame.
pub struct UniformBuffer<Content> {
    buffer: wgpu::Buffer,
    content_type: PhantomData<Content>,
    uploaded: Vec<u8>,
}

impl<Content: bytemuck::Pod> UniformBuffer<Content> {
    /// Short type name used as the buffer label
    fn label() -> String {
        let type_name = std::any::type_name::<Content>();
        let short = type_name.rsplit("::").next().unwrap_or(type_name);
        format!("Uniform {short}")
    }

    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&Self::label()),
            size: std::mem::size_of::<Content>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            buffer,
            content_type: PhantomData,
            uploaded: Vec::new(),
        }
    }

    /// Queues a write of `content`; a value equal to the last upload is skipped
    pub fn update_content(&mut self, queue: &wgpu::Queue, content: Content) {
        let bytes = bytemuck::bytes_of(&content);
        if self.uploaded.as_slice() != bytes {
            queue.write_buffer(&self.buffer, 0, bytes);
            self.uploaded.clear();
            self.uploaded.extend_from_slice(bytes);
        }
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }
}
