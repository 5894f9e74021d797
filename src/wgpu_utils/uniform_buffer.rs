// src/wgpu_utils/uniform_buffer.rs
use std::marker::PhantomData;

/// Typed uniform buffer that only uploads when its content changes
pub struct UniformBuffer<Content> {
    buffer: wgpu::Buffer,
    uploaded: Option<Vec<u8>>,
    content_type: PhantomData<Content>,
}

impl<Content: bytemuck::Pod> UniformBuffer<Content> {
    pub fn new(device: &wgpu::Device, label: &str) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<Content>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            buffer,
            uploaded: None,
            content_type: PhantomData,
        }
    }

    /// Writes `content` unless the buffer already holds the same bytes
    ///
    /// Returns whether a write was queued.
    pub fn update_content(&mut self, queue: &wgpu::Queue, content: Content) -> bool {
        let bytes = bytemuck::bytes_of(&content);
        if self.uploaded.as_deref() == Some(bytes) {
            return false;
        }
        queue.write_buffer(&self.buffer, 0, bytes);
        self.uploaded = Some(bytes.to_vec());
        true
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }
}

/// Rounds `size` up to the next multiple of `alignment`
pub fn align_to(size: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        return size;
    }
    size.div_ceil(alignment) * alignment
}
