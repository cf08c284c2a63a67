use std::sync::{Arc, Mutex};
use ash::vk;
use color_eyre::eyre::Result;
use gpu_allocator::vulkan::Allocator;
use gpu_allocator::MemoryLocation;
use crate::renderer::resources::buffer::Buffer;
use crate::renderer::resources::geometry::{DrawRange, HostGeometry};

/// Geometry living in device-local vertex and index buffers
pub struct Mesh {
    geometry: HostGeometry,
    vertex_buffers: Vec<Buffer>,
    index_buffer: Buffer,
    index_type: vk::IndexType,

    // Kept alive until the copy commands have executed
    staging_buffers: Vec<Buffer>,
}

impl Mesh {
    /// Create the GPU buffers and record the staging copies into `cmd`.
    /// Call `release_staging` once the submission containing `cmd` has completed.
    pub fn new(
        geometry: HostGeometry,
        cmd: vk::CommandBuffer,
        memory_allocator: Arc<Mutex<Allocator>>,
        device: Arc<ash::Device>,
    ) -> Result<Self> {
        let mut staging_buffers = Vec::with_capacity(geometry.streams.len() + 1);

        let mut vertex_buffers = Vec::with_capacity(geometry.streams.len());
        for (i, stream) in geometry.streams.iter().enumerate() {
            log::debug!(
                "{} vertex stream {i}: {} x {} B, {} B total",
                geometry.name,
                stream.count,
                stream.stride,
                stream.size_in_bytes(),
            );
            let (staging, buffer) = upload_bytes(
                &stream.bytes,
                vk::BufferUsageFlags::VERTEX_BUFFER,
                &format!("{} vertex stream {i}", geometry.name),
                cmd,
                &memory_allocator,
                &device,
            )?;
            staging_buffers.push(staging);
            vertex_buffers.push(buffer);
        }

        let (staging, index_buffer) = upload_bytes(
            geometry.index_bytes(),
            vk::BufferUsageFlags::INDEX_BUFFER,
            &format!("{} indices", geometry.name),
            cmd,
            &memory_allocator,
            &device,
        )?;
        staging_buffers.push(staging);

        let barriers: Vec<vk::BufferMemoryBarrier2> = vertex_buffers
            .iter()
            .map(|buffer| (buffer, vk::AccessFlags2::VERTEX_ATTRIBUTE_READ))
            .chain(std::iter::once((&index_buffer, vk::AccessFlags2::INDEX_READ)))
            .map(|(buffer, dst_access)| {
                vk::BufferMemoryBarrier2::default()
                    .src_stage_mask(vk::PipelineStageFlags2::COPY)
                    .src_access_mask(vk::AccessFlags2::TRANSFER_WRITE)
                    .dst_stage_mask(vk::PipelineStageFlags2::VERTEX_INPUT)
                    .dst_access_mask(dst_access)
                    .buffer(buffer.buffer)
                    .offset(0)
                    .size(vk::WHOLE_SIZE)
            })
            .collect();
        let dep_info = vk::DependencyInfo::default()
            .buffer_memory_barriers(&barriers);
        unsafe {
            device.cmd_pipeline_barrier2(cmd, &dep_info);
        }

        log::info!(
            "Uploaded mesh {:?}: {} vertices in {} stream(s), {} indices",
            geometry.name,
            geometry.vertex_count(),
            geometry.streams.len(),
            geometry.index_count(),
        );

        Ok(Self {
            geometry,
            vertex_buffers,
            index_buffer,
            index_type: vk::IndexType::UINT16,
            staging_buffers,
        })
    }

    /// Drop the staging copies. Only valid after the upload submission finished.
    pub fn release_staging(&mut self) {
        self.staging_buffers.clear();
    }

    pub fn get_draw_ranges(&self) -> impl Iterator<Item = (&str, DrawRange)> {
        self.geometry
            .draw_ranges
            .iter()
            .map(|(name, range)| (name.as_str(), *range))
    }

    /// Bind every vertex stream starting at binding 0, then the index buffer
    pub fn bind(&self, cmd: vk::CommandBuffer, device: &ash::Device) {
        let buffers: Vec<vk::Buffer> = self.vertex_buffers
            .iter()
            .map(|buffer| buffer.buffer)
            .collect();
        let offsets = vec![0; buffers.len()];
        unsafe {
            device.cmd_bind_vertex_buffers(cmd, 0, &buffers, &offsets);
            device.cmd_bind_index_buffer(cmd, self.index_buffer.buffer, 0, self.index_type);
        }
    }
}

/// Write `bytes` into a fresh staging buffer and record a copy into a new device-local buffer
fn upload_bytes(
    bytes: &[u8],
    usage: vk::BufferUsageFlags,
    name: &str,
    cmd: vk::CommandBuffer,
    memory_allocator: &Arc<Mutex<Allocator>>,
    device: &Arc<ash::Device>,
) -> Result<(Buffer, Buffer)> {
    let size = bytes.len() as u64;

    let mut staging = Buffer::new(
        size,
        vk::BufferUsageFlags::TRANSFER_SRC,
        &format!("{name} (staging)"),
        MemoryLocation::CpuToGpu,
        memory_allocator.clone(),
        device.clone(),
    )?;
    staging.write(bytes, 0)?;

    let buffer = Buffer::new(
        size,
        usage | vk::BufferUsageFlags::TRANSFER_DST,
        name,
        MemoryLocation::GpuOnly,
        memory_allocator.clone(),
        device.clone(),
    )?;

    let region = vk::BufferCopy::default()
        .src_offset(0)
        .dst_offset(0)
        .size(size);
    unsafe {
        device.cmd_copy_buffer(cmd, staging.buffer, buffer.buffer, &[region]);
    }

    Ok((staging, buffer))
}
