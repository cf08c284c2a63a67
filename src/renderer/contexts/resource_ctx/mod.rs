pub mod descriptor_allocator;
pub mod descriptor_set_layout_builder;

use ash::vk;
use color_eyre::eyre::{OptionExt, WrapErr};
use color_eyre::Result;
use gpu_descriptor::{DescriptorAllocator, DescriptorSetLayoutCreateFlags, DescriptorTotalCount};
use crate::renderer::config::RenderConfig;
use crate::renderer::contexts::device_ctx::RenderDeviceContext;
use crate::renderer::contexts::resource_ctx::descriptor_allocator::DescriptorAshDevice;
use crate::renderer::contexts::resource_ctx::descriptor_set_layout_builder::DescriptorSetLayoutBuilder;
use crate::renderer::resources::geometry::build_geometry;
use crate::renderer::resources::mesh::Mesh;
use crate::renderer::resources::upload_buffer::UploadBuffer;
use crate::renderer::shader_data::FrameTransform;

pub const FRAME_TRANSFORM_BINDING: u32 = 0;

/// Responsibilities:
/// - Upload the static mesh once at startup
/// - Own the per-frame uniform buffer and the descriptor set that points at it
pub struct RenderResourceContext {
    pub mesh: Mesh,
    pub frame_uniforms: UploadBuffer<FrameTransform>,

    descriptor_set_layout: vk::DescriptorSetLayout,
    descriptor_set: Option<gpu_descriptor::DescriptorSet<vk::DescriptorSet>>,
    descriptor_allocator: DescriptorAllocator<vk::DescriptorPool, vk::DescriptorSet>,
    descriptor_device: DescriptorAshDevice,
}

impl RenderResourceContext {
    pub fn new(
        dev_ctx: &RenderDeviceContext,
        config: &RenderConfig,
    ) -> Result<Self> {
        let device = &dev_ctx.device;

        let mut mesh = device
            .immediate_submit(|cmd, _| {
                Mesh::new(
                    build_geometry(config.geometry),
                    cmd,
                    device.get_memory_allocator(),
                    device.logical.clone(),
                )
            })
            .wrap_err("Failed to upload geometry")?;
        // immediate_submit waited on the fence, so the copies are done
        mesh.release_staging();

        let mut frame_uniforms = UploadBuffer::<FrameTransform>::new(
            1,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
            device.get_min_uniform_buffer_offset_alignment(),
            "Frame transform",
            device.get_memory_allocator(),
            device.logical.clone(),
        )?;
        frame_uniforms.copy_record(0, &FrameTransform::default())?;

        let descriptor_device = DescriptorAshDevice::from(device.logical.clone());
        let descriptor_set_layout = DescriptorSetLayoutBuilder::new()
            .add_binding(
                FRAME_TRANSFORM_BINDING,
                vk::DescriptorType::UNIFORM_BUFFER,
                1,
                vk::ShaderStageFlags::VERTEX,
            )
            .build(vk::DescriptorSetLayoutCreateFlags::empty(), &device.logical)?;

        let mut descriptor_allocator: DescriptorAllocator<vk::DescriptorPool, vk::DescriptorSet>
            = DescriptorAllocator::new(0);
        let descriptor_set = unsafe {
            descriptor_allocator
                .allocate(
                    &descriptor_device,
                    &descriptor_set_layout,
                    DescriptorSetLayoutCreateFlags::empty(),
                    &uniform_buffer_count(1),
                    1,
                )?
                .pop()
                .ok_or_eyre("Failed to allocate the frame descriptor set")?
        };

        let buffer_info = [frame_uniforms.descriptor_info(0)];
        let write = [
            vk::WriteDescriptorSet::default()
                .dst_set(*descriptor_set.raw())
                .dst_binding(FRAME_TRANSFORM_BINDING)
                .dst_array_element(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(&buffer_info),
        ];
        unsafe {
            device.logical.update_descriptor_sets(&write, &[]);
        }

        Ok(Self {
            mesh,
            frame_uniforms,
            descriptor_set_layout,
            descriptor_set: Some(descriptor_set),
            descriptor_allocator,
            descriptor_device,
        })
    }

    pub fn get_descriptor_set_layout(&self) -> vk::DescriptorSetLayout {
        self.descriptor_set_layout
    }

    pub fn get_descriptor_set(&self) -> Option<vk::DescriptorSet> {
        self.descriptor_set.as_ref().map(|set| *set.raw())
    }

    /// Overwrite the single frame record. The previous frame has finished reading it.
    pub fn update_frame_transform(&mut self, transform: &FrameTransform) -> Result<()> {
        self.frame_uniforms.copy_record(0, transform)
    }
}

impl Drop for RenderResourceContext {
    fn drop(&mut self) {
        unsafe {
            if let Some(set) = self.descriptor_set.take() {
                self.descriptor_allocator.free(&self.descriptor_device, std::iter::once(set));
            }
            self.descriptor_allocator.cleanup(&self.descriptor_device);
            self.descriptor_device
                .0
                .destroy_descriptor_set_layout(self.descriptor_set_layout, None);
        }
    }
}

fn uniform_buffer_count(uniform_buffer: u32) -> DescriptorTotalCount {
    DescriptorTotalCount {
        sampler: 0,
        combined_image_sampler: 0,
        sampled_image: 0,
        storage_image: 0,
        uniform_texel_buffer: 0,
        storage_texel_buffer: 0,
        uniform_buffer,
        storage_buffer: 0,
        uniform_buffer_dynamic: 0,
        storage_buffer_dynamic: 0,
        input_attachment: 0,
        acceleration_structure: 0,
        inline_uniform_block_bytes: 0,
        inline_uniform_block_bindings: 0,
    }
}
