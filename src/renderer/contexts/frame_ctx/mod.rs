pub mod back_buffer;
pub mod frame;

use std::sync::Arc;
use ash::vk;
use color_eyre::eyre::OptionExt;
use color_eyre::Result;
use crate::renderer::contexts::device_ctx::RenderDeviceContext;
use crate::renderer::contexts::frame_ctx::back_buffer::BackBufferState;
use crate::renderer::contexts::frame_ctx::frame::Frame;
use crate::renderer::contexts::pipeline_ctx::RenderPipelineContext;
use crate::renderer::contexts::resource_ctx::RenderResourceContext;
use crate::renderer::error::{GpuCallError, VkResultExt};
use crate::renderer::internals::util::{discard_barrier, record_image_barriers, transition_image_layout};
use crate::renderer::resources::geometry::colors;

/// What the caller should do after `draw`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Presented,
    /// The swap chain no longer matches the surface
    ResizeNeeded,
}

/// Responsibilities:
/// - Record, submit and present one frame at a time
/// - Own the per-swap-chain-image semaphores and back buffer states
/// - Block until the GPU has finished the frame before returning
pub struct RenderFrameContext {
    frame: Frame,
    render_finished: Vec<vk::Semaphore>,
    back_buffers: Vec<BackBufferState>,

    device: Arc<ash::Device>,
}

impl RenderFrameContext {
    pub fn new(dev_ctx: &RenderDeviceContext) -> Result<Self> {
        let device = dev_ctx.device.logical.clone();
        let frame = Frame::new(dev_ctx.device.graphics_queue.family.index, device.clone())?;

        let mut frm_ctx = Self {
            frame,
            render_finished: Vec::new(),
            back_buffers: Vec::new(),
            device,
        };
        frm_ctx.reset_back_buffers(dev_ctx.target.swapchain.image_count())?;

        Ok(frm_ctx)
    }

    /// Match the per-image state to a recreated swap chain. The device must be idle.
    pub fn reset_back_buffers(&mut self, image_count: usize) -> Result<()> {
        self.destroy_render_finished();

        for _ in 0..image_count {
            let semaphore = unsafe {
                self.device
                    .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                    .call("vkCreateSemaphore")?
            };
            self.render_finished.push(semaphore);
        }
        self.back_buffers = vec![BackBufferState::Presentable; image_count];

        Ok(())
    }

    pub fn draw(
        &mut self,
        dev_ctx: &RenderDeviceContext,
        res_ctx: &RenderResourceContext,
        pip_ctx: &RenderPipelineContext,
    ) -> Result<FrameStatus> {
        let device = &self.device;
        let target = &dev_ctx.target;
        let swapchain = &target.swapchain;
        let cmd = self.frame.command_buffer;

        // The previous frame was waited on, so its commands are no longer in use
        self.frame.reset()?;

        let acquired = unsafe {
            swapchain.swapchain_loader.acquire_next_image(
                swapchain.swapchain,
                u64::MAX,
                self.frame.image_available,
                vk::Fence::null(),
            )
        };
        let (image_index, suboptimal) = match acquired {
            Ok(result) => result,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                log::debug!("Swap chain out of date on acquire");
                return Ok(FrameStatus::ResizeNeeded);
            }
            Err(code) => return Err(GpuCallError::new("vkAcquireNextImageKHR", code).into()),
        };
        let back_buffer = self.back_buffers
            .get_mut(image_index as usize)
            .ok_or_eyre("Acquired image index outside the swap chain")?;
        let swapchain_image = swapchain.swapchain_images[image_index as usize];
        let swapchain_view = swapchain.swapchain_image_views[image_index as usize];
        let extent = target.get_extent();

        unsafe {
            device
                .begin_command_buffer(
                    cmd,
                    &vk::CommandBufferBeginInfo::default()
                        .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT),
                )
                .call("vkBeginCommandBuffer")?;

            let viewport = vk::Viewport::default()
                .x(0.0)
                .y(0.0)
                .width(extent.width as f32)
                .height(extent.height as f32)
                .min_depth(0.0)
                .max_depth(1.0);
            let scissor = vk::Rect2D::default().extent(extent);
            device.cmd_set_viewport(cmd, 0, &[viewport]);
            device.cmd_set_scissor(cmd, 0, &[scissor]);
        }

        // Contents are cleared every frame, so the previous layout is discarded.
        // The first scopes cover the last use of each image, for the swap-chain
        // image that is the acquire semaphore wait.
        back_buffer.begin_rendering()?;
        let mut barriers = vec![
            discard_barrier(
                swapchain_image,
                vk::ImageAspectFlags::COLOR,
                vk::ImageLayout::PRESENT_SRC_KHR,
                vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            ),
            discard_barrier(
                target.depth_image.image,
                target.depth_image.aspect,
                vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
                vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            ),
        ];
        if let Some(msaa_image) = &target.msaa_color_image {
            barriers.push(discard_barrier(
                msaa_image.image,
                vk::ImageAspectFlags::COLOR,
                vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
                vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            ));
        }
        record_image_barriers(cmd, &barriers, device);

        let clear_color = vk::ClearValue {
            color: vk::ClearColorValue {
                float32: colors::LIGHT_STEEL_BLUE.to_array(),
            },
        };
        let clear_depth_stencil = vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue {
                depth: 1.0,
                stencil: 0,
            },
        };

        let color_attachment = match &target.msaa_color_image {
            Some(msaa_image) => vk::RenderingAttachmentInfo::default()
                .image_view(msaa_image.view)
                .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                .resolve_mode(vk::ResolveModeFlags::AVERAGE)
                .resolve_image_view(swapchain_view)
                .resolve_image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::DONT_CARE)
                .clear_value(clear_color),
            None => vk::RenderingAttachmentInfo::default()
                .image_view(swapchain_view)
                .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::STORE)
                .clear_value(clear_color),
        };
        let depth_stencil_attachment = vk::RenderingAttachmentInfo::default()
            .image_view(target.depth_image.view)
            .image_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::DONT_CARE)
            .clear_value(clear_depth_stencil);

        let color_attachments = [color_attachment];
        let rendering_info = vk::RenderingInfo::default()
            .render_area(vk::Rect2D::default().extent(extent))
            .layer_count(1)
            .color_attachments(&color_attachments)
            .depth_attachment(&depth_stencil_attachment)
            .stencil_attachment(&depth_stencil_attachment);

        unsafe {
            device.cmd_begin_rendering(cmd, &rendering_info);

            device.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, pip_ctx.get_pipeline());
            if let Some(descriptor_set) = res_ctx.get_descriptor_set() {
                device.cmd_bind_descriptor_sets(
                    cmd,
                    vk::PipelineBindPoint::GRAPHICS,
                    pip_ctx.get_pipeline_layout(),
                    0,
                    &[descriptor_set],
                    &[],
                );
            }
        }

        res_ctx.mesh.bind(cmd, device);
        for (_, range) in res_ctx.mesh.get_draw_ranges() {
            unsafe {
                device.cmd_draw_indexed(
                    cmd,
                    range.index_count,
                    1,
                    range.first_index,
                    range.vertex_offset,
                    0,
                );
            }
        }

        unsafe {
            device.cmd_end_rendering(cmd);
        }

        transition_image_layout(
            cmd,
            swapchain_image,
            vk::ImageAspectFlags::COLOR,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            vk::ImageLayout::PRESENT_SRC_KHR,
            device,
        );
        back_buffer.end_rendering()?;

        let render_finished = self.render_finished[image_index as usize];
        unsafe {
            device.end_command_buffer(cmd).call("vkEndCommandBuffer")?;

            let wait_info = [vk::SemaphoreSubmitInfo::default()
                .semaphore(self.frame.image_available)
                .stage_mask(vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT)];
            let signal_info = [vk::SemaphoreSubmitInfo::default()
                .semaphore(render_finished)
                .stage_mask(vk::PipelineStageFlags2::ALL_GRAPHICS)];
            let cmd_info = [vk::CommandBufferSubmitInfo::default().command_buffer(cmd)];
            let submit_info = vk::SubmitInfo2::default()
                .wait_semaphore_infos(&wait_info)
                .signal_semaphore_infos(&signal_info)
                .command_buffer_infos(&cmd_info);

            device
                .queue_submit2(
                    dev_ctx.device.graphics_queue.handle,
                    &[submit_info],
                    self.frame.render_fence,
                )
                .call("vkQueueSubmit2")?;
        }

        let wait_semaphores = [render_finished];
        let swapchains = [swapchain.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);
        let presented = unsafe {
            swapchain.swapchain_loader
                .queue_present(dev_ctx.device.graphics_queue.handle, &present_info)
        };

        // No pipelining: the frame is complete before the next one is recorded
        self.frame.wait()?;

        match presented {
            Ok(false) if !suboptimal => Ok(FrameStatus::Presented),
            Ok(_) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                log::debug!("Swap chain suboptimal or out of date on present");
                Ok(FrameStatus::ResizeNeeded)
            }
            Err(code) => Err(GpuCallError::new("vkQueuePresentKHR", code).into()),
        }
    }

    fn destroy_render_finished(&mut self) {
        for semaphore in self.render_finished.drain(..) {
            unsafe { self.device.destroy_semaphore(semaphore, None) };
        }
    }
}

impl Drop for RenderFrameContext {
    fn drop(&mut self) {
        self.destroy_render_finished();
    }
}
