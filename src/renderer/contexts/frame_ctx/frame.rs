use std::sync::Arc;
use ash::vk;
use color_eyre::Result;
use crate::renderer::error::VkResultExt;

/// Command recording state and synchronization for the single frame in flight
pub struct Frame {
    pub command_pool: vk::CommandPool,
    pub command_buffer: vk::CommandBuffer,

    // Signaled by the swap chain when the acquired image may be written
    pub image_available: vk::Semaphore,

    // Signaled when the frame's commands have finished execution
    pub render_fence: vk::Fence,

    device: Arc<ash::Device>,
}

impl Frame {
    pub fn new(
        queue_family_index: u32,
        device: Arc<ash::Device>,
    ) -> Result<Self> {
        let command_pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue_family_index)
            .flags(vk::CommandPoolCreateFlags::TRANSIENT);
        let command_pool = unsafe {
            device.create_command_pool(&command_pool_info, None).call("vkCreateCommandPool")?
        };

        // Everything created so far is owned by `frame` and released by its Drop
        let mut frame = Self {
            command_pool,
            command_buffer: vk::CommandBuffer::null(),
            image_available: vk::Semaphore::null(),
            render_fence: vk::Fence::null(),
            device,
        };

        let command_buffer_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(command_pool)
            .command_buffer_count(1)
            .level(vk::CommandBufferLevel::PRIMARY);
        frame.command_buffer = unsafe {
            frame.device
                .allocate_command_buffers(&command_buffer_info)
                .call("vkAllocateCommandBuffers")?[0]
        };

        frame.image_available = unsafe {
            frame.device
                .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                .call("vkCreateSemaphore")?
        };
        frame.render_fence = unsafe {
            frame.device
                .create_fence(&vk::FenceCreateInfo::default(), None)
                .call("vkCreateFence")?
        };

        Ok(frame)
    }

    /// Block until the submitted commands have executed, then rearm the fence
    pub fn wait(&self) -> Result<()> {
        unsafe {
            self.device
                .wait_for_fences(&[self.render_fence], true, u64::MAX)
                .call("vkWaitForFences")?;
            self.device
                .reset_fences(&[self.render_fence])
                .call("vkResetFences")?;
        }
        Ok(())
    }

    pub fn reset(&self) -> Result<()> {
        unsafe {
            self.device
                .reset_command_pool(self.command_pool, vk::CommandPoolResetFlags::empty())
                .call("vkResetCommandPool")?;
        }
        Ok(())
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_fence(self.render_fence, None);
            self.device.destroy_semaphore(self.image_available, None);
            self.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
