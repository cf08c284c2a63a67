use std::sync::Arc;
use ash::vk;
use color_eyre::eyre::Result;
use crate::renderer::contexts::device_ctx::queue::Queue;
use crate::renderer::error::VkResultExt;

/// One reusable command buffer for blocking uploads outside the frame loop
pub struct TransferContext {
    transfer_fence: vk::Fence,
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,

    queue: Arc<Queue>,
    device: Arc<ash::Device>,
}

impl TransferContext {
    pub fn new(
        queue: Arc<Queue>,
        device: Arc<ash::Device>,
    ) -> Result<Self> {
        let transfer_fence_info = vk::FenceCreateInfo::default();
        let transfer_fence = unsafe {
            device.create_fence(&transfer_fence_info, None).call("vkCreateFence")?
        };

        let command_pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue.family.index)
            .flags(vk::CommandPoolCreateFlags::TRANSIENT);
        let command_pool = unsafe {
            device.create_command_pool(&command_pool_info, None).call("vkCreateCommandPool")?
        };

        let command_buffer_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(command_pool)
            .command_buffer_count(1)
            .level(vk::CommandBufferLevel::PRIMARY);
        let command_buffer = unsafe {
            device
                .allocate_command_buffers(&command_buffer_info)
                .call("vkAllocateCommandBuffers")?[0]
        };

        Ok(Self {
            transfer_fence,
            command_pool,
            command_buffer,
            queue,
            device,
        })
    }

    /// Record commands with `func`, submit them and block until the GPU has executed them
    pub fn immediate_submit<F, R>(
        &self,
        func: F,
    ) -> Result<R>
    where
        F: FnOnce(vk::CommandBuffer, &ash::Device) -> Result<R>,
    {
        let cmd = self.command_buffer;

        let cmd_begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe {
            self.device
                .begin_command_buffer(cmd, &cmd_begin_info)
                .call("vkBeginCommandBuffer")?;
        }

        let recorded = func(cmd, &self.device);

        unsafe {
            self.device.end_command_buffer(cmd).call("vkEndCommandBuffer")?;
        }
        // Nothing was submitted, but the pool still has to be reset for the next caller
        let output = match recorded {
            Ok(output) => output,
            Err(err) => {
                self.reset()?;
                return Err(err);
            }
        };

        let cmds = [cmd];
        let submit = vk::SubmitInfo::default()
            .command_buffers(&cmds);
        unsafe {
            self.device
                .queue_submit(self.queue.handle, &[submit], self.transfer_fence)
                .call("vkQueueSubmit")?;
            self.device
                .wait_for_fences(&[self.transfer_fence], true, u64::MAX)
                .call("vkWaitForFences")?;
            self.device
                .reset_fences(&[self.transfer_fence])
                .call("vkResetFences")?;
        }
        self.reset()?;

        Ok(output)
    }

    fn reset(&self) -> Result<()> {
        unsafe {
            self.device
                .reset_command_pool(self.command_pool, vk::CommandPoolResetFlags::empty())
                .call("vkResetCommandPool")?;
        }
        Ok(())
    }
}

impl Drop for TransferContext {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_command_pool(self.command_pool, None);
            self.device.destroy_fence(self.transfer_fence, None);
        }
    }
}
