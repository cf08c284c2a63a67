pub mod device;
pub mod instance;
pub mod queue;
pub mod target;
pub mod transfer_ctx;

use std::sync::Arc;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use winit::window::Window;
use crate::renderer::config::RenderConfig;
use crate::renderer::contexts::device_ctx::device::RenderDevice;
use crate::renderer::contexts::device_ctx::instance::RenderInstance;
use crate::renderer::contexts::device_ctx::target::RenderTarget;

/// Responsibilities:
/// - Manage the Vulkan instance, device, and queue
/// - Own the presentation target and recreate it on resize
/// - Provide one-shot submissions for uploads
pub struct RenderDeviceContext {
    // Field order is drop order: target, then device, then instance
    pub target: RenderTarget,
    pub device: RenderDevice,
    pub instance: RenderInstance,
}

impl RenderDeviceContext {
    pub fn new(
        window: Arc<Window>,
        config: &RenderConfig,
    ) -> Result<Self> {
        let instance = RenderInstance::new(&window)
            .wrap_err("Failed to initialize Vulkan")?;
        let surface = instance.create_surface(&window)?;
        let device = RenderDevice::new(&instance, surface.0, &surface.1)
            .wrap_err("Failed to create the render device")?;
        let target = RenderTarget::new(window, surface, config, &instance, &device)
            .wrap_err("Failed to create the render target")?;

        Ok(Self {
            target,
            device,
            instance,
        })
    }

    pub fn resize_target(&mut self) -> Result<()> {
        self.target.resize(&self.instance, &self.device)
    }
}
