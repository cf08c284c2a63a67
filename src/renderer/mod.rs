pub mod camera;
pub mod config;
pub mod error;
pub mod util;

mod contexts;
mod shader_data;
mod resources;
mod internals;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use glam::{Mat4, Vec3};
use std::sync::Arc;
use crate::renderer::camera::{compute_frame_transform, Camera};
use crate::renderer::config::RenderConfig;
use crate::renderer::contexts::device_ctx::RenderDeviceContext;
use crate::renderer::contexts::resource_ctx::RenderResourceContext;
use crate::renderer::contexts::frame_ctx::{FrameStatus, RenderFrameContext};
use crate::renderer::contexts::pipeline_ctx::RenderPipelineContext;

pub struct Renderer {
    // Field order is drop order: everything created from the device goes first
    frm: RenderFrameContext,
    pip: RenderPipelineContext,
    res: RenderResourceContext,
    dev: RenderDeviceContext,

    camera: Camera,
    resize_requested: bool,
}

impl Renderer {
    pub fn new(
        window: Arc<winit::window::Window>,
        config: &RenderConfig,
    ) -> Result<Self> {
        log::info!("Creating renderer with {config:?}");

        let dev = RenderDeviceContext::new(window, config)?;
        let res = RenderResourceContext::new(&dev, config)
            .wrap_err("Failed to create render resources")?;
        let pip = RenderPipelineContext::new(&dev, &res, config)
            .wrap_err("Failed to create the graphics pipeline")?;
        let frm = RenderFrameContext::new(&dev)?;

        Ok(Self {
            frm,
            pip,
            res,
            dev,
            camera: Camera::new(Vec3::ZERO),
            resize_requested: false,
        })
    }

    pub fn request_resize(&mut self) {
        self.resize_requested = true;
    }

    /// Rebuild the world-view-projection from the eye position and upload it
    pub fn update(&mut self, eye: Vec3, elapsed_secs: f32) -> Result<()> {
        self.camera.set_position(eye);
        let transform = compute_frame_transform(
            &self.camera,
            self.dev.target.get_aspect_ratio(),
            Mat4::IDENTITY,
            elapsed_secs,
        );
        self.res.update_frame_transform(&transform)
    }

    pub fn draw(&mut self) -> Result<()> {
        let window_size = self.dev.target.window.inner_size();
        if window_size.width == 0 || window_size.height == 0 {
            // Minimized: nothing to present to
            return Ok(());
        }

        if self.resize_requested {
            self.dev.resize_target().wrap_err("Failed to resize the render target")?;
            self.frm.reset_back_buffers(self.dev.target.swapchain.image_count())?;
            self.resize_requested = false;
        }

        match self.frm.draw(&self.dev, &self.res, &self.pip)? {
            FrameStatus::Presented => {}
            FrameStatus::ResizeNeeded => self.request_resize(),
        }

        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Err(err) = self.dev.device.wait_idle() {
            log::error!("Failed to wait for the device before teardown: {err}");
        }
    }
}
